use crate::error::{CoreError, CoreResult};

/// Named colour ramps for belief rasters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Colormap {
    Viridis,
    Magma,
    Inferno,
    Plasma,
    Cividis,
    Gray,
    Hot,
}

// Evenly spaced samples of each ramp, interpolated linearly in between.
const VIRIDIS: &[[u8; 3]] = &[
    [68, 1, 84],
    [71, 44, 122],
    [59, 81, 139],
    [44, 113, 142],
    [33, 144, 141],
    [39, 173, 129],
    [92, 200, 99],
    [170, 220, 50],
    [253, 231, 37],
];

const MAGMA: &[[u8; 3]] = &[
    [0, 0, 4],
    [28, 16, 68],
    [79, 18, 123],
    [129, 37, 129],
    [181, 54, 122],
    [229, 80, 100],
    [251, 135, 97],
    [254, 194, 135],
    [252, 253, 191],
];

const INFERNO: &[[u8; 3]] = &[
    [0, 0, 4],
    [31, 12, 72],
    [85, 15, 109],
    [136, 34, 106],
    [186, 54, 85],
    [227, 89, 51],
    [249, 140, 10],
    [249, 201, 50],
    [252, 255, 164],
];

const PLASMA: &[[u8; 3]] = &[
    [13, 8, 135],
    [75, 3, 161],
    [125, 3, 168],
    [168, 34, 150],
    [203, 70, 121],
    [229, 107, 93],
    [248, 148, 65],
    [253, 195, 40],
    [240, 249, 33],
];

const CIVIDIS: &[[u8; 3]] = &[
    [0, 34, 78],
    [18, 53, 112],
    [59, 73, 108],
    [87, 93, 109],
    [112, 113, 115],
    [138, 134, 120],
    [166, 156, 116],
    [197, 179, 103],
    [254, 232, 56],
];

const GRAY: &[[u8; 3]] = &[[0, 0, 0], [255, 255, 255]];

const HOT: &[[u8; 3]] = &[
    [11, 0, 0],
    [178, 0, 0],
    [255, 88, 0],
    [255, 210, 0],
    [255, 255, 255],
];

impl Colormap {
    pub const NAMES: [&'static str; 8] = [
        "viridis", "magma", "inferno", "plasma", "cividis", "gray", "grey", "hot",
    ];

    pub fn from_name(name: &str) -> CoreResult<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "viridis" => Ok(Colormap::Viridis),
            "magma" => Ok(Colormap::Magma),
            "inferno" => Ok(Colormap::Inferno),
            "plasma" => Ok(Colormap::Plasma),
            "cividis" => Ok(Colormap::Cividis),
            "gray" | "grey" => Ok(Colormap::Gray),
            "hot" => Ok(Colormap::Hot),
            other => Err(CoreError::validation(format!(
                "unknown colormap '{}', expected one of: {}",
                other,
                Self::NAMES.join(", ")
            ))),
        }
    }

    fn stops(&self) -> &'static [[u8; 3]] {
        match self {
            Colormap::Viridis => VIRIDIS,
            Colormap::Magma => MAGMA,
            Colormap::Inferno => INFERNO,
            Colormap::Plasma => PLASMA,
            Colormap::Cividis => CIVIDIS,
            Colormap::Gray => GRAY,
            Colormap::Hot => HOT,
        }
    }

    /// Colour at position `x` in `[0, 1]`; values outside are clamped, NaN maps to 0.
    pub fn sample(&self, x: f64) -> [u8; 3] {
        let stops = self.stops();
        let x = if x.is_nan() { 0.0 } else { x.clamp(0.0, 1.0) };
        let scaled = x * (stops.len() - 1) as f64;
        let lo = (scaled.floor() as usize).min(stops.len() - 2);
        let frac = scaled - lo as f64;
        let (a, b) = (stops[lo], stops[lo + 1]);
        let mut out = [0u8; 3];
        for i in 0..3 {
            let v = f64::from(a[i]) + (f64::from(b[i]) - f64::from(a[i])) * frac;
            out[i] = v.round() as u8;
        }
        out
    }

    /// Colour for `value` normalised over `[vmin, vmax]`.
    pub fn map(&self, value: f64, vmin: f64, vmax: f64) -> [u8; 3] {
        self.sample((value - vmin) / (vmax - vmin))
    }
}
