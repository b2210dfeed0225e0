use std::io::Cursor;

use image::imageops::{self, FilterType};
use image::{ImageFormat, Rgb, RgbImage};

use super::{Colormap, FieldImageParams, RenderQuality};
use crate::error::CoreResult;
use crate::raster::Raster;

const UNBURNT: Rgb<u8> = Rgb([220, 220, 220]);
const BURNING: Rgb<u8> = Rgb([200, 30, 30]);

pub const LEGEND_WIDTH: u32 = 600;
pub const LEGEND_HEIGHT: u32 = 70;

const LEGEND_MARGIN_X: u32 = 20;
const LEGEND_BAR_TOP: u32 = 10;
const LEGEND_BAR_BOTTOM: u32 = 40;
const LEGEND_TICK_LEN: u32 = 8;
const LEGEND_TICKS: u32 = 5;
const LEGEND_BACKGROUND: Rgb<u8> = Rgb([255, 255, 255]);
const LEGEND_INK: Rgb<u8> = Rgb([40, 40, 40]);

fn encode(img: &RgbImage) -> CoreResult<Vec<u8>> {
    let mut bytes = Vec::new();
    img.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)?;
    Ok(bytes)
}

/// Hidden state as light grey (unburnt) and red (burning), one pixel per cell.
pub fn state_to_png(state: &Raster<u8>) -> CoreResult<Vec<u8>> {
    let img = RgbImage::from_fn(state.width() as u32, state.height() as u32, |x, y| {
        if state.get(y as usize, x as usize) != 0 {
            BURNING
        } else {
            UNBURNT
        }
    });
    encode(&img)
}

/// Belief through `params.cmap` over `[vmin, vmax]`, row 0 at the top.
pub fn belief_to_png(belief: &Raster<f32>, params: &FieldImageParams) -> CoreResult<Vec<u8>> {
    let cmap = params.colormap()?;
    let (w, h) = (belief.width() as u32, belief.height() as u32);
    let img = RgbImage::from_fn(w, h, |x, y| {
        let v = f64::from(belief.get(y as usize, x as usize));
        Rgb(cmap.map(v, params.vmin, params.vmax))
    });

    let img = match params.quality {
        RenderQuality::Fast => img,
        RenderQuality::Pub => imageops::resize(&img, w * 2, h * 2, FilterType::Triangle),
    };
    encode(&img)
}

/// Horizontal colourbar for `params.cmap`.
///
/// The gradient spans the full colormap; tick marks sit at 0, 25, 50, 75 and
/// 100 percent of the range.
pub fn legend_belief_png(params: &FieldImageParams) -> CoreResult<Vec<u8>> {
    let cmap: Colormap = params.colormap()?;
    let bar_left = LEGEND_MARGIN_X;
    let bar_right = LEGEND_WIDTH - LEGEND_MARGIN_X - 1;
    let span = f64::from(bar_right - bar_left);

    let tick_xs: Vec<u32> = (0..LEGEND_TICKS)
        .map(|i| bar_left + ((span * f64::from(i)) / f64::from(LEGEND_TICKS - 1)).round() as u32)
        .collect();

    let img = RgbImage::from_fn(LEGEND_WIDTH, LEGEND_HEIGHT, |x, y| {
        let in_columns = (bar_left..=bar_right).contains(&x);
        let in_rows = (LEGEND_BAR_TOP..=LEGEND_BAR_BOTTOM).contains(&y);

        if in_columns && in_rows {
            let on_border = x == bar_left
                || x == bar_right
                || y == LEGEND_BAR_TOP
                || y == LEGEND_BAR_BOTTOM;
            if on_border {
                return LEGEND_INK;
            }
            return Rgb(cmap.sample(f64::from(x - bar_left) / span));
        }

        let below_bar = y > LEGEND_BAR_BOTTOM && y <= LEGEND_BAR_BOTTOM + LEGEND_TICK_LEN;
        if below_bar && tick_xs.contains(&x) {
            return LEGEND_INK;
        }
        LEGEND_BACKGROUND
    });
    encode(&img)
}
