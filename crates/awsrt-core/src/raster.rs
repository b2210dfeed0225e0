use crate::error::{CoreError, CoreResult};

/// Row-major 2-D grid of cell values.
#[derive(Debug, Clone, PartialEq)]
pub struct Raster<T> {
    height: usize,
    width: usize,
    data: Vec<T>,
}

impl<T: Copy> Raster<T> {
    pub fn filled(height: usize, width: usize, value: T) -> Self {
        Raster {
            height,
            width,
            data: vec![value; height * width],
        }
    }

    pub fn from_vec(height: usize, width: usize, data: Vec<T>) -> CoreResult<Self> {
        if data.len() != height * width {
            return Err(CoreError::Conflict(format!(
                "raster of {}x{} cannot hold {} values",
                height,
                width,
                data.len()
            )));
        }
        Ok(Raster {
            height,
            width,
            data,
        })
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    #[inline]
    pub fn get(&self, row: usize, col: usize) -> T {
        self.data[row * self.width + col]
    }

    #[inline]
    pub fn set(&mut self, row: usize, col: usize, value: T) {
        self.data[row * self.width + col] = value;
    }

    pub fn as_slice(&self) -> &[T] {
        &self.data
    }
}

impl Raster<u8> {
    /// Count of non-zero (burning) cells.
    pub fn count_on(&self) -> usize {
        self.data.iter().filter(|&&v| v != 0).count()
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        self.data.clone()
    }
}

impl Raster<f32> {
    /// Little-endian `f32` encoding used by the frame store.
    pub fn to_bytes(&self) -> Vec<u8> {
        self.data.iter().flat_map(|v| v.to_le_bytes()).collect()
    }

    pub fn from_le_bytes(height: usize, width: usize, bytes: &[u8]) -> CoreResult<Self> {
        if bytes.len() % 4 != 0 {
            return Err(CoreError::Conflict(format!(
                "belief blob length {} is not a multiple of 4",
                bytes.len()
            )));
        }
        let data = bytes
            .chunks_exact(4)
            .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
            .collect();
        Raster::from_vec(height, width, data)
    }
}
