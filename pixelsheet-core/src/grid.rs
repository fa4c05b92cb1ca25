use crate::error::{Error, Result};
use crate::plan::Dimensions;

/// A single pixel: one byte per channel.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const SIZE: usize = 3;

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub fn to_bytes(&self) -> [u8; 3] {
        [self.r, self.g, self.b]
    }

    pub fn from_bytes(b: &[u8]) -> Self {
        Self {
            r: b[0],
            g: b[1],
            b: b[2],
        }
    }

    /// Packed `0xRRGGBB` value.
    pub fn to_u32(&self) -> u32 {
        ((self.r as u32) << 16) | ((self.g as u32) << 8) | (self.b as u32)
    }
}

/// Rectangular RGB24 image, row-major.
///
/// Always at least 1x1, and the buffer always holds exactly
/// `width * height * 3` bytes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PixelGrid {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl PixelGrid {
    /// Wrap an RGB24 buffer. Fails if either side is zero or the buffer
    /// length does not match the dimensions.
    pub fn from_rgb(width: u32, height: u32, data: Vec<u8>) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(Error::InvalidDimensions(format!(
                "pixel grid must be at least 1x1, got {width}x{height}"
            )));
        }
        let expected = width as usize * height as usize * Rgb::SIZE;
        if data.len() != expected {
            return Err(Error::InvalidDimensions(format!(
                "{width}x{height} grid needs {expected} bytes, got {}",
                data.len()
            )));
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Build a grid by evaluating `f(x, y)` for every pixel.
    pub fn from_fn(width: u32, height: u32, mut f: impl FnMut(u32, u32) -> Rgb) -> Result<Self> {
        let mut data = Vec::with_capacity(width as usize * height as usize * Rgb::SIZE);
        for y in 0..height {
            for x in 0..width {
                data.extend_from_slice(&f(x, y).to_bytes());
            }
        }
        Self::from_rgb(width, height, data)
    }

    /// A grid filled with one colour.
    pub fn filled(width: u32, height: u32, color: Rgb) -> Result<Self> {
        Self::from_fn(width, height, |_, _| color)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn dimensions(&self) -> Dimensions {
        Dimensions::new(self.width, self.height)
    }

    /// Pixel at zero-based `(x, y)`. Panics when out of bounds, like slice indexing.
    pub fn pixel(&self, x: u32, y: u32) -> Rgb {
        assert!(x < self.width && y < self.height, "pixel ({x}, {y}) out of bounds");
        let off = (y as usize * self.width as usize + x as usize) * Rgb::SIZE;
        Rgb::from_bytes(&self.data[off..off + Rgb::SIZE])
    }

    /// One row of pixels.
    pub fn row(&self, y: u32) -> impl Iterator<Item = Rgb> + '_ {
        let stride = self.width as usize * Rgb::SIZE;
        let start = y as usize * stride;
        self.data[start..start + stride]
            .chunks_exact(Rgb::SIZE)
            .map(Rgb::from_bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }
}

impl TryFrom<image::RgbImage> for PixelGrid {
    type Error = Error;

    fn try_from(img: image::RgbImage) -> Result<Self> {
        let (width, height) = img.dimensions();
        Self::from_rgb(width, height, img.into_raw())
    }
}
