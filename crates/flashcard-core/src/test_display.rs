//! Framebuffer draw target for render tests.
//!
//! `MockDisplay` from embedded-graphics panics when a pixel is drawn twice,
//! and every screen clears the panel before drawing text on top. This one
//! allows overdraw and can be inspected pixel by pixel.

use alloc::vec;
use alloc::vec::Vec;

use embedded_graphics::{pixelcolor::BinaryColor, prelude::*};

/// Overdraw-tolerant framebuffer display
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestDisplay {
    pixels: Vec<BinaryColor>,
    width: u32,
    height: u32,
}

impl TestDisplay {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            pixels: vec![BinaryColor::Off; (width * height) as usize],
            width,
            height,
        }
    }

    /// Display matching the Watchy panel (200x200)
    pub fn default_size() -> Self {
        Self::new(crate::DISPLAY_WIDTH, crate::DISPLAY_HEIGHT)
    }

    /// Whether the pixel at (`x`, `y`) is inked. Out of range reads as white.
    pub fn is_black(&self, x: u32, y: u32) -> bool {
        x < self.width
            && y < self.height
            && self.pixels[(y * self.width + x) as usize] == BinaryColor::On
    }

    pub fn black_pixel_count(&self) -> usize {
        self.pixels
            .iter()
            .filter(|&&pixel| pixel == BinaryColor::On)
            .count()
    }

    /// Pixels packed MSB first, one bit per pixel, rows padded to a byte
    pub fn to_packed(&self) -> Vec<u8> {
        let row_bytes = self.width.div_ceil(8) as usize;
        let mut packed = vec![0u8; row_bytes * self.height as usize];
        for y in 0..self.height {
            for x in 0..self.width {
                if self.is_black(x, y) {
                    packed[y as usize * row_bytes + (x / 8) as usize] |= 0x80 >> (x % 8);
                }
            }
        }
        packed
    }
}

impl DrawTarget for TestDisplay {
    type Color = BinaryColor;
    type Error = core::convert::Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(coord, color) in pixels {
            if coord.x >= 0
                && coord.y >= 0
                && (coord.x as u32) < self.width
                && (coord.y as u32) < self.height
            {
                let idx = (coord.y as u32 * self.width + coord.x as u32) as usize;
                self.pixels[idx] = color;
            }
        }
        Ok(())
    }
}

impl OriginDimensions for TestDisplay {
    fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }
}
