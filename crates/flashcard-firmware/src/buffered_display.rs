use embedded_graphics::{pixelcolor::BinaryColor, prelude::*};

use flashcard_core::{render, RefreshMode, Screen, Surface, DISPLAY_HEIGHT, DISPLAY_WIDTH};

/// 1-bpp framebuffer in panel byte order: MSB first, black is 0
pub struct BufferedDisplay {
    buffer: Vec<u8>,
}

impl BufferedDisplay {
    const WIDTH_BYTES: usize = DISPLAY_WIDTH.div_ceil(8) as usize;
    const BUFFER_SIZE: usize = Self::WIDTH_BYTES * DISPLAY_HEIGHT as usize;

    pub fn new() -> Self {
        Self {
            buffer: vec![0xFF; Self::BUFFER_SIZE],
        }
    }

    pub fn set_pixel(&mut self, x: u32, y: u32, color: BinaryColor) {
        if x >= DISPLAY_WIDTH || y >= DISPLAY_HEIGHT {
            return;
        }
        let byte_index = y as usize * Self::WIDTH_BYTES + x as usize / 8;
        let bit_index = 7 - (x % 8);

        if color == BinaryColor::On {
            self.buffer[byte_index] &= !(1 << bit_index);
        } else {
            self.buffer[byte_index] |= 1 << bit_index;
        }
    }

    pub fn buffer(&self) -> &[u8] {
        &self.buffer
    }
}

impl DrawTarget for BufferedDisplay {
    type Color = BinaryColor;
    type Error = core::convert::Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(point, color) in pixels {
            if point.x >= 0 && point.y >= 0 {
                self.set_pixel(point.x as u32, point.y as u32, color);
            }
        }
        Ok(())
    }

    fn clear(&mut self, color: BinaryColor) -> Result<(), Self::Error> {
        let fill_byte = if color == BinaryColor::On { 0x00 } else { 0xFF };
        self.buffer.fill(fill_byte);
        Ok(())
    }
}

impl OriginDimensions for BufferedDisplay {
    fn size(&self) -> Size {
        Size::new(DISPLAY_WIDTH, DISPLAY_HEIGHT)
    }
}

impl Default for BufferedDisplay {
    fn default() -> Self {
        Self::new()
    }
}

/// Review screen surface backed by [`BufferedDisplay`].
///
/// Frames are checksummed so an unchanged fast refresh is skipped. The screen
/// text is mirrored to the log.
pub struct FrameSurface {
    frame: BufferedDisplay,
    text_width: u32,
    last_crc: Option<u32>,
    frames: u32,
}

impl FrameSurface {
    pub fn new(text_width: u16) -> Self {
        Self {
            frame: BufferedDisplay::new(),
            text_width: u32::from(text_width),
            last_crc: None,
            frames: 0,
        }
    }

    /// Frames pushed to the panel since boot
    pub fn frames(&self) -> u32 {
        self.frames
    }
}

impl Surface for FrameSurface {
    type Error = core::convert::Infallible;

    fn show(&mut self, screen: &Screen<'_>) -> Result<(), Self::Error> {
        log::info!("Screen [{}] {}", screen.title(), screen);
        render(screen, &mut self.frame, self.text_width)
    }

    fn draw(&mut self, mode: RefreshMode) -> Result<(), Self::Error> {
        let crc = crc32fast::hash(self.frame.buffer());
        if mode == RefreshMode::Fast && self.last_crc == Some(crc) {
            log::info!("UI: frame unchanged, skipping refresh");
            return Ok(());
        }
        self.last_crc = Some(crc);
        self.frames = self.frames.wrapping_add(1);
        log::info!(
            "UI: {:?} refresh #{} ({} bytes, crc {:08x})",
            mode,
            self.frames,
            self.frame.buffer().len(),
            crc
        );
        Ok(())
    }
}
