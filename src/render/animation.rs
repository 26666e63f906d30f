use std::io::Write;

use image::codecs::gif::{GifEncoder, Repeat};
use image::{Delay, Frame, RgbaImage};

use super::RenderError;
use crate::log_debug;

/// Turns ordered frames into a single looping artifact. Frames are consumed
/// as they arrive.
pub trait AnimationAssembler {
    fn assemble(
        &self,
        frames: &mut dyn Iterator<Item = RgbaImage>,
        out: &mut dyn Write,
    ) -> Result<(), RenderError>;
}

pub const DEFAULT_FRAME_DELAY_MS: u32 = 200;

/// Quantisation speed handed to the GIF encoder (1 slowest, 30 fastest).
const ENCODER_SPEED: i32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GifAssembler {
    pub frame_delay_ms: u32,
}

impl Default for GifAssembler {
    fn default() -> Self {
        GifAssembler {
            frame_delay_ms: DEFAULT_FRAME_DELAY_MS,
        }
    }
}

impl GifAssembler {
    pub fn new(frame_delay_ms: u32) -> Self {
        GifAssembler { frame_delay_ms }
    }
}

impl AnimationAssembler for GifAssembler {
    fn assemble(
        &self,
        frames: &mut dyn Iterator<Item = RgbaImage>,
        out: &mut dyn Write,
    ) -> Result<(), RenderError> {
        let mut frames = frames.peekable();
        if frames.peek().is_none() {
            return Err(RenderError::EmptyTrace);
        }
        log_debug!("Encoding frames, {} ms each", self.frame_delay_ms);
        let delay = Delay::from_numer_denom_ms(self.frame_delay_ms, 1);
        let mut encoder = GifEncoder::new_with_speed(out, ENCODER_SPEED);
        encoder.set_repeat(Repeat::Infinite)?;
        encoder.encode_frames(frames.map(|image| Frame::from_parts(image, 0, 0, delay)))?;
        Ok(())
    }
}
