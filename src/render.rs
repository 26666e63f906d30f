//! Drawing frames and assembling them into an animation.
//!
//! A frame shows every visible instruction top to bottom, highlights the one
//! active during the cycle and prints the cycle number in the bottom-right
//! corner.

use std::{error, fmt, io};

use image::{Rgba, RgbaImage};
use serde::{Deserialize, Serialize};

use crate::program::{Instruction, Pc};

pub mod animation;
pub mod glyphs;
pub mod pool;

pub use animation::{AnimationAssembler, DEFAULT_FRAME_DELAY_MS, GifAssembler};
pub use pool::render_frames;

#[derive(Debug)]
pub enum RenderError {
    Image(image::ImageError),
    Io(io::Error),
    /// No visible instruction was ever active, so there is nothing to draw.
    EmptyTrace,
}

impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenderError::Image(e) => write!(f, "could not encode animation: {}", e),
            RenderError::Io(e) => write!(f, "could not write animation: {}", e),
            RenderError::EmptyTrace => {
                write!(f, "the run produced no visible cycles, nothing to render")
            }
        }
    }
}

impl error::Error for RenderError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            RenderError::Image(e) => Some(e),
            RenderError::Io(e) => Some(e),
            RenderError::EmptyTrace => None,
        }
    }
}

impl From<image::ImageError> for RenderError {
    fn from(e: image::ImageError) -> Self {
        RenderError::Image(e)
    }
}

impl From<io::Error> for RenderError {
    fn from(e: io::Error) -> Self {
        RenderError::Io(e)
    }
}

/// Draws one frame. Must not depend on anything but its arguments, frames
/// are rendered concurrently.
pub trait FrameRenderer: Sync {
    fn render(&self, visible: &[&Instruction], active_pc: Pc, cycle_index: usize) -> RgbaImage;
}

pub type Rgb = [u8; 3];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderStyle {
    /// Integer upscaling of the 8x8 font.
    pub scale: u32,
    pub margin: u32,
    pub line_padding: u32,
    pub background: Rgb,
    pub text: Rgb,
    pub highlight: Rgb,
}

impl Default for RenderStyle {
    fn default() -> Self {
        RenderStyle {
            scale: 4,
            margin: 20,
            line_padding: 10,
            background: [255, 255, 255],
            text: [0, 0, 0],
            highlight: [255, 255, 0],
        }
    }
}

/// Pixels the highlight band reaches above a line.
const HIGHLIGHT_OVERHANG: u32 = 5;
pub const MAX_SCALE: u32 = 64;
/// Upper bound for `margin` and `line_padding`.
pub const MAX_SPACING: u32 = 1024;

fn rgba([r, g, b]: Rgb) -> Rgba<u8> {
    Rgba([r, g, b, 255])
}

fn cycle_label(cycle_index: usize) -> String {
    format!("Cycles: {}", cycle_index)
}

/// Renders instruction text with the built-in bitmap font.
#[derive(Debug, Clone, Default)]
pub struct TextRenderer {
    style: RenderStyle,
    /// Width reserved for the cycle label, so frames of one run share a size.
    label_width: u32,
}

impl TextRenderer {
    pub fn new(style: RenderStyle) -> Self {
        let style = RenderStyle {
            scale: style.scale.clamp(1, MAX_SCALE),
            margin: style.margin.min(MAX_SPACING),
            line_padding: style.line_padding.min(MAX_SPACING),
            ..style
        };
        TextRenderer {
            style,
            label_width: 0,
        }
    }

    /// Reserves room for the widest label of a run lasting `cycles` cycles.
    pub fn for_cycles(style: RenderStyle, cycles: usize) -> Self {
        let mut renderer = TextRenderer::new(style);
        renderer.label_width =
            glyphs::text_width(&cycle_label(cycles.saturating_sub(1)), renderer.style.scale);
        renderer
    }

    pub fn style(&self) -> &RenderStyle {
        &self.style
    }

    fn glyph_height(&self) -> u32 {
        glyphs::GLYPH_SIZE * self.style.scale
    }

    fn line_top(&self, line: usize) -> u32 {
        let pitch = self.glyph_height() + self.style.line_padding;
        u32::try_from(line)
            .unwrap_or(u32::MAX)
            .saturating_mul(pitch)
            .saturating_add(self.style.line_padding)
    }

    /// Frame size for the given instructions and label.
    pub fn frame_size(&self, visible: &[&Instruction], label: &str) -> (u32, u32) {
        let scale = self.style.scale;
        let content = visible
            .iter()
            .map(|i| glyphs::text_width(&i.text, scale))
            .chain([self.label_width, glyphs::text_width(label, scale)])
            .max()
            .unwrap_or(0);
        let width = content.saturating_add(2 * self.style.margin);
        let height = self.line_top(visible.len() + 1);
        (width.max(1), height.max(1))
    }
}

impl FrameRenderer for TextRenderer {
    fn render(&self, visible: &[&Instruction], active_pc: Pc, cycle_index: usize) -> RgbaImage {
        let style = &self.style;
        let label = cycle_label(cycle_index);
        let (width, height) = self.frame_size(visible, &label);
        let mut frame = RgbaImage::from_pixel(width, height, rgba(style.background));
        let ink = rgba(style.text);

        for (line, instruction) in visible.iter().enumerate() {
            let top = self.line_top(line);
            if instruction.pc == active_pc {
                let band_top = top.saturating_sub(HIGHLIGHT_OVERHANG);
                let band_bottom = top.saturating_add(self.glyph_height()).min(height);
                let band_right = width.saturating_sub(style.margin);
                for y in band_top..band_bottom {
                    for x in style.margin..band_right {
                        frame.put_pixel(x, y, rgba(style.highlight));
                    }
                }
            }
            glyphs::draw_text(&mut frame, style.margin, top, &instruction.text, style.scale, ink);
        }

        let label_left = width
            .saturating_sub(style.margin)
            .saturating_sub(glyphs::text_width(&label, style.scale));
        glyphs::draw_text(
            &mut frame,
            label_left,
            self.line_top(visible.len()),
            &label,
            style.scale,
            ink,
        );
        frame
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::program::parse_program;

    fn program() -> crate::program::Program {
        parse_program(
            "pc@code@cyclecount@nextpc@meta\n\
             1@short@1@2@pass\n\
             2@?@1@3@pass\n\
             3@a much longer line@1@-1@exit\n",
        )
        .unwrap()
    }

    fn highlighted_rows(frame: &RgbaImage, style: &RenderStyle) -> Vec<u32> {
        let x = style.margin + 1;
        (0..frame.height())
            .filter(|&y| *frame.get_pixel(x, y) == rgba(style.highlight))
            .collect()
    }

    #[test]
    fn frame_fits_longest_visible_line() {
        let program = program();
        let visible = program.visible();
        let style = RenderStyle::default();
        let renderer = TextRenderer::new(style);
        let frame = renderer.render(&visible, 1, 0);
        let text = glyphs::text_width("a much longer line", style.scale);
        assert_eq!(frame.width(), text + 2 * style.margin);
        // Two visible lines plus the label row.
        assert_eq!(frame.height(), 10 + 3 * (32 + 10));
    }

    #[test]
    fn highlight_follows_active_pc() {
        let program = program();
        let visible = program.visible();
        let style = RenderStyle::default();
        let renderer = TextRenderer::new(style);

        let first = highlighted_rows(&renderer.render(&visible, 1, 0), &style);
        let second = highlighted_rows(&renderer.render(&visible, 3, 1), &style);
        assert_eq!(first.first(), Some(&5));
        assert_eq!(second.first(), Some(&(10 + 42 - 5)));
        assert!(second.iter().all(|y| !first.contains(y)));
    }

    #[test]
    fn hidden_pc_highlights_nothing() {
        let program = program();
        let visible = program.visible();
        let style = RenderStyle::default();
        let frame = TextRenderer::new(style).render(&visible, 2, 0);
        assert!(highlighted_rows(&frame, &style).is_empty());
    }

    #[test]
    fn frames_of_a_run_share_a_size() {
        let program = program();
        let visible = program.visible();
        let style = RenderStyle {
            scale: 1,
            ..RenderStyle::default()
        };
        let renderer = TextRenderer::for_cycles(style, 10_000);
        let early = renderer.render(&visible, 1, 0);
        let late = renderer.render(&visible, 1, 9_999);
        assert_eq!(early.dimensions(), late.dimensions());
    }

    #[test]
    fn style_is_clamped() {
        let renderer = TextRenderer::new(RenderStyle { scale: 0, ..RenderStyle::default() });
        assert_eq!(renderer.style().scale, 1);

        let huge = RenderStyle {
            scale: u32::MAX,
            margin: u32::MAX,
            line_padding: u32::MAX,
            ..RenderStyle::default()
        };
        let renderer = TextRenderer::for_cycles(huge, 3);
        assert_eq!(renderer.style().scale, MAX_SCALE);
        assert_eq!(renderer.style().margin, MAX_SPACING);
        assert_eq!(renderer.style().line_padding, MAX_SPACING);
    }

    #[test]
    fn layout_saturates_instead_of_overflowing() {
        let renderer = TextRenderer::new(RenderStyle::default());
        assert_eq!(renderer.line_top(usize::MAX), u32::MAX);
        assert_eq!(glyphs::text_width("wide", u32::MAX), u32::MAX);
    }
}
