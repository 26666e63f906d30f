use font8x8::{BASIC_FONTS, LATIN_FONTS, UnicodeFonts};
use image::{Rgba, RgbaImage};

/// Side of an unscaled glyph, in pixels.
pub const GLYPH_SIZE: u32 = 8;
const TAB: &str = "    ";

fn glyph(c: char) -> [u8; 8] {
    BASIC_FONTS
        .get(c)
        .or_else(|| LATIN_FONTS.get(c))
        .or_else(|| BASIC_FONTS.get('?'))
        .unwrap_or([0; 8])
}

fn expand_tabs(text: &str) -> String {
    text.replace('\t', TAB)
}

/// Width of `text` once drawn at `scale`.
pub fn text_width(text: &str, scale: u32) -> u32 {
    let chars = u32::try_from(expand_tabs(text).chars().count()).unwrap_or(u32::MAX);
    chars.saturating_mul(GLYPH_SIZE.saturating_mul(scale))
}

/// Draws `text` with its top-left corner at (`x`, `y`). Pixels falling
/// outside the image are dropped.
pub fn draw_text(image: &mut RgbaImage, x: u32, y: u32, text: &str, scale: u32, color: Rgba<u8>) {
    let (width, height) = image.dimensions();
    let step = GLYPH_SIZE.saturating_mul(scale);
    for (i, c) in expand_tabs(text).chars().enumerate() {
        let left = u32::try_from(i)
            .unwrap_or(u32::MAX)
            .saturating_mul(step)
            .saturating_add(x);
        if left >= width || y >= height {
            break;
        }
        for (row, bits) in glyph(c).into_iter().enumerate() {
            for col in 0..GLYPH_SIZE {
                // Bit 0 is the leftmost pixel.
                if (bits >> col) & 1 == 0 {
                    continue;
                }
                let px = left.saturating_add(col.saturating_mul(scale));
                let py = y.saturating_add((row as u32).saturating_mul(scale));
                // Only the part of the scaled pixel inside the image.
                for ty in py..py.saturating_add(scale).min(height) {
                    for tx in px..px.saturating_add(scale).min(width) {
                        image.put_pixel(tx, ty, color);
                    }
                }
            }
        }
    }
}
