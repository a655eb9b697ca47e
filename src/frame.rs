// src/frame.rs

//! Frame synthesis: turns one value-string into one padded composite bitmap.
//!
//! Composition is pure. The same value and atlas always give bit-identical
//! frames, so results could be cached; they are not, because meter values
//! change on nearly every tick.

use crate::config::{AppearanceConfig, MAX_BORDER_PX};
use crate::error::{DivergenceError, Result};
use crate::glyph::GlyphAtlas;
use image::{imageops, Rgb, RgbImage};
use log::trace;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

/// Canvas colour behind and around the glyphs.
pub const BACKGROUND: Rgb<u8> = Rgb([0, 0, 0]);

/// Symmetric padding around the glyph strip, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Border {
    /// Added above and below.
    pub vertical: u32,
    /// Added left and right.
    pub horizontal: u32,
}

impl Border {
    /// `307 / 4` by `104`.
    pub const CANONICAL: Border = Border {
        vertical: 307 / 4,
        horizontal: 104,
    };

    pub const NONE: Border = Border {
        vertical: 0,
        horizontal: 0,
    };
}

impl Default for Border {
    fn default() -> Self {
        Border::CANONICAL
    }
}

impl From<&AppearanceConfig> for Border {
    fn from(appearance: &AppearanceConfig) -> Self {
        Border {
            vertical: appearance.border_vertical_px.min(MAX_BORDER_PX),
            horizontal: appearance.border_horizontal_px.min(MAX_BORDER_PX),
        }
    }
}

/// One fully composited, padded bitmap. Cheap to clone.
#[derive(Clone, PartialEq, Eq)]
pub struct Frame {
    value: String,
    image: Arc<RgbImage>,
}

impl Frame {
    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn image(&self) -> &RgbImage {
        &self.image
    }

    pub fn pixel(&self, x: u32, y: u32) -> Rgb<u8> {
        *self.image.get_pixel(x, y)
    }

    /// Raw RGB8 bytes, row-major.
    pub fn as_raw(&self) -> &[u8] {
        self.image.as_raw()
    }

    /// Writes the frame as a PNG. Lossless, so the file decodes back to
    /// exactly `as_raw()`.
    pub fn save_png(&self, path: &Path) -> Result<()> {
        self.image
            .save_with_format(path, image::ImageFormat::Png)
            .map_err(|e| DivergenceError::SaveFailed {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })
    }
}

impl fmt::Debug for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Frame")
            .field("value", &self.value)
            .field("width", &self.width())
            .field("height", &self.height())
            .finish()
    }
}

/// Builds frames from an atlas and a fixed border.
#[derive(Debug, Clone)]
pub struct FrameCompositor {
    atlas: Arc<GlyphAtlas>,
    border: Border,
}

impl FrameCompositor {
    pub fn new(atlas: Arc<GlyphAtlas>, border: Border) -> Self {
        FrameCompositor { atlas, border }
    }

    pub fn atlas(&self) -> &Arc<GlyphAtlas> {
        &self.atlas
    }

    pub fn border(&self) -> Border {
        self.border
    }

    /// Composes `value` into a frame.
    ///
    /// Glyphs are laid left to right with no gap and top-aligned; shorter
    /// glyphs leave background below them. Every character is resolved before
    /// any pixel is written, so a bad value never yields a partial frame.
    pub fn compose(&self, value: &str) -> Result<Frame> {
        let glyphs = value
            .chars()
            .map(|ch| self.atlas.require(ch))
            .collect::<Result<Vec<_>>>()?;

        let strip_width = glyphs
            .iter()
            .fold(0u32, |w, g| w.saturating_add(g.width()));
        let strip_height = glyphs.iter().map(|g| g.height()).max().unwrap_or(0);
        let width = strip_width.saturating_add(self.border.horizontal.saturating_mul(2));
        let height = strip_height.saturating_add(self.border.vertical.saturating_mul(2));

        let mut canvas = RgbImage::from_pixel(width, height, BACKGROUND);
        let mut x = self.border.horizontal;
        for glyph in &glyphs {
            imageops::replace(
                &mut canvas,
                glyph.image(),
                i64::from(x),
                i64::from(self.border.vertical),
            );
            x += glyph.width();
        }

        trace!("FrameCompositor: {:?} -> {}x{}", value, width, height);
        Ok(Frame {
            value: value.to_string(),
            image: Arc::new(canvas),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::glyph::GLYPH_CHARS;
    use test_log::test;

    /// Digit `d` is `(3 + d)` wide and `(5 + d % 3)` tall; '.' is 2x4.
    fn atlas() -> Arc<GlyphAtlas> {
        let images = GLYPH_CHARS.map(|ch| {
            let (w, h, shade) = match ch.to_digit(10) {
                Some(d) => (3 + d, 5 + d % 3, 20 * d as u8 + 10),
                None => (2, 4, 255),
            };
            (ch, RgbImage::from_pixel(w, h, Rgb([shade, shade, 0])))
        });
        Arc::new(GlyphAtlas::from_images(images).unwrap())
    }

    fn compositor() -> FrameCompositor {
        FrameCompositor::new(atlas(), Border::CANONICAL)
    }

    #[test]
    fn canonical_border_is_76_by_104() {
        assert_eq!(Border::CANONICAL.vertical, 76);
        assert_eq!(Border::CANONICAL.horizontal, 104);
    }

    #[test]
    fn compose_is_deterministic() {
        let c = compositor();
        let a = c.compose("3.1415926").unwrap();
        let b = c.compose("3.1415926").unwrap();
        assert_eq!(a, b);
        assert_eq!(a.as_raw(), b.as_raw());
    }

    #[test]
    fn compose_rejects_chars_outside_the_atlas() {
        let c = compositor();
        assert!(matches!(
            c.compose("1a"),
            Err(DivergenceError::UnknownGlyph('a'))
        ));
        assert!(matches!(
            c.compose("12:34"),
            Err(DivergenceError::UnknownGlyph(':'))
        ));
    }

    #[test]
    fn frame_dimensions_follow_glyph_metrics_plus_border() {
        let c = compositor();
        for value in ["0", "42", "1.048596", "23.59.59", "10086"] {
            let frame = c.compose(value).unwrap();
            let atlas = c.atlas();
            let glyph_w: u32 = value.chars().map(|ch| atlas.get(ch).unwrap().width()).sum();
            let glyph_h = value
                .chars()
                .map(|ch| atlas.get(ch).unwrap().height())
                .max()
                .unwrap();
            assert_eq!(frame.width(), glyph_w + 2 * 104, "{value}");
            assert_eq!(frame.height(), glyph_h + 2 * 76, "{value}");
        }
    }

    #[test]
    fn glyphs_are_concatenated_and_top_aligned() {
        let c = FrameCompositor::new(atlas(), Border { vertical: 1, horizontal: 2 });
        // '1' is 4x6, '2' is 5x7.
        let frame = c.compose("12").unwrap();
        assert_eq!((frame.width(), frame.height()), (4 + 5 + 4, 7 + 2));

        assert_eq!(frame.pixel(0, 0), BACKGROUND);
        assert_eq!(frame.pixel(2, 1), Rgb([30, 30, 0]));
        assert_eq!(frame.pixel(5, 6), Rgb([30, 30, 0]));
        // Below the shorter '1' is background.
        assert_eq!(frame.pixel(2, 7), BACKGROUND);
        assert_eq!(frame.pixel(6, 1), Rgb([50, 50, 0]));
        assert_eq!(frame.pixel(10, 7), Rgb([50, 50, 0]));
        assert_eq!(frame.pixel(11, 1), BACKGROUND);
    }

    #[test]
    fn oversized_config_borders_are_clamped() {
        let appearance = AppearanceConfig {
            border_vertical_px: u32::MAX,
            border_horizontal_px: u32::MAX,
            ..AppearanceConfig::default()
        };
        let border = Border::from(&appearance);
        assert_eq!(border.vertical, MAX_BORDER_PX);
        assert_eq!(border.horizontal, MAX_BORDER_PX);
    }

    #[test]
    fn frame_remembers_its_value() {
        let frame = compositor().compose("10086").unwrap();
        assert_eq!(frame.value(), "10086");
    }

    #[test]
    fn save_png_round_trips_pixels() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("frame.png");
        let frame = compositor().compose("42").unwrap();
        frame.save_png(&path).unwrap();

        let decoded = image::open(&path).unwrap().to_rgb8();
        assert_eq!(decoded.dimensions(), (frame.width(), frame.height()));
        assert_eq!(decoded.as_raw(), frame.as_raw());
    }

    #[test]
    fn save_png_reports_save_failed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("no-such-dir").join("frame.png");
        let frame = compositor().compose("42").unwrap();
        assert!(matches!(
            frame.save_png(&path),
            Err(DivergenceError::SaveFailed { .. })
        ));
    }
}
