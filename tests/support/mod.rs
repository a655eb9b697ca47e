// tests/support/mod.rs
//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use divergence_meter::config::Config;
use divergence_meter::glyph::{GlyphAtlas, GLYPH_CHARS};
use divergence_meter::session::Session;
use image::{Rgb, RgbImage};
use std::path::Path;
use std::sync::Arc;

/// A glyph whose pixels encode its character, so frames can be checked by
/// eye in a failing test. Digits are 6x10, the point is 3x10.
pub fn glyph_image(ch: char) -> RgbImage {
    let (w, shade) = match ch.to_digit(10) {
        Some(d) => (6, 40 + 20 * d as u8),
        None => (3, 250),
    };
    RgbImage::from_fn(w, 10, |x, y| {
        if (x + y) % 2 == 0 {
            Rgb([shade, shade / 2, 0])
        } else {
            Rgb([0, 0, 0])
        }
    })
}

pub fn atlas() -> Arc<GlyphAtlas> {
    Arc::new(GlyphAtlas::from_images(GLYPH_CHARS.map(|ch| (ch, glyph_image(ch)))).unwrap())
}

/// Writes the synthetic glyphs as PNGs into `dir`.
pub fn write_assets(dir: &Path) {
    for ch in GLYPH_CHARS {
        glyph_image(ch)
            .save(dir.join(format!("{ch}.png")))
            .unwrap();
    }
}

pub fn session_saving_to(save_dir: &Path) -> Session {
    let mut config = Config::default();
    config.appearance.save_dir = save_dir.to_path_buf();
    config.session.presenter_poll_ms = 2;
    Session::with_atlas(config, atlas())
}
