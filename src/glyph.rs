// src/glyph.rs

//! Defines the `Glyph` bitmap and the `GlyphAtlas` that maps each displayable
//! character to one.
//!
//! The atlas is loaded once at startup and never mutated afterwards. Glyph
//! pixels sit behind an `Arc`, so the atlas can be shared across the producer
//! and presenter threads without further synchronization.

use crate::error::{DivergenceError, Result};
use image::RgbImage;
use log::{debug, info};
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Every character the display can show, in asset-loading order.
pub const GLYPH_CHARS: [char; 11] = ['0', '1', '2', '3', '4', '5', '6', '7', '8', '9', '.'];

/// Alternate file stem accepted for the decimal point.
const DOT_ALIAS_STEM: &str = "dot";

/// Returns true if `ch` belongs to the fixed glyph set.
pub fn is_glyph_char(ch: char) -> bool {
    ch.is_ascii_digit() || ch == '.'
}

/// An immutable bitmap for one character.
#[derive(Clone, PartialEq, Eq)]
pub struct Glyph {
    ch: char,
    image: Arc<RgbImage>,
}

impl Glyph {
    pub fn new(ch: char, image: RgbImage) -> Self {
        Glyph {
            ch,
            image: Arc::new(image),
        }
    }

    pub fn ch(&self) -> char {
        self.ch
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
}

// Pixel dumps are useless in logs; print the shape instead.
impl fmt::Debug for Glyph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Glyph")
            .field("ch", &self.ch)
            .field("width", &self.width())
            .field("height", &self.height())
            .finish()
    }
}

/// Fixed mapping from character to `Glyph`.
///
/// The key set is always exactly `GLYPH_CHARS`; both constructors refuse to
/// build a partial or oversized atlas.
#[derive(Debug, Clone)]
pub struct GlyphAtlas {
    glyphs: HashMap<char, Glyph>,
}

impl GlyphAtlas {
    /// Loads `<dir>/<ch>.png` for every glyph character.
    ///
    /// The decimal point is read from `..png`, falling back to `dot.png`.
    /// Any missing or undecodable file fails with `AssetMissing`.
    pub fn load(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        info!("GlyphAtlas: Loading glyphs from {}", dir.display());

        let mut glyphs = HashMap::with_capacity(GLYPH_CHARS.len());
        for ch in GLYPH_CHARS {
            let path = Self::asset_path(dir, ch);
            let image = image::open(&path)
                .map_err(|e| DivergenceError::AssetMissing {
                    ch,
                    path: path.clone(),
                    reason: e.to_string(),
                })?
                .to_rgb8();
            debug!(
                "GlyphAtlas: {:?} -> {} ({}x{})",
                ch,
                path.display(),
                image.width(),
                image.height()
            );
            glyphs.insert(ch, Glyph::new(ch, image));
        }

        Ok(GlyphAtlas { glyphs })
    }

    /// Builds an atlas from in-memory bitmaps.
    pub fn from_images<I>(images: I) -> Result<Self>
    where
        I: IntoIterator<Item = (char, RgbImage)>,
    {
        let mut glyphs = HashMap::with_capacity(GLYPH_CHARS.len());
        for (ch, image) in images {
            if !is_glyph_char(ch) {
                return Err(DivergenceError::UnknownGlyph(ch));
            }
            glyphs.insert(ch, Glyph::new(ch, image));
        }

        if let Some(&ch) = GLYPH_CHARS.iter().find(|ch| !glyphs.contains_key(ch)) {
            return Err(DivergenceError::AssetMissing {
                ch,
                path: PathBuf::new(),
                reason: "no in-memory bitmap supplied".to_string(),
            });
        }

        Ok(GlyphAtlas { glyphs })
    }

    /// Resolves the on-disk file for `ch`.
    fn asset_path(dir: &Path, ch: char) -> PathBuf {
        let canonical = dir.join(format!("{ch}.png"));
        if ch == '.' && !canonical.exists() {
            let alias = dir.join(format!("{DOT_ALIAS_STEM}.png"));
            if alias.exists() {
                return alias;
            }
        }
        canonical
    }

    pub fn get(&self, ch: char) -> Option<&Glyph> {
        self.glyphs.get(&ch)
    }

    /// Looks up `ch`, failing with `UnknownGlyph` rather than skipping it.
    pub fn require(&self, ch: char) -> Result<&Glyph> {
        self.get(ch).ok_or(DivergenceError::UnknownGlyph(ch))
    }

    pub fn contains(&self, ch: char) -> bool {
        self.glyphs.contains_key(&ch)
    }

    /// Fails with `UnknownGlyph` on the first character outside the atlas.
    pub fn validate(&self, value: &str) -> Result<()> {
        match value.chars().find(|&ch| !self.contains(ch)) {
            Some(ch) => Err(DivergenceError::UnknownGlyph(ch)),
            None => Ok(()),
        }
    }

    pub fn chars(&self) -> impl Iterator<Item = char> + '_ {
        GLYPH_CHARS.iter().copied().filter(|ch| self.contains(*ch))
    }

    /// Height of the tallest glyph, i.e. the strip height of any frame that
    /// uses it.
    pub fn max_height(&self) -> u32 {
        self.glyphs.values().map(Glyph::height).max().unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.glyphs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.glyphs.is_empty()
    }
}
