// src/config.rs

//! Defines the configuration structures for the divergence meter.
//!
//! Every section derives `Deserialize` with `#[serde(default)]`, so a config
//! file only needs the keys it wants to change. Defaults reproduce the
//! classic look: a 76/104 px border, a 60 ms jitter with 1800 ms hesitations,
//! and a one-second clock.

use crate::error::{DivergenceError, Result};
use log::{info, warn};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable naming a JSON config file.
pub const CONFIG_ENV_VAR: &str = "DIVERGENCE_CONFIG";

/// Largest accepted frame padding on any side.
pub const MAX_BORDER_PX: u32 = 4096;

/// Process-wide configuration, read from `DIVERGENCE_CONFIG` on first use.
pub static CONFIG: Lazy<Config> = Lazy::new(Config::load_or_default);

// --- Top-Level Configuration Structure ---

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct Config {
    pub appearance: AppearanceConfig,
    pub cadence: CadenceConfig,
    pub clock: ClockConfig,
    pub meter: MeterConfig,
    pub session: SessionConfig,
}

impl Config {
    /// Reads a JSON config file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| DivergenceError::Config {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        let config: Config = serde_json::from_str(&text).map_err(|e| DivergenceError::Config {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        config.appearance.check_borders().map_err(|reason| DivergenceError::Config {
            path: path.to_path_buf(),
            reason,
        })?;
        info!("Config: Loaded {}", path.display());
        Ok(config)
    }

    /// Uses the file named by `DIVERGENCE_CONFIG` if set, otherwise defaults.
    ///
    /// A broken file is logged and ignored rather than aborting startup.
    pub fn load_or_default() -> Self {
        match std::env::var_os(CONFIG_ENV_VAR) {
            Some(path) => Config::load(Path::new(&path)).unwrap_or_else(|e| {
                warn!("Config: {e}; falling back to defaults");
                Config::default()
            }),
            None => Config::default(),
        }
    }
}

// --- Appearance Configuration ---

/// Glyph assets, frame padding and snapshot location.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AppearanceConfig {
    /// Directory holding `0.png` .. `9.png` and `..png`.
    pub glyph_dir: PathBuf,
    /// Padding above and below the glyph strip.
    pub border_vertical_px: u32,
    /// Padding left and right of the glyph strip. Some older builds used
    /// `104 * 1.3`; 104 is canonical.
    pub border_horizontal_px: u32,
    /// Where `<window_name>.png` snapshots are written.
    pub save_dir: PathBuf,
}

impl Default for AppearanceConfig {
    fn default() -> Self {
        AppearanceConfig {
            glyph_dir: PathBuf::from("img"),
            border_vertical_px: 307 / 4,
            border_horizontal_px: 104,
            save_dir: PathBuf::from("."),
        }
    }
}

impl AppearanceConfig {
    fn check_borders(&self) -> std::result::Result<(), String> {
        for (name, px) in [
            ("border_vertical_px", self.border_vertical_px),
            ("border_horizontal_px", self.border_horizontal_px),
        ] {
            if px > MAX_BORDER_PX {
                return Err(format!("{name} = {px} exceeds {MAX_BORDER_PX}"));
            }
        }
        Ok(())
    }
}

// --- Cadence Configuration ---

/// Parameters of the pulse laws.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CadenceConfig {
    /// Duration of an ordinary tick.
    pub fast_ms: u64,
    /// Duration of the periodic hesitation.
    pub long_pause_ms: u64,
    /// Biased pulse: counter value that fires a long pause.
    pub threshold: u32,
    /// Biased pulse: relative weights of counter increments 0, 1, 2, ...
    pub increment_weights: Vec<u32>,
    /// Biased pulse: fast ticks after which a long pause fires regardless of
    /// the counter.
    pub max_fast_ticks: u32,
    /// Fixed pulse: every n-th tick is a long pause.
    pub fixed_period: u32,
}

impl Default for CadenceConfig {
    fn default() -> Self {
        CadenceConfig {
            fast_ms: 60,
            long_pause_ms: 1800,
            threshold: 20,
            increment_weights: vec![3, 2, 1],
            max_fast_ticks: 19,
            fixed_period: 30,
        }
    }
}

// --- Clock Configuration ---

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ClockConfig {
    pub interval_ms: u64,
    pub window_name: String,
}

impl Default for ClockConfig {
    fn default() -> Self {
        ClockConfig {
            interval_ms: 1000,
            window_name: "divergence clock".to_string(),
        }
    }
}

// --- Meter Configuration ---

/// Which pulse law drives meter mode.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum CadencePolicy {
    #[default]
    Random,
    Fixed,
}

/// Occasional override of the random readout with a fixed literal.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LuckyNumber {
    /// The literal is shown with chance `1 / (probability + 1)`.
    pub probability: u32,
    pub value: String,
}

impl Default for LuckyNumber {
    fn default() -> Self {
        LuckyNumber {
            probability: 100,
            value: "1.048596".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct MeterConfig {
    pub window_name: String,
    pub cadence: CadencePolicy,
    pub lucky_number: Option<LuckyNumber>,
    /// Seed for readouts and jitter; `None` seeds from the OS.
    pub random_seed: Option<u64>,
}

impl Default for MeterConfig {
    fn default() -> Self {
        MeterConfig {
            window_name: "divergence meter".to_string(),
            cadence: CadencePolicy::Random,
            lucky_number: None,
            random_seed: None,
        }
    }
}

// --- Session Configuration ---

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SessionConfig {
    /// How long the threaded presenter waits for a key before checking the
    /// mailbox again.
    pub presenter_poll_ms: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        SessionConfig {
            presenter_poll_ms: 16,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_match_the_classic_display() {
        let config = Config::default();
        assert_eq!(config.appearance.border_vertical_px, 76);
        assert_eq!(config.appearance.border_horizontal_px, 104);
        assert_eq!(config.cadence.fast_ms, 60);
        assert_eq!(config.cadence.long_pause_ms, 1800);
        assert_eq!(config.cadence.threshold, 20);
        assert_eq!(config.cadence.increment_weights, vec![3, 2, 1]);
        assert_eq!(config.clock.interval_ms, 1000);
        assert_eq!(config.meter.lucky_number, None);
    }

    #[test]
    fn partial_json_keeps_other_defaults() {
        let json = r#"{
            "cadence": { "fast_ms": 45 },
            "meter": { "cadence": "fixed", "lucky_number": { "probability": 9, "value": "0.571024" } }
        }"#;
        let config: Config = serde_json::from_str(json).unwrap();
        assert_eq!(config.cadence.fast_ms, 45);
        assert_eq!(config.cadence.long_pause_ms, 1800);
        assert_eq!(config.meter.cadence, CadencePolicy::Fixed);
        assert_eq!(
            config.meter.lucky_number,
            Some(LuckyNumber {
                probability: 9,
                value: "0.571024".to_string()
            })
        );
        assert_eq!(config.clock, ClockConfig::default());
    }

    #[test]
    fn load_reads_file_and_reports_bad_json() {
        let mut good = tempfile::NamedTempFile::new().unwrap();
        write!(good, r#"{{ "clock": {{ "interval_ms": 500 }} }}"#).unwrap();
        assert_eq!(Config::load(good.path()).unwrap().clock.interval_ms, 500);

        let mut bad = tempfile::NamedTempFile::new().unwrap();
        write!(bad, "{{ not json").unwrap();
        assert!(matches!(
            Config::load(bad.path()),
            Err(DivergenceError::Config { .. })
        ));
    }

    #[test]
    fn load_rejects_oversized_borders() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "appearance": {{ "border_horizontal_px": 4294967295 }} }}"#).unwrap();
        match Config::load(file.path()) {
            Err(DivergenceError::Config { reason, .. }) => {
                assert!(reason.contains("border_horizontal_px"), "{reason}")
            }
            other => panic!("expected a config error, got {other:?}"),
        }
    }
}
