// src/source/value.rs

//! Value-string sources: the wall clock and the random meter readout.

use super::Stream;
use crate::config::{LuckyNumber, MeterConfig};
use crate::error::{DivergenceError, Result};
use crate::glyph::is_glyph_char;
use chrono::{Local, NaiveTime};
use log::{debug, trace};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::fmt;

/// What the display is currently showing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueMode {
    Clock,
    Meter,
}

impl ValueMode {
    pub fn toggled(self) -> Self {
        match self {
            ValueMode::Clock => ValueMode::Meter,
            ValueMode::Meter => ValueMode::Clock,
        }
    }
}

impl fmt::Display for ValueMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueMode::Clock => f.write_str("clock"),
            ValueMode::Meter => f.write_str("meter"),
        }
    }
}

type TimeFn = Box<dyn FnMut() -> NaiveTime + Send>;

/// Local time as `HH.MM.SS`, sampled on every pull.
pub struct ClockSource {
    now: TimeFn,
}

impl ClockSource {
    pub fn new() -> Self {
        Self::with_time_fn(|| Local::now().time())
    }

    /// Replaces the wall clock, e.g. with a scripted sequence in tests.
    pub fn with_time_fn(now: impl FnMut() -> NaiveTime + Send + 'static) -> Self {
        ClockSource { now: Box::new(now) }
    }

    pub fn format(time: NaiveTime) -> String {
        time.format("%H.%M.%S").to_string()
    }
}

impl Default for ClockSource {
    fn default() -> Self {
        Self::new()
    }
}

impl Stream for ClockSource {
    type Item = String;

    fn pull(&mut self) -> Option<String> {
        Some(Self::format((self.now)()))
    }
}

/// Seven uniform random digits formatted `D.DDDDDD`.
pub struct MeterSource {
    rng: StdRng,
    lucky: Option<LuckyNumber>,
}

impl MeterSource {
    pub const DIGITS: usize = 7;

    pub fn new(rng: StdRng) -> Self {
        MeterSource { rng, lucky: None }
    }

    /// Adds the lucky-number override. The literal must be displayable.
    pub fn with_lucky_number(mut self, lucky: LuckyNumber) -> Result<Self> {
        if let Some(ch) = lucky.value.chars().find(|&ch| !is_glyph_char(ch)) {
            return Err(DivergenceError::UnknownGlyph(ch));
        }
        debug!(
            "MeterSource: Lucky number {:?} at 1/{}",
            lucky.value,
            u64::from(lucky.probability) + 1
        );
        self.lucky = Some(lucky);
        Ok(self)
    }

    pub fn from_config(config: &MeterConfig) -> Result<Self> {
        let rng = match config.random_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let source = MeterSource::new(rng);
        match &config.lucky_number {
            Some(lucky) => source.with_lucky_number(lucky.clone()),
            None => Ok(source),
        }
    }

    fn draw_digits(&mut self) -> String {
        let mut value = String::with_capacity(Self::DIGITS + 1);
        for i in 0..Self::DIGITS {
            if i == 1 {
                value.push('.');
            }
            let digit = self.rng.gen_range(0..10u32);
            value.push(char::from_digit(digit, 10).unwrap_or('0'));
        }
        value
    }
}

impl Stream for MeterSource {
    type Item = String;

    fn pull(&mut self) -> Option<String> {
        if let Some(lucky) = &self.lucky {
            let p = lucky.probability;
            if self.rng.gen_range(0..=p) == p {
                trace!("MeterSource: Lucky draw");
                return Some(lucky.value.clone());
            }
        }
        Some(self.draw_digits())
    }
}
