// src/source/cadence.rs

//! Wait-duration streams that give the display its mechanical hesitation.
//!
//! The biased pulse is the canonical meter rhythm: short 60 ms ticks while a
//! counter creeps up by a random 0, 1 or 2, then one long 1800 ms pause when
//! it reaches the threshold. Because the counter often advances by more than
//! one, the hesitations arrive earlier and less regularly than a plain
//! "every n-th tick" law would produce.
//!
//! The law itself is the pure `PulseLaw::next`; the streams only own the
//! state and the random draw.

use super::Stream;
use crate::config::CadenceConfig;
use log::{trace, warn};
use rand::distributions::{Distribution, WeightedIndex};
use rand::rngs::StdRng;
use rand::SeedableRng;

/// Counter state of the biased pulse.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CadenceState {
    /// Starts at 1, grows by the drawn increment on every fast tick.
    pub counter: u32,
    /// Fast ticks since the last long pause.
    pub fast_ticks: u32,
}

impl CadenceState {
    pub const INITIAL: CadenceState = CadenceState {
        counter: 1,
        fast_ticks: 0,
    };
}

impl Default for CadenceState {
    fn default() -> Self {
        CadenceState::INITIAL
    }
}

/// Durations and limits of the biased pulse.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PulseLaw {
    pub fast_ms: u64,
    pub long_pause_ms: u64,
    pub threshold: u32,
    pub max_fast_ticks: u32,
}

impl Default for PulseLaw {
    fn default() -> Self {
        PulseLaw {
            fast_ms: 60,
            long_pause_ms: 1800,
            threshold: 20,
            max_fast_ticks: 19,
        }
    }
}

impl From<&CadenceConfig> for PulseLaw {
    fn from(config: &CadenceConfig) -> Self {
        PulseLaw {
            fast_ms: config.fast_ms,
            long_pause_ms: config.long_pause_ms,
            threshold: config.threshold,
            max_fast_ticks: config.max_fast_ticks,
        }
    }
}

impl PulseLaw {
    /// One tick of the law.
    ///
    /// A long pause fires, and the state resets, once the counter has reached
    /// the threshold or `max_fast_ticks` fast ticks have gone by. Otherwise
    /// the tick is fast and the counter advances by `increment`.
    pub fn next(&self, state: CadenceState, increment: u32) -> (u64, CadenceState) {
        if state.counter >= self.threshold || state.fast_ticks >= self.max_fast_ticks {
            (self.long_pause_ms, CadenceState::INITIAL)
        } else {
            let advanced = CadenceState {
                counter: state.counter.saturating_add(increment),
                fast_ticks: state.fast_ticks + 1,
            };
            (self.fast_ms, advanced)
        }
    }
}

/// The biased-random pulse: increments drawn with weights 3:2:1 for 0, 1, 2.
pub struct BiasedPulse {
    law: PulseLaw,
    state: CadenceState,
    increments: WeightedIndex<u32>,
    rng: StdRng,
}

impl BiasedPulse {
    pub const DEFAULT_WEIGHTS: [u32; 3] = [3, 2, 1];

    pub fn new(law: PulseLaw, rng: StdRng) -> Self {
        Self::with_weights(law, &Self::DEFAULT_WEIGHTS, rng)
    }

    /// `weights[k]` is the relative chance of incrementing by `k`. Unusable
    /// weights (empty, all zero) fall back to the default 3:2:1.
    pub fn with_weights(law: PulseLaw, weights: &[u32], rng: StdRng) -> Self {
        let increments = WeightedIndex::new(weights.iter().copied()).unwrap_or_else(|e| {
            warn!("BiasedPulse: Invalid increment weights {weights:?} ({e}); using 3:2:1");
            Self::default_increments()
        });
        BiasedPulse {
            law,
            state: CadenceState::INITIAL,
            increments,
            rng,
        }
    }

    pub fn from_config(config: &CadenceConfig, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self::with_weights(PulseLaw::from(config), &config.increment_weights, rng)
    }

    fn default_increments() -> WeightedIndex<u32> {
        match WeightedIndex::new(Self::DEFAULT_WEIGHTS) {
            Ok(dist) => dist,
            Err(_) => unreachable!("default weights are positive"),
        }
    }

    pub fn state(&self) -> CadenceState {
        self.state
    }
}

impl Stream for BiasedPulse {
    type Item = u64;

    fn pull(&mut self) -> Option<u64> {
        // Drawn every tick, long pauses included.
        let increment = self.increments.sample(&mut self.rng) as u32;
        let (ms, next) = self.law.next(self.state, increment);
        trace!("BiasedPulse: {:?} +{} -> {} ms", self.state, increment, ms);
        self.state = next;
        Some(ms)
    }
}

/// Deterministic slow pulse: fast ticks with every `period`-th one long.
#[derive(Debug, Clone)]
pub struct FixedPulse {
    fast_ms: u64,
    long_pause_ms: u64,
    period: u32,
    counter: u32,
}

impl FixedPulse {
    pub fn new(fast_ms: u64, long_pause_ms: u64, period: u32) -> Self {
        FixedPulse {
            fast_ms,
            long_pause_ms,
            period: period.max(1),
            counter: 1,
        }
    }

    pub fn from_config(config: &CadenceConfig) -> Self {
        Self::new(config.fast_ms, config.long_pause_ms, config.fixed_period)
    }
}

impl Default for FixedPulse {
    fn default() -> Self {
        FixedPulse::new(60, 1800, 30)
    }
}

impl Stream for FixedPulse {
    type Item = u64;

    fn pull(&mut self) -> Option<u64> {
        if self.counter >= self.period {
            self.counter = 1;
            Some(self.long_pause_ms)
        } else {
            self.counter += 1;
            Some(self.fast_ms)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::Constant;

    fn seeded(seed: u64) -> BiasedPulse {
        BiasedPulse::new(PulseLaw::default(), StdRng::seed_from_u64(seed))
    }

    /// Fast-tick counts between consecutive long pauses.
    fn gaps(durations: &[u64]) -> Vec<usize> {
        let longs: Vec<usize> = durations
            .iter()
            .enumerate()
            .filter(|(_, &ms)| ms == 1800)
            .map(|(i, _)| i)
            .collect();
        longs.windows(2).map(|w| w[1] - w[0] - 1).collect()
    }

    #[test]
    fn law_fires_long_pause_at_threshold_and_resets() {
        let law = PulseLaw::default();
        let at_threshold = CadenceState {
            counter: 20,
            fast_ticks: 12,
        };
        assert_eq!(law.next(at_threshold, 2), (1800, CadenceState::INITIAL));

        let beyond = CadenceState {
            counter: 21,
            fast_ticks: 10,
        };
        assert_eq!(law.next(beyond, 0), (1800, CadenceState::INITIAL));
    }

    #[test]
    fn law_advances_counter_on_fast_ticks() {
        let law = PulseLaw::default();
        let (ms, s) = law.next(CadenceState::INITIAL, 2);
        assert_eq!(ms, 60);
        assert_eq!(
            s,
            CadenceState {
                counter: 3,
                fast_ticks: 1
            }
        );
        let (ms, s2) = law.next(s, 0);
        assert_eq!(ms, 60);
        assert_eq!(s2.counter, 3);
        assert_eq!(s2.fast_ticks, 2);
    }

    #[test]
    fn maximal_increments_give_the_shortest_gap() {
        let law = PulseLaw::default();
        let mut state = CadenceState::INITIAL;
        let mut fast = 0;
        loop {
            let (ms, next) = law.next(state, 2);
            state = next;
            if ms == 1800 {
                break;
            }
            fast += 1;
        }
        assert_eq!(fast, 10);
    }

    #[test]
    fn unit_increments_give_the_longest_gap() {
        let law = PulseLaw::default();
        let mut state = CadenceState::INITIAL;
        let mut fast = 0;
        while law.next(state, 1).0 == 60 {
            state = law.next(state, 1).1;
            fast += 1;
        }
        assert_eq!(fast, 19);
    }

    #[test]
    fn zero_increments_are_capped() {
        let law = PulseLaw::default();
        let mut state = CadenceState::INITIAL;
        let mut emitted = Vec::new();
        for _ in 0..40 {
            let (ms, next) = law.next(state, 0);
            emitted.push(ms);
            state = next;
        }
        assert_eq!(gaps(&emitted), vec![19]);
        assert_eq!(emitted[19], 1800);
    }

    #[test]
    fn biased_pulse_gaps_stay_within_bounds() {
        for seed in 0..8 {
            let mut pulse = seeded(seed);
            let durations: Vec<u64> = (0..20_000).map(|_| pulse.pull().unwrap()).collect();
            assert!(durations.iter().all(|&ms| ms == 60 || ms == 1800));
            let gaps = gaps(&durations);
            assert!(gaps.len() > 100, "seed {seed}: too few pauses");
            for gap in gaps {
                assert!((10..=19).contains(&gap), "seed {seed}: gap {gap}");
            }
        }
    }

    #[test]
    fn biased_pulse_counter_is_monotonic_between_resets() {
        let mut pulse = seeded(42);
        let mut prev = pulse.state();
        for _ in 0..5_000 {
            let ms = pulse.pull().unwrap();
            let now = pulse.state();
            if ms == 1800 {
                assert_eq!(now, CadenceState::INITIAL);
            } else {
                assert!(now.counter >= prev.counter);
                assert!(prev.counter < 20);
            }
            prev = now;
        }
    }

    #[test]
    fn biased_pulse_is_reproducible_from_a_seed() {
        let a: Vec<u64> = {
            let mut p = seeded(7);
            (0..500).map(|_| p.pull().unwrap()).collect()
        };
        let b: Vec<u64> = {
            let mut p = seeded(7);
            (0..500).map(|_| p.pull().unwrap()).collect()
        };
        assert_eq!(a, b);
    }

    #[test]
    fn invalid_weights_fall_back_to_default() {
        let mut pulse =
            BiasedPulse::with_weights(PulseLaw::default(), &[0, 0, 0], StdRng::seed_from_u64(1));
        let durations: Vec<u64> = (0..2_000).map(|_| pulse.pull().unwrap()).collect();
        assert!(gaps(&durations).iter().all(|g| (10..=19).contains(g)));
    }

    #[test]
    fn fixed_pulse_hesitates_every_thirtieth_tick() {
        let mut pulse = FixedPulse::default();
        let durations: Vec<u64> = (0..90).map(|_| pulse.pull().unwrap()).collect();
        for (i, ms) in durations.iter().enumerate() {
            let expected = if (i + 1) % 30 == 0 { 1800 } else { 60 };
            assert_eq!(*ms, expected, "tick {}", i + 1);
        }
    }

    #[test]
    fn constant_cadence_is_a_degenerate_pulse() {
        let mut clock = Constant::new(1000u64);
        assert_eq!(clock.pull(), Some(1000));
        assert_eq!(clock.pull(), Some(1000));
    }
}
