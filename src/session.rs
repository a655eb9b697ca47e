// src/session.rs

//! Entry points wiring config, atlas, sources and a surface together.

use crate::actor::{FrameMailbox, Presenter, PresenterSettings, ProducerActor, SourceFactory};
use crate::config::{CadencePolicy, Config};
use crate::display::DisplaySurface;
use crate::display_loop::{DisplayLoop, LoopReport, LoopSettings};
use crate::error::Result;
use crate::frame::{Border, FrameCompositor};
use crate::glyph::GlyphAtlas;
use crate::source::value::ValueMode;
use crate::source::{
    BiasedPulse, CadenceStream, ClockSource, Constant, FixedPulse, MeterSource, ValueStream,
};
use log::info;
use std::sync::Arc;
use std::time::Duration;

/// Builds the value and cadence streams for `mode`.
///
/// Meter readouts and jitter are seeded from `meter.random_seed` when set,
/// with the jitter on a derived seed so the two are not correlated.
pub fn build_sources(config: &Config, mode: ValueMode) -> Result<(ValueStream, CadenceStream)> {
    match mode {
        ValueMode::Clock => Ok((
            Box::new(ClockSource::new()),
            Box::new(Constant::new(config.clock.interval_ms)),
        )),
        ValueMode::Meter => {
            let values = MeterSource::from_config(&config.meter)?;
            let cadence: CadenceStream = match config.meter.cadence {
                CadencePolicy::Random => Box::new(BiasedPulse::from_config(
                    &config.cadence,
                    config.meter.random_seed.map(|s| s.wrapping_add(1)),
                )),
                CadencePolicy::Fixed => Box::new(FixedPulse::from_config(&config.cadence)),
            };
            Ok((Box::new(values), cadence))
        }
    }
}

pub struct Session {
    config: Config,
    compositor: FrameCompositor,
}

impl Session {
    /// Loads the glyph atlas named by the config.
    pub fn new(config: Config) -> Result<Self> {
        let atlas = GlyphAtlas::load(&config.appearance.glyph_dir)?;
        Ok(Self::with_atlas(config, Arc::new(atlas)))
    }

    pub fn with_atlas(config: Config, atlas: Arc<GlyphAtlas>) -> Self {
        let compositor = FrameCompositor::new(atlas, Border::from(&config.appearance));
        Session { config, compositor }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn compositor(&self) -> &FrameCompositor {
        &self.compositor
    }

    pub fn window_name(&self, mode: ValueMode) -> &str {
        match mode {
            ValueMode::Clock => &self.config.clock.window_name,
            ValueMode::Meter => &self.config.meter.window_name,
        }
    }

    fn loop_settings(&self, mode: ValueMode) -> LoopSettings {
        LoopSettings::new(self.window_name(mode), &self.config.appearance.save_dir)
    }

    /// Runs `mode` on the synchronous loop.
    pub fn run<S: DisplaySurface + ?Sized>(
        &self,
        mode: ValueMode,
        surface: &mut S,
    ) -> Result<LoopReport> {
        info!("Session: Starting {} mode", mode);
        let (values, cadence) = build_sources(&self.config, mode)?;
        DisplayLoop::new(
            values,
            cadence,
            self.compositor.clone(),
            surface,
            self.loop_settings(mode),
        )
        .run()
    }

    pub fn clock<S: DisplaySurface + ?Sized>(&self, surface: &mut S) -> Result<LoopReport> {
        self.run(ValueMode::Clock, surface)
    }

    pub fn meter<S: DisplaySurface + ?Sized>(&self, surface: &mut S) -> Result<LoopReport> {
        self.run(ValueMode::Meter, surface)
    }

    /// Shows `values` in order, `interval_ms` apart, under the meter window.
    ///
    /// Every value is checked against the atlas first, so a typo fails
    /// before anything is shown.
    pub fn demo<S: DisplaySurface + ?Sized>(
        &self,
        values: &[String],
        interval_ms: u64,
        surface: &mut S,
    ) -> Result<LoopReport> {
        for value in values {
            self.compositor.atlas().validate(value)?;
        }
        info!("Session: Demo of {} values", values.len());
        DisplayLoop::manual(
            values.iter().cloned(),
            interval_ms,
            self.compositor.clone(),
            surface,
            self.loop_settings(ValueMode::Meter),
        )
        .run()
    }

    /// Runs `mode` with a background producer; `m` switches modes live.
    pub fn run_threaded<S: DisplaySurface + ?Sized>(
        &self,
        mode: ValueMode,
        surface: &mut S,
    ) -> Result<LoopReport> {
        let config = self.config.clone();
        let factory: SourceFactory = Box::new(move |mode| build_sources(&config, mode));
        self.run_threaded_with(mode, factory, surface)
    }

    /// Threaded run with caller-supplied sources.
    pub fn run_threaded_with<S: DisplaySurface + ?Sized>(
        &self,
        mode: ValueMode,
        factory: SourceFactory,
        surface: &mut S,
    ) -> Result<LoopReport> {
        info!("Session: Starting threaded {} mode", mode);
        let mailbox = Arc::new(FrameMailbox::new(mode));
        let producer = ProducerActor::spawn(Arc::clone(&mailbox), self.compositor.clone(), factory)?;
        let settings = PresenterSettings {
            clock_window: self.config.clock.window_name.clone(),
            meter_window: self.config.meter.window_name.clone(),
            save_dir: self.config.appearance.save_dir.clone(),
            poll: Duration::from_millis(self.config.session.presenter_poll_ms),
        };
        let report = Presenter::new(surface, mailbox, settings).run();
        drop(producer);
        report
    }
}
