//! Scratch-off reveal driven by pointer input.
//!
//! The engine is a small state machine fed with `down`, `move` and `up`
//! messages plus `reset`. It erases discs from a [`CoverageMask`], reveals
//! once the scratched share reaches the configured threshold, fades the
//! mask out and then reports completion once per card.

pub mod mask;

pub use mask::{CoverageMask, RasterMask};

use crate::config::ScratchConfig;
use crate::outcome::PlayOutcome;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScratchPhase {
    Masked,
    PartiallyRevealed,
    Revealed,
}

/// Snapshot handed to the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScratchState {
    /// Share of the surface already erased. Never decreases between resets.
    pub scratched_fraction: f64,
    pub threshold_fraction: f64,
    pub revealed: bool,
}

impl ScratchState {
    /// Share of the surface still covered.
    pub fn covered_fraction(&self) -> f64 {
        1.0 - self.scratched_fraction
    }

    pub fn phase(&self) -> ScratchPhase {
        if self.revealed {
            ScratchPhase::Revealed
        } else if self.scratched_fraction > 0.0 {
            ScratchPhase::PartiallyRevealed
        } else {
            ScratchPhase::Masked
        }
    }
}

/// Discrete notifications produced by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScratchEvent {
    /// First pointer-down on this card.
    Started,
    /// Threshold crossed; the fade-out has begun.
    Revealed,
    /// Fade-out finished.
    Completed,
}

type CompletionCallback = Box<dyn FnMut(Option<PlayOutcome>) + Send>;

pub struct ScratchEngine<M: CoverageMask = RasterMask> {
    mask: M,
    config: ScratchConfig,
    outcome: Option<PlayOutcome>,
    active: bool,
    started: bool,
    revealed_at: Option<Instant>,
    completed: bool,
    on_complete: Option<CompletionCallback>,
}

impl ScratchEngine<RasterMask> {
    pub fn with_raster(width: u32, height: u32, config: ScratchConfig) -> Self {
        Self::new(RasterMask::new(width, height), config)
    }
}

impl<M: CoverageMask> ScratchEngine<M> {
    pub fn new(mask: M, config: ScratchConfig) -> Self {
        Self {
            mask,
            config,
            outcome: None,
            active: false,
            started: false,
            revealed_at: None,
            completed: false,
            on_complete: None,
        }
    }

    /// Registers the callback run each time a card's fade-out ends. It
    /// receives the outcome hidden under the mask.
    pub fn on_complete(&mut self, callback: impl FnMut(Option<PlayOutcome>) + Send + 'static) {
        self.on_complete = Some(Box::new(callback));
    }

    /// Covers a fresh outcome, discarding any previous reveal.
    pub fn load(&mut self, outcome: PlayOutcome) {
        self.reset();
        self.outcome = Some(outcome);
    }

    pub fn outcome(&self) -> Option<PlayOutcome> {
        self.outcome
    }

    pub fn mask(&self) -> &M {
        &self.mask
    }

    pub fn state(&self) -> ScratchState {
        ScratchState {
            scratched_fraction: self.mask.scratched_fraction(),
            threshold_fraction: self.config.reveal_threshold,
            revealed: self.is_revealed(),
        }
    }

    pub fn is_revealed(&self) -> bool {
        self.revealed_at.is_some()
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn is_completed(&self) -> bool {
        self.completed
    }

    /// Returns [`ScratchEvent::Started`] for the first press on this card.
    pub fn on_pointer_down(&mut self) -> Option<ScratchEvent> {
        if self.is_revealed() || self.active {
            return None;
        }
        self.active = true;

        if self.started {
            return None;
        }
        self.started = true;
        tracing::debug!("Scratching started");
        Some(ScratchEvent::Started)
    }

    pub fn on_pointer_move(&mut self, position: Point) -> Option<ScratchEvent> {
        self.on_pointer_move_at(position, Instant::now())
    }

    /// Erases a disc centred on `position`. Only the part of the disc that
    /// overlaps the surface is cleared, so a brush far outside erases
    /// nothing. Ignored without an active press or after the reveal.
    pub fn on_pointer_move_at(&mut self, position: Point, now: Instant) -> Option<ScratchEvent> {
        if !self.active || self.is_revealed() {
            return None;
        }

        self.mask.erase_disc(position, self.config.brush_radius);

        if self.mask.scratched_fraction() >= self.config.reveal_threshold {
            return self.begin_reveal(now);
        }
        None
    }

    pub fn on_pointer_up(&mut self) {
        self.active = false;
    }

    /// Forces the reveal regardless of how much has been scratched.
    pub fn reveal(&mut self, now: Instant) -> Option<ScratchEvent> {
        if self.is_revealed() {
            return None;
        }
        self.begin_reveal(now)
    }

    fn begin_reveal(&mut self, now: Instant) -> Option<ScratchEvent> {
        self.revealed_at = Some(now);
        self.active = false;
        tracing::debug!(
            "Card revealed at {:.1}% scratched",
            self.mask.scratched_fraction() * 100.0
        );
        Some(ScratchEvent::Revealed)
    }

    /// Mask opacity for the fade-out: 1.0 until revealed, then linearly
    /// down to 0.0 over the fade duration.
    pub fn mask_opacity(&self, now: Instant) -> f64 {
        let Some(revealed_at) = self.revealed_at else {
            return 1.0;
        };
        let fade = self.config.fade_duration();
        if fade.is_zero() {
            return 0.0;
        }

        let elapsed = now.saturating_duration_since(revealed_at);
        (1.0 - elapsed.as_secs_f64() / fade.as_secs_f64()).clamp(0.0, 1.0)
    }

    /// Advances the fade. Returns [`ScratchEvent::Completed`] and runs the
    /// callback the first time this card's fade has fully elapsed.
    pub fn tick(&mut self, now: Instant) -> Option<ScratchEvent> {
        let revealed_at = self.revealed_at?;
        if self.completed || now.saturating_duration_since(revealed_at) < self.config.fade_duration() {
            return None;
        }

        self.completed = true;
        if let Some(callback) = self.on_complete.as_mut() {
            callback(self.outcome);
        }
        Some(ScratchEvent::Completed)
    }

    /// Back to fully covered. The outcome and completion callback stay.
    pub fn reset(&mut self) {
        self.mask.reset();
        self.active = false;
        self.started = false;
        self.revealed_at = None;
        self.completed = false;
    }
}

impl<M: CoverageMask> fmt::Debug for ScratchEngine<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScratchEngine")
            .field("state", &self.state())
            .field("active", &self.active)
            .field("completed", &self.completed)
            .finish()
    }
}
