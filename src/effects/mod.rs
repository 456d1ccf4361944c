use crate::scheduler::FrameStatus;
use crate::surface::Surface;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub mod ambient;
pub mod confetti;
pub mod emoji;
pub mod fireworks;
pub mod registry;

pub use registry::EffectRegistry;

/// Declaration order is also paint order, bottom first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EffectKind {
    Caps,
    Hearts,
    Fireworks,
    Confetti,
    Emoji,
}

impl EffectKind {
    pub fn name(&self) -> &'static str {
        match self {
            EffectKind::Caps => "caps",
            EffectKind::Hearts => "hearts",
            EffectKind::Fireworks => "fireworks",
            EffectKind::Confetti => "confetti",
            EffectKind::Emoji => "emoji",
        }
    }

    pub fn is_ambient(&self) -> bool {
        matches!(self, EffectKind::Caps | EffectKind::Hearts)
    }
}

/// Reduced particle ranges for narrow displays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Tuning {
    pub compact: bool,
}

impl Tuning {
    pub fn for_width(width: f32, compact_width: f32) -> Self {
        Self { compact: width <= compact_width }
    }

    pub fn pick<T>(&self, full: T, compact: T) -> T {
        if self.compact { compact } else { full }
    }
}

/// Settings shared by every controller on a page.
#[derive(Debug, Clone, PartialEq)]
pub struct EffectSettings {
    pub pixel_scale: f32,
    pub compact_width: f32,
    pub emoji: String,
}

impl Default for EffectSettings {
    fn default() -> Self {
        Self {
            pixel_scale: 8.0,
            compact_width: 768.0,
            emoji: "🎉".to_string(),
        }
    }
}

/// Where and how many. `None` lets the controller pick its default.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Spawn {
    pub origin: Option<(f32, f32)>,
    pub count: Option<usize>,
}

impl Spawn {
    pub fn at(x: f32, y: f32) -> Self {
        Self { origin: Some((x, y)), count: None }
    }

    pub fn with_count(mut self, count: usize) -> Self {
        self.count = Some(count);
        self
    }
}

pub trait Effect {
    fn kind(&self) -> EffectKind;
    fn trigger(&mut self, spawn: Spawn, now: Duration);
    /// Fires due timers, then runs at most one frame.
    fn update(&mut self, now: Duration) -> FrameStatus;
    fn resize(&mut self, cols: usize, rows: usize);
    fn surface(&self) -> &Surface;
    fn is_running(&self) -> bool;
    fn particle_count(&self) -> usize;
}
