use super::{Effect, EffectKind, EffectSettings, Spawn, Tuning};
use crate::particle::{Body, Particle};
use crate::scheduler::{FrameScheduler, FrameStatus, LoopMode};
use crate::surface::Surface;
use std::f32::consts::PI;
use std::rc::Rc;
use std::time::Duration;

const GRAVITY: f32 = 0.05;
const DAMPING: f32 = 0.98;

#[derive(Debug, Clone)]
pub struct Emoji {
    pub body: Body,
    pub size: f32,
    glyph: Rc<str>,
}

impl Emoji {
    /// Launches upward from `(x, y)`.
    pub fn new(x: f32, y: f32, glyph: Rc<str>, tuning: Tuning) -> Self {
        let vx = (fastrand::f32() - 0.5) * tuning.pick(12.0, 8.0);
        let vy = -(fastrand::f32() * tuning.pick(15.0, 10.0) + 5.0);

        Self {
            body: Body::new(x, y, vx, vy, tuning.pick(100, 80))
                .with_spin(fastrand::f32() * PI * 2.0, (fastrand::f32() - 0.5) * 0.15),
            size: tuning.pick(36.0, 24.0),
            glyph,
        }
    }

    pub fn glyph(&self) -> &str {
        &self.glyph
    }
}

impl Particle for Emoji {
    fn update(&mut self) -> bool {
        self.body.integrate(GRAVITY, DAMPING);
        self.body.age()
    }

    fn draw(&self, surface: &mut Surface) {
        surface.save();
        surface.translate(self.body.x, self.body.y);
        surface.rotate(self.body.rotation);
        surface.set_alpha(self.body.alpha);
        surface.fill_text(0.0, 0.0, &self.glyph, (255, 255, 255));
        surface.restore();
    }
}

/// Emojis thrown up from random points along the bottom edge.
pub struct EmojiEffect {
    scheduler: FrameScheduler<Emoji>,
    glyph: Rc<str>,
    tuning: Tuning,
    compact_width: f32,
}

impl EmojiEffect {
    pub fn new(surface: Surface, settings: &EffectSettings) -> Self {
        let tuning = Tuning::for_width(surface.width(), settings.compact_width);
        Self {
            scheduler: FrameScheduler::new(surface, LoopMode::UntilEmpty),
            glyph: Rc::from(settings.emoji.as_str()),
            tuning,
            compact_width: settings.compact_width,
        }
    }

    pub fn particles(&self) -> &[Emoji] {
        self.scheduler.particles()
    }
}

impl Effect for EmojiEffect {
    fn kind(&self) -> EffectKind {
        EffectKind::Emoji
    }

    /// The spawn origin is ignored; every emoji picks its own launch point.
    fn trigger(&mut self, spawn: Spawn, _now: Duration) {
        let width = self.scheduler.surface().width();
        let height = self.scheduler.surface().height();
        let count = spawn.count.unwrap_or(self.tuning.pick(30, 20));
        let tuning = self.tuning;
        let glyph = &self.glyph;
        self.scheduler.spawn(
            (0..count).map(|_| Emoji::new(fastrand::f32() * width, height, Rc::clone(glyph), tuning)),
        );
    }

    fn update(&mut self, _now: Duration) -> FrameStatus {
        self.scheduler.frame()
    }

    fn resize(&mut self, cols: usize, rows: usize) {
        self.scheduler.resize(cols, rows);
        self.tuning = Tuning::for_width(self.scheduler.surface().width(), self.compact_width);
    }

    fn surface(&self) -> &Surface {
        self.scheduler.surface()
    }

    fn is_running(&self) -> bool {
        self.scheduler.is_running()
    }

    fn particle_count(&self) -> usize {
        self.scheduler.len()
    }
}
