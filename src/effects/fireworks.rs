use super::{Effect, EffectKind, EffectSettings, Spawn, Tuning};
use crate::color::Rgb;
use crate::particle::{Body, Particle};
use crate::scheduler::{DelayQueue, FrameScheduler, FrameStatus, LoopMode};
use crate::surface::Surface;
use std::f32::consts::PI;
use std::time::Duration;

const COLORS: [Rgb; 7] = [
    (255, 51, 51),   // Red
    (255, 215, 0),   // Gold
    (51, 255, 51),   // Green
    (51, 51, 255),   // Blue
    (255, 51, 255),  // Purple
    (255, 255, 255), // White
    (255, 153, 51),  // Orange
];

const WHITE: Rgb = (255, 255, 255);

const GRAVITY: f32 = 0.02;
const DAMPING: f32 = 0.99;

/// Coloured burst `i` launches at `i * BURST_STEP`.
pub const BURST_STEP: Duration = Duration::from_millis(300);
/// White burst `i` launches at `i * WHITE_STEP + WHITE_OFFSET`.
pub const WHITE_STEP: Duration = Duration::from_millis(400);
pub const WHITE_OFFSET: Duration = Duration::from_millis(200);

/// A line segment trailing behind its head along the velocity.
#[derive(Debug, Clone)]
pub struct Streak {
    pub body: Body,
    pub length: f32,
    pub color: Rgb,
    drift: f32,
}

impl Streak {
    pub fn new(x: f32, y: f32, angle: f32, velocity: f32, length: f32, color: Rgb, life: u32) -> Self {
        Self {
            body: Body::new(x, y, angle.cos() * velocity, angle.sin() * velocity, life),
            length,
            color,
            drift: (fastrand::f32() - 0.5) * 0.1,
        }
    }

    pub fn tail(&self) -> (f32, f32) {
        (
            self.body.x - self.body.vx * self.length,
            self.body.y - self.body.vy * self.length,
        )
    }
}

impl Particle for Streak {
    fn update(&mut self) -> bool {
        let body = &mut self.body;
        body.vy += GRAVITY;
        body.x += body.vx + self.drift;
        body.y += body.vy;
        body.vx *= DAMPING;
        body.vy *= DAMPING;
        body.age()
    }

    fn draw(&self, surface: &mut Surface) {
        let (tx, ty) = self.tail();
        surface.save();
        surface.set_alpha(self.body.alpha);
        surface.set_shadow_blur(10.0);
        surface.stroke_line(self.body.x, self.body.y, tx, ty, 2.0, self.color);
        surface.restore();
    }
}

/// Streaks fanned evenly around the centre with a little angular jitter.
pub fn burst(x: f32, y: f32, streaks: usize, color: Rgb, tuning: Tuning) -> Vec<Streak> {
    (0..streaks)
        .map(|i| {
            let angle = (i as f32 / streaks as f32) * PI * 2.0 + (fastrand::f32() - 0.5) * 0.1;
            let velocity = 3.0 + fastrand::f32() * 2.0;
            let length = if tuning.compact {
                5.0 + fastrand::f32() * 5.0
            } else {
                8.0 + fastrand::f32() * 8.0
            };
            let life = if tuning.compact {
                fastrand::u32(60..80)
            } else {
                fastrand::u32(80..110)
            };
            Streak::new(x, y, angle, velocity, length, color, life)
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BurstPlan {
    /// Position within its series (coloured or white).
    pub index: usize,
    pub streaks: usize,
    pub white: bool,
    pub origin: Option<(f32, f32)>,
}

/// Clustered launches: a series of coloured bursts followed, interleaved, by a
/// smaller series of white ones. Launches are timer-driven.
pub struct FireworksEffect {
    scheduler: FrameScheduler<Streak>,
    schedule: DelayQueue<BurstPlan>,
    tuning: Tuning,
    compact_width: f32,
}

impl FireworksEffect {
    pub fn new(surface: Surface, settings: &EffectSettings) -> Self {
        let tuning = Tuning::for_width(surface.width(), settings.compact_width);
        Self {
            scheduler: FrameScheduler::new(surface, LoopMode::UntilEmpty),
            schedule: DelayQueue::new(),
            tuning,
            compact_width: settings.compact_width,
        }
    }

    pub fn pending_bursts(&self) -> usize {
        self.schedule.len()
    }

    /// Launches every burst that is due at `now`. Returns what was launched.
    pub fn launch_due(&mut self, now: Duration) -> Vec<BurstPlan> {
        let due = self.schedule.drain_due(now);
        let width = self.scheduler.surface().width();
        let height = self.scheduler.surface().height();

        for plan in &due {
            let (x, y) = plan.origin.unwrap_or_else(|| {
                (
                    width * (0.3 + fastrand::f32() * 0.4),
                    height * (0.2 + fastrand::f32() * 0.3),
                )
            });
            let color = if plan.white {
                WHITE
            } else {
                COLORS[fastrand::usize(0..COLORS.len())]
            };
            self.scheduler.spawn(burst(x, y, plan.streaks, color, self.tuning));
        }

        if !due.is_empty() {
            tracing::debug!(launched = due.len(), pending = self.schedule.len(), "fireworks burst");
        }
        due
    }
}

impl Effect for FireworksEffect {
    fn kind(&self) -> EffectKind {
        EffectKind::Fireworks
    }

    /// `spawn.count` overrides the number of coloured bursts; a given origin
    /// pins every burst to that point.
    fn trigger(&mut self, spawn: Spawn, now: Duration) {
        let bursts = spawn.count.unwrap_or(self.tuning.pick(5, 3));
        let whites = self.tuning.pick(3, 2);
        let streaks = self.tuning.pick(30, 20);

        for index in 0..bursts {
            self.schedule.schedule(
                now + BURST_STEP * index as u32,
                BurstPlan { index, streaks, white: false, origin: spawn.origin },
            );
        }
        for index in 0..whites {
            self.schedule.schedule(
                now + WHITE_STEP * index as u32 + WHITE_OFFSET,
                BurstPlan { index, streaks: streaks / 2, white: true, origin: spawn.origin },
            );
        }
    }

    fn update(&mut self, now: Duration) -> FrameStatus {
        self.launch_due(now);
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
        self.scheduler.is_running() || !self.schedule.is_empty()
    }

    fn particle_count(&self) -> usize {
        self.scheduler.len()
    }
}
