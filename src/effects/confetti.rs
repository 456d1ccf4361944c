use super::{Effect, EffectKind, EffectSettings, Spawn, Tuning};
use crate::color::{Rgb, random_festive};
use crate::particle::{Body, Particle};
use crate::scheduler::{FrameScheduler, FrameStatus, LoopMode};
use crate::surface::Surface;
use std::f32::consts::PI;
use std::time::Duration;

const GRAVITY: f32 = 0.05;
const DAMPING: f32 = 0.98;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfettiShape {
    Square,
    Circle,
}

#[derive(Debug, Clone)]
pub struct Confetti {
    pub body: Body,
    pub size: f32,
    pub shape: ConfettiShape,
    pub color: Rgb,
}

impl Confetti {
    pub fn new(x: f32, y: f32, tuning: Tuning) -> Self {
        let spread = tuning.pick(8.0, 6.0);
        let vx = (fastrand::f32() - 0.5) * spread;
        let vy = (fastrand::f32() - 0.5) * spread;

        Self {
            body: Body::new(x, y, vx, vy, tuning.pick(120, 80))
                .with_spin(fastrand::f32() * PI * 2.0, (fastrand::f32() - 0.5) * 0.1),
            size: fastrand::f32() * tuning.pick(12.0, 8.0) + 4.0,
            shape: if fastrand::bool() { ConfettiShape::Square } else { ConfettiShape::Circle },
            color: random_festive(),
        }
    }
}

impl Particle for Confetti {
    fn update(&mut self) -> bool {
        self.body.integrate(GRAVITY, DAMPING);
        self.body.age()
    }

    fn draw(&self, surface: &mut Surface) {
        surface.save();
        surface.translate(self.body.x, self.body.y);
        surface.rotate(self.body.rotation);
        surface.set_alpha(self.body.alpha);
        surface.set_shadow_blur(10.0);
        match self.shape {
            ConfettiShape::Square => {
                let half = self.size / 2.0;
                surface.fill_rect(-half, -half, self.size, self.size, self.color);
            }
            ConfettiShape::Circle => surface.fill_circle(0.0, 0.0, self.size / 2.0, self.color),
        }
        surface.restore();
    }
}

pub struct ConfettiEffect {
    scheduler: FrameScheduler<Confetti>,
    tuning: Tuning,
    compact_width: f32,
}

impl ConfettiEffect {
    pub fn new(surface: Surface, settings: &EffectSettings) -> Self {
        let tuning = Tuning::for_width(surface.width(), settings.compact_width);
        Self {
            scheduler: FrameScheduler::new(surface, LoopMode::UntilEmpty),
            tuning,
            compact_width: settings.compact_width,
        }
    }

    pub fn tuning(&self) -> Tuning {
        self.tuning
    }

    pub fn particles(&self) -> &[Confetti] {
        self.scheduler.particles()
    }
}

impl Effect for ConfettiEffect {
    fn kind(&self) -> EffectKind {
        EffectKind::Confetti
    }

    fn trigger(&mut self, spawn: Spawn, _now: Duration) {
        let surface = self.scheduler.surface();
        let (x, y) = spawn.origin.unwrap_or((surface.width() / 2.0, surface.height() / 3.0));
        let count = spawn.count.unwrap_or(self.tuning.pick(100, 50));
        let tuning = self.tuning;
        self.scheduler.spawn((0..count).map(|_| Confetti::new(x, y, tuning)));
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

#[cfg(test)]
mod tests {
    use super::*;

    fn effect(cols: usize) -> ConfettiEffect {
        ConfettiEffect::new(Surface::resolve(cols, 30, 8.0).unwrap(), &EffectSettings::default())
    }

    #[test]
    fn ranges_follow_tuning() {
        fastrand::seed(7);
        for compact in [false, true] {
            let tuning = Tuning { compact };
            for _ in 0..200 {
                let c = Confetti::new(0.0, 0.0, tuning);
                let max_size = if compact { 12.0 } else { 16.0 };
                let spread = if compact { 3.0 } else { 4.0 };
                assert!(c.size >= 4.0 && c.size < max_size);
                assert!(c.body.vx.abs() <= spread && c.body.vy.abs() <= spread);
                assert_eq!(c.body.life, if compact { 80 } else { 120 });
                assert!(c.body.spin.abs() <= 0.05);
            }
        }
    }

    #[test]
    fn alpha_strictly_decreases_until_removal() {
        fastrand::seed(11);
        let mut c = Confetti::new(100.0, 100.0, Tuning::default());
        let mut last = c.body.alpha;
        let mut frames = 0;
        while c.update() {
            assert!(c.body.alpha < last);
            last = c.body.alpha;
            frames += 1;
        }
        assert_eq!(frames, 119);
        assert_eq!(c.body.alpha, 0.0);
    }

    #[test]
    fn burst_runs_to_exhaustion() {
        fastrand::seed(3);
        let mut fx = effect(120);
        assert!(!fx.tuning().compact);
        fx.trigger(Spawn::at(480.0, 160.0), Duration::ZERO);
        assert_eq!(fx.particle_count(), 100);

        let mut status = FrameStatus::Continue;
        let mut frames = 0;
        while status == FrameStatus::Continue {
            status = fx.update(Duration::ZERO);
            frames += 1;
            if frames == 1 {
                assert!(fx.surface().painted_pixels() > 0);
            }
        }
        assert_eq!(status, FrameStatus::Finished);
        assert_eq!(frames, 120);
        assert_eq!(fx.particle_count(), 0);
        assert!(!fx.is_running());
    }

    #[test]
    fn narrow_surface_is_compact() {
        let mut fx = effect(80);
        assert!(fx.tuning().compact);
        fx.trigger(Spawn::default(), Duration::ZERO);
        assert_eq!(fx.particle_count(), 50);
        assert!(fx.particles().iter().all(|c| c.body.life == 80));

        fx.resize(200, 40);
        assert!(!fx.tuning().compact);
        assert_eq!(fx.particle_count(), 50);
    }
}
