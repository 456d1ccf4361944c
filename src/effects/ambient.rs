use super::{Effect, EffectKind, Spawn};
use crate::color::Rgb;
use crate::particle::Particle;
use crate::scheduler::{FrameScheduler, FrameStatus, LoopMode};
use crate::surface::Surface;
use std::f32::consts::PI;
use std::time::Duration;

const CAP_FILL: Rgb = (191, 165, 138);
const CAP_LINE: Rgb = (34, 34, 34);
const HEART_FILL: Rgb = (255, 120, 150);
const HEART_LINE: Rgb = (200, 60, 90);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FloaterShape {
    Cap,
    Heart,
}

/// A faint shape rising slowly forever.
#[derive(Debug, Clone)]
pub struct Floater {
    pub x: f32,
    pub y: f32,
    pub size: f32,
    pub alpha: f32,
    pub speed: f32,
    pub drift: f32,
    pub rotation: f32,
    pub spin: f32,
    pub shape: FloaterShape,
}

impl Floater {
    pub fn new(width: f32, height: f32, shape: FloaterShape) -> Self {
        Self {
            x: fastrand::f32() * width,
            y: fastrand::f32() * height,
            size: 18.0 + fastrand::f32() * 22.0,
            alpha: 0.15 + fastrand::f32() * 0.25,
            speed: 0.3 + fastrand::f32() * 0.5,
            drift: (fastrand::f32() - 0.5) * 0.3,
            rotation: fastrand::f32() * PI * 2.0,
            spin: (fastrand::f32() - 0.5) * 0.003,
            shape,
        }
    }

    /// Graduation cap in a 40x40 box: board, tassel cord, tassel knot.
    fn draw_cap(surface: &mut Surface, alpha: f32) {
        let board = [(-20.0, 0.0), (0.0, -10.0), (20.0, 0.0), (0.0, 10.0)];
        surface.set_shadow_blur(8.0);
        surface.fill_polygon(&board, CAP_FILL);
        surface.set_shadow_blur(0.0);
        surface.set_alpha(alpha * 0.8);
        surface.stroke_polygon(&board, 2.0, CAP_LINE);
        surface.stroke_line(0.0, 10.0, 0.0, 20.0, 2.0, CAP_LINE);
        surface.set_alpha(alpha);
        surface.fill_circle(0.0, 20.0, 3.0, CAP_FILL);
    }

    fn draw_heart(surface: &mut Surface) {
        surface.set_shadow_blur(8.0);
        surface.fill_polygon(&heart_outline(), HEART_FILL);
        surface.set_shadow_blur(0.0);
        surface.stroke_polygon(&heart_outline(), 1.5, HEART_LINE);
    }
}

/// Classic parametric heart, scaled to roughly fit a 40x40 box.
fn heart_outline() -> Vec<(f32, f32)> {
    const POINTS: usize = 24;
    (0..POINTS)
        .map(|i| {
            let t = (i as f32 / POINTS as f32) * PI * 2.0;
            let x = 16.0 * t.sin().powi(3);
            let y = -(13.0 * t.cos() - 5.0 * (2.0 * t).cos() - 2.0 * (3.0 * t).cos() - (4.0 * t).cos());
            (x * 1.2, y * 1.2)
        })
        .collect()
}

impl Particle for Floater {
    fn update(&mut self) -> bool {
        self.y -= self.speed;
        self.x += self.drift;
        self.rotation += self.spin;
        true
    }

    fn draw(&self, surface: &mut Surface) {
        surface.save();
        surface.set_alpha(self.alpha);
        surface.translate(self.x, self.y);
        surface.rotate(self.rotation);
        surface.scale(self.size / 40.0, self.size / 40.0);
        match self.shape {
            FloaterShape::Cap => Self::draw_cap(surface, self.alpha),
            FloaterShape::Heart => Self::draw_heart(surface),
        }
        surface.restore();
    }

    fn wrap(&mut self, width: f32, height: f32) {
        if self.y < -self.size {
            self.y = height + self.size;
            self.x = fastrand::f32() * width;
        }
        if self.x < -self.size {
            self.x = width + self.size;
        }
        if self.x > width + self.size {
            self.x = -self.size;
        }
    }
}

/// Background layer of floating caps or hearts that never ends.
pub struct AmbientEffect {
    kind: EffectKind,
    shape: FloaterShape,
    scheduler: FrameScheduler<Floater>,
}

impl AmbientEffect {
    pub fn new(surface: Surface, kind: EffectKind) -> Self {
        let shape = match kind {
            EffectKind::Hearts => FloaterShape::Heart,
            _ => FloaterShape::Cap,
        };
        let mut effect = Self {
            kind,
            shape,
            scheduler: FrameScheduler::new(surface, LoopMode::Ambient),
        };
        effect.populate(None);
        effect
    }

    /// `max(18, width / 60)` floaters, scattered over the whole viewport.
    pub fn default_count(width: f32) -> usize {
        ((width / 60.0).floor() as usize).max(18)
    }

    pub fn particles(&self) -> &[Floater] {
        self.scheduler.particles()
    }

    fn populate(&mut self, count: Option<usize>) {
        let width = self.scheduler.surface().width();
        let height = self.scheduler.surface().height();
        let count = count.unwrap_or_else(|| Self::default_count(width));
        let shape = self.shape;
        self.scheduler.spawn((0..count).map(|_| Floater::new(width, height, shape)));
    }
}

impl Effect for AmbientEffect {
    fn kind(&self) -> EffectKind {
        self.kind
    }

    fn trigger(&mut self, spawn: Spawn, _now: Duration) {
        self.populate(spawn.count);
    }

    fn update(&mut self, _now: Duration) -> FrameStatus {
        self.scheduler.frame()
    }

    fn resize(&mut self, cols: usize, rows: usize) {
        self.scheduler.resize(cols, rows);
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

    fn floater(x: f32, y: f32) -> Floater {
        Floater {
            x,
            y,
            size: 20.0,
            alpha: 0.3,
            speed: 0.5,
            drift: 0.0,
            rotation: 0.0,
            spin: 0.0,
            shape: FloaterShape::Cap,
        }
    }

    #[test]
    fn exiting_the_top_reenters_below_the_bottom() {
        fastrand::seed(17);
        let mut f = floater(50.0, -19.8);
        assert!(f.update());
        f.wrap(400.0, 300.0);
        assert_eq!(f.y, 320.0);
        assert!(f.x >= 0.0 && f.x < 400.0);
    }

    #[test]
    fn horizontal_wrap_is_edge_to_edge() {
        let mut f = floater(-20.5, 100.0);
        f.wrap(400.0, 300.0);
        assert_eq!(f.x, 420.0);

        let mut f = floater(420.5, 100.0);
        f.wrap(400.0, 300.0);
        assert_eq!(f.x, -20.0);

        let mut f = floater(-19.0, 100.0);
        f.wrap(400.0, 300.0);
        assert_eq!(f.x, -19.0);
    }

    #[test]
    fn default_population_scales_with_width() {
        assert_eq!(AmbientEffect::default_count(320.0), 18);
        assert_eq!(AmbientEffect::default_count(1920.0), 32);

        let fx = AmbientEffect::new(Surface::resolve(240, 50, 8.0).unwrap(), EffectKind::Caps);
        assert_eq!(fx.particle_count(), 32);
        assert!(fx.is_running());
    }

    #[test]
    fn floaters_stay_inside_the_wrap_band() {
        fastrand::seed(23);
        let mut fx = AmbientEffect::new(Surface::resolve(100, 30, 8.0).unwrap(), EffectKind::Hearts);
        for _ in 0..3000 {
            assert_eq!(fx.update(Duration::ZERO), FrameStatus::Continue);
        }
        let (w, h) = (fx.surface().width(), fx.surface().height());
        for f in fx.particles() {
            assert_eq!(f.shape, FloaterShape::Heart);
            assert!(f.y >= -f.size && f.y <= h + f.size);
            assert!(f.x >= -f.size && f.x <= w + f.size);
        }
        assert!(fx.surface().painted_pixels() > 0);
    }

    #[test]
    fn resize_during_flight_keeps_every_floater() {
        fastrand::seed(29);
        let mut fx = AmbientEffect::new(Surface::resolve(120, 40, 8.0).unwrap(), EffectKind::Caps);
        let before = fx.particle_count();
        fx.update(Duration::ZERO);
        fx.resize(40, 12);
        fx.update(Duration::ZERO);
        fx.resize(300, 80);
        fx.update(Duration::ZERO);
        assert_eq!(fx.particle_count(), before);
    }
}
