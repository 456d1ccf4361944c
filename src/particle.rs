//! The per-frame particle contract shared by every effect.

use crate::surface::Surface;

pub trait Particle {
    /// Advances one frame. Returns whether the particle is still alive.
    fn update(&mut self) -> bool;

    /// Paints the particle. Must leave the surface's draw state as it found it.
    fn draw(&self, surface: &mut Surface);

    /// Ambient particles re-enter from the opposite edge instead of dying.
    fn wrap(&mut self, _width: f32, _height: f32) {}
}

/// Position, velocity, spin and a frame countdown.
#[derive(Debug, Clone)]
pub struct Body {
    pub x: f32,
    pub y: f32,
    pub vx: f32,
    pub vy: f32,
    pub rotation: f32,
    pub spin: f32,
    pub life: u32,
    pub max_life: u32,
    pub alpha: f32,
}

impl Body {
    pub fn new(x: f32, y: f32, vx: f32, vy: f32, life: u32) -> Self {
        let life = life.max(1);
        Self {
            x,
            y,
            vx,
            vy,
            rotation: 0.0,
            spin: 0.0,
            life,
            max_life: life,
            alpha: 1.0,
        }
    }

    pub fn with_spin(mut self, rotation: f32, spin: f32) -> Self {
        self.rotation = rotation;
        self.spin = spin;
        self
    }

    /// Ballistic step: move, then gravity, then drag on both axes.
    pub fn integrate(&mut self, gravity: f32, damping: f32) {
        self.x += self.vx;
        self.y += self.vy;
        self.vy += gravity;
        self.vx *= damping;
        self.vy *= damping;
        self.rotation += self.spin;
    }

    /// Decrements life and recomputes alpha. Returns `life > 0`.
    pub fn age(&mut self) -> bool {
        self.life = self.life.saturating_sub(1);
        self.alpha = self.life as f32 / self.max_life as f32;
        self.life > 0
    }

    pub fn is_alive(&self) -> bool {
        self.life > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alpha_tracks_remaining_life() {
        let mut body = Body::new(0.0, 0.0, 0.0, 0.0, 4);
        assert_eq!(body.alpha, 1.0);
        assert!(body.age());
        assert_eq!(body.alpha, 0.75);
        assert!(body.age());
        assert!(body.age());
        assert!(!body.age());
        assert_eq!(body.alpha, 0.0);
        assert!(!body.is_alive());
        // further ageing stays dead
        assert!(!body.age());
        assert_eq!(body.life, 0);
    }

    #[test]
    fn zero_life_is_clamped_to_one_frame() {
        let mut body = Body::new(0.0, 0.0, 0.0, 0.0, 0);
        assert_eq!(body.max_life, 1);
        assert!(!body.age());
    }

    #[test]
    fn integrate_moves_before_gravity() {
        let mut body = Body::new(10.0, 10.0, 2.0, -1.0, 10).with_spin(0.0, 0.5);
        body.integrate(0.05, 0.98);
        assert_eq!((body.x, body.y), (12.0, 9.0));
        assert!((body.vx - 1.96).abs() < 1e-6);
        assert!((body.vy - (-0.95 * 0.98)).abs() < 1e-6);
        assert_eq!(body.rotation, 0.5);
    }
}
