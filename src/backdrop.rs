use crate::color::{Rgb, mix};
use crate::surface::Surface;
use noise::{NoiseFn, Perlin};

/// Slow Perlin glow under every other layer, blending between the two theme
/// colours.
pub struct Backdrop {
    surface: Surface,
    noise: Perlin,
    colors: [Rgb; 2],
    time: f32,
}

impl Backdrop {
    pub fn new(surface: Surface, colors: [Rgb; 2]) -> Self {
        Self {
            surface,
            noise: Perlin::new(fastrand::u32(..)),
            colors,
            time: fastrand::f32() * 100.0,
        }
    }

    pub fn update(&mut self, dt: f32) {
        self.time += dt;
        // Wrap time to keep noise coordinates precise
        if self.time > 10000.0 {
            self.time -= 10000.0;
        }
    }

    pub fn resize(&mut self, cols: usize, rows: usize) {
        self.surface.resize(cols, rows);
    }

    pub fn surface(&self) -> &Surface {
        &self.surface
    }

    /// Glow level in `0..=1` at half-block pixel `(x, y)`.
    fn glow(&self, x: usize, y: usize) -> f32 {
        let t = self.time as f64 * 0.08;
        let broad = self.noise.get([x as f64 * 0.02, y as f64 * 0.03, t]);
        let fine = self.noise.get([x as f64 * 0.07, y as f64 * 0.09, t * 1.7 + 50.0]);
        let n = (broad * 0.75 + fine * 0.25) as f32;
        (n * 0.5 + 0.5).clamp(0.0, 1.0)
    }

    pub fn render(&mut self) {
        self.surface.clear();
        let (width, height) = self.surface.grid();
        for y in 0..height {
            // Slightly brighter towards the bottom
            let lift = y as f32 / height.max(1) as f32 * 0.1;
            for x in 0..width {
                let glow = self.glow(x, y);
                let color = mix(self.colors[0], self.colors[1], glow * glow);
                let alpha = 0.15 + glow * glow * 0.25 + lift;
                self.surface.put_pixel(x, y, color, alpha);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn covers_the_whole_grid_faintly() {
        fastrand::seed(3);
        let mut backdrop = Backdrop::new(Surface::resolve(30, 10, 8.0).unwrap(), [(0, 0, 40), (200, 160, 80)]);
        backdrop.update(1.0 / 60.0);
        backdrop.render();

        let surface = backdrop.surface();
        assert_eq!(surface.painted_pixels(), 30 * 20);
        for y in 0..20 {
            for x in 0..30 {
                let a = surface.pixel(x, y).unwrap().a;
                assert!(a > 0.1 && a <= 0.51, "alpha {a} at {x},{y}");
            }
        }
    }

    #[test]
    fn resize_follows_the_terminal() {
        let mut backdrop = Backdrop::new(Surface::resolve(30, 10, 8.0).unwrap(), [(0, 0, 0); 2]);
        backdrop.resize(12, 4);
        backdrop.render();
        assert_eq!(backdrop.surface().grid(), (12, 8));
    }
}
