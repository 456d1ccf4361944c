//! Immediate-mode 2D drawing surface rasterised onto terminal half-block pixels.
//!
//! Coordinates are logical pixels. One half-block pixel covers `pixel_scale`
//! logical pixels in each direction, so a terminal of `cols x rows` cells has a
//! logical size of `cols * scale` by `rows * 2 * scale`. Each effect owns its
//! own surface, and [`crate::screen::Screen`] stacks them like canvases.

use crate::color::Rgb;
use thiserror::Error;
use unicode_width::UnicodeWidthChar;

/// Fraction of the fill colour used for the outermost shadow-blur ring.
const GLOW_STRENGTH: f32 = 0.35;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SurfaceError {
    #[error("drawing surface has no area ({cols}x{rows} cells)")]
    NoArea { cols: usize, rows: usize },
    #[error("invalid pixel scale {0}")]
    InvalidScale(f32),
}

/// 2D affine transform, `x' = a*x + c*y + e`, `y' = b*x + d*y + f`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub a: f32,
    pub b: f32,
    pub c: f32,
    pub d: f32,
    pub e: f32,
    pub f: f32,
}

impl Transform {
    pub const IDENTITY: Transform = Transform { a: 1.0, b: 0.0, c: 0.0, d: 1.0, e: 0.0, f: 0.0 };

    /// `self * other`: applies `other` first, then `self`.
    pub fn then(&self, other: &Transform) -> Transform {
        Transform {
            a: self.a * other.a + self.c * other.b,
            b: self.b * other.a + self.d * other.b,
            c: self.a * other.c + self.c * other.d,
            d: self.b * other.c + self.d * other.d,
            e: self.a * other.e + self.c * other.f + self.e,
            f: self.b * other.e + self.d * other.f + self.f,
        }
    }

    pub fn apply(&self, x: f32, y: f32) -> (f32, f32) {
        (self.a * x + self.c * y + self.e, self.b * x + self.d * y + self.f)
    }

    pub fn invert(&self) -> Option<Transform> {
        let det = self.a * self.d - self.b * self.c;
        if det.abs() < 1e-9 {
            return None;
        }
        Some(Transform {
            a: self.d / det,
            b: -self.b / det,
            c: -self.c / det,
            d: self.a / det,
            e: (self.c * self.f - self.d * self.e) / det,
            f: (self.b * self.e - self.a * self.f) / det,
        })
    }

    /// Average linear scale factor.
    pub fn scale_factor(&self) -> f32 {
        (self.a * self.d - self.b * self.c).abs().sqrt()
    }
}

#[derive(Debug, Clone, Copy)]
struct DrawState {
    transform: Transform,
    alpha: f32,
    shadow_blur: f32,
}

impl Default for DrawState {
    fn default() -> Self {
        Self { transform: Transform::IDENTITY, alpha: 1.0, shadow_blur: 0.0 }
    }
}

/// Premultiplied colour plus coverage.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Pixel {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Glyph {
    pub col: usize,
    pub row: usize,
    pub text: String,
    pub color: Rgb,
    pub alpha: f32,
}

enum Shape<'a> {
    Rect { x: f32, y: f32, w: f32, h: f32 },
    Circle { cx: f32, cy: f32, r: f32 },
    Polygon(&'a [(f32, f32)]),
    Segment { x0: f32, y0: f32, x1: f32, y1: f32, half_width: f32 },
}

impl Shape<'_> {
    fn bounds(&self) -> (f32, f32, f32, f32) {
        match self {
            Shape::Rect { x, y, w, h } => (*x, *y, x + w, y + h),
            Shape::Circle { cx, cy, r } => (cx - r, cy - r, cx + r, cy + r),
            Shape::Polygon(points) => points.iter().fold(
                (f32::MAX, f32::MAX, f32::MIN, f32::MIN),
                |(x0, y0, x1, y1), &(x, y)| (x0.min(x), y0.min(y), x1.max(x), y1.max(y)),
            ),
            Shape::Segment { x0, y0, x1, y1, half_width } => (
                x0.min(*x1) - half_width,
                y0.min(*y1) - half_width,
                x0.max(*x1) + half_width,
                y0.max(*y1) + half_width,
            ),
        }
    }

    /// Signed distance in local units, negative inside.
    fn distance(&self, px: f32, py: f32) -> f32 {
        match self {
            Shape::Rect { x, y, w, h } => {
                let hw = w / 2.0;
                let hh = h / 2.0;
                let dx = (px - (x + hw)).abs() - hw;
                let dy = (py - (y + hh)).abs() - hh;
                let outside = (dx.max(0.0).powi(2) + dy.max(0.0).powi(2)).sqrt();
                outside + dx.max(dy).min(0.0)
            }
            Shape::Circle { cx, cy, r } => ((px - cx).powi(2) + (py - cy).powi(2)).sqrt() - r,
            Shape::Polygon(points) => {
                if points.len() < 3 {
                    return f32::MAX;
                }
                let mut inside = false;
                let mut nearest = f32::MAX;
                let mut j = points.len() - 1;
                for i in 0..points.len() {
                    let (xi, yi) = points[i];
                    let (xj, yj) = points[j];
                    if (yi > py) != (yj > py) && px < (xj - xi) * (py - yi) / (yj - yi) + xi {
                        inside = !inside;
                    }
                    nearest = nearest.min(segment_distance(px, py, xi, yi, xj, yj));
                    j = i;
                }
                if inside { -nearest } else { nearest }
            }
            Shape::Segment { x0, y0, x1, y1, half_width } => {
                segment_distance(px, py, *x0, *y0, *x1, *y1) - half_width
            }
        }
    }
}

fn segment_distance(px: f32, py: f32, x0: f32, y0: f32, x1: f32, y1: f32) -> f32 {
    let dx = x1 - x0;
    let dy = y1 - y0;
    let len_sq = dx * dx + dy * dy;
    let t = if len_sq > 0.0 {
        (((px - x0) * dx + (py - y0) * dy) / len_sq).clamp(0.0, 1.0)
    } else {
        0.0
    };
    let nx = x0 + dx * t;
    let ny = y0 + dy * t;
    ((px - nx).powi(2) + (py - ny).powi(2)).sqrt()
}

/// Longest prefix of `text` that fits in `cells` terminal columns.
fn clip_to_cells(text: &str, cells: usize) -> &str {
    let mut used = 0;
    for (i, ch) in text.char_indices() {
        used += ch.width().unwrap_or(0);
        if used > cells {
            return &text[..i];
        }
    }
    text
}

pub struct Surface {
    cols: usize,
    rows: usize,
    scale: f32,
    pixels: Vec<Pixel>,
    glyphs: Vec<Glyph>,
    state: DrawState,
    stack: Vec<DrawState>,
}

impl Surface {
    /// Resolves a surface for a terminal of `cols x rows` cells. This is the
    /// single capability check: effects built on a resolved surface never
    /// re-check for it while drawing.
    pub fn resolve(cols: usize, rows: usize, scale: f32) -> Result<Self, SurfaceError> {
        if cols == 0 || rows == 0 {
            return Err(SurfaceError::NoArea { cols, rows });
        }
        if !(scale.is_finite() && scale > 0.0) {
            return Err(SurfaceError::InvalidScale(scale));
        }

        Ok(Self {
            cols,
            rows,
            scale,
            pixels: vec![Pixel::default(); cols * rows * 2],
            glyphs: Vec::new(),
            state: DrawState::default(),
            stack: Vec::new(),
        })
    }

    /// Resets the logical dimensions. Contents are discarded; callers redraw
    /// on the next frame.
    pub fn resize(&mut self, cols: usize, rows: usize) {
        self.cols = cols;
        self.rows = rows;
        self.pixels = vec![Pixel::default(); cols * rows * 2];
        self.glyphs.clear();
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn pixel_scale(&self) -> f32 {
        self.scale
    }

    /// Logical width.
    pub fn width(&self) -> f32 {
        self.cols as f32 * self.scale
    }

    /// Logical height.
    pub fn height(&self) -> f32 {
        self.rows as f32 * 2.0 * self.scale
    }

    /// Half-block pixel grid size.
    pub fn grid(&self) -> (usize, usize) {
        (self.cols, self.rows * 2)
    }

    pub fn pixel(&self, x: usize, y: usize) -> Option<Pixel> {
        if x >= self.cols || y >= self.rows * 2 {
            return None;
        }
        self.pixels.get(y * self.cols + x).copied()
    }

    pub fn glyphs(&self) -> &[Glyph] {
        &self.glyphs
    }

    pub fn painted_pixels(&self) -> usize {
        self.pixels.iter().filter(|p| p.a > 0.01).count()
    }

    pub fn clear(&mut self) {
        self.pixels.fill(Pixel::default());
        self.glyphs.clear();
    }

    pub fn save(&mut self) {
        self.stack.push(self.state);
    }

    pub fn restore(&mut self) {
        if let Some(state) = self.stack.pop() {
            self.state = state;
        }
    }

    pub fn translate(&mut self, x: f32, y: f32) {
        let t = Transform { e: x, f: y, ..Transform::IDENTITY };
        self.state.transform = self.state.transform.then(&t);
    }

    pub fn rotate(&mut self, radians: f32) {
        let (sin, cos) = radians.sin_cos();
        let r = Transform { a: cos, b: sin, c: -sin, d: cos, e: 0.0, f: 0.0 };
        self.state.transform = self.state.transform.then(&r);
    }

    pub fn scale(&mut self, sx: f32, sy: f32) {
        let s = Transform { a: sx, d: sy, ..Transform::IDENTITY };
        self.state.transform = self.state.transform.then(&s);
    }

    pub fn transform(&self) -> Transform {
        self.state.transform
    }

    pub fn set_alpha(&mut self, alpha: f32) {
        self.state.alpha = alpha.clamp(0.0, 1.0);
    }

    pub fn alpha(&self) -> f32 {
        self.state.alpha
    }

    pub fn set_shadow_blur(&mut self, blur: f32) {
        self.state.shadow_blur = blur.max(0.0);
    }

    pub fn fill_rect(&mut self, x: f32, y: f32, w: f32, h: f32, color: Rgb) {
        self.paint(Shape::Rect { x, y, w, h }, color);
    }

    pub fn fill_circle(&mut self, cx: f32, cy: f32, r: f32, color: Rgb) {
        self.paint(Shape::Circle { cx, cy, r }, color);
    }

    pub fn fill_polygon(&mut self, points: &[(f32, f32)], color: Rgb) {
        self.paint(Shape::Polygon(points), color);
    }

    pub fn stroke_line(&mut self, x0: f32, y0: f32, x1: f32, y1: f32, width: f32, color: Rgb) {
        self.paint(Shape::Segment { x0, y0, x1, y1, half_width: width / 2.0 }, color);
    }

    pub fn stroke_polygon(&mut self, points: &[(f32, f32)], width: f32, color: Rgb) {
        for (i, &(x0, y0)) in points.iter().enumerate() {
            let (x1, y1) = points[(i + 1) % points.len()];
            self.stroke_line(x0, y0, x1, y1, width, color);
        }
    }

    /// Places text with its first character at the transformed origin
    /// `(x, y)`. Glyphs follow translation only; terminal cells cannot rotate.
    /// Text is cut at the right edge, counting wide characters as two cells.
    pub fn fill_text(&mut self, x: f32, y: f32, text: &str, color: Rgb) {
        if self.state.alpha < 0.05 {
            return;
        }
        let (dx, dy) = self.state.transform.apply(x, y);
        if dx < 0.0 || dy < 0.0 {
            return;
        }
        let col = (dx / self.scale) as usize;
        let row = (dy / (self.scale * 2.0)) as usize;
        if col >= self.cols || row >= self.rows {
            return;
        }
        let text = clip_to_cells(text, self.cols - col);
        if text.is_empty() {
            return;
        }

        self.glyphs.push(Glyph {
            col,
            row,
            text: text.to_string(),
            color,
            alpha: self.state.alpha,
        });
    }

    /// Blends straight onto half-block pixel `(x, y)`, bypassing the
    /// transform. Used for full-screen procedural layers.
    pub fn put_pixel(&mut self, x: usize, y: usize, color: Rgb, alpha: f32) {
        let (grid_w, grid_h) = self.grid();
        if x >= grid_w || y >= grid_h || alpha <= 0.0 {
            return;
        }
        self.blend(y * grid_w + x, color, alpha.min(1.0) * self.state.alpha);
    }

    fn paint(&mut self, shape: Shape<'_>, color: Rgb) {
        let state = self.state;
        if state.alpha <= 0.0 || self.pixels.is_empty() {
            return;
        }
        let Some(inverse) = state.transform.invert() else {
            return;
        };

        let factor = state.transform.scale_factor();
        // any shape reaching into a pixel's square lights it
        let solid = self.scale * std::f32::consts::FRAC_1_SQRT_2;
        let reach = solid + state.shadow_blur;
        let pad = reach / factor;

        let (x0, y0, x1, y1) = shape.bounds();
        let corners = [
            state.transform.apply(x0 - pad, y0 - pad),
            state.transform.apply(x1 + pad, y0 - pad),
            state.transform.apply(x0 - pad, y1 + pad),
            state.transform.apply(x1 + pad, y1 + pad),
        ];
        let (min_x, min_y, max_x, max_y) = corners.iter().fold(
            (f32::MAX, f32::MAX, f32::MIN, f32::MIN),
            |(a, b, c, d), &(x, y)| (a.min(x), b.min(y), c.max(x), d.max(y)),
        );

        let (grid_w, grid_h) = self.grid();
        let i0 = ((min_x / self.scale).floor().max(0.0) as usize).min(grid_w);
        let j0 = ((min_y / self.scale).floor().max(0.0) as usize).min(grid_h);
        let i1 = ((max_x / self.scale).ceil().max(0.0) as usize).min(grid_w);
        let j1 = ((max_y / self.scale).ceil().max(0.0) as usize).min(grid_h);

        for j in j0..j1 {
            for i in i0..i1 {
                let cx = (i as f32 + 0.5) * self.scale;
                let cy = (j as f32 + 0.5) * self.scale;
                let (lx, ly) = inverse.apply(cx, cy);
                let distance = shape.distance(lx, ly) * factor;

                let coverage = if distance <= solid {
                    1.0
                } else if state.shadow_blur > 0.0 && distance < reach {
                    GLOW_STRENGTH * (1.0 - (distance - solid) / state.shadow_blur)
                } else {
                    continue;
                };

                self.blend(j * grid_w + i, color, coverage * state.alpha);
            }
        }
    }

    fn blend(&mut self, idx: usize, color: Rgb, alpha: f32) {
        let p = &mut self.pixels[idx];
        let keep = 1.0 - alpha;
        p.r = color.0 as f32 * alpha + p.r * keep;
        p.g = color.1 as f32 * alpha + p.g * keep;
        p.b = color.2 as f32 * alpha + p.b * keep;
        p.a = alpha + p.a * keep;
    }
}
