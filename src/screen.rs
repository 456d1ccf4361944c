use crate::color::{Rgb, mix};
use crate::surface::Surface;
use std::io::Write;

/// Stacks surfaces over a background colour and writes the result as
/// half-block cells, top pixel in the background colour and bottom pixel in
/// the foreground colour of `▄`.
pub struct Screen {
    bg_color: Rgb,
    composite: Vec<Rgb>,
    output_buf: Vec<u8>,
}

impl Screen {
    pub fn new(bg_color: Rgb) -> Self {
        Self {
            bg_color,
            composite: Vec::new(),
            output_buf: Vec::with_capacity(64 * 1024),
        }
    }

    /// Composites `layers` bottom to top. The first layer decides the grid.
    pub fn compose(&mut self, layers: &[&Surface]) -> (usize, usize) {
        let Some(base) = layers.first() else {
            self.composite.clear();
            return (0, 0);
        };
        let (width, height) = base.grid();
        let bg = (self.bg_color.0 as f32, self.bg_color.1 as f32, self.bg_color.2 as f32);

        self.composite.clear();
        self.composite.reserve(width * height);
        for y in 0..height {
            for x in 0..width {
                let mut c = bg;
                for layer in layers {
                    if let Some(p) = layer.pixel(x, y) {
                        let keep = 1.0 - p.a;
                        c = (p.r + c.0 * keep, p.g + c.1 * keep, p.b + c.2 * keep);
                    }
                }
                self.composite.push((
                    c.0.clamp(0.0, 255.0) as u8,
                    c.1.clamp(0.0, 255.0) as u8,
                    c.2.clamp(0.0, 255.0) as u8,
                ));
            }
        }

        (width, height)
    }

    pub fn present<W: Write>(&mut self, layers: &[&Surface], out: &mut W) -> std::io::Result<()> {
        let (width, height) = self.compose(layers);

        self.output_buf.clear();
        self.output_buf.extend_from_slice(b"\x1b[H");

        let mut prev_top: Rgb = (255, 255, 255);
        let mut prev_bot: Rgb = (255, 255, 255);

        for y in (0..height).step_by(2) {
            for x in 0..width {
                let top = self.composite[y * width + x];
                let bot = if y + 1 < height {
                    self.composite[(y + 1) * width + x]
                } else {
                    top
                };

                // Only emit color codes if changed
                if top != prev_top {
                    write!(self.output_buf, "\x1b[48;2;{};{};{}m", top.0, top.1, top.2)?;
                    prev_top = top;
                }
                if bot != prev_bot {
                    write!(self.output_buf, "\x1b[38;2;{};{};{}m", bot.0, bot.1, bot.2)?;
                    prev_bot = bot;
                }
                self.output_buf.extend_from_slice("▄".as_bytes());
            }
            self.output_buf.extend_from_slice(b"\x1b[0m");
            prev_top = (255, 255, 255);
            prev_bot = (255, 255, 255);
            if y + 2 < height {
                self.output_buf.extend_from_slice(b"\r\n");
            }
        }

        // Text overlays, later layers on top
        for layer in layers {
            for glyph in layer.glyphs() {
                let y = glyph.row * 2;
                if glyph.col >= width || y >= height {
                    continue;
                }
                let top = self.composite[y * width + glyph.col];
                let bot = self.composite[(y + 1).min(height - 1) * width + glyph.col];
                let cell = mix(top, bot, 0.5);
                let fg = mix(cell, glyph.color, glyph.alpha);

                write!(
                    self.output_buf,
                    "\x1b[{};{}H\x1b[48;2;{};{};{}m\x1b[38;2;{};{};{}m{}",
                    glyph.row + 1,
                    glyph.col + 1,
                    cell.0,
                    cell.1,
                    cell.2,
                    fg.0,
                    fg.1,
                    fg.2,
                    glyph.text
                )?;
            }
        }
        self.output_buf.extend_from_slice(b"\x1b[0m");

        out.write_all(&self.output_buf)?;
        out.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_layers_fall_back_to_background() {
        let layer = Surface::resolve(4, 2, 8.0).unwrap();
        let mut screen = Screen::new((10, 20, 30));
        let (w, h) = screen.compose(&[&layer]);
        assert_eq!((w, h), (4, 4));
        assert!(screen.composite.iter().all(|&c| c == (10, 20, 30)));
    }

    #[test]
    fn upper_layers_cover_lower_ones() {
        let mut below = Surface::resolve(4, 2, 8.0).unwrap();
        below.fill_rect(0.0, 0.0, 32.0, 32.0, (255, 0, 0));
        let mut above = Surface::resolve(4, 2, 8.0).unwrap();
        above.fill_rect(0.0, 0.0, 32.0, 32.0, (0, 0, 255));

        let mut screen = Screen::new((0, 0, 0));
        screen.compose(&[&below, &above]);
        assert_eq!(screen.composite[0], (0, 0, 255));

        screen.compose(&[&above, &below]);
        assert_eq!(screen.composite[0], (255, 0, 0));
    }

    #[test]
    fn present_writes_half_blocks_and_glyphs() {
        let mut layer = Surface::resolve(3, 2, 8.0).unwrap();
        layer.fill_text(0.0, 0.0, "A", (255, 255, 255));
        let mut screen = Screen::new((0, 0, 0));
        let mut out = Vec::new();
        screen.present(&[&layer], &mut out).unwrap();

        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("\x1b[H"));
        assert_eq!(text.matches('▄').count(), 6);
        assert!(text.contains("\x1b[1;1H"));
        assert!(text.ends_with("A\x1b[0m"));
    }
}
