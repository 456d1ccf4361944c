//! Draws the envelope and the invitation card onto their own surface.
//!
//! Text is laid out in terminal cells, so strings are centred using their
//! display width times the cell width in logical pixels.

use crate::color::{Rgb, mix};
use crate::config::{InvitationConfig, Palette};
use crate::countdown::{Countdown, FlipPhase};
use crate::envelope::EnvelopePose;
use crate::surface::Surface;
use unicode_width::UnicodeWidthStr;

const BANNER: &str = "The celebration has begun!";
const HINT: &str = "click: confetti | double-click: emoji | f: fireworks | q: quit";
const SEALED_HINT: &str = "press Enter or click to open";

/// Envelope placement in logical pixels, before any pose is applied.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnvelopeGeometry {
    pub cx: f32,
    pub cy: f32,
    pub width: f32,
    pub height: f32,
}

impl EnvelopeGeometry {
    pub fn for_surface(width: f32, height: f32) -> Self {
        let w = (width * 0.6).min(height * 1.2).min(640.0);
        Self {
            cx: width / 2.0,
            cy: height / 2.0,
            width: w,
            height: w * 0.6,
        }
    }

    /// Horizontal centre, one third down the posed envelope's bounds.
    pub fn confetti_origin(&self, pose: &EnvelopePose) -> (f32, f32) {
        let h = self.height * pose.scale;
        let top = self.cy + pose.offset_y - h / 2.0;
        (self.cx, top + h / 3.0)
    }
}

pub struct CardView {
    surface: Surface,
}

impl CardView {
    pub fn new(surface: Surface) -> Self {
        Self { surface }
    }

    pub fn resize(&mut self, cols: usize, rows: usize) {
        self.surface.resize(cols, rows);
    }

    pub fn surface(&self) -> &Surface {
        &self.surface
    }

    pub fn geometry(&self) -> EnvelopeGeometry {
        EnvelopeGeometry::for_surface(self.surface.width(), self.surface.height())
    }

    pub fn clear(&mut self) {
        self.surface.clear();
    }

    pub fn draw_envelope(&mut self, pose: &EnvelopePose, palette: &Palette, title: &str, sealed: bool) {
        let geo = self.geometry();
        let alpha = pose.opacity * pose.container_opacity;
        if alpha <= 0.0 {
            return;
        }
        let (hw, hh) = (geo.width / 2.0, geo.height / 2.0);
        let cell = self.surface.pixel_scale();
        let s = &mut self.surface;

        s.save();
        s.translate(geo.cx, geo.cy + pose.offset_y);
        s.rotate(pose.rotate_deg.to_radians());
        s.scale(pose.scale, pose.scale);

        // Flap folded past vertical sits behind the card
        let flap_open = pose.flap_angle_deg > 90.0;
        let flap_tip = -hh + geo.height * 0.55 * pose.flap_angle_deg.to_radians().cos();
        let flap = [(-hw, -hh), (hw, -hh), (0.0, flap_tip)];

        s.set_alpha(alpha * pose.shell_opacity);
        s.fill_rect(-hw, -hh, geo.width, geo.height, mix(palette.envelope, (0, 0, 0), 0.15));
        if flap_open {
            draw_flap(s, &flap, palette, pose.flap_glow, alpha);
        }

        if pose.content_opacity > 0.0 {
            s.save();
            s.set_alpha(alpha * pose.content_opacity);
            s.translate(0.0, pose.content_offset_y);
            s.scale(pose.content_scale, pose.content_scale);
            s.fill_rect(-hw * 0.9, -hh * 0.9, geo.width * 0.9, geo.height * 0.8, palette.card);
            let x = -(title.chars().count() as f32) * cell / 2.0;
            s.fill_text(x, -hh * 0.5, title, palette.ink);
            s.restore();
        }

        s.set_alpha(alpha * pose.shell_opacity);
        let pocket = [(-hw, -hh * 0.2), (0.0, hh * 0.35), (hw, -hh * 0.2), (hw, hh), (-hw, hh)];
        s.fill_polygon(&pocket, palette.envelope);
        s.stroke_polygon(&pocket, cell * 0.5, mix(palette.envelope, (0, 0, 0), 0.25));
        if !flap_open {
            draw_flap(s, &flap, palette, pose.flap_glow, alpha);
        }
        s.restore();

        if sealed {
            self.centered_text(geo.cy + hh + cell * 4.0, SEALED_HINT, palette.accent);
        }
    }

    pub fn draw_invitation(&mut self, config: &InvitationConfig, countdown: &Countdown) {
        let palette = config.palette();
        let row = self.surface.pixel_scale() * 2.0;
        let mut y = (self.surface.height() * 0.2).max(row);

        self.centered_text(y, &config.title, palette.accent);
        y += row * 2.0;
        for line in &config.lines {
            self.centered_text(y, line, (235, 235, 235));
            y += row;
        }
        y += row;
        let date = config.event_date.format("%d.%m.%Y  %H:%M").to_string();
        self.centered_text(y, &date, palette.accent);
        y += row * 2.0;

        if countdown.has_started() {
            self.centered_text(y, BANNER, palette.accent);
            y += row * 2.0;
        } else {
            y = self.draw_countdown(y, countdown, &palette);
        }

        self.centered_text(y + row, HINT, (150, 150, 150));
    }

    /// Four boxes side by side; returns the y below them.
    fn draw_countdown(&mut self, top: f32, countdown: &Countdown, palette: &Palette) -> f32 {
        let cell = self.surface.pixel_scale();
        let box_w = cell * 8.0;
        let box_h = cell * 6.0;
        let gap = cell * 2.0;
        let total = box_w * 4.0 + gap * 3.0;
        let left = self.surface.width() / 2.0 - total / 2.0;

        for (i, card) in countdown.cards().iter().enumerate() {
            let x = left + i as f32 * (box_w + gap);
            let (face, squash, fill) = match card.phase() {
                FlipPhase::Steady => (card.front(), 1.0, palette.card),
                FlipPhase::Flipping { .. } => (card.back(), 0.5, palette.card),
                FlipPhase::Flashing { .. } => (card.front(), 1.0, palette.accent),
            };

            let h = box_h * squash;
            let s = &mut self.surface;
            s.save();
            s.set_shadow_blur(cell);
            s.fill_rect(x, top + (box_h - h) / 2.0, box_w, h, fill);
            s.restore();

            let digits_x = x + box_w / 2.0 - cell;
            s.fill_text(digits_x, top + box_h / 2.0 - cell, face, palette.ink);
            let label_x = x + box_w / 2.0 - card.label.len() as f32 * cell / 2.0;
            s.fill_text(label_x, top + box_h + cell, card.label, (200, 200, 200));
        }

        top + box_h + cell * 4.0
    }

    fn centered_text(&mut self, y: f32, text: &str, color: Rgb) {
        let cell = self.surface.pixel_scale();
        let width = text.width() as f32 * cell;
        let x = ((self.surface.width() - width) / 2.0).max(0.0);
        self.surface.fill_text(x, y, text, color);
    }
}

fn draw_flap(s: &mut Surface, flap: &[(f32, f32)], palette: &Palette, glow: bool, alpha: f32) {
    s.save();
    s.set_alpha(alpha);
    if glow {
        let blur = s.pixel_scale() * 2.0;
        s.set_shadow_blur(blur);
        s.fill_polygon(flap, mix(palette.flap, palette.accent, 0.5));
    } else {
        s.fill_polygon(flap, palette.flap);
    }
    s.restore();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Variant;
    use crate::envelope::Envelope;
    use chrono::NaiveDate;
    use std::time::Duration;

    fn view() -> CardView {
        CardView::new(Surface::resolve(120, 40, 8.0).unwrap())
    }

    #[test]
    fn sealed_envelope_is_drawn_with_a_hint() {
        let mut card = view();
        let palette = Variant::Wedding.palette();
        card.draw_envelope(&Envelope::new().pose(), &palette, "Wedding", true);
        assert!(card.surface().painted_pixels() > 100);
        assert!(card.surface().glyphs().iter().any(|g| g.text == SEALED_HINT));
        // content card is still hidden
        assert!(!card.surface().glyphs().iter().any(|g| g.text == "Wedding"));
    }

    #[test]
    fn finished_envelope_draws_nothing() {
        let mut card = view();
        let mut envelope = Envelope::new();
        envelope.open();
        envelope.advance(3.0);
        card.draw_envelope(&envelope.pose(), &Variant::Graduation.palette(), "Hi", false);
        assert_eq!(card.surface().painted_pixels(), 0);
    }

    #[test]
    fn confetti_origin_tracks_the_pose() {
        let geo = EnvelopeGeometry::for_surface(960.0, 640.0);
        let mut pose = Envelope::new().pose();
        let (x, y) = geo.confetti_origin(&pose);
        assert_eq!(x, 480.0);
        assert!((y - (320.0 - geo.height / 2.0 + geo.height / 3.0)).abs() < 1e-3);

        pose.scale = 1.1;
        let (_, swollen) = geo.confetti_origin(&pose);
        assert!(swollen < y);
    }

    #[test]
    fn invitation_shows_countdown_then_banner() {
        let config = InvitationConfig::default();
        let event = config.event_date;
        let mut countdown = Countdown::new(event);
        let before = NaiveDate::from_ymd_opt(2025, 8, 1).unwrap().and_hms_opt(8, 0, 0).unwrap();
        countdown.update(before, Duration::ZERO);

        let mut card = view();
        card.draw_invitation(&config, &countdown);
        let texts: Vec<&str> = card.surface().glyphs().iter().map(|g| g.text.as_str()).collect();
        assert!(texts.contains(&"15"));
        assert!(texts.contains(&"days"));
        assert!(!texts.contains(&BANNER));

        let after = NaiveDate::from_ymd_opt(2025, 9, 1).unwrap().and_hms_opt(8, 0, 0).unwrap();
        countdown.update(after, Duration::from_secs(1));
        card.clear();
        card.draw_invitation(&config, &countdown);
        assert!(card.surface().glyphs().iter().any(|g| g.text == BANNER));
    }
}
