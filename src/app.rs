use crate::backdrop::Backdrop;
use crate::card::CardView;
use crate::config::InvitationConfig;
use crate::countdown::Countdown;
use crate::effects::{EffectKind, EffectRegistry, Spawn};
use crate::envelope::{Cue, Envelope};
use crate::screen::Screen;
use crate::surface::{Surface, SurfaceError};
use chrono::NaiveDateTime;
use crossterm::event::{Event, KeyCode, KeyEventKind, MouseButton, MouseEventKind};
use std::io::Write;
use std::time::Duration;

const DOUBLE_CLICK: Duration = Duration::from_millis(300);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Sealed,
    Opening,
    Revealed,
}

/// The whole invitation page: envelope, card text, countdown and every
/// effect layer, driven by one simulated clock.
pub struct Invitation {
    config: InvitationConfig,
    registry: EffectRegistry,
    envelope: Envelope,
    countdown: Countdown,
    backdrop: Backdrop,
    card: CardView,
    screen: Screen,
    phase: Phase,
    clock: Duration,
    last_click: Option<Duration>,
}

impl Invitation {
    pub fn new(config: InvitationConfig, cols: usize, rows: usize) -> Result<Self, SurfaceError> {
        let scale = config.pixel_scale;
        let registry = EffectRegistry::build(&config.effects, cols, rows, &config.effect_settings());
        let backdrop = Backdrop::new(Surface::resolve(cols, rows, scale)?, config.palette().glow);
        let card = CardView::new(Surface::resolve(cols, rows, scale)?);

        tracing::info!(variant = config.variant.name(), cols, rows, "invitation ready");
        Ok(Self {
            countdown: Countdown::new(config.event_date),
            screen: Screen::new(config.background),
            registry,
            envelope: Envelope::new(),
            backdrop,
            card,
            phase: Phase::Sealed,
            clock: Duration::ZERO,
            last_click: None,
            config,
        })
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn clock(&self) -> Duration {
        self.clock
    }

    pub fn registry(&self) -> &EffectRegistry {
        &self.registry
    }

    pub fn countdown(&self) -> &Countdown {
        &self.countdown
    }

    /// Starts the opening sequence. Only the first call has any effect.
    pub fn open(&mut self) {
        if self.envelope.open() {
            tracing::info!("opening envelope");
            self.phase = Phase::Opening;
        }
    }

    /// Exit keys are handled by the run loop; everything else lands here.
    pub fn handle_event(&mut self, event: &Event) {
        match event {
            Event::Key(key) if key.kind == KeyEventKind::Press => match key.code {
                KeyCode::Enter | KeyCode::Char(' ') if self.phase == Phase::Sealed => self.open(),
                KeyCode::Char('f') if self.phase == Phase::Revealed => {
                    self.registry.trigger(EffectKind::Fireworks, Spawn::default(), self.clock);
                }
                _ => {}
            },
            Event::Mouse(mouse) if mouse.kind == MouseEventKind::Down(MouseButton::Left) => {
                match self.phase {
                    Phase::Sealed => self.open(),
                    Phase::Opening => {}
                    Phase::Revealed => self.click(mouse.column, mouse.row),
                }
            }
            Event::Resize(cols, rows) => self.resize(*cols as usize, *rows as usize),
            _ => {}
        }
    }

    /// Confetti at the clicked cell; a second click within the double-click
    /// window also launches emoji.
    pub fn click(&mut self, col: u16, row: u16) {
        let (x, y) = self.cell_center(col, row);
        self.registry.trigger(EffectKind::Confetti, Spawn::at(x, y), self.clock);

        match self.last_click {
            Some(prev) if self.clock.saturating_sub(prev) <= DOUBLE_CLICK => {
                self.registry.trigger(EffectKind::Emoji, Spawn::default(), self.clock);
                self.last_click = None;
            }
            _ => self.last_click = Some(self.clock),
        }
    }

    /// Logical point at the centre of a terminal cell.
    fn cell_center(&self, col: u16, row: u16) -> (f32, f32) {
        let px = self.config.pixel_scale;
        ((col as f32 + 0.5) * px, (row as f32 * 2.0 + 1.0) * px)
    }

    pub fn resize(&mut self, cols: usize, rows: usize) {
        if cols == 0 || rows == 0 {
            return;
        }
        tracing::debug!(cols, rows, "resize");
        self.registry.resize(cols, rows);
        self.backdrop.resize(cols, rows);
        self.card.resize(cols, rows);
    }

    /// One fixed step of `dt` seconds. `wall` is the local time for the
    /// countdown.
    pub fn update(&mut self, dt: f32, wall: NaiveDateTime) {
        self.clock += Duration::from_secs_f32(dt);
        self.backdrop.update(dt);

        for cue in self.envelope.advance(dt) {
            self.on_cue(cue);
        }
        self.countdown.update(wall, self.clock);
        self.registry.update(self.clock);
    }

    fn on_cue(&mut self, cue: Cue) {
        match cue {
            Cue::Confetti => {
                let (x, y) = self.card.geometry().confetti_origin(&self.envelope.pose());
                self.registry.trigger(EffectKind::Confetti, Spawn::at(x, y), self.clock);
            }
            Cue::Complete => {
                tracing::info!("envelope opened");
                self.phase = Phase::Revealed;
                self.registry.trigger(EffectKind::Fireworks, Spawn::default(), self.clock);
            }
            Cue::FlapGlowOn | Cue::FlapGlowOff => {}
        }
    }

    pub fn render<W: Write>(&mut self, out: &mut W) -> std::io::Result<()> {
        self.backdrop.render();
        self.card.clear();
        match self.phase {
            Phase::Sealed | Phase::Opening => self.card.draw_envelope(
                &self.envelope.pose(),
                &self.config.palette(),
                &self.config.title,
                self.phase == Phase::Sealed,
            ),
            Phase::Revealed => self.card.draw_invitation(&self.config, &self.countdown),
        }

        // backdrop, ambient floaters, card, then bursts on top
        let mut layers: Vec<&Surface> = vec![self.backdrop.surface()];
        layers.extend(self.registry.layers().filter(|(k, _)| k.is_ambient()).map(|(_, s)| s));
        layers.push(self.card.surface());
        layers.extend(self.registry.layers().filter(|(k, _)| !k.is_ambient()).map(|(_, s)| s));

        self.screen.present(&layers, out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use crossterm::event::{KeyEvent, KeyModifiers, MouseEvent};

    const DT: f32 = 1.0 / 60.0;

    fn wall() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 8, 1).unwrap().and_hms_opt(9, 0, 0).unwrap()
    }

    fn invitation() -> Invitation {
        Invitation::new(InvitationConfig::default(), 160, 50).unwrap()
    }

    fn key(code: KeyCode) -> Event {
        Event::Key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    fn left_click(column: u16, row: u16) -> Event {
        Event::Mouse(MouseEvent {
            kind: MouseEventKind::Down(MouseButton::Left),
            column,
            row,
            modifiers: KeyModifiers::NONE,
        })
    }

    fn running(app: &Invitation, kind: EffectKind) -> bool {
        app.registry().get(kind).is_some_and(|e| e.is_running())
    }

    fn open_fully(app: &mut Invitation) {
        app.handle_event(&key(KeyCode::Enter));
        for _ in 0..200 {
            app.update(DT, wall());
        }
    }

    #[test]
    fn ambient_layer_runs_before_opening() {
        let mut app = invitation();
        app.update(DT, wall());
        assert_eq!(app.phase(), Phase::Sealed);
        assert!(running(&app, EffectKind::Caps));
        assert!(!running(&app, EffectKind::Confetti));
    }

    #[test]
    fn opening_fires_confetti_then_fireworks() {
        fastrand::seed(5);
        let mut app = invitation();
        app.handle_event(&key(KeyCode::Enter));
        assert_eq!(app.phase(), Phase::Opening);

        let mut confetti_at = None;
        for step in 0..200 {
            app.update(DT, wall());
            if confetti_at.is_none() && running(&app, EffectKind::Confetti) {
                confetti_at = Some(step as f32 * DT);
            }
            if app.phase() == Phase::Revealed {
                break;
            }
        }

        let at = confetti_at.expect("no confetti during opening");
        assert!((0.55..0.65).contains(&at), "confetti at {at}s");
        assert_eq!(app.phase(), Phase::Revealed);
        assert!(running(&app, EffectKind::Fireworks));
        assert!(app.clock() >= Duration::from_secs_f32(2.35));
    }

    #[test]
    fn clicks_before_reveal_only_open() {
        let mut app = invitation();
        app.handle_event(&left_click(10, 10));
        assert_eq!(app.phase(), Phase::Opening);
        app.handle_event(&left_click(10, 10));
        app.handle_event(&key(KeyCode::Char('f')));
        assert!(!running(&app, EffectKind::Fireworks));
    }

    #[test]
    fn click_and_double_click_after_reveal() {
        fastrand::seed(9);
        let mut app = invitation();
        open_fully(&mut app);
        assert_eq!(app.phase(), Phase::Revealed);
        // let the opening confetti burn out
        for _ in 0..200 {
            app.update(DT, wall());
        }
        assert!(!running(&app, EffectKind::Confetti));

        app.handle_event(&left_click(40, 12));
        assert!(running(&app, EffectKind::Confetti));
        assert!(!running(&app, EffectKind::Emoji));

        app.update(DT, wall());
        app.handle_event(&left_click(40, 12));
        assert!(running(&app, EffectKind::Emoji));
    }

    #[test]
    fn slow_clicks_are_not_a_double_click() {
        let mut app = invitation();
        open_fully(&mut app);
        app.handle_event(&left_click(5, 5));
        for _ in 0..30 {
            app.update(DT, wall());
        }
        app.handle_event(&left_click(5, 5));
        assert!(!running(&app, EffectKind::Emoji));
    }

    #[test]
    fn fireworks_key_after_reveal() {
        let mut app = invitation();
        open_fully(&mut app);
        for _ in 0..600 {
            app.update(DT, wall());
        }
        assert!(!running(&app, EffectKind::Fireworks));
        app.handle_event(&key(KeyCode::Char('f')));
        assert!(running(&app, EffectKind::Fireworks));
    }

    #[test]
    fn resize_and_render() {
        let mut app = invitation();
        app.update(DT, wall());
        app.handle_event(&Event::Resize(40, 12));
        app.update(DT, wall());

        let mut out = Vec::new();
        app.render(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("\x1b[H"));
        assert_eq!(text.matches('▄').count(), 40 * 12);
    }

    #[test]
    fn narrow_terminal_text_stays_inside_the_row() {
        use unicode_width::UnicodeWidthStr;

        fastrand::seed(3);
        let cols = 40;
        let mut app = Invitation::new(InvitationConfig::default(), cols, 30).unwrap();
        open_fully(&mut app);
        app.handle_event(&left_click(39, 29));
        app.update(DT, wall());
        app.handle_event(&left_click(39, 29));
        for _ in 0..20 {
            app.update(DT, wall());
        }
        let mut out = Vec::new();
        app.render(&mut out).unwrap();

        let mut layers = vec![app.card.surface()];
        layers.extend(app.registry().layers().map(|(_, s)| s));
        let glyphs: Vec<_> = layers.iter().flat_map(|s| s.glyphs()).collect();
        assert!(!glyphs.is_empty());
        for glyph in glyphs {
            assert!(
                glyph.col + glyph.text.width() <= cols,
                "{:?} at col {} overruns {} columns",
                glyph.text,
                glyph.col,
                cols
            );
        }
    }

    #[test]
    fn cell_centres_map_to_logical_pixels() {
        let app = invitation();
        assert_eq!(app.cell_center(0, 0), (4.0, 8.0));
        assert_eq!(app.cell_center(10, 3), (84.0, 56.0));
    }
}
