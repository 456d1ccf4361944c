//! Scripted envelope-opening sequence.
//!
//! A [`Timeline`] is a list of tweens over named properties. Each step starts
//! either at the current end of the timeline or some seconds before it, so
//! steps can overlap. Cues attached to step starts and ends are reported by
//! [`Timeline::advance`] exactly once, in time order.

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Prop {
    EnvelopeScale,
    EnvelopeRotate,
    EnvelopeY,
    EnvelopeOpacity,
    FlapAngle,
    ContentOpacity,
    ContentY,
    ContentScale,
    ShellOpacity,
    ContainerOpacity,
}

impl Prop {
    pub fn initial(&self) -> f32 {
        match self {
            Prop::EnvelopeScale => 1.0,
            Prop::EnvelopeRotate => 0.0,
            Prop::EnvelopeY => 0.0,
            Prop::EnvelopeOpacity => 1.0,
            Prop::FlapAngle => 0.0,
            Prop::ContentOpacity => 0.0,
            Prop::ContentY => 0.0,
            Prop::ContentScale => 0.8,
            Prop::ShellOpacity => 1.0,
            Prop::ContainerOpacity => 1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Ease {
    Linear,
    /// Cubic ease-in.
    Power2In,
    /// Cubic ease-in-out.
    Power2InOut,
    /// Quartic ease-out.
    Power3Out,
    /// Overshoots by the given amount before settling.
    BackOut(f32),
}

impl Ease {
    pub fn apply(&self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Ease::Linear => t,
            Ease::Power2In => t * t * t,
            Ease::Power2InOut => {
                if t < 0.5 {
                    4.0 * t * t * t
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
                }
            }
            Ease::Power3Out => 1.0 - (1.0 - t).powi(4),
            Ease::BackOut(s) => {
                let p = t - 1.0;
                p * p * ((s + 1.0) * p + s) + 1.0
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Position {
    /// At the current end of the timeline.
    End,
    /// This many seconds before the current end.
    BeforeEnd(f32),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cue {
    FlapGlowOn,
    FlapGlowOff,
    Confetti,
    Complete,
}

#[derive(Debug, Clone)]
pub struct Step {
    targets: Vec<(Prop, f32)>,
    duration: f32,
    ease: Ease,
    position: Position,
    on_start: Option<Cue>,
    on_complete: Option<Cue>,
}

impl Step {
    pub fn to(targets: &[(Prop, f32)], duration: f32) -> Self {
        Self {
            targets: targets.to_vec(),
            duration: duration.max(0.0),
            ease: Ease::Power3Out,
            position: Position::End,
            on_start: None,
            on_complete: None,
        }
    }

    pub fn ease(mut self, ease: Ease) -> Self {
        self.ease = ease;
        self
    }

    pub fn at(mut self, position: Position) -> Self {
        self.position = position;
        self
    }

    pub fn on_start(mut self, cue: Cue) -> Self {
        self.on_start = Some(cue);
        self
    }

    pub fn on_complete(mut self, cue: Cue) -> Self {
        self.on_complete = Some(cue);
        self
    }
}

#[derive(Debug, Clone)]
struct Tween {
    prop: Prop,
    from: f32,
    to: f32,
    start: f32,
    duration: f32,
    ease: Ease,
}

impl Tween {
    fn value(&self, t: f32) -> f32 {
        let progress = if self.duration > 0.0 {
            (t - self.start) / self.duration
        } else {
            1.0
        };
        self.from + (self.to - self.from) * self.ease.apply(progress)
    }
}

#[derive(Debug, Clone, Default)]
pub struct Timeline {
    tweens: Vec<Tween>,
    /// `(start, end)` of every step, in insertion order.
    windows: Vec<(f32, f32)>,
    cues: Vec<(f32, Cue)>,
    elapsed: f32,
    fired: usize,
}

impl Timeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn then(mut self, step: Step) -> Self {
        let start = match step.position {
            Position::End => self.duration(),
            Position::BeforeEnd(d) => (self.duration() - d).max(0.0),
        };
        let end = start + step.duration;

        for &(prop, to) in &step.targets {
            let from = self.value_at(prop, start);
            self.tweens.push(Tween { prop, from, to, start, duration: step.duration, ease: step.ease });
        }
        self.windows.push((start, end));
        if let Some(cue) = step.on_start {
            self.cues.push((start, cue));
        }
        if let Some(cue) = step.on_complete {
            self.cues.push((end, cue));
        }
        self
    }

    /// End of the last step, in seconds.
    pub fn duration(&self) -> f32 {
        self.windows.iter().fold(0.0, |acc, &(_, end)| acc.max(end))
    }

    pub fn step_windows(&self) -> &[(f32, f32)] {
        &self.windows
    }

    pub fn value_at(&self, prop: Prop, t: f32) -> f32 {
        self.tweens
            .iter()
            .filter(|tw| tw.prop == prop && tw.start <= t)
            .last()
            .map(|tw| tw.value(t))
            .unwrap_or_else(|| prop.initial())
    }

    pub fn value(&self, prop: Prop) -> f32 {
        self.value_at(prop, self.elapsed)
    }

    /// Moves the playhead forward and returns the cues it crossed.
    pub fn advance(&mut self, dt: f32) -> Vec<Cue> {
        self.elapsed += dt.max(0.0);

        let mut schedule = self.cues.clone();
        schedule.push((self.duration(), Cue::Complete));
        // stable: equal times keep declaration order
        schedule.sort_by(|a, b| a.0.total_cmp(&b.0));

        let due: Vec<Cue> = schedule
            .iter()
            .skip(self.fired)
            .take_while(|(at, _)| *at <= self.elapsed + 1e-6)
            .map(|&(_, cue)| cue)
            .collect();
        self.fired += due.len();
        due
    }
}

/// Every animated property of the envelope at one instant.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnvelopePose {
    pub scale: f32,
    pub rotate_deg: f32,
    pub offset_y: f32,
    pub opacity: f32,
    pub flap_angle_deg: f32,
    pub content_opacity: f32,
    pub content_offset_y: f32,
    pub content_scale: f32,
    pub shell_opacity: f32,
    pub container_opacity: f32,
    pub flap_glow: bool,
}

/// The opening sequence plus the state its cues toggle.
#[derive(Debug, Clone)]
pub struct Envelope {
    timeline: Timeline,
    flap_glow: bool,
    started: bool,
}

impl Default for Envelope {
    fn default() -> Self {
        Self::new()
    }
}

impl Envelope {
    pub fn new() -> Self {
        Self {
            timeline: opening_timeline(),
            flap_glow: false,
            started: false,
        }
    }

    pub fn open(&mut self) -> bool {
        let first = !self.started;
        self.started = true;
        first
    }

    /// Advances the sequence once opened; cues come back to the caller.
    pub fn advance(&mut self, dt: f32) -> Vec<Cue> {
        if !self.started {
            return Vec::new();
        }
        let cues = self.timeline.advance(dt);
        for cue in &cues {
            match cue {
                Cue::FlapGlowOn => self.flap_glow = true,
                Cue::FlapGlowOff => self.flap_glow = false,
                Cue::Confetti | Cue::Complete => {}
            }
        }
        cues
    }

    pub fn pose(&self) -> EnvelopePose {
        let tl = &self.timeline;
        EnvelopePose {
            scale: tl.value(Prop::EnvelopeScale),
            rotate_deg: tl.value(Prop::EnvelopeRotate),
            offset_y: tl.value(Prop::EnvelopeY),
            opacity: tl.value(Prop::EnvelopeOpacity),
            flap_angle_deg: tl.value(Prop::FlapAngle),
            content_opacity: tl.value(Prop::ContentOpacity),
            content_offset_y: tl.value(Prop::ContentY),
            content_scale: tl.value(Prop::ContentScale),
            shell_opacity: tl.value(Prop::ShellOpacity),
            container_opacity: tl.value(Prop::ContainerOpacity),
            flap_glow: self.flap_glow,
        }
    }
}

/// Swell, flap open, card rises (confetti), shell fades, envelope flies off.
pub fn opening_timeline() -> Timeline {
    Timeline::new()
        .then(Step::to(&[(Prop::EnvelopeScale, 1.1)], 0.4).ease(Ease::Power2InOut))
        .then(
            Step::to(&[(Prop::FlapAngle, 180.0)], 1.2)
                .ease(Ease::BackOut(1.8))
                .at(Position::BeforeEnd(0.2))
                .on_start(Cue::FlapGlowOn)
                .on_complete(Cue::FlapGlowOff),
        )
        .then(
            Step::to(
                &[(Prop::ContentOpacity, 1.0), (Prop::ContentY, -60.0), (Prop::ContentScale, 1.0)],
                1.0,
            )
            .at(Position::BeforeEnd(0.8))
            .on_start(Cue::Confetti),
        )
        .then(Step::to(&[(Prop::ShellOpacity, 0.5)], 0.6).at(Position::BeforeEnd(0.6)))
        .then(
            Step::to(
                &[
                    (Prop::EnvelopeScale, 0.7),
                    (Prop::EnvelopeRotate, 10.0),
                    (Prop::EnvelopeY, -300.0),
                    (Prop::EnvelopeOpacity, 0.0),
                ],
                0.8,
            )
            .ease(Ease::Power2In),
        )
        .then(Step::to(&[(Prop::ContainerOpacity, 0.0)], 0.4).at(Position::BeforeEnd(0.4)))
}
