use crate::scheduler::DelayQueue;
use chrono::NaiveDateTime;
use std::time::Duration;

const TICK: Duration = Duration::from_millis(1000);
const FLIP: Duration = Duration::from_millis(600);
const FLASH: Duration = Duration::from_millis(500);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Remaining {
    pub days: i64,
    pub hours: i64,
    pub minutes: i64,
    pub seconds: i64,
}

impl Remaining {
    pub fn values(&self) -> [i64; 4] {
        [self.days, self.hours, self.minutes, self.seconds]
    }
}

/// Time left until `event`, or `None` once it has passed.
pub fn remaining(event: NaiveDateTime, now: NaiveDateTime) -> Option<Remaining> {
    let distance = (event - now).num_milliseconds();
    if distance < 0 {
        return None;
    }

    const SECOND: i64 = 1000;
    const MINUTE: i64 = 60 * SECOND;
    const HOUR: i64 = 60 * MINUTE;
    const DAY: i64 = 24 * HOUR;

    Some(Remaining {
        days: distance / DAY,
        hours: (distance % DAY) / HOUR,
        minutes: (distance % HOUR) / MINUTE,
        seconds: (distance % MINUTE) / SECOND,
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlipPhase {
    Steady,
    /// Back face shows the new value while the card turns.
    Flipping { until: Duration },
    /// Front face updated; the box is highlighted.
    Flashing { until: Duration },
}

#[derive(Debug, Clone)]
pub struct FlipCard {
    pub label: &'static str,
    front: String,
    back: String,
    value: Option<i64>,
    phase: FlipPhase,
}

impl FlipCard {
    pub fn new(label: &'static str) -> Self {
        Self {
            label,
            front: "--".to_string(),
            back: "--".to_string(),
            value: None,
            phase: FlipPhase::Steady,
        }
    }

    pub fn front(&self) -> &str {
        &self.front
    }

    pub fn back(&self) -> &str {
        &self.back
    }

    pub fn phase(&self) -> FlipPhase {
        self.phase
    }

    /// Shows `value`. A change from a previously shown value flips the card;
    /// the first value is set on both faces directly.
    pub fn set(&mut self, value: i64, now: Duration) {
        let formatted = format!("{:02}", value);
        match self.value {
            Some(prev) if prev != value => {
                self.back = formatted;
                self.phase = FlipPhase::Flipping { until: now + FLIP };
            }
            _ => {
                if self.phase == FlipPhase::Steady {
                    self.front = formatted.clone();
                    self.back = formatted;
                }
            }
        }
        self.value = Some(value);
    }

    pub fn tick(&mut self, now: Duration) {
        match self.phase {
            FlipPhase::Flipping { until } if now >= until => {
                self.front = self.back.clone();
                self.phase = FlipPhase::Flashing { until: until + FLASH };
            }
            FlipPhase::Flashing { until } if now >= until => {
                self.phase = FlipPhase::Steady;
            }
            _ => {}
        }
    }
}

/// Days / hours / minutes / seconds flip cards, refreshed once a second.
#[derive(Debug, Clone)]
pub struct Countdown {
    event: NaiveDateTime,
    cards: [FlipCard; 4],
    ticks: DelayQueue<()>,
    started: bool,
}

impl Countdown {
    pub fn new(event: NaiveDateTime) -> Self {
        let mut ticks = DelayQueue::new();
        ticks.schedule(Duration::ZERO, ());
        Self {
            event,
            cards: [
                FlipCard::new("days"),
                FlipCard::new("hours"),
                FlipCard::new("minutes"),
                FlipCard::new("seconds"),
            ],
            ticks,
            started: false,
        }
    }

    pub fn cards(&self) -> &[FlipCard; 4] {
        &self.cards
    }

    /// True once the event time has passed; the countdown stops ticking.
    pub fn has_started(&self) -> bool {
        self.started
    }

    /// `wall` is the current local time, `clock` the scene clock that drives
    /// the tick interval and the flip animations.
    pub fn update(&mut self, wall: NaiveDateTime, clock: Duration) {
        for card in &mut self.cards {
            card.tick(clock);
        }
        if self.started || self.ticks.drain_due(clock).is_empty() {
            return;
        }
        self.ticks.schedule(clock + TICK, ());

        match remaining(self.event, wall) {
            Some(left) => {
                for (card, value) in self.cards.iter_mut().zip(left.values()) {
                    card.set(value, clock);
                }
            }
            None => {
                tracing::info!(event = %self.event, "countdown reached the event");
                self.started = true;
            }
        }
    }
}
