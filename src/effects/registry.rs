use super::ambient::AmbientEffect;
use super::confetti::ConfettiEffect;
use super::emoji::EmojiEffect;
use super::fireworks::FireworksEffect;
use super::{Effect, EffectKind, EffectSettings, Spawn};
use crate::surface::{Surface, SurfaceError};
use std::collections::BTreeMap;
use std::time::Duration;

enum Slot {
    Ready(Box<dyn Effect>),
    Unavailable(SurfaceError),
}

/// Every effect a page enabled, built once at start-up. Effects whose surface
/// could not be resolved keep an `Unavailable` slot and ignore triggers.
pub struct EffectRegistry {
    slots: BTreeMap<EffectKind, Slot>,
}

impl EffectRegistry {
    /// An effect that is unavailable here stays a no-op for the life of the
    /// registry; a later `resize` only reaches ready effects.
    pub fn build(kinds: &[EffectKind], cols: usize, rows: usize, settings: &EffectSettings) -> Self {
        let mut slots = BTreeMap::new();
        for &kind in kinds {
            let slot = match construct(kind, cols, rows, settings) {
                Ok(effect) => {
                    tracing::debug!(effect = kind.name(), cols, rows, "effect ready");
                    Slot::Ready(effect)
                }
                Err(e) => {
                    tracing::error!(effect = kind.name(), "effect disabled: {}", e);
                    Slot::Unavailable(e)
                }
            };
            slots.insert(kind, slot);
        }
        Self { slots }
    }

    /// Returns false when the effect is not enabled or not available.
    pub fn trigger(&mut self, kind: EffectKind, spawn: Spawn, now: Duration) -> bool {
        match self.slots.get_mut(&kind) {
            Some(Slot::Ready(effect)) => {
                effect.trigger(spawn, now);
                true
            }
            Some(Slot::Unavailable(_)) => {
                tracing::debug!(effect = kind.name(), "trigger ignored, effect unavailable");
                false
            }
            None => false,
        }
    }

    pub fn update(&mut self, now: Duration) {
        for effect in self.ready_mut() {
            effect.update(now);
        }
    }

    pub fn resize(&mut self, cols: usize, rows: usize) {
        for effect in self.ready_mut() {
            effect.resize(cols, rows);
        }
    }

    pub fn get(&self, kind: EffectKind) -> Option<&dyn Effect> {
        match self.slots.get(&kind) {
            Some(Slot::Ready(effect)) => Some(effect.as_ref()),
            _ => None,
        }
    }

    pub fn unavailable(&self, kind: EffectKind) -> Option<&SurfaceError> {
        match self.slots.get(&kind) {
            Some(Slot::Unavailable(e)) => Some(e),
            _ => None,
        }
    }

    pub fn is_enabled(&self, kind: EffectKind) -> bool {
        self.slots.contains_key(&kind)
    }

    /// Surfaces in paint order, bottom first.
    pub fn layers(&self) -> impl Iterator<Item = (EffectKind, &Surface)> + '_ {
        self.slots.values().filter_map(|slot| match slot {
            Slot::Ready(effect) => Some((effect.kind(), effect.surface())),
            Slot::Unavailable(_) => None,
        })
    }

    fn ready_mut(&mut self) -> impl Iterator<Item = &mut Box<dyn Effect>> + '_ {
        self.slots.values_mut().filter_map(|slot| match slot {
            Slot::Ready(effect) => Some(effect),
            Slot::Unavailable(_) => None,
        })
    }
}

fn construct(
    kind: EffectKind,
    cols: usize,
    rows: usize,
    settings: &EffectSettings,
) -> Result<Box<dyn Effect>, SurfaceError> {
    let surface = Surface::resolve(cols, rows, settings.pixel_scale)?;
    Ok(match kind {
        EffectKind::Confetti => Box::new(ConfettiEffect::new(surface, settings)),
        EffectKind::Fireworks => Box::new(FireworksEffect::new(surface, settings)),
        EffectKind::Emoji => Box::new(EmojiEffect::new(surface, settings)),
        EffectKind::Caps | EffectKind::Hearts => Box::new(AmbientEffect::new(surface, kind)),
    })
}
