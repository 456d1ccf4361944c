use crate::color::{Rgb, parse_hex_color};
use crate::effects::{EffectKind, EffectSettings};
use chrono::{NaiveDate, NaiveDateTime};
use serde::Deserialize;
use std::{env, fmt::Display, fs, path::Path, path::PathBuf, str::FromStr};
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("invalid {key} value {value:?}: {reason}")]
    InvalidValue {
        key: String,
        value: String,
        reason: String,
    },

    #[error("invalid background colour {0:?}, expected RRGGBB")]
    InvalidColor(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Variant {
    #[default]
    Graduation,
    Wedding,
}

impl Variant {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "graduation" => Some(Variant::Graduation),
            "wedding" => Some(Variant::Wedding),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Variant::Graduation => "graduation",
            Variant::Wedding => "wedding",
        }
    }

    pub fn palette(&self) -> Palette {
        match self {
            Variant::Graduation => Palette {
                glow: [(24, 38, 82), (196, 160, 80)],
                envelope: (214, 190, 150),
                flap: (191, 160, 118),
                card: (250, 244, 230),
                ink: (40, 44, 70),
                accent: (212, 175, 55),
            },
            Variant::Wedding => Palette {
                glow: [(90, 30, 60), (240, 170, 190)],
                envelope: (244, 214, 220),
                flap: (228, 180, 192),
                card: (255, 250, 250),
                ink: (110, 40, 70),
                accent: (220, 90, 120),
            },
        }
    }
}

/// Theme colours for one page variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    /// Backdrop glow runs between these two.
    pub glow: [Rgb; 2],
    pub envelope: Rgb,
    pub flap: Rgb,
    pub card: Rgb,
    pub ink: Rgb,
    pub accent: Rgb,
}

/// Everything one invitation page needs. Built from a preset and optionally
/// overridden by a JSON file.
#[derive(Debug, Clone, PartialEq)]
pub struct InvitationConfig {
    pub variant: Variant,
    pub title: String,
    pub lines: Vec<String>,
    pub event_date: NaiveDateTime,
    pub effects: Vec<EffectKind>,
    pub compact_width: f32,
    pub pixel_scale: f32,
    pub background: Rgb,
    pub emoji: String,
}

impl Default for InvitationConfig {
    fn default() -> Self {
        Self::preset(Variant::Graduation)
    }
}

fn default_event_date() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2025, 8, 16)
        .and_then(|d| d.and_hms_opt(8, 0, 0))
        .unwrap_or_default()
}

impl InvitationConfig {
    pub fn preset(variant: Variant) -> Self {
        let (title, lines, ambient, emoji) = match variant {
            Variant::Graduation => (
                "Graduation Invitation",
                vec![
                    "You are warmly invited to celebrate".to_string(),
                    "my graduation ceremony".to_string(),
                ],
                EffectKind::Caps,
                "🎓",
            ),
            Variant::Wedding => (
                "Wedding Invitation",
                vec![
                    "Together with our families".to_string(),
                    "we invite you to share our joy".to_string(),
                ],
                EffectKind::Hearts,
                "💖",
            ),
        };

        Self {
            variant,
            title: title.to_string(),
            lines,
            event_date: default_event_date(),
            effects: vec![
                ambient,
                EffectKind::Fireworks,
                EffectKind::Confetti,
                EffectKind::Emoji,
            ],
            compact_width: 768.0,
            pixel_scale: 8.0,
            background: (0, 0, 0),
            emoji: emoji.to_string(),
        }
    }

    /// Reads overrides from `path` on top of the preset the file names
    /// (graduation when it names none).
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let overrides: Overrides = serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        info!(path = %path.display(), "loaded invitation config");
        overrides.apply()
    }

    pub fn palette(&self) -> Palette {
        self.variant.palette()
    }

    pub fn effect_settings(&self) -> EffectSettings {
        EffectSettings {
            pixel_scale: self.pixel_scale,
            compact_width: self.compact_width,
            emoji: self.emoji.clone(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct Overrides {
    variant: Option<Variant>,
    title: Option<String>,
    lines: Option<Vec<String>>,
    event_date: Option<NaiveDateTime>,
    effects: Option<Vec<EffectKind>>,
    compact_width: Option<f32>,
    pixel_scale: Option<f32>,
    background: Option<String>,
    emoji: Option<String>,
}

impl Overrides {
    fn apply(self) -> Result<InvitationConfig, ConfigError> {
        let mut config = InvitationConfig::preset(self.variant.unwrap_or_default());
        if let Some(title) = self.title {
            config.title = title;
        }
        if let Some(lines) = self.lines {
            config.lines = lines;
        }
        if let Some(date) = self.event_date {
            config.event_date = date;
        }
        if let Some(effects) = self.effects {
            config.effects = effects;
        }
        if let Some(width) = self.compact_width {
            config.compact_width = width;
        }
        if let Some(scale) = self.pixel_scale {
            config.pixel_scale = scale;
        }
        if let Some(hex) = self.background {
            config.background = parse_hex_color(&hex).ok_or(ConfigError::InvalidColor(hex))?;
        }
        if let Some(emoji) = self.emoji {
            config.emoji = emoji;
        }
        Ok(config)
    }
}

/// Guestbook server settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub store_path: PathBuf,
}

impl ServerConfig {
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        Ok(Self {
            host: try_load(&lookup, "HOST", "127.0.0.1")?,
            port: try_load(&lookup, "PORT", "3000")?,
            store_path: try_load(&lookup, "GUESTBOOK_PATH", "guestbook.json")?,
        })
    }

    pub fn bind_addr(&self) -> (String, u16) {
        (self.host.clone(), self.port)
    }
}

fn try_load<T, F>(lookup: &F, key: &str, default: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: Display,
    F: Fn(&str) -> Option<String>,
{
    let value = lookup(key).unwrap_or_else(|| {
        info!("{key} not set, using default: {default}");
        default.to_string()
    });
    value.parse().map_err(|e: T::Err| {
        warn!("Invalid {key} value: {e}");
        ConfigError::InvalidValue {
            key: key.to_string(),
            value,
            reason: e.to_string(),
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn presets_pick_their_ambient_layer() {
        let grad = InvitationConfig::preset(Variant::Graduation);
        assert!(grad.effects.contains(&EffectKind::Caps));
        assert!(!grad.effects.contains(&EffectKind::Hearts));

        let wedding = InvitationConfig::preset(Variant::Wedding);
        assert!(wedding.effects.contains(&EffectKind::Hearts));
        assert_eq!(wedding.event_date.to_string(), "2025-08-16 08:00:00");
        assert_eq!(InvitationConfig::default(), grad);
    }

    #[test]
    fn file_overrides_apply_on_top_of_the_named_preset() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r##"{{
                "variant": "wedding",
                "event_date": "2026-05-01T17:30:00",
                "background": "#1a1b26",
                "effects": ["hearts", "confetti"]
            }}"##
        )
        .unwrap();

        let config = InvitationConfig::load(file.path()).unwrap();
        assert_eq!(config.variant, Variant::Wedding);
        assert_eq!(config.title, "Wedding Invitation");
        assert_eq!(config.background, (0x1a, 0x1b, 0x26));
        assert_eq!(config.effects, vec![EffectKind::Hearts, EffectKind::Confetti]);
        assert_eq!(config.event_date.to_string(), "2026-05-01 17:30:00");
        assert_eq!(config.pixel_scale, 8.0);
    }

    #[test]
    fn bad_files_are_reported() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"background": "nope"}}"#).unwrap();
        assert!(matches!(
            InvitationConfig::load(file.path()),
            Err(ConfigError::InvalidColor(_))
        ));

        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"colour": "red"}}"#).unwrap();
        assert!(matches!(InvitationConfig::load(file.path()), Err(ConfigError::Parse { .. })));

        assert!(matches!(
            InvitationConfig::load(Path::new("/definitely/not/here.json")),
            Err(ConfigError::Read { .. })
        ));
    }

    #[test]
    fn server_config_defaults_and_overrides() {
        let config = ServerConfig::from_lookup(|_| None).unwrap();
        assert_eq!(config.port, 3000);
        assert_eq!(config.store_path, PathBuf::from("guestbook.json"));

        let env: HashMap<&str, &str> = [("PORT", "8080"), ("GUESTBOOK_PATH", "/tmp/gb.json")].into();
        let config = ServerConfig::from_lookup(|k| env.get(k).map(|v| v.to_string())).unwrap();
        assert_eq!(config.bind_addr(), ("127.0.0.1".to_string(), 8080));
        assert_eq!(config.store_path, PathBuf::from("/tmp/gb.json"));
    }

    #[test]
    fn invalid_port_is_an_error() {
        let err = ServerConfig::from_lookup(|k| (k == "PORT").then(|| "eighty".to_string()));
        assert!(matches!(err, Err(ConfigError::InvalidValue { ref key, .. }) if key == "PORT"));
    }
}
