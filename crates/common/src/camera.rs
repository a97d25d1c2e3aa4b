//! Camera value types shared by the device contract, the session and config.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ShutterError;

/// Which physical camera feeds the viewfinder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Lens {
    Front,
    #[default]
    Back,
}

impl Lens {
    /// The opposite lens.
    pub fn toggled(self) -> Self {
        match self {
            Lens::Front => Lens::Back,
            Lens::Back => Lens::Front,
        }
    }
}

/// Flash mode applied to captures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Flash {
    #[default]
    Off,
    On,
}

impl Flash {
    /// The opposite flash mode.
    pub fn toggled(self) -> Self {
        match self {
            Flash::Off => Flash::On,
            Flash::On => Flash::Off,
        }
    }
}

impl fmt::Display for Lens {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Lens::Front => f.write_str("front"),
            Lens::Back => f.write_str("back"),
        }
    }
}

impl fmt::Display for Flash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Flash::Off => f.write_str("off"),
            Flash::On => f.write_str("on"),
        }
    }
}

impl FromStr for Lens {
    type Err = ShutterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "front" => Ok(Lens::Front),
            "back" | "rear" => Ok(Lens::Back),
            other => Err(ShutterError::config(format!("unknown lens '{other}'"))),
        }
    }
}

impl FromStr for Flash {
    type Err = ShutterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "off" => Ok(Flash::Off),
            "on" => Ok(Flash::On),
            other => Err(ShutterError::config(format!("unknown flash mode '{other}'"))),
        }
    }
}

/// Options passed to a still capture.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PictureOptions {
    /// Compression quality in `[0.0, 1.0]`.
    pub quality: f32,

    /// Whether the device should also return base64 image data.
    pub base64: bool,

    /// Skip device-side post processing (orientation, resizing).
    pub skip_processing: bool,
}

impl PictureOptions {
    /// Copy with quality clamped into `[0.0, 1.0]`.
    pub fn normalized(self) -> Self {
        let quality = if self.quality.is_nan() {
            Self::default().quality
        } else {
            self.quality.clamp(0.0, 1.0)
        };
        Self { quality, ..self }
    }
}

impl Default for PictureOptions {
    fn default() -> Self {
        Self {
            quality: 0.5,
            base64: true,
            skip_processing: true,
        }
    }
}

/// Kind of captured media.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    Photo,
    Video,
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArtifactKind::Photo => f.write_str("photo"),
            ArtifactKind::Video => f.write_str("video"),
        }
    }
}

/// A captured photo or video at its transient location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artifact {
    pub uri: String,
    pub kind: ArtifactKind,
}

impl Artifact {
    pub fn photo(uri: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            kind: ArtifactKind::Photo,
        }
    }

    pub fn video(uri: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            kind: ArtifactKind::Video,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toggle_is_an_involution() {
        assert_eq!(Lens::Back.toggled(), Lens::Front);
        assert_eq!(Lens::Back.toggled().toggled(), Lens::Back);
        assert_eq!(Flash::Off.toggled(), Flash::On);
        assert_eq!(Flash::On.toggled().toggled(), Flash::On);
    }

    #[test]
    fn test_parse_lens_and_flash() {
        assert_eq!("FRONT".parse::<Lens>().unwrap(), Lens::Front);
        assert_eq!("rear".parse::<Lens>().unwrap(), Lens::Back);
        assert_eq!(" on ".parse::<Flash>().unwrap(), Flash::On);
        assert!("sideways".parse::<Lens>().is_err());
        assert!("auto".parse::<Flash>().is_err());
    }

    #[test]
    fn test_picture_options_defaults_and_clamp() {
        let opts = PictureOptions::default();
        assert!((opts.quality - 0.5).abs() < f32::EPSILON);
        assert!(opts.base64);
        assert!(opts.skip_processing);

        let clamped = PictureOptions {
            quality: 3.0,
            ..opts
        }
        .normalized();
        assert!((clamped.quality - 1.0).abs() < f32::EPSILON);

        let nan = PictureOptions {
            quality: f32::NAN,
            ..opts
        }
        .normalized();
        assert!((nan.quality - 0.5).abs() < f32::EPSILON);
    }

    #[test]
    fn test_serde_uses_snake_case() {
        assert_eq!(serde_json::to_string(&Lens::Front).unwrap(), "\"front\"");
        assert_eq!(
            serde_json::to_string(&ArtifactKind::Video).unwrap(),
            "\"video\""
        );
    }
}
