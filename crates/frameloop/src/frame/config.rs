use serde::{Deserialize, Serialize};

use crate::api::error::FrameError;

/// Tunables for a looping frame. Loaded from JSON alongside level data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameConfig {
    /// Region width and height in tiles.
    #[serde(default = "default_size")]
    pub size: [u32; 2],
    /// Vertical offset of the anchor above the actor while standing.
    #[serde(default = "default_y_offset")]
    pub y_offset: f32,
    /// Vertical offset of the anchor while the actor crouches.
    #[serde(default = "default_crouch_y_offset")]
    pub crouch_y_offset: f32,
    /// Start flips the frame and stop is ignored, instead of hold-to-loop.
    #[serde(default)]
    pub toggle: bool,
    /// Cap on downward speed of bodies inside the frame.
    #[serde(default = "default_terminal_fall_speed")]
    pub terminal_fall_speed: f32,
    /// How much smaller than the region the interior sensor is, per axis.
    #[serde(default = "default_interior_inset")]
    pub interior_inset: f32,
    /// Thickness of each edge sensor band.
    #[serde(default = "default_edge_band")]
    pub edge_band: f32,
}

fn default_size() -> [u32; 2] {
    [10, 6]
}

fn default_y_offset() -> f32 {
    1.0
}

fn default_crouch_y_offset() -> f32 {
    -2.0
}

fn default_terminal_fall_speed() -> f32 {
    15.0
}

fn default_interior_inset() -> f32 {
    0.2
}

fn default_edge_band() -> f32 {
    1.0
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            size: default_size(),
            y_offset: default_y_offset(),
            crouch_y_offset: default_crouch_y_offset(),
            toggle: false,
            terminal_fall_speed: default_terminal_fall_speed(),
            interior_inset: default_interior_inset(),
            edge_band: default_edge_band(),
        }
    }
}

impl FrameConfig {
    /// Parse a config from a JSON string. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, FrameError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.size = [width, height];
        self
    }

    pub fn with_toggle(mut self, toggle: bool) -> Self {
        self.toggle = toggle;
        self
    }

    pub fn validate(&self) -> Result<(), FrameError> {
        let [width, height] = self.size;
        if width == 0 || height == 0 {
            return Err(FrameError::InvalidSize { width, height });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_json_uses_defaults() {
        let config = FrameConfig::from_json("{}").unwrap();
        assert_eq!(config, FrameConfig::default());
        assert_eq!(config.terminal_fall_speed, 15.0);
        assert!(!config.toggle);
    }

    #[test]
    fn partial_json_overrides() {
        let config = FrameConfig::from_json(r#"{ "size": [3, 3], "toggle": true }"#).unwrap();
        assert_eq!(config.size, [3, 3]);
        assert!(config.toggle);
        assert_eq!(config.y_offset, 1.0);
    }

    #[test]
    fn zero_size_is_rejected() {
        let err = FrameConfig::from_json(r#"{ "size": [0, 4] }"#).unwrap_err();
        assert!(matches!(err, FrameError::InvalidSize { width: 0, height: 4 }));
    }

    #[test]
    fn malformed_json_is_a_config_error() {
        let err = FrameConfig::from_json("{ size: ").unwrap_err();
        assert!(matches!(err, FrameError::Config(_)));
    }
}
