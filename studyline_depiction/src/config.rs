// Copyright 2025 the Studyline Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use peniko::Color;
use serde::{Deserialize, Serialize};
use studyline_layout::LayoutStyle;
use studyline_model::Rgb;

use crate::ConfigError;

/// Colors used by the render passes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Palette {
    /// Canvas background; also the far end of group band gradients.
    pub background: Rgb,
    /// Labels and headers.
    pub text: Rgb,
    /// Secondary text such as weekend dates and counts.
    pub muted_text: Rgb,
    /// Vertical phase guide lines.
    pub guide: Rgb,
    /// Highlighted "today" column.
    pub today: Rgb,
    /// Connector from the margin to the first action.
    pub connector: Rgb,
    /// Group timelines.
    pub timeline: Rgb,
    /// Timelines of groups with a dividing sampling.
    pub dividing: Rgb,
    /// Sampling arrows.
    pub sampling: Rgb,
    /// Treatment arrows of uncolored treatments.
    pub treatment: Rgb,
    /// Arrows drawn while names are blinded.
    pub blinded_arrow: Rgb,
    /// Bands of uncolored or blinded groups.
    pub neutral_group: Rgb,
    /// Hazard halos.
    pub hazard: Rgb,
    /// Stopped-study cross.
    pub stopped: Rgb,
    /// Clicked selection.
    pub selection: Rgb,
    /// Hovered cell.
    pub hover: Rgb,
    /// Inline render-fault message.
    pub error: Rgb,
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            background: Rgb::WHITE,
            text: Rgb::BLACK,
            muted_text: Rgb::new(120, 120, 120),
            guide: Rgb::new(225, 225, 225),
            today: Rgb::new(255, 244, 186),
            connector: Rgb::new(190, 190, 190),
            timeline: Rgb::BLACK,
            dividing: Rgb::new(220, 0, 0),
            sampling: Rgb::new(220, 0, 0),
            treatment: Rgb::new(0, 130, 0),
            blinded_arrow: Rgb::new(110, 110, 110),
            neutral_group: Rgb::new(190, 190, 190),
            hazard: Rgb::new(255, 140, 0),
            stopped: Rgb::new(200, 0, 0),
            selection: Rgb::new(0, 90, 255),
            hover: Rgb::new(0, 90, 255),
            error: Rgb::new(255, 0, 0),
        }
    }
}

/// Converts a palette color to an opaque peniko color.
pub(crate) fn color(rgb: Rgb) -> Color {
    with_alpha(rgb, 255)
}

/// Converts a palette color to a peniko color with alpha.
pub(crate) fn with_alpha(rgb: Rgb, alpha: u8) -> Color {
    Color::from_rgba8(rgb.r, rgb.g, rgb.b, alpha)
}

/// Everything that styles a depiction besides the study and the viewer.
///
/// # Example
///
/// ```rust
/// use studyline_depiction::DepictionConfig;
///
/// let config = DepictionConfig::from_json_str(
///     r##"{"style": {"row_height": 28.0}, "palette": {"stopped": "#000000"}}"##,
/// )
/// .unwrap();
/// assert_eq!(config.style.row_height, 28.0);
/// assert_eq!(config.style.zoom_base, 1.3);
/// ```
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DepictionConfig {
    /// Geometry.
    pub style: LayoutStyle,
    /// Colors.
    pub palette: Palette,
}

impl DepictionConfig {
    /// Parses a configuration, filling omitted fields with defaults.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Serializes the configuration as pretty-printed JSON.
    pub fn to_json_string(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_round_trip_through_json() {
        let config = DepictionConfig::default();
        let json = config.to_json_string().unwrap();
        assert!(json.contains("\"zoom_base\": 1.3"));
        assert_eq!(DepictionConfig::from_json_str(&json).unwrap(), config);
    }

    #[test]
    fn bad_json_is_a_config_error() {
        let err = DepictionConfig::from_json_str("{\"palette\": {\"text\": 3}}").unwrap_err();
        assert!(err.to_string().starts_with("invalid depiction config"));
    }

    #[test]
    fn palette_converts_to_peniko() {
        let c = with_alpha(Rgb::new(1, 2, 3), 4).to_rgba8();
        assert_eq!((c.r, c.g, c.b, c.a), (1, 2, 3, 4));
    }
}
