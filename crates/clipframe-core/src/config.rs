//! Editor configuration.
//!
//! [`EditorConfig`] is resolved once when a session opens and read-only after
//! that. It deserializes from the camelCase option objects hosts already use,
//! with every field optional.

use serde::{Deserialize, Serialize};

use crate::geometry::Side;

/// Default edge length of a handle when no usable style size is given.
pub const DEFAULT_POINT_SIZE: f64 = 10.0;

/// Default threshold below which handles hide on small frames.
pub const DEFAULT_SMALL_SIZE: f64 = 10.0;

/// Visual style of a handle. Only `width`/`height` affect layout; the rest is
/// passed through to the renderer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct HandleStyle {
    pub width: f64,
    pub height: f64,
    pub corner_radius: f64,
    pub fill: Option<String>,
    pub stroke: Option<String>,
    pub stroke_width: Option<f64>,
}

impl Default for HandleStyle {
    fn default() -> Self {
        Self {
            width: DEFAULT_POINT_SIZE,
            height: DEFAULT_POINT_SIZE,
            corner_radius: 0.0,
            fill: None,
            stroke: None,
            stroke_width: None,
        }
    }
}

impl HandleStyle {
    pub fn sized(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            ..Self::default()
        }
    }

    /// The style with unusable sizes (zero, negative, non-finite) replaced by
    /// the default point size.
    pub fn sanitized(&self) -> Self {
        let fix = |v: f64| if v > 0.0 && v.is_finite() { v } else { DEFAULT_POINT_SIZE };
        Self {
            width: fix(self.width),
            height: fix(self.height),
            ..self.clone()
        }
    }
}

/// When resizing keeps the aspect ratio.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LockRatio {
    #[default]
    Off,
    /// Only corner handles keep the ratio; edge handles resize one axis freely.
    Corner,
    Always,
}

impl LockRatio {
    /// Whether the ratio is locked for a handle.
    pub fn applies_to(self, is_edge: bool) -> bool {
        match self {
            LockRatio::Off => false,
            LockRatio::Corner => !is_edge,
            LockRatio::Always => true,
        }
    }
}

/// Whether a resize changes the box size or the scale factors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EditSize {
    /// Width/height change, scale stays; children keep their absolute size.
    #[default]
    Size,
    /// Scale factors change, width/height stay.
    Scale,
}

/// How the frame body reacts to moves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Moveable {
    /// Dragging the body moves the content; other moves propagate.
    #[default]
    Drag,
    /// Programmatic moves (arrow keys, API) also move the content.
    Move,
    /// Moves are ignored.
    Off,
}

/// Whether resize handles resize.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Resizeable {
    #[default]
    Resize,
    /// Resize handles work and programmatic moves are swallowed as zoom input.
    Zoom,
    /// Resize handles rotate instead.
    Off,
}

impl Resizeable {
    #[inline]
    pub fn is_enabled(self) -> bool {
        !matches!(self, Resizeable::Off)
    }
}

/// Full editor configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EditorConfig {
    /// Outline stroke color of the frame rectangle.
    pub stroke: String,
    pub stroke_width: f64,
    /// Corner handle styles, cycled around the four corners.
    pub point: Vec<HandleStyle>,
    /// Edge handle styles; `None` hides the edge handles.
    pub middle_point: Option<Vec<HandleStyle>>,
    /// Rotation grip style; falls back to the first corner style.
    pub circle: Option<HandleStyle>,
    /// Snap increment in degrees; 0 disables snapping.
    pub rotate_gap: f64,
    pub lock_ratio: LockRatio,
    pub edit_size: EditSize,
    pub moveable: Moveable,
    pub resizeable: Resizeable,
    pub rotateable: bool,
    pub flipable: bool,
    /// Resize about the frame center instead of the opposite anchor.
    pub around_center: bool,
    /// Show the frame outline and handles.
    pub edit_box: bool,
    pub hide_on_small: bool,
    pub small_size: f64,
    pub circle_direction: Option<Side>,
    pub circle_margin: Option<f64>,
    pub buttons_direction: Side,
    pub buttons_margin: f64,
    /// Keep the button cluster upright regardless of frame rotation.
    pub buttons_fixed: bool,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            stroke: "#4D7CFF".to_string(),
            stroke_width: 1.0,
            point: vec![HandleStyle::default()],
            middle_point: None,
            circle: None,
            rotate_gap: 0.0,
            lock_ratio: LockRatio::Off,
            edit_size: EditSize::Size,
            moveable: Moveable::Drag,
            resizeable: Resizeable::Resize,
            rotateable: true,
            flipable: true,
            around_center: false,
            edit_box: true,
            hide_on_small: true,
            small_size: DEFAULT_SMALL_SIZE,
            circle_direction: None,
            circle_margin: None,
            buttons_direction: Side::Bottom,
            buttons_margin: 12.0,
            buttons_fixed: false,
        }
    }
}

impl EditorConfig {
    /// Corner handle styles, never empty, with sizes sanitized.
    pub fn point_styles(&self) -> Vec<HandleStyle> {
        if self.point.is_empty() {
            return vec![HandleStyle::default()];
        }
        self.point.iter().map(HandleStyle::sanitized).collect()
    }

    /// Edge handle styles, falling back to the corner styles.
    pub fn middle_point_styles(&self) -> Vec<HandleStyle> {
        match &self.middle_point {
            Some(styles) if !styles.is_empty() => styles.iter().map(HandleStyle::sanitized).collect(),
            _ => self.point_styles(),
        }
    }

    /// Style for the resize handle at `index` (0-7).
    pub fn resize_point_style(&self, index: usize) -> HandleStyle {
        if index % 2 == 1 {
            let styles = self.middle_point_styles();
            styles[((index - 1) / 2) % styles.len()].clone()
        } else {
            let styles = self.point_styles();
            styles[(index / 2) % styles.len()].clone()
        }
    }

    pub fn circle_style(&self) -> HandleStyle {
        match &self.circle {
            Some(style) => style.sanitized(),
            None => self.point_styles()[0].clone(),
        }
    }

    pub fn has_middle_point(&self) -> bool {
        self.middle_point.is_some()
    }

    /// Hide threshold, or `None` when hiding on small frames is off.
    pub fn small_threshold(&self) -> Option<f64> {
        if !self.hide_on_small {
            return None;
        }
        if self.small_size > 0.0 && self.small_size.is_finite() {
            Some(self.small_size)
        } else {
            Some(DEFAULT_SMALL_SIZE)
        }
    }

    /// Rotation gap with unusable values treated as "no snapping".
    pub fn effective_rotate_gap(&self) -> f64 {
        if self.rotate_gap > 0.0 && self.rotate_gap.is_finite() {
            self.rotate_gap
        } else {
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = EditorConfig::default();
        assert_eq!(config.rotate_gap, 0.0);
        assert_eq!(config.lock_ratio, LockRatio::Off);
        assert_eq!(config.edit_size, EditSize::Size);
        assert!(config.flipable);
        assert_eq!(config.small_threshold(), Some(10.0));
    }

    #[test]
    fn test_lock_ratio_applies_to() {
        assert!(!LockRatio::Off.applies_to(false));
        assert!(LockRatio::Corner.applies_to(false));
        assert!(!LockRatio::Corner.applies_to(true));
        assert!(LockRatio::Always.applies_to(true));
    }

    #[test]
    fn test_sanitized_style() {
        let style = HandleStyle::sized(0.0, -4.0).sanitized();
        assert_eq!(style.width, DEFAULT_POINT_SIZE);
        assert_eq!(style.height, DEFAULT_POINT_SIZE);
        let style = HandleStyle::sized(16.0, f64::NAN).sanitized();
        assert_eq!(style.width, 16.0);
        assert_eq!(style.height, DEFAULT_POINT_SIZE);
    }

    #[test]
    fn test_style_cycling() {
        let mut config = EditorConfig::default();
        config.point = vec![HandleStyle::sized(10.0, 10.0), HandleStyle::sized(12.0, 12.0)];
        config.middle_point = Some(vec![HandleStyle::sized(16.0, 8.0)]);

        assert_eq!(config.resize_point_style(0).width, 10.0);
        assert_eq!(config.resize_point_style(2).width, 12.0);
        assert_eq!(config.resize_point_style(4).width, 10.0);
        assert_eq!(config.resize_point_style(6).width, 12.0);
        for i in [1, 3, 5, 7] {
            assert_eq!(config.resize_point_style(i).width, 16.0);
        }
    }

    #[test]
    fn test_middle_falls_back_to_points() {
        let mut config = EditorConfig::default();
        config.point = vec![HandleStyle::sized(9.0, 9.0)];
        assert!(!config.has_middle_point());
        assert_eq!(config.resize_point_style(3).width, 9.0);

        config.point.clear();
        assert_eq!(config.resize_point_style(0).width, DEFAULT_POINT_SIZE);
    }

    #[test]
    fn test_small_threshold() {
        let mut config = EditorConfig::default();
        config.small_size = 0.0;
        assert_eq!(config.small_threshold(), Some(DEFAULT_SMALL_SIZE));
        config.small_size = 24.0;
        assert_eq!(config.small_threshold(), Some(24.0));
        config.hide_on_small = false;
        assert_eq!(config.small_threshold(), None);
    }

    #[test]
    fn test_effective_rotate_gap() {
        let mut config = EditorConfig::default();
        config.rotate_gap = 45.0;
        assert_eq!(config.effective_rotate_gap(), 45.0);
        config.rotate_gap = -5.0;
        assert_eq!(config.effective_rotate_gap(), 0.0);
        config.rotate_gap = f64::INFINITY;
        assert_eq!(config.effective_rotate_gap(), 0.0);
    }
}
