//! Handle layout for the editing overlay.
//!
//! The overlay is laid out in the frame's own box space, `(0, 0)` to
//! `(width, height)` with the frame's world scale folded into the size. The
//! host places the whole overlay with [`HandleLayout::placement`] (world
//! position, rotation and flip of the frame), so every position below is
//! relative to the unrotated frame.
//!
//! # Elements
//!
//! - 8 resize points and 8 rotate points on the corners and edge midpoints
//! - 4 edge lines spanning each edge, for single-axis resize
//! - the rotation grip and the action-button cluster, outside one edge
//! - 4 guidelines on the thirds, shown only while moving or rotating
//!
//! Nothing here keeps state between passes except the transient opacity and
//! guideline toggles; every [`HandleLayout::update`] recomputes positions from
//! the bounds alone.

use kurbo::{Point, Rect, Size};
use serde::{Deserialize, Serialize};

use crate::config::{EditorConfig, HandleStyle};
use crate::geometry::{normalize_rotation, rotate_direction, Direction, Side};
use crate::scene::LayoutBounds;

/// Size of the hit area for rotate points.
const ROTATE_POINT_SIZE: f64 = 15.0;

/// Thickness of the hit area for edge lines.
const RESIZE_LINE_THICKNESS: f64 = 10.0;

/// What dragging a handle does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HandleKind {
    Resize,
    Rotate,
    /// Rotates and scales in the same drag.
    ResizeRotate,
    /// The frame body.
    Move,
}

impl HandleKind {
    #[inline]
    pub fn includes_resize(self) -> bool {
        matches!(self, HandleKind::Resize | HandleKind::ResizeRotate)
    }

    #[inline]
    pub fn includes_rotate(self) -> bool {
        matches!(self, HandleKind::Rotate | HandleKind::ResizeRotate)
    }
}

/// A control point: a direction plus what it does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Handle {
    pub kind: HandleKind,
    pub direction: Direction,
}

impl Handle {
    pub fn resize(direction: Direction) -> Self {
        Self {
            kind: HandleKind::Resize,
            direction,
        }
    }

    pub fn rotate(direction: Direction) -> Self {
        Self {
            kind: HandleKind::Rotate,
            direction,
        }
    }

    pub fn resize_rotate(direction: Direction) -> Self {
        Self {
            kind: HandleKind::ResizeRotate,
            direction,
        }
    }

    /// The rotation grip. It reports the top-right direction.
    pub fn grip() -> Self {
        Self::rotate(Direction::TopRight)
    }

    /// The frame body.
    pub fn body() -> Self {
        Self {
            kind: HandleKind::Move,
            direction: Direction::TopLeft,
        }
    }
}

/// Render/hit state of an overlay element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Visibility {
    #[default]
    Visible,
    /// Not painted but still receives pointer events.
    HitOnly,
    Hidden,
}

impl Visibility {
    #[inline]
    fn from_bool(visible: bool) -> Self {
        if visible {
            Visibility::Visible
        } else {
            Visibility::Hidden
        }
    }

    #[inline]
    pub fn is_hittable(self) -> bool {
        !matches!(self, Visibility::Hidden)
    }
}

/// Position and appearance of one handle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HandleState {
    pub handle: Handle,
    /// Anchor position in overlay space.
    pub position: Point,
    pub width: f64,
    pub height: f64,
    pub rotation: f64,
    /// Which point of the handle's own box sits on `position`.
    pub align: Option<Direction>,
    pub visibility: Visibility,
    pub opacity: f64,
    pub style: HandleStyle,
}

impl HandleState {
    fn new(handle: Handle, style: HandleStyle) -> Self {
        Self {
            handle,
            position: Point::ZERO,
            width: style.width,
            height: style.height,
            rotation: 0.0,
            align: None,
            visibility: Visibility::Visible,
            opacity: 1.0,
            style,
        }
    }
}

/// A thirds guideline.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Guideline {
    pub position: Point,
    pub vertical: bool,
    pub length: f64,
    pub visible: bool,
}

/// Placement of the action-button cluster.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ButtonsState {
    pub position: Point,
    pub rotation: f64,
    pub scale_x: f64,
    pub scale_y: f64,
    pub visible: bool,
}

impl Default for ButtonsState {
    fn default() -> Self {
        Self {
            position: Point::ZERO,
            rotation: 0.0,
            scale_x: 1.0,
            scale_y: 1.0,
            visible: false,
        }
    }
}

/// The host's action buttons, measured as one box.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ButtonCluster {
    pub size: Size,
    pub count: usize,
}

/// Inputs for one layout pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutInput {
    /// World placement of the frame with scale folded into the size.
    pub placement: LayoutBounds,
    pub locked: bool,
    pub buttons: ButtonCluster,
}

/// Computed overlay layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HandleLayout {
    pub visible: bool,
    pub placement: LayoutBounds,
    /// The frame rectangle in overlay space.
    pub bounds: Rect,
    pub outline_visible: bool,
    pub resize_points: [HandleState; 8],
    pub rotate_points: [HandleState; 8],
    /// Top, right, bottom, left.
    pub resize_lines: [HandleState; 4],
    pub rotate_grip: HandleState,
    pub buttons: ButtonsState,
    pub guidelines: [Guideline; 4],
}

impl HandleLayout {
    /// Create the handle set with styles from `config`. Positions are computed
    /// by the first [`HandleLayout::update`].
    pub fn new(config: &EditorConfig) -> Self {
        let resize_points = std::array::from_fn(|i| {
            let direction = Direction::from_index(i);
            let mut state = HandleState::new(Handle::resize(direction), config.resize_point_style(i));
            if !direction.is_edge() {
                state.rotation = (i / 2) as f64 * 90.0;
            }
            state
        });
        let rotate_points = std::array::from_fn(|i| {
            let direction = Direction::from_index(i);
            let mut state = HandleState::new(
                Handle::rotate(direction),
                HandleStyle::sized(ROTATE_POINT_SIZE, ROTATE_POINT_SIZE),
            );
            // Anchored by the opposite corner so the hit area sits outside the frame.
            state.align = Some(direction.opposite());
            state
        });
        let resize_lines = std::array::from_fn(|i| {
            let direction = Side::from_index(i).direction();
            HandleState::new(
                Handle::resize(direction),
                HandleStyle::sized(RESIZE_LINE_THICKNESS, RESIZE_LINE_THICKNESS),
            )
        });
        let guidelines = std::array::from_fn(|i| Guideline {
            position: Point::ZERO,
            vertical: i % 2 == 1,
            length: 0.0,
            visible: false,
        });

        Self {
            visible: false,
            placement: LayoutBounds::default(),
            bounds: Rect::ZERO,
            outline_visible: config.edit_box,
            resize_points,
            rotate_points,
            resize_lines,
            rotate_grip: HandleState::new(Handle::grip(), config.circle_style()),
            buttons: ButtonsState::default(),
            guidelines,
        }
    }

    /// Recompute every position and visibility flag from the frame placement.
    pub fn update(&mut self, config: &EditorConfig, input: &LayoutInput) {
        let placement = input.placement;
        let width = finite_or_zero(placement.width);
        let height = finite_or_zero(placement.height);
        let bounds = Rect::new(0.0, 0.0, width, height);

        self.visible = !input.locked;
        self.placement = placement;
        self.bounds = bounds;
        self.outline_visible = config.edit_box;

        let small = config.small_threshold();
        let is_small = small.is_some_and(|s| width < s && height < s);
        let show_points = config.edit_box && !is_small;
        let editable = config.resizeable.is_enabled() || config.rotateable;

        for i in 0..8 {
            let direction = Direction::from_index(i);
            let point = direction.point_on(bounds);

            let resize = &mut self.resize_points[i];
            resize.position = point;
            resize.visibility = Visibility::from_bool(show_points && editable);

            let rotate = &mut self.rotate_points[i];
            rotate.position = point;
            rotate.visibility = if show_points {
                Visibility::HitOnly
            } else {
                Visibility::Hidden
            };

            if direction.is_edge() {
                let line = &mut self.resize_lines[i / 2];
                line.position = point;
                line.visibility = Visibility::from_bool(show_points && editable);

                let resize = &mut self.resize_points[i];
                let mut visible = show_points && config.has_middle_point();
                if matches!(direction, Direction::Top | Direction::Bottom) {
                    line.width = width;
                    line.height = RESIZE_LINE_THICKNESS;
                    if small.is_some() && resize.width * 2.0 > width {
                        visible = false;
                    }
                } else {
                    line.width = RESIZE_LINE_THICKNESS;
                    line.height = height;
                    resize.rotation = 90.0;
                    if small.is_some() && resize.width * 2.0 > height {
                        visible = false;
                    }
                }
                resize.visibility = Visibility::from_bool(visible);
            }
        }

        self.rotate_grip.visibility = Visibility::from_bool(config.rotateable);
        if config.rotateable {
            self.layout_grip(config, input.buttons);
        }

        self.buttons.visible = show_points && input.buttons.count > 0;
        if self.buttons.visible {
            self.layout_buttons(config, input.buttons.size);
        }

        let thirds = [1.0 / 3.0, 1.0 / 3.0, 2.0 / 3.0, 2.0 / 3.0];
        for (i, line) in self.guidelines.iter_mut().enumerate() {
            if line.vertical {
                line.position = Point::new(width * thirds[i], 0.0);
                line.length = height;
            } else {
                line.position = Point::new(0.0, height * thirds[i]);
                line.length = width;
            }
        }
    }

    fn layout_grip(&mut self, config: &EditorConfig, buttons: ButtonCluster) {
        let side = config.circle_direction.unwrap_or(
            if buttons.count > 0 && config.buttons_direction == Side::Bottom {
                Side::Top
            } else {
                Side::Bottom
            },
        );
        let margin = config.circle_margin.unwrap_or(config.buttons_margin);
        let size = Size::new(self.rotate_grip.width, self.rotate_grip.height);
        self.rotate_grip.position = self.outside_position(side, size, margin, config.has_middle_point());
    }

    fn layout_buttons(&mut self, config: &EditorConfig, size: Size) {
        let flipped_x = self.placement.flipped_x();
        let flipped_y = self.placement.flipped_y();
        let mut index = config.buttons_direction.index();
        let mirrored_axis = if index % 2 == 1 { flipped_x } else { flipped_y };
        if mirrored_axis && config.buttons_fixed {
            index = (index + 2) % 4;
        }

        let direction = if config.buttons_fixed {
            let rotation = if self.placement.flipped_one() {
                self.placement.rotation
            } else {
                -self.placement.rotation
            };
            rotate_direction(index, rotation, 4)
        } else {
            index
        };

        self.buttons.position = self.outside_position(
            Side::from_index(direction),
            size,
            config.buttons_margin,
            config.has_middle_point(),
        );
        self.buttons.rotation = if config.buttons_fixed {
            normalize_rotation((direction as f64 - index as f64) * 90.0)
        } else {
            0.0
        };
        self.buttons.scale_x = if flipped_x { -1.0 } else { 1.0 };
        self.buttons.scale_y = if flipped_y { -1.0 } else { 1.0 };
    }

    /// Center of an item of `size` placed `margin` outside the midpoint of `side`.
    fn outside_position(&self, side: Side, size: Size, margin: f64, use_middle_point: bool) -> Point {
        let point = &self.resize_points[side.direction().index()];
        let sign = if matches!(side, Side::Top | Side::Left) { -1.0 } else { 1.0 };
        if side.is_horizontal() {
            let extent = if use_middle_point { point.width } else { 0.0 } + size.width;
            Point::new(point.position.x + (margin + extent / 2.0) * sign, point.position.y)
        } else {
            let extent = if use_middle_point { point.height } else { 0.0 } + size.height;
            Point::new(point.position.x, point.position.y + (margin + extent / 2.0) * sign)
        }
    }

    /// Set the opacity of every resize point, rotate point and edge line.
    pub fn set_opacity(&mut self, opacity: f64) {
        let opacity = opacity.clamp(0.0, 1.0);
        self.resize_points
            .iter_mut()
            .chain(self.rotate_points.iter_mut())
            .chain(self.resize_lines.iter_mut())
            .for_each(|p| p.opacity = opacity);
    }

    pub fn set_guidelines_visible(&mut self, visible: bool) {
        self.guidelines.iter_mut().for_each(|g| g.visible = visible);
    }

    /// Restore transient gesture state: full opacity, guidelines hidden.
    pub fn reset_transient(&mut self) {
        self.set_opacity(1.0);
        self.set_guidelines_visible(false);
    }

    /// Returns true if any handle is hidden by a gesture's opacity override.
    pub fn has_transparent_points(&self) -> bool {
        self.resize_points
            .iter()
            .chain(self.rotate_points.iter())
            .chain(self.resize_lines.iter())
            .any(|p| p.opacity < 1.0)
    }
}

#[inline]
fn finite_or_zero(v: f64) -> f64 {
    if v.is_finite() && v > 0.0 {
        v
    } else {
        0.0
    }
}
