//! Conversions between JavaScript values and core editor types.
//!
//! Handles and modifiers can arrive either as serde objects
//! (`{ kind: "resize", direction: "bottom-right" }`) or, for hot pointer paths,
//! as plain numbers and strings.

use clipframe_core::{Direction, Handle, HandleKind, Modifiers, MoveOutcome};
use wasm_bindgen::prelude::*;

/// Build a handle from a kind name and a direction index (0-7, clockwise from
/// top-left).
///
/// Returns `None` for unknown kinds or out-of-range directions.
pub(crate) fn handle_from_parts(kind: &str, direction: u8) -> Option<Handle> {
    let kind = match kind {
        "resize" => HandleKind::Resize,
        "rotate" => HandleKind::Rotate,
        "resize-rotate" => HandleKind::ResizeRotate,
        "move" => HandleKind::Move,
        _ => return None,
    };
    let direction = *Direction::ALL.get(direction as usize)?;
    Some(Handle { kind, direction })
}

/// Pack modifier flags the way pointer events report them.
pub(crate) fn modifiers_from_flags(shift: bool, alt: bool, ctrl: bool, meta: bool) -> Modifiers {
    Modifiers {
        shift,
        alt,
        ctrl,
        meta,
    }
}

/// Name of a move outcome as returned to JavaScript.
pub(crate) fn outcome_name(outcome: MoveOutcome) -> &'static str {
    match outcome {
        MoveOutcome::Moved => "moved",
        MoveOutcome::Consumed => "consumed",
        MoveOutcome::Propagate => "propagate",
    }
}

/// Read an optional serde value; `undefined` and `null` give the default.
pub(crate) fn from_js_or_default<T>(value: JsValue, what: &str) -> Result<T, JsValue>
where
    T: serde::de::DeserializeOwned + Default,
{
    if value.is_undefined() || value.is_null() {
        return Ok(T::default());
    }
    serde_wasm_bindgen::from_value(value).map_err(|e| JsValue::from_str(&format!("Invalid {}: {}", what, e)))
}

/// Serialize a value for JavaScript.
pub(crate) fn to_js<T: serde::Serialize>(value: &T) -> Result<JsValue, JsValue> {
    serde_wasm_bindgen::to_value(value).map_err(|e| JsValue::from_str(&e.to_string()))
}
