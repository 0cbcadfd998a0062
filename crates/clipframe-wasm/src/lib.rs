//! Clipframe WASM - WebAssembly bindings for Clipframe
//!
//! This crate exposes the clipframe-core editing engine to JavaScript and
//! TypeScript hosts.
//!
//! # Module Structure
//!
//! - `editor` - The clip editor: scene, clip image and editing session
//! - `types` - Conversions between JavaScript values and core types
//!
//! # Usage
//!
//! ```typescript
//! import init, { JsClipEditor } from '@clipframe/wasm';
//!
//! // Initialize WASM module (must call first)
//! await init();
//!
//! const editor = new JsClipEditor({ rotateGap: 15 });
//! editor.set_url(url);
//! editor.content_loaded(url, img.naturalWidth, img.naturalHeight);
//! editor.open();
//! ```

use wasm_bindgen::prelude::*;

mod editor;
mod types;

pub use editor::JsClipEditor;

/// Initialize the WASM module (called automatically on load)
///
/// Installs a panic hook that reports to the browser console and routes
/// `tracing` output there too. A subscriber already set by the host is kept.
#[wasm_bindgen(start)]
pub fn init() {
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::{EnvFilter, Layer};
    use tracing_web::MakeWebConsoleWriter;

    console_error_panic_hook::set_once();

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_ansi(false)
        .without_time()
        .with_writer(MakeWebConsoleWriter::new())
        .with_filter(EnvFilter::new("info"));
    if tracing_subscriber::registry().with(fmt_layer).try_init().is_err() {
        web_sys::console::warn_1(&JsValue::from_str("clipframe: tracing subscriber already set"));
    }
}

/// Get the version of the WASM module
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}
