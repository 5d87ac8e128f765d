//! WASM-compatible wrapper for slide text extraction.
//!
//! This crate exposes the text extraction functionality to JavaScript
//! for use in Cloudflare Workers.

use serde::{Deserialize, Serialize};
use slidetext_core::ExtractedSlide;
use wasm_bindgen::prelude::*;

#[wasm_bindgen(start)]
pub fn init() {
    // Set up better panic messages in the console
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

/// Response for a text conversion request.
///
/// Serializes to `{success, text, filename}` or `{error}`.
#[derive(Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConversionResponse {
    Success {
        success: bool,
        text: String,
        filename: String,
    },
    Failure {
        error: String,
    },
}

/// Extract position-ordered text from a presentation.
///
/// # Arguments
/// * `data` - The raw bytes of the .pptx file
/// * `filename` - The uploaded filename, echoed back and used for format detection
///
/// # Returns
/// A JavaScript object: `{success: true, text, filename}` on success or
/// `{error}` when the file cannot be processed.
#[wasm_bindgen]
pub fn extract_text(data: &[u8], filename: &str) -> Result<JsValue, JsValue> {
    let response = extract_text_impl(data, filename);

    serde_wasm_bindgen::to_value(&response)
        .map_err(|e| js_error(&format!("Serialization error: {}", e)))
}

fn extract_text_impl(data: &[u8], filename: &str) -> ConversionResponse {
    match slidetext_pptx::extract_text_from_bytes(data, filename) {
        Ok(text) => ConversionResponse::Success {
            success: true,
            text,
            filename: filename.to_string(),
        },
        Err(e) => ConversionResponse::Failure {
            error: e.to_string(),
        },
    }
}

/// Extract per-slide lines with their absolute positions.
///
/// # Returns
/// An array of `{number, lines: [{text, top, left}]}`, or throws on error.
#[wasm_bindgen]
pub fn extract_slides(data: &[u8]) -> Result<JsValue, JsValue> {
    let slides = extract_slides_impl(data).map_err(|e| js_error(&e))?;

    serde_wasm_bindgen::to_value(&slides)
        .map_err(|e| js_error(&format!("Serialization error: {}", e)))
}

fn extract_slides_impl(data: &[u8]) -> Result<Vec<ExtractedSlide>, String> {
    slidetext_pptx::extract_slides_from_bytes(data, "").map_err(|e| e.to_string())
}

fn js_error(message: &str) -> JsValue {
    js_sys::Error::new(message).into()
}


#[cfg(all(test, target_arch = "wasm32"))]
mod wasm_tests {
    use super::*;
    use wasm_bindgen_test::*;

    #[wasm_bindgen_test]
    fn test_extract_text_failure_does_not_throw() {
        let value = extract_text(b"not a presentation", "deck.pptx").unwrap();
        let error = js_sys::Reflect::get(&value, &JsValue::from_str("error")).unwrap();
        let message = error.as_string().unwrap();
        assert!(message.starts_with("Error processing PowerPoint file:"));
        assert!(js_sys::Reflect::get(&value, &JsValue::from_str("success"))
            .unwrap()
            .is_undefined());
    }

    #[wasm_bindgen_test]
    fn test_extract_slides_throws_js_error() {
        let err = extract_slides(b"\x00\x01\x02").unwrap_err();
        assert!(err.is_instance_of::<js_sys::Error>());
    }
}
