//! Types describing extracted slide text and source formats.

use serde::{Deserialize, Serialize};

/// The format of the source presentation file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PresentationFormat {
    /// Modern PPTX (Office Open XML).
    Pptx,
    /// Legacy PPT (OLE/CFB binary).
    Ppt,
}

impl PresentationFormat {
    /// Detect format from file extension.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "pptx" => Some(Self::Pptx),
            "ppt" => Some(Self::Ppt),
            _ => None,
        }
    }

    /// Detect format from file magic bytes.
    pub fn from_magic(bytes: &[u8]) -> Option<Self> {
        if bytes.len() < 4 {
            return None;
        }

        // PPTX is a ZIP file (PK\x03\x04)
        if bytes.starts_with(&[0x50, 0x4B, 0x03, 0x04]) {
            return Some(Self::Pptx);
        }

        // PPT is an OLE/CFB file (D0 CF 11 E0 A1 B1 1A E1)
        if bytes.len() >= 8
            && bytes.starts_with(&[0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1])
        {
            return Some(Self::Ppt);
        }

        None
    }

    /// Detect format from magic bytes, falling back to the filename extension.
    pub fn detect(bytes: &[u8], filename: &str) -> Option<Self> {
        Self::from_magic(bytes).or_else(|| {
            filename
                .rsplit_once('.')
                .and_then(|(_, ext)| Self::from_extension(ext))
        })
    }
}

/// The text extracted from one slide, in reading order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedSlide {
    /// 1-based slide number.
    pub number: usize,

    /// Non-empty text lines, sorted by position.
    pub lines: Vec<SlideText>,
}

impl ExtractedSlide {
    /// Create a new slide with the given number.
    pub fn new(number: usize) -> Self {
        Self {
            number,
            lines: Vec::new(),
        }
    }

    /// Add a text line with its absolute position.
    pub fn add_line(&mut self, text: impl Into<String>, top: i64, left: i64) {
        self.lines.push(SlideText::new(text, top, left));
    }

    /// Borrow the text of every line.
    pub fn texts(&self) -> Vec<&str> {
        self.lines.iter().map(|l| l.text.as_str()).collect()
    }
}

/// Text contributed by one shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlideText {
    /// Trimmed text content; may span several lines for multi-paragraph shapes.
    pub text: String,

    /// Absolute top of the source shape, in EMU.
    pub top: i64,

    /// Absolute left of the source shape, in EMU.
    pub left: i64,
}

impl SlideText {
    pub fn new(text: impl Into<String>, top: i64, left: i64) -> Self {
        Self {
            text: text.into(),
            top,
            left,
        }
    }
}
