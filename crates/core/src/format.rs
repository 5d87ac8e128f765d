//! Plain text output.
//!
//! Every slide becomes a block headed by `=== SLIDE n ===`, one line per
//! shape text. Blocks are separated by a blank line.

use crate::error::Result;
use crate::extract::SlideTextExtractor;
use crate::model::Document;
use crate::types::ExtractedSlide;

/// Formatter for the slide-by-slide text output.
#[derive(Debug, Clone, Copy, Default)]
pub struct SlideTextFormatter;

impl SlideTextFormatter {
    pub fn new() -> Self {
        Self
    }

    /// Render one slide block, including its header and a trailing newline.
    ///
    /// # Example output
    /// ```text
    /// === SLIDE 1 ===
    /// Intro
    /// Welcome
    /// ```
    pub fn format_slide(&self, slide: &ExtractedSlide) -> String {
        let mut block = format!("=== SLIDE {} ===\n", slide.number);
        for line in &slide.lines {
            block.push_str(&line.text);
            block.push('\n');
        }
        block
    }

    /// Render all slides, separated by one empty line.
    pub fn format(&self, slides: &[ExtractedSlide]) -> String {
        slides
            .iter()
            .map(|s| self.format_slide(s))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Extract and format a whole document in one call.
pub fn extract_text(document: &Document) -> Result<String> {
    let slides = SlideTextExtractor::new().extract(document)?;
    Ok(SlideTextFormatter::new().format(&slides))
}
