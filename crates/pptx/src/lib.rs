//! PPTX (Office Open XML) backend for slide text extraction.
//!
//! Parses .pptx files, which are ZIP archives containing XML documents, into
//! the [`slidetext_core::Document`] model.

#[cfg(test)]
mod fixtures;
pub mod parser;
pub mod rels;
pub mod shapes;

pub use parser::PptxParser;

use slidetext_core::{
    Error, ExtractedSlide, PresentationFormat, Result, SlideTextExtractor, SlideTextFormatter,
};
use std::io::{Cursor, Read, Seek};

/// Parse a presentation and extract every slide's ordered text.
///
/// Any failure, including a parse failure, comes back as a single
/// [`Error::ExtractionError`].
pub fn extract_slides_from_reader<R: Read + Seek>(reader: R) -> Result<Vec<ExtractedSlide>> {
    let document = PptxParser::new()
        .parse(reader)
        .map_err(Error::into_extraction)?;
    SlideTextExtractor::new()
        .extract(&document)
        .map_err(Error::into_extraction)
}

/// Parse a presentation and render its text, one block per slide.
pub fn extract_text_from_reader<R: Read + Seek>(reader: R) -> Result<String> {
    let slides = extract_slides_from_reader(reader)?;
    Ok(SlideTextFormatter::new().format(&slides))
}

/// Extract text from an in-memory file.
///
/// Legacy binary .ppt files are recognized and rejected; anything else is
/// handed to the PPTX parser, which reports what is wrong with it.
pub fn extract_text_from_bytes(data: &[u8], filename: &str) -> Result<String> {
    check_format(data, filename)?;
    extract_text_from_reader(Cursor::new(data))
}

/// Like [`extract_text_from_bytes`], but keeps the per-slide structure.
pub fn extract_slides_from_bytes(data: &[u8], filename: &str) -> Result<Vec<ExtractedSlide>> {
    check_format(data, filename)?;
    extract_slides_from_reader(Cursor::new(data))
}

fn check_format(data: &[u8], filename: &str) -> Result<()> {
    if PresentationFormat::detect(data, filename) == Some(PresentationFormat::Ppt) {
        return Err(Error::UnsupportedFormat(
            "legacy .ppt files are not supported; convert to .pptx first".to_string(),
        )
        .into_extraction());
    }
    Ok(())
}
