//! Presentation document model and position-ordered slide text extraction.

pub mod error;
pub mod extract;
pub mod format;
pub mod model;
pub mod types;

pub use error::{Error, Result};
pub use extract::{FlatShape, SlideTextExtractor};
pub use format::{extract_text, SlideTextFormatter};
pub use model::{
    Document, Layout, LayoutId, Master, MasterId, Placeholder, PlaceholderIdx, PlaceholderType,
    Shape, ShapeKind, Slide,
};
pub use types::{ExtractedSlide, PresentationFormat, SlideText};
