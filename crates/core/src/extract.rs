//! Position-ordered text extraction.
//!
//! Each slide goes through three steps:
//! 1. flatten the shape tree into absolute coordinates,
//! 2. backfill placeholder slots the slide inherits from its layout and master,
//! 3. stable-sort by `(top, left)` and collect the non-empty texts.

use crate::error::Result;
use crate::model::{Document, Layout, Master, PlaceholderIdx, PlaceholderType, Shape, ShapeKind};
use crate::types::{ExtractedSlide, SlideText};
use std::collections::HashSet;

/// A shape projected into slide space.
#[derive(Debug, Clone, Copy)]
pub struct FlatShape<'a> {
    pub shape: &'a Shape,
    /// Absolute top, in EMU.
    pub top: i64,
    /// Absolute left, in EMU.
    pub left: i64,
}

impl<'a> FlatShape<'a> {
    /// Take a shape at its own offset, with no container offset applied.
    fn at_own_offset(shape: &'a Shape) -> Self {
        Self {
            shape,
            top: shape.top.unwrap_or(0),
            left: shape.left.unwrap_or(0),
        }
    }
}

/// Flatten a shape tree into slide-space records.
///
/// Groups are resolved recursively and never emitted themselves; their
/// offset is added to every descendant. Output is in pre-order.
pub fn flatten_shapes(shapes: &[Shape], origin_top: i64, origin_left: i64) -> Vec<FlatShape<'_>> {
    let mut records = Vec::new();
    flatten_into(shapes, origin_top, origin_left, &mut records);
    records
}

fn flatten_into<'a>(shapes: &'a [Shape], top: i64, left: i64, out: &mut Vec<FlatShape<'a>>) {
    for shape in shapes {
        let abs_top = top.saturating_add(shape.top.unwrap_or(0));
        let abs_left = left.saturating_add(shape.left.unwrap_or(0));

        match &shape.kind {
            ShapeKind::Group(children) => flatten_into(children, abs_top, abs_left, out),
            _ => out.push(FlatShape {
                shape,
                top: abs_top,
                left: abs_left,
            }),
        }
    }
}

/// Append the layout and master placeholders the slide does not supply.
///
/// Coverage is keyed by placeholder idx. Layout slots are consulted first and
/// mark their idx as covered, so a layout placeholder always wins over a
/// master placeholder with the same idx.
pub fn backfill_placeholders<'a>(
    mut records: Vec<FlatShape<'a>>,
    layout: &'a Layout,
    master: &'a Master,
) -> Vec<FlatShape<'a>> {
    let mut covered: HashSet<PlaceholderIdx> = records
        .iter()
        .filter_map(|r| r.shape.placeholder_info().map(|ph| ph.idx))
        .collect();

    for shape in &layout.placeholders {
        let Some(ph) = shape.placeholder_info() else {
            continue;
        };
        if covered.insert(ph.idx) {
            records.push(FlatShape::at_own_offset(shape));
        }
    }

    // Master slots are the last source, so their idx is not recorded.
    for shape in &master.placeholders {
        let Some(ph) = shape.placeholder_info() else {
            continue;
        };
        if !covered.contains(&ph.idx) {
            records.push(FlatShape::at_own_offset(shape));
        }
    }

    records
}

/// Sort text-capable records by position and resolve their text.
///
/// Slide number placeholders always render `slide_number`. Everything else
/// renders its trimmed text. Empty results are dropped.
pub fn slide_lines(mut records: Vec<FlatShape<'_>>, slide_number: usize) -> Vec<SlideText> {
    records.retain(|r| r.shape.has_text());
    // Vec::sort_by_key is stable; coinciding shapes keep their source order.
    records.sort_by_key(|r| (r.top, r.left));

    records
        .into_iter()
        .filter_map(|r| {
            let text = resolve_text(r.shape, slide_number);
            if text.is_empty() {
                None
            } else {
                Some(SlideText::new(text, r.top, r.left))
            }
        })
        .collect()
}

fn resolve_text(shape: &Shape, slide_number: usize) -> String {
    match shape.placeholder_info() {
        Some(ph) if ph.kind == PlaceholderType::SlideNumber => slide_number.to_string(),
        _ => shape.text.as_deref().unwrap_or_default().trim().to_string(),
    }
}

/// Extracts position-ordered text from every slide of a [`Document`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SlideTextExtractor;

impl SlideTextExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Extract all slides in order.
    ///
    /// Fails as a whole if any slide references a missing layout or master;
    /// no partial result is returned.
    pub fn extract(&self, document: &Document) -> Result<Vec<ExtractedSlide>> {
        document
            .slides
            .iter()
            .enumerate()
            .map(|(i, slide)| {
                let number = i + 1;
                let layout = document.layout(slide.layout)?;
                let master = document.master(layout.master)?;

                let records = flatten_shapes(&slide.shapes, 0, 0);
                let slide_count = records.len();
                let records = backfill_placeholders(records, layout, master);
                log::debug!(
                    "slide {}: {} own shapes, {} inherited placeholders",
                    number,
                    slide_count,
                    records.len() - slide_count
                );

                let mut extracted = ExtractedSlide::new(number);
                extracted.lines = slide_lines(records, number);
                Ok(extracted)
            })
            .collect()
    }
}
