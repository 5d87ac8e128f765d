//! PPTX package parser: ZIP archive → [`Document`].

use crate::rels::{self, rels_path_for, Relationships};
use crate::shapes::{local_name, parse_shape_tree};
use quick_xml::events::Event;
use quick_xml::Reader;
use slidetext_core::{
    Document, Error, Layout, LayoutId, Master, MasterId, Result, Shape, ShapeKind, Slide,
};
use std::collections::HashMap;
use std::io::{Read, Seek};
use zip::result::ZipError;
use zip::ZipArchive;

/// Fallback location of the main presentation part.
const DEFAULT_PRESENTATION_PART: &str = "ppt/presentation.xml";

/// Parser for PPTX (Office Open XML) files.
pub struct PptxParser;

impl PptxParser {
    /// Create a new PPTX parser.
    pub fn new() -> Self {
        Self
    }

    /// Parse a PPTX file from a reader.
    pub fn parse<R: Read + Seek>(&self, reader: R) -> Result<Document> {
        let archive = ZipArchive::new(reader)
            .map_err(|e| Error::ZipError(format!("Failed to open ZIP: {}", e)))?;

        let mut package = Package::new(archive);
        let presentation_part = package.presentation_part()?;
        let slide_parts = package.slide_order(&presentation_part)?;
        log::debug!("{} slides listed in {}", slide_parts.len(), presentation_part);

        for slide_part in &slide_parts {
            package.load_slide(slide_part)?;
        }

        Ok(package.document)
    }
}

impl Default for PptxParser {
    fn default() -> Self {
        Self::new()
    }
}

/// Archive plus the document being assembled from it.
struct Package<R> {
    archive: ZipArchive<R>,
    document: Document,
    layouts: HashMap<String, LayoutId>,
    masters: HashMap<String, MasterId>,
}

impl<R: Read + Seek> Package<R> {
    fn new(archive: ZipArchive<R>) -> Self {
        Self {
            archive,
            document: Document::new(),
            layouts: HashMap::new(),
            masters: HashMap::new(),
        }
    }

    /// Locate the main part through the package relationships.
    fn presentation_part(&mut self) -> Result<String> {
        let rels = self.relationships("")?;
        match rels.first_of_kind(rels::OFFICE_DOCUMENT) {
            Some(rel) => Ok(rel.target.clone()),
            None => {
                log::warn!(
                    "No officeDocument relationship; assuming {}",
                    DEFAULT_PRESENTATION_PART
                );
                Ok(DEFAULT_PRESENTATION_PART.to_string())
            }
        }
    }

    /// Slide part paths in presentation order (`p:sldIdLst`).
    fn slide_order(&mut self, presentation_part: &str) -> Result<Vec<String>> {
        let xml = self.read_part(presentation_part)?;
        let rels = self.relationships(presentation_part)?;

        slide_rel_ids(&xml)?
            .into_iter()
            .map(|id| match rels.get(&id) {
                Some(rel) if rel.is_kind(rels::SLIDE) => Ok(rel.target.clone()),
                _ => Err(Error::ParseError(format!(
                    "Slide relationship '{}' not found in {}",
                    id, presentation_part
                ))),
            })
            .collect()
    }

    fn load_slide(&mut self, slide_part: &str) -> Result<()> {
        let xml = self.read_part(slide_part)?;
        let mut shapes = parse_shape_tree(&xml)?;

        let rels = self.relationships(slide_part)?;
        let layout_part = rels
            .first_of_kind(rels::SLIDE_LAYOUT)
            .map(|r| r.target.clone())
            .ok_or_else(|| {
                Error::ParseError(format!("Slide '{}' has no slide layout", slide_part))
            })?;

        let layout_id = self.load_layout(&layout_part)?;
        inherit_slide_positions(&mut shapes, self.document.layout(layout_id)?);

        log::debug!("Parsed {} ({} top-level shapes)", slide_part, shapes.len());
        self.document.add_slide(Slide::new(layout_id, shapes));
        Ok(())
    }

    fn load_layout(&mut self, layout_part: &str) -> Result<LayoutId> {
        if let Some(id) = self.layouts.get(layout_part) {
            return Ok(*id);
        }

        let xml = self.read_part(layout_part)?;
        let mut placeholders = top_level_placeholders(parse_shape_tree(&xml)?);

        let rels = self.relationships(layout_part)?;
        let master_part = rels
            .first_of_kind(rels::SLIDE_MASTER)
            .map(|r| r.target.clone())
            .ok_or_else(|| {
                Error::ParseError(format!("Layout '{}' has no slide master", layout_part))
            })?;

        let master_id = self.load_master(&master_part)?;
        inherit_layout_positions(&mut placeholders, self.document.master(master_id)?);

        log::debug!("Parsed {} ({} placeholders)", layout_part, placeholders.len());
        let mut layout = Layout::new(master_id, placeholders);
        layout.name = common_slide_name(&xml)?;

        let id = self.document.add_layout(layout);
        self.layouts.insert(layout_part.to_string(), id);
        Ok(id)
    }

    fn load_master(&mut self, master_part: &str) -> Result<MasterId> {
        if let Some(id) = self.masters.get(master_part) {
            return Ok(*id);
        }

        let xml = self.read_part(master_part)?;
        let mut master = Master::new(top_level_placeholders(parse_shape_tree(&xml)?));
        master.name = common_slide_name(&xml)?;
        log::debug!("Parsed {} ({} placeholders)", master_part, master.placeholders.len());

        let id = self.document.add_master(master);
        self.masters.insert(master_part.to_string(), id);
        Ok(id)
    }

    /// Relationships of `part`; a part without a `.rels` file has none.
    fn relationships(&mut self, part: &str) -> Result<Relationships> {
        let path = rels_path_for(part);
        match self.read_optional_part(&path)? {
            Some(xml) => Relationships::parse(&xml, part),
            None => Ok(Relationships::default()),
        }
    }

    /// Read a file from the ZIP archive.
    fn read_part(&mut self, path: &str) -> Result<String> {
        self.read_optional_part(path)?
            .ok_or_else(|| Error::ParseError(format!("Missing part '{}'", path)))
    }

    fn read_optional_part(&mut self, path: &str) -> Result<Option<String>> {
        let mut file = match self.archive.by_name(path) {
            Ok(file) => file,
            Err(ZipError::FileNotFound) => return Ok(None),
            Err(e) => {
                return Err(Error::ZipError(format!(
                    "Failed to open '{}' in archive: {}",
                    path, e
                )))
            }
        };

        let mut content = String::new();
        file.read_to_string(&mut content)
            .map_err(|e| Error::ZipError(format!("Failed to read '{}': {}", path, e)))?;

        Ok(Some(content))
    }
}

/// The `r:id` of every `p:sldId`, in document order.
fn slide_rel_ids(xml: &str) -> Result<Vec<String>> {
    let mut ids = Vec::new();
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    loop {
        match reader.read_event() {
            Ok(Event::Empty(ref e)) | Ok(Event::Start(ref e))
                if local_name(e.name().as_ref()) == b"sldId" =>
            {
                // The numeric `id` attribute is unqualified; the relationship id is `r:id`.
                let rid = e
                    .attributes()
                    .flatten()
                    .find(|a| a.key.prefix().is_some() && a.key.local_name().as_ref() == b"id")
                    .map(|a| String::from_utf8_lossy(&a.value).to_string());

                match rid {
                    Some(rid) => ids.push(rid),
                    None => log::warn!("Skipping sldId without a relationship id"),
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(Error::XmlError(format!(
                    "Error parsing presentation part: {}",
                    e
                )));
            }
            _ => {}
        }
    }

    Ok(ids)
}

/// `p:cSld/@name` of a slide, layout or master part.
fn common_slide_name(xml: &str) -> Result<Option<String>> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    loop {
        match reader.read_event() {
            Ok(Event::Empty(ref e)) | Ok(Event::Start(ref e))
                if local_name(e.name().as_ref()) == b"cSld" =>
            {
                let name = e
                    .attributes()
                    .flatten()
                    .find(|a| a.key.as_ref() == b"name")
                    .map(|a| String::from_utf8_lossy(&a.value).to_string())
                    .filter(|n| !n.is_empty());
                return Ok(name);
            }
            Ok(Event::Eof) => return Ok(None),
            Err(e) => return Err(Error::XmlError(format!("Error reading cSld: {}", e))),
            _ => {}
        }
    }
}

/// Keep only the top-level placeholder shapes of a layout or master.
fn top_level_placeholders(shapes: Vec<Shape>) -> Vec<Shape> {
    shapes
        .into_iter()
        .filter(|s| matches!(s.kind, ShapeKind::Placeholder(_)))
        .collect()
}

/// Give slide placeholders without geometry the position of the layout
/// placeholder with the same idx.
fn inherit_slide_positions(shapes: &mut [Shape], layout: &Layout) {
    for shape in shapes.iter_mut() {
        let Some(idx) = shape.placeholder_info().map(|ph| ph.idx) else {
            continue;
        };
        let base = layout
            .placeholders
            .iter()
            .find(|p| p.placeholder_info().map(|ph| ph.idx) == Some(idx));
        fill_missing_position(shape, base);
    }
}

/// Give layout placeholders without geometry the position of the master
/// placeholder of the matching base type.
fn inherit_layout_positions(placeholders: &mut [Shape], master: &Master) {
    for shape in placeholders.iter_mut() {
        let Some(kind) = shape.placeholder_info().map(|ph| ph.kind.base_type()) else {
            continue;
        };
        let base = master
            .placeholders
            .iter()
            .find(|p| p.placeholder_info().map(|ph| ph.kind) == Some(kind));
        fill_missing_position(shape, base);
    }
}

fn fill_missing_position(shape: &mut Shape, base: Option<&Shape>) {
    let Some(base) = base else {
        return;
    };
    if shape.top.is_none() {
        shape.top = base.top;
    }
    if shape.left.is_none() {
        shape.left = base.left;
    }
}
