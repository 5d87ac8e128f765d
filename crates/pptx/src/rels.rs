//! OPC relationship parts (`_rels/*.rels`) and target resolution.

use quick_xml::events::Event;
use quick_xml::Reader;
use slidetext_core::{Error, Result};

/// Relationship type suffixes used while walking the package.
pub const OFFICE_DOCUMENT: &str = "officeDocument";
pub const SLIDE: &str = "slide";
pub const SLIDE_LAYOUT: &str = "slideLayout";
pub const SLIDE_MASTER: &str = "slideMaster";

/// One `<Relationship>` entry with its target resolved to a package path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relationship {
    pub id: String,
    pub rel_type: String,
    /// Package path without a leading slash, e.g. `ppt/slides/slide1.xml`.
    pub target: String,
}

impl Relationship {
    /// Whether the relationship type URI ends in `/{kind}`.
    pub fn is_kind(&self, kind: &str) -> bool {
        self.rel_type
            .rsplit_once('/')
            .map(|(_, last)| last == kind)
            .unwrap_or(false)
    }
}

/// The relationships of a single source part.
#[derive(Debug, Clone, Default)]
pub struct Relationships {
    rels: Vec<Relationship>,
}

impl Relationships {
    /// Parse a `.rels` document belonging to `source_part`.
    ///
    /// External targets (hyperlinks and the like) are skipped.
    pub fn parse(xml: &str, source_part: &str) -> Result<Self> {
        let mut rels = Vec::new();
        let mut reader = Reader::from_str(xml);
        reader.trim_text(true);

        loop {
            match reader.read_event() {
                Ok(Event::Empty(ref e)) | Ok(Event::Start(ref e))
                    if e.name().as_ref() == b"Relationship" =>
                {
                    let mut rel_type = String::new();
                    let mut target = String::new();
                    let mut id = String::new();
                    let mut external = false;

                    for attr in e.attributes().flatten() {
                        let value = attr
                            .unescape_value()
                            .map_err(|e| Error::XmlError(format!("Bad relationship attribute: {}", e)))?;
                        match attr.key.as_ref() {
                            b"Type" => rel_type = value.to_string(),
                            b"Target" => target = value.to_string(),
                            b"Id" => id = value.to_string(),
                            b"TargetMode" => external = value == "External",
                            _ => {}
                        }
                    }

                    if external {
                        log::debug!("Skipping external relationship {} in {}", id, source_part);
                        continue;
                    }

                    rels.push(Relationship {
                        id,
                        rel_type,
                        target: resolve_target(source_part, &target),
                    });
                }
                Ok(Event::Eof) => break,
                Err(e) => {
                    return Err(Error::XmlError(format!(
                        "Error parsing relationships of '{}': {}",
                        source_part, e
                    )));
                }
                _ => {}
            }
        }

        Ok(Self { rels })
    }

    /// Look up a relationship by its `r:id`.
    pub fn get(&self, id: &str) -> Option<&Relationship> {
        self.rels.iter().find(|r| r.id == id)
    }

    /// The first relationship of the given kind.
    pub fn first_of_kind(&self, kind: &str) -> Option<&Relationship> {
        self.rels.iter().find(|r| r.is_kind(kind))
    }

    pub fn len(&self) -> usize {
        self.rels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rels.is_empty()
    }
}

/// Path of the `.rels` part for `part`; the empty string is the package root.
pub fn rels_path_for(part: &str) -> String {
    match part.rsplit_once('/') {
        Some((dir, file)) => format!("{}/_rels/{}.rels", dir, file),
        None if part.is_empty() => "_rels/.rels".to_string(),
        None => format!("_rels/{}.rels", part),
    }
}

/// Resolve a relationship target against the directory of its source part.
pub fn resolve_target(source_part: &str, target: &str) -> String {
    if let Some(absolute) = target.strip_prefix('/') {
        return absolute.to_string();
    }

    let mut segments: Vec<&str> = match source_part.rsplit_once('/') {
        Some((dir, _)) => dir.split('/').filter(|s| !s.is_empty()).collect(),
        None => Vec::new(),
    };

    for segment in target.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }

    segments.join("/")
}
