//! Shape tree (`p:spTree`) reader.
//!
//! Only direct children of the tree and of group shapes are shapes, matching
//! how PresentationML nests them. `mc:AlternateContent` blocks are skipped
//! as a whole.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use slidetext_core::{Error, Placeholder, PlaceholderType, Result, Shape, ShapeKind};

/// Parse the first shape tree in a slide, layout or master part.
pub fn parse_shape_tree(xml: &str) -> Result<Vec<Shape>> {
    let mut reader = Reader::from_str(xml);
    // Keep whitespace: runs like `<a:t> world</a:t>` carry significant spaces.
    reader.trim_text(false);

    let mut builder = TreeBuilder::default();
    let mut depth = 0usize;

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => {
                depth += 1;
                builder.start(e, depth)?;
            }
            Ok(Event::Empty(ref e)) => {
                builder.start(e, depth + 1)?;
                let name = e.name();
                builder.end(local_name(name.as_ref()), depth + 1);
            }
            Ok(Event::Text(ref e)) => {
                if builder.wants_text() {
                    let text = e
                        .unescape()
                        .map_err(|e| Error::XmlError(format!("Bad text content: {}", e)))?;
                    builder.push_text(&text);
                }
            }
            Ok(Event::End(ref e)) => {
                let name = e.name();
                builder.end(local_name(name.as_ref()), depth);
                depth = depth.saturating_sub(1);
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(Error::XmlError(format!(
                    "Error parsing shape tree at position {}: {}",
                    reader.buffer_position(),
                    e
                )));
            }
            _ => {}
        }
    }

    Ok(builder.roots)
}

/// Which PresentationML element opened a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Element {
    /// `p:sp`, the only shape that can hold text.
    Sp,
    /// `p:grpSp`
    Group,
    /// `p:pic`, `p:graphicFrame`, `p:cxnSp`, `p:contentPart`
    Graphic,
}

impl Element {
    fn from_local_name(name: &[u8]) -> Option<Self> {
        match name {
            b"sp" => Some(Self::Sp),
            b"grpSp" => Some(Self::Group),
            b"pic" | b"graphicFrame" | b"cxnSp" | b"contentPart" => Some(Self::Graphic),
            _ => None,
        }
    }
}

/// A shape under construction.
#[derive(Debug)]
struct Frame {
    element: Element,
    depth: usize,
    name: Option<String>,
    offset: Option<(i64, i64)>,
    placeholder: Option<Placeholder>,
    text: String,
    paragraphs: usize,
    children: Vec<Shape>,
}

impl Frame {
    fn new(element: Element, depth: usize) -> Self {
        Self {
            element,
            depth,
            name: None,
            offset: None,
            placeholder: None,
            text: String::new(),
            paragraphs: 0,
            children: Vec::new(),
        }
    }

    fn into_shape(self) -> Shape {
        let kind = match (self.element, self.placeholder) {
            (Element::Group, _) => ShapeKind::Group(self.children),
            (_, Some(ph)) => ShapeKind::Placeholder(ph),
            (_, None) => ShapeKind::Other,
        };

        let mut shape = Shape::new(kind);
        shape.name = self.name;
        if let Some((top, left)) = self.offset {
            shape = shape.at(top, left);
        }
        if self.element == Element::Sp {
            shape.text = Some(self.text);
        }
        shape
    }
}

#[derive(Debug, Default)]
struct TreeBuilder {
    roots: Vec<Shape>,
    frames: Vec<Frame>,
    /// Depth of the open `p:spTree`, if any.
    tree_depth: Option<usize>,
    /// Set once the first tree has been closed.
    tree_done: bool,
    /// Depth of an `mc:AlternateContent` being skipped.
    skip_depth: Option<usize>,
    in_xfrm: bool,
    in_text_body: bool,
    in_run_text: bool,
}

impl TreeBuilder {
    /// Depth of the element whose direct children are shapes right now.
    fn container_depth(&self) -> Option<usize> {
        match self.frames.last() {
            Some(frame) if frame.element == Element::Group => Some(frame.depth),
            Some(_) => None,
            None => self.tree_depth,
        }
    }

    fn wants_text(&self) -> bool {
        self.skip_depth.is_none() && self.in_run_text
    }

    fn push_text(&mut self, text: &str) {
        if let Some(frame) = self.frames.last_mut() {
            frame.text.push_str(text);
        }
    }

    fn start(&mut self, e: &BytesStart<'_>, depth: usize) -> Result<()> {
        if self.skip_depth.is_some() || self.tree_done {
            return Ok(());
        }

        let name = e.name();
        let local = local_name(name.as_ref());

        if self.tree_depth.is_none() {
            if local == b"spTree" {
                self.tree_depth = Some(depth);
            }
            return Ok(());
        }

        if self.container_depth().map(|d| d + 1) == Some(depth) {
            if local == b"AlternateContent" {
                self.skip_depth = Some(depth);
                return Ok(());
            }
            if let Some(element) = Element::from_local_name(local) {
                self.frames.push(Frame::new(element, depth));
                return Ok(());
            }
        }

        let Some(frame) = self.frames.last_mut() else {
            return Ok(());
        };

        match local {
            b"cNvPr" if frame.name.is_none() => {
                for attr in e.attributes().flatten() {
                    if attr.key.as_ref() == b"name" {
                        frame.name = Some(String::from_utf8_lossy(&attr.value).to_string());
                    }
                }
            }
            b"ph" => {
                frame.placeholder = Some(parse_placeholder(e));
            }
            b"xfrm" => {
                self.in_xfrm = true;
            }
            b"off" if self.in_xfrm && frame.offset.is_none() => {
                frame.offset = Some(parse_offset(e)?);
            }
            b"txBody" if frame.element == Element::Sp => {
                self.in_text_body = true;
            }
            b"p" if self.in_text_body => {
                if frame.paragraphs > 0 {
                    frame.text.push('\n');
                }
                frame.paragraphs += 1;
            }
            b"br" if self.in_text_body => {
                frame.text.push('\n');
            }
            b"t" if self.in_text_body => {
                self.in_run_text = true;
            }
            _ => {}
        }

        Ok(())
    }

    fn end(&mut self, local: &[u8], depth: usize) {
        if let Some(skip) = self.skip_depth {
            if skip == depth {
                self.skip_depth = None;
            }
            return;
        }

        if self.tree_depth == Some(depth) {
            self.tree_depth = None;
            self.tree_done = true;
            return;
        }

        if self.frames.last().map(|f| f.depth) == Some(depth) {
            if let Some(frame) = self.frames.pop() {
                let shape = frame.into_shape();
                match self.frames.last_mut() {
                    Some(parent) => parent.children.push(shape),
                    None => self.roots.push(shape),
                }
            }
            self.in_xfrm = false;
            self.in_text_body = false;
            self.in_run_text = false;
            return;
        }

        match local {
            b"xfrm" => self.in_xfrm = false,
            b"txBody" => self.in_text_body = false,
            b"t" => self.in_run_text = false,
            _ => {}
        }
    }
}

/// Read `idx` and `type` from a `p:ph` element.
fn parse_placeholder(e: &BytesStart<'_>) -> Placeholder {
    let mut placeholder = Placeholder {
        idx: 0,
        kind: PlaceholderType::default(),
    };

    for attr in e.attributes().flatten() {
        let value = String::from_utf8_lossy(&attr.value);
        match attr.key.as_ref() {
            b"idx" => match value.parse() {
                Ok(idx) => placeholder.idx = idx,
                Err(_) => log::warn!("Ignoring non-numeric placeholder idx '{}'", value),
            },
            b"type" => placeholder.kind = PlaceholderType::from_ooxml(&value),
            _ => {}
        }
    }

    placeholder
}

/// Largest magnitude allowed for an `ST_Coordinate` value, in EMU.
const MAX_COORDINATE: i64 = 27_273_042_329_600;

/// Read `(top, left)` from an `a:off` element.
fn parse_offset(e: &BytesStart<'_>) -> Result<(i64, i64)> {
    let mut x = 0i64;
    let mut y = 0i64;

    for attr in e.attributes().flatten() {
        let value = String::from_utf8_lossy(&attr.value);
        let parsed = || {
            value
                .parse::<i64>()
                .ok()
                .filter(|v| (-MAX_COORDINATE..=MAX_COORDINATE).contains(v))
                .ok_or_else(|| Error::XmlError(format!("Invalid coordinate '{}'", value)))
        };
        match attr.key.as_ref() {
            b"x" => x = parsed()?,
            b"y" => y = parsed()?,
            _ => {}
        }
    }

    Ok((y, x))
}

/// Extract the local name from a potentially namespaced XML element name.
pub(crate) fn local_name(name: &[u8]) -> &[u8] {
    if let Some(pos) = name.iter().position(|&b| b == b':') {
        &name[pos + 1..]
    } else {
        name
    }
}
