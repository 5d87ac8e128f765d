//! Read-only document model consumed by the extractor.
//!
//! A [`Document`] owns its slides plus the layouts and masters they
//! reference. Layouts and masters live in arenas and are addressed by typed
//! ids, so many slides can share one layout without reference counting.
//!
//! Positions are in EMU (English Metric Units), relative to the shape's
//! immediate container. A missing position means offset 0.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Placeholder identity key (`p:ph/@idx`).
pub type PlaceholderIdx = u32;

/// A parsed presentation: slides in presentation order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Document {
    /// Slides in presentation order.
    pub slides: Vec<Slide>,

    /// Layout arena, indexed by [`LayoutId`].
    pub layouts: Vec<Layout>,

    /// Master arena, indexed by [`MasterId`].
    pub masters: Vec<Master>,
}

impl Document {
    /// Create an empty document.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a master and return its id.
    pub fn add_master(&mut self, master: Master) -> MasterId {
        self.masters.push(master);
        MasterId(self.masters.len() - 1)
    }

    /// Add a layout and return its id.
    pub fn add_layout(&mut self, layout: Layout) -> LayoutId {
        self.layouts.push(layout);
        LayoutId(self.layouts.len() - 1)
    }

    /// Append a slide.
    pub fn add_slide(&mut self, slide: Slide) {
        self.slides.push(slide);
    }

    /// Look up a layout by id.
    pub fn layout(&self, id: LayoutId) -> Result<&Layout> {
        self.layouts.get(id.0).ok_or_else(|| {
            Error::ExtractionError(format!("slide references missing layout #{}", id.0))
        })
    }

    /// Look up a master by id.
    pub fn master(&self, id: MasterId) -> Result<&Master> {
        self.masters.get(id.0).ok_or_else(|| {
            Error::ExtractionError(format!("layout references missing master #{}", id.0))
        })
    }
}

/// Index of a [`Layout`] within [`Document::layouts`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LayoutId(pub usize);

/// Index of a [`Master`] within [`Document::masters`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MasterId(pub usize);

/// A single slide.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Slide {
    /// Top-level shapes in authored order.
    pub shapes: Vec<Shape>,

    /// The layout this slide is based on.
    pub layout: LayoutId,
}

impl Slide {
    /// Create a slide on the given layout.
    pub fn new(layout: LayoutId, shapes: Vec<Shape>) -> Self {
        Self { shapes, layout }
    }
}

/// A slide layout: placeholder slots plus the master it derives from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Layout {
    pub name: Option<String>,

    /// Placeholder shapes in authored order.
    pub placeholders: Vec<Shape>,

    pub master: MasterId,
}

impl Layout {
    pub fn new(master: MasterId, placeholders: Vec<Shape>) -> Self {
        Self {
            name: None,
            placeholders,
            master,
        }
    }
}

/// A slide master: the fallback placeholder slots.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Master {
    pub name: Option<String>,

    /// Placeholder shapes in authored order.
    pub placeholders: Vec<Shape>,
}

impl Master {
    pub fn new(placeholders: Vec<Shape>) -> Self {
        Self {
            name: None,
            placeholders,
        }
    }
}

/// A positioned visual element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shape {
    /// Authored shape name (`p:cNvPr/@name`), used for diagnostics only.
    pub name: Option<String>,

    /// Vertical offset from the container, in EMU.
    pub top: Option<i64>,

    /// Horizontal offset from the container, in EMU.
    pub left: Option<i64>,

    pub kind: ShapeKind,

    /// Text content. `None` for shapes that cannot hold text at all,
    /// `Some("")` for a text-capable shape that happens to be empty.
    pub text: Option<String>,
}

impl Shape {
    /// Create an unpositioned shape without text.
    pub fn new(kind: ShapeKind) -> Self {
        Self {
            name: None,
            top: None,
            left: None,
            kind,
            text: None,
        }
    }

    /// A plain text-holding shape.
    pub fn text_box(text: impl Into<String>) -> Self {
        Self::new(ShapeKind::Other).with_text(text)
    }

    /// A placeholder slot. Placeholders start out text-capable and empty.
    pub fn placeholder(idx: PlaceholderIdx, kind: PlaceholderType) -> Self {
        Self::new(ShapeKind::Placeholder(Placeholder { idx, kind })).with_text("")
    }

    /// A group containing `children`.
    pub fn group(children: Vec<Shape>) -> Self {
        Self::new(ShapeKind::Group(children))
    }

    /// Set the offset relative to the container.
    pub fn at(mut self, top: i64, left: i64) -> Self {
        self.top = Some(top);
        self.left = Some(left);
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Make this shape graphical only (no text attribute).
    pub fn without_text(mut self) -> Self {
        self.text = None;
        self
    }

    /// Placeholder details, if this shape is a placeholder.
    pub fn placeholder_info(&self) -> Option<&Placeholder> {
        match &self.kind {
            ShapeKind::Placeholder(ph) => Some(ph),
            _ => None,
        }
    }

    pub fn is_group(&self) -> bool {
        matches!(self.kind, ShapeKind::Group(_))
    }

    /// Whether the shape can carry text, even if that text is empty.
    pub fn has_text(&self) -> bool {
        self.text.is_some()
    }
}

/// What kind of element a [`Shape`] is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ShapeKind {
    /// A group; children are positioned relative to the group.
    Group(Vec<Shape>),
    /// An inheritable placeholder slot.
    Placeholder(Placeholder),
    /// Any other shape.
    Other,
}

/// Placeholder identity and role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Placeholder {
    /// Identity key, unique within one slide, layout or master.
    pub idx: PlaceholderIdx,
    pub kind: PlaceholderType,
}

/// Placeholder role (`p:ph/@type`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlaceholderType {
    Title,
    CenterTitle,
    Subtitle,
    Body,
    #[default]
    Object,
    Date,
    Footer,
    Header,
    SlideNumber,
    Chart,
    Table,
    ClipArt,
    Diagram,
    Media,
    Picture,
    SlideImage,
    VerticalBody,
    VerticalTitle,
    VerticalObject,
}

impl PlaceholderType {
    /// Map an OOXML `ST_PlaceholderType` token.
    ///
    /// Unknown tokens fall back to [`PlaceholderType::Object`], which is also
    /// the default when the attribute is absent.
    pub fn from_ooxml(token: &str) -> Self {
        match token {
            "title" => Self::Title,
            "ctrTitle" => Self::CenterTitle,
            "subTitle" => Self::Subtitle,
            "body" => Self::Body,
            "obj" => Self::Object,
            "dt" => Self::Date,
            "ftr" => Self::Footer,
            "hdr" => Self::Header,
            "sldNum" => Self::SlideNumber,
            "chart" => Self::Chart,
            "tbl" => Self::Table,
            "clipArt" => Self::ClipArt,
            "dgm" => Self::Diagram,
            "media" => Self::Media,
            "pic" => Self::Picture,
            "sldImg" => Self::SlideImage,
            "vertBody" => Self::VerticalBody,
            "vertTitle" => Self::VerticalTitle,
            "vertObj" => Self::VerticalObject,
            _ => Self::Object,
        }
    }

    /// The master placeholder type a layout placeholder of this type
    /// inherits its geometry from.
    pub fn base_type(self) -> Self {
        match self {
            Self::Title | Self::CenterTitle | Self::VerticalTitle => Self::Title,
            Self::Date => Self::Date,
            Self::Footer => Self::Footer,
            Self::Header => Self::Header,
            Self::SlideNumber => Self::SlideNumber,
            _ => Self::Body,
        }
    }
}
