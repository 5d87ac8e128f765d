//! In-memory PPTX packages for tests.

use std::io::{Cursor, Write};
use zip::write::FileOptions;
use zip::ZipWriter;

const NS: &str = r#"xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main" xmlns:mc="http://schemas.openxmlformats.org/markup-compatibility/2006""#;

const REL_BASE: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";

/// Placeholder attributes for [`sp`].
#[derive(Debug, Clone, Copy)]
pub struct Ph {
    kind: Option<&'static str>,
    idx: Option<u32>,
}

impl Ph {
    pub fn new(kind: Option<&'static str>, idx: Option<u32>) -> Self {
        Self { kind, idx }
    }
}

/// A `p:sp`. `off` is `(x, y)`, i.e. `(left, top)`.
pub fn sp(name: &str, ph: Option<Ph>, off: Option<(i64, i64)>, paragraphs: &[&str]) -> String {
    let nv_pr = match ph {
        Some(ph) => {
            let mut attrs = String::new();
            if let Some(kind) = ph.kind {
                attrs.push_str(&format!(r#" type="{}""#, kind));
            }
            if let Some(idx) = ph.idx {
                attrs.push_str(&format!(r#" idx="{}""#, idx));
            }
            format!("<p:nvPr><p:ph{}/></p:nvPr>", attrs)
        }
        None => "<p:nvPr/>".to_string(),
    };
    let sp_pr = match off {
        Some((x, y)) => format!(
            r#"<p:spPr><a:xfrm><a:off x="{}" y="{}"/><a:ext cx="100" cy="100"/></a:xfrm></p:spPr>"#,
            x, y
        ),
        None => "<p:spPr/>".to_string(),
    };
    let body: String = paragraphs
        .iter()
        .map(|p| format!("<a:p><a:r><a:rPr lang=\"en-US\"/><a:t>{}</a:t></a:r></a:p>", p))
        .collect();

    format!(
        r#"<p:sp><p:nvSpPr><p:cNvPr id="2" name="{}"/><p:cNvSpPr/>{}</p:nvSpPr>{}<p:txBody><a:bodyPr/><a:lstStyle/>{}</p:txBody></p:sp>"#,
        name, nv_pr, sp_pr, body
    )
}

/// A `p:pic` at `(x, y)`.
pub fn pic(name: &str, off: (i64, i64)) -> String {
    format!(
        r#"<p:pic><p:nvPicPr><p:cNvPr id="3" name="{}"/><p:cNvPicPr/><p:nvPr/></p:nvPicPr><p:blipFill><a:blip r:embed="rId9"/></p:blipFill><p:spPr><a:xfrm><a:off x="{}" y="{}"/><a:ext cx="10" cy="10"/></a:xfrm></p:spPr></p:pic>"#,
        name, off.0, off.1
    )
}

/// A `p:grpSp` at `(x, y)`.
pub fn group(off: (i64, i64), children: &[String]) -> String {
    format!(
        r#"<p:grpSp><p:nvGrpSpPr><p:cNvPr id="5" name="Group"/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr><p:grpSpPr><a:xfrm><a:off x="{}" y="{}"/><a:ext cx="1" cy="1"/><a:chOff x="0" y="0"/><a:chExt cx="1" cy="1"/></a:xfrm></p:grpSpPr>{}</p:grpSp>"#,
        off.0,
        off.1,
        children.concat()
    )
}

fn sp_tree(shapes: &[String]) -> String {
    format!(
        r#"<p:cSld><p:spTree><p:nvGrpSpPr><p:cNvPr id="1" name=""/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr><p:grpSpPr><a:xfrm><a:off x="0" y="0"/><a:ext cx="0" cy="0"/><a:chOff x="0" y="0"/><a:chExt cx="0" cy="0"/></a:xfrm></p:grpSpPr>{}</p:spTree></p:cSld>"#,
        shapes.concat()
    )
}

/// A complete slide part.
pub fn slide_xml(shapes: &[String]) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><p:sld {}>{}<p:clrMapOvr><a:masterClrMapping/></p:clrMapOvr></p:sld>"#,
        NS,
        sp_tree(shapes)
    )
}

fn layout_xml(name: &str, shapes: &[String]) -> String {
    let tree = sp_tree(shapes).replacen("<p:cSld>", &format!(r#"<p:cSld name="{}">"#, name), 1);
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><p:sldLayout {} preserve="1">{}</p:sldLayout>"#,
        NS, tree
    )
}

fn master_xml(shapes: &[String]) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><p:sldMaster {}>{}<p:sldLayoutIdLst><p:sldLayoutId id="2147483649" r:id="rId1"/></p:sldLayoutIdLst></p:sldMaster>"#,
        NS,
        sp_tree(shapes)
    )
}

fn rels_xml(rels: &[(&str, &str, &str)]) -> String {
    let body: String = rels
        .iter()
        .map(|(id, kind, target)| {
            format!(
                r#"<Relationship Id="{}" Type="{}/{}" Target="{}"/>"#,
                id, REL_BASE, kind, target
            )
        })
        .collect();
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">{}</Relationships>"#,
        body
    )
}

/// Builder for a one-master presentation package.
///
/// Layouts are numbered from 1 in the order they are added; slides pick
/// their layout by that number. Slide order in `presentation.xml` follows
/// the order slides are added, independent of their part names.
#[derive(Debug, Default)]
pub struct DeckBuilder {
    master: Vec<String>,
    layouts: Vec<Vec<String>>,
    /// `(part number, layout number, shapes)`
    slides: Vec<(usize, usize, Vec<String>)>,
}

impl DeckBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn master(mut self, shapes: Vec<String>) -> Self {
        self.master = shapes;
        self
    }

    pub fn layout(mut self, shapes: Vec<String>) -> Self {
        self.layouts.push(shapes);
        self
    }

    /// Add a slide stored as `ppt/slides/slide{part}.xml`.
    pub fn slide(mut self, part: usize, layout: usize, shapes: Vec<String>) -> Self {
        self.slides.push((part, layout, shapes));
        self
    }

    pub fn build(self) -> Vec<u8> {
        let mut files: Vec<(String, String)> = Vec::new();

        files.push((
            "_rels/.rels".into(),
            rels_xml(&[("rId1", "officeDocument", "ppt/presentation.xml")]),
        ));

        let mut pres_rels = vec![(
            "rId1".to_string(),
            "slideMaster",
            "slideMasters/slideMaster1.xml".to_string(),
        )];
        let mut sld_ids = String::new();
        for (n, (part, _, _)) in self.slides.iter().enumerate() {
            let rid = format!("rId{}", n + 10);
            sld_ids.push_str(&format!(r#"<p:sldId id="{}" r:id="{}"/>"#, 256 + n, rid));
            pres_rels.push((rid, "slide", format!("slides/slide{}.xml", part)));
        }
        files.push((
            "ppt/presentation.xml".into(),
            format!(
                r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><p:presentation {}><p:sldMasterIdLst><p:sldMasterId id="2147483648" r:id="rId1"/></p:sldMasterIdLst><p:sldIdLst>{}</p:sldIdLst><p:sldSz cx="9144000" cy="6858000"/></p:presentation>"#,
                NS, sld_ids
            ),
        ));
        let pres_rels: Vec<(&str, &str, &str)> = pres_rels
            .iter()
            .map(|(id, kind, target)| (id.as_str(), *kind, target.as_str()))
            .collect();
        files.push(("ppt/_rels/presentation.xml.rels".into(), rels_xml(&pres_rels)));

        files.push(("ppt/slideMasters/slideMaster1.xml".into(), master_xml(&self.master)));
        files.push((
            "ppt/slideMasters/_rels/slideMaster1.xml.rels".into(),
            rels_xml(&[("rId1", "slideLayout", "../slideLayouts/slideLayout1.xml")]),
        ));

        for (i, shapes) in self.layouts.iter().enumerate() {
            let n = i + 1;
            files.push((
                format!("ppt/slideLayouts/slideLayout{}.xml", n),
                layout_xml(&format!("Layout {}", n), shapes),
            ));
            files.push((
                format!("ppt/slideLayouts/_rels/slideLayout{}.xml.rels", n),
                rels_xml(&[("rId1", "slideMaster", "../slideMasters/slideMaster1.xml")]),
            ));
        }

        for (part, layout, shapes) in &self.slides {
            files.push((format!("ppt/slides/slide{}.xml", part), slide_xml(shapes)));
            let layout_target = format!("../slideLayouts/slideLayout{}.xml", layout);
            files.push((
                format!("ppt/slides/_rels/slide{}.xml.rels", part),
                rels_xml(&[("rId1", "slideLayout", &layout_target)]),
            ));
        }

        zip_files(&files)
    }
}

/// Write `(path, content)` pairs into a ZIP archive.
pub fn zip_files(files: &[(String, String)]) -> Vec<u8> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = FileOptions::default();
    for (path, content) in files {
        zip.start_file(path.as_str(), options).unwrap();
        zip.write_all(content.as_bytes()).unwrap();
    }
    zip.finish().unwrap().into_inner()
}
