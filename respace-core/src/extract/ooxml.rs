//! Word-processing and presentation extraction (DOCX / PPTX).
//!
//! Both formats are ZIP archives of XML parts. DOCX keeps the body in
//! `word/document.xml`; PPTX keeps one part per slide under `ppt/slides/`,
//! ordered by the slide list in `ppt/presentation.xml`.

use std::io::{Cursor, Read};

use respace_types::SourceFormat;
use rustc_hash::FxHashMap;
use tracing::debug;
use zip::ZipArchive;

use super::error::{ExtractError, ExtractResult};
use super::xml::{attr, decode_entities_into, scan, XmlEvent};

type Archive<'a> = ZipArchive<Cursor<&'a [u8]>>;

fn open_archive(data: &[u8], format: SourceFormat) -> ExtractResult<Archive<'_>> {
    ZipArchive::new(Cursor::new(data)).map_err(|e| ExtractError::parse(format, e))
}

fn read_part(archive: &mut Archive<'_>, name: &str, format: SourceFormat) -> ExtractResult<String> {
    let mut part = archive
        .by_name(name)
        .map_err(|_| ExtractError::MissingPart {
            format,
            part: name.to_string(),
        })?;

    let mut xml = String::new();
    part.read_to_string(&mut xml)
        .map_err(|e| ExtractError::parse(format, e))?;
    Ok(xml)
}

/// Extracts the text of every paragraph, each followed by `\n`.
pub(crate) fn extract_docx(data: &[u8]) -> ExtractResult<String> {
    let mut archive = open_archive(data, SourceFormat::Docx)?;
    let xml = read_part(&mut archive, "word/document.xml", SourceFormat::Docx)?;
    Ok(docx_text(&xml))
}

/// Walks `word/document.xml`.
///
/// Paragraphs nested inside other paragraphs (text boxes) are emitted as
/// their own lines when they close.
pub(crate) fn docx_text(xml: &str) -> String {
    let mut out = String::with_capacity(xml.len() / 4);
    let mut open: Vec<String> = Vec::new();
    let mut in_run = false;
    let mut in_text = false;

    scan(xml, |event| match event {
        XmlEvent::Open { name: "w:p", empty: false, .. } => open.push(String::new()),
        XmlEvent::Open { name: "w:p", empty: true, .. } => out.push('\n'),
        XmlEvent::Close { name: "w:p" } => {
            if let Some(para) = open.pop() {
                out.push_str(&para);
                out.push('\n');
            }
        }
        XmlEvent::Open { name: "w:r", empty, .. } => in_run = !empty,
        XmlEvent::Close { name: "w:r" } => in_run = false,
        XmlEvent::Open { name: "w:t", empty, .. } => in_text = !empty,
        XmlEvent::Close { name: "w:t" } => in_text = false,
        // Outside a run, `w:tab` is a tab stop definition.
        XmlEvent::Open { name: "w:tab", .. } if in_run => {
            if let Some(para) = open.last_mut() {
                para.push('\t');
            }
        }
        XmlEvent::Open { name: "w:br" | "w:cr", .. } => {
            if let Some(para) = open.last_mut() {
                para.push('\n');
            }
        }
        XmlEvent::Text(raw) if in_text => {
            if let Some(para) = open.last_mut() {
                decode_entities_into(raw, para);
            }
        }
        _ => {}
    });

    out
}

/// Extracts every slide in presentation order. Each shape's text body
/// contributes its paragraphs joined by `\n`, followed by `\n`.
pub(crate) fn extract_pptx(data: &[u8]) -> ExtractResult<String> {
    let mut archive = open_archive(data, SourceFormat::Pptx)?;
    let slides = slide_order(&mut archive)?;
    debug!(slides = slides.len(), "reading presentation");

    let mut out = String::new();
    for slide in &slides {
        let xml = read_part(&mut archive, slide, SourceFormat::Pptx)?;
        slide_text_into(&xml, &mut out);
    }

    Ok(out)
}

/// Resolves slide part names in presentation order.
///
/// Uses the `p:sldIdLst` of `ppt/presentation.xml` and its relationships
/// when present; otherwise falls back to numeric order of
/// `ppt/slides/slideN.xml`.
fn slide_order(archive: &mut Archive<'_>) -> ExtractResult<Vec<String>> {
    let presentation = read_part(archive, "ppt/presentation.xml", SourceFormat::Pptx);
    let rels = read_part(archive, "ppt/_rels/presentation.xml.rels", SourceFormat::Pptx);
    let from_manifest = match (presentation, rels) {
        (Ok(presentation), Ok(rels)) => manifest_slides(&presentation, &rels),
        _ => Vec::new(),
    };

    let slides: Vec<String> = if from_manifest.is_empty() {
        numbered_slides(archive.file_names())
    } else {
        from_manifest
            .into_iter()
            .filter(|name| archive.file_names().any(|n| n == name.as_str()))
            .collect()
    };

    if slides.is_empty() {
        return Err(ExtractError::MissingPart {
            format: SourceFormat::Pptx,
            part: "ppt/slides/slide1.xml".to_string(),
        });
    }

    Ok(slides)
}

/// Slide part names listed by `p:sldId` entries, mapped through the
/// presentation relationships.
pub(crate) fn manifest_slides(presentation: &str, rels: &str) -> Vec<String> {
    let mut targets: FxHashMap<&str, &str> = FxHashMap::default();
    scan(rels, |event| {
        if let XmlEvent::Open {
            name: "Relationship",
            attrs,
            ..
        } = event
        {
            if let (Some(id), Some(target)) = (attr(attrs, "Id"), attr(attrs, "Target")) {
                targets.insert(id, target);
            }
        }
    });

    let mut slides = Vec::new();
    scan(presentation, |event| {
        if let XmlEvent::Open {
            name: "p:sldId",
            attrs,
            ..
        } = event
        {
            if let Some(target) = attr(attrs, "r:id").and_then(|id| targets.get(id)) {
                slides.push(resolve_ppt_target(target));
            }
        }
    });

    slides
}

/// Relationship targets are relative to `ppt/`, or absolute from the root.
fn resolve_ppt_target(target: &str) -> String {
    match target.strip_prefix('/') {
        Some(absolute) => absolute.to_string(),
        None => format!("ppt/{}", target.trim_start_matches("./")),
    }
}

/// `ppt/slides/slideN.xml` names sorted by `N`.
pub(crate) fn numbered_slides<'a>(names: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut numbered: Vec<(u32, &str)> = names
        .filter_map(|name| {
            let n = name
                .strip_prefix("ppt/slides/slide")?
                .strip_suffix(".xml")?
                .parse()
                .ok()?;
            Some((n, name))
        })
        .collect();

    numbered.sort_unstable();
    numbered.into_iter().map(|(_, name)| name.to_string()).collect()
}

/// Appends the text of every `p:txBody` in one slide part.
pub(crate) fn slide_text_into(xml: &str, out: &mut String) {
    let mut body: Option<Vec<String>> = None;
    let mut in_text = false;

    scan(xml, |event| match event {
        XmlEvent::Open { name: "p:txBody", empty: false, .. } => body = Some(Vec::new()),
        XmlEvent::Open { name: "p:txBody", empty: true, .. } => out.push('\n'),
        XmlEvent::Close { name: "p:txBody" } => {
            if let Some(paras) = body.take() {
                out.push_str(&paras.join("\n"));
                out.push('\n');
            }
        }
        XmlEvent::Open { name: "a:p", .. } => {
            if let Some(paras) = body.as_mut() {
                paras.push(String::new());
            }
        }
        XmlEvent::Open { name: "a:t", empty, .. } => in_text = !empty,
        XmlEvent::Close { name: "a:t" } => in_text = false,
        XmlEvent::Open { name: "a:br", .. } => {
            if let Some(para) = body.as_mut().and_then(|p| p.last_mut()) {
                para.push('\n');
            }
        }
        XmlEvent::Text(raw) if in_text => {
            if let Some(para) = body.as_mut().and_then(|p| p.last_mut()) {
                decode_entities_into(raw, para);
            }
        }
        _ => {}
    });
}
