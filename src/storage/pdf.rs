// src/storage/pdf.rs

//! Minimal PDF output: Helvetica 12pt, one text line per row, new page when
//! the current one fills up. Not layout-aware.

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};

use crate::report::ReportContent;
use crate::utils::error::StorageError;

const PAGE_WIDTH: i64 = 612; // US Letter
const PAGE_HEIGHT: i64 = 792;
const LEFT_MARGIN: i64 = 30;
const TOP_Y: i64 = 750;
const BOTTOM_Y: i64 = 50;
const LINE_HEIGHT: i64 = 20;
const FONT_SIZE: i64 = 12;
const MAX_LINE_CHARS: usize = 90;

/// Report as the flat list of lines that will be drawn.
pub fn report_lines(report: &ReportContent) -> Vec<String> {
    let mut lines = vec![report.title.clone(), String::new()];
    for section in &report.sections {
        lines.push(section.title.clone());
        for line in section.body.lines() {
            lines.extend(wrap(line, MAX_LINE_CHARS));
        }
        lines.push(String::new());
    }
    lines
}

fn wrap(line: &str, width: usize) -> Vec<String> {
    let chars: Vec<char> = line.chars().collect();
    if chars.is_empty() {
        return vec![String::new()];
    }
    chars.chunks(width).map(|c| c.iter().collect()).collect()
}

/// The built-in fonts only cover Latin-1; anything else is drawn as '?'.
fn to_latin1(line: &str) -> Vec<u8> {
    line.chars()
        .map(|c| u8::try_from(u32::from(c)).unwrap_or(b'?'))
        .collect()
}

pub fn render_pdf(report: &ReportContent) -> Result<Vec<u8>, StorageError> {
    let lines = report_lines(report);
    let per_page = ((TOP_Y - BOTTOM_Y) / LINE_HEIGHT + 1) as usize;

    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
        "Encoding" => "WinAnsiEncoding",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });

    let mut kids: Vec<Object> = Vec::new();
    for page_lines in lines.chunks(per_page) {
        let mut operations = Vec::new();
        for (i, line) in page_lines.iter().enumerate() {
            if line.is_empty() {
                continue;
            }
            let y = TOP_Y - LINE_HEIGHT * i as i64;
            operations.push(Operation::new("BT", vec![]));
            operations.push(Operation::new("Tf", vec!["F1".into(), FONT_SIZE.into()]));
            operations.push(Operation::new("Td", vec![LEFT_MARGIN.into(), y.into()]));
            operations.push(Operation::new(
                "Tj",
                vec![Object::String(to_latin1(line), lopdf::StringFormat::Literal)],
            ));
            operations.push(Operation::new("ET", vec![]));
        }

        let content = Content { operations }
            .encode()
            .map_err(|e| StorageError::RenderError(e.to_string()))?;
        let content_id = doc.add_object(Stream::new(dictionary! {}, content));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), PAGE_WIDTH.into(), PAGE_HEIGHT.into()],
        });
        kids.push(page_id.into());
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut out = Vec::new();
    doc.save_to(&mut out)
        .map_err(|e| StorageError::RenderError(e.to_string()))?;
    tracing::debug!("Rendered PDF report: {} lines, {} pages", lines.len(), count);
    Ok(out)
}
