//! Minimal PDF 1.4 writer for tabular reports.
//!
//! Pages are A4 portrait using the built-in Helvetica font, so no font data is
//! embedded. Output holds no timestamps or ids and is byte-identical for equal input.

use std::io::Write;

use anyhow::{Context, Result};

pub const PAGE_WIDTH: f32 = 595.0;
pub const PAGE_HEIGHT: f32 = 842.0;
pub const TOP_Y: f32 = 800.0;
pub const BOTTOM_MARGIN: f32 = 50.0;
pub const LEFT_X: f32 = 40.0;
pub const RIGHT_X: f32 = 555.0;

pub const TITLE_SIZE: f32 = 14.0;
pub const TEXT_SIZE: f32 = 10.0;
pub const ROW_SIZE: f32 = 9.0;
pub const ROW_HEIGHT: f32 = 14.0;
const TITLE_GAP: f32 = 24.0;
const HEADER_GAP: f32 = 16.0;

/// Helvetica averages a little over half an em per glyph.
const AVG_GLYPH_WIDTH_EM: f32 = 0.55;

#[derive(Debug, Clone, PartialEq)]
pub struct TextLine {
    pub x: f32,
    pub y: f32,
    pub size: f32,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DocumentSpec<'a> {
    pub title: &'a str,
    pub subtitle_lines: &'a [String],
    pub headers: &'a [String],
    pub rows: &'a [Vec<String>],
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct DocumentLayout {
    pub pages: Vec<Vec<TextLine>>,
}

impl DocumentLayout {
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }
}

struct Cursor {
    pages: Vec<Vec<TextLine>>,
    y: f32,
}

impl Cursor {
    fn new() -> Self {
        Self {
            pages: vec![Vec::new()],
            y: TOP_Y,
        }
    }

    fn ensure_room(&mut self) {
        if self.y < BOTTOM_MARGIN {
            self.pages.push(Vec::new());
            self.y = TOP_Y;
        }
    }

    fn push(&mut self, x: f32, size: f32, text: String) {
        if let Some(page) = self.pages.last_mut() {
            page.push(TextLine {
                x,
                y: self.y,
                size,
                text,
            });
        }
    }
}

/// Places the title, subtitle lines, header row and one line per row.
///
/// A row is always placed whole: when the cursor has dropped below the bottom
/// margin a fresh page is started before the row is drawn.
pub fn layout_document(spec: &DocumentSpec<'_>) -> DocumentLayout {
    let mut cursor = Cursor::new();
    let columns = column_positions(spec.headers.len());
    let column_width = column_width(spec.headers.len());

    cursor.push(LEFT_X, TITLE_SIZE, spec.title.to_string());
    cursor.y -= TITLE_GAP;

    for line in spec.subtitle_lines {
        cursor.push(LEFT_X, TEXT_SIZE, line.clone());
        cursor.y -= ROW_HEIGHT;
    }
    if !spec.subtitle_lines.is_empty() {
        cursor.y -= TITLE_GAP - ROW_HEIGHT;
    }

    for (x, header) in columns.iter().zip(spec.headers) {
        cursor.push(*x, TEXT_SIZE, fit_text(header, column_width, TEXT_SIZE));
    }
    cursor.y -= HEADER_GAP;

    for row in spec.rows {
        cursor.ensure_room();
        for (x, cell) in columns.iter().zip(row) {
            cursor.push(*x, ROW_SIZE, fit_text(cell, column_width, ROW_SIZE));
        }
        cursor.y -= ROW_HEIGHT;
    }

    DocumentLayout {
        pages: cursor.pages,
    }
}

fn column_width(count: usize) -> f32 {
    if count == 0 {
        return RIGHT_X - LEFT_X;
    }
    (RIGHT_X - LEFT_X) / count as f32
}

fn column_positions(count: usize) -> Vec<f32> {
    let width = column_width(count);
    (0..count).map(|idx| LEFT_X + idx as f32 * width).collect()
}

/// Truncates text so it stays inside its column, marking the cut with "...".
fn fit_text(text: &str, width: f32, size: f32) -> String {
    let single_line = text.replace(['\r', '\n'], " ");
    let max_chars = ((width - 4.0) / (size * AVG_GLYPH_WIDTH_EM)).floor().max(4.0) as usize;
    if single_line.chars().count() <= max_chars {
        return single_line;
    }
    let kept: String = single_line.chars().take(max_chars - 3).collect();
    format!("{kept}...")
}

/// Serializes a layout into PDF bytes.
pub fn render_pdf(layout: &DocumentLayout) -> Result<Vec<u8>> {
    let page_count = layout.pages.len().max(1);
    // 1 catalog, 2 page tree, 3 font, then a (page, content) pair per page.
    let object_count = 3 + page_count * 2;
    let mut out: Vec<u8> = Vec::new();
    let mut offsets: Vec<usize> = Vec::with_capacity(object_count);

    out.extend_from_slice(b"%PDF-1.4\n%\xE2\xE3\xCF\xD3\n");

    offsets.push(out.len());
    out.extend_from_slice(b"1 0 obj\n<< /Type /Catalog /Pages 2 0 R >>\nendobj\n");

    offsets.push(out.len());
    let kids: Vec<String> = (0..page_count)
        .map(|idx| format!("{} 0 R", page_object_id(idx)))
        .collect();
    write!(
        out,
        "2 0 obj\n<< /Type /Pages /Kids [{}] /Count {} >>\nendobj\n",
        kids.join(" "),
        page_count
    )
    .context("failed to write page tree")?;

    offsets.push(out.len());
    out.extend_from_slice(
        b"3 0 obj\n<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica /Encoding /WinAnsiEncoding >>\nendobj\n",
    );

    let empty = Vec::new();
    for idx in 0..page_count {
        let lines = layout.pages.get(idx).unwrap_or(&empty);
        let content = page_content(lines);

        offsets.push(out.len());
        write!(
            out,
            "{} 0 obj\n<< /Type /Page /Parent 2 0 R /MediaBox [0 0 {} {}] /Resources << /Font << /F1 3 0 R >> >> /Contents {} 0 R >>\nendobj\n",
            page_object_id(idx),
            PAGE_WIDTH,
            PAGE_HEIGHT,
            page_object_id(idx) + 1
        )
        .with_context(|| format!("failed to write page #{idx}"))?;

        offsets.push(out.len());
        write!(
            out,
            "{} 0 obj\n<< /Length {} >>\nstream\n",
            page_object_id(idx) + 1,
            content.len()
        )
        .with_context(|| format!("failed to write content header #{idx}"))?;
        out.extend_from_slice(&content);
        out.extend_from_slice(b"\nendstream\nendobj\n");
    }

    let xref_offset = out.len();
    write!(out, "xref\n0 {}\n0000000000 65535 f \n", object_count + 1)
        .context("failed to write xref header")?;
    for offset in &offsets {
        write!(out, "{offset:010} 00000 n \n").context("failed to write xref entry")?;
    }
    write!(
        out,
        "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{}\n%%EOF\n",
        object_count + 1,
        xref_offset
    )
    .context("failed to write trailer")?;

    Ok(out)
}

fn page_object_id(page_idx: usize) -> usize {
    4 + page_idx * 2
}

fn page_content(lines: &[TextLine]) -> Vec<u8> {
    let mut content = Vec::new();
    for line in lines {
        content.extend_from_slice(
            format!(
                "BT /F1 {:.1} Tf {:.2} {:.2} Td (",
                line.size, line.x, line.y
            )
            .as_bytes(),
        );
        content.extend_from_slice(&encode_pdf_string(&line.text));
        content.extend_from_slice(b") Tj ET\n");
    }
    content
}

/// WinAnsi bytes of a literal string body. Unmappable characters become '?'.
fn encode_pdf_string(text: &str) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '(' | ')' | '\\' => {
                bytes.push(b'\\');
                bytes.push(ch as u8);
            }
            '\u{2013}' => bytes.push(0x96),
            '\u{2014}' => bytes.push(0x97),
            '\u{2018}' => bytes.push(0x91),
            '\u{2019}' => bytes.push(0x92),
            '\u{201C}' => bytes.push(0x93),
            '\u{201D}' => bytes.push(0x94),
            '\u{20AC}' => bytes.push(0x80),
            ' '..='~' => bytes.push(ch as u8),
            '\u{A0}'..='\u{FF}' => bytes.push(ch as u32 as u8),
            _ => bytes.push(b'?'),
        }
    }
    bytes
}
