//! PDF rendering of a compiled [`ReportDocument`] using the built-in Helvetica font.

use std::path::Path;

use printpdf::{
    BuiltinFont, Color, IndirectFontRef, Line, Mm, PdfDocument, PdfLayerReference, Point, Rgb,
};
use tracing::info;

use crate::document::{Align, Element, PAGE_HEIGHT_MM, PAGE_WIDTH_MM, ReportDocument, TextItem};

pub const DEFAULT_FILE_NAME: &str = "mining_report.pdf";

const PT_TO_MM: f32 = 25.4 / 72.0;

#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("PDF generation failed: {0}")]
    Pdf(String),
    #[error("could not write report: {0}")]
    Io(#[from] std::io::Error),
}

pub fn render_pdf(doc: &ReportDocument) -> Result<Vec<u8>, ReportError> {
    let (pdf, first_page, first_layer) = PdfDocument::new(
        doc.title.as_str(),
        Mm(PAGE_WIDTH_MM),
        Mm(PAGE_HEIGHT_MM),
        "Layer 1",
    );
    let font = pdf
        .add_builtin_font(BuiltinFont::Helvetica)
        .map_err(|e| ReportError::Pdf(e.to_string()))?;

    for (i, page) in doc.pages.iter().enumerate() {
        let layer = if i == 0 {
            pdf.get_page(first_page).get_layer(first_layer)
        } else {
            let (page_idx, layer_idx) =
                pdf.add_page(Mm(PAGE_WIDTH_MM), Mm(PAGE_HEIGHT_MM), "Layer 1");
            pdf.get_page(page_idx).get_layer(layer_idx)
        };
        for element in &page.elements {
            match element {
                Element::Text(text) => draw_text(&layer, &font, text),
                Element::Rule(rule) => {
                    layer.set_outline_color(rgb(rule.color));
                    layer.set_outline_thickness(0.5);
                    layer.add_line(Line {
                        points: vec![
                            (Point::new(Mm(rule.from.0), flip(rule.from.1)), false),
                            (Point::new(Mm(rule.to.0), flip(rule.to.1)), false),
                        ],
                        is_closed: false,
                    });
                }
            }
        }
    }

    pdf.save_to_bytes()
        .map_err(|e| ReportError::Pdf(e.to_string()))
}

pub fn write_pdf(doc: &ReportDocument, path: &Path) -> Result<(), ReportError> {
    let bytes = render_pdf(doc)?;
    std::fs::write(path, &bytes)?;
    info!(path = %path.display(), bytes = bytes.len(), "report written");
    Ok(())
}

fn draw_text(layer: &PdfLayerReference, font: &IndirectFontRef, item: &TextItem) {
    let x = match item.align {
        Align::Left => item.x,
        Align::Center => item.x - text_width_mm(&item.text, item.size_pt) / 2.0,
    };
    layer.set_fill_color(rgb(item.color));
    layer.use_text(item.text.as_str(), item.size_pt, Mm(x), flip(item.y), font);
}

// Layout y runs down from the top edge; PDF y runs up from the bottom.
fn flip(y: f32) -> Mm {
    Mm(PAGE_HEIGHT_MM - y)
}

fn rgb(c: [u8; 3]) -> Color {
    Color::Rgb(Rgb::new(
        f32::from(c[0]) / 255.0,
        f32::from(c[1]) / 255.0,
        f32::from(c[2]) / 255.0,
        None,
    ))
}

/// Approximate Helvetica advance width of `text`.
pub fn text_width_mm(text: &str, size_pt: f32) -> f32 {
    let units: u32 = text.chars().map(helvetica_advance).sum();
    units as f32 / 1000.0 * size_pt * PT_TO_MM
}

// Helvetica AFM widths, grouped by glyph class.
fn helvetica_advance(c: char) -> u32 {
    match c {
        'i' | 'j' | 'l' => 222,
        ' ' | '.' | ',' | ':' | ';' | '!' | '/' | 'I' | 'f' | 't' => 278,
        '(' | ')' | '-' | 'r' => 333,
        'c' | 'k' | 's' | 'v' | 'x' | 'y' | 'z' | 'J' => 500,
        'm' => 833,
        'w' => 722,
        'M' => 833,
        'W' => 944,
        'A' | 'B' | 'E' | 'K' | 'P' | 'S' | 'V' | 'X' | 'Y' => 667,
        'C' | 'D' | 'H' | 'N' | 'R' | 'U' => 722,
        'F' | 'T' | 'Z' => 611,
        'G' | 'O' | 'Q' => 778,
        _ => 556,
    }
}
