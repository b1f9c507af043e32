//! Report layout.
//!
//! Positions are in millimeters from the top-left corner of an A4 page, font sizes in points,
//! and text `y` is the baseline. Compilation is a pure function of [`ReportInputs`].

use formats::{ComparisonSummary, DemVolumeResult};
use foundation::{fixed, grouped};

pub const PAGE_WIDTH_MM: f32 = 210.0;
pub const PAGE_HEIGHT_MM: f32 = 297.0;
const CENTER_X: f32 = 105.0;

const HEADING_COLOR: [u8; 3] = [40, 40, 80];
const BODY_COLOR: [u8; 3] = [0, 0, 0];
const RULE_COLOR: [u8; 3] = [100, 100, 100];
const FOOTER_COLOR: [u8; 3] = [120, 120, 120];

pub const NOT_AVAILABLE: &str = "N/A";

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Align {
    Left,
    /// `x` is the center of the line.
    Center,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextItem {
    pub text: String,
    pub x: f32,
    pub y: f32,
    pub size_pt: f32,
    pub color: [u8; 3],
    pub align: Align,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Rule {
    pub from: (f32, f32),
    pub to: (f32, f32),
    pub color: [u8; 3],
}

#[derive(Debug, Clone, PartialEq)]
pub enum Element {
    Text(TextItem),
    Rule(Rule),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Page {
    pub elements: Vec<Element>,
}

impl Page {
    pub fn texts(&self) -> impl Iterator<Item = &TextItem> {
        self.elements.iter().filter_map(|e| match e {
            Element::Text(t) => Some(t),
            Element::Rule(_) => None,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReportDocument {
    pub title: String,
    pub pages: Vec<Page>,
}

impl ReportDocument {
    /// Every text line in page order.
    pub fn lines(&self) -> Vec<&str> {
        self.pages
            .iter()
            .flat_map(Page::texts)
            .map(|t| t.text.as_str())
            .collect()
    }

    pub fn contains_line(&self, line: &str) -> bool {
        self.lines().contains(&line)
    }
}

/// Cached dashboard state the report is compiled from.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReportInputs {
    pub summary: Option<ComparisonSummary>,
    pub dem: Option<DemVolumeResult>,
    /// Already formatted; supplied by the caller so output is reproducible.
    pub generated_at: String,
}

/// Pen state for one page: current font size and color, like a PDF content stream.
struct PageWriter {
    page: Page,
    size_pt: f32,
    color: [u8; 3],
}

impl PageWriter {
    fn new() -> Self {
        Self {
            page: Page::default(),
            size_pt: 16.0,
            color: BODY_COLOR,
        }
    }

    fn style(&mut self, size_pt: f32, color: [u8; 3]) {
        self.size_pt = size_pt;
        self.color = color;
    }

    fn text(&mut self, text: impl Into<String>, x: f32, y: f32, align: Align) {
        self.page.elements.push(Element::Text(TextItem {
            text: text.into(),
            x,
            y,
            size_pt: self.size_pt,
            color: self.color,
            align,
        }));
    }

    fn rule(&mut self, from: (f32, f32), to: (f32, f32), color: [u8; 3]) {
        self.page.elements.push(Element::Rule(Rule { from, to, color }));
    }

    fn finish(self) -> Page {
        self.page
    }
}

pub fn compile(inputs: &ReportInputs) -> ReportDocument {
    ReportDocument {
        title: "Automated Mining Activity Detection Report".to_string(),
        pages: vec![title_page(inputs), findings_page(inputs)],
    }
}

fn title_page(inputs: &ReportInputs) -> Page {
    let mut w = PageWriter::new();
    w.style(22.0, HEADING_COLOR);
    w.text("Government of India", CENTER_X, 30.0, Align::Center);
    w.style(18.0, BODY_COLOR);
    w.text("Ministry of Mines", CENTER_X, 40.0, Align::Center);
    w.style(16.0, BODY_COLOR);
    w.text(
        "Automated Mining Activity Detection Report",
        CENTER_X,
        55.0,
        Align::Center,
    );
    w.style(12.0, BODY_COLOR);
    w.text(
        format!("Date: {}", inputs.generated_at),
        CENTER_X,
        65.0,
        Align::Center,
    );
    w.rule((40.0, 70.0), (170.0, 70.0), RULE_COLOR);
    w.style(11.0, BODY_COLOR);
    w.text(
        "Prepared by: Advanced Mining Detection Platform",
        CENTER_X,
        80.0,
        Align::Center,
    );
    w.text("(For official use only)", CENTER_X, 90.0, Align::Center);
    w.finish()
}

fn findings_page(inputs: &ReportInputs) -> Page {
    let mut w = PageWriter::new();
    let mut y = 20.0;

    w.style(16.0, HEADING_COLOR);
    w.text("Executive Summary", 15.0, y, Align::Left);
    y += 8.0;
    w.style(11.0, BODY_COLOR);
    for line in [
        "This report provides an automated analysis of mining activity within the specified Area of Interest (AOI),",
        "using advanced satellite imagery and digital elevation models. The findings include detected mining extents,",
        "volumetric changes, and compliance with legal boundaries.",
    ] {
        w.text(line, 15.0, y, Align::Left);
        y += 6.0;
    }
    y += 6.0;

    heading(&mut w, "1. Detected Mining Area (2D Analysis)", &mut y);
    match &inputs.summary {
        Some(s) => {
            body(
                &mut w,
                format!("Detected Area: {} km²", fixed(s.detected_area_m2 / 1e6, 2)),
                &mut y,
            );
            body(
                &mut w,
                format!("Outside AOI: {} km²", fixed(s.outside_area_m2 / 1e6, 2)),
                &mut y,
            );
            w.text(
                format!("Percent Outside AOI: {} %", s.pct_outside),
                20.0,
                y,
                Align::Left,
            );
            y += 8.0;
        }
        None => {
            w.text("No 2D dashboard data available.", 20.0, y, Align::Left);
            y += 8.0;
        }
    }

    heading(&mut w, "2. Terrain Change & Volume Analysis (3D)", &mut y);
    match &inputs.dem {
        Some(dem) => {
            let volume = dem
                .volume_m3
                .map_or_else(|| NOT_AVAILABLE.to_string(), |v| grouped(v, 2));
            body(&mut w, format!("Estimated Volume Change: {volume} m³"), &mut y);
            body(
                &mut w,
                format!("Maximum Elevation Difference: {} m", meters(dem.max_diff)),
                &mut y,
            );
            body(
                &mut w,
                format!("Minimum Elevation Difference: {} m", meters(dem.min_diff)),
                &mut y,
            );
            w.text(
                format!("Mean Elevation Difference: {} m", meters(dem.mean_diff)),
                20.0,
                y,
                Align::Left,
            );
            y += 8.0;
        }
        None => {
            w.text("No 3D terrain analysis data available.", 20.0, y, Align::Left);
            y += 8.0;
        }
    }

    heading(&mut w, "3. Legal Compliance Statement", &mut y);
    body(
        &mut w,
        "The detected mining activities have been compared against the official AOI boundaries.",
        &mut y,
    );
    let verdict = match &inputs.summary {
        Some(s) if s.has_outside_activity() => {
            "Warning: Mining detected outside legal AOI. Immediate review recommended."
        }
        Some(_) => "All detected mining activities are within the legal AOI.",
        None => "Insufficient data for compliance assessment.",
    };
    body(&mut w, verdict, &mut y);
    y += 8.0;

    heading(&mut w, "4. Methodology", &mut y);
    for line in [
        "- Satellite imagery and digital elevation models were processed using AI algorithms.",
        "- Detected mining extents and volumetric changes were calculated automatically.",
        "- Results are subject to verification by authorized personnel.",
    ] {
        body(&mut w, line, &mut y);
    }

    w.style(10.0, FOOTER_COLOR);
    w.text(
        "This is a system-generated report. For queries, contact the Ministry of Mines.",
        CENTER_X,
        285.0,
        Align::Center,
    );
    w.finish()
}

fn heading(w: &mut PageWriter, text: &str, y: &mut f32) {
    w.style(14.0, HEADING_COLOR);
    w.text(text, 15.0, *y, Align::Left);
    *y += 8.0;
    w.style(11.0, BODY_COLOR);
}

fn body(w: &mut PageWriter, text: impl Into<String>, y: &mut f32) {
    w.text(text, 20.0, *y, Align::Left);
    *y += 6.0;
}

fn meters(value: Option<f64>) -> String {
    value.map_or_else(|| NOT_AVAILABLE.to_string(), |v| fixed(v, 2))
}

#[cfg(test)]
mod tests {
    use super::{Align, Element, ReportInputs, compile};
    use formats::{ComparisonSummary, DemVolumeResult};
    use pretty_assertions::assert_eq;

    fn summary(pct_outside: f64) -> ComparisonSummary {
        ComparisonSummary {
            detected_area_m2: 2_345_678.0,
            outside_area_m2: 120_000.0,
            pct_outside,
            time_start: None,
            time_end: None,
        }
    }

    #[test]
    fn empty_inputs_render_every_placeholder() {
        let doc = compile(&ReportInputs {
            generated_at: "1/2/2025, 10:00:00 AM".into(),
            ..ReportInputs::default()
        });
        assert_eq!(doc.pages.len(), 2);
        assert!(doc.contains_line("Date: 1/2/2025, 10:00:00 AM"));
        assert!(doc.contains_line("No 2D dashboard data available."));
        assert!(doc.contains_line("No 3D terrain analysis data available."));
        assert!(doc.contains_line("Insufficient data for compliance assessment."));
    }

    #[test]
    fn outside_activity_renders_warning() {
        let doc = compile(&ReportInputs {
            summary: Some(summary(5.12)),
            ..ReportInputs::default()
        });
        assert!(doc.contains_line("Detected Area: 2.35 km²"));
        assert!(doc.contains_line("Outside AOI: 0.12 km²"));
        assert!(doc.contains_line("Percent Outside AOI: 5.12 %"));
        assert!(doc.contains_line(
            "Warning: Mining detected outside legal AOI. Immediate review recommended."
        ));

        let clean = compile(&ReportInputs {
            summary: Some(summary(0.0)),
            ..ReportInputs::default()
        });
        assert!(clean.contains_line("Percent Outside AOI: 0 %"));
        assert!(clean.contains_line("All detected mining activities are within the legal AOI."));
    }

    #[test]
    fn dem_fields_fall_back_to_na() {
        let doc = compile(&ReportInputs {
            dem: Some(DemVolumeResult {
                volume_m3: Some(-12345.678),
                max_diff: Some(3.0),
                min_diff: None,
                mean_diff: Some(-0.456),
                ..DemVolumeResult::default()
            }),
            ..ReportInputs::default()
        });
        assert!(doc.contains_line("Estimated Volume Change: -12,345.68 m³"));
        assert!(doc.contains_line("Maximum Elevation Difference: 3.00 m"));
        assert!(doc.contains_line("Minimum Elevation Difference: N/A m"));
        assert!(doc.contains_line("Mean Elevation Difference: -0.46 m"));
    }

    #[test]
    fn cursor_positions_follow_layout() {
        let doc = compile(&ReportInputs::default());
        let positions: Vec<(f32, &str)> = doc.pages[1]
            .texts()
            .map(|t| (t.y, t.text.as_str()))
            .filter(|(_, t)| t.starts_with(|c: char| c.is_ascii_digit()))
            .collect();
        assert_eq!(
            positions,
            vec![
                (52.0, "1. Detected Mining Area (2D Analysis)"),
                (68.0, "2. Terrain Change & Volume Analysis (3D)"),
                (84.0, "3. Legal Compliance Statement"),
                (112.0, "4. Methodology"),
            ]
        );

        let rule = doc.pages[0]
            .elements
            .iter()
            .find_map(|e| match e {
                Element::Rule(r) => Some(r.clone()),
                Element::Text(_) => None,
            })
            .unwrap();
        assert_eq!((rule.from, rule.to), ((40.0, 70.0), (170.0, 70.0)));

        let footer = doc.pages[1].texts().last().unwrap();
        assert_eq!((footer.y, footer.size_pt, footer.align), (285.0, 10.0, Align::Center));
    }
}
