use compute::Classification;
use foundation::grouped;
use formats::DetectionProperties;

pub const NOT_AVAILABLE: &str = "N/A";

/// Formats an optional measurement as `"12,345.67 m²"`, or `"N/A"` when absent or not finite.
pub fn format_measure(value: Option<f64>, unit: &str) -> String {
    match value {
        Some(v) if v.is_finite() => format!("{} {unit}", grouped(v, 2)),
        _ => NOT_AVAILABLE.to_string(),
    }
}

pub const fn classification_label(class: Classification) -> &'static str {
    match class {
        Classification::Legal => "Legal Mining",
        Classification::Illegal => "Illegal Mining",
        Classification::Unknown => "Unknown",
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Popup {
    pub title: &'static str,
    pub subtitle: String,
    pub lines: Vec<(&'static str, String)>,
}

impl Popup {
    pub fn for_detection(props: &DetectionProperties, class: Classification) -> Self {
        Self {
            title: "Mining Detection",
            subtitle: classification_label(class).to_string(),
            lines: vec![
                ("Area", format_measure(props.area_m2, "m²")),
                ("Mean Depth", format_measure(props.mean_depth_m, "m")),
                ("Max Depth", format_measure(props.max_depth_m, "m")),
                ("Volume", format_measure(props.volume_m3, "m³")),
            ],
        }
    }

    pub fn for_reference_aoi() -> Self {
        Self {
            title: "Area of Interest",
            subtitle: "Authorized mining boundary".to_string(),
            lines: Vec::new(),
        }
    }

    /// Plain-text rendering, one `Label: value` per line.
    pub fn to_text(&self) -> String {
        let mut out = format!("{}\n{}", self.title, self.subtitle);
        for (label, value) in &self.lines {
            out.push('\n');
            out.push_str(label);
            out.push_str(": ");
            out.push_str(value);
        }
        out
    }
}
