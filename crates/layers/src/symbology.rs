use compute::Classification;

/// Path style for one overlay, in Leaflet/simplestyle terms.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct LayerStyle {
    pub visible: bool,
    /// Stroke color, CSS hex.
    pub stroke: &'static str,
    pub weight: f64,
    pub stroke_opacity: f64,
    /// Fill color; `None` fills with the stroke color.
    pub fill: Option<&'static str>,
    pub fill_opacity: f64,
    pub dash_array: Option<&'static str>,
}

impl LayerStyle {
    pub const fn new(stroke: &'static str, weight: f64, fill_opacity: f64) -> Self {
        Self {
            visible: true,
            stroke,
            weight,
            stroke_opacity: 1.0,
            fill: None,
            fill_opacity,
            dash_array: None,
        }
    }

    pub const fn with_fill(mut self, fill: &'static str) -> Self {
        self.fill = Some(fill);
        self
    }

    pub const fn dashed(mut self, pattern: &'static str) -> Self {
        self.dash_array = Some(pattern);
        self
    }

    pub const fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }

    pub fn fill_color(&self) -> &'static str {
        self.fill.unwrap_or(self.stroke)
    }

    pub const fn for_classification(class: Classification) -> Self {
        match class {
            Classification::Legal => LEGAL_STYLE,
            Classification::Illegal => ILLEGAL_STYLE,
            Classification::Unknown => UNKNOWN_STYLE,
        }
    }
}

impl Default for LayerStyle {
    fn default() -> Self {
        Self::new("#3388ff", 3.0, 0.2)
    }
}

pub const AOI_STYLE: LayerStyle = LayerStyle::new("#088", 2.0, 0.2);
pub const DETECTED_STYLE: LayerStyle = LayerStyle::new("#f00", 2.0, 0.35);
pub const OUTSIDE_STYLE: LayerStyle = LayerStyle::new("#ff9800", 2.0, 0.5);

pub const LEGAL_STYLE: LayerStyle = LayerStyle::new("#16a34a", 2.0, 0.7).with_fill("#22c55e");
pub const ILLEGAL_STYLE: LayerStyle = LayerStyle::new("#dc2626", 2.0, 0.7).with_fill("#ef4444");
pub const UNKNOWN_STYLE: LayerStyle = LayerStyle::new("#64748b", 2.0, 0.5).with_fill("#94a3b8");

// Reference boundary in the results viewer: outline only.
pub const REFERENCE_AOI_STYLE: LayerStyle = LayerStyle::new("#3b82f6", 2.0, 0.0).dashed("8, 8");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fill_falls_back_to_stroke() {
        assert_eq!(AOI_STYLE.fill_color(), "#088");
        assert_eq!(LEGAL_STYLE.fill_color(), "#22c55e");
        assert_eq!(
            LayerStyle::for_classification(Classification::Unknown).fill_opacity,
            0.5
        );
        assert!(!AOI_STYLE.hidden().visible);
    }
}
