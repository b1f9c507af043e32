use serde::{Deserialize, Serialize};

/// `comparison.json` as served. The backend answers `{}` (or omits `detected_area_m2`) while
/// processing is not finished, so every field is optional on the wire.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ComparisonPayload {
    #[serde(default)]
    pub detected_area_m2: Option<f64>,
    #[serde(default)]
    pub outside_area_m2: Option<f64>,
    #[serde(default)]
    pub pct_outside: Option<f64>,
    #[serde(default)]
    pub time_start: Option<String>,
    #[serde(default)]
    pub time_end: Option<String>,
}

impl ComparisonPayload {
    /// `Some` once `detected_area_m2` is defined.
    pub fn into_summary(self) -> Option<ComparisonSummary> {
        let detected_area_m2 = self.detected_area_m2?;
        Some(ComparisonSummary {
            detected_area_m2,
            outside_area_m2: self.outside_area_m2.unwrap_or(0.0),
            pct_outside: self.pct_outside.unwrap_or(0.0),
            time_start: self.time_start,
            time_end: self.time_end,
        })
    }
}

/// Aggregate legal/illegal area statistics for the current AOI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonSummary {
    pub detected_area_m2: f64,
    pub outside_area_m2: f64,
    pub pct_outside: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_start: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_end: Option<String>,
}

impl ComparisonSummary {
    pub fn has_outside_activity(&self) -> bool {
        self.pct_outside > 0.0
    }

    /// Detected and outside areas as percentages of their sum, each capped at 100.
    pub fn area_shares(&self) -> (f64, f64) {
        let total = self.detected_area_m2 + self.outside_area_m2;
        let total = if total == 0.0 { 1.0 } else { total };
        (
            (self.detected_area_m2 / total * 100.0).min(100.0),
            (self.outside_area_m2 / total * 100.0).min(100.0),
        )
    }

    pub fn time_range(&self) -> Option<(&str, &str)> {
        Some((self.time_start.as_deref()?, self.time_end.as_deref()?))
    }
}
