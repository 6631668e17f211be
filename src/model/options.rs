use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{GanttError, GanttResult};

/// Controls the time granularity of the timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ViewMode {
    Hour,
    #[serde(rename = "Quarter Day")]
    QuarterDay,
    #[serde(rename = "Half Day")]
    HalfDay,
    Day,
    Week,
    Month,
    Max,
}

impl ViewMode {
    pub const ALL: [ViewMode; 7] = [
        ViewMode::Hour,
        ViewMode::QuarterDay,
        ViewMode::HalfDay,
        ViewMode::Day,
        ViewMode::Week,
        ViewMode::Month,
        ViewMode::Max,
    ];

    pub fn label(self) -> &'static str {
        match self {
            ViewMode::Hour => "Hour",
            ViewMode::QuarterDay => "Quarter Day",
            ViewMode::HalfDay => "Half Day",
            ViewMode::Day => "Day",
            ViewMode::Week => "Week",
            ViewMode::Month => "Month",
            ViewMode::Max => "Max",
        }
    }

    /// Month and Max share the nominal 30-day month conversion.
    pub fn is_monthly(self) -> bool {
        matches!(self, ViewMode::Month | ViewMode::Max)
    }

    /// Sub-day views pad the chart by a single day.
    pub fn is_sub_day(self) -> bool {
        matches!(self, ViewMode::Hour | ViewMode::QuarterDay | ViewMode::HalfDay)
    }
}

impl fmt::Display for ViewMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for ViewMode {
    type Err = GanttError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .chars()
            .filter(|c| !matches!(c, ' ' | '-' | '_'))
            .collect::<String>()
            .to_lowercase();
        ViewMode::ALL
            .into_iter()
            .find(|mode| mode.label().replace(' ', "").to_lowercase() == normalized)
            .ok_or_else(|| GanttError::UnknownViewMode(s.to_string()))
    }
}

/// Construction options.
///
/// `column_width` and `step` are superseded by the view-mode lookup once a
/// scale is computed; they are kept so callers can round-trip their options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GanttOptions {
    pub header_height: f64,
    pub column_width: f64,
    pub step: f64,
    pub bar_height: f64,
    pub bar_corner_radius: f64,
    pub padding: f64,
    pub view_mode: ViewMode,
    pub date_format: String,
    /// Width of the visible chart area, used by the Max view.
    pub viewport_width: f64,
    /// Height of the visible chart area; empty rows fill it.
    pub viewport_height: f64,
    /// Unrecognized keys, carried through untouched.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Default for GanttOptions {
    fn default() -> Self {
        Self {
            header_height: 50.0,
            column_width: 30.0,
            step: 24.0,
            bar_height: 20.0,
            bar_corner_radius: 1.0,
            padding: 18.0,
            view_mode: ViewMode::Day,
            date_format: "YYYY-MM-DD".to_string(),
            viewport_width: 1200.0,
            viewport_height: 0.0,
            extra: serde_json::Map::new(),
        }
    }
}

impl GanttOptions {
    pub fn with_view_mode(mut self, mode: ViewMode) -> Self {
        self.view_mode = mode;
        self
    }

    pub fn with_viewport(mut self, width: f64, height: f64) -> Self {
        self.viewport_width = width;
        self.viewport_height = height;
        self
    }

    /// Height of one row slot: a bar plus the padding under it.
    pub fn row_height(&self) -> f64 {
        self.bar_height + self.padding
    }

    /// `date_format` as a strftime pattern for [`DateMath::format`](crate::date_math::DateMath::format).
    ///
    /// Understands `YYYY`, `YY`, `MMMM`, `MMM`, `MM`, `DD`, `D`, `HH`, `mm` and `ss`;
    /// anything else is copied through.
    pub fn date_pattern(&self) -> String {
        const TOKENS: [(&str, &str); 10] = [
            ("YYYY", "%Y"),
            ("MMMM", "%B"),
            ("MMM", "%b"),
            ("YY", "%y"),
            ("MM", "%m"),
            ("DD", "%d"),
            ("HH", "%H"),
            ("mm", "%M"),
            ("ss", "%S"),
            ("D", "%-d"),
        ];
        let mut out = String::with_capacity(self.date_format.len() * 2);
        let mut rest = self.date_format.as_str();
        'scan: while !rest.is_empty() {
            for (token, pattern) in TOKENS {
                if let Some(tail) = rest.strip_prefix(token) {
                    out.push_str(pattern);
                    rest = tail;
                    continue 'scan;
                }
            }
            let mut chars = rest.chars();
            if let Some(c) = chars.next() {
                if c == '%' {
                    out.push_str("%%");
                } else {
                    out.push(c);
                }
            }
            rest = chars.as_str();
        }
        out
    }

    /// Rejects sizes that would make the layout meaningless.
    pub fn validate(&self) -> GanttResult<()> {
        let positive = [
            ("header_height", self.header_height, true),
            ("column_width", self.column_width, false),
            ("step", self.step, false),
            ("bar_height", self.bar_height, false),
            ("bar_corner_radius", self.bar_corner_radius, true),
            ("padding", self.padding, true),
            ("viewport_width", self.viewport_width, true),
            ("viewport_height", self.viewport_height, true),
        ];
        for (name, value, zero_ok) in positive {
            let ok = value.is_finite() && (value > 0.0 || (zero_ok && value == 0.0));
            if !ok {
                return Err(GanttError::InvalidOption { name, value });
            }
        }
        if self.view_mode == ViewMode::Max && self.viewport_width <= 200.0 {
            return Err(GanttError::ViewportTooNarrow {
                width: self.viewport_width,
            });
        }
        Ok(())
    }
}
