use serde::{Deserialize, Serialize};

pub const NO_DATA_MESSAGE: &str = "No data available";
pub const UNBOUND_MESSAGE: &str = "Bind a query to display data";

/// Fixed slice palette, indexed by `row index mod 8`.
pub const PALETTE: [&str; 8] = [
    "#3b82f6", "#10b981", "#f59e0b", "#ef4444", "#8b5cf6", "#ec4899", "#06b6d4", "#84cc16",
];

pub fn palette_color(index: usize) -> &'static str {
    PALETTE[index % PALETTE.len()]
}

/// Renderer-neutral output of shaping one component. Both the live render tree
/// and the static export are produced from this and nothing else.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Visual {
    Placeholder {
        message: String,
    },
    Table {
        columns: Vec<String>,
        rows: Vec<Vec<String>>,
        total_rows: usize,
    },
    Series {
        chart: SeriesChart,
        series_label: String,
        points: Vec<SeriesPoint>,
    },
    Gauge {
        label: String,
        value: f64,
        display: String,
    },
    Scatter {
        x_label: String,
        y_label: String,
        points: Vec<ScatterPoint>,
        x_fallback: bool,
        y_fallback: bool,
    },
    Metric {
        variant: MetricVariant,
        label: String,
        value: f64,
        display: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        trend: Option<Trend>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        sparkline: Vec<f64>,
    },
    Progress {
        label: String,
        value: f64,
        band: ProgressBand,
    },
    List {
        items: Vec<ListItem>,
    },
    Card {
        entries: Vec<CardEntry>,
    },
    Text {
        content: String,
    },
    Form {
        fields: Vec<FormField>,
        from_data: bool,
    },
    Button {
        label: String,
    },
}

impl Visual {
    pub fn placeholder(message: &str) -> Self {
        Self::Placeholder {
            message: message.to_string(),
        }
    }

    pub fn is_placeholder(&self) -> bool {
        matches!(self, Self::Placeholder { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeriesChart {
    Bar,
    Line,
    Area,
    Pie,
    Donut,
    Radar,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesPoint {
    pub label: String,
    /// `None` is a gap: the cell was missing or not a number.
    pub value: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScatterPoint {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricVariant {
    MetricCard,
    Kpi,
    Stat,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum Trend {
    /// Change between the first two rows, in percent.
    Change { percent: f64 },
    /// Legacy display value shown when no real trend can be computed.
    Placeholder { percent: f64 },
    Insufficient,
}

impl Trend {
    pub fn percent(&self) -> Option<f64> {
        match self {
            Self::Change { percent } | Self::Placeholder { percent } => Some(*percent),
            Self::Insufficient => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgressBand {
    High,
    Medium,
    Low,
    Critical,
}

impl ProgressBand {
    pub fn for_value(value: f64) -> Self {
        if value >= 75.0 {
            Self::High
        } else if value >= 50.0 {
            Self::Medium
        } else if value >= 25.0 {
            Self::Low
        } else {
            Self::Critical
        }
    }

    pub fn color(&self) -> &'static str {
        match self {
            Self::High => "#10b981",
            Self::Medium => "#3b82f6",
            Self::Low => "#f59e0b",
            Self::Critical => "#ef4444",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListItem {
    pub index: usize,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CardEntry {
    pub key: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormField {
    pub name: String,
    pub label: String,
    pub input_type: String,
}
