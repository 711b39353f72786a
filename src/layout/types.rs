use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One query result row. Key order is the column order reported by the backend.
pub type Row = serde_json::Map<String, Value>;

pub const DEFAULT_TEXT_CONTENT: &str = "Edit this text...";
pub const DEFAULT_BUTTON_LABEL: &str = "Button";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub enum ComponentType {
    Table,
    Chart,
    LineChart,
    PieChart,
    AreaChart,
    DonutChart,
    Gauge,
    ScatterChart,
    RadarChart,
    MetricCard,
    Card,
    Stat,
    Kpi,
    Progress,
    List,
    Text,
    Form,
    Button,
}

impl ComponentType {
    pub const ALL: [ComponentType; 18] = [
        Self::Table,
        Self::Chart,
        Self::LineChart,
        Self::PieChart,
        Self::AreaChart,
        Self::DonutChart,
        Self::Gauge,
        Self::ScatterChart,
        Self::RadarChart,
        Self::MetricCard,
        Self::Card,
        Self::Stat,
        Self::Kpi,
        Self::Progress,
        Self::List,
        Self::Text,
        Self::Form,
        Self::Button,
    ];

    /// Human label used for component headers.
    pub fn title(&self) -> &'static str {
        match self {
            Self::Table => "Table",
            Self::Chart => "Bar Chart",
            Self::LineChart => "Line Chart",
            Self::PieChart => "Pie Chart",
            Self::AreaChart => "Area Chart",
            Self::DonutChart => "Donut Chart",
            Self::Gauge => "Gauge",
            Self::ScatterChart => "Scatter Chart",
            Self::RadarChart => "Radar Chart",
            Self::MetricCard => "Metric Card",
            Self::Card => "Card",
            Self::Stat => "Stat",
            Self::Kpi => "KPI",
            Self::Progress => "Progress",
            Self::List => "List",
            Self::Text => "Text",
            Self::Form => "Form",
            Self::Button => "Button",
        }
    }
}

impl std::fmt::Display for ComponentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Table => "table",
            Self::Chart => "chart",
            Self::LineChart => "lineChart",
            Self::PieChart => "pieChart",
            Self::AreaChart => "areaChart",
            Self::DonutChart => "donutChart",
            Self::Gauge => "gauge",
            Self::ScatterChart => "scatterChart",
            Self::RadarChart => "radarChart",
            Self::MetricCard => "metricCard",
            Self::Card => "card",
            Self::Stat => "stat",
            Self::Kpi => "kpi",
            Self::Progress => "progress",
            Self::List => "list",
            Self::Text => "text",
            Self::Form => "form",
            Self::Button => "button",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for ComponentType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "table" => Ok(Self::Table),
            "chart" => Ok(Self::Chart),
            "lineChart" => Ok(Self::LineChart),
            "pieChart" => Ok(Self::PieChart),
            "areaChart" => Ok(Self::AreaChart),
            "donutChart" => Ok(Self::DonutChart),
            "gauge" => Ok(Self::Gauge),
            "scatterChart" => Ok(Self::ScatterChart),
            "radarChart" => Ok(Self::RadarChart),
            "metricCard" => Ok(Self::MetricCard),
            "card" => Ok(Self::Card),
            "stat" => Ok(Self::Stat),
            "kpi" => Ok(Self::Kpi),
            "progress" => Ok(Self::Progress),
            "list" => Ok(Self::List),
            "text" => Ok(Self::Text),
            "form" => Ok(Self::Form),
            "button" => Ok(Self::Button),
            _ => Err(format!("Unknown component type: {s}")),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ComponentInstance {
    pub id: String,
    #[serde(rename = "type")]
    pub component_type: ComponentType,
    #[serde(default)]
    pub query_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query_name: Option<String>,
    #[serde(default)]
    pub config: serde_json::Map<String, Value>,
    /// Latest query result. Never persisted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Vec<Row>>,
}

impl ComponentInstance {
    pub fn new(id: impl Into<String>, component_type: ComponentType) -> Self {
        Self {
            id: id.into(),
            component_type,
            query_id: None,
            query_name: None,
            config: serde_json::Map::new(),
            data: None,
        }
    }

    pub fn with_query(mut self, query_id: impl Into<String>) -> Self {
        self.query_id = Some(query_id.into());
        self
    }

    pub fn with_config(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.config.insert(key.to_string(), value.into());
        self
    }

    pub fn with_data(mut self, rows: Vec<Row>) -> Self {
        self.data = Some(rows);
        self
    }

    /// Rows when present and non-empty.
    pub fn rows(&self) -> Option<&[Row]> {
        match &self.data {
            Some(rows) if !rows.is_empty() => Some(rows.as_slice()),
            _ => None,
        }
    }

    pub fn config_str(&self, key: &str) -> Option<&str> {
        self.config.get(key).and_then(Value::as_str)
    }

    /// Copy suitable for persistence: identical except `data` is dropped.
    pub fn without_data(&self) -> Self {
        Self {
            data: None,
            ..self.clone()
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct QueryMeta {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub datasource_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppMeta {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// `{success, data, message}` envelope used by every collaborator endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiEnvelope<T> {
    pub success: bool,
    pub data: Option<T>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutPayload {
    #[serde(default)]
    pub layout: Vec<ComponentInstance>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryResultPayload {
    #[serde(default)]
    pub data: Vec<Row>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ExecuteQueryRequest {
    #[serde(default)]
    pub parameters: serde_json::Map<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BindQueryRequest {
    pub query_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportQuery {
    pub title: Option<String>,
}
