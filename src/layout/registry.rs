//! Per-type shaping rules. Every component type registers one
//! [`ComponentShaper`]; the live renderer and the static exporter both go
//! through [`shape`], so the row bounds, column choices and fallbacks below
//! are the single source of truth for what a component shows.

use std::collections::HashMap;

use log::debug;
use once_cell::sync::Lazy;
use rand::{Rng, RngCore};
use serde::{Deserialize, Serialize};

use super::encoding::{
    cell_number, cell_text, display_value, format_number, humanize, infer, Encoding,
};
use super::types::{
    ComponentInstance, ComponentType, Row, DEFAULT_BUTTON_LABEL, DEFAULT_TEXT_CONTENT,
};
use super::visual::{
    palette_color, CardEntry, FormField, ListItem, MetricVariant, ProgressBand, ScatterPoint,
    SeriesChart, SeriesPoint, Trend, Visual, NO_DATA_MESSAGE, UNBOUND_MESSAGE,
};

pub const TABLE_ROW_LIMIT: usize = 10;
pub const BAR_ROW_LIMIT: usize = 10;
pub const LINE_ROW_LIMIT: usize = 20;
pub const SLICE_ROW_LIMIT: usize = 8;
pub const LIST_ROW_LIMIT: usize = 10;
pub const SCATTER_ROW_LIMIT: usize = 50;
pub const TREND_LOOKBACK: usize = 8;
pub const FORM_FIELD_LIMIT: usize = 5;
pub const RADAR_LABEL_CHARS: usize = 15;

const LEGACY_TREND_UP: f64 = 12.5;
const LEGACY_TREND_DOWN: f64 = -8.3;

/// What a metric card shows when fewer than two comparable rows exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendFallback {
    #[default]
    Insufficient,
    /// Randomly pick 12.5 or -8.3, as older dashboards did.
    Placeholder,
}

pub struct ShapeContext<'a> {
    pub rng: &'a mut dyn RngCore,
    pub trend_fallback: TrendFallback,
}

impl<'a> ShapeContext<'a> {
    pub fn new(rng: &'a mut dyn RngCore, trend_fallback: TrendFallback) -> Self {
        Self {
            rng,
            trend_fallback,
        }
    }
}

pub struct ShapeInput<'a> {
    pub component: &'a ComponentInstance,
    pub rows: &'a [Row],
    pub encoding: Option<&'a Encoding>,
}

pub trait ComponentShaper: Send + Sync {
    /// Data-driven shapers are only called with non-empty rows and an encoding.
    fn requires_data(&self) -> bool {
        true
    }

    fn shape(&self, input: ShapeInput<'_>, ctx: &mut ShapeContext<'_>) -> Visual;
}

static REGISTRY: Lazy<HashMap<ComponentType, Box<dyn ComponentShaper>>> = Lazy::new(|| {
    let mut map: HashMap<ComponentType, Box<dyn ComponentShaper>> = HashMap::new();
    map.insert(ComponentType::Table, Box::new(TableShaper));
    map.insert(
        ComponentType::Chart,
        Box::new(SeriesShaper::new(SeriesChart::Bar, BAR_ROW_LIMIT)),
    );
    map.insert(
        ComponentType::LineChart,
        Box::new(SeriesShaper::new(SeriesChart::Line, LINE_ROW_LIMIT)),
    );
    map.insert(
        ComponentType::AreaChart,
        Box::new(SeriesShaper::new(SeriesChart::Area, LINE_ROW_LIMIT)),
    );
    map.insert(
        ComponentType::PieChart,
        Box::new(SeriesShaper::new(SeriesChart::Pie, SLICE_ROW_LIMIT).with_palette()),
    );
    map.insert(
        ComponentType::DonutChart,
        Box::new(SeriesShaper::new(SeriesChart::Donut, SLICE_ROW_LIMIT).with_palette()),
    );
    map.insert(
        ComponentType::RadarChart,
        Box::new(
            SeriesShaper::new(SeriesChart::Radar, SLICE_ROW_LIMIT)
                .with_label_chars(RADAR_LABEL_CHARS),
        ),
    );
    map.insert(ComponentType::Gauge, Box::new(GaugeShaper));
    map.insert(ComponentType::ScatterChart, Box::new(ScatterShaper));
    map.insert(
        ComponentType::MetricCard,
        Box::new(MetricShaper(MetricVariant::MetricCard)),
    );
    map.insert(ComponentType::Kpi, Box::new(MetricShaper(MetricVariant::Kpi)));
    map.insert(ComponentType::Stat, Box::new(MetricShaper(MetricVariant::Stat)));
    map.insert(ComponentType::Progress, Box::new(ProgressShaper));
    map.insert(ComponentType::List, Box::new(ListShaper));
    map.insert(ComponentType::Card, Box::new(CardShaper));
    map.insert(ComponentType::Text, Box::new(TextShaper));
    map.insert(ComponentType::Form, Box::new(FormShaper));
    map.insert(ComponentType::Button, Box::new(ButtonShaper));
    map
});

pub fn shaper_for(component_type: ComponentType) -> Option<&'static dyn ComponentShaper> {
    REGISTRY.get(&component_type).map(|b| b.as_ref())
}

/// Whether a type renders the no-data placeholder when it has no rows.
pub fn requires_data(component_type: ComponentType) -> bool {
    shaper_for(component_type)
        .map(|s| s.requires_data())
        .unwrap_or(true)
}

pub fn shape(component: &ComponentInstance, ctx: &mut ShapeContext<'_>) -> Visual {
    let Some(shaper) = shaper_for(component.component_type) else {
        return Visual::placeholder(NO_DATA_MESSAGE);
    };

    let rows = component.rows().unwrap_or(&[]);
    let encoding = infer(rows);

    if shaper.requires_data() && encoding.is_none() {
        debug!(
            "Component {} ({}) has no usable rows",
            component.id, component.component_type
        );
        let message = if component.query_id.is_none() && component.data.is_none() {
            UNBOUND_MESSAGE
        } else {
            NO_DATA_MESSAGE
        };
        return Visual::placeholder(message);
    }

    shaper.shape(
        ShapeInput {
            component,
            rows,
            encoding: encoding.as_ref(),
        },
        ctx,
    )
}

fn no_data() -> Visual {
    Visual::placeholder(NO_DATA_MESSAGE)
}

fn clamp_percent(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 100.0)
    }
}

struct TableShaper;

impl ComponentShaper for TableShaper {
    fn shape(&self, input: ShapeInput<'_>, _ctx: &mut ShapeContext<'_>) -> Visual {
        let Some(first) = input.rows.first() else {
            return no_data();
        };
        let columns: Vec<String> = first.keys().cloned().collect();
        let rows = input
            .rows
            .iter()
            .take(TABLE_ROW_LIMIT)
            .map(|row| columns.iter().map(|c| cell_text(row, c)).collect())
            .collect();

        Visual::Table {
            columns,
            rows,
            total_rows: input.rows.len(),
        }
    }
}

struct SeriesShaper {
    chart: SeriesChart,
    limit: usize,
    palette: bool,
    label_chars: Option<usize>,
}

impl SeriesShaper {
    fn new(chart: SeriesChart, limit: usize) -> Self {
        Self {
            chart,
            limit,
            palette: false,
            label_chars: None,
        }
    }

    fn with_palette(mut self) -> Self {
        self.palette = true;
        self
    }

    fn with_label_chars(mut self, chars: usize) -> Self {
        self.label_chars = Some(chars);
        self
    }
}

impl ComponentShaper for SeriesShaper {
    fn shape(&self, input: ShapeInput<'_>, _ctx: &mut ShapeContext<'_>) -> Visual {
        let Some(encoding) = input.encoding else {
            return no_data();
        };
        let value_column = encoding.primary_numeric();

        let points = input
            .rows
            .iter()
            .take(self.limit)
            .enumerate()
            .map(|(i, row)| {
                let mut label = cell_text(row, &encoding.label_column);
                if let Some(max) = self.label_chars {
                    label = label.chars().take(max).collect();
                }
                let value = match value_column {
                    Some(column) => cell_number(row, column),
                    None => Some(1.0),
                };
                SeriesPoint {
                    label,
                    value,
                    color: self.palette.then(|| palette_color(i).to_string()),
                }
            })
            .collect();

        Visual::Series {
            chart: self.chart,
            series_label: value_column
                .map(humanize)
                .unwrap_or_else(|| "Count".to_string()),
            points,
        }
    }
}

struct GaugeShaper;

impl ComponentShaper for GaugeShaper {
    fn shape(&self, input: ShapeInput<'_>, _ctx: &mut ShapeContext<'_>) -> Visual {
        let (Some(encoding), Some(first)) = (input.encoding, input.rows.first()) else {
            return no_data();
        };
        let column = encoding.primary_numeric();
        let raw = column.and_then(|c| cell_number(first, c)).unwrap_or(0.0);
        let value = clamp_percent(raw);

        Visual::Gauge {
            label: column.map(humanize).unwrap_or_else(|| "Value".to_string()),
            value,
            display: format!("{}%", format_number(value.round())),
        }
    }
}

struct ScatterShaper;

impl ComponentShaper for ScatterShaper {
    fn shape(&self, input: ShapeInput<'_>, ctx: &mut ShapeContext<'_>) -> Visual {
        let Some(encoding) = input.encoding else {
            return no_data();
        };
        let x_column = encoding.primary_numeric();
        let y_column = encoding.secondary_numeric();

        let mut axis = |row: &Row, column: Option<&str>| -> f64 {
            match column {
                Some(c) => cell_number(row, c).unwrap_or(0.0),
                None => ctx.rng.gen_range(0.0..100.0),
            }
        };

        let points = input
            .rows
            .iter()
            .take(SCATTER_ROW_LIMIT)
            .map(|row| {
                let x = axis(row, x_column);
                let y = axis(row, y_column);
                ScatterPoint { x, y }
            })
            .collect();

        Visual::Scatter {
            x_label: x_column.map(humanize).unwrap_or_else(|| "x".to_string()),
            y_label: y_column.map(humanize).unwrap_or_else(|| "y".to_string()),
            points,
            x_fallback: x_column.is_none(),
            y_fallback: y_column.is_none(),
        }
    }
}

struct MetricShaper(MetricVariant);

impl MetricShaper {
    fn trend(&self, rows: &[Row], column: Option<&str>, ctx: &mut ShapeContext<'_>) -> Trend {
        let computed = column.and_then(|c| {
            let current = cell_number(rows.first()?, c)?;
            let previous = cell_number(rows.get(1)?, c)?;
            if previous == 0.0 {
                return None;
            }
            Some((current - previous) / previous * 100.0)
        });

        match (computed, ctx.trend_fallback) {
            (Some(percent), _) => Trend::Change { percent },
            (None, TrendFallback::Insufficient) => Trend::Insufficient,
            (None, TrendFallback::Placeholder) => Trend::Placeholder {
                percent: if ctx.rng.gen_bool(0.5) {
                    LEGACY_TREND_UP
                } else {
                    LEGACY_TREND_DOWN
                },
            },
        }
    }
}

impl ComponentShaper for MetricShaper {
    fn shape(&self, input: ShapeInput<'_>, ctx: &mut ShapeContext<'_>) -> Visual {
        let (Some(encoding), Some(first)) = (input.encoding, input.rows.first()) else {
            return no_data();
        };
        let column = encoding.primary_numeric();

        let (label, value) = match column {
            Some(c) => (humanize(c), cell_number(first, c).unwrap_or(0.0)),
            None => ("Rows".to_string(), input.rows.len() as f64),
        };

        let (trend, sparkline) = if self.0 == MetricVariant::MetricCard {
            let mut sparkline: Vec<f64> = column
                .map(|c| {
                    input
                        .rows
                        .iter()
                        .take(TREND_LOOKBACK)
                        .filter_map(|row| cell_number(row, c))
                        .collect()
                })
                .unwrap_or_default();
            sparkline.reverse();
            (Some(self.trend(input.rows, column, ctx)), sparkline)
        } else {
            (None, Vec::new())
        };

        Visual::Metric {
            variant: self.0,
            label,
            value,
            display: format_number(value),
            trend,
            sparkline,
        }
    }
}

struct ProgressShaper;

impl ComponentShaper for ProgressShaper {
    fn shape(&self, input: ShapeInput<'_>, _ctx: &mut ShapeContext<'_>) -> Visual {
        let (Some(encoding), Some(first)) = (input.encoding, input.rows.first()) else {
            return no_data();
        };
        let column = encoding.primary_numeric();
        let value = clamp_percent(column.and_then(|c| cell_number(first, c)).unwrap_or(0.0));

        Visual::Progress {
            label: column.map(humanize).unwrap_or_else(|| "Progress".to_string()),
            value,
            band: ProgressBand::for_value(value),
        }
    }
}

struct ListShaper;

impl ComponentShaper for ListShaper {
    fn shape(&self, input: ShapeInput<'_>, _ctx: &mut ShapeContext<'_>) -> Visual {
        let Some(first) = input.rows.first() else {
            return no_data();
        };
        let mut keys = first.keys();
        let Some(first_key) = keys.next() else {
            return no_data();
        };
        let column = keys.next().unwrap_or(first_key);

        let items = input
            .rows
            .iter()
            .take(LIST_ROW_LIMIT)
            .enumerate()
            .map(|(i, row)| ListItem {
                index: i + 1,
                text: cell_text(row, column),
            })
            .collect();

        Visual::List { items }
    }
}

struct CardShaper;

impl ComponentShaper for CardShaper {
    fn shape(&self, input: ShapeInput<'_>, _ctx: &mut ShapeContext<'_>) -> Visual {
        let Some(first) = input.rows.first() else {
            return no_data();
        };
        let entries = first
            .iter()
            .map(|(key, value)| CardEntry {
                key: key.clone(),
                value: display_value(value),
            })
            .collect();

        Visual::Card { entries }
    }
}

struct TextShaper;

impl ComponentShaper for TextShaper {
    fn requires_data(&self) -> bool {
        false
    }

    fn shape(&self, input: ShapeInput<'_>, _ctx: &mut ShapeContext<'_>) -> Visual {
        Visual::Text {
            content: input
                .component
                .config_str("content")
                .unwrap_or(DEFAULT_TEXT_CONTENT)
                .to_string(),
        }
    }
}

struct FormShaper;

impl FormShaper {
    fn placeholder_fields() -> Vec<FormField> {
        vec![
            FormField {
                name: "name".to_string(),
                label: "Name".to_string(),
                input_type: "text".to_string(),
            },
            FormField {
                name: "email".to_string(),
                label: "Email".to_string(),
                input_type: "email".to_string(),
            },
        ]
    }
}

impl ComponentShaper for FormShaper {
    fn requires_data(&self) -> bool {
        false
    }

    fn shape(&self, input: ShapeInput<'_>, _ctx: &mut ShapeContext<'_>) -> Visual {
        let fields: Vec<FormField> = input
            .rows
            .first()
            .map(|first| {
                first
                    .iter()
                    .take(FORM_FIELD_LIMIT)
                    .map(|(key, value)| FormField {
                        name: key.clone(),
                        label: humanize(key),
                        input_type: if value.is_number() { "number" } else { "text" }.to_string(),
                    })
                    .collect()
            })
            .unwrap_or_default();

        if fields.is_empty() {
            Visual::Form {
                fields: Self::placeholder_fields(),
                from_data: false,
            }
        } else {
            Visual::Form {
                fields,
                from_data: true,
            }
        }
    }
}

struct ButtonShaper;

impl ComponentShaper for ButtonShaper {
    fn requires_data(&self) -> bool {
        false
    }

    fn shape(&self, input: ShapeInput<'_>, _ctx: &mut ShapeContext<'_>) -> Visual {
        let label = input
            .component
            .config_str("label")
            .or_else(|| input.component.config_str("text"))
            .unwrap_or(DEFAULT_BUTTON_LABEL);
        Visual::Button {
            label: label.to_string(),
        }
    }
}
