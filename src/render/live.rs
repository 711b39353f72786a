//! Live render tree consumed by the interactive front-end. Each component
//! carries its shaped [`Visual`] plus props in the shape the browser charting
//! components expect (`data` rows keyed by `name`/`value`).

use serde::Serialize;
use serde_json::{json, Value};

use crate::layout::document::LayoutDocument;
use crate::layout::presentation::PresentationState;
use crate::layout::registry::{shape, ShapeContext};
use crate::layout::types::{ComponentInstance, ComponentType};
use crate::layout::visual::{palette_color, SeriesChart, Visual};

const GAUGE_TRACK_COLOR: &str = "#e5e7eb";

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveView {
    pub components: Vec<LiveComponent>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveComponent {
    pub id: String,
    #[serde(rename = "type")]
    pub component_type: ComponentType,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query_name: Option<String>,
    pub selected: bool,
    pub binding: bool,
    pub visual: Visual,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chart: Option<ChartProps>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartProps {
    pub element: &'static str,
    pub data: Vec<Value>,
    pub data_key: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name_key: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub series_label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inner_radius: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_angle: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_angle: Option<i32>,
}

impl ChartProps {
    fn new(element: &'static str, data: Vec<Value>, data_key: &'static str) -> Self {
        Self {
            element,
            data,
            data_key,
            name_key: None,
            series_label: None,
            inner_radius: None,
            start_angle: None,
            end_angle: None,
        }
    }
}

pub fn render_live(
    document: &LayoutDocument,
    presentation: &PresentationState,
    ctx: &mut ShapeContext<'_>,
) -> LiveView {
    LiveView {
        components: document
            .components
            .iter()
            .map(|c| render_component(c, presentation, ctx))
            .collect(),
    }
}

pub fn render_component(
    component: &ComponentInstance,
    presentation: &PresentationState,
    ctx: &mut ShapeContext<'_>,
) -> LiveComponent {
    let visual = shape(component, ctx);
    LiveComponent {
        id: component.id.clone(),
        component_type: component.component_type,
        title: component.component_type.title().to_string(),
        query_name: component.query_name.clone(),
        selected: presentation.is_selected(&component.id),
        binding: presentation.is_binding(&component.id),
        chart: chart_props(&visual),
        visual,
    }
}

/// Library props for chart-bearing visuals; `None` for everything else.
pub fn chart_props(visual: &Visual) -> Option<ChartProps> {
    match visual {
        Visual::Series {
            chart,
            series_label,
            points,
        } => {
            let data = points
                .iter()
                .map(|p| match &p.color {
                    Some(fill) => json!({ "name": p.label, "value": p.value, "fill": fill }),
                    None => json!({ "name": p.label, "value": p.value }),
                })
                .collect();
            let element = match chart {
                SeriesChart::Bar => "BarChart",
                SeriesChart::Line => "LineChart",
                SeriesChart::Area => "AreaChart",
                SeriesChart::Pie | SeriesChart::Donut => "PieChart",
                SeriesChart::Radar => "RadarChart",
            };
            let mut props = ChartProps::new(element, data, "value");
            props.name_key = Some("name");
            props.series_label = Some(series_label.clone());
            if *chart == SeriesChart::Donut {
                props.inner_radius = Some(60);
            }
            Some(props)
        }
        Visual::Gauge { label, value, .. } => {
            let data = vec![
                json!({ "name": label, "value": value, "fill": palette_color(0) }),
                json!({ "name": "remaining", "value": 100.0 - value, "fill": GAUGE_TRACK_COLOR }),
            ];
            let mut props = ChartProps::new("PieChart", data, "value");
            props.name_key = Some("name");
            props.inner_radius = Some(60);
            props.start_angle = Some(180);
            props.end_angle = Some(0);
            Some(props)
        }
        Visual::Scatter {
            x_label,
            y_label,
            points,
            ..
        } => {
            let data = points.iter().map(|p| json!({ "x": p.x, "y": p.y })).collect();
            let mut props = ChartProps::new("ScatterChart", data, "y");
            props.series_label = Some(format!("{x_label} vs {y_label}"));
            Some(props)
        }
        Visual::Metric { sparkline, .. } if !sparkline.is_empty() => {
            let data = sparkline.iter().map(|v| json!({ "value": v })).collect();
            Some(ChartProps::new("LineChart", data, "value"))
        }
        _ => None,
    }
}
