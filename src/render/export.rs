//! Standalone HTML export. The document carries its own stylesheet and one
//! inline script that initialises Chart.js (loaded from a CDN) for every
//! chart-bearing component. Nothing in it refers back to the application.
//!
//! Export works from the same shaped visuals as the live view, so labels and
//! values match what the builder showed. Components without data produce no
//! fragment at all.

use chrono::{DateTime, Utc};
use log::{debug, warn};
use serde_json::{json, Value};

use super::html::{document, Element, Node};
use super::live::{render_live, LiveComponent, LiveView};
use crate::layout::document::LayoutDocument;
use crate::layout::encoding::format_number;
use crate::layout::presentation::PresentationState;
use crate::layout::registry::ShapeContext;
use crate::layout::types::AppMeta;
use crate::layout::visual::{palette_color, SeriesChart, Trend, Visual};

const GAUGE_TRACK_COLOR: &str = "#e5e7eb";
const AREA_FILL_COLOR: &str = "rgba(59, 130, 246, 0.2)";

const EXPORT_CSS: &str = r#"
* { box-sizing: border-box; margin: 0; padding: 0; }
body { font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif; background: #f5f5f5; color: #1a1a1a; }
.container { max-width: 1100px; margin: 0 auto; padding: 32px 24px; }
.header { margin-bottom: 24px; }
.header h1 { font-size: 28px; }
.header p { color: #666; margin-top: 6px; }
.component { background: white; border-radius: 12px; box-shadow: 0 2px 8px rgba(0,0,0,0.08); padding: 20px; margin-bottom: 20px; }
.component h3 { font-size: 15px; color: #444; margin-bottom: 12px; }
.chart-wrap { position: relative; height: 300px; }
.sparkline-wrap { position: relative; height: 48px; margin-top: 8px; }
table { width: 100%; border-collapse: collapse; font-size: 14px; }
th, td { text-align: left; padding: 8px 10px; border-bottom: 1px solid #eee; }
th { background: #fafafa; font-weight: 600; }
.table-note { font-size: 12px; color: #888; margin-top: 8px; }
.metric-value { font-size: 36px; font-weight: 700; }
.metric-label { color: #666; font-size: 13px; text-transform: capitalize; }
.trend-up { color: #10b981; }
.trend-down { color: #ef4444; }
.trend-none { color: #999; }
.progress-track { background: #eee; border-radius: 999px; height: 14px; overflow: hidden; }
.progress-fill { height: 100%; border-radius: 999px; }
.progress-label { display: flex; justify-content: space-between; font-size: 13px; margin-bottom: 6px; }
.list-item { display: flex; align-items: center; gap: 10px; padding: 8px 0; border-bottom: 1px solid #f0f0f0; }
.badge { display: inline-flex; width: 24px; height: 24px; border-radius: 50%; background: #eef2ff; color: #3b82f6; align-items: center; justify-content: center; font-size: 12px; font-weight: 600; }
dl { display: grid; grid-template-columns: max-content 1fr; gap: 6px 16px; font-size: 14px; }
dt { color: #666; }
.text-block { white-space: pre-wrap; line-height: 1.5; }
.form-field { margin-bottom: 12px; }
.form-field label { display: block; font-size: 13px; color: #444; margin-bottom: 4px; }
.form-field input { width: 100%; padding: 8px 10px; border: 1px solid #ddd; border-radius: 6px; }
.btn { padding: 10px 20px; border: none; border-radius: 8px; background: #0066cc; color: white; font-size: 14px; }
.footer { text-align: center; color: #999; font-size: 12px; margin-top: 32px; }
"#;

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("Chart configuration could not be serialized: {0}")]
    Serialize(#[from] serde_json::Error),
}

#[derive(Debug, Clone)]
pub struct ExportOptions {
    pub chart_cdn_url: String,
    pub generated_at: DateTime<Utc>,
}

impl ExportOptions {
    pub fn new(chart_cdn_url: impl Into<String>) -> Self {
        Self {
            chart_cdn_url: chart_cdn_url.into(),
            generated_at: Utc::now(),
        }
    }
}

struct Fragment {
    element: Element,
    chart_init: Option<String>,
}

/// Shapes `document` and exports it.
pub fn export_static_html(
    document: &LayoutDocument,
    app: &AppMeta,
    options: &ExportOptions,
    ctx: &mut ShapeContext<'_>,
) -> String {
    let view = render_live(document, &PresentationState::viewer(), ctx);
    export_view(&view, app, options)
}

/// Exports an already shaped view.
pub fn export_view(view: &LiveView, app: &AppMeta, options: &ExportOptions) -> String {
    let mut sections = Vec::new();
    let mut inits = Vec::new();

    for (index, component) in view.components.iter().enumerate() {
        match fragment(component, index) {
            Ok(Some(fragment)) => {
                sections.push(fragment.element);
                inits.extend(fragment.chart_init);
            }
            Ok(None) => debug!("Skipping component {} in export: no data", component.id),
            Err(e) => warn!("Component {} left out of export: {e}", component.id),
        }
    }

    let mut script = String::from("(function () {\n  if (!window.Chart) { return; }\n");
    for init in &inits {
        script.push_str("  ");
        script.push_str(init);
        script.push('\n');
    }
    script.push_str("})();\n");

    let mut header = Element::new("div")
        .class("header")
        .child(Element::new("h1").text(app.name.clone()));
    if let Some(description) = &app.description {
        header = header.child(Element::new("p").text(description.clone()));
    }

    let root = Element::new("html")
        .attr("lang", "en")
        .child(
            Element::new("head")
                .child(Element::new("meta").attr("charset", "UTF-8"))
                .child(
                    Element::new("meta")
                        .attr("name", "viewport")
                        .attr("content", "width=device-width, initial-scale=1.0"),
                )
                .child(Element::new("title").text(app.name.clone()))
                .child(Element::new("style").child(Node::Static(EXPORT_CSS)))
                .child(Element::new("script").attr("src", options.chart_cdn_url.clone())),
        )
        .child(
            Element::new("body")
                .child(
                    Element::new("div")
                        .class("container")
                        .child(header)
                        .children(sections)
                        .child(Element::new("div").class("footer").text(format!(
                            "Generated {}",
                            options.generated_at.format("%Y-%m-%d %H:%M UTC")
                        ))),
                )
                .child(Element::new("script").child(Node::Script(script))),
        );

    document(&root)
}

fn section(component: &LiveComponent) -> Element {
    let heading = component
        .query_name
        .clone()
        .unwrap_or_else(|| component.title.clone());
    Element::new("section")
        .class(format!("component component-{}", component.component_type))
        .attr("data-component-id", component.id.clone())
        .child(Element::new("h3").text(heading))
}

/// JSON safe to place inside an inline `<script>`: no `<`, `>` or `&` survive,
/// so row data cannot open comments or tags in the script body.
fn script_json<T: serde::Serialize + ?Sized>(value: &T) -> Result<String, ExportError> {
    let raw = serde_json::to_string(value)?;
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '<' => out.push_str("\\u003c"),
            '>' => out.push_str("\\u003e"),
            '&' => out.push_str("\\u0026"),
            _ => out.push(ch),
        }
    }
    Ok(out)
}

fn chart_call(canvas_id: &str, config: &Value) -> Result<String, ExportError> {
    Ok(format!(
        "new Chart(document.getElementById({}), {});",
        script_json(canvas_id)?,
        script_json(config)?
    ))
}

fn canvas(canvas_id: &str) -> Element {
    Element::new("div")
        .class("chart-wrap")
        .child(Element::new("canvas").attr("id", canvas_id.to_string()))
}

fn fragment(component: &LiveComponent, index: usize) -> Result<Option<Fragment>, ExportError> {
    let canvas_id = format!("chart-{index}");
    let base = section(component);

    let fragment = match &component.visual {
        Visual::Placeholder { .. } => return Ok(None),
        Visual::Series {
            chart,
            series_label,
            points,
        } => {
            if points.is_empty() {
                return Ok(None);
            }
            let labels: Vec<&str> = points.iter().map(|p| p.label.as_str()).collect();
            let values: Vec<Option<f64>> = points.iter().map(|p| p.value).collect();
            let colors: Vec<&str> = points
                .iter()
                .enumerate()
                .map(|(i, p)| p.color.as_deref().unwrap_or_else(|| palette_color(i)))
                .collect();
            let config = series_config(*chart, series_label, &labels, &values, &colors);
            Fragment {
                element: base.child(canvas(&canvas_id)),
                chart_init: Some(chart_call(&canvas_id, &config)?),
            }
        }
        Visual::Gauge {
            label,
            value,
            display,
        } => {
            let config = json!({
                "type": "doughnut",
                "data": {
                    "labels": [label, "remaining"],
                    "datasets": [{
                        "data": [value, 100.0 - value],
                        "backgroundColor": [palette_color(0), GAUGE_TRACK_COLOR],
                        "borderWidth": 0
                    }]
                },
                "options": {
                    "responsive": true,
                    "maintainAspectRatio": false,
                    "circumference": 180,
                    "rotation": 270,
                    "cutout": "70%",
                    "plugins": { "legend": { "display": false }, "tooltip": { "enabled": false } }
                }
            });
            Fragment {
                element: base
                    .child(canvas(&canvas_id))
                    .child(Element::new("div").class("metric-value").text(display.clone()))
                    .child(Element::new("div").class("metric-label").text(label.clone())),
                chart_init: Some(chart_call(&canvas_id, &config)?),
            }
        }
        Visual::Scatter {
            x_label,
            y_label,
            points,
            ..
        } => {
            let data: Vec<Value> = points.iter().map(|p| json!({ "x": p.x, "y": p.y })).collect();
            let config = json!({
                "type": "scatter",
                "data": {
                    "datasets": [{
                        "label": format!("{x_label} vs {y_label}"),
                        "data": data,
                        "backgroundColor": palette_color(0)
                    }]
                },
                "options": {
                    "responsive": true,
                    "maintainAspectRatio": false,
                    "scales": {
                        "x": { "title": { "display": true, "text": x_label } },
                        "y": { "title": { "display": true, "text": y_label } }
                    }
                }
            });
            Fragment {
                element: base.child(canvas(&canvas_id)),
                chart_init: Some(chart_call(&canvas_id, &config)?),
            }
        }
        Visual::Table {
            columns,
            rows,
            total_rows,
        } => {
            let header_cells = columns.iter().map(|c| Element::new("th").text(c.clone()));
            let head = Element::new("thead").child(Element::new("tr").children(header_cells));
            let body = Element::new("tbody").children(rows.iter().map(|row| {
                let cells = row.iter().map(|cell| Element::new("td").text(cell.clone()));
                Element::new("tr").children(cells)
            }));
            let mut element = base.child(Element::new("table").child(head).child(body));
            if *total_rows > rows.len() {
                element = element.child(
                    Element::new("p")
                        .class("table-note")
                        .text(format!("Showing {} of {} rows", rows.len(), total_rows)),
                );
            }
            Fragment {
                element,
                chart_init: None,
            }
        }
        Visual::Metric {
            label,
            display,
            trend,
            sparkline,
            ..
        } => {
            let mut element = base
                .child(Element::new("div").class("metric-value").text(display.clone()))
                .child(Element::new("div").class("metric-label").text(label.clone()));
            if let Some(trend) = trend {
                element = element.child(trend_element(trend));
            }
            let mut chart_init = None;
            if !sparkline.is_empty() {
                element = element.child(
                    Element::new("div")
                        .class("sparkline-wrap")
                        .child(Element::new("canvas").attr("id", canvas_id.clone())),
                );
                chart_init = Some(chart_call(&canvas_id, &sparkline_config(sparkline))?);
            }
            Fragment {
                element,
                chart_init,
            }
        }
        Visual::Progress { label, value, band } => Fragment {
            element: base
                .child(
                    Element::new("div")
                        .class("progress-label")
                        .child(Element::new("span").text(label.clone()))
                        .child(
                            Element::new("span")
                                .text(format!("{}%", format_number(value.round()))),
                        ),
                )
                .child(
                    Element::new("div").class("progress-track").child(
                        Element::new("div")
                            .class("progress-fill")
                            .style(format!("width: {value}%; background: {};", band.color())),
                    ),
                ),
            chart_init: None,
        },
        Visual::List { items } => Fragment {
            element: base.children(items.iter().map(|item| {
                Element::new("div")
                    .class("list-item")
                    .child(Element::new("span").class("badge").text(item.index.to_string()))
                    .child(Element::new("span").text(item.text.clone()))
            })),
            chart_init: None,
        },
        Visual::Card { entries } => {
            let mut list = Element::new("dl");
            for entry in entries {
                list = list
                    .child(Element::new("dt").text(entry.key.clone()))
                    .child(Element::new("dd").text(entry.value.clone()));
            }
            Fragment {
                element: base.child(list),
                chart_init: None,
            }
        }
        Visual::Text { content } => Fragment {
            element: base.child(Element::new("div").class("text-block").text(content.clone())),
            chart_init: None,
        },
        Visual::Form { fields, .. } => Fragment {
            element: base.child(Element::new("form").children(fields.iter().map(|f| {
                Element::new("div")
                    .class("form-field")
                    .child(Element::new("label").text(f.label.clone()))
                    .child(
                        Element::new("input")
                            .attr("type", f.input_type.clone())
                            .attr("name", f.name.clone())
                            .attr("disabled", "disabled"),
                    )
            }))),
            chart_init: None,
        },
        Visual::Button { label } => Fragment {
            element: base.child(
                Element::new("button")
                    .class("btn")
                    .attr("type", "button")
                    .text(label.clone()),
            ),
            chart_init: None,
        },
    };

    Ok(Some(fragment))
}

fn trend_element(trend: &Trend) -> Element {
    match trend.percent() {
        Some(percent) if percent >= 0.0 => Element::new("div")
            .class("trend-up")
            .text(format!("▲ {percent:.1}%")),
        Some(percent) => Element::new("div")
            .class("trend-down")
            .text(format!("▼ {:.1}%", percent.abs())),
        None => Element::new("div")
            .class("trend-none")
            .text("Not enough data for a trend"),
    }
}

fn sparkline_config(values: &[f64]) -> Value {
    let labels: Vec<String> = (1..=values.len()).map(|i| i.to_string()).collect();
    json!({
        "type": "line",
        "data": {
            "labels": labels,
            "datasets": [{
                "data": values,
                "borderColor": palette_color(0),
                "borderWidth": 2,
                "pointRadius": 0,
                "fill": false,
                "tension": 0.3
            }]
        },
        "options": {
            "responsive": true,
            "maintainAspectRatio": false,
            "plugins": { "legend": { "display": false }, "tooltip": { "enabled": false } },
            "scales": { "x": { "display": false }, "y": { "display": false } }
        }
    })
}

fn series_config(
    chart: SeriesChart,
    series_label: &str,
    labels: &[&str],
    values: &[Option<f64>],
    slice_colors: &[&str],
) -> Value {
    let (kind, dataset) = match chart {
        SeriesChart::Bar => (
            "bar",
            json!({ "label": series_label, "data": values, "backgroundColor": palette_color(0) }),
        ),
        SeriesChart::Line => (
            "line",
            json!({
                "label": series_label,
                "data": values,
                "borderColor": palette_color(0),
                "fill": false,
                "tension": 0.3
            }),
        ),
        SeriesChart::Area => (
            "line",
            json!({
                "label": series_label,
                "data": values,
                "borderColor": palette_color(0),
                "backgroundColor": AREA_FILL_COLOR,
                "fill": true,
                "tension": 0.3
            }),
        ),
        SeriesChart::Pie => (
            "pie",
            json!({ "label": series_label, "data": values, "backgroundColor": slice_colors }),
        ),
        SeriesChart::Donut => (
            "doughnut",
            json!({ "label": series_label, "data": values, "backgroundColor": slice_colors }),
        ),
        SeriesChart::Radar => (
            "radar",
            json!({
                "label": series_label,
                "data": values,
                "borderColor": palette_color(0),
                "backgroundColor": AREA_FILL_COLOR
            }),
        ),
    };
    let legend = matches!(chart, SeriesChart::Pie | SeriesChart::Donut);

    json!({
        "type": kind,
        "data": { "labels": labels, "datasets": [dataset] },
        "options": {
            "responsive": true,
            "maintainAspectRatio": false,
            "plugins": { "legend": { "display": legend } }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::registry::TrendFallback;
    use crate::layout::types::{ComponentInstance, ComponentType, Row};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn rows(value: Value) -> Vec<Row> {
        serde_json::from_value(value).unwrap()
    }

    fn options() -> ExportOptions {
        ExportOptions {
            chart_cdn_url: "https://cdn.example/chart.js".into(),
            generated_at: DateTime::parse_from_rfc3339("2026-01-02T03:04:05Z")
                .unwrap()
                .with_timezone(&Utc),
        }
    }

    fn export(doc: &LayoutDocument) -> String {
        let mut rng = StdRng::seed_from_u64(3);
        let mut ctx = ShapeContext::new(&mut rng, TrendFallback::Insufficient);
        let app = AppMeta {
            name: "Ops <Board>".into(),
            description: None,
        };
        export_static_html(doc, &app, &options(), &mut ctx)
    }

    #[test]
    fn test_pie_export_uses_shared_labels_and_palette() {
        let sales = rows(json!([
            {"region": "West", "sales": 120},
            {"region": "East", "sales": 95}
        ]));
        let pie = ComponentInstance::new("p", ComponentType::PieChart).with_data(sales);
        let doc = LayoutDocument::new(vec![pie]);
        let html = export(&doc);

        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("<title>Ops &lt;Board&gt;</title>"));
        assert!(html.contains("<script src=\"https://cdn.example/chart.js\"></script>"));
        assert!(html.contains("<canvas id=\"chart-0\"></canvas>"));
        assert!(html.contains(r#"new Chart(document.getElementById("chart-0"), {"type":"pie""#));
        assert!(html.contains(r#""labels":["West","East"]"#));
        assert!(html.contains(r#""data":[120.0,95.0]"#));
        assert!(html.contains(&format!(
            r#""backgroundColor":["{}","{}"]"#,
            palette_color(0),
            palette_color(1)
        )));
        assert!(html.contains("Generated 2026-01-02 03:04 UTC"));
    }

    #[test]
    fn test_components_without_data_are_skipped() {
        let doc = LayoutDocument::new(vec![
            ComponentInstance::new("empty", ComponentType::Chart).with_query("q").with_data(vec![]),
            ComponentInstance::new("unbound", ComponentType::Gauge),
            ComponentInstance::new("txt", ComponentType::Text).with_config("content", "Quarterly"),
        ]);
        let html = export(&doc);
        assert!(!html.contains("data-component-id=\"empty\""));
        assert!(!html.contains("data-component-id=\"unbound\""));
        assert!(html.contains("data-component-id=\"txt\""));
        assert!(html.contains("Quarterly"));
        assert!(!html.contains("new Chart("));
    }

    #[test]
    fn test_cell_content_cannot_inject_markup() {
        let doc = LayoutDocument::new(vec![
            ComponentInstance::new("t", ComponentType::Table)
                .with_data(rows(json!([{"name": "<img src=x onerror=alert(1)>"}]))),
            ComponentInstance::new("c", ComponentType::Chart)
                .with_data(rows(json!([{"name": "</script><script>alert(1)</script>", "v": 1}]))),
        ]);
        let html = export(&doc);
        assert!(!html.contains("<img src=x"));
        assert!(html.contains("&lt;img src=x onerror=alert(1)&gt;"));
        assert_eq!(html.matches("</script>").count(), 2);
    }

    #[test]
    fn test_script_body_has_no_raw_markup_from_rows() {
        let doc = LayoutDocument::new(vec![ComponentInstance::new("c", ComponentType::Chart)
            .with_data(rows(json!([{"name": "<!--<script>", "v": 1}, {"name": "a&b", "v": 2}])))]);
        let html = export(&doc);

        let start = html.find("(function () {").unwrap();
        let end = start + html[start..].find("</script>").unwrap();
        let body = &html[start..end];
        assert!(!body.contains('<'));
        assert!(!body.contains('>'));
        assert!(!body.contains('&'));
        assert!(body.contains(r#""labels":["\u003c!--\u003cscript\u003e","a\u0026b"]"#));
        assert!(html.contains("Generated 2026-01-02 03:04 UTC"));
        assert!(html.trim_end().ends_with("</html>"));
    }

    #[test]
    fn test_gauge_and_table_fragments() {
        let many: Vec<Value> = (0..12).map(|i| json!({"id": i})).collect();
        let doc = LayoutDocument::new(vec![
            ComponentInstance::new("g", ComponentType::Gauge)
                .with_data(rows(json!([{"completion": 137}]))),
            ComponentInstance::new("t", ComponentType::Table).with_data(rows(Value::Array(many))),
        ]);
        let html = export(&doc);
        assert!(html.contains("<div class=\"metric-value\">100%</div>"));
        assert!(html.contains(r#""circumference":180"#));
        assert!(html.contains(r#""data":[100.0,0.0]"#));
        assert!(html.contains("Showing 10 of 12 rows"));
    }

    #[test]
    fn test_metric_trend_text() {
        let doc = LayoutDocument::new(vec![
            ComponentInstance::new("m", ComponentType::MetricCard)
                .with_data(rows(json!([{"revenue": 90}, {"revenue": 100}]))),
            ComponentInstance::new("n", ComponentType::MetricCard)
                .with_data(rows(json!([{"revenue": 1}]))),
            ComponentInstance::new("k", ComponentType::Kpi)
                .with_data(rows(json!([{"revenue": 7}]))),
        ]);
        let html = export(&doc);
        assert!(html.contains("▼ 10.0%"));
        assert!(html.contains("Not enough data for a trend"));
    }

    #[test]
    fn test_metric_card_sparkline_matches_live_view() {
        let doc = LayoutDocument::new(vec![ComponentInstance::new("m", ComponentType::MetricCard)
            .with_data(rows(json!([{"revenue": 90}, {"revenue": 100}])))]);
        let html = export(&doc);
        let canvas = r#"<div class="sparkline-wrap"><canvas id="chart-0"></canvas></div>"#;
        assert!(html.contains(canvas));
        assert!(html.contains(r#""type":"line""#));
        assert!(html.contains(r#""data":[100.0,90.0]"#));

        let kpi = LayoutDocument::new(vec![ComponentInstance::new("k", ComponentType::Kpi)
            .with_data(rows(json!([{"revenue": 7}])))]);
        assert!(!export(&kpi).contains("new Chart("));
    }
}
