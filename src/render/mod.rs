pub mod export;
pub mod html;
pub mod live;

pub use export::{export_static_html, export_view, ExportError, ExportOptions};
pub use live::{render_live, ChartProps, LiveComponent, LiveView};
