//! Choropleth rendering
//!
//! The map itself is drawn by Plotly. [`PlotlyRenderer`] turns a
//! [`ChoroplethReport`] into a Plotly figure document which the exporter
//! writes out as JSON or wraps in a standalone HTML page.

use crate::report::ChoroplethReport;
use crate::Result;
use serde::{Deserialize, Serialize};
use serde_json::json;

/// plotly.js bundle loaded by the standalone HTML page
pub const PLOTLY_CDN: &str = "https://cdn.plot.ly/plotly-2.35.2.min.js";

/// Turns a report into a displayable figure
pub trait Renderer {
    fn render(&self, report: &ChoroplethReport) -> Result<Figure>;
}

/// Plotly figure document (`{"data": [...], "layout": {...}}`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Figure(pub serde_json::Value);

impl Figure {
    pub fn title(&self) -> &str {
        self.0["layout"]["title"]["text"].as_str().unwrap_or_default()
    }

    /// Export as JSON
    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(&self.0).unwrap_or_default()
    }

    /// Standalone interactive page
    pub fn to_html(&self) -> String {
        // "</" inside the inline script would close the tag early
        let figure = serde_json::to_string(&self.0)
            .unwrap_or_default()
            .replace("</", "<\\/");

        format!(
            r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<title>{title}</title>
<script src="{cdn}" charset="utf-8"></script>
<style>html, body {{ margin: 0; height: 100%; }}</style>
</head>
<body>
<div id="atlas" style="width: 100%; height: 100vh;"></div>
<script>
const figure = {figure};
Plotly.newPlot("atlas", figure.data, figure.layout, {{ responsive: true }});
</script>
</body>
</html>
"#,
            title = escape_html(self.title()),
            cdn = PLOTLY_CDN,
            figure = figure,
        )
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PlotlyRenderer;

impl Renderer for PlotlyRenderer {
    fn render(&self, report: &ChoroplethReport) -> Result<Figure> {
        let config = &report.config;
        let axis = &report.color_axis;

        let locations: Vec<&str> = report.rows.iter().map(|r| r.location.as_str()).collect();
        let counts: Vec<usize> = report.rows.iter().map(|r| r.count).collect();
        let labels: Vec<&str> = report.rows.iter().map(|r| r.label.as_str()).collect();

        let tickvals: Vec<f64> = axis.ticks.iter().map(|t| t.value).collect();
        let mut ticktext: Vec<String> = axis.ticks.iter().map(|t| t.label.clone()).collect();
        // Push the top label clear of the colorbar title
        if let Some(last) = ticktext.last_mut() {
            last.insert_str(0, "<br>");
        }

        let figure = json!({
            "data": [{
                "type": "choropleth",
                "locations": locations,
                "locationmode": config.location_mode.as_plotly(),
                "z": counts,
                "text": labels,
                "hovertemplate": "<b>%{text}</b><br>count=%{z}<extra></extra>",
                "coloraxis": "coloraxis"
            }],
            "layout": {
                "title": { "text": config.title },
                "coloraxis": {
                    "colorscale": config.color_scale,
                    "cmin": axis.min,
                    "cmax": axis.max,
                    "colorbar": {
                        "title": { "text": config.colorbar_title },
                        "tickvals": tickvals,
                        "ticktext": ticktext
                    }
                },
                "geo": {
                    "showframe": false,
                    "showcoastlines": true,
                    "projection": { "type": "natural earth" }
                },
                "margin": { "l": 0, "r": 0, "t": 60, "b": 0 }
            }
        });

        Ok(Figure(figure))
    }
}

fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::{ColorAxis, ReportConfig, ReportMetadata, ReportRow};
    use crate::LocationMode;

    fn report(config: ReportConfig) -> ChoroplethReport {
        ChoroplethReport {
            config,
            rows: vec![
                ReportRow {
                    location: "USA".to_string(),
                    count: 9,
                    label: "USA".to_string(),
                },
                ReportRow {
                    location: "France".to_string(),
                    count: 2,
                    label: "France".to_string(),
                },
            ],
            color_axis: ColorAxis::new(1, 9),
            metadata: ReportMetadata {
                total_laureates: 11,
                mapped_laureates: 11,
                countries: 2,
                generated_at: "2024-01-01T00:00:00+00:00".to_string(),
            },
        }
    }

    #[test]
    fn test_choropleth_trace() {
        let figure = PlotlyRenderer.render(&report(ReportConfig::default())).unwrap();
        let trace = &figure.0["data"][0];

        assert_eq!(trace["type"], "choropleth");
        assert_eq!(trace["locationmode"], "country names");
        assert_eq!(trace["locations"], json!(["USA", "France"]));
        assert_eq!(trace["z"], json!([9, 2]));
        assert_eq!(figure.title(), "Number of Nobel Prize Winners by Country of Birth");
    }

    #[test]
    fn test_color_axis_layout() {
        let figure = PlotlyRenderer.render(&report(ReportConfig::default())).unwrap();
        let axis = &figure.0["layout"]["coloraxis"];

        assert_eq!(axis["colorscale"], "Viridis");
        assert_eq!(axis["cmin"], 1);
        assert_eq!(axis["cmax"], 9);
        assert_eq!(axis["colorbar"]["title"]["text"], "Count");
        assert_eq!(axis["colorbar"]["tickvals"], json!([1.0, 4.5, 9.0]));
        assert_eq!(
            axis["colorbar"]["ticktext"],
            json!(["1 (Min)", "4 (Medium)", "<br>9 (Max)"])
        );
    }

    #[test]
    fn test_iso3_location_mode() {
        let config = ReportConfig {
            location_mode: LocationMode::Iso3,
            ..ReportConfig::default()
        };
        let figure = PlotlyRenderer.render(&report(config)).unwrap();
        assert_eq!(figure.0["data"][0]["locationmode"], "ISO-3");
    }

    #[test]
    fn test_html_page() {
        let config = ReportConfig {
            title: "Laureates <by> birth & place".to_string(),
            ..ReportConfig::default()
        };
        let html = PlotlyRenderer.render(&report(config)).unwrap().to_html();

        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains(PLOTLY_CDN));
        assert!(html.contains("<title>Laureates &lt;by&gt; birth &amp; place</title>"));
        assert!(html.contains("Plotly.newPlot(\"atlas\""));
        assert!(html.contains("\"choropleth\""));
    }

    #[test]
    fn test_html_escapes_script_close() {
        let figure = Figure(json!({"layout": {"title": {"text": "</script><b>"}}}));
        let html = figure.to_html();
        assert_eq!(html.matches("</script>").count(), 2); // CDN tag and inline tag
    }
}
