//! Server-rendered HTML for the dashboard page

use std::fmt::Write;

use crate::dashboard::{ABOUT, Dashboard, Figure};
use crate::models::{Location, LocationCatalog, Month};

const PLOTLY_JS: &str = "https://cdn.plot.ly/plotly-2.35.2.min.js";

/// What the page shows below the selectors
pub enum PageBody<'a> {
    Empty,
    Dashboard(&'a Dashboard),
    Error(&'a str),
}

/// Render the full page
#[must_use]
pub fn render(
    catalog: &LocationCatalog,
    selected_location: &Location,
    selected_month: Month,
    prediction_year: i32,
    body: PageBody<'_>,
) -> String {
    let mut html = String::with_capacity(8 * 1024);
    html.push_str(concat!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n",
        "<meta charset=\"utf-8\">\n",
        "<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n",
        "<title>Arizona Weather Prediction</title>\n",
        "<style>\n",
        "body{font-family:sans-serif;max-width:960px;margin:2rem auto;padding:0 1rem}\n",
        ".row{display:flex;gap:1rem;flex-wrap:wrap}\n",
        ".row>*{flex:1}\n",
        ".metric{border:1px solid #ddd;border-radius:6px;padding:.75rem}\n",
        ".metric .label{color:#666;font-size:.9rem}\n",
        ".metric .value{font-size:1.8rem}\n",
        ".warning{background:#fff8e1;border:1px solid #f0c36d;padding:.75rem;border-radius:6px}\n",
        ".error{background:#fdecea;border:1px solid #e57373;padding:.75rem;border-radius:6px}\n",
        "table{border-collapse:collapse;width:100%}\n",
        "td,th{border-bottom:1px solid #eee;padding:.4rem;text-align:left}\n",
        "</style>\n",
    ));
    let _ = writeln!(html, "<script src=\"{PLOTLY_JS}\"></script>");
    html.push_str("</head>\n<body>\n<h1>🌤️ Arizona Weather Prediction</h1>\n");
    let _ = writeln!(
        html,
        "<p>Predict <strong>monthly average temperatures</strong> for {} in {prediction_year}</p>",
        escape_html(&selected_location.label)
    );

    render_form(
        &mut html,
        catalog,
        selected_location,
        selected_month,
        prediction_year,
    );

    match body {
        PageBody::Empty => {}
        PageBody::Dashboard(dashboard) => render_dashboard(&mut html, dashboard),
        PageBody::Error(message) => {
            let _ = writeln!(html, "<div class=\"error\">{}</div>", escape_html(message));
        }
    }

    html.push_str("<hr>\n");
    for (title, text) in ABOUT {
        let _ = writeln!(html, "<p><strong>{title}:</strong> {text}</p>");
    }
    html.push_str("</body>\n</html>\n");
    html
}

fn render_form(
    html: &mut String,
    catalog: &LocationCatalog,
    selected_location: &Location,
    selected_month: Month,
    prediction_year: i32,
) {
    html.push_str("<form method=\"get\" action=\"/predict\">\n<div class=\"row\">\n");

    html.push_str("<label>Select Location<br><select name=\"location\">\n");
    for location in catalog.iter() {
        let _ = writeln!(
            html,
            "<option value=\"{}\"{}>{}</option>",
            escape_html(&location.postal_code),
            selected_attr(location == selected_location),
            escape_html(&location.label)
        );
    }
    html.push_str("</select></label>\n");

    let _ = writeln!(
        html,
        "<label>Month for {prediction_year}<br><select name=\"month\">"
    );
    for month in Month::all() {
        let _ = writeln!(
            html,
            "<option value=\"{}\"{}>{}</option>",
            month.number(),
            selected_attr(month == selected_month),
            month.name()
        );
    }
    html.push_str("</select></label>\n</div>\n");
    html.push_str("<p><button type=\"submit\">Predict Average Temperature</button></p>\n</form>\n");
}

fn render_dashboard(html: &mut String, dashboard: &Dashboard) {
    html.push_str("<div class=\"row\">\n");
    for metric in &dashboard.metrics {
        let _ = writeln!(
            html,
            "<div class=\"metric\"><div class=\"label\">{}</div><div class=\"value\">{}</div></div>",
            escape_html(&metric.label),
            escape_html(&metric.value)
        );
    }
    html.push_str("</div>\n");

    if let Some(warning) = &dashboard.warning {
        let _ = writeln!(html, "<div class=\"warning\">{}</div>", escape_html(warning));
    }
    if let Some(figure) = &dashboard.history_chart {
        render_figure(html, "history-chart", figure);
    }
    if let Some(figure) = &dashboard.annual_chart {
        render_figure(html, "annual-chart", figure);
    }

    if !dashboard.annual_table.is_empty() {
        html.push_str("<table>\n<thead><tr><th>Month</th><th>Temperature</th></tr></thead>\n<tbody>\n");
        for row in &dashboard.annual_table {
            let _ = writeln!(
                html,
                "<tr><td>{}</td><td>{}</td></tr>",
                escape_html(&row.month),
                escape_html(&row.temperature)
            );
        }
        html.push_str("</tbody>\n</table>\n");
    }
}

fn render_figure(html: &mut String, id: &str, figure: &Figure) {
    let _ = writeln!(
        html,
        "<div id=\"{id}\" style=\"width:100%;height:420px\"></div>\n\
         <script>Plotly.newPlot(\"{id}\", {}, {}, {{\"responsive\": true}});</script>",
        script_json(&figure.data),
        script_json(&figure.layout)
    );
}

/// JSON safe to inline inside a `<script>` element
fn script_json(value: &serde_json::Value) -> String {
    value.to_string().replace("</", "<\\/")
}

fn selected_attr(selected: bool) -> &'static str {
    if selected { " selected" } else { "" }
}

#[must_use]
pub fn escape_html(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html("<b>\"Tom\" & 'Jerry'</b>"),
            "&lt;b&gt;&quot;Tom&quot; &amp; &#39;Jerry&#39;&lt;/b&gt;"
        );
    }

    #[test]
    fn test_script_json_cannot_close_script() {
        let value = json!({"title": "</script><script>alert(1)</script>"});
        assert!(!script_json(&value).contains("</script>"));
    }

    #[test]
    fn test_form_defaults_to_july() {
        let catalog = LocationCatalog::default();
        let html = render(
            &catalog,
            catalog.first(),
            Month::default(),
            2025,
            PageBody::Empty,
        );
        assert!(html.contains("<option value=\"7\" selected>July</option>"));
        assert!(html.contains("<option value=\"86005\" selected>Flagstaff (86005)</option>"));
        assert!(html.contains("Month for 2025"));
        assert!(html.contains("Predict Average Temperature"));
        assert!(html.contains("NOAA weather stations via Snowflake Marketplace"));
    }

    #[test]
    fn test_error_body_is_escaped() {
        let catalog = LocationCatalog::default();
        let html = render(
            &catalog,
            catalog.first(),
            Month::default(),
            2025,
            PageBody::Error("<bad>"),
        );
        assert!(html.contains("<div class=\"error\">&lt;bad&gt;</div>"));
    }
}
