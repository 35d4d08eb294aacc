//! Presentation model: metrics, Plotly figures and the annual table
//!
//! Figures are emitted as Plotly JSON (`data` + `layout`) and drawn in the
//! browser by plotly.js.

use serde::Serialize;
use serde_json::{Value, json};

use crate::models::{AnnualOutlook, HistoricalSeries, Location, Month, Prediction};
use crate::units::{format_dual, format_fahrenheit, format_fahrenheit_delta};

/// Reversed `RdYlBu`: cold months blue, warm months red
const RD_YL_BU_R: [(f64, &str); 11] = [
    (0.0, "rgb(49,54,149)"),
    (0.1, "rgb(69,117,180)"),
    (0.2, "rgb(116,173,209)"),
    (0.3, "rgb(171,217,233)"),
    (0.4, "rgb(224,243,248)"),
    (0.5, "rgb(255,255,191)"),
    (0.6, "rgb(254,224,144)"),
    (0.7, "rgb(253,174,97)"),
    (0.8, "rgb(244,109,67)"),
    (0.9, "rgb(215,48,39)"),
    (1.0, "rgb(165,0,38)"),
];

/// Static notes rendered below the dashboard
pub const ABOUT: [(&str, &str); 4] = [
    ("What the app predicts", "Monthly average temperature"),
    (
        "Training",
        "Location-specific models using 25 years of data (2000-2024)",
    ),
    (
        "Features",
        "Geographic location, elevation, distance from coast",
    ),
    ("Data", "NOAA weather stations via Snowflake Marketplace"),
];

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct Metric {
    pub label: String,
    pub value: String,
}

impl Metric {
    fn new(label: impl Into<String>, value: String) -> Self {
        Self {
            label: label.into(),
            value,
        }
    }
}

/// Prediction against the observed value for the same month a year earlier
#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct Comparison {
    pub actual_fahrenheit: f64,
    pub predicted_fahrenheit: f64,
    /// Prediction minus actual
    pub difference: f64,
}

/// A Plotly figure
#[derive(Debug, Serialize, Clone)]
pub struct Figure {
    pub data: Value,
    pub layout: Value,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct TableRow {
    #[serde(rename = "Month")]
    pub month: String,
    #[serde(rename = "Temperature")]
    pub temperature: String,
}

/// Everything one "Predict" press renders
#[derive(Debug, Serialize, Clone)]
pub struct Dashboard {
    pub location: Location,
    pub month: Month,
    pub prediction_year: i32,
    pub comparison_year: i32,
    pub prediction: Prediction,
    pub prediction_fahrenheit: f64,
    pub comparison: Option<Comparison>,
    pub metrics: Vec<Metric>,
    pub history_chart: Option<Figure>,
    pub annual_chart: Option<Figure>,
    pub annual_table: Vec<TableRow>,
    pub warning: Option<String>,
}

impl Dashboard {
    /// Assemble the view. `annual` is only consulted when history is present.
    #[must_use]
    pub fn assemble(
        location: &Location,
        month: Month,
        prediction_year: i32,
        prediction: Prediction,
        history: &HistoricalSeries,
        annual: Option<&AnnualOutlook>,
    ) -> Self {
        let comparison_year = history.year;
        let predicted_fahrenheit = prediction.fahrenheit();

        let comparison = history.get(month).map(|observed| {
            let actual_fahrenheit = observed.fahrenheit();
            Comparison {
                actual_fahrenheit,
                predicted_fahrenheit,
                difference: predicted_fahrenheit - actual_fahrenheit,
            }
        });

        let prediction_label = format!("{prediction_year} Prediction");
        let metrics = match &comparison {
            Some(c) => vec![
                Metric::new(
                    format!("{comparison_year} Actual"),
                    format_fahrenheit(c.actual_fahrenheit),
                ),
                Metric::new(prediction_label, format_fahrenheit(c.predicted_fahrenheit)),
                Metric::new("Difference", format_fahrenheit_delta(c.difference)),
            ],
            None => vec![Metric::new(
                prediction_label,
                format_fahrenheit(predicted_fahrenheit),
            )],
        };

        let mut dashboard = Self {
            location: location.clone(),
            month,
            prediction_year,
            comparison_year,
            prediction,
            prediction_fahrenheit: predicted_fahrenheit,
            comparison,
            metrics,
            history_chart: None,
            annual_chart: None,
            annual_table: Vec::new(),
            warning: None,
        };

        if history.is_empty() {
            dashboard.warning = Some(format!(
                "No {comparison_year} data available for comparison, but prediction is still valid!"
            ));
            return dashboard;
        }

        dashboard.history_chart = Some(history_figure(
            location,
            month,
            prediction_year,
            predicted_fahrenheit,
            history,
        ));
        if let Some(annual) = annual {
            dashboard.annual_chart = Some(annual_figure(location, prediction_year, annual));
            dashboard.annual_table = annual_table(annual);
        }
        dashboard
    }
}

fn month_categories() -> Vec<&'static str> {
    Month::all().map(Month::short_name).collect()
}

/// Observed line with the selected month's prediction as a red marker
#[must_use]
pub fn history_figure(
    location: &Location,
    month: Month,
    prediction_year: i32,
    predicted_fahrenheit: f64,
    history: &HistoricalSeries,
) -> Figure {
    let (x, y): (Vec<&str>, Vec<f64>) = history
        .observations()
        .iter()
        .map(|o| (o.month.short_name(), o.fahrenheit()))
        .unzip();

    let data = json!([
        {
            "type": "scatter",
            "mode": "lines+markers",
            "name": format!("{} Actual", history.year),
            "x": x,
            "y": y,
        },
        {
            "type": "scatter",
            "mode": "markers",
            "name": format!("{prediction_year} Prediction"),
            "x": [month.short_name()],
            "y": [predicted_fahrenheit],
            "marker": {"size": 12, "color": "red"},
        }
    ]);

    let layout = json!({
        "title": {"text": format!("{} vs {prediction_year} Prediction - {}", history.year, location.label)},
        "xaxis": {
            "title": {"text": "Month"},
            "categoryorder": "array",
            "categoryarray": month_categories(),
        },
        "yaxis": {"title": {"text": "Temperature (°F)"}},
    });

    Figure { data, layout }
}

/// Bar per month, coloured on the reversed `RdYlBu` scale
#[must_use]
pub fn annual_figure(location: &Location, prediction_year: i32, annual: &AnnualOutlook) -> Figure {
    let (x, y): (Vec<&str>, Vec<f64>) = annual
        .predictions()
        .iter()
        .map(|p| (p.month.short_name(), p.fahrenheit()))
        .unzip();

    let data = json!([{
        "type": "bar",
        "x": x,
        "y": y,
        "marker": {
            "color": y,
            "colorscale": RD_YL_BU_R,
            "showscale": true,
            "colorbar": {"title": {"text": "Temp_F"}},
        },
    }]);

    let layout = json!({
        "title": {"text": format!("{prediction_year} Monthly Predictions - {}", location.label)},
        "xaxis": {"title": {"text": "Month"}},
        "yaxis": {"title": {"text": "Temp_F"}},
    });

    Figure { data, layout }
}

#[must_use]
pub fn annual_table(annual: &AnnualOutlook) -> Vec<TableRow> {
    annual
        .predictions()
        .iter()
        .map(|p| TableRow {
            month: p.month.short_name().to_string(),
            temperature: format_dual(p.celsius),
        })
        .collect()
}
