//! Prediction service: runs the model and history queries for the dashboard

use std::time::Instant;

use tracing::{debug, info, instrument, warn};

use crate::config::ModelConfig;
use crate::dashboard::Dashboard;
use crate::models::{
    AnnualOutlook, HistoricalObservation, HistoricalSeries, Location, Month, Prediction,
};
use crate::query::{AVG_TEMP_COLUMN, MONTH_COLUMN, QueryTemplates, TEMP_COLUMN};
use crate::warehouse::{ResultSet, Warehouse};
use crate::{Result, TempcastError};

pub struct PredictionService<W> {
    warehouse: W,
    templates: QueryTemplates,
    prediction_year: i32,
}

impl<W: Warehouse> PredictionService<W> {
    #[must_use]
    pub fn new(warehouse: W, templates: QueryTemplates, prediction_year: i32) -> Self {
        Self {
            warehouse,
            templates,
            prediction_year,
        }
    }

    pub fn from_config(warehouse: W, model: &ModelConfig) -> Result<Self> {
        Ok(Self::new(
            warehouse,
            QueryTemplates::from_config(model)?,
            model.prediction_year,
        ))
    }

    #[must_use]
    pub fn prediction_year(&self) -> i32 {
        self.prediction_year
    }

    /// Year the observations are read from
    #[must_use]
    pub fn comparison_year(&self) -> i32 {
        self.prediction_year - 1
    }

    #[must_use]
    pub fn warehouse(&self) -> &W {
        &self.warehouse
    }

    /// Predicted monthly average for one location and month
    #[instrument(skip(self, location, month), fields(location = %location.postal_code, month = month.number()))]
    pub async fn predict(&self, location: &Location, month: Month) -> Result<Prediction> {
        let sql = self.templates.prediction_sql(location, month);
        let result = self.warehouse.execute(&sql).await?;

        let celsius = result.get_f64(0, TEMP_COLUMN)?.ok_or_else(|| {
            TempcastError::empty_result(format!(
                "no prediction for {} in {}",
                location.postal_code,
                month.name()
            ))
        })?;
        debug!("Predicted {:.2}°C", celsius);

        Ok(Prediction::new(location, month, celsius))
    }

    /// Observed monthly averages for the comparison year
    #[instrument(skip(self, location), fields(location = %location.postal_code))]
    pub async fn history(&self, location: &Location) -> Result<HistoricalSeries> {
        let year = self.comparison_year();
        let sql = self.templates.historical_sql(location, year);
        let result = self.warehouse.execute(&sql).await?;

        let series = HistoricalSeries::new(year, observations(&result)?);
        debug!("{} months of {} history", series.len(), year);
        Ok(series)
    }

    /// Predictions for all twelve months, one statement per month
    #[instrument(skip(self, location), fields(location = %location.postal_code))]
    pub async fn annual_outlook(&self, location: &Location) -> Result<AnnualOutlook> {
        let mut predictions = Vec::with_capacity(12);
        for month in Month::all() {
            predictions.push(self.predict(location, month).await?);
        }
        AnnualOutlook::from_predictions(predictions)
            .ok_or_else(|| TempcastError::empty_result("incomplete annual outlook"))
    }

    /// Everything the dashboard shows for one selection
    ///
    /// The annual outlook is only requested when there is history to compare
    /// against; with empty history the dashboard carries a warning instead.
    #[instrument(skip(self, location, month), fields(location = %location.postal_code, month = month.number()))]
    pub async fn dashboard(&self, location: &Location, month: Month) -> Result<Dashboard> {
        let start_time = Instant::now();

        let prediction = self.predict(location, month).await?;
        let history = self.history(location).await?;

        let annual = if history.is_empty() {
            warn!(
                "No {} history for {}, skipping comparison",
                history.year, location.postal_code
            );
            None
        } else {
            Some(self.annual_outlook(location).await?)
        };

        let dashboard = Dashboard::assemble(
            location,
            month,
            self.prediction_year,
            prediction,
            &history,
            annual.as_ref(),
        );

        info!(
            "Dashboard for {} / {} built in {:.3}s",
            location.postal_code,
            month.name(),
            start_time.elapsed().as_secs_f64()
        );
        Ok(dashboard)
    }
}

/// Map history rows, dropping rows with a null average or an invalid month
fn observations(result: &ResultSet) -> Result<Vec<HistoricalObservation>> {
    let mut observations = Vec::with_capacity(result.len());
    for row in 0..result.len() {
        let raw_month = result.get_u32(row, MONTH_COLUMN)?;
        let avg = result.get_f64(row, AVG_TEMP_COLUMN)?;

        match (raw_month.and_then(|m| Month::new(m).ok()), avg) {
            (Some(month), Some(avg_celsius)) => observations.push(HistoricalObservation {
                month,
                avg_celsius,
            }),
            _ => warn!(
                "Dropping history row {}: month={:?} avg_temp={:?}",
                row, raw_month, avg
            ),
        }
    }
    Ok(observations)
}
