//! Prediction results returned by the hosted model

use serde::{Deserialize, Serialize};

use super::{Location, Month};
use crate::units::celsius_to_fahrenheit;

/// One predicted monthly average for a location
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Prediction {
    pub postal_code: String,
    pub month: Month,
    /// Predicted average temperature in Celsius, as returned by the model
    pub celsius: f64,
}

impl Prediction {
    #[must_use]
    pub fn new(location: &Location, month: Month, celsius: f64) -> Self {
        Self {
            postal_code: location.postal_code.clone(),
            month,
            celsius,
        }
    }

    #[must_use]
    pub fn fahrenheit(&self) -> f64 {
        celsius_to_fahrenheit(self.celsius)
    }
}

/// Predictions for all twelve months of the prediction year
#[derive(Debug, Serialize, Clone)]
pub struct AnnualOutlook {
    predictions: Vec<Prediction>,
}

impl AnnualOutlook {
    /// Build from predictions in any order; yields `None` unless each month
    /// appears exactly once
    #[must_use]
    pub fn from_predictions(mut predictions: Vec<Prediction>) -> Option<Self> {
        predictions.sort_by_key(|p| p.month);
        let complete = predictions.len() == 12
            && predictions
                .iter()
                .zip(Month::all())
                .all(|(prediction, month)| prediction.month == month);
        complete.then_some(Self { predictions })
    }

    /// Predictions in calendar order, January first
    #[must_use]
    pub fn predictions(&self) -> &[Prediction] {
        &self.predictions
    }

    #[must_use]
    pub fn get(&self, month: Month) -> &Prediction {
        &self.predictions[(month.number() - 1) as usize]
    }
}
