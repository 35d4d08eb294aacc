//! Data models for the tempcast dashboard
//!
//! - Location: postal code and display label
//! - Month: validated calendar month
//! - Prediction: model output for one or all months
//! - History: observed monthly averages for the comparison year

pub mod history;
pub mod location;
pub mod month;
pub mod prediction;

pub use history::{HistoricalObservation, HistoricalSeries};
pub use location::{Location, LocationCatalog};
pub use month::Month;
pub use prediction::{AnnualOutlook, Prediction};
