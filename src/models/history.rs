//! Historical monthly averages for the comparison year

use serde::Serialize;

use super::Month;
use crate::units::celsius_to_fahrenheit;

/// Observed average temperature for one month
#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct HistoricalObservation {
    pub month: Month,
    /// Mean of the daily "Average Temperature" readings, in Celsius
    pub avg_celsius: f64,
}

impl HistoricalObservation {
    #[must_use]
    pub fn fahrenheit(&self) -> f64 {
        celsius_to_fahrenheit(self.avg_celsius)
    }
}

/// One year of observations, at most one per month, ordered by month
#[derive(Debug, Serialize, Clone, Default)]
pub struct HistoricalSeries {
    pub year: i32,
    observations: Vec<HistoricalObservation>,
}

impl HistoricalSeries {
    /// Sorts by month and keeps the first observation for repeated months
    #[must_use]
    pub fn new(year: i32, mut observations: Vec<HistoricalObservation>) -> Self {
        observations.sort_by_key(|o| o.month);
        observations.dedup_by_key(|o| o.month);
        Self { year, observations }
    }

    #[must_use]
    pub fn observations(&self) -> &[HistoricalObservation] {
        &self.observations
    }

    #[must_use]
    pub fn get(&self, month: Month) -> Option<&HistoricalObservation> {
        self.observations.iter().find(|o| o.month == month)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.observations.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn obs(month: u32, avg_celsius: f64) -> HistoricalObservation {
        HistoricalObservation {
            month: Month::new(month).unwrap(),
            avg_celsius,
        }
    }

    #[test]
    fn test_series_is_ordered_and_deduplicated() {
        let series = HistoricalSeries::new(2024, vec![obs(3, 3.0), obs(1, 1.0), obs(3, 9.0)]);
        let months: Vec<u32> = series.observations().iter().map(|o| o.month.number()).collect();
        assert_eq!(months, vec![1, 3]);
        assert_eq!(series.len(), 2);
    }

    #[test]
    fn test_series_lookup() {
        let series = HistoricalSeries::new(2024, vec![obs(7, 20.0)]);
        let july = series.get(Month::new(7).unwrap()).unwrap();
        assert!((july.fahrenheit() - 68.0).abs() < 1e-9);
        assert!(series.get(Month::new(8).unwrap()).is_none());
        assert!(HistoricalSeries::default().is_empty());
    }
}
