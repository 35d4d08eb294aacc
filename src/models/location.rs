//! Location model: a postal code with a display label

use serde::{Deserialize, Serialize};

use crate::{Result, TempcastError};

/// A selectable location, keyed by US postal code
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Location {
    /// Five-digit ZIP code, passed verbatim to the prediction function
    pub postal_code: String,
    /// Human-readable label shown in selectors and chart titles
    pub label: String,
}

impl Location {
    /// Create a new location, validating the postal code
    pub fn new(postal_code: impl Into<String>, label: impl Into<String>) -> Result<Self> {
        let postal_code = postal_code.into();
        if !is_postal_code(&postal_code) {
            return Err(TempcastError::validation(format!(
                "Postal code must be 5 digits, got: '{postal_code}'"
            )));
        }
        Ok(Self {
            postal_code,
            label: label.into(),
        })
    }

    /// The location shipped by default: Flagstaff, Arizona
    #[must_use]
    pub fn flagstaff() -> Self {
        Self {
            postal_code: "86005".to_string(),
            label: "Flagstaff (86005)".to_string(),
        }
    }
}

fn is_postal_code(input: &str) -> bool {
    input.len() == 5 && input.chars().all(|c| c.is_ascii_digit())
}

/// Ordered set of locations the dashboard offers
#[derive(Debug, Serialize, Clone)]
pub struct LocationCatalog {
    locations: Vec<Location>,
}

impl LocationCatalog {
    /// Build a catalog; duplicate postal codes are rejected
    pub fn new(locations: Vec<Location>) -> Result<Self> {
        if locations.is_empty() {
            return Err(TempcastError::config("Location catalog cannot be empty"));
        }
        for (i, location) in locations.iter().enumerate() {
            if locations[..i]
                .iter()
                .any(|other| other.postal_code == location.postal_code)
            {
                return Err(TempcastError::config(format!(
                    "Duplicate postal code in location catalog: {}",
                    location.postal_code
                )));
            }
        }
        Ok(Self { locations })
    }

    #[must_use]
    pub fn get(&self, postal_code: &str) -> Option<&Location> {
        self.locations
            .iter()
            .find(|location| location.postal_code == postal_code.trim())
    }

    /// Look up a postal code, failing with a validation error when unknown
    pub fn resolve(&self, postal_code: &str) -> Result<&Location> {
        self.get(postal_code).ok_or_else(|| {
            TempcastError::validation(format!("Unknown location: '{postal_code}'"))
        })
    }

    #[must_use]
    pub fn first(&self) -> &Location {
        &self.locations[0]
    }

    pub fn iter(&self) -> impl Iterator<Item = &Location> {
        self.locations.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.locations.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }
}

impl Default for LocationCatalog {
    fn default() -> Self {
        Self {
            locations: vec![Location::flagstaff()],
        }
    }
}
