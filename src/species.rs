use serde::{Deserialize, Serialize};

use crate::errors::SpeciesError;

/// A chemical species tracked by a model.
///
/// The initial value is a copy number for population models and a
/// concentration for concentration models; either way it must be
/// non-negative.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Species {
    name: String,
    initial_value: f64,
}

impl Species {
    pub fn new<S: Into<String>>(name: S, initial_value: f64) -> Result<Self, SpeciesError> {
        let name = name.into();
        if initial_value < 0.0 || initial_value.is_nan() {
            return Err(SpeciesError::NegativeInitialValue {
                name,
                value: initial_value,
            });
        }
        Ok(Self {
            name,
            initial_value,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn initial_value(&self) -> f64 {
        self.initial_value
    }

    pub fn set_initial_value(&mut self, value: f64) -> Result<(), SpeciesError> {
        if value < 0.0 || value.is_nan() {
            return Err(SpeciesError::NegativeInitialValue {
                name: self.name.clone(),
                value,
            });
        }
        self.initial_value = value;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn creates_species_with_valid_initial_value() {
        let species = Species::new("S", 100.0).unwrap();
        assert_eq!(species.name(), "S");
        assert_eq!(species.initial_value(), 100.0);
    }

    #[test]
    fn zero_initial_value_is_allowed() {
        assert!(Species::new("S", 0.0).is_ok());
    }

    #[test]
    fn rejects_negative_initial_value() {
        let err = Species::new("S", -1.0).unwrap_err();
        assert_eq!(
            err,
            SpeciesError::NegativeInitialValue {
                name: "S".to_string(),
                value: -1.0
            }
        );
    }

    #[test]
    fn rejects_nan_initial_value() {
        assert!(Species::new("S", f64::NAN).is_err());
    }

    #[test]
    fn set_initial_value_revalidates() {
        let mut species = Species::new("S", 10.0).unwrap();
        species.set_initial_value(25.0).unwrap();
        assert_eq!(species.initial_value(), 25.0);
        assert!(species.set_initial_value(-5.0).is_err());
        assert_eq!(species.initial_value(), 25.0);
    }
}
