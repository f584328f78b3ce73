use serde::{Deserialize, Serialize};

use crate::errors::ParameterError;
use crate::expression::{evaluate, Namespace};

/// Outcome of the most recent attempt to evaluate a parameter's expression.
///
/// A parameter whose expression references other parameters stays
/// [`Resolution::Unresolved`] until it is evaluated against a namespace that
/// binds those names, carrying the evaluator's reason for later reporting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Resolution {
    Resolved(f64),
    Unresolved(String),
}

impl Resolution {
    pub fn value(&self) -> Option<f64> {
        match self {
            Resolution::Resolved(value) => Some(*value),
            Resolution::Unresolved(_) => None,
        }
    }
}

/// A named scalar used in propensity functions and rate expressions.
///
/// The defining expression is kept verbatim; resolution to a scalar happens
/// lazily so parameters may reference parameters registered before them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    name: String,
    expression: String,
    resolution: Resolution,
}

impl Parameter {
    /// Create a parameter from an arithmetic expression.
    ///
    /// The expression is evaluated once against an empty namespace, so pure
    /// literals such as `"0.5/160"` resolve immediately. Expressions that
    /// reference other parameters are accepted and left unresolved.
    pub fn new(
        name: impl Into<String>,
        expression: impl Into<String>,
    ) -> Result<Self, ParameterError> {
        let name = name.into();
        let expression = expression.into();
        if expression.trim().is_empty() {
            return Err(ParameterError::MissingExpression(name));
        }
        let mut parameter = Self {
            name,
            expression,
            resolution: Resolution::Unresolved(String::new()),
        };
        parameter.evaluate(&Namespace::new());
        Ok(parameter)
    }

    /// Create an already-resolved parameter from a scalar value.
    pub fn constant(name: impl Into<String>, value: f64) -> Self {
        Self {
            name: name.into(),
            expression: value.to_string(),
            resolution: Resolution::Resolved(value),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn expression(&self) -> &str {
        &self.expression
    }

    pub fn resolution(&self) -> &Resolution {
        &self.resolution
    }

    /// The resolved scalar value, if the last evaluation succeeded.
    pub fn value(&self) -> Option<f64> {
        self.resolution.value()
    }

    /// Replace the defining expression and re-evaluate it against an empty
    /// namespace. A previously resolved value is discarded.
    pub fn set_expression(&mut self, expression: impl Into<String>) -> Result<(), ParameterError> {
        let expression = expression.into();
        if expression.trim().is_empty() {
            return Err(ParameterError::MissingExpression(self.name.clone()));
        }
        self.expression = expression;
        self.evaluate(&Namespace::new());
        Ok(())
    }

    /// Evaluate the expression with `namespace` bound and record the outcome.
    ///
    /// Evaluation always overwrites the previous state: a failure downgrades
    /// an earlier successful resolution back to unresolved.
    pub fn evaluate(&mut self, namespace: &Namespace) -> Resolution {
        self.resolution = match evaluate(&self.expression, namespace) {
            Ok(value) => Resolution::Resolved(value),
            Err(err) => Resolution::Unresolved(err.to_string()),
        };
        self.resolution.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literal_expression_resolves_at_construction() {
        let parameter = Parameter::new("k1", "0.5/160").unwrap();
        assert_eq!(parameter.value(), Some(0.5 / 160.0));
        assert_eq!(parameter.expression(), "0.5/160");
    }

    #[test]
    fn referencing_expression_starts_unresolved() {
        let parameter = Parameter::new("k2", "k1*2").unwrap();
        assert_eq!(parameter.value(), None);
        assert!(matches!(parameter.resolution(), Resolution::Unresolved(_)));
    }

    #[test]
    fn blank_expression_is_rejected() {
        let err = Parameter::new("k1", "  ").unwrap_err();
        assert_eq!(err, ParameterError::MissingExpression("k1".to_string()));
    }

    #[test]
    fn evaluate_binds_namespace() {
        let mut parameter = Parameter::new("k2", "k1*2").unwrap();
        let mut namespace = Namespace::new();
        namespace.insert("k1".to_string(), 3.0);
        assert_eq!(
            parameter.evaluate(&namespace),
            Resolution::Resolved(6.0)
        );
        assert_eq!(parameter.value(), Some(6.0));
    }

    #[test]
    fn failed_evaluation_discards_previous_value() {
        let mut parameter = Parameter::new("k1", "3".to_string()).unwrap();
        assert_eq!(parameter.value(), Some(3.0));
        parameter.set_expression("missing*2").unwrap();
        assert_eq!(parameter.value(), None);
    }

    #[test]
    fn constant_is_resolved_immediately() {
        let parameter = Parameter::constant("kd", 0.1);
        assert_eq!(parameter.value(), Some(0.1));
        assert_eq!(parameter.expression(), "0.1");
    }
}
