//! Arithmetic expression evaluation for parameter resolution.
//!
//! Expressions are held as strings so they survive serialization unchanged.
//! Evaluation binds a namespace of already-resolved scalars and delegates the
//! arithmetic (including the usual built-in functions such as `exp`, `ln` and
//! `sqrt`) to [`meval`].

use indexmap::IndexMap;

/// Mapping from parameter name to its resolved scalar value.
///
/// Insertion order is preserved, so a namespace built by walking a model's
/// parameters exposes each parameter only to the parameters registered after
/// it.
pub type Namespace = IndexMap<String, f64>;

/// Evaluate `expression` with every entry of `namespace` bound as a variable.
pub fn evaluate(expression: &str, namespace: &Namespace) -> Result<f64, meval::Error> {
    let mut context = meval::Context::new();
    for (name, value) in namespace {
        context.var(name.clone(), *value);
    }
    meval::eval_str_with_context(expression, &context)
}
