use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::errors::ReactionError;
use crate::parameter::Parameter;

/// How a reaction's propensity is determined.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ReactionKind {
    /// Propensity derived from a single rate parameter, referenced by name.
    MassAction { rate: String },
    /// Propensity supplied by the caller as an arbitrary expression.
    Customized,
}

/// A reaction channel converting reactants into products.
///
/// Stoichiometries are positive integers keyed by species name, kept in
/// insertion order. For mass-action reactions the propensity function is
/// derived from the rate parameter and the reactant stoichiometries and is
/// kept consistent under mutation; for customized reactions it is stored
/// verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reaction {
    name: String,
    reactants: IndexMap<String, u32>,
    products: IndexMap<String, u32>,
    kind: ReactionKind,
    propensity_function: String,
}

impl Reaction {
    /// Create a mass-action reaction with the given rate parameter.
    ///
    /// The total reactant stoichiometry must not exceed two; mass-action
    /// kinetics in a well-mixed volume has no standard form beyond
    /// bimolecular collisions.
    pub fn mass_action(
        name: impl Into<String>,
        reactants: &[(&str, u32)],
        products: &[(&str, u32)],
        rate: &Parameter,
    ) -> Result<Self, ReactionError> {
        let name = name.into();
        let reactants = build_stoichiometry(&name, reactants)?;
        let products = build_stoichiometry(&name, products)?;
        let total: u64 = reactants.values().map(|s| u64::from(*s)).sum();
        if total > 2 {
            return Err(ReactionError::OrderTooHigh { name, total });
        }
        let propensity_function = derive_mass_action_propensity(rate.name(), &reactants);
        Ok(Self {
            name,
            reactants,
            products,
            kind: ReactionKind::MassAction {
                rate: rate.name().to_string(),
            },
            propensity_function,
        })
    }

    /// Create a reaction with a caller-supplied propensity expression.
    pub fn custom(
        name: impl Into<String>,
        reactants: &[(&str, u32)],
        products: &[(&str, u32)],
        propensity_function: impl Into<String>,
    ) -> Result<Self, ReactionError> {
        let name = name.into();
        let propensity_function = propensity_function.into();
        if propensity_function.trim().is_empty() {
            return Err(ReactionError::MissingPropensity(name));
        }
        let reactants = build_stoichiometry(&name, reactants)?;
        let products = build_stoichiometry(&name, products)?;
        Ok(Self {
            name,
            reactants,
            products,
            kind: ReactionKind::Customized,
            propensity_function,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn reactants(&self) -> &IndexMap<String, u32> {
        &self.reactants
    }

    pub fn products(&self) -> &IndexMap<String, u32> {
        &self.products
    }

    pub fn kind(&self) -> &ReactionKind {
        &self.kind
    }

    pub fn propensity_function(&self) -> &str {
        &self.propensity_function
    }

    /// Name of the rate parameter, for mass-action reactions.
    pub fn rate(&self) -> Option<&str> {
        match &self.kind {
            ReactionKind::MassAction { rate } => Some(rate),
            ReactionKind::Customized => None,
        }
    }

    /// Add a reactant, replacing any existing stoichiometry for the species.
    ///
    /// For mass-action reactions the propensity function is re-derived, and
    /// the change is rejected outright if it would push the total reactant
    /// stoichiometry past two.
    pub fn add_reactant(
        &mut self,
        species: impl Into<String>,
        stoichiometry: u32,
    ) -> Result<(), ReactionError> {
        let species = species.into();
        if stoichiometry == 0 {
            return Err(ReactionError::ZeroStoichiometry {
                reaction: self.name.clone(),
                species,
            });
        }
        if let ReactionKind::MassAction { rate } = &self.kind {
            let total: u64 = self
                .reactants
                .iter()
                .filter(|(name, _)| **name != species)
                .map(|(_, s)| u64::from(*s))
                .sum::<u64>()
                + u64::from(stoichiometry);
            if total > 2 {
                return Err(ReactionError::OrderTooHigh {
                    name: self.name.clone(),
                    total,
                });
            }
            let rate = rate.clone();
            self.reactants.insert(species, stoichiometry);
            self.propensity_function = derive_mass_action_propensity(&rate, &self.reactants);
        } else {
            self.reactants.insert(species, stoichiometry);
        }
        Ok(())
    }

    /// Add a product, replacing any existing stoichiometry for the species.
    pub fn add_product(
        &mut self,
        species: impl Into<String>,
        stoichiometry: u32,
    ) -> Result<(), ReactionError> {
        let species = species.into();
        if stoichiometry == 0 {
            return Err(ReactionError::ZeroStoichiometry {
                reaction: self.name.clone(),
                species,
            });
        }
        self.products.insert(species, stoichiometry);
        Ok(())
    }
}

fn build_stoichiometry(
    reaction: &str,
    entries: &[(&str, u32)],
) -> Result<IndexMap<String, u32>, ReactionError> {
    let mut map = IndexMap::with_capacity(entries.len());
    for (species, stoichiometry) in entries {
        if *stoichiometry == 0 {
            return Err(ReactionError::ZeroStoichiometry {
                reaction: reaction.to_string(),
                species: (*species).to_string(),
            });
        }
        map.insert((*species).to_string(), *stoichiometry);
    }
    Ok(map)
}

/// Build the standard mass-action propensity expression.
///
/// Each first-order reactant multiplies the rate by its population; a
/// dimerizing reactant contributes the `0.5*x*(x-1)` distinct-pair count.
fn derive_mass_action_propensity(rate: &str, reactants: &IndexMap<String, u32>) -> String {
    let mut propensity = rate.to_string();
    for (species, stoichiometry) in reactants {
        if *stoichiometry == 2 {
            propensity = format!("0.5*{propensity}*{species}*({species}-1)");
        } else {
            propensity = format!("{propensity}*{species}");
        }
    }
    propensity
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rate() -> Parameter {
        Parameter::constant("k", 0.5)
    }

    #[test]
    fn zeroth_order_propensity_is_the_rate() {
        let reaction = Reaction::mass_action("birth", &[], &[("A", 1)], &rate()).unwrap();
        assert_eq!(reaction.propensity_function(), "k");
        assert_eq!(reaction.rate(), Some("k"));
    }

    #[test]
    fn first_order_propensity() {
        let reaction = Reaction::mass_action("decay", &[("A", 1)], &[], &rate()).unwrap();
        assert_eq!(reaction.propensity_function(), "k*A");
    }

    #[test]
    fn dimerization_propensity_counts_distinct_pairs() {
        let reaction = Reaction::mass_action("dim", &[("A", 2)], &[("D", 1)], &rate()).unwrap();
        assert_eq!(reaction.propensity_function(), "0.5*k*A*(A-1)");
    }

    #[test]
    fn bimolecular_propensity() {
        let reaction =
            Reaction::mass_action("bind", &[("A", 1), ("B", 1)], &[("AB", 1)], &rate()).unwrap();
        assert_eq!(reaction.propensity_function(), "k*A*B");
    }

    #[test]
    fn rejects_third_order_mass_action() {
        let err = Reaction::mass_action("tri", &[("A", 2), ("B", 1)], &[], &rate()).unwrap_err();
        assert_eq!(
            err,
            ReactionError::OrderTooHigh {
                name: "tri".to_string(),
                total: 3
            }
        );
        assert!(Reaction::mass_action("tri", &[("A", 3)], &[], &rate()).is_err());
    }

    #[test]
    fn rejects_zero_stoichiometry() {
        let err = Reaction::mass_action("bad", &[("A", 0)], &[], &rate()).unwrap_err();
        assert_eq!(
            err,
            ReactionError::ZeroStoichiometry {
                reaction: "bad".to_string(),
                species: "A".to_string()
            }
        );
    }

    #[test]
    fn customized_propensity_is_stored_verbatim() {
        let reaction = Reaction::custom(
            "burst",
            &[("G", 1)],
            &[("G", 1), ("M", 1)],
            "kb*G/(1+M/km)",
        )
        .unwrap();
        assert_eq!(reaction.propensity_function(), "kb*G/(1+M/km)");
        assert_eq!(reaction.rate(), None);
        assert_eq!(reaction.kind(), &ReactionKind::Customized);
    }

    #[test]
    fn customized_requires_a_propensity() {
        assert!(Reaction::custom("empty", &[], &[], "  ").is_err());
    }

    #[test]
    fn add_reactant_rederives_mass_action_propensity() {
        let mut reaction = Reaction::mass_action("bind", &[("A", 1)], &[], &rate()).unwrap();
        reaction.add_reactant("B", 1).unwrap();
        assert_eq!(reaction.propensity_function(), "k*A*B");
    }

    #[test]
    fn add_reactant_rejects_order_overflow_without_mutating() {
        let mut reaction =
            Reaction::mass_action("bind", &[("A", 1), ("B", 1)], &[], &rate()).unwrap();
        assert!(reaction.add_reactant("C", 1).is_err());
        assert_eq!(reaction.reactants().len(), 2);
        assert_eq!(reaction.propensity_function(), "k*A*B");
    }

    #[test]
    fn add_reactant_replaces_existing_stoichiometry() {
        let mut reaction = Reaction::mass_action("dim", &[("A", 1)], &[], &rate()).unwrap();
        reaction.add_reactant("A", 2).unwrap();
        assert_eq!(reaction.propensity_function(), "0.5*k*A*(A-1)");
    }

    #[test]
    fn rederivation_of_an_unchanged_reaction_is_stable() {
        let mut reaction =
            Reaction::mass_action("bind", &[("A", 1), ("B", 1)], &[], &rate()).unwrap();
        let before = reaction.propensity_function().to_string();
        reaction.add_reactant("B", 1).unwrap();
        assert_eq!(reaction.propensity_function(), before);
    }

    #[test]
    fn add_product_has_no_order_limit() {
        let mut reaction = Reaction::custom("make", &[], &[], "5").unwrap();
        reaction.add_product("A", 40).unwrap();
        assert_eq!(reaction.products().get("A"), Some(&40));
    }
}
