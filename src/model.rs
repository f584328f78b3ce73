//! The aggregate root owning species, parameters and reactions.
//!
//! A [`Model`] keeps each entity collection in insertion order and enforces
//! name uniqueness within a collection. Reactions may only be registered once
//! every species and rate parameter they reference is present.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::document::StochMLDocument;
use crate::errors::{ModelError, ModelResult, ParameterError, StochMLError};
use crate::expression::Namespace;
use crate::parameter::{Parameter, Resolution};
use crate::reaction::Reaction;
use crate::species::Species;

/// Whether species quantities are discrete copy numbers or concentrations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Units {
    Population,
    Concentration,
}

/// A well-mixed reaction network.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Model {
    name: String,
    annotation: String,
    units: Units,
    volume: Option<Parameter>,
    species: IndexMap<String, Species>,
    parameters: IndexMap<String, Parameter>,
    reactions: IndexMap<String, Reaction>,
}

impl Model {
    /// Create an empty population-units model.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            annotation: String::new(),
            units: Units::Population,
            volume: None,
            species: IndexMap::new(),
            parameters: IndexMap::new(),
            reactions: IndexMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn annotation(&self) -> &str {
        &self.annotation
    }

    pub fn set_annotation(&mut self, annotation: impl Into<String>) {
        self.annotation = annotation.into();
    }

    pub fn units(&self) -> Units {
        self.units
    }

    pub fn set_units(&mut self, units: Units) {
        self.units = units;
    }

    /// The system volume, when one was supplied or read from a document.
    ///
    /// The volume is carried alongside the model rather than registered as an
    /// ordinary parameter and is never written back out to StochML.
    pub fn volume(&self) -> Option<&Parameter> {
        self.volume.as_ref()
    }

    pub fn set_volume(&mut self, volume: Parameter) {
        self.volume = Some(volume);
    }

    pub fn species(&self) -> &IndexMap<String, Species> {
        &self.species
    }

    pub fn parameters(&self) -> &IndexMap<String, Parameter> {
        &self.parameters
    }

    pub fn reactions(&self) -> &IndexMap<String, Reaction> {
        &self.reactions
    }

    /// Register a species. Fails if the name is already taken, leaving the
    /// model unchanged.
    pub fn add_species(&mut self, species: Species) -> ModelResult<()> {
        if self.species.contains_key(species.name()) {
            return Err(ModelError::DuplicateSpecies(species.name().to_string()));
        }
        self.species.insert(species.name().to_string(), species);
        Ok(())
    }

    /// Register several species atomically: every name is checked (against
    /// the model and within the batch) before any insertion happens.
    pub fn add_species_collection(
        &mut self,
        species: impl IntoIterator<Item = Species>,
    ) -> ModelResult<()> {
        let species: Vec<Species> = species.into_iter().collect();
        if let Some(name) = first_name_collision(&self.species, species.iter().map(Species::name))
        {
            return Err(ModelError::DuplicateSpecies(name));
        }
        for entry in species {
            self.species.insert(entry.name().to_string(), entry);
        }
        Ok(())
    }

    pub fn add_parameter(&mut self, parameter: Parameter) -> ModelResult<()> {
        if self.parameters.contains_key(parameter.name()) {
            return Err(ModelError::DuplicateParameter(parameter.name().to_string()));
        }
        self.parameters
            .insert(parameter.name().to_string(), parameter);
        Ok(())
    }

    pub fn add_parameter_collection(
        &mut self,
        parameters: impl IntoIterator<Item = Parameter>,
    ) -> ModelResult<()> {
        let parameters: Vec<Parameter> = parameters.into_iter().collect();
        if let Some(name) =
            first_name_collision(&self.parameters, parameters.iter().map(Parameter::name))
        {
            return Err(ModelError::DuplicateParameter(name));
        }
        for entry in parameters {
            self.parameters.insert(entry.name().to_string(), entry);
        }
        Ok(())
    }

    /// Register a reaction.
    ///
    /// Every species the reaction references must already be registered, and
    /// a mass-action reaction's rate parameter must name a registered
    /// parameter.
    pub fn add_reaction(&mut self, reaction: Reaction) -> ModelResult<()> {
        if self.reactions.contains_key(reaction.name()) {
            return Err(ModelError::DuplicateReaction(reaction.name().to_string()));
        }
        self.check_reaction_references(&reaction)?;
        self.reactions.insert(reaction.name().to_string(), reaction);
        Ok(())
    }

    pub fn add_reaction_collection(
        &mut self,
        reactions: impl IntoIterator<Item = Reaction>,
    ) -> ModelResult<()> {
        let reactions: Vec<Reaction> = reactions.into_iter().collect();
        if let Some(name) =
            first_name_collision(&self.reactions, reactions.iter().map(Reaction::name))
        {
            return Err(ModelError::DuplicateReaction(name));
        }
        for reaction in &reactions {
            self.check_reaction_references(reaction)?;
        }
        for entry in reactions {
            self.reactions.insert(entry.name().to_string(), entry);
        }
        Ok(())
    }

    fn check_reaction_references(&self, reaction: &Reaction) -> ModelResult<()> {
        for species in reaction
            .reactants()
            .keys()
            .chain(reaction.products().keys())
        {
            if !self.species.contains_key(species) {
                return Err(ModelError::UnregisteredSpecies {
                    reaction: reaction.name().to_string(),
                    species: species.clone(),
                });
            }
        }
        if let Some(rate) = reaction.rate() {
            if !self.parameters.contains_key(rate) {
                return Err(ModelError::UnregisteredRateParameter {
                    reaction: reaction.name().to_string(),
                    parameter: rate.to_string(),
                });
            }
        }
        Ok(())
    }

    pub fn get_species(&self, name: &str) -> Option<&Species> {
        self.species.get(name)
    }

    pub fn get_species_mut(&mut self, name: &str) -> Option<&mut Species> {
        self.species.get_mut(name)
    }

    pub fn get_parameter(&self, name: &str) -> Option<&Parameter> {
        self.parameters.get(name)
    }

    pub fn get_parameter_mut(&mut self, name: &str) -> Option<&mut Parameter> {
        self.parameters.get_mut(name)
    }

    pub fn get_reaction(&self, name: &str) -> Option<&Reaction> {
        self.reactions.get(name)
    }

    pub fn get_reaction_mut(&mut self, name: &str) -> Option<&mut Reaction> {
        self.reactions.get_mut(name)
    }

    /// Remove a species, preserving the order of the remaining ones.
    ///
    /// Reactions referencing the removed species are left untouched; it is
    /// the caller's job to keep the network consistent after deletions.
    pub fn delete_species(&mut self, name: &str) -> ModelResult<Species> {
        self.species
            .shift_remove(name)
            .ok_or_else(|| ModelError::UnknownSpecies(name.to_string()))
    }

    pub fn delete_all_species(&mut self) {
        self.species.clear();
    }

    pub fn delete_parameter(&mut self, name: &str) -> ModelResult<Parameter> {
        self.parameters
            .shift_remove(name)
            .ok_or_else(|| ModelError::UnknownParameter(name.to_string()))
    }

    pub fn delete_all_parameters(&mut self) {
        self.parameters.clear();
    }

    pub fn delete_reaction(&mut self, name: &str) -> ModelResult<Reaction> {
        self.reactions
            .shift_remove(name)
            .ok_or_else(|| ModelError::UnknownReaction(name.to_string()))
    }

    pub fn delete_all_reactions(&mut self) {
        self.reactions.clear();
    }

    /// Replace a registered parameter's expression and re-evaluate it against
    /// an empty namespace.
    pub fn set_parameter_expression(
        &mut self,
        name: &str,
        expression: impl Into<String>,
    ) -> ModelResult<()> {
        let parameter = self
            .parameters
            .get_mut(name)
            .ok_or_else(|| ModelError::UnknownParameter(name.to_string()))?;
        parameter.set_expression(expression)?;
        Ok(())
    }

    /// Resolve every parameter to a scalar in a single pass.
    ///
    /// Parameters are evaluated in insertion order against a namespace that
    /// starts empty and gains each parameter as it resolves, so an expression
    /// may only reference parameters registered before it. There is no
    /// fixed-point iteration; callers must add parameters in dependency
    /// order. The first parameter that fails to resolve aborts the pass.
    pub fn resolve_parameters(&mut self) -> Result<(), ParameterError> {
        let mut namespace = Namespace::new();
        for (name, parameter) in &mut self.parameters {
            match parameter.evaluate(&namespace) {
                Resolution::Resolved(value) => {
                    namespace.insert(name.clone(), value);
                }
                Resolution::Unresolved(reason) => {
                    return Err(ParameterError::Unresolved {
                        name: name.clone(),
                        reason,
                    });
                }
            }
        }
        Ok(())
    }

    /// Resolve all parameters and render the model as a StochML string.
    ///
    /// Export never happens with unresolved parameters; a parameter that
    /// cannot be resolved in insertion order fails the whole call.
    pub fn serialize(&mut self) -> Result<String, StochMLError> {
        self.resolve_parameters()?;
        let document = StochMLDocument::from_model(self)?;
        Ok(document.into_string())
    }
}

/// First name that collides with `existing` or repeats within the batch.
fn first_name_collision<'a, T>(
    existing: &IndexMap<String, T>,
    names: impl Iterator<Item = &'a str>,
) -> Option<String> {
    let mut batch: Vec<&str> = Vec::new();
    for name in names {
        if existing.contains_key(name) || batch.contains(&name) {
            return Some(name.to_string());
        }
        batch.push(name);
    }
    None
}
