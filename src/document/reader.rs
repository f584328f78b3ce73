//! Reconstructing a model from a StochML element tree.

use log::{debug, warn};
use roxmltree::{Document, Node};

use crate::errors::StochMLError;
use crate::expression::{evaluate, Namespace};
use crate::model::{Model, Units};
use crate::parameter::Parameter;
use crate::reaction::Reaction;
use crate::species::Species;

/// Parse StochML text into a model.
///
/// `name` overrides the document's own `Name` element; when neither is
/// present the read fails. The model is assembled locally and returned only
/// on full success, so a malformed document never yields a partially
/// populated model.
pub(super) fn read(source: &str, name: Option<&str>) -> Result<Model, StochMLError> {
    let document = Document::parse(source)?;
    let root = document.root_element();
    if !root.has_tag_name("Model") {
        return Err(StochMLError::UnexpectedRoot(
            root.tag_name().name().to_string(),
        ));
    }

    let name = match name {
        Some(name) => name.to_string(),
        None => child_text(root, "Name").ok_or(StochMLError::MissingModelName)?,
    };
    let mut model = Model::new(name);

    if let Some(description) = child(root, "Description") {
        if let Some(units) = description.attribute("units") {
            model.set_units(parse_units(units));
        }
        if let Some(annotation) = description.text() {
            model.set_annotation(annotation.trim());
        }
    }
    // A top-level Units element overrides the Description attribute.
    if let Some(units) = child(root, "Units") {
        model.set_units(parse_units(units.text().unwrap_or("")));
    }

    for node in root.descendants().filter(|n| n.has_tag_name("Parameter")) {
        let id = child_text(node, "Id").ok_or(StochMLError::MissingParameterId)?;
        let expression = child_text(node, "Expression")
            .ok_or_else(|| StochMLError::MissingParameterExpression(id.clone()))?;
        // The system volume travels as a parameter on the wire but is not
        // part of the parameter table.
        if id.eq_ignore_ascii_case("volume") {
            model.set_volume(Parameter::new(id, expression)?);
        } else {
            model.add_parameter(Parameter::new(id, expression)?)?;
        }
    }

    for node in root.descendants().filter(|n| n.has_tag_name("Species")) {
        let id = child_text(node, "Id").ok_or(StochMLError::MissingSpeciesId)?;
        let raw = child_text(node, "InitialPopulation")
            .ok_or_else(|| StochMLError::MissingInitialPopulation(id.clone()))?;
        let initial_value: f64 =
            raw.parse()
                .map_err(|_| StochMLError::InvalidInitialPopulation {
                    name: id.clone(),
                    raw: raw.clone(),
                })?;
        model.add_species(Species::new(id, initial_value)?)?;
    }

    // Propensity expressions get evaluated in the namespace of species
    // initial values and resolved parameters, for diagnostics only.
    let mut propensity_namespace = Namespace::new();
    for (name, species) in model.species() {
        propensity_namespace.insert(name.clone(), species.initial_value());
    }
    for (name, parameter) in model.parameters() {
        if let Some(value) = parameter.value() {
            propensity_namespace.insert(name.clone(), value);
        }
    }

    for node in root.descendants().filter(|n| n.has_tag_name("Reaction")) {
        let id = child_text(node, "Id").ok_or(StochMLError::MissingReactionId)?;
        let kind =
            child_text(node, "Type").ok_or_else(|| StochMLError::MissingReactionType(id.clone()))?;
        let reactants = read_species_references(node, "Reactants", &id)?;
        let products = read_species_references(node, "Products", &id)?;
        let reactant_refs: Vec<(&str, u32)> =
            reactants.iter().map(|(n, s)| (n.as_str(), *s)).collect();
        let product_refs: Vec<(&str, u32)> =
            products.iter().map(|(n, s)| (n.as_str(), *s)).collect();

        let reaction = match kind.as_str() {
            "mass-action" => {
                let rate_name =
                    child_text(node, "Rate").ok_or_else(|| StochMLError::MissingRate(id.clone()))?;
                if let Some(rate) = model.get_parameter(&rate_name) {
                    Reaction::mass_action(&id, &reactant_refs, &product_refs, rate)?
                } else {
                    // The rate was given as a bare literal rather than a
                    // parameter reference; synthesize a parameter to hold it.
                    let generated = format!("Reaction_{id}_rate_constant");
                    let rate = Parameter::new(generated, rate_name)?;
                    let reaction =
                        Reaction::mass_action(&id, &reactant_refs, &product_refs, &rate)?;
                    model.add_parameter(rate)?;
                    reaction
                }
            }
            "customized" => {
                let propensity = child_text(node, "PropensityFunction")
                    .ok_or_else(|| StochMLError::MissingPropensityFunction(id.clone()))?;
                if let Err(err) = evaluate(&propensity, &propensity_namespace) {
                    warn!(
                        "propensity '{propensity}' for reaction '{id}' does not evaluate \
                         against the document's species and parameters: {err}"
                    );
                }
                Reaction::custom(&id, &reactant_refs, &product_refs, propensity)?
            }
            other => {
                return Err(StochMLError::UnsupportedReactionType {
                    reaction: id,
                    kind: other.to_string(),
                });
            }
        };
        model.add_reaction(reaction)?;
    }

    debug!(
        "read model '{}' from StochML ({} species, {} parameters, {} reactions)",
        model.name(),
        model.species().len(),
        model.parameters().len(),
        model.reactions().len()
    );
    Ok(model)
}

fn read_species_references(
    reaction_node: Node,
    tag: &str,
    reaction: &str,
) -> Result<Vec<(String, u32)>, StochMLError> {
    let mut entries = Vec::new();
    // An absent Reactants/Products element means an empty side.
    let Some(list) = child(reaction_node, tag) else {
        return Ok(entries);
    };
    for node in list
        .descendants()
        .filter(|n| n.has_tag_name("SpeciesReference"))
    {
        let species =
            node.attribute("id")
                .ok_or_else(|| StochMLError::MissingSpeciesReferenceAttribute {
                    reaction: reaction.to_string(),
                    attribute: "id",
                })?;
        let raw = node.attribute("stoichiometry").ok_or_else(|| {
            StochMLError::MissingSpeciesReferenceAttribute {
                reaction: reaction.to_string(),
                attribute: "stoichiometry",
            }
        })?;
        // Tolerate legacy float-valued stoichiometries by truncating.
        let stoichiometry = raw
            .trim()
            .parse::<f64>()
            .map(|value| value as u32)
            .map_err(|_| StochMLError::InvalidStoichiometry {
                reaction: reaction.to_string(),
                species: species.to_string(),
                raw: raw.to_string(),
            })?;
        if stoichiometry == 0 {
            return Err(StochMLError::InvalidStoichiometry {
                reaction: reaction.to_string(),
                species: species.to_string(),
                raw: raw.to_string(),
            });
        }
        entries.push((species.to_string(), stoichiometry));
    }
    Ok(entries)
}

fn child<'a, 'input>(node: Node<'a, 'input>, tag: &str) -> Option<Node<'a, 'input>> {
    node.children().find(|child| child.has_tag_name(tag))
}

fn child_text(node: Node, tag: &str) -> Option<String> {
    child(node, tag)
        .and_then(|n| n.text())
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(|text| text.to_string())
}

fn parse_units(raw: &str) -> Units {
    if raw.trim().eq_ignore_ascii_case("concentration") {
        Units::Concentration
    } else {
        Units::Population
    }
}
