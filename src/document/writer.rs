//! Rendering a model as a StochML element tree.

use indexmap::IndexMap;
use log::debug;
use xmlwriter::{Indent, Options, XmlWriter};

use crate::errors::StochMLError;
use crate::model::{Model, Units};
use crate::parameter::Parameter;
use crate::reaction::{Reaction, ReactionKind};
use crate::species::Species;

/// Render `model` as a pretty-printed StochML string.
///
/// Every parameter must already hold a resolved value; the `Expression`
/// element carries the scalar, not the symbolic expression. The model's
/// volume is not written.
pub(super) fn write(model: &Model) -> Result<String, StochMLError> {
    debug!(
        "writing StochML for model '{}' ({} species, {} reactions)",
        model.name(),
        model.species().len(),
        model.reactions().len()
    );
    let mut writer = XmlWriter::new(Options {
        indent: Indent::Spaces(2),
        ..Options::default()
    });

    writer.start_element("Model");

    writer.start_element("Description");
    if model.units() == Units::Concentration {
        writer.write_attribute("units", "concentration");
    }
    if model.annotation().is_empty() {
        writer.end_element();
    } else {
        writer.set_preserve_whitespaces(true);
        writer.write_text(&escape_text(model.annotation()));
        writer.end_element();
        writer.set_preserve_whitespaces(false);
    }

    write_text_element(
        &mut writer,
        "NumberOfReactions",
        &model.reactions().len().to_string(),
    );
    write_text_element(
        &mut writer,
        "NumberOfSpecies",
        &model.species().len().to_string(),
    );

    writer.start_element("SpeciesList");
    for species in model.species().values() {
        write_species(&mut writer, species);
    }
    writer.end_element();

    writer.start_element("ParametersList");
    for parameter in model.parameters().values() {
        write_parameter(&mut writer, parameter)?;
    }
    writer.end_element();

    writer.start_element("ReactionsList");
    for reaction in model.reactions().values() {
        write_reaction(&mut writer, reaction);
    }
    writer.end_element();

    writer.end_element();
    Ok(writer.end_document())
}

fn write_species(writer: &mut XmlWriter, species: &Species) {
    writer.start_element("Species");
    write_text_element(writer, "Id", species.name());
    write_text_element(
        writer,
        "InitialPopulation",
        &species.initial_value().to_string(),
    );
    writer.end_element();
}

fn write_parameter(writer: &mut XmlWriter, parameter: &Parameter) -> Result<(), StochMLError> {
    let value = parameter
        .value()
        .ok_or_else(|| StochMLError::UnresolvedParameter(parameter.name().to_string()))?;
    writer.start_element("Parameter");
    write_text_element(writer, "Id", parameter.name());
    write_text_element(writer, "Expression", &value.to_string());
    writer.end_element();
    Ok(())
}

fn write_reaction(writer: &mut XmlWriter, reaction: &Reaction) {
    writer.start_element("Reaction");
    write_text_element(writer, "Id", reaction.name());
    match reaction.kind() {
        ReactionKind::MassAction { rate } => {
            write_text_element(writer, "Type", "mass-action");
            // The rate is a reference by name, resolved against the
            // ParametersList on read-back.
            write_text_element(writer, "Rate", rate);
        }
        ReactionKind::Customized => {
            write_text_element(writer, "Type", "customized");
            write_text_element(writer, "PropensityFunction", reaction.propensity_function());
        }
    }
    write_species_references(writer, "Reactants", reaction.reactants());
    write_species_references(writer, "Products", reaction.products());
    writer.end_element();
}

// An empty side still gets its (empty) element.
fn write_species_references(writer: &mut XmlWriter, tag: &str, entries: &IndexMap<String, u32>) {
    writer.start_element(tag);
    for (species, stoichiometry) in entries {
        writer.start_element("SpeciesReference");
        writer.write_attribute("id", &escape_attribute(species));
        writer.write_attribute("stoichiometry", stoichiometry);
        writer.end_element();
    }
    writer.end_element();
}

// Text sits inline between the tags, as StochKit writes it.
fn write_text_element(writer: &mut XmlWriter, tag: &str, text: &str) {
    writer.start_element(tag);
    writer.set_preserve_whitespaces(true);
    writer.write_text(&escape_text(text));
    writer.end_element();
    writer.set_preserve_whitespaces(false);
}

// xmlwriter escapes `<` in text and quotes in attribute values; ampersands
// pass through raw in both and must be escaped here.
fn escape_text(text: &str) -> String {
    text.replace('&', "&amp;")
}

fn escape_attribute(value: &str) -> String {
    value.replace('&', "&amp;").replace('<', "&lt;")
}
