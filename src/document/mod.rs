//! StochML document exchange.
//!
//! StochML is the XML interchange format consumed by StochKit-compatible
//! solvers. A [`StochMLDocument`] holds the textual form of one document and
//! converts in both directions: [`StochMLDocument::from_model`] renders a
//! fully-resolved [`Model`], and [`StochMLDocument::to_model`] reconstructs a
//! model, re-deriving mass-action propensities along the way.
//!
//! The usual entry point for export is [`Model::serialize`], which resolves
//! parameters first; building a document from a model with unresolved
//! parameters is an error.

mod reader;
mod writer;

#[cfg(test)]
mod tests;

use std::fmt;
use std::fs;
use std::path::Path;

use crate::errors::StochMLError;
use crate::model::Model;

/// A StochML document, held as text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StochMLDocument {
    source: String,
}

impl StochMLDocument {
    /// Render a model whose parameters are all resolved.
    pub fn from_model(model: &Model) -> Result<Self, StochMLError> {
        Ok(Self {
            source: writer::write(model)?,
        })
    }

    /// Wrap existing StochML text, checking only that it is well-formed XML.
    pub fn from_string(source: impl Into<String>) -> Result<Self, StochMLError> {
        let source = source.into();
        roxmltree::Document::parse(&source)?;
        Ok(Self { source })
    }

    /// Read a document from disk.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, StochMLError> {
        Self::from_string(fs::read_to_string(path)?)
    }

    /// Reconstruct the model this document describes.
    ///
    /// `name` overrides the document's own `Name` element; when neither is
    /// present the read fails.
    pub fn to_model(&self, name: Option<&str>) -> Result<Model, StochMLError> {
        reader::read(&self.source, name)
    }

    pub fn write_to_file(&self, path: impl AsRef<Path>) -> Result<(), StochMLError> {
        fs::write(path, &self.source)?;
        Ok(())
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    pub fn into_string(self) -> String {
        self.source
    }
}

impl fmt::Display for StochMLDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}
