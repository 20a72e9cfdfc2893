//! Schema descriptor: which annotation layer and tables a computation reads
//!
//! The descriptor is pure configuration. It names the token table, the column
//! holding the value of the selected layer and the position-id column, and is
//! consumed by everything that scans the store.

use crate::error::{CollocateError, Result};
use serde::{Deserialize, Serialize};

/// The annotation layer a frequency or n-gram operation reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Layer {
    /// Surface token forms.
    #[default]
    Token,
    /// Lemmatized forms.
    Lemma,
}

impl Layer {
    /// Parse a layer name, raising a configuration error for unknown layers.
    pub fn parse(name: &str) -> Result<Self> {
        match name {
            "token" | "tokens" => Ok(Layer::Token),
            "lemma" | "lemmas" => Ok(Layer::Lemma),
            other => Err(CollocateError::Config(format!("unknown layer: {other}"))),
        }
    }
}

/// Names the tables and columns an operation queries, plus the layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaDescriptor {
    /// Table holding the token rows (per-language suffixing is the store's
    /// concern).
    pub target_table: String,
    /// Column holding the layer value (surface form or lemma).
    pub target_column: String,
    /// Monotonic position-id column.
    pub id_column: String,
    /// Selected annotation layer.
    pub layer: Layer,
}

impl SchemaDescriptor {
    /// Descriptor for the surface-token layer.
    pub fn tokens() -> Self {
        Self {
            target_table: "tokens".to_string(),
            target_column: "form".to_string(),
            id_column: "id".to_string(),
            layer: Layer::Token,
        }
    }

    /// Descriptor for the lemma layer.
    pub fn lemmas() -> Self {
        Self {
            target_table: "lemmas".to_string(),
            target_column: "lemma".to_string(),
            id_column: "id".to_string(),
            layer: Layer::Lemma,
        }
    }

    /// Build a descriptor for a named layer.
    pub fn for_layer(name: &str) -> Result<Self> {
        Ok(match Layer::parse(name)? {
            Layer::Token => Self::tokens(),
            Layer::Lemma => Self::lemmas(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layer_parse_known_names() {
        assert_eq!(Layer::parse("token").unwrap(), Layer::Token);
        assert_eq!(Layer::parse("lemmas").unwrap(), Layer::Lemma);
    }

    #[test]
    fn test_layer_parse_unknown_is_config_error() {
        let err = Layer::parse("morph").unwrap_err();
        assert!(matches!(err, CollocateError::Config(_)));
    }

    #[test]
    fn test_descriptor_for_layer() {
        let d = SchemaDescriptor::for_layer("lemma").unwrap();
        assert_eq!(d.layer, Layer::Lemma);
        assert_eq!(d.target_column, "lemma");

        let d = SchemaDescriptor::for_layer("token").unwrap();
        assert_eq!(d.layer, Layer::Token);
        assert_eq!(d.target_column, "form");
    }
}
