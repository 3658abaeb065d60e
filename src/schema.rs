use std::fmt;
use std::sync::OnceLock;

use avro_rs::types::Value;
use avro_rs::Schema as AvroSchema;
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Data format of a schema definition.
///
/// Only Avro has a codec today; `Json` exists so registry responses carrying
/// it can still be represented, but serializing under it fails with
/// [`Error::UnsupportedFormat`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DataFormat {
    Avro,
    Json,
}

impl fmt::Display for DataFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataFormat::Avro => write!(f, "AVRO"),
            DataFormat::Json => write!(f, "JSON"),
        }
    }
}

/// Compatibility mode the registry enforces when a new version of a schema is
/// registered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Compatibility {
    None,
    Disabled,
    Backward,
    BackwardAll,
    Forward,
    ForwardAll,
    Full,
    FullAll,
}

impl Default for Compatibility {
    fn default() -> Self {
        Compatibility::Backward
    }
}

/// A schema as the application hands it to the pipeline: a name within a
/// registry, the canonical definition text and the format that interprets it.
///
/// Two schemas are considered the same iff their (format, name, definition)
/// triple matches exactly; the definition is compared as text, no semantic
/// normalization happens here. The parsed Avro form is built lazily on first
/// use and cached for the lifetime of the value.
#[derive(Debug, Clone)]
pub struct Schema {
    name: String,
    definition: String,
    format: DataFormat,
    compatibility: Option<Compatibility>,
    parsed: OnceLock<AvroSchema>,
}

impl PartialEq for Schema {
    fn eq(&self, other: &Self) -> bool {
        self.format == other.format
            && self.name == other.name
            && self.definition == other.definition
    }
}

impl Eq for Schema {}

impl std::hash::Hash for Schema {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.format.hash(state);
        self.name.hash(state);
        self.definition.hash(state);
    }
}

impl Schema {
    pub fn new(
        name: impl Into<String>,
        definition: impl Into<String>,
        format: DataFormat,
    ) -> Self {
        Self {
            name: name.into(),
            definition: definition.into(),
            format,
            compatibility: None,
            parsed: OnceLock::new(),
        }
    }

    pub fn new_avro(name: impl Into<String>, definition: impl Into<String>) -> Self {
        Self::new(name, definition, DataFormat::Avro)
    }

    /// Declare the compatibility mode used if this schema's name has to be
    /// created in the registry. Without it the coordinator falls back to its
    /// configured default.
    pub fn with_compatibility(mut self, compatibility: Compatibility) -> Self {
        self.compatibility = Some(compatibility);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn definition(&self) -> &str {
        &self.definition
    }

    pub fn format(&self) -> DataFormat {
        self.format
    }

    pub fn compatibility(&self) -> Option<Compatibility> {
        self.compatibility
    }

    fn parsed_avro(&self) -> Result<&AvroSchema> {
        if let Some(schema) = self.parsed.get() {
            return Ok(schema);
        }
        // Failed parses are not cached.
        let schema = AvroSchema::parse_str(&self.definition)?;
        Ok(self.parsed.get_or_init(|| schema))
    }

    /// Encode a datum to its raw (unframed, uncompressed) binary form.
    pub fn encode(&self, datum: Value) -> Result<Vec<u8>> {
        match self.format {
            DataFormat::Avro => Ok(avro_rs::to_avro_datum(self.parsed_avro()?, datum)?),
            DataFormat::Json => Err(Error::UnsupportedFormat(self.format)),
        }
    }

    /// Decode a raw datum. This schema is the writer schema; no reader-schema
    /// projection happens at this layer.
    pub fn decode(&self, data: &[u8]) -> Result<Value> {
        match self.format {
            DataFormat::Avro => {
                let mut reader = data;
                Ok(avro_rs::from_avro_datum(
                    self.parsed_avro()?,
                    &mut reader,
                    None,
                )?)
            }
            DataFormat::Json => Err(Error::UnsupportedFormat(self.format)),
        }
    }
}
