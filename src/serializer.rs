use std::sync::Arc;

use avro_rs::types::Value;
use serde::Serialize;

use crate::compression::{CompressionKind, CompressionRegistry};
use crate::coordinator::SchemaCoordinator;
use crate::schema::Schema;
use crate::{wire, Result};

/// Producer-side pipeline: schema resolution, datum encoding, compression,
/// framing.
///
/// Stateless apart from its references; clone it freely across producer
/// tasks.
#[derive(Clone)]
pub struct Serializer {
    coordinator: Arc<SchemaCoordinator>,
    compressions: Arc<CompressionRegistry>,
    compression: CompressionKind,
}

impl Serializer {
    pub fn new(coordinator: Arc<SchemaCoordinator>) -> Self {
        let compression = coordinator.config().compression;
        Self {
            coordinator,
            compressions: Arc::new(CompressionRegistry::new()),
            compression,
        }
    }

    /// Swap in a compression registry carrying user-registered algorithms.
    pub fn with_compression_registry(mut self, compressions: Arc<CompressionRegistry>) -> Self {
        self.compressions = compressions;
        self
    }

    pub async fn serialize(&self, datum: Value, schema: &Schema) -> Result<Vec<u8>> {
        let version_id = self.coordinator.get_or_register(schema).await?;
        let raw = schema.encode(datum)?;
        let code = self.compression.wire_code();
        let payload = self.compressions.for_code(code)?.compress(&raw)?;
        Ok(wire::encode(version_id, code, &payload))
    }

    /// Serialize any `serde`-serializable value by converting it to a datum
    /// first.
    pub async fn serialize_ser<S: Serialize>(&self, datum: S, schema: &Schema) -> Result<Vec<u8>> {
        let value = avro_rs::to_value(datum)?;
        self.serialize(value, schema).await
    }
}
