use std::sync::Arc;

use avro_rs::types::Value;

use crate::compression::CompressionRegistry;
use crate::coordinator::SchemaCoordinator;
use crate::schema::Schema;
use crate::{wire, Result};

/// Consumer-side pipeline: unframing, schema recovery, decompression, datum
/// decoding.
#[derive(Clone)]
pub struct Deserializer {
    coordinator: Arc<SchemaCoordinator>,
    compressions: Arc<CompressionRegistry>,
}

impl Deserializer {
    pub fn new(coordinator: Arc<SchemaCoordinator>) -> Self {
        Self {
            coordinator,
            compressions: Arc::new(CompressionRegistry::new()),
        }
    }

    /// Swap in a compression registry carrying user-registered algorithms.
    pub fn with_compression_registry(mut self, compressions: Arc<CompressionRegistry>) -> Self {
        self.compressions = compressions;
        self
    }

    /// Returns the datum together with the schema it was written under.
    pub async fn deserialize(&self, data: &[u8]) -> Result<(Value, Arc<Schema>)> {
        let (version_id, code, payload) = wire::decode(data)?;
        let schema = self.coordinator.get_by_id(version_id).await?;
        let raw = self.compressions.for_code(code)?.decompress(payload)?;
        let datum = schema.decode(&raw)?;
        Ok((datum, schema))
    }
}
