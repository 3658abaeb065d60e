use std::sync::Arc;

use avro_rs::types::Value;

use crate::coordinator::SchemaCoordinator;
use crate::deserializer::Deserializer;
use crate::schema::Schema;
use crate::serializer::Serializer;
use crate::{Error, Result};

/// Producer-side transform with the shape Kafka clients expect of a value
/// serializer.
///
/// The topic is accepted to fit the callback signature and otherwise ignored.
#[derive(Clone)]
pub struct KafkaSerializer {
    inner: Serializer,
}

impl KafkaSerializer {
    pub fn new(coordinator: Arc<SchemaCoordinator>) -> Self {
        Self {
            inner: Serializer::new(coordinator),
        }
    }

    pub fn from_pipeline(serializer: Serializer) -> Self {
        Self { inner: serializer }
    }

    pub async fn serialize(
        &self,
        _topic: &str,
        record: Option<(Value, Arc<Schema>)>,
    ) -> Result<Vec<u8>> {
        let (datum, schema) = record.ok_or_else(|| {
            Error::InvalidInput("expected a (datum, schema) pair to serialize".to_owned())
        })?;
        self.inner.serialize(datum, &schema).await
    }
}

/// Consumer-side transform with the shape Kafka clients expect of a value
/// deserializer. Returns the datum paired with the schema it was written
/// under.
#[derive(Clone)]
pub struct KafkaDeserializer {
    inner: Deserializer,
}

impl KafkaDeserializer {
    pub fn new(coordinator: Arc<SchemaCoordinator>) -> Self {
        Self {
            inner: Deserializer::new(coordinator),
        }
    }

    pub fn from_pipeline(deserializer: Deserializer) -> Self {
        Self {
            inner: deserializer,
        }
    }

    pub async fn deserialize(&self, _topic: &str, data: &[u8]) -> Result<(Value, Arc<Schema>)> {
        self.inner.deserialize(data).await
    }
}
