use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::time::{sleep, timeout_at, Instant};
use tracing::debug;
use uuid::Uuid;

use crate::config::Config;
use crate::schema::{Compatibility, DataFormat};
use crate::{Error, Result};

/// Lifecycle of a schema version on the registry side. Only `Available`
/// versions can be used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum VersionStatus {
    Pending,
    Available,
    Deleting,
    Failure,
}

/// A single versioned schema as the registry stores it.
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaVersion {
    pub version_id: Uuid,
    pub schema_name: String,
    pub definition: String,
    pub data_format: DataFormat,
    pub compatibility: Compatibility,
    pub status: VersionStatus,
}

/// The remote registry's typed call surface.
///
/// Every other part of the crate talks to the registry through this trait, so
/// the transport (HTTP, an SDK client, a test double) can be swapped freely.
/// Implementations report missing versions as [`Error::SchemaNotFound`],
/// rejected evolutions as [`Error::SchemaEvolution`] and anything wrong with
/// the connection itself as [`Error::Transport`].
#[async_trait]
pub trait RegistryClient: Send + Sync {
    /// Look a version up by its exact (name, definition, format) triple.
    async fn get_schema_version_by_definition(
        &self,
        registry: &str,
        name: &str,
        definition: &str,
        format: DataFormat,
    ) -> Result<SchemaVersion>;

    async fn get_schema_version_by_id(&self, version_id: Uuid) -> Result<SchemaVersion>;

    /// Create a brand new schema name together with its first version.
    async fn create_schema(
        &self,
        registry: &str,
        name: &str,
        definition: &str,
        format: DataFormat,
        compatibility: Compatibility,
    ) -> Result<SchemaVersion>;

    /// Register a new version under an existing schema name, subject to the
    /// registry-side evolution check.
    async fn register_schema_version(
        &self,
        registry: &str,
        name: &str,
        definition: &str,
    ) -> Result<SchemaVersion>;

    async fn put_schema_version_metadata(
        &self,
        version_id: Uuid,
        key: &str,
        value: &str,
    ) -> Result<()>;
}

/// Run `operation` to completion, or fail with [`Error::Timeout`] once the
/// deadline passes.
pub(crate) async fn with_deadline<F, T>(deadline: Option<Instant>, operation: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match deadline {
        Some(at) => match timeout_at(at, operation).await {
            Ok(result) => result,
            Err(_) => Err(Error::Timeout),
        },
        None => operation.await,
    }
}

/// Typed facade over a [`RegistryClient`].
///
/// Adds the two behaviors the raw call surface does not have: a bounded,
/// linearly-spaced poll that rides out the registry's asynchronous version
/// creation, and per-operation deadlines. This is the only place in the crate
/// that sleeps.
pub struct RegistryGateway {
    client: Arc<dyn RegistryClient>,
    jitter: Duration,
    max_wait_attempts: u32,
}

impl RegistryGateway {
    pub fn new(client: Arc<dyn RegistryClient>, config: &Config) -> Self {
        Self {
            client,
            jitter: Duration::from_millis(config.jitter_ms),
            max_wait_attempts: config.max_wait_attempts,
        }
    }

    pub async fn find_version_by_definition(
        &self,
        registry: &str,
        name: &str,
        definition: &str,
        format: DataFormat,
        deadline: Option<Instant>,
    ) -> Result<SchemaVersion> {
        with_deadline(
            deadline,
            self.client
                .get_schema_version_by_definition(registry, name, definition, format),
        )
        .await
    }

    pub async fn fetch_version(
        &self,
        version_id: Uuid,
        deadline: Option<Instant>,
    ) -> Result<SchemaVersion> {
        with_deadline(deadline, self.client.get_schema_version_by_id(version_id)).await
    }

    pub async fn create_schema(
        &self,
        registry: &str,
        name: &str,
        definition: &str,
        format: DataFormat,
        compatibility: Compatibility,
        deadline: Option<Instant>,
    ) -> Result<SchemaVersion> {
        with_deadline(
            deadline,
            self.client
                .create_schema(registry, name, definition, format, compatibility),
        )
        .await
    }

    pub async fn register_version(
        &self,
        registry: &str,
        name: &str,
        definition: &str,
        deadline: Option<Instant>,
    ) -> Result<SchemaVersion> {
        with_deadline(
            deadline,
            self.client.register_schema_version(registry, name, definition),
        )
        .await
    }

    pub async fn attach_metadata(
        &self,
        version_id: Uuid,
        key: &str,
        value: &str,
        deadline: Option<Instant>,
    ) -> Result<()> {
        with_deadline(
            deadline,
            self.client.put_schema_version_metadata(version_id, key, value),
        )
        .await
    }

    /// Poll a version until it leaves PENDING, then require AVAILABLE.
    ///
    /// Any other terminal status (FAILURE, DELETING) surfaces as
    /// [`Error::SchemaRegistrationFailed`], as does exhausting the poll
    /// budget while the version is still PENDING.
    pub async fn wait_until_available(
        &self,
        mut version: SchemaVersion,
        deadline: Option<Instant>,
    ) -> Result<SchemaVersion> {
        let mut attempts = 0u32;
        while version.status == VersionStatus::Pending {
            if attempts >= self.max_wait_attempts {
                return Err(Error::SchemaRegistrationFailed {
                    name: version.schema_name,
                    reason: format!("still PENDING after {} polls", attempts),
                });
            }
            if let Some(at) = deadline {
                if Instant::now() >= at {
                    return Err(Error::Timeout);
                }
            }
            debug!(
                schema = %version.schema_name,
                version_id = %version.version_id,
                attempt = attempts + 1,
                "schema version still PENDING, polling again"
            );
            sleep(self.jitter).await;
            attempts += 1;
            version = self.fetch_version(version.version_id, deadline).await?;
        }
        match version.status {
            VersionStatus::Available => Ok(version),
            status => Err(Error::SchemaRegistrationFailed {
                name: version.schema_name,
                reason: format!("version reached terminal status {:?}", status),
            }),
        }
    }
}
