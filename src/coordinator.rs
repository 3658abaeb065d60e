use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use futures_locks::Mutex;
use tokio::time::Instant;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::config::Config;
use crate::registry::{RegistryClient, RegistryGateway, SchemaVersion};
use crate::schema::{DataFormat, Schema};
use crate::{Error, Result};

/// Key of the definition-to-id cache direction.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct SchemaKey {
    name: String,
    definition: String,
    format: DataFormat,
}

impl SchemaKey {
    fn of(schema: &Schema) -> Self {
        Self {
            name: schema.name().to_owned(),
            definition: schema.definition().to_owned(),
            format: schema.format(),
        }
    }
}

/// Process-wide schema cache and registry coordinator.
///
/// Keeps two coherent maps: definitions to version ids for producers, and
/// version ids to schemas for consumers. Entries are only ever added, never
/// mutated or evicted; a version id's meaning is immutable on the registry
/// side, so the cache needs no TTL. Misses are resolved remotely with at most
/// one in-flight call per key; concurrent callers for the same key wait for
/// that call and then read the cache. Negative outcomes are never cached.
///
/// Construct one per process (or per test) and share it behind an [`Arc`].
pub struct SchemaCoordinator {
    gateway: RegistryGateway,
    config: Config,
    schema_to_id: DashMap<SchemaKey, Uuid>,
    id_to_schema: DashMap<Uuid, Arc<Schema>>,
    inflight_keys: DashMap<SchemaKey, Mutex<()>>,
    inflight_ids: DashMap<Uuid, Mutex<()>>,
}

impl SchemaCoordinator {
    pub fn new(client: Arc<dyn RegistryClient>, config: Config) -> Self {
        Self {
            gateway: RegistryGateway::new(client, &config),
            config,
            schema_to_id: DashMap::new(),
            id_to_schema: DashMap::new(),
            inflight_keys: DashMap::new(),
            inflight_ids: DashMap::new(),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Resolve a schema to its version id, registering it if the registry
    /// does not know it yet (producer path).
    pub async fn get_or_register(&self, schema: &Schema) -> Result<Uuid> {
        let key = SchemaKey::of(schema);
        if let Some(entry) = self.schema_to_id.get(&key) {
            return Ok(*entry.value());
        }

        let deadline = self.deadline();
        let flight = {
            let entry = self
                .inflight_keys
                .entry(key.clone())
                .or_insert_with(|| Mutex::new(()));
            entry.value().clone()
        };
        let guard = flight.lock().await;
        // A caller that held the flight before us may have resolved the key.
        if let Some(entry) = self.schema_to_id.get(&key) {
            return Ok(*entry.value());
        }
        let result = self.resolve_or_register(schema, &key, deadline).await;
        drop(guard);
        // Only resolved flights are retired; a failed one keeps later
        // callers serialized on the same lock.
        if result.is_ok() {
            self.inflight_keys.remove(&key);
        }
        result
    }

    /// Recover the schema behind a version id (consumer path).
    pub async fn get_by_id(&self, version_id: Uuid) -> Result<Arc<Schema>> {
        if let Some(entry) = self.id_to_schema.get(&version_id) {
            return Ok(Arc::clone(entry.value()));
        }

        let deadline = self.deadline();
        let flight = {
            let entry = self
                .inflight_ids
                .entry(version_id)
                .or_insert_with(|| Mutex::new(()));
            entry.value().clone()
        };
        let guard = flight.lock().await;
        if let Some(entry) = self.id_to_schema.get(&version_id) {
            return Ok(Arc::clone(entry.value()));
        }
        let result = self.fetch_by_id(version_id, deadline).await;
        drop(guard);
        if result.is_ok() {
            self.inflight_ids.remove(&version_id);
        }
        result
    }

    /// Seed both cache directions without a remote call.
    ///
    /// Useful for pinning well-known schemas and for tests; the seeded entry
    /// is indistinguishable from one fetched from the registry.
    pub fn preload(&self, version_id: Uuid, schema: Schema) {
        let key = SchemaKey::of(&schema);
        self.insert_both(key, version_id, Arc::new(schema));
    }

    fn deadline(&self) -> Option<Instant> {
        self.config
            .request_timeout_ms
            .map(|ms| Instant::now() + Duration::from_millis(ms))
    }

    async fn resolve_or_register(
        &self,
        schema: &Schema,
        key: &SchemaKey,
        deadline: Option<Instant>,
    ) -> Result<Uuid> {
        let registry = self.config.registry_name.as_str();
        debug!(schema = %schema.name(), "schema cache miss, consulting the registry");
        let lookup = self
            .gateway
            .find_version_by_definition(
                registry,
                schema.name(),
                schema.definition(),
                schema.format(),
                deadline,
            )
            .await;
        let version = match lookup {
            Ok(version) => self.gateway.wait_until_available(version, deadline).await?,
            Err(Error::SchemaNotFound(_)) if self.config.schema_auto_registration => {
                self.auto_register(schema, deadline).await?
            }
            Err(Error::SchemaNotFound(_)) => {
                return Err(Error::SchemaNotFound(schema.name().to_owned()));
            }
            Err(other) => return Err(other),
        };
        let version_id = version.version_id;
        self.insert_both(key.clone(), version_id, Arc::new(schema.clone()));
        Ok(version_id)
    }

    /// Register a new version under the schema's name, creating the name
    /// itself when the registry has never seen it.
    async fn auto_register(
        &self,
        schema: &Schema,
        deadline: Option<Instant>,
    ) -> Result<SchemaVersion> {
        let registry = self.config.registry_name.as_str();
        debug!(schema = %schema.name(), "auto-registering schema version");
        let registered = match self
            .gateway
            .register_version(registry, schema.name(), schema.definition(), deadline)
            .await
        {
            Ok(version) => version,
            Err(Error::SchemaNotFound(_)) => {
                let compatibility = schema
                    .compatibility()
                    .unwrap_or(self.config.compatibility_mode);
                self.gateway
                    .create_schema(
                        registry,
                        schema.name(),
                        schema.definition(),
                        schema.format(),
                        compatibility,
                        deadline,
                    )
                    .await?
            }
            Err(other) => return Err(other),
        };
        let version = self.gateway.wait_until_available(registered, deadline).await?;
        self.attach_metadata(&version, deadline).await;
        Ok(version)
    }

    async fn fetch_by_id(
        &self,
        version_id: Uuid,
        deadline: Option<Instant>,
    ) -> Result<Arc<Schema>> {
        debug!(%version_id, "version id cache miss, consulting the registry");
        let version = self.gateway.fetch_version(version_id, deadline).await?;
        let version = self.gateway.wait_until_available(version, deadline).await?;
        let key = SchemaKey {
            name: version.schema_name.clone(),
            definition: version.definition.clone(),
            format: version.data_format,
        };
        let schema = Arc::new(
            Schema::new(version.schema_name, version.definition, version.data_format)
                .with_compatibility(version.compatibility),
        );
        self.insert_both(key, version_id, Arc::clone(&schema));
        Ok(schema)
    }

    /// Attach configured metadata to a freshly registered version. Failures
    /// are logged and swallowed; the registration itself already succeeded.
    async fn attach_metadata(&self, version: &SchemaVersion, deadline: Option<Instant>) {
        for (key, value) in &self.config.metadata {
            if let Err(error) = self
                .gateway
                .attach_metadata(version.version_id, key, value, deadline)
                .await
            {
                warn!(
                    version_id = %version.version_id,
                    key = %key,
                    %error,
                    "failed to attach metadata to the new schema version"
                );
            }
        }
    }

    /// Insert into both directions. `entry().or_insert` keeps existing
    /// entries untouched: the maps are append-only.
    fn insert_both(&self, key: SchemaKey, version_id: Uuid, schema: Arc<Schema>) {
        self.id_to_schema
            .entry(version_id)
            .or_insert_with(|| schema);
        self.schema_to_id.entry(key).or_insert(version_id);
    }
}
