use std::collections::HashMap;

use crate::compression::CompressionKind;
use crate::schema::Compatibility;

/// Configuration bundle for a [`SchemaCoordinator`](crate::SchemaCoordinator)
/// and the pipelines built on top of it.
#[derive(Debug, Clone)]
pub struct Config {
    /// Registry scope for every remote operation.
    pub registry_name: String,
    /// Create/register schemas the registry does not know yet. On by default.
    pub schema_auto_registration: bool,
    /// Producer-side compression selection.
    pub compression: CompressionKind,
    /// Compatibility mode applied when creating a schema name whose
    /// [`Schema`](crate::Schema) does not declare one.
    pub compatibility_mode: Compatibility,
    /// Key/value metadata attached to versions created by auto-registration.
    pub metadata: HashMap<String, String>,
    /// Pause between two polls of a PENDING version, in milliseconds.
    pub jitter_ms: u64,
    /// Maximum number of polls before a PENDING version is given up on.
    pub max_wait_attempts: u32,
    /// Overall deadline for a single coordinator operation, in milliseconds.
    /// `None` means no deadline.
    pub request_timeout_ms: Option<u64>,
}

impl Config {
    pub fn new(registry_name: impl Into<String>) -> Self {
        Self {
            registry_name: registry_name.into(),
            schema_auto_registration: true,
            compression: CompressionKind::None,
            compatibility_mode: Compatibility::Backward,
            metadata: HashMap::new(),
            jitter_ms: 100,
            max_wait_attempts: 30,
            request_timeout_ms: None,
        }
    }
}
