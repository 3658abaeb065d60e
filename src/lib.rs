mod compression;
mod config;
mod coordinator;
mod deserializer;
mod error;
mod http;
mod registry;
mod schema;
mod serializer;
mod transport;
pub mod wire;

pub use error::Error;
pub type Result<T> = std::result::Result<T, Error>;

pub use compression::{
    Compression, CompressionKind, CompressionRegistry, NoCompression, ZlibCompression,
    NONE_WIRE_CODE, ZLIB_WIRE_CODE,
};
pub use config::Config;
pub use coordinator::SchemaCoordinator;
pub use deserializer::Deserializer;
pub use http::HttpRegistryClient;
pub use registry::{RegistryClient, RegistryGateway, SchemaVersion, VersionStatus};
pub use schema::{Compatibility, DataFormat, Schema};
pub use serializer::Serializer;
pub use transport::{KafkaDeserializer, KafkaSerializer};

pub use avro_rs as avro;
