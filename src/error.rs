use crate::schema::DataFormat;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Avro(#[from] avro_rs::Error),

    #[error("Transport failure while calling the schema registry")]
    Transport(#[source] Box<dyn std::error::Error + Send + Sync + 'static>),

    #[error("Malformed data: {0}")]
    MalformedData(String),

    #[error("No compression algorithm is registered for the wire code {0:#04x}")]
    UnsupportedCompression(u8),

    #[error("No codec is available for the {0} data format")]
    UnsupportedFormat(DataFormat),

    #[error("The registry has no version of schema {0} matching this definition")]
    SchemaNotFound(String),

    #[error("Schema {0} already exists in the registry")]
    SchemaAlreadyExists(String),

    #[error("The registry rejected the new version of schema {name}: {message}")]
    SchemaEvolution { name: String, message: String },

    #[error("Registration of schema {name} did not become available: {reason}")]
    SchemaRegistrationFailed { name: String, reason: String },

    #[error("The operation deadline elapsed while waiting on the registry")]
    Timeout,

    #[error("{0}")]
    InvalidInput(String),

    #[error("Unexpected response from the schema registry: {0}")]
    UnexpectedResponse(String),
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Error::Transport(Box::new(err))
    }
}
