use async_trait::async_trait;
use lazy_static::lazy_static;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE};
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::registry::{RegistryClient, SchemaVersion, VersionStatus};
use crate::schema::{Compatibility, DataFormat};
use crate::{Error, Result};

lazy_static! {
    static ref HEADERS: HeaderMap = {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers
    };
}

/// Default [`RegistryClient`] speaking the registry's REST surface.
///
/// Anything that needs different transport semantics (a vendor SDK, signed
/// requests, a test double) implements [`RegistryClient`] itself and is
/// handed to the coordinator instead of this one.
pub struct HttpRegistryClient {
    http_client: Client,
    url: String,
}

impl HttpRegistryClient {
    pub fn new(registry_url: impl Into<String>) -> Self {
        Self::new_with_client(Default::default(), registry_url)
    }

    pub fn new_with_client(client: Client, registry_url: impl Into<String>) -> Self {
        Self {
            http_client: client,
            url: registry_url.into(),
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str, subject: &str) -> Result<T> {
        let response = self
            .http_client
            .get(url)
            .headers(HEADERS.clone())
            .send()
            .await?;
        parse_response(response, subject).await
    }

    async fn post_json<B: Serialize, T: DeserializeOwned>(
        &self,
        url: &str,
        body: &B,
        subject: &str,
    ) -> Result<T> {
        let response = self
            .http_client
            .post(url)
            .headers(HEADERS.clone())
            .json(body)
            .send()
            .await?;
        parse_response(response, subject).await
    }
}

#[async_trait]
impl RegistryClient for HttpRegistryClient {
    async fn get_schema_version_by_definition(
        &self,
        registry: &str,
        name: &str,
        definition: &str,
        format: DataFormat,
    ) -> Result<SchemaVersion> {
        let url = format!(
            "{}/registries/{}/schemas/{}/versions/lookup",
            self.url, registry, name
        );
        let request = LookupVersionRequest {
            schema_definition: definition,
            data_format: format,
        };
        let dto: SchemaVersionDto = self.post_json(&url, &request, name).await?;
        Ok(dto.into())
    }

    async fn get_schema_version_by_id(&self, version_id: Uuid) -> Result<SchemaVersion> {
        let url = format!("{}/schemas/versions/{}", self.url, version_id);
        let dto: SchemaVersionDto = self.get_json(&url, &version_id.to_string()).await?;
        Ok(dto.into())
    }

    async fn create_schema(
        &self,
        registry: &str,
        name: &str,
        definition: &str,
        format: DataFormat,
        compatibility: Compatibility,
    ) -> Result<SchemaVersion> {
        let url = format!("{}/registries/{}/schemas", self.url, registry);
        let request = CreateSchemaRequest {
            schema_name: name,
            schema_definition: definition,
            data_format: format,
            compatibility,
        };
        let dto: SchemaVersionDto = self.post_json(&url, &request, name).await?;
        Ok(dto.into())
    }

    async fn register_schema_version(
        &self,
        registry: &str,
        name: &str,
        definition: &str,
    ) -> Result<SchemaVersion> {
        let url = format!(
            "{}/registries/{}/schemas/{}/versions",
            self.url, registry, name
        );
        let request = RegisterVersionRequest {
            schema_definition: definition,
        };
        let dto: SchemaVersionDto = self.post_json(&url, &request, name).await?;
        Ok(dto.into())
    }

    async fn put_schema_version_metadata(
        &self,
        version_id: Uuid,
        key: &str,
        value: &str,
    ) -> Result<()> {
        let url = format!("{}/schemas/versions/{}/metadata", self.url, version_id);
        let request = MetadataRequest { key, value };
        let response = self
            .http_client
            .put(url.as_str())
            .headers(HEADERS.clone())
            .json(&request)
            .send()
            .await?;
        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        let body = response.bytes().await?;
        let error: ApiError = serde_json::from_slice(&body).unwrap_or_default();
        Err(map_api_error(status, error, &version_id.to_string()))
    }
}

async fn parse_response<T: DeserializeOwned>(response: Response, subject: &str) -> Result<T> {
    let status = response.status();
    let body = response.bytes().await?;
    if status.is_success() {
        return serde_json::from_slice(&body).map_err(|e| {
            Error::UnexpectedResponse(format!("undecodable registry payload: {}", e))
        });
    }
    let error: ApiError = serde_json::from_slice(&body).unwrap_or_default();
    Err(map_api_error(status, error, subject))
}

fn map_api_error(status: StatusCode, error: ApiError, subject: &str) -> Error {
    let message = error
        .message
        .unwrap_or_else(|| "no error message returned by the registry".to_owned());
    match (status, error.error_code.as_deref()) {
        (StatusCode::NOT_FOUND, _) => Error::SchemaNotFound(subject.to_owned()),
        (StatusCode::CONFLICT, Some("AlreadyExistsException")) => {
            Error::SchemaAlreadyExists(subject.to_owned())
        }
        (StatusCode::CONFLICT, _) => Error::SchemaEvolution {
            name: subject.to_owned(),
            message,
        },
        _ => Error::UnexpectedResponse(format!("{}: {}", status, message)),
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct LookupVersionRequest<'a> {
    schema_definition: &'a str,
    data_format: DataFormat,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateSchemaRequest<'a> {
    schema_name: &'a str,
    schema_definition: &'a str,
    data_format: DataFormat,
    compatibility: Compatibility,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RegisterVersionRequest<'a> {
    schema_definition: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct MetadataRequest<'a> {
    key: &'a str,
    value: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SchemaVersionDto {
    schema_version_id: Uuid,
    schema_name: String,
    schema_definition: String,
    data_format: DataFormat,
    #[serde(default)]
    compatibility: Compatibility,
    status: VersionStatus,
}

impl From<SchemaVersionDto> for SchemaVersion {
    fn from(dto: SchemaVersionDto) -> Self {
        SchemaVersion {
            version_id: dto.schema_version_id,
            schema_name: dto.schema_name,
            definition: dto.schema_definition,
            data_format: dto.data_format,
            compatibility: dto.compatibility,
            status: dto.status,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiError {
    error_code: Option<String>,
    message: Option<String>,
}
