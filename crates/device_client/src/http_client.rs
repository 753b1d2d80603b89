//! HTTP ingestion client
//!
//! Speaks the device-facing REST surface of an IoT hub:
//! - `POST /devices/{id}/messages/events` for telemetry
//! - `POST /devices/{id}/files` for an upload target (SAS URI)
//! - `POST /devices/{id}/files/notifications` for upload completion

use std::time::Duration;

use contracts::{
    ConnectionString, ContractError, IngestionClient, TelemetryMessage, UploadCompletion,
    UploadTarget,
};
use reqwest::{Client, Response};
use serde::Serialize;
use tracing::{debug, instrument};

use crate::error::{DeviceClientError, Result};
use crate::sas::SasTokenProvider;

/// REST API version sent with every request
pub const API_VERSION: &str = "2021-04-12";

/// Per-request timeout applied by the HTTP client
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Prefix that turns a header into an application property
const APP_PROPERTY_HEADER_PREFIX: &str = "iothub-app-";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct UploadTargetRequest<'a> {
    blob_name: &'a str,
}

/// IoT hub client over HTTPS
pub struct HttpIngestionClient {
    connection: ConnectionString,
    base_url: String,
    tokens: SasTokenProvider,
    http: Option<Client>,
}

impl HttpIngestionClient {
    /// Create a client for a parsed connection string
    pub fn new(connection: ConnectionString) -> Self {
        let base_url = format!("https://{}", connection.host_name);
        let tokens =
            SasTokenProvider::new(connection.resource_uri(), connection.shared_access_key.clone());
        Self {
            connection,
            base_url,
            tokens,
            http: None,
        }
    }

    /// Parse the connection string and create a client
    pub fn from_connection_string(raw: &str) -> Result<Self> {
        Ok(Self::new(ConnectionString::parse(raw)?))
    }

    /// Override the base URL (gateways, local test servers)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Device this client authenticates as
    pub fn device_id(&self) -> &str {
        &self.connection.device_id
    }

    fn device_url(&self, path: &str) -> String {
        format!(
            "{}/devices/{}/{}?api-version={}",
            self.base_url,
            urlencoding::encode(&self.connection.device_id),
            path,
            API_VERSION
        )
    }

    fn http(&self) -> Result<&Client> {
        self.http.as_ref().ok_or_else(|| DeviceClientError::NotOpen {
            endpoint: self.base_url.clone(),
        })
    }

    async fn post_json<T: Serialize>(&self, path: &str, body: &T) -> Result<Response> {
        let url = self.device_url(path);
        let response = self
            .http()?
            .post(&url)
            .header(reqwest::header::AUTHORIZATION, self.tokens.token()?)
            .json(body)
            .send()
            .await?;
        ensure_success(response).await
    }

    async fn post_telemetry(&self, message: &TelemetryMessage) -> Result<()> {
        let url = self.device_url("messages/events");
        let mut request = self
            .http()?
            .post(&url)
            .header(reqwest::header::AUTHORIZATION, self.tokens.token()?)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .header("iothub-contenttype", "application/json")
            .header("iothub-contentencoding", "utf-8");

        for (name, value) in &message.properties {
            request = request.header(format!("{APP_PROPERTY_HEADER_PREFIX}{name}"), value);
        }

        let response = request.body(message.payload.clone()).send().await?;
        ensure_success(response).await?;
        Ok(())
    }
}

/// Turn a non-2xx response into an error carrying status and body
pub(crate) async fn ensure_success(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    // SAS tokens travel in the query string
    let mut url = response.url().clone();
    url.set_query(None);
    let url = url.to_string();
    let body = response.text().await.unwrap_or_default();
    Err(DeviceClientError::Status {
        status: status.as_u16(),
        url,
        body,
    })
}

impl IngestionClient for HttpIngestionClient {
    fn endpoint(&self) -> &str {
        &self.base_url
    }

    #[instrument(name = "http_client_open", skip(self), fields(endpoint = %self.base_url))]
    async fn open(&mut self) -> std::result::Result<(), ContractError> {
        // Fail early on a key that cannot sign
        self.tokens
            .token()
            .map_err(|e| ContractError::connection(&self.base_url, e.to_string()))?;

        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| ContractError::connection(&self.base_url, e.to_string()))?;
        self.http = Some(http);

        debug!(
            endpoint = %self.base_url,
            device_id = %self.connection.device_id,
            "HTTP ingestion client opened"
        );
        Ok(())
    }

    #[instrument(
        name = "http_client_send",
        skip(self, message),
        fields(message_id = message.message_id, bytes = message.payload.len())
    )]
    async fn send_telemetry(
        &self,
        message: &TelemetryMessage,
    ) -> std::result::Result<(), ContractError> {
        self.post_telemetry(message)
            .await
            .map_err(|e| ContractError::send(message.message_id, e.to_string()))
    }

    #[instrument(name = "http_client_upload_target", skip(self))]
    async fn request_upload_target(
        &self,
        blob_name: &str,
    ) -> std::result::Result<UploadTarget, ContractError> {
        let request = UploadTargetRequest { blob_name };
        let response = self
            .post_json("files", &request)
            .await
            .map_err(|e| ContractError::upload_target(blob_name, e.to_string()))?;

        let target = response
            .json::<UploadTarget>()
            .await
            .map_err(|e| ContractError::upload_target(blob_name, e.to_string()))?;

        debug!(
            blob_name,
            correlation_id = %target.correlation_id,
            container = %target.container_name,
            "Upload target received"
        );
        Ok(target)
    }

    #[instrument(
        name = "http_client_notify",
        skip(self, completion),
        fields(correlation_id = %completion.correlation_id, status = completion.status_code)
    )]
    async fn notify_upload_complete(
        &self,
        completion: &UploadCompletion,
    ) -> std::result::Result<(), ContractError> {
        self.post_json("files/notifications", completion)
            .await
            .map_err(|e| {
                ContractError::upload_completion(&completion.correlation_id, e.to_string())
            })?;
        Ok(())
    }
}
