use crate::config::{CollisionPolicy, SasToken, StorageConfig};
use crate::upload::types::{FileHandle, UploadedBlob, BLOB_PREFIX};
use crate::upload::UploadError;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, CONTENT_TYPE, ETAG, IF_NONE_MATCH};
use tracing::{debug, info, warn};
use url::Url;

/// Blob service REST version sent with every request.
const API_VERSION: &str = "2021-12-02";

/// Uploads one file into a container.
#[async_trait]
pub trait BlobUploader: Send + Sync {
    async fn upload(&self, container: &str, file: &FileHandle)
        -> Result<UploadedBlob, UploadError>;
}

/// Block blob uploader authorized by a shared access signature.
///
/// Credentials are captured once in [`AzureBlobClient::new`]; an expired
/// token is only noticed when the service rejects an upload.
#[derive(Clone)]
pub struct AzureBlobClient {
    http: reqwest::Client,
    service_url: Option<Url>,
    sas_token: Option<SasToken>,
    collision_policy: CollisionPolicy,
}

impl AzureBlobClient {
    pub fn new(config: &StorageConfig) -> Self {
        Self::with_http_client(reqwest::Client::new(), config)
    }

    pub fn with_http_client(http: reqwest::Client, config: &StorageConfig) -> Self {
        Self {
            http,
            service_url: config.service_url(),
            sas_token: config
                .sas_token
                .clone()
                .filter(|token| !token.as_query().is_empty()),
            collision_policy: config.collision_policy,
        }
    }

    /// Full upload url for `file_name` under the blob prefix, including the SAS query.
    pub fn blob_url(&self, container: &str, file_name: &str) -> Result<Url, UploadError> {
        let mut url = self
            .service_url
            .clone()
            .ok_or(UploadError::ConfigurationMissing("STORAGE_ACCOUNT_NAME"))?;
        let token = self
            .sas_token
            .as_ref()
            .ok_or(UploadError::ConfigurationMissing("SAS_TOKEN"))?;
        if container.trim().is_empty() {
            return Err(UploadError::ConfigurationMissing("CONTAINER_NAME"));
        }

        url.path_segments_mut()
            .map_err(|_| UploadError::InvalidUrl(url::ParseError::RelativeUrlWithoutBase))?
            .pop_if_empty()
            .push(container)
            .push(BLOB_PREFIX.trim_end_matches('/'))
            .push(file_name);
        url.set_query(Some(token.as_query()));
        Ok(url)
    }
}

#[async_trait]
impl BlobUploader for AzureBlobClient {
    async fn upload(
        &self,
        container: &str,
        file: &FileHandle,
    ) -> Result<UploadedBlob, UploadError> {
        let blob_name = file.blob_name();
        let url = self.blob_url(container, file.name())?;
        let body = file.read().await?;

        debug!(container, blob = %blob_name, bytes = body.len(), "Uploading blob");

        let mut request = self
            .http
            .put(url)
            .header("x-ms-blob-type", "BlockBlob")
            .header("x-ms-version", API_VERSION)
            .header(CONTENT_TYPE, "application/octet-stream")
            .body(body);
        if self.collision_policy == CollisionPolicy::Reject {
            request = request.header(IF_NONE_MATCH, "*");
        }

        let response = request.send().await?;
        let status = response.status();

        if !status.is_success() {
            let header_code = header_str(response.headers(), "x-ms-error-code");
            let body = response.text().await.unwrap_or_default();
            let code = header_code.or_else(|| xml_error_code(&body));
            warn!(
                container,
                blob = %blob_name,
                status = status.as_u16(),
                code = code.as_deref().unwrap_or("-"),
                "Upload rejected"
            );
            return Err(UploadError::Rejected {
                status: status.as_u16(),
                code,
            });
        }

        let confirmation_id = header_str(response.headers(), "x-ms-request-id")
            .or_else(|| header_str(response.headers(), ETAG.as_str()))
            .ok_or(UploadError::MissingConfirmation)?;

        info!(container, blob = %blob_name, request_id = %confirmation_id, "Uploaded blob");

        Ok(UploadedBlob {
            name: file.name().to_string(),
            blob_name,
            confirmation_id,
        })
    }
}

fn header_str(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Pulls `<Code>...</Code>` out of a storage error body.
fn xml_error_code(body: &str) -> Option<String> {
    let start = body.find("<Code>")? + "<Code>".len();
    let end = body[start..].find("</Code>")?;
    let code = body[start..start + end].trim();
    (!code.is_empty()).then(|| code.to_string())
}
