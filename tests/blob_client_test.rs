use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
    Router,
};
use chat_storage_uploader::config::{CollisionPolicy, SasToken, StorageConfig};
use chat_storage_uploader::upload::{AzureBlobClient, BlobUploader, FileHandle, UploadError};
use std::io::Write;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use url::Url;

#[derive(Debug, Clone)]
struct CapturedRequest {
    method: Method,
    path: String,
    query: Option<String>,
    headers: HeaderMap,
    body: Vec<u8>,
}

#[derive(Clone, Default)]
struct FakeBlobService {
    requests: Arc<Mutex<Vec<CapturedRequest>>>,
}

impl FakeBlobService {
    fn requests(&self) -> Vec<CapturedRequest> {
        self.requests.lock().unwrap().clone()
    }
}

async fn handle_put(
    State(service): State<FakeBlobService>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let path = uri.path().to_string();
    let conditional = headers.contains_key("if-none-match");
    let count = {
        let mut requests = service.requests.lock().unwrap();
        requests.push(CapturedRequest {
            method,
            path: path.clone(),
            query: uri.query().map(str::to_string),
            headers,
            body: body.to_vec(),
        });
        requests.len()
    };

    if path.ends_with("/main/denied.txt") {
        return (
            StatusCode::FORBIDDEN,
            "<?xml version=\"1.0\" encoding=\"utf-8\"?><Error><Code>AuthorizationPermissionMismatch</Code></Error>",
        )
            .into_response();
    }
    if path.ends_with("/main/silent.txt") {
        return StatusCode::CREATED.into_response();
    }
    if conditional {
        return (
            StatusCode::CONFLICT,
            [("x-ms-error-code", "BlobAlreadyExists")],
        )
            .into_response();
    }
    (
        StatusCode::CREATED,
        [("x-ms-request-id", format!("req-{count}"))],
    )
        .into_response()
}

async fn spawn_fake_service() -> (SocketAddr, FakeBlobService) {
    let service = FakeBlobService::default();
    let app = Router::new()
        .fallback(handle_put)
        .with_state(service.clone());
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (addr, service)
}

fn storage_config(addr: SocketAddr) -> StorageConfig {
    StorageConfig {
        sas_token: Some(SasToken::new("?sv=2022-11-02&sp=rw&sig=abc%3D")),
        endpoint: Some(Url::parse(&format!("http://{addr}/devstoreaccount1")).unwrap()),
        ..Default::default()
    }
}

#[tokio::test]
async fn uploads_block_blob_under_main_prefix() {
    let (addr, service) = spawn_fake_service().await;
    let client = AzureBlobClient::new(&storage_config(addr));

    let mut tmp = tempfile::NamedTempFile::new().unwrap();
    tmp.write_all(b"quarterly numbers").unwrap();
    let file = FileHandle::from_named_path("report 2024.csv", tmp.path());

    let blob = client.upload("docs", &file).await.unwrap();

    assert_eq!(blob.blob_name, "main/report 2024.csv");
    assert_eq!(blob.confirmation_id, "req-1");

    let requests = service.requests();
    assert_eq!(requests.len(), 1);
    let request = &requests[0];
    assert_eq!(request.method, Method::PUT);
    assert_eq!(request.path, "/devstoreaccount1/docs/main/report%202024.csv");
    assert_eq!(
        request.query.as_deref(),
        Some("sv=2022-11-02&sp=rw&sig=abc%3D")
    );
    assert_eq!(request.headers["x-ms-blob-type"], "BlockBlob");
    assert!(request.headers.contains_key("x-ms-version"));
    assert!(!request.headers.contains_key("if-none-match"));
    assert_eq!(request.body, b"quarterly numbers");
}

#[tokio::test]
async fn rejection_carries_status_and_provider_code() {
    let (addr, _service) = spawn_fake_service().await;
    let client = AzureBlobClient::new(&storage_config(addr));

    let err = client
        .upload("docs", &FileHandle::from_bytes("denied.txt", &b"x"[..]))
        .await
        .unwrap_err();

    match err {
        UploadError::Rejected { status, code } => {
            assert_eq!(status, 403);
            assert_eq!(code.as_deref(), Some("AuthorizationPermissionMismatch"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn reject_policy_sends_conditional_header() {
    let (addr, service) = spawn_fake_service().await;
    let config = StorageConfig {
        collision_policy: CollisionPolicy::Reject,
        ..storage_config(addr)
    };
    let client = AzureBlobClient::new(&config);

    let err = client
        .upload("docs", &FileHandle::from_bytes("a.txt", &b"x"[..]))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        UploadError::Rejected { status: 409, ref code } if code.as_deref() == Some("BlobAlreadyExists")
    ));
    assert_eq!(service.requests()[0].headers["if-none-match"], "*");
}

#[tokio::test]
async fn success_without_request_id_is_an_error() {
    let (addr, _service) = spawn_fake_service().await;
    let client = AzureBlobClient::new(&storage_config(addr));

    let err = client
        .upload("docs", &FileHandle::from_bytes("silent.txt", &b"x"[..]))
        .await
        .unwrap_err();

    assert!(matches!(err, UploadError::MissingConfirmation));
}

#[tokio::test]
async fn missing_token_fails_before_any_request() {
    let (addr, service) = spawn_fake_service().await;
    let config = StorageConfig {
        sas_token: None,
        ..storage_config(addr)
    };
    let client = AzureBlobClient::new(&config);

    let err = client
        .upload("docs", &FileHandle::from_bytes("a.txt", &b"x"[..]))
        .await
        .unwrap_err();

    assert!(matches!(err, UploadError::ConfigurationMissing("SAS_TOKEN")));
    assert!(service.requests().is_empty());
}

#[tokio::test]
async fn unreachable_endpoint_is_a_transport_error() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = AzureBlobClient::new(&storage_config(addr));
    let err = client
        .upload("docs", &FileHandle::from_bytes("a.txt", &b"x"[..]))
        .await
        .unwrap_err();

    assert!(matches!(err, UploadError::Transport(_)));
}
