//! HTTP transport
//!
//! The transport executes one [`EncodedRequest`] and reports the outcome. It
//! keeps no state between calls and never retries.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, CONTENT_LENGTH, ETAG};
use reqwest::multipart::{Form, Part};
use reqwest::{Body, Client};
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

use crate::error::{AppstoreError, Result};
use crate::request::{EncodedRequest, PartValue, Payload, UploadSource};

/// Successful response
#[derive(Debug, Clone, Default)]
pub struct TransportResponse {
    /// HTTP status code
    pub status: u16,

    /// Decoded JSON body, absent when the body was empty
    pub body: Option<Value>,

    /// Response headers
    pub headers: HeaderMap,
}

impl TransportResponse {
    /// The `ETag` response header
    pub fn etag(&self) -> Option<&str> {
        self.headers.get(ETAG).and_then(|v| v.to_str().ok())
    }
}

/// Executes requests against the remote host
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Send one request.
    ///
    /// Non-success statuses fail with [`AppstoreError::Api`] carrying the raw
    /// response body.
    async fn execute(&self, request: EncodedRequest) -> Result<TransportResponse>;
}

/// reqwest-backed transport (rustls for TLS)
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    /// Create a transport, optionally bounding every request by `timeout`
    pub fn new(timeout: Option<Duration>) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            client: builder.build()?,
        })
    }

    /// Wrap a pre-built client
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn execute(&self, request: EncodedRequest) -> Result<TransportResponse> {
        debug!("Making {} request to {}", request.verb, request.url);

        let mut builder = self
            .client
            .request(request.verb.as_method(), request.url)
            .headers(request.headers);

        // File handles opened here are owned by the request and dropped when
        // this call returns, whatever the outcome.
        builder = match request.payload {
            Payload::None => builder,
            Payload::Bytes(bytes) => builder.body(bytes),
            Payload::Upload(source) => {
                let (body, length) = open_upload(source).await?;
                builder.header(CONTENT_LENGTH, length).body(body)
            }
            Payload::Multipart(parts) => {
                let mut form = Form::new();
                for part in parts {
                    form = match part.value {
                        PartValue::Text(text) => form.text(part.name, text),
                        PartValue::Upload(source) => {
                            form.part(part.name, multipart_part(source).await?)
                        }
                    };
                }
                builder.multipart(form)
            }
        };

        let response = builder.send().await?;
        let status = response.status();
        let headers = response.headers().clone();
        let text = response.text().await?;

        if !status.is_success() {
            return Err(AppstoreError::Api {
                status: status.as_u16(),
                body: text,
            });
        }

        let body = if text.trim().is_empty() {
            None
        } else {
            Some(serde_json::from_str(&text)?)
        };

        Ok(TransportResponse {
            status: status.as_u16(),
            body,
            headers,
        })
    }
}

async fn open_upload(source: UploadSource) -> Result<(Body, u64)> {
    match source {
        UploadSource::Bytes { data, .. } => {
            let length = data.len() as u64;
            Ok((Body::from(data), length))
        }
        UploadSource::File { path, .. } => {
            let file = tokio::fs::File::open(&path).await?;
            let length = file.metadata().await?.len();
            debug!(path = %path.display(), length, "streaming upload");
            Ok((Body::from(file), length))
        }
    }
}

async fn multipart_part(source: UploadSource) -> Result<Part> {
    let file_name = source.file_name();
    let content_type = source.content_type().to_string();
    let (body, length) = open_upload(source).await?;

    let mut part = Part::stream_with_length(body, length);
    if let Some(name) = file_name {
        part = part.file_name(name);
    }
    Ok(part.mime_str(&content_type)?)
}

#[cfg(test)]
pub(crate) mod mock {
    //! Recording transport with canned responses

    use super::*;
    use reqwest::header::HeaderValue;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    enum Canned {
        Success(TransportResponse),
        Failure { status: u16, body: String },
    }

    #[derive(Default)]
    pub(crate) struct MockTransport {
        responses: Mutex<VecDeque<Canned>>,
        requests: Mutex<Vec<EncodedRequest>>,
    }

    impl MockTransport {
        pub(crate) fn new() -> Self {
            Self::default()
        }

        /// Queue a successful response
        pub(crate) fn respond(&self, body: Option<Value>, etag: Option<&str>) -> &Self {
            let mut headers = HeaderMap::new();
            if let Some(etag) = etag {
                headers.insert(ETAG, HeaderValue::from_str(etag).unwrap());
            }
            self.responses
                .lock()
                .unwrap()
                .push_back(Canned::Success(TransportResponse {
                    status: 200,
                    body,
                    headers,
                }));
            self
        }

        /// Queue a failed response
        pub(crate) fn fail(&self, status: u16, body: &str) -> &Self {
            self.responses.lock().unwrap().push_back(Canned::Failure {
                status,
                body: body.to_string(),
            });
            self
        }

        pub(crate) fn requests(&self) -> Vec<EncodedRequest> {
            self.requests.lock().unwrap().clone()
        }

        pub(crate) fn last_request(&self) -> EncodedRequest {
            self.requests.lock().unwrap().last().cloned().expect("no request sent")
        }

        pub(crate) fn request_count(&self) -> usize {
            self.requests.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl HttpTransport for MockTransport {
        async fn execute(&self, request: EncodedRequest) -> Result<TransportResponse> {
            self.requests.lock().unwrap().push(request);
            match self.responses.lock().unwrap().pop_front() {
                Some(Canned::Success(response)) => Ok(response),
                Some(Canned::Failure { status, body }) => Err(AppstoreError::Api { status, body }),
                None => panic!("MockTransport: no response queued"),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::{FormPart, RequestBody, RequestBuilder, Verb};
    use serde_json::json;
    use std::io::Write;
    use url::Url;
    use wiremock::matchers::{body_string_contains, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn encode(server: &MockServer, route: &str, verb: Verb, body: RequestBody) -> EncodedRequest {
        let url = Url::parse(&format!("{}{}", server.uri(), route)).unwrap();
        RequestBuilder::new("test-agent")
            .build(url, verb, body, &HeaderMap::new())
            .unwrap()
    }

    #[tokio::test]
    async fn test_success_returns_body_and_etag() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/applications/A/edits/E"))
            .and(query_param("lang", "en-US"))
            .and(header("accept", "application/json"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("ETag", "\"v1\"")
                    .set_body_json(json!({"id": "E", "status": "IN_PROGRESS"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let request = encode(
            &server,
            "/v1/applications/A/edits/E",
            Verb::Get,
            RequestBody::Json(json!({"lang": "en-US"})),
        );
        let response = ReqwestTransport::new(None).unwrap().execute(request).await.unwrap();

        assert_eq!(response.status, 200);
        assert_eq!(response.etag(), Some("\"v1\""));
        assert_eq!(response.body, Some(json!({"id": "E", "status": "IN_PROGRESS"})));
    }

    #[tokio::test]
    async fn test_prebuilt_client_is_used() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(header("x-tenant", "qa"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .expect(1)
            .mount(&server)
            .await;

        let mut defaults = HeaderMap::new();
        defaults.insert("x-tenant", reqwest::header::HeaderValue::from_static("qa"));
        let client = Client::builder().default_headers(defaults).build().unwrap();

        let request = encode(&server, "/v1/apks", Verb::Get, RequestBody::Empty);
        let response = ReqwestTransport::with_client(client)
            .execute(request)
            .await
            .unwrap();
        assert_eq!(response.body, Some(json!([])));
    }

    #[tokio::test]
    async fn test_empty_body_is_absent() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .respond_with(ResponseTemplate::new(204))
            .mount(&server)
            .await;

        let request = encode(&server, "/v1/x", Verb::Delete, RequestBody::Empty);
        let response = ReqwestTransport::new(None).unwrap().execute(request).await.unwrap();

        assert_eq!(response.status, 204);
        assert!(response.body.is_none());
        assert!(response.etag().is_none());
    }

    #[tokio::test]
    async fn test_error_status_carries_raw_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(403).set_body_string("[{\"errorMessage\":\"title missing\"}]"),
            )
            .mount(&server)
            .await;

        let request = encode(&server, "/v1/commit", Verb::Post, RequestBody::Empty);
        let err = ReqwestTransport::new(None)
            .unwrap()
            .execute(request)
            .await
            .unwrap_err();

        match err {
            AppstoreError::Api { status, body } => {
                assert_eq!(status, 403);
                assert_eq!(body, "[{\"errorMessage\":\"title missing\"}]");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_form_body_reaches_server() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(header("content-type", "application/x-www-form-urlencoded"))
            .and(body_string_contains("grant_type=client_credentials"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
            .expect(1)
            .mount(&server)
            .await;

        let request = encode(
            &server,
            "/token",
            Verb::Post,
            RequestBody::form([("grant_type", "client_credentials")]),
        );
        ReqwestTransport::new(None).unwrap().execute(request).await.unwrap();
    }

    #[tokio::test]
    async fn test_raw_file_upload_streams_contents() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(header("content-type", "image/png"))
            .and(body_string_contains("fake-png-bytes"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "IMG1"})))
            .expect(1)
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let file_path = dir.path().join("icon.png");
        std::fs::File::create(&file_path)
            .unwrap()
            .write_all(b"fake-png-bytes")
            .unwrap();

        let request = encode(
            &server,
            "/upload",
            Verb::Post,
            RequestBody::Raw(UploadSource::file(&file_path)),
        );
        let response = ReqwestTransport::new(None).unwrap().execute(request).await.unwrap();
        assert_eq!(response.body, Some(json!({"id": "IMG1"})));
    }

    #[tokio::test]
    async fn test_multipart_upload_reaches_server() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(body_string_contains("name=\"file\"; filename=\"app.apk\""))
            .and(body_string_contains("apk-contents"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "M1"})))
            .expect(1)
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let file_path = dir.path().join("app.apk");
        std::fs::write(&file_path, b"apk-contents").unwrap();

        let request = encode(
            &server,
            "/replace",
            Verb::Put,
            RequestBody::Multipart(vec![FormPart::file("file", &file_path)]),
        );
        ReqwestTransport::new(None).unwrap().execute(request).await.unwrap();
    }

    #[tokio::test]
    async fn test_missing_upload_file_is_io_error() {
        let server = MockServer::start().await;
        let request = encode(
            &server,
            "/upload",
            Verb::Post,
            RequestBody::Raw(UploadSource::file("/nonexistent/app.apk")),
        );
        let err = ReqwestTransport::new(None)
            .unwrap()
            .execute(request)
            .await
            .unwrap_err();
        assert!(matches!(err, AppstoreError::Io(_)));
    }
}
