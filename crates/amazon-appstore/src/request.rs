//! Request construction
//!
//! `RequestBuilder` turns a target URL, a verb, a tagged [`RequestBody`] and
//! caller headers into an [`EncodedRequest`] the transport can send as-is.
//! The body tag decides the encoding:
//!
//! | verb          | body                | result                                   |
//! |---------------|---------------------|------------------------------------------|
//! | GET / DELETE  | `Json` / `Form`     | www-form-urlencoded query string          |
//! | POST / PUT    | `Json`              | JSON payload                              |
//! | POST / PUT    | `Form`              | www-form-urlencoded payload               |
//! | POST / PUT    | `Raw`               | payload streamed from bytes or a file     |
//! | POST / PUT    | `Multipart`         | multipart/form-data, one part per entry   |

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE, USER_AGENT};
use serde_json::Value;
use std::fmt;
use std::path::{Path, PathBuf};
use url::Url;

use crate::error::{AppstoreError, Result};
use crate::mime::{content_type_for, OCTET_STREAM};

pub const JSON_CONTENT_TYPE: &str = "application/json";
pub const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// HTTP verbs used by the API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Verb {
    Get,
    Post,
    Put,
    Delete,
}

impl Verb {
    pub fn as_str(&self) -> &'static str {
        match self {
            Verb::Get => "GET",
            Verb::Post => "POST",
            Verb::Put => "PUT",
            Verb::Delete => "DELETE",
        }
    }

    pub fn as_method(&self) -> reqwest::Method {
        match self {
            Verb::Get => reqwest::Method::GET,
            Verb::Post => reqwest::Method::POST,
            Verb::Put => reqwest::Method::PUT,
            Verb::Delete => reqwest::Method::DELETE,
        }
    }

    /// Verbs whose body travels in the query string
    pub fn uses_query(&self) -> bool {
        matches!(self, Verb::Get | Verb::Delete)
    }
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Binary content to upload
#[derive(Debug, Clone, PartialEq)]
pub enum UploadSource {
    /// In-memory bytes
    Bytes { data: Vec<u8>, content_type: String },
    /// A file opened by the transport for the duration of one request
    File { path: PathBuf, content_type: String },
}

impl UploadSource {
    /// Upload a file, resolving its content type from the extension
    pub fn file(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let content_type = content_type_for(&path);
        UploadSource::File { path, content_type }
    }

    /// Upload in-memory bytes
    pub fn bytes(data: impl Into<Vec<u8>>, content_type: impl Into<String>) -> Self {
        UploadSource::Bytes {
            data: data.into(),
            content_type: content_type.into(),
        }
    }

    pub fn content_type(&self) -> &str {
        match self {
            UploadSource::Bytes { content_type, .. } | UploadSource::File { content_type, .. } => {
                content_type
            }
        }
    }

    /// Override the resolved content type
    pub fn with_content_type(mut self, value: impl Into<String>) -> Self {
        match &mut self {
            UploadSource::Bytes { content_type, .. } | UploadSource::File { content_type, .. } => {
                *content_type = value.into();
            }
        }
        self
    }

    /// File name reported in multipart parts
    pub fn file_name(&self) -> Option<String> {
        match self {
            UploadSource::File { path, .. } => path
                .file_name()
                .and_then(|n| n.to_str())
                .map(str::to_string),
            UploadSource::Bytes { .. } => None,
        }
    }
}

/// One named part of a multipart body
#[derive(Debug, Clone, PartialEq)]
pub struct FormPart {
    pub name: String,
    pub value: PartValue,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PartValue {
    Text(String),
    Upload(UploadSource),
}

impl FormPart {
    pub fn text(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: PartValue::Text(value.into()),
        }
    }

    pub fn upload(name: impl Into<String>, source: UploadSource) -> Self {
        Self {
            name: name.into(),
            value: PartValue::Upload(source),
        }
    }

    /// A file part named `name`, typed from the file extension
    pub fn file(name: impl Into<String>, path: &Path) -> Self {
        Self::upload(name, UploadSource::file(path))
    }
}

/// Outbound body, tagged by how it must be encoded
#[derive(Debug, Clone, Default, PartialEq)]
pub enum RequestBody {
    #[default]
    Empty,
    Json(Value),
    Form(Vec<(String, String)>),
    Raw(UploadSource),
    Multipart(Vec<FormPart>),
}

impl RequestBody {
    /// Form body from borrowed pairs
    pub fn form<K: Into<String>, V: Into<String>>(pairs: impl IntoIterator<Item = (K, V)>) -> Self {
        RequestBody::Form(pairs.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }

    pub fn is_empty(&self) -> bool {
        match self {
            RequestBody::Empty => true,
            RequestBody::Json(value) => value.is_null(),
            RequestBody::Form(pairs) => pairs.is_empty(),
            RequestBody::Multipart(parts) => parts.is_empty(),
            RequestBody::Raw(_) => false,
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            RequestBody::Empty => "empty",
            RequestBody::Json(_) => "json",
            RequestBody::Form(_) => "form",
            RequestBody::Raw(_) => "raw",
            RequestBody::Multipart(_) => "multipart",
        }
    }
}

/// Encoded payload handed to the transport
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    None,
    Bytes(Vec<u8>),
    Upload(UploadSource),
    Multipart(Vec<FormPart>),
}

/// A transport-ready request
#[derive(Debug, Clone)]
pub struct EncodedRequest {
    pub verb: Verb,
    pub url: Url,
    pub headers: HeaderMap,
    pub payload: Payload,
}

impl EncodedRequest {
    /// Header value as a string, if present and printable
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

/// Maps (url, verb, body, headers) onto an [`EncodedRequest`]
#[derive(Debug, Clone)]
pub struct RequestBuilder {
    user_agent: String,
}

impl RequestBuilder {
    pub fn new(user_agent: impl Into<String>) -> Self {
        Self {
            user_agent: user_agent.into(),
        }
    }

    /// Headers applied to every request before caller headers
    pub fn default_headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(JSON_CONTENT_TYPE));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static(JSON_CONTENT_TYPE));
        headers.insert(USER_AGENT, header_value(&self.user_agent)?);
        Ok(headers)
    }

    /// Build a request. Caller headers replace defaults of the same name.
    pub fn build(
        &self,
        mut url: Url,
        verb: Verb,
        body: RequestBody,
        extra_headers: &HeaderMap,
    ) -> Result<EncodedRequest> {
        let mut headers = self.default_headers()?;
        for (name, value) in extra_headers.iter() {
            headers.insert(name.clone(), value.clone());
        }

        if verb.uses_query() {
            let pairs = match body {
                RequestBody::Empty => Vec::new(),
                RequestBody::Json(value) => query_pairs(&value)?,
                RequestBody::Form(pairs) => pairs,
                other => {
                    return Err(AppstoreError::InvalidRequest(format!(
                        "{} body cannot be sent with {}",
                        other.kind(),
                        verb
                    )))
                }
            };
            if !pairs.is_empty() {
                url.query_pairs_mut().extend_pairs(pairs);
            }
            return Ok(EncodedRequest {
                verb,
                url,
                headers,
                payload: Payload::None,
            });
        }

        let payload = match body {
            RequestBody::Empty => Payload::None,
            RequestBody::Json(value) => {
                headers.insert(CONTENT_TYPE, HeaderValue::from_static(JSON_CONTENT_TYPE));
                Payload::Bytes(serde_json::to_vec(&value)?)
            }
            RequestBody::Form(pairs) => {
                headers.insert(CONTENT_TYPE, HeaderValue::from_static(FORM_CONTENT_TYPE));
                Payload::Bytes(encode_form(&pairs).into_bytes())
            }
            RequestBody::Raw(source) => {
                headers.insert(CONTENT_TYPE, header_value(source.content_type())?);
                Payload::Upload(source)
            }
            RequestBody::Multipart(parts) => {
                // The transport writes the boundary-bearing content type.
                headers.remove(CONTENT_TYPE);
                Payload::Multipart(parts)
            }
        };

        Ok(EncodedRequest {
            verb,
            url,
            headers,
            payload,
        })
    }

    /// Pick a body tag from the request's content type and the body's shape.
    ///
    /// A missing `Content-Type` means the JSON default. For POST/PUT with any
    /// other content type, a string body is streamed raw and a mapping
    /// becomes one multipart part per entry.
    pub fn infer_body(verb: Verb, body: Option<Value>, headers: &HeaderMap) -> Result<RequestBody> {
        let body = match body {
            None | Some(Value::Null) => return Ok(RequestBody::Empty),
            Some(body) => body,
        };

        if verb.uses_query() {
            return Ok(RequestBody::Form(query_pairs(&body)?));
        }

        let content_type = headers
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or(JSON_CONTENT_TYPE);
        let essence = content_type.split(';').next().unwrap_or("").trim();

        if essence.eq_ignore_ascii_case(JSON_CONTENT_TYPE) {
            return Ok(RequestBody::Json(body));
        }
        if essence.eq_ignore_ascii_case(FORM_CONTENT_TYPE) {
            return Ok(RequestBody::Form(query_pairs(&body)?));
        }

        match body {
            Value::String(data) => Ok(RequestBody::Raw(UploadSource::bytes(
                data.into_bytes(),
                if essence.is_empty() { OCTET_STREAM } else { essence },
            ))),
            Value::Object(map) => Ok(RequestBody::Multipart(
                map.into_iter()
                    .map(|(name, value)| FormPart::text(name, scalar_text(&value)))
                    .collect(),
            )),
            Value::Array(items) => Ok(RequestBody::Multipart(
                items
                    .iter()
                    .enumerate()
                    .map(|(i, value)| FormPart::text(i.to_string(), scalar_text(value)))
                    .collect(),
            )),
            other => Err(AppstoreError::InvalidRequest(format!(
                "cannot upload scalar body {}",
                other
            ))),
        }
    }
}

impl Default for RequestBuilder {
    fn default() -> Self {
        Self::new(crate::config::default_user_agent())
    }
}

pub(crate) fn header_value(value: &str) -> Result<HeaderValue> {
    HeaderValue::from_str(value)
        .map_err(|e| AppstoreError::InvalidRequest(format!("invalid header value: {}", e)))
}

fn encode_form(pairs: &[(String, String)]) -> String {
    url::form_urlencoded::Serializer::new(String::new())
        .extend_pairs(pairs)
        .finish()
}

/// Flatten a mapping of scalars (or arrays of scalars) into key/value pairs
fn query_pairs(value: &Value) -> Result<Vec<(String, String)>> {
    let map = match value {
        Value::Null => return Ok(Vec::new()),
        Value::Object(map) => map,
        other => {
            return Err(AppstoreError::InvalidRequest(format!(
                "query body must be a mapping, got {}",
                other
            )))
        }
    };

    let mut pairs = Vec::with_capacity(map.len());
    for (key, value) in map {
        match value {
            Value::Array(items) => {
                for item in items {
                    pairs.push((key.clone(), flat_scalar(key, item)?));
                }
            }
            other => pairs.push((key.clone(), flat_scalar(key, other)?)),
        }
    }
    Ok(pairs)
}

fn flat_scalar(key: &str, value: &Value) -> Result<String> {
    match value {
        Value::Object(_) | Value::Array(_) => Err(AppstoreError::InvalidRequest(format!(
            "nested value for '{}' cannot be form-encoded",
            key
        ))),
        other => Ok(scalar_text(other)),
    }
}

fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
