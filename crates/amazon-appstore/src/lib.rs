//! Amazon Appstore submission API client
//!
//! This crate drives the edit lifecycle of the Amazon Appstore submission
//! API: authenticate with client credentials, open an edit, modify listings,
//! APKs, images, videos, availability and targeting, then validate and commit.
//!
//! ## Components
//!
//! - **auth**: OAuth client-credentials exchange and token expiry tracking
//! - **etag**: per-resource ETag cache used for `If-Match` concurrency control
//! - **request**: turns a verb, URL and body into a wire-ready request
//! - **transport**: executes requests (reqwest in production, a mock in tests)
//! - **client**: one method per remote action, tying the above together
//!
//! ## Usage
//!
//! ```ignore
//! use amazon_appstore::{ApiClient, AppstoreConfig};
//! use std::path::Path;
//!
//! let mut client = ApiClient::new(AppstoreConfig::from_env())?;
//! client.authenticate_if_needed().await?;
//!
//! let edit = client.create_edit(app_id).await?;
//! client.upload_apk(app_id, &edit.id, Path::new("app-release.apk")).await?;
//! client.commit_edit(app_id, &edit.id).await?;
//! ```

pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod etag;
pub mod mime;
pub mod request;
pub mod transport;
pub mod types;

pub use auth::{AuthManager, Clock, Credentials, SystemClock};
pub use client::ApiClient;
pub use config::{find_config, AppstoreConfig};
pub use error::{AppstoreError, Result};
pub use etag::EtagStore;
pub use request::{RequestBody, RequestBuilder, UploadSource, Verb};
pub use transport::{HttpTransport, ReqwestTransport, TransportResponse};
pub use types::*;
