//! Appstore submission API client
//!
//! `ApiClient` exposes one method per remote action. Every call follows the
//! same protocol:
//!
//! 1. Fail with [`AppstoreError::Authentication`] if credentials are missing
//!    or expired. Resource calls never authenticate on their own; call
//!    [`ApiClient::authenticate_if_needed`] first.
//! 2. Compose the resource path from the caller's identifiers.
//! 3. For writes and deletes, attach the stored ETag as `If-Match` when one
//!    is known.
//! 4. Send with `Authorization: Bearer <token>`.
//! 5. On success, store the returned ETag under the resource key (or drop the
//!    key after a delete) and decode the JSON body.
//!
//! Errors propagate unchanged and a failed call leaves the ETag store as it
//! was.
//!
//! ## Usage
//!
//! ```ignore
//! use amazon_appstore::{ApiClient, AppstoreConfig};
//!
//! let mut client = ApiClient::new(AppstoreConfig::from_env())?;
//! client.authenticate_if_needed().await?;
//!
//! let edit = match client.get_active_edit("amzn1.devportal.mobileapp.123").await? {
//!     Some(edit) => edit,
//!     None => client.create_edit("amzn1.devportal.mobileapp.123").await?,
//! };
//! let mut listing = client.get_listing(app_id, &edit.id, "en-US").await?;
//! listing.recent_changes = Some("Bug fixes".to_string());
//! client.update_listing(app_id, &edit.id, "en-US", &listing).await?;
//! ```

use reqwest::header::{HeaderMap, AUTHORIZATION, IF_MATCH};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, instrument};
use url::Url;

use crate::auth::{AuthManager, Clock, Credentials, SystemClock};
use crate::config::AppstoreConfig;
use crate::error::{AppstoreError, Result};
use crate::etag::{key, EtagStore};
use crate::request::{header_value, FormPart, RequestBody, RequestBuilder, UploadSource, Verb};
use crate::transport::{HttpTransport, ReqwestTransport, TransportResponse};
use crate::types::*;
use paths::ResourcePath;

/// Multipart field carrying APK binaries
const APK_PART_NAME: &str = "file";

/// Client for one API account
///
/// Holds the account's credentials and ETag cache. Mutating calls take
/// `&mut self`, so concurrent use of one client has to be serialized by the
/// caller.
pub struct ApiClient {
    base_url: Url,
    auth: AuthManager,
    etags: EtagStore,
    builder: RequestBuilder,
    transport: Arc<dyn HttpTransport>,
}

impl ApiClient {
    /// Create a client backed by reqwest and the system clock
    pub fn new(config: AppstoreConfig) -> Result<Self> {
        let transport = Arc::new(ReqwestTransport::new(config.timeout())?);
        Self::with_transport(config, transport, Arc::new(SystemClock))
    }

    /// Create a client with an injected transport and clock
    pub fn with_transport(
        config: AppstoreConfig,
        transport: Arc<dyn HttpTransport>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            base_url: config.base_url()?,
            auth: AuthManager::new(&config, clock),
            etags: EtagStore::new(),
            builder: RequestBuilder::new(config.user_agent.as_str()),
            transport,
        })
    }

    pub fn auth(&self) -> &AuthManager {
        &self.auth
    }

    pub fn etags(&self) -> &EtagStore {
        &self.etags
    }

    pub fn etags_mut(&mut self) -> &mut EtagStore {
        &mut self.etags
    }

    pub fn needs_authentication(&self) -> bool {
        self.auth.needs_authentication()
    }

    /// Exchange client credentials for a new token, unconditionally
    pub async fn authenticate(&mut self) -> Result<&Credentials> {
        self.auth
            .authenticate(&self.builder, self.transport.as_ref())
            .await
    }

    /// Reuse the current token if still valid, otherwise exchange for a new one
    pub async fn authenticate_if_needed(&mut self) -> Result<&Credentials> {
        self.auth
            .authenticate_if_needed(&self.builder, self.transport.as_ref())
            .await
    }

    // ========================================================================
    // Edits
    // ========================================================================

    /// The app's open edit, if there is one
    pub async fn get_active_edit(&mut self, app_id: &str) -> Result<Option<Edit>> {
        let response = self
            .send(Verb::Get, &paths::edits(app_id), RequestBody::Empty, None)
            .await?;

        let body = match response.body {
            None => return Ok(None),
            Some(Value::Object(ref map)) if map.is_empty() => return Ok(None),
            Some(ref body) => body.clone(),
        };

        let edit: Edit = serde_json::from_value(body)?;
        self.remember(&key::edit(&edit.id), &response);
        Ok(Some(edit))
    }

    #[instrument(skip(self))]
    pub async fn create_edit(&mut self, app_id: &str) -> Result<Edit> {
        let response = self
            .send(Verb::Post, &paths::edits(app_id), RequestBody::Empty, None)
            .await?;
        let edit: Edit = decode(response.body.clone())?;
        self.remember(&key::edit(&edit.id), &response);
        info!(edit_id = %edit.id, "created edit");
        Ok(edit)
    }

    pub async fn get_edit(&mut self, app_id: &str, edit_id: &str) -> Result<Edit> {
        self.fetch(&paths::edit(app_id, edit_id), &key::edit(edit_id))
            .await
    }

    #[instrument(skip(self))]
    pub async fn delete_edit(&mut self, app_id: &str, edit_id: &str) -> Result<()> {
        self.delete(&paths::edit(app_id, edit_id), &key::edit(edit_id))
            .await?;
        info!(edit_id, "deleted edit");
        Ok(())
    }

    /// Ask the service to validate the edit.
    ///
    /// Validation failures come back as an [`AppstoreError::Api`] whose body
    /// lists the offending fields.
    pub async fn validate_edit(&mut self, app_id: &str, edit_id: &str) -> Result<Edit> {
        let path = paths::edit(app_id, edit_id).join("validate");
        self.write(Verb::Post, &path, RequestBody::Empty, &key::edit(edit_id))
            .await
    }

    #[instrument(skip(self))]
    pub async fn commit_edit(&mut self, app_id: &str, edit_id: &str) -> Result<Edit> {
        let path = paths::edit(app_id, edit_id).join("commit");
        let edit = self
            .write(Verb::Post, &path, RequestBody::Empty, &key::edit(edit_id))
            .await?;
        info!(edit_id, "committed edit");
        Ok(edit)
    }

    // ========================================================================
    // Listings
    // ========================================================================

    /// All listings of the edit, keyed by language
    pub async fn get_listings(
        &mut self,
        app_id: &str,
        edit_id: &str,
    ) -> Result<BTreeMap<String, Listing>> {
        let response: ListingsResponse = self
            .fetch(&paths::listings(app_id, edit_id), &key::listings(edit_id))
            .await?;
        Ok(response.listings)
    }

    pub async fn get_listing(&mut self, app_id: &str, edit_id: &str, language: &str) -> Result<Listing> {
        self.fetch(
            &paths::listing(app_id, edit_id, language),
            &key::listing(edit_id, language),
        )
        .await
    }

    pub async fn update_listing(
        &mut self,
        app_id: &str,
        edit_id: &str,
        language: &str,
        listing: &Listing,
    ) -> Result<Listing> {
        self.write(
            Verb::Put,
            &paths::listing(app_id, edit_id, language),
            RequestBody::Json(serde_json::to_value(listing)?),
            &key::listing(edit_id, language),
        )
        .await
    }

    pub async fn delete_listing(&mut self, app_id: &str, edit_id: &str, language: &str) -> Result<()> {
        self.delete(
            &paths::listing(app_id, edit_id, language),
            &key::listing(edit_id, language),
        )
        .await
    }

    // ========================================================================
    // Details
    // ========================================================================

    pub async fn get_details(&mut self, app_id: &str, edit_id: &str) -> Result<AppDetails> {
        self.fetch(&paths::details(app_id, edit_id), &key::details(edit_id))
            .await
    }

    pub async fn update_details(
        &mut self,
        app_id: &str,
        edit_id: &str,
        details: &AppDetails,
    ) -> Result<AppDetails> {
        self.write(
            Verb::Put,
            &paths::details(app_id, edit_id),
            RequestBody::Json(serde_json::to_value(details)?),
            &key::details(edit_id),
        )
        .await
    }

    // ========================================================================
    // APKs
    // ========================================================================

    pub async fn list_apks(&mut self, app_id: &str, edit_id: &str) -> Result<Vec<Apk>> {
        self.fetch(&paths::apks(app_id, edit_id), &key::apks(edit_id))
            .await
    }

    pub async fn get_apk(&mut self, app_id: &str, edit_id: &str, apk_id: &str) -> Result<Apk> {
        self.fetch(&paths::apk(app_id, edit_id, apk_id), &key::apk(apk_id))
            .await
    }

    #[instrument(skip(self))]
    pub async fn delete_apk(&mut self, app_id: &str, edit_id: &str, apk_id: &str) -> Result<()> {
        self.delete(&paths::apk(app_id, edit_id, apk_id), &key::apk(apk_id))
            .await
    }

    /// Replace an APK's binary. Device targeting is kept by the service.
    #[instrument(skip(self))]
    pub async fn replace_apk(
        &mut self,
        app_id: &str,
        edit_id: &str,
        apk_id: &str,
        apk_path: &Path,
    ) -> Result<Apk> {
        let path = paths::apk(app_id, edit_id, apk_id).join("replace");
        self.write(
            Verb::Put,
            &path,
            RequestBody::Multipart(vec![FormPart::file(APK_PART_NAME, apk_path)]),
            &key::apk(apk_id),
        )
        .await
    }

    /// Upload a new APK into the edit
    #[instrument(skip(self))]
    pub async fn upload_apk(&mut self, app_id: &str, edit_id: &str, apk_path: &Path) -> Result<Apk> {
        let path = paths::apks(app_id, edit_id).join("upload");
        let response = self
            .send(
                Verb::Post,
                &path,
                RequestBody::Multipart(vec![FormPart::file(APK_PART_NAME, apk_path)]),
                Some(&key::edit(edit_id)),
            )
            .await?;
        let apk: Apk = decode(response.body.clone())?;
        self.remember(&key::apk(&apk.id), &response);
        Ok(apk)
    }

    /// First half of a large upload: stage the binary and get its file ID.
    ///
    /// Pass the returned ID to [`ApiClient::attach_apk`] to add it to the edit.
    #[instrument(skip(self))]
    pub async fn upload_large_apk(
        &mut self,
        app_id: &str,
        edit_id: &str,
        apk_path: &Path,
    ) -> Result<String> {
        let path = paths::apks(app_id, edit_id).join("large").join("upload");
        let response = self
            .send(
                Verb::Post,
                &path,
                RequestBody::Raw(UploadSource::file(apk_path)),
                Some(&key::edit(edit_id)),
            )
            .await?;
        let staged: LargeUpload = decode(response.body)?;
        debug!(file_id = %staged.file_id, "staged large upload");
        Ok(staged.file_id)
    }

    /// Second half of a large upload: attach a staged file to the edit
    #[instrument(skip(self))]
    pub async fn attach_apk(&mut self, app_id: &str, edit_id: &str, file_id: &str) -> Result<Apk> {
        let path = paths::apks(app_id, edit_id).join("attach");
        let response = self
            .send(
                Verb::Post,
                &path,
                RequestBody::Json(json!({ "fileId": file_id })),
                Some(&key::edit(edit_id)),
            )
            .await?;
        let apk: Apk = decode(response.body.clone())?;
        self.remember(&key::apk(&apk.id), &response);
        Ok(apk)
    }

    // ========================================================================
    // Images
    // ========================================================================

    pub async fn list_images(
        &mut self,
        app_id: &str,
        edit_id: &str,
        language: &str,
        image_type: ImageType,
    ) -> Result<Vec<ImageAsset>> {
        let response: ImagesResponse = self
            .fetch(
                &paths::images(app_id, edit_id, language, image_type),
                &key::images(edit_id, language, image_type.as_str()),
            )
            .await?;
        Ok(response.images)
    }

    #[instrument(skip(self))]
    pub async fn upload_image(
        &mut self,
        app_id: &str,
        edit_id: &str,
        language: &str,
        image_type: ImageType,
        image_path: &Path,
    ) -> Result<ImageAsset> {
        self.write(
            Verb::Post,
            &paths::images(app_id, edit_id, language, image_type),
            RequestBody::Raw(UploadSource::file(image_path)),
            &key::images(edit_id, language, image_type.as_str()),
        )
        .await
    }

    /// Delete every image of one type
    pub async fn delete_images(
        &mut self,
        app_id: &str,
        edit_id: &str,
        language: &str,
        image_type: ImageType,
    ) -> Result<()> {
        self.delete(
            &paths::images(app_id, edit_id, language, image_type),
            &key::images(edit_id, language, image_type.as_str()),
        )
        .await
    }

    /// Delete one image
    pub async fn delete_image(
        &mut self,
        app_id: &str,
        edit_id: &str,
        language: &str,
        image_type: ImageType,
        asset_id: &str,
    ) -> Result<()> {
        let path = paths::images(app_id, edit_id, language, image_type).join(asset_id);
        self.delete(&path, &key::images(edit_id, language, image_type.as_str()))
            .await
    }

    // ========================================================================
    // Videos
    // ========================================================================

    pub async fn list_videos(
        &mut self,
        app_id: &str,
        edit_id: &str,
        language: &str,
    ) -> Result<Vec<VideoAsset>> {
        let response: VideosResponse = self
            .fetch(
                &paths::videos(app_id, edit_id, language),
                &key::videos(edit_id, language),
            )
            .await?;
        Ok(response.videos)
    }

    #[instrument(skip(self))]
    pub async fn upload_video(
        &mut self,
        app_id: &str,
        edit_id: &str,
        language: &str,
        video_path: &Path,
    ) -> Result<VideoAsset> {
        let path = paths::videos(app_id, edit_id, language).join("upload");
        self.write(
            Verb::Post,
            &path,
            RequestBody::Raw(UploadSource::file(video_path)),
            &key::videos(edit_id, language),
        )
        .await
    }

    pub async fn delete_videos(&mut self, app_id: &str, edit_id: &str, language: &str) -> Result<()> {
        self.delete(
            &paths::videos(app_id, edit_id, language),
            &key::videos(edit_id, language),
        )
        .await
    }

    pub async fn delete_video(
        &mut self,
        app_id: &str,
        edit_id: &str,
        language: &str,
        asset_id: &str,
    ) -> Result<()> {
        let path = paths::videos(app_id, edit_id, language).join(asset_id);
        self.delete(&path, &key::videos(edit_id, language)).await
    }

    // ========================================================================
    // Availability and targeting
    // ========================================================================

    pub async fn get_availability(&mut self, app_id: &str, edit_id: &str) -> Result<Availability> {
        self.fetch(
            &paths::availability(app_id, edit_id),
            &key::availability(edit_id),
        )
        .await
    }

    pub async fn update_availability(
        &mut self,
        app_id: &str,
        edit_id: &str,
        availability: &Availability,
    ) -> Result<Availability> {
        self.write(
            Verb::Put,
            &paths::availability(app_id, edit_id),
            RequestBody::Json(serde_json::to_value(availability)?),
            &key::availability(edit_id),
        )
        .await
    }

    pub async fn get_targeting(&mut self, app_id: &str, edit_id: &str, apk_id: &str) -> Result<Targeting> {
        self.fetch(
            &paths::targeting(app_id, edit_id, apk_id),
            &key::targeting(apk_id),
        )
        .await
    }

    pub async fn update_targeting(
        &mut self,
        app_id: &str,
        edit_id: &str,
        apk_id: &str,
        targeting: &Targeting,
    ) -> Result<Targeting> {
        self.write(
            Verb::Put,
            &paths::targeting(app_id, edit_id, apk_id),
            RequestBody::Json(serde_json::to_value(targeting)?),
            &key::targeting(apk_id),
        )
        .await
    }

    // ========================================================================
    // Request plumbing
    // ========================================================================

    /// Authenticated round trip; `if_match_key` names the ETag to attach
    async fn send(
        &self,
        verb: Verb,
        path: &ResourcePath,
        body: RequestBody,
        if_match_key: Option<&str>,
    ) -> Result<TransportResponse> {
        if self.auth.needs_authentication() {
            return Err(AppstoreError::requires_authentication());
        }
        let token = self
            .auth
            .access_token()
            .ok_or_else(AppstoreError::requires_authentication)?;

        let url = path.resolve(&self.base_url)?;
        let mut headers = HeaderMap::new();

        let if_match = if_match_key.and_then(|key| self.etags.get(key));
        if let Some(etag) = if_match {
            headers.insert(IF_MATCH, header_value(etag)?);
        }

        let mut authorization = header_value(&format!("Bearer {}", token))?;
        authorization.set_sensitive(true);
        headers.insert(AUTHORIZATION, authorization);

        debug!(verb = %verb, url = %url, if_match = if_match.is_some(), "sending request");
        let request = self.builder.build(url, verb, body, &headers)?;
        self.transport.execute(request).await
    }

    async fn fetch<T: DeserializeOwned>(&mut self, path: &ResourcePath, key: &str) -> Result<T> {
        let response = self
            .send(Verb::Get, path, RequestBody::Empty, None)
            .await?;
        self.remember(key, &response);
        decode(response.body)
    }

    async fn write<T: DeserializeOwned>(
        &mut self,
        verb: Verb,
        path: &ResourcePath,
        body: RequestBody,
        key: &str,
    ) -> Result<T> {
        let response = self.send(verb, path, body, Some(key)).await?;
        self.remember(key, &response);
        decode(response.body)
    }

    async fn delete(&mut self, path: &ResourcePath, key: &str) -> Result<()> {
        self.send(Verb::Delete, path, RequestBody::Empty, Some(key))
            .await?;
        self.etags.remove(key);
        Ok(())
    }

    fn remember(&mut self, key: &str, response: &TransportResponse) {
        if let Some(etag) = response.etag() {
            self.etags.set(key, etag);
        }
    }
}

fn decode<T: DeserializeOwned>(body: Option<Value>) -> Result<T> {
    Ok(serde_json::from_value(body.unwrap_or(Value::Null))?)
}

/// Resource paths, relative to the API base
mod paths {
    use url::Url;

    use crate::error::{AppstoreError, Result};
    use crate::types::ImageType;

    /// Path below the API base, kept as whole segments.
    ///
    /// Each identifier becomes exactly one percent-encoded segment, so `/`,
    /// `?` or `#` inside an ID cannot move the request to another resource.
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct ResourcePath(Vec<String>);

    impl ResourcePath {
        pub fn join(mut self, segment: &str) -> Self {
            self.0.push(segment.to_string());
            self
        }

        /// Append the segments to `base`. Empty and dot segments are rejected.
        pub fn resolve(&self, base: &Url) -> Result<Url> {
            if let Some(bad) = self
                .0
                .iter()
                .find(|s| s.is_empty() || *s == "." || *s == "..")
            {
                return Err(AppstoreError::InvalidRequest(format!(
                    "invalid path segment {:?}",
                    bad
                )));
            }

            let mut url = base.clone();
            url.path_segments_mut()
                .map_err(|_| {
                    AppstoreError::Configuration(format!("api base cannot hold a path: {}", base))
                })?
                .pop_if_empty()
                .extend(&self.0);
            Ok(url)
        }
    }

    pub fn edits(app_id: &str) -> ResourcePath {
        ResourcePath(vec![
            "v1".to_string(),
            "applications".to_string(),
            app_id.to_string(),
            "edits".to_string(),
        ])
    }

    pub fn edit(app_id: &str, edit_id: &str) -> ResourcePath {
        edits(app_id).join(edit_id)
    }

    pub fn listings(app_id: &str, edit_id: &str) -> ResourcePath {
        edit(app_id, edit_id).join("listings")
    }

    pub fn listing(app_id: &str, edit_id: &str, language: &str) -> ResourcePath {
        listings(app_id, edit_id).join(language)
    }

    pub fn details(app_id: &str, edit_id: &str) -> ResourcePath {
        edit(app_id, edit_id).join("details")
    }

    pub fn availability(app_id: &str, edit_id: &str) -> ResourcePath {
        edit(app_id, edit_id).join("availability")
    }

    pub fn apks(app_id: &str, edit_id: &str) -> ResourcePath {
        edit(app_id, edit_id).join("apks")
    }

    pub fn apk(app_id: &str, edit_id: &str, apk_id: &str) -> ResourcePath {
        apks(app_id, edit_id).join(apk_id)
    }

    pub fn targeting(app_id: &str, edit_id: &str, apk_id: &str) -> ResourcePath {
        apk(app_id, edit_id, apk_id).join("targeting")
    }

    pub fn images(app_id: &str, edit_id: &str, language: &str, image_type: ImageType) -> ResourcePath {
        listing(app_id, edit_id, language).join(image_type.as_str())
    }

    pub fn videos(app_id: &str, edit_id: &str, language: &str) -> ResourcePath {
        listing(app_id, edit_id, language).join("videos")
    }
}
