//! API client for the church-management REST API.
//!
//! Every endpoint answers with an `Envelope`. Non-2xx statuses become
//! `ApiError`s through `ApiError::from_status`, and an envelope with
//! `success: false` becomes `ApiError::Rejected`.

use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::{header, multipart, Client, Method, RequestBuilder};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, info};

use crate::attachment::ImageAttachment;
use crate::auth::{Credential, Profile};
use crate::models::{ChurchEvent, ChurchEventInput, Devotion, DevotionInput, Envelope, UserProgress};

use super::ApiError;

/// HTTP request timeout in seconds.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Fields of the login payload that never go into the stored profile
const TOKEN_FIELDS: [&str; 2] = ["accessToken", "refreshToken"];

/// Result of a successful sign in
#[derive(Debug, Clone)]
pub struct LoginOutcome {
    pub credential: Credential,
    /// Greeting or notice sent with the response, if any
    pub message: Option<String>,
}

/// One page of devotions plus the server-side total
#[derive(Debug, Clone, PartialEq)]
pub struct DevotionPage {
    pub items: Vec<Devotion>,
    pub total_count: u64,
}

#[derive(Serialize)]
struct LoginRequest<'a> {
    email: &'a str,
    password: &'a str,
}

/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: None,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Set the bearer token for authenticated requests
    pub fn set_token(&mut self, token: String) {
        self.token = Some(token);
    }

    pub fn clear_token(&mut self) {
        self.token = None;
    }

    pub fn has_token(&self) -> bool {
        self.token.is_some()
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self
            .client
            .request(method, self.url(path))
            .header(header::ACCEPT, "application/json");
        match self.token {
            Some(ref token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    /// Check if response is successful, returning an error with body if not.
    async fn check_response(response: reqwest::Response) -> Result<reqwest::Response> {
        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::from_status(status, &body).into())
        }
    }

    /// Send, check the status and decode the envelope
    async fn send<T: DeserializeOwned>(
        &self,
        builder: RequestBuilder,
        what: &str,
    ) -> Result<Envelope<T>> {
        let response = builder
            .send()
            .await
            .map_err(ApiError::from)
            .with_context(|| format!("Failed to send {what} request"))?;
        let response = Self::check_response(response).await?;

        let text = response
            .text()
            .await
            .map_err(ApiError::from)
            .with_context(|| format!("Failed to read {what} response"))?;
        let envelope: Envelope<T> = serde_json::from_str(&text).map_err(|e| {
            ApiError::InvalidResponse(format!("Unexpected {what} response: {e}"))
        })?;

        if !envelope.success {
            let message = envelope
                .message()
                .unwrap_or("The server declined the request")
                .to_string();
            return Err(ApiError::Rejected { message }.into());
        }
        Ok(envelope)
    }

    /// Like `send`, but a missing `data` payload is an error
    async fn send_data<T: DeserializeOwned>(&self, builder: RequestBuilder, what: &str) -> Result<T> {
        self.send::<T>(builder, what)
            .await?
            .data
            .ok_or_else(|| ApiError::InvalidResponse(format!("{what} response has no data")).into())
    }

    // ===== Authentication =====

    /// Sign in with email and password. Does not change this client's token.
    pub async fn login(&self, email: &str, password: &str) -> Result<LoginOutcome> {
        let builder = self
            .request(Method::POST, "/auth/login")
            .json(&LoginRequest { email, password });
        let envelope: Envelope<Map<String, Value>> = self.send(builder, "login").await?;
        let message = envelope.message().map(str::to_string);
        let data = envelope
            .data
            .ok_or_else(|| ApiError::InvalidResponse("login response has no data".to_string()))?;

        let credential = credential_from_login(data)?;
        info!(user_id = %credential.user.id, "Authenticated");
        Ok(LoginOutcome {
            credential,
            message,
        })
    }

    // ===== Devotions =====

    pub async fn fetch_devotions(&self, offset: usize, limit: usize) -> Result<DevotionPage> {
        let builder = self
            .request(Method::GET, "/devotions")
            .query(&[("offset", offset), ("limit", limit)]);
        let envelope: Envelope<Vec<Devotion>> = self.send(builder, "devotions").await?;
        let total_count = envelope.total_count;
        let items = envelope.into_list();
        let total_count = total_count.unwrap_or(items.len() as u64);
        debug!(count = items.len(), total_count, "Fetched devotions");
        Ok(DevotionPage { items, total_count })
    }

    pub async fn fetch_devotion(&self, id: i64) -> Result<Devotion> {
        let builder = self.request(Method::GET, &format!("/devotions/{id}"));
        self.send_data(builder, "devotion").await
    }

    pub async fn create_devotion(&self, input: &DevotionInput) -> Result<Devotion> {
        let builder = self.request(Method::POST, "/devotions").json(input);
        let devotion: Devotion = self.send_data(builder, "create devotion").await?;
        info!(id = devotion.id, "Created devotion");
        Ok(devotion)
    }

    pub async fn update_devotion(&self, id: i64, input: &DevotionInput) -> Result<Devotion> {
        let builder = self
            .request(Method::PUT, &format!("/devotions/{id}"))
            .json(input);
        let devotion = self.send_data(builder, "update devotion").await?;
        info!(id, "Updated devotion");
        Ok(devotion)
    }

    pub async fn delete_devotion(&self, id: i64) -> Result<()> {
        let builder = self.request(Method::DELETE, &format!("/devotions/{id}"));
        self.send::<Value>(builder, "delete devotion").await?;
        info!(id, "Deleted devotion");
        Ok(())
    }

    // ===== Church events =====

    pub async fn fetch_church_events(&self) -> Result<Vec<ChurchEvent>> {
        let builder = self.request(Method::GET, "/church-events");
        let envelope: Envelope<Vec<ChurchEvent>> = self.send(builder, "church events").await?;
        let events = envelope.into_list();
        debug!(count = events.len(), "Fetched church events");
        Ok(events)
    }

    pub async fn fetch_church_event(&self, id: i64) -> Result<ChurchEvent> {
        let builder = self.request(Method::GET, &format!("/church-events/{id}"));
        self.send_data(builder, "church event").await
    }

    pub async fn create_church_event(
        &self,
        input: &ChurchEventInput,
        image: Option<&ImageAttachment>,
    ) -> Result<ChurchEvent> {
        let form = event_form(input, image, false)?;
        let builder = self.request(Method::POST, "/church-events").multipart(form);
        let event: ChurchEvent = self.send_data(builder, "create church event").await?;
        info!(id = event.id, with_image = image.is_some(), "Created church event");
        Ok(event)
    }

    pub async fn update_church_event(
        &self,
        id: i64,
        input: &ChurchEventInput,
        image: Option<&ImageAttachment>,
    ) -> Result<ChurchEvent> {
        let form = event_form(input, image, true)?;
        let builder = self
            .request(Method::PUT, &format!("/church-events/{id}"))
            .multipart(form);
        let event = self.send_data(builder, "update church event").await?;
        info!(id, with_image = image.is_some(), "Updated church event");
        Ok(event)
    }

    pub async fn delete_church_event(&self, id: i64) -> Result<()> {
        let builder = self.request(Method::DELETE, &format!("/church-events/{id}"));
        self.send::<Value>(builder, "delete church event").await?;
        info!(id, "Deleted church event");
        Ok(())
    }

    // ===== Leaderboard =====

    pub async fn fetch_leaderboard(&self) -> Result<Vec<UserProgress>> {
        let builder = self.request(Method::GET, "/summa-logos/users-progress");
        let envelope: Envelope<Vec<UserProgress>> = self.send(builder, "leaderboard").await?;
        Ok(envelope.into_list())
    }
}

/// Multipart body for creating or updating a church event. On update with
/// no new file, the stored image URL is sent back so it is kept.
fn event_form(
    input: &ChurchEventInput,
    image: Option<&ImageAttachment>,
    is_update: bool,
) -> Result<multipart::Form> {
    let mut form = multipart::Form::new();
    for (name, value) in input.text_fields() {
        form = form.text(name, value);
    }

    match image {
        Some(image) => {
            let part = multipart::Part::bytes(image.bytes.clone())
                .file_name(image.file_name.clone())
                .mime_str(&image.mime)
                .map_err(ApiError::from)
                .context("Invalid image MIME type")?;
            form = form.part("eventImage", part);
        }
        None if is_update => {
            if let Some(ref url) = input.event_image_url {
                form = form.text("eventImageUrl", url.clone());
            }
        }
        None => {}
    }
    Ok(form)
}

/// Turn the login payload into a credential.
///
/// The token sits beside the profile fields. Some deployments nest the
/// profile under `user` instead; both shapes produce the same flat profile.
fn credential_from_login(mut data: Map<String, Value>) -> Result<Credential, ApiError> {
    let access_token = match data.get("accessToken") {
        Some(Value::String(token)) if !token.trim().is_empty() => token.clone(),
        _ => {
            return Err(ApiError::InvalidResponse(
                "login response has no access token".to_string(),
            ))
        }
    };

    let mut fields = match data.remove("user") {
        Some(Value::Object(user)) => user,
        Some(other) => {
            data.insert("user".to_string(), other);
            data
        }
        None => data,
    };
    for key in TOKEN_FIELDS {
        fields.remove(key);
    }

    let user: Profile = serde_json::from_value(Value::Object(fields))
        .map_err(|e| ApiError::InvalidResponse(format!("Unexpected login profile: {e}")))?;
    Ok(Credential::new(access_token, user))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn object(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("not an object"),
        }
    }

    #[test]
    fn test_flat_login_payload() {
        let data = object(json!({
            "id": 12, "name": "Jane", "email": "jane@church.org", "role": "admin",
            "isActive": true, "accessToken": "tok1", "refreshToken": "ref1"
        }));
        let credential = credential_from_login(data).unwrap();
        assert_eq!(credential.access_token, "tok1");
        assert_eq!(credential.user.id, 12);
        assert_eq!(credential.user.name, "Jane");
        assert_eq!(credential.user.extra.get("role"), Some(&json!("admin")));
        assert!(!credential.user.extra.contains_key("accessToken"));
        assert!(!credential.user.extra.contains_key("refreshToken"));
    }

    #[test]
    fn test_nested_user_payload() {
        let data = object(json!({
            "accessToken": "tok2",
            "user": {"id": 3, "name": "Ana", "email": "ana@church.org"}
        }));
        let credential = credential_from_login(data).unwrap();
        assert_eq!(credential.access_token, "tok2");
        assert_eq!(credential.user.name, "Ana");
        assert!(credential.user.extra.is_empty());
    }

    #[test]
    fn test_login_accepts_null_name_and_string_id() {
        let data = object(json!({
            "id": "u-17", "name": null, "email": "a@x.com", "accessToken": "tok4"
        }));
        let credential = credential_from_login(data).unwrap();
        assert_eq!(credential.user.id, "u-17");
        assert_eq!(credential.user.display_name(), None);
    }

    #[test]
    fn test_empty_token_is_invalid() {
        let data = object(json!({"id": 1, "name": "Ana", "accessToken": ""}));
        assert!(matches!(
            credential_from_login(data),
            Err(ApiError::InvalidResponse(_))
        ));

        let data = object(json!({"id": 1, "name": "Ana"}));
        assert!(credential_from_login(data).is_err());
    }

    #[test]
    fn test_new_trims_base_url() {
        let client = ApiClient::new("http://localhost:3000/api/v1/").unwrap();
        assert_eq!(client.base_url(), "http://localhost:3000/api/v1");
        assert!(!client.has_token());
    }
}
