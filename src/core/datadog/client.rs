//! Datadog Users API client
//!
//! Thin session over the v2 users endpoints, scoped to one organization's
//! credential pair. Every public method maps one logical operation to
//! outbound requests against the configured site.

use std::collections::HashMap;
use std::time::Duration;

use parking_lot::Mutex;
use reqwest::{Client, ClientBuilder, Method, Response};
use serde_json::{Value, json};
use tokio::time::timeout;
use tracing::{debug, info};

use super::config::DatadogConfig;
use super::error::PlatformError;
use crate::core::pending::PendingUser;
use crate::core::secrets::OrgCredential;

/// One authenticated session against a single organization
pub struct UsersClient {
    org: String,
    config: DatadogConfig,
    credential: OrgCredential,
    http_client: Client,
    // role name (lowercased) -> role id, cached for the session lifetime
    role_cache: Mutex<HashMap<String, String>>,
}

impl UsersClient {
    /// Open a session for an organization
    pub fn new(
        org: impl Into<String>,
        credential: OrgCredential,
        config: DatadogConfig,
    ) -> Result<Self, PlatformError> {
        config.validate()?;

        let http_client = ClientBuilder::new()
            .timeout(Duration::from_secs(config.request_timeout))
            .connect_timeout(Duration::from_secs(config.connect_timeout))
            .build()
            .map_err(|e| PlatformError::network(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            org: org.into(),
            config,
            credential,
            http_client,
            role_cache: Mutex::new(HashMap::new()),
        })
    }

    /// Organization this session is scoped to
    pub fn org(&self) -> &str {
        &self.org
    }

    /// Create a user with the given role and send the invitation email
    pub async fn invite(&self, name: &str, email: &str, role: &str) -> Result<(), PlatformError> {
        let role_id = self.resolve_role_id(role).await?;

        let body = json!({
            "data": {
                "type": "users",
                "attributes": { "name": name, "email": email },
                "relationships": {
                    "roles": { "data": [{ "id": role_id, "type": "roles" }] }
                }
            }
        });
        let created = self
            .send_json(Method::POST, "/api/v2/users", Some(&body))
            .await?;
        let user_id = created
            .pointer("/data/id")
            .and_then(Value::as_str)
            .ok_or_else(|| PlatformError::response_parsing("Create-user response missing data.id"))?
            .to_string();
        let status = created
            .pointer("/data/attributes/status")
            .and_then(Value::as_str)
            .unwrap_or("unknown");
        info!(org = %self.org, email, status, "User created");

        let invite_body = json!({
            "data": [{
                "type": "user_invitations",
                "relationships": {
                    "user": { "data": { "type": "users", "id": user_id } }
                }
            }]
        });
        self.send_json(Method::POST, "/api/v2/user_invitations", Some(&invite_body))
            .await?;
        info!(org = %self.org, email, "Invitation sent");
        Ok(())
    }

    /// Disable the user with the given email address
    pub async fn disable(&self, email: &str) -> Result<(), PlatformError> {
        let user_id = self
            .find_user_id(email)
            .await?
            .ok_or_else(|| PlatformError::not_found(format!("No user with email {}", email)))?;

        self.send_json(Method::DELETE, &format!("/api/v2/users/{}", user_id), None)
            .await?;
        info!(org = %self.org, email, "User disabled");
        Ok(())
    }

    /// List users whose invitation has not been accepted
    pub async fn list_pending(&self) -> Result<Vec<PendingUser>, PlatformError> {
        let mut pending = Vec::new();
        let mut next = Some(format!(
            "/api/v2/users?page[size]={}&filter[status]=Pending",
            self.config.page_size
        ));

        while let Some(path) = next {
            let page = self.send_json(Method::GET, &path, None).await?;
            for user in page.pointer("/data").and_then(Value::as_array).into_iter().flatten() {
                let status = user
                    .pointer("/attributes/status")
                    .and_then(Value::as_str)
                    .unwrap_or("");
                if !status.eq_ignore_ascii_case("pending") {
                    continue;
                }
                pending.push(PendingUser {
                    id: user.get("id").and_then(Value::as_str).unwrap_or("").to_string(),
                    name: user
                        .pointer("/attributes/name")
                        .and_then(Value::as_str)
                        .map(str::to_string),
                    email: user
                        .pointer("/attributes/email")
                        .and_then(Value::as_str)
                        .unwrap_or("")
                        .to_string(),
                });
            }
            next = next_page(&page);
        }

        Ok(pending)
    }

    /// Find a user id by email, paginating the full user listing
    async fn find_user_id(&self, email: &str) -> Result<Option<String>, PlatformError> {
        let mut next = Some(format!("/api/v2/users?page[size]={}", self.config.page_size));

        while let Some(path) = next {
            let page = self.send_json(Method::GET, &path, None).await?;
            for user in page.pointer("/data").and_then(Value::as_array).into_iter().flatten() {
                let candidate = user
                    .pointer("/attributes/email")
                    .and_then(Value::as_str)
                    .unwrap_or("");
                if candidate.eq_ignore_ascii_case(email) {
                    return Ok(user.get("id").and_then(Value::as_str).map(str::to_string));
                }
            }
            next = next_page(&page);
        }

        Ok(None)
    }

    /// Resolve a role name to its id, cached for the session lifetime
    async fn resolve_role_id(&self, role: &str) -> Result<String, PlatformError> {
        let key = role.to_lowercase();
        if let Some(id) = self.role_cache.lock().get(&key).cloned() {
            return Ok(id);
        }

        let response = self.send_json(Method::GET, "/api/v2/roles", None).await?;
        let roles = response
            .pointer("/data")
            .and_then(Value::as_array)
            .ok_or_else(|| PlatformError::response_parsing("Roles response missing data array"))?;

        for entry in roles {
            let name = entry
                .pointer("/attributes/name")
                .and_then(Value::as_str)
                .unwrap_or("");
            if name.eq_ignore_ascii_case(role) {
                let id = entry
                    .get("id")
                    .and_then(Value::as_str)
                    .ok_or_else(|| PlatformError::response_parsing("Role entry missing id"))?
                    .to_string();
                self.role_cache.lock().insert(key, id.clone());
                return Ok(id);
            }
        }

        Err(PlatformError::invalid_request(format!(
            "Role '{}' not found",
            role
        )))
    }

    /// Issue one request and parse the JSON response
    async fn send_json(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<Value, PlatformError> {
        // Pagination links come back as absolute URLs
        let url = if path.starts_with("http") {
            path.to_string()
        } else {
            format!("{}{}", self.config.api_base(), path)
        };
        debug!(org = %self.org, %url, "Datadog API request");

        let mut request = self
            .http_client
            .request(method, &url)
            .headers(self.build_headers());
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = timeout(
            Duration::from_secs(self.config.request_timeout),
            request.send(),
        )
        .await
        .map_err(|_| PlatformError::timeout(format!("Request to {} timed out", url)))?
        .map_err(|e| {
            if e.is_timeout() {
                PlatformError::timeout(format!("Request to {} timed out", url))
            } else {
                PlatformError::network(format!("Network error: {}", e))
            }
        })?;

        self.handle_response(response).await
    }

    /// Authentication headers for this organization's credential pair
    fn build_headers(&self) -> reqwest::header::HeaderMap {
        let mut headers = reqwest::header::HeaderMap::new();

        if let Ok(value) = self.credential.api_key.parse() {
            headers.insert("DD-API-KEY", value);
        }

        if let Ok(value) = self.credential.app_key.parse() {
            headers.insert("DD-APPLICATION-KEY", value);
        }

        headers.insert("Content-Type", "application/json".parse().unwrap());

        headers
    }

    async fn handle_response(&self, response: Response) -> Result<Value, PlatformError> {
        let status = response.status().as_u16();
        let text = response
            .text()
            .await
            .map_err(|e| PlatformError::network(format!("Failed to read response: {}", e)))?;

        if !(200..300).contains(&status) {
            return Err(PlatformError::from_http_status(status, &text));
        }

        // Delete returns an empty body
        if text.trim().is_empty() {
            return Ok(Value::Null);
        }

        serde_json::from_str(&text)
            .map_err(|e| PlatformError::response_parsing(format!("Failed to parse JSON: {}", e)))
    }
}

/// Next page URL from a paginated response, if any
fn next_page(page: &Value) -> Option<String> {
    page.pointer("/links/next")
        .and_then(Value::as_str)
        .map(str::to_string)
}
