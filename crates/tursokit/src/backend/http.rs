//! HTTP implementation of [`Api`] over a blocking `ureq` agent.
//!
//! The agent is built once and shared; it pools connections internally and
//! enforces a global per-request deadline. Non-2xx answers are decoded here
//! rather than by ureq so the service's `error` message is kept.

use crate::ClientConfig;
use crate::backend::Api;
use crate::error::{Error, Result};
use crate::types::{
    ApiToken, CreateDatabaseInput, CreateDatabaseTokenInput, CreatedApiToken, Database,
    DatabaseConfiguration, DatabaseToken, Instance, Organization,
};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::borrow::Cow;
use ureq::Body;
use ureq::http::Response;

/// Turso Platform API client.
///
/// # Example
///
/// ```no_run
/// use tursokit::{ClientConfig, HttpApi};
/// use tursokit::backend::Api;
///
/// let api = HttpApi::new(&ClientConfig::new("my-platform-token")).unwrap();
/// let db = api.get_database("acme", "orders").unwrap();
/// println!("{}", db.hostname);
/// ```
pub struct HttpApi {
    agent: ureq::Agent,
    base_url: String,
    authorization: String,
    user_agent: String,
}

impl HttpApi {
    /// Build a client from configuration.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if no API token is configured.
    pub fn new(config: &ClientConfig) -> Result<Self> {
        if config.api_token.trim().is_empty() {
            return Err(Error::Config("no API token configured".to_string()));
        }

        let agent: ureq::Agent = ureq::Agent::config_builder()
            .timeout_global(Some(config.timeout))
            .http_status_as_error(false)
            .build()
            .into();

        Ok(Self {
            agent,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            authorization: format!("Bearer {}", config.api_token),
            user_agent: config.user_agent.clone(),
        })
    }

    /// Get the API base URL.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    fn database_url(&self, org: &str, database: &str) -> String {
        self.url(&format!(
            "/v1/organizations/{}/databases/{}",
            segment(org),
            segment(database)
        ))
    }

    fn api_token_url(&self, name: &str) -> String {
        self.url(&format!("/v1/auth/api-tokens/{}", segment(name)))
    }

    fn get<T: DeserializeOwned>(&self, resource: &str, url: &str) -> Result<T> {
        log::trace!("GET {url}");
        let response = self
            .agent
            .get(url)
            .header("Authorization", &self.authorization)
            .header("User-Agent", &self.user_agent)
            .call()?;
        decode(resource, response)
    }

    fn delete(&self, resource: &str, url: &str) -> Result<()> {
        log::trace!("DELETE {url}");
        let mut response = self
            .agent
            .delete(url)
            .header("Authorization", &self.authorization)
            .header("User-Agent", &self.user_agent)
            .call()?;
        check(resource, &mut response)
    }
}

/// Percent-encode one path segment; `/` never survives as a separator.
fn segment(value: &str) -> Cow<'_, str> {
    urlencoding::encode(value)
}

/// Error body returned by the service.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

#[derive(Debug, Deserialize)]
struct DatabaseEnvelope {
    database: Database,
}

#[derive(Debug, Deserialize)]
struct TokensEnvelope {
    tokens: Vec<ApiToken>,
}

#[derive(Debug, Deserialize)]
struct OrganizationEnvelope {
    organization: Organization,
}

#[derive(Debug, Deserialize)]
struct InstanceEnvelope {
    instance: Instance,
}

/// Map a response to a value or a typed error.
fn decode<T: DeserializeOwned>(resource: &str, mut response: Response<Body>) -> Result<T> {
    check(resource, &mut response)?;
    response
        .body_mut()
        .read_json::<T>()
        .map_err(|e| Error::InvalidResponse(e.to_string()))
}

/// Turn a non-2xx response into a typed error.
fn check(resource: &str, response: &mut Response<Body>) -> Result<()> {
    let status = response.status().as_u16();
    if response.status().is_success() {
        return Ok(());
    }

    let body = response.body_mut().read_to_string().unwrap_or_default();
    let message = error_message(&body, status);
    log::debug!("{resource} request failed with HTTP {status}: {message}");

    if status == 404 {
        Err(Error::not_found(resource, message))
    } else {
        Err(Error::Api { status, message })
    }
}

/// The service's `error` field, else the raw body, else the status.
fn error_message(body: &str, status: u16) -> String {
    if let Ok(parsed) = serde_json::from_str::<ErrorBody>(body) {
        return parsed.error;
    }
    let trimmed = body.trim();
    if trimmed.is_empty() {
        format!("HTTP {status}")
    } else {
        trimmed.to_string()
    }
}

impl Api for HttpApi {
    fn create_database(&self, org: &str, input: &CreateDatabaseInput) -> Result<Database> {
        let url = self.url(&format!("/v1/organizations/{}/databases", segment(org)));
        log::trace!("POST {url}");
        let response = self
            .agent
            .post(&url)
            .header("Authorization", &self.authorization)
            .header("User-Agent", &self.user_agent)
            .send_json(input)?;
        decode::<DatabaseEnvelope>("database", response).map(|e| e.database)
    }

    fn get_database(&self, org: &str, name: &str) -> Result<Database> {
        self.get::<DatabaseEnvelope>("database", &self.database_url(org, name))
            .map(|e| e.database)
    }

    fn delete_database(&self, org: &str, name: &str) -> Result<()> {
        self.delete("database", &self.database_url(org, name))
    }

    fn get_database_configuration(
        &self,
        org: &str,
        database: &str,
    ) -> Result<DatabaseConfiguration> {
        let url = format!("{}/configuration", self.database_url(org, database));
        self.get("database", &url)
    }

    fn update_database_configuration(
        &self,
        org: &str,
        database: &str,
        configuration: &DatabaseConfiguration,
    ) -> Result<DatabaseConfiguration> {
        let url = format!("{}/configuration", self.database_url(org, database));
        log::trace!("PATCH {url}");
        let response = self
            .agent
            .patch(&url)
            .header("Authorization", &self.authorization)
            .header("User-Agent", &self.user_agent)
            .send_json(configuration)?;
        decode("database", response)
    }

    fn create_database_token(
        &self,
        org: &str,
        database: &str,
        input: &CreateDatabaseTokenInput,
    ) -> Result<DatabaseToken> {
        let url = format!("{}/auth/tokens", self.database_url(org, database));
        log::trace!("POST {url}");
        let mut request = self
            .agent
            .post(&url)
            .header("Authorization", &self.authorization)
            .header("User-Agent", &self.user_agent);
        if let Some(expiration) = &input.expiration {
            request = request.query("expiration", expiration);
        }
        if let Some(authorization) = input.authorization {
            request = request.query("authorization", authorization.as_str());
        }
        let response = request.send_empty()?;
        decode("database", response)
    }

    fn list_api_tokens(&self) -> Result<Vec<ApiToken>> {
        self.get::<TokensEnvelope>("api token", &self.url("/v1/auth/api-tokens"))
            .map(|e| e.tokens)
    }

    fn create_api_token(&self, name: &str) -> Result<CreatedApiToken> {
        let url = self.api_token_url(name);
        log::trace!("POST {url}");
        let response = self
            .agent
            .post(&url)
            .header("Authorization", &self.authorization)
            .header("User-Agent", &self.user_agent)
            .send_empty()?;
        decode("api token", response)
    }

    fn revoke_api_token(&self, name: &str) -> Result<()> {
        self.delete("api token", &self.api_token_url(name))
    }

    fn get_organization(&self, slug: &str) -> Result<Organization> {
        self.get::<OrganizationEnvelope>(
            "organization",
            &self.url(&format!("/v1/organizations/{}", segment(slug))),
        )
        .map(|e| e.organization)
    }

    fn get_instance(&self, org: &str, database: &str, instance: &str) -> Result<Instance> {
        let url = format!(
            "{}/instances/{}",
            self.database_url(org, database),
            segment(instance)
        );
        self.get::<InstanceEnvelope>("instance", &url)
            .map(|e| e.instance)
    }
}
