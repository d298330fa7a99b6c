//! API trait and implementations.
//!
//! [`Api`] covers the Platform API operations this crate needs. The real
//! implementation is [`http::HttpApi`]; [`MockApi`] keeps everything in
//! memory for tests.
//!
//! # Testing
//!
//! ```
//! use tursokit::backend::{Api, MockApi};
//! use tursokit::CreateDatabaseInput;
//!
//! let mock = MockApi::new();
//! let db = mock
//!     .create_database("acme", &CreateDatabaseInput {
//!         name: "orders".to_string(),
//!         group: "default".to_string(),
//!         ..Default::default()
//!     })
//!     .unwrap();
//! assert_eq!(db.hostname, "orders-acme.turso.io");
//! ```

pub mod http;

use crate::error::{Error, Result};
use crate::types::{
    ApiToken, CreateDatabaseInput, CreateDatabaseTokenInput, CreatedApiToken, Database,
    DatabaseConfiguration, DatabaseToken, Instance, Organization, TokenAuthorization,
};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Operations against the Turso Platform API.
///
/// A missing object is reported as [`Error::NotFound`]; every other failure
/// keeps its own variant so callers never mistake one for the other.
pub trait Api: Send + Sync {
    fn create_database(&self, org: &str, input: &CreateDatabaseInput) -> Result<Database>;

    fn get_database(&self, org: &str, name: &str) -> Result<Database>;

    fn delete_database(&self, org: &str, name: &str) -> Result<()>;

    fn get_database_configuration(&self, org: &str, database: &str)
    -> Result<DatabaseConfiguration>;

    /// PATCH the configuration; returns the configuration after the change.
    fn update_database_configuration(
        &self,
        org: &str,
        database: &str,
        configuration: &DatabaseConfiguration,
    ) -> Result<DatabaseConfiguration>;

    /// Mint a new database token.
    fn create_database_token(
        &self,
        org: &str,
        database: &str,
        input: &CreateDatabaseTokenInput,
    ) -> Result<DatabaseToken>;

    fn list_api_tokens(&self) -> Result<Vec<ApiToken>>;

    fn create_api_token(&self, name: &str) -> Result<CreatedApiToken>;

    fn revoke_api_token(&self, name: &str) -> Result<()>;

    fn get_organization(&self, slug: &str) -> Result<Organization>;

    fn get_instance(&self, org: &str, database: &str, instance: &str) -> Result<Instance>;
}

#[derive(Debug, Default)]
struct Store {
    databases: BTreeMap<(String, String), Database>,
    configurations: BTreeMap<(String, String), DatabaseConfiguration>,
    api_tokens: Vec<CreatedApiToken>,
    organizations: BTreeMap<String, Organization>,
    instances: BTreeMap<(String, String, String), Instance>,
    calls: Vec<String>,
    offline: bool,
    sequence: u32,
}

impl Store {
    fn next_id(&mut self) -> u32 {
        self.sequence += 1;
        self.sequence
    }
}

/// In-memory API for tests.
///
/// Clones share the same store, so a test can hand one clone to the code
/// under test and inspect another.
#[derive(Debug, Clone, Default)]
pub struct MockApi {
    store: Arc<Mutex<Store>>,
}

fn key(org: &str, name: &str) -> (String, String) {
    (org.to_string(), name.to_string())
}

impl MockApi {
    /// Create a new empty mock API.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Store> {
        self.store.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Record a call and fail it when offline.
    fn enter(&self, call: String) -> Result<MutexGuard<'_, Store>> {
        let mut store = self.lock();
        store.calls.push(call);
        if store.offline {
            return Err(Error::http("connection refused", None));
        }
        Ok(store)
    }

    /// Make every subsequent call fail with a transport error.
    pub fn set_offline(&self, offline: bool) {
        self.lock().offline = offline;
    }

    /// Calls made so far, as `METHOD path` strings.
    pub fn calls(&self) -> Vec<String> {
        self.lock().calls.clone()
    }

    pub fn add_organization(&self, organization: Organization) {
        self.lock()
            .organizations
            .insert(organization.slug.clone(), organization);
    }

    pub fn add_instance(&self, org: &str, database: &str, instance: Instance) {
        self.lock().instances.insert(
            (org.to_string(), database.to_string(), instance.name.clone()),
            instance,
        );
    }

    /// Remove a database behind the caller's back, as another client would.
    pub fn forget_database(&self, org: &str, name: &str) {
        let mut store = self.lock();
        store.databases.remove(&key(org, name));
        store.configurations.remove(&key(org, name));
    }
}

impl Api for MockApi {
    fn create_database(&self, org: &str, input: &CreateDatabaseInput) -> Result<Database> {
        let mut store = self.enter(format!("POST /v1/organizations/{org}/databases"))?;
        if store.databases.contains_key(&key(org, &input.name)) {
            return Err(Error::Api {
                status: 409,
                message: format!("database {} already exists", input.name),
            });
        }

        let id = store.next_id();
        let database = Database {
            name: input.name.clone(),
            db_id: format!("00000000-0000-4000-8000-{id:012}"),
            hostname: format!("{}-{org}.turso.io", input.name),
            group: Some(input.group.clone()),
            is_schema: input.is_schema.unwrap_or(false),
            schema: input.schema.clone(),
        };
        store
            .databases
            .insert(key(org, &input.name), database.clone());
        store.configurations.insert(
            key(org, &input.name),
            DatabaseConfiguration {
                size_limit: input.size_limit.clone(),
                block_reads: Some(false),
                block_writes: Some(false),
                delete_protection: Some(false),
            },
        );
        Ok(database)
    }

    fn get_database(&self, org: &str, name: &str) -> Result<Database> {
        let store = self.enter(format!("GET /v1/organizations/{org}/databases/{name}"))?;
        store
            .databases
            .get(&key(org, name))
            .cloned()
            .ok_or_else(|| Error::not_found("database", format!("could not find database {name}")))
    }

    fn delete_database(&self, org: &str, name: &str) -> Result<()> {
        let mut store = self.enter(format!("DELETE /v1/organizations/{org}/databases/{name}"))?;
        store.configurations.remove(&key(org, name));
        store
            .databases
            .remove(&key(org, name))
            .map(|_| ())
            .ok_or_else(|| Error::not_found("database", format!("could not find database {name}")))
    }

    fn get_database_configuration(
        &self,
        org: &str,
        database: &str,
    ) -> Result<DatabaseConfiguration> {
        let store = self.enter(format!(
            "GET /v1/organizations/{org}/databases/{database}/configuration"
        ))?;
        store
            .configurations
            .get(&key(org, database))
            .cloned()
            .ok_or_else(|| {
                Error::not_found("database", format!("could not find database {database}"))
            })
    }

    fn update_database_configuration(
        &self,
        org: &str,
        database: &str,
        configuration: &DatabaseConfiguration,
    ) -> Result<DatabaseConfiguration> {
        let mut store = self.enter(format!(
            "PATCH /v1/organizations/{org}/databases/{database}/configuration"
        ))?;
        let current = store
            .configurations
            .get_mut(&key(org, database))
            .ok_or_else(|| {
                Error::not_found("database", format!("could not find database {database}"))
            })?;
        current.apply(configuration);
        Ok(current.clone())
    }

    fn create_database_token(
        &self,
        org: &str,
        database: &str,
        input: &CreateDatabaseTokenInput,
    ) -> Result<DatabaseToken> {
        let mut store = self.enter(format!(
            "POST /v1/organizations/{org}/databases/{database}/auth/tokens"
        ))?;
        if !store.databases.contains_key(&key(org, database)) {
            return Err(Error::not_found(
                "database",
                format!("could not find database {database}"),
            ));
        }
        let id = store.next_id();
        let access = input.authorization.unwrap_or(TokenAuthorization::FullAccess);
        Ok(DatabaseToken {
            jwt: format!("eyJ.{org}.{database}.{access}.{id}"),
        })
    }

    fn list_api_tokens(&self) -> Result<Vec<ApiToken>> {
        let store = self.enter("GET /v1/auth/api-tokens".to_string())?;
        Ok(store
            .api_tokens
            .iter()
            .map(|t| ApiToken {
                id: t.id.clone(),
                name: t.name.clone(),
            })
            .collect())
    }

    fn create_api_token(&self, name: &str) -> Result<CreatedApiToken> {
        let mut store = self.enter(format!("POST /v1/auth/api-tokens/{name}"))?;
        if store.api_tokens.iter().any(|t| t.name == name) {
            return Err(Error::Api {
                status: 409,
                message: format!("token {name} already exists"),
            });
        }
        let id = store.next_id();
        let token = CreatedApiToken {
            id: format!("tok-{id}"),
            name: name.to_string(),
            token: format!("turso-api-{name}-{id}"),
        };
        store.api_tokens.push(token.clone());
        Ok(token)
    }

    fn revoke_api_token(&self, name: &str) -> Result<()> {
        let mut store = self.enter(format!("DELETE /v1/auth/api-tokens/{name}"))?;
        let before = store.api_tokens.len();
        store.api_tokens.retain(|t| t.name != name);
        if store.api_tokens.len() == before {
            return Err(Error::not_found("api token", format!("could not find token {name}")));
        }
        Ok(())
    }

    fn get_organization(&self, slug: &str) -> Result<Organization> {
        let store = self.enter(format!("GET /v1/organizations/{slug}"))?;
        store.organizations.get(slug).cloned().ok_or_else(|| {
            Error::not_found("organization", format!("could not find organization {slug}"))
        })
    }

    fn get_instance(&self, org: &str, database: &str, instance: &str) -> Result<Instance> {
        let store = self.enter(format!(
            "GET /v1/organizations/{org}/databases/{database}/instances/{instance}"
        ))?;
        store
            .instances
            .get(&(org.to_string(), database.to_string(), instance.to_string()))
            .cloned()
            .ok_or_else(|| {
                Error::not_found("instance", format!("could not find instance {instance}"))
            })
    }
}
