use std::time::Duration;

use mongodb::bson::doc;
use mongodb::error::ErrorKind;
use mongodb::options::{ClientOptions, IndexOptions, ServerApi, ServerApiVersion};
use mongodb::{Client, IndexModel};
use thiserror::Error;
use tracing::{info, warn};

use super::mongo::MongoStore;
use super::store::Collection;
use crate::config::DatabaseConfig;

/// Errors from the collection store
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Missing configuration: {0}")]
    ConfigMissing(&'static str),

    #[error("Invalid database URL")]
    InvalidDatabaseUrl,

    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error(transparent)]
    Mongo(#[from] mongodb::error::Error),
}

impl DatabaseError {
    /// Whether the driver rejected a write because of a unique index
    pub fn is_duplicate_key(&self) -> bool {
        match self {
            DatabaseError::Mongo(err) => match err.kind.as_ref() {
                ErrorKind::Write(mongodb::error::WriteFailure::WriteError(e)) => e.code == 11000,
                ErrorKind::Command(e) => e.code == 11000,
                _ => false,
            },
            _ => false,
        }
    }

    /// Whether the server refused the query itself, e.g. an invalid `$regex`
    pub fn is_rejected_query(&self) -> bool {
        match self {
            DatabaseError::InvalidQuery(_) => true,
            DatabaseError::Mongo(err) => match err.kind.as_ref() {
                // BadValue, InvalidRegex
                ErrorKind::Command(e) => e.code == 2 || e.code == 51091,
                _ => false,
            },
            _ => false,
        }
    }

    /// Whether the failure is about reaching the deployment rather than the query
    pub fn is_connectivity(&self) -> bool {
        match self {
            DatabaseError::ConnectionError(_) => true,
            DatabaseError::Mongo(err) => matches!(
                err.kind.as_ref(),
                ErrorKind::ServerSelection { .. } | ErrorKind::Io(_) | ErrorKind::ConnectionPoolCleared { .. }
            ),
            _ => false,
        }
    }
}

/// Owns connection setup for the MongoDB deployment
pub struct DatabaseManager;

impl DatabaseManager {
    /// Kitchen entries are unique per owner and recipe
    const KITCHEN_INDEX_NAME: &'static str = "email_recipieId_unique";

    /// Connect, ping the deployment and prepare indexes
    pub async fn connect(config: &DatabaseConfig) -> Result<MongoStore, DatabaseError> {
        let connection_string = Self::build_connection_string(config)?;

        let mut options = ClientOptions::parse(&connection_string).await?;
        options.app_name = Some(env!("CARGO_PKG_NAME").to_string());
        options.connect_timeout = Some(Duration::from_secs(config.connection_timeout));
        options.server_selection_timeout = Some(Duration::from_secs(config.connection_timeout));
        options.server_api = Some(
            ServerApi::builder()
                .version(ServerApiVersion::V1)
                .strict(true)
                .deprecation_errors(true)
                .build(),
        );

        let client = Client::with_options(options)?;
        client
            .database("admin")
            .run_command(doc! { "ping": 1 }, None)
            .await
            .map_err(|e| DatabaseError::ConnectionError(e.to_string()))?;
        info!("Pinged deployment, connected to database '{}'", config.name);

        let store = MongoStore::new(client, &config.name);
        if let Err(e) = Self::ensure_indexes(&store).await {
            warn!("Could not create kitchen unique index: {}", e);
        }

        Ok(store)
    }

    async fn ensure_indexes(store: &MongoStore) -> Result<(), DatabaseError> {
        let index = IndexModel::builder()
            .keys(doc! { "email": 1, "recipieId": 1 })
            .options(
                IndexOptions::builder()
                    .name(Self::KITCHEN_INDEX_NAME.to_string())
                    .unique(true)
                    .build(),
            )
            .build();

        store.collection(Collection::Kitchen).create_index(index, None).await?;
        info!("Ensured index {} on {}", Self::KITCHEN_INDEX_NAME, Collection::Kitchen.name());
        Ok(())
    }

    /// DATABASE_URL wins; otherwise credentials are percent-encoded into an Atlas SRV URI
    pub fn build_connection_string(config: &DatabaseConfig) -> Result<String, DatabaseError> {
        if let Some(url) = &config.url {
            return Ok(url.clone());
        }

        let user = config.user.as_deref().ok_or(DatabaseError::ConfigMissing("DB_USER"))?;
        let pass = config.pass.as_deref().ok_or(DatabaseError::ConfigMissing("DB_PASS"))?;

        let mut url = url::Url::parse(&format!("mongodb+srv://{}/", config.host))
            .map_err(|_| DatabaseError::InvalidDatabaseUrl)?;
        url.set_username(user).map_err(|_| DatabaseError::InvalidDatabaseUrl)?;
        url.set_password(Some(pass)).map_err(|_| DatabaseError::InvalidDatabaseUrl)?;
        url.query_pairs_mut()
            .append_pair("retryWrites", "true")
            .append_pair("w", "majority");

        Ok(url.into())
    }
}
