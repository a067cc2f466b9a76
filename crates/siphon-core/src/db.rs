use std::{sync::Arc, time::Duration};

use anyhow::{Context, Result};
use diesel::{ConnectionError, ConnectionResult};
use diesel_async::{
    pooled_connection::{bb8::Pool, AsyncDieselConnectionManager, ManagerConfig},
    AsyncPgConnection,
};
use futures::{future::BoxFuture, FutureExt};
use siphon_types::DbPool;
use url::Url;

pub const DEFAULT_POOL_SIZE: u32 = 10;
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Connection manager that dials through `tokio-postgres` with a native-tls connector,
/// so both plain and TLS tenant databases work from the same code path.
pub fn connection_manager(database_url: &str) -> AsyncDieselConnectionManager<AsyncPgConnection> {
    let mut config = ManagerConfig::default();
    config.custom_setup = Box::new(establish_connection);
    AsyncDieselConnectionManager::<AsyncPgConnection>::new_with_config(database_url, config)
}

/// Pool for the shared control plane database.
pub async fn new_db_pool(database_url: &str, max_size: Option<u32>) -> Result<Arc<DbPool>> {
    let pool = Pool::builder()
        .max_size(max_size.unwrap_or(DEFAULT_POOL_SIZE))
        .connection_timeout(CONNECT_TIMEOUT)
        .build(connection_manager(database_url))
        .await
        .context("Failed to create database pool")?;
    Ok(Arc::new(pool))
}

fn establish_connection(config: &str) -> BoxFuture<'_, ConnectionResult<AsyncPgConnection>> {
    let fut = async move {
        let settings = TlsSettings::from_url(config);
        let connector = native_tls::TlsConnector::builder()
            .danger_accept_invalid_certs(!settings.verify)
            .danger_accept_invalid_hostnames(!settings.verify)
            .build()
            .map_err(|e| ConnectionError::BadConnection(e.to_string()))?;
        let tls = postgres_native_tls::MakeTlsConnector::new(connector);

        let (client, connection) = tokio_postgres::connect(&settings.url, tls)
            .await
            .map_err(|e| ConnectionError::BadConnection(e.to_string()))?;

        tokio::spawn(async move {
            if let Err(e) = connection.await {
                tracing::error!(error = %e, "Postgres connection closed with error");
            }
        });

        AsyncPgConnection::try_from(client).await
    };
    fut.boxed()
}

/// libpq style `sslmode` mapped onto what `tokio-postgres` understands.
///
/// `require` encrypts without verifying the peer, `verify-ca` and `verify-full` encrypt
/// and verify. `allow` is treated as `prefer`.
#[derive(Debug, Clone, PartialEq, Eq)]
struct TlsSettings {
    url: String,
    verify: bool,
}

impl TlsSettings {
    fn from_url(raw: &str) -> Self {
        let Ok(mut url) = Url::parse(raw) else {
            // key=value style strings go through untouched
            return Self { url: raw.to_string(), verify: false };
        };

        let mode = url
            .query_pairs()
            .find(|(k, _)| k == "sslmode")
            .map(|(_, v)| v.into_owned());

        let (rewritten, verify) = match mode.as_deref() {
            Some("verify-ca") | Some("verify-full") => (Some("require"), true),
            Some("allow") => (Some("prefer"), false),
            _ => (None, false),
        };

        if let Some(rewritten) = rewritten {
            let pairs: Vec<(String, String)> = url
                .query_pairs()
                .map(|(k, v)| {
                    let v = if k == "sslmode" { rewritten.to_string() } else { v.into_owned() };
                    (k.into_owned(), v)
                })
                .collect();
            url.query_pairs_mut().clear().extend_pairs(pairs);
        }

        Self { url: url.to_string(), verify }
    }
}
