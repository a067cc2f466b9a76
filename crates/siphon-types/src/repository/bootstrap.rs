use anyhow::{Context, Result};
use diesel_async::RunQueryDsl;

use crate::DbPool;

use super::acquire;

const CONTROL_PLANE_DDL: &[&str] = &[
    r#"CREATE TABLE IF NOT EXISTS webhook_receivers (
        webhook_name VARCHAR(255) PRIMARY KEY,
        webhook_id VARCHAR(255) NOT NULL UNIQUE,
        address_count INTEGER NOT NULL DEFAULT 0,
        created_at TIMESTAMP NOT NULL DEFAULT NOW()
    )"#,
    r#"CREATE TABLE IF NOT EXISTS address_registry (
        token_address VARCHAR(64) PRIMARY KEY,
        token_name VARCHAR(255) NOT NULL,
        token_symbol VARCHAR(64) NOT NULL,
        created_at TIMESTAMP NOT NULL DEFAULT NOW(),
        last_fetched_at TIMESTAMP
    )"#,
    r#"CREATE TABLE IF NOT EXISTS user_database_credentials (
        user_id VARCHAR(255) PRIMARY KEY,
        connection_string TEXT,
        host VARCHAR(255),
        port INTEGER,
        db_name VARCHAR(255),
        db_user VARCHAR(255),
        db_password VARCHAR(255),
        ssl_mode VARCHAR(32),
        connection_limit INTEGER,
        created_at TIMESTAMP NOT NULL DEFAULT NOW()
    )"#,
    r#"CREATE TABLE IF NOT EXISTS subscriptions (
        id VARCHAR(255) PRIMARY KEY,
        user_id VARCHAR(255) NOT NULL,
        token_address VARCHAR(64) NOT NULL,
        indexing_strategy TEXT[] NOT NULL,
        table_name VARCHAR(63) NOT NULL,
        webhook_id VARCHAR(255) NOT NULL,
        status BOOLEAN NOT NULL DEFAULT TRUE,
        created_at TIMESTAMP NOT NULL DEFAULT NOW(),
        updated_at TIMESTAMP NOT NULL DEFAULT NOW(),
        UNIQUE (user_id, token_address)
    )"#,
    r#"CREATE TABLE IF NOT EXISTS subscription_lookup (
        id VARCHAR(255) PRIMARY KEY,
        subscription_id VARCHAR(255) NOT NULL REFERENCES subscriptions(id) ON DELETE CASCADE,
        token_address VARCHAR(64) NOT NULL,
        user_id VARCHAR(255) NOT NULL,
        strategy VARCHAR(64) NOT NULL,
        table_name VARCHAR(63) NOT NULL,
        helius_webhook_id VARCHAR(255) NOT NULL,
        last_updated TIMESTAMP NOT NULL DEFAULT NOW(),
        UNIQUE (subscription_id, strategy)
    )"#,
    r#"CREATE INDEX IF NOT EXISTS subscription_lookup_strategy_webhook_idx
        ON subscription_lookup (strategy, helius_webhook_id)"#,
];

/// Create the control plane tables if they are missing. Safe to run on every start.
pub async fn ensure_control_plane_schema(db: &DbPool) -> Result<()> {
    let mut conn = acquire(db).await?;
    for statement in CONTROL_PLANE_DDL {
        diesel::sql_query(*statement)
            .execute(&mut conn)
            .await
            .context("Failed to create control plane schema")?;
    }
    tracing::info!(statements = CONTROL_PLANE_DDL.len(), "Control plane schema ready");
    Ok(())
}

/// Round trip a trivial query; used by the health endpoint.
pub async fn ping(db: &DbPool) -> Result<()> {
    let mut conn = acquire(db).await?;
    diesel::sql_query("SELECT 1").execute(&mut conn).await.context("database ping failed")?;
    Ok(())
}
