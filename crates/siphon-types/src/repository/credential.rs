use anyhow::Result;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::{models::UserDatabaseCredential, schema::user_database_credentials, DbPool};

use super::acquire;

pub async fn get_database_credential(
    db: &DbPool,
    user_id: &str,
) -> Result<Option<UserDatabaseCredential>> {
    let mut conn = acquire(db).await?;
    let credential = user_database_credentials::table
        .find(user_id)
        .select(UserDatabaseCredential::as_select())
        .first(&mut conn)
        .await
        .optional()?;
    Ok(credential)
}

/// Store or replace a tenant's database descriptor.
pub async fn upsert_database_credential(
    db: &DbPool,
    credential: &UserDatabaseCredential,
) -> Result<()> {
    let mut conn = acquire(db).await?;
    diesel::insert_into(user_database_credentials::table)
        .values(credential)
        .on_conflict(user_database_credentials::user_id)
        .do_update()
        .set(credential)
        .execute(&mut conn)
        .await?;
    tracing::info!(user_id = %credential.user_id, "Stored database credential");
    Ok(())
}
