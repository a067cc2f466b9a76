use anyhow::Result;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::{models::AddressRegistryModel, schema::address_registry, DbPool};

use super::acquire;

pub async fn get_registered_address(
    db: &DbPool,
    token_address: &str,
) -> Result<Option<AddressRegistryModel>> {
    let mut conn = acquire(db).await?;
    let entry = address_registry::table
        .find(token_address)
        .select(AddressRegistryModel::as_select())
        .first(&mut conn)
        .await
        .optional()?;
    Ok(entry)
}

/// Insert a registry entry, refreshing name, symbol and fetch time if it already exists.
pub async fn register_address(db: &DbPool, entry: &AddressRegistryModel) -> Result<()> {
    let mut conn = acquire(db).await?;
    diesel::insert_into(address_registry::table)
        .values(entry)
        .on_conflict(address_registry::token_address)
        .do_update()
        .set((
            address_registry::token_name.eq(&entry.token_name),
            address_registry::token_symbol.eq(&entry.token_symbol),
            address_registry::last_fetched_at.eq(entry.last_fetched_at),
        ))
        .execute(&mut conn)
        .await?;
    Ok(())
}
