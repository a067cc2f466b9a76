use anyhow::Result;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::{models::WebhookReceiverModel, schema::webhook_receivers, DbPool};

use super::acquire;

pub async fn insert_webhook_receiver(db: &DbPool, receiver: &WebhookReceiverModel) -> Result<()> {
    let mut conn = acquire(db).await?;
    diesel::insert_into(webhook_receivers::table)
        .values(receiver)
        .on_conflict(webhook_receivers::webhook_name)
        .do_update()
        .set(webhook_receivers::webhook_id.eq(&receiver.webhook_id))
        .execute(&mut conn)
        .await?;
    tracing::info!(
        webhook_name = %receiver.webhook_name,
        webhook_id = %receiver.webhook_id,
        "Registered webhook receiver"
    );
    Ok(())
}

pub async fn get_webhook_id_by_name(db: &DbPool, webhook_name: &str) -> Result<Option<String>> {
    let mut conn = acquire(db).await?;
    let id = webhook_receivers::table
        .find(webhook_name)
        .select(webhook_receivers::webhook_id)
        .first(&mut conn)
        .await
        .optional()?;
    Ok(id)
}

pub async fn get_webhook_receivers(db: &DbPool) -> Result<Vec<WebhookReceiverModel>> {
    let mut conn = acquire(db).await?;
    let rows = webhook_receivers::table
        .order(webhook_receivers::webhook_name.asc())
        .select(WebhookReceiverModel::as_select())
        .load(&mut conn)
        .await?;
    Ok(rows)
}
