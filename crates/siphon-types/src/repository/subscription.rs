use std::collections::BTreeSet;

use anyhow::Result;
use chrono::Utc;
use diesel::prelude::*;
use diesel_async::{scoped_futures::ScopedFutureExt, AsyncPgConnection, RunQueryDsl};

use crate::{
    models::{NewSubscription, SubscriptionLookupModel, SubscriptionModel},
    schema::{subscription_lookup, subscriptions, webhook_receivers},
    DbPool, IndexingStrategy,
};

use super::acquire;

/// Candidate lookup rows for an event: every row for `strategy` routed through the
/// webhook registered under `receiver_name`.
pub async fn get_lookups_for_receiver(
    db: &DbPool,
    strategy: IndexingStrategy,
    receiver_name: &str,
) -> Result<Vec<SubscriptionLookupModel>> {
    let mut conn = acquire(db).await?;

    let webhook_ids = webhook_receivers::table
        .filter(webhook_receivers::webhook_name.eq(receiver_name))
        .select(webhook_receivers::webhook_id);

    let rows = subscription_lookup::table
        .filter(subscription_lookup::strategy.eq(strategy.as_str()))
        .filter(subscription_lookup::helius_webhook_id.eq_any(webhook_ids))
        .order(subscription_lookup::id.asc())
        .select(SubscriptionLookupModel::as_select())
        .load(&mut conn)
        .await?;

    Ok(rows)
}

pub async fn subscription_exists(db: &DbPool, user_id: &str, token_address: &str) -> Result<bool> {
    let mut conn = acquire(db).await?;
    let exists = diesel::select(diesel::dsl::exists(
        subscriptions::table
            .filter(subscriptions::user_id.eq(user_id))
            .filter(subscriptions::token_address.eq(token_address)),
    ))
    .get_result::<bool>(&mut conn)
    .await?;
    Ok(exists)
}

pub async fn get_subscriptions_by_user(db: &DbPool, user_id: &str) -> Result<Vec<SubscriptionModel>> {
    let mut conn = acquire(db).await?;
    let rows = subscriptions::table
        .filter(subscriptions::user_id.eq(user_id))
        .order(subscriptions::created_at.asc())
        .select(SubscriptionModel::as_select())
        .load(&mut conn)
        .await?;
    Ok(rows)
}

pub async fn get_lookups_for_subscription(
    db: &DbPool,
    subscription_id: &str,
) -> Result<Vec<SubscriptionLookupModel>> {
    let mut conn = acquire(db).await?;
    let rows = subscription_lookup::table
        .filter(subscription_lookup::subscription_id.eq(subscription_id))
        .order(subscription_lookup::strategy.asc())
        .select(SubscriptionLookupModel::as_select())
        .load(&mut conn)
        .await?;
    Ok(rows)
}

/// Insert a subscription together with its lookup rows in one serializable transaction.
pub async fn create_subscription(db: &DbPool, new: NewSubscription) -> Result<SubscriptionModel> {
    let mut conn = acquire(db).await?;
    let subscription = new.into_model(Utc::now().naive_utc());

    let created = conn
        .build_transaction()
        .serializable()
        .run::<_, diesel::result::Error, _>(|conn| {
            async move {
                let created: SubscriptionModel = diesel::insert_into(subscriptions::table)
                    .values(&subscription)
                    .returning(SubscriptionModel::as_returning())
                    .get_result(conn)
                    .await?;

                sync_lookup_rows(conn, &created).await?;
                adjust_address_count(conn, &created.webhook_id, 1).await?;

                Ok(created)
            }
            .scope_boxed()
        })
        .await?;

    tracing::info!(
        subscription_id = %created.id,
        user_id = %created.user_id,
        token_address = %created.token_address,
        strategies = ?created.indexing_strategy,
        "Created subscription"
    );
    Ok(created)
}

/// Replace the strategy set of a subscription and rebuild its lookup rows.
pub async fn update_subscription_strategies(
    db: &DbPool,
    id: &str,
    strategies: &BTreeSet<IndexingStrategy>,
) -> Result<Option<SubscriptionModel>> {
    let mut conn = acquire(db).await?;
    let id = id.to_string();
    let values: Vec<String> = strategies.iter().map(|s| s.to_string()).collect();

    let updated = conn
        .build_transaction()
        .serializable()
        .run::<_, diesel::result::Error, _>(|conn| {
            async move {
                let updated: Option<SubscriptionModel> =
                    diesel::update(subscriptions::table.find(&id))
                        .set((
                            subscriptions::indexing_strategy.eq(&values),
                            subscriptions::updated_at.eq(Utc::now().naive_utc()),
                        ))
                        .returning(SubscriptionModel::as_returning())
                        .get_result(conn)
                        .await
                        .optional()?;

                if let Some(subscription) = &updated {
                    sync_lookup_rows(conn, subscription).await?;
                }
                Ok(updated)
            }
            .scope_boxed()
        })
        .await?;

    Ok(updated)
}

/// Activate or deactivate a subscription. Inactive subscriptions have no lookup rows,
/// so the matcher stops seeing them as soon as this commits.
pub async fn set_subscription_status(
    db: &DbPool,
    id: &str,
    active: bool,
) -> Result<Option<SubscriptionModel>> {
    let mut conn = acquire(db).await?;
    let id = id.to_string();

    let updated = conn
        .build_transaction()
        .serializable()
        .run::<_, diesel::result::Error, _>(|conn| {
            async move {
                let updated: Option<SubscriptionModel> =
                    diesel::update(subscriptions::table.find(&id))
                        .set((
                            subscriptions::status.eq(active),
                            subscriptions::updated_at.eq(Utc::now().naive_utc()),
                        ))
                        .returning(SubscriptionModel::as_returning())
                        .get_result(conn)
                        .await
                        .optional()?;

                if let Some(subscription) = &updated {
                    sync_lookup_rows(conn, subscription).await?;
                }
                Ok(updated)
            }
            .scope_boxed()
        })
        .await?;

    Ok(updated)
}

/// Route a subscription through a different upstream webhook.
pub async fn reassign_subscription_webhook(
    db: &DbPool,
    id: &str,
    webhook_id: &str,
) -> Result<Option<SubscriptionModel>> {
    let mut conn = acquire(db).await?;
    let id = id.to_string();
    let webhook_id = webhook_id.to_string();

    let updated = conn
        .build_transaction()
        .serializable()
        .run::<_, diesel::result::Error, _>(|conn| {
            async move {
                let previous: Option<String> = subscriptions::table
                    .find(&id)
                    .select(subscriptions::webhook_id)
                    .first(conn)
                    .await
                    .optional()?;
                let Some(previous) = previous else {
                    return Ok(None);
                };

                let updated: SubscriptionModel = diesel::update(subscriptions::table.find(&id))
                    .set((
                        subscriptions::webhook_id.eq(&webhook_id),
                        subscriptions::updated_at.eq(Utc::now().naive_utc()),
                    ))
                    .returning(SubscriptionModel::as_returning())
                    .get_result(conn)
                    .await?;

                sync_lookup_rows(conn, &updated).await?;
                if previous != webhook_id {
                    adjust_address_count(conn, &previous, -1).await?;
                    adjust_address_count(conn, &webhook_id, 1).await?;
                }
                Ok(Some(updated))
            }
            .scope_boxed()
        })
        .await?;

    Ok(updated)
}

/// Make the lookup projection of `subscription` match its current state.
async fn sync_lookup_rows(
    conn: &mut AsyncPgConnection,
    subscription: &SubscriptionModel,
) -> Result<usize, diesel::result::Error> {
    diesel::delete(
        subscription_lookup::table
            .filter(subscription_lookup::subscription_id.eq(&subscription.id)),
    )
    .execute(conn)
    .await?;

    let rows = subscription
        .lookup_rows(Utc::now().naive_utc())
        .map_err(|e| diesel::result::Error::DeserializationError(Box::new(e)))?;
    if rows.is_empty() {
        return Ok(0);
    }

    diesel::insert_into(subscription_lookup::table).values(&rows).execute(conn).await
}

async fn adjust_address_count(
    conn: &mut AsyncPgConnection,
    webhook_id: &str,
    delta: i32,
) -> Result<usize, diesel::result::Error> {
    diesel::update(webhook_receivers::table.filter(webhook_receivers::webhook_id.eq(webhook_id)))
        .set(webhook_receivers::address_count.eq(webhook_receivers::address_count + delta))
        .execute(conn)
        .await
}
