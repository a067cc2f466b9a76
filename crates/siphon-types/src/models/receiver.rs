use chrono::NaiveDateTime;
use diesel::prelude::*;
use serde::Serialize;
use utoipa::ToSchema;

/// Maps the receiver name used in webhook URLs to the upstream webhook id that
/// subscription lookup rows are keyed on.
#[derive(Queryable, Selectable, Insertable, Debug, Clone, Serialize, ToSchema, PartialEq)]
#[diesel(table_name = crate::schema::webhook_receivers)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct WebhookReceiverModel {
    pub webhook_name: String,
    pub webhook_id: String,
    pub address_count: i32,
    pub created_at: NaiveDateTime,
}
