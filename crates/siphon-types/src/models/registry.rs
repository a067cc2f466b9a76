use chrono::NaiveDateTime;
use diesel::prelude::*;
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Queryable, Selectable, Insertable, Debug, Clone, Serialize, ToSchema, PartialEq)]
#[diesel(table_name = crate::schema::address_registry)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct AddressRegistryModel {
    pub token_address: String,
    pub token_name: String,
    pub token_symbol: String,
    pub created_at: NaiveDateTime,
    pub last_fetched_at: Option<NaiveDateTime>,
}
