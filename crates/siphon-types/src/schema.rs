// Control plane tables. Tenant tables are created on demand by the writer and have no
// static schema here.

diesel::table! {
    address_registry (token_address) {
        token_address -> Varchar,
        token_name -> Varchar,
        token_symbol -> Varchar,
        created_at -> Timestamp,
        last_fetched_at -> Nullable<Timestamp>,
    }
}

diesel::table! {
    subscription_lookup (id) {
        id -> Varchar,
        subscription_id -> Varchar,
        token_address -> Varchar,
        user_id -> Varchar,
        strategy -> Varchar,
        table_name -> Varchar,
        helius_webhook_id -> Varchar,
        last_updated -> Timestamp,
    }
}

diesel::table! {
    subscriptions (id) {
        id -> Varchar,
        user_id -> Varchar,
        token_address -> Varchar,
        indexing_strategy -> Array<Text>,
        table_name -> Varchar,
        webhook_id -> Varchar,
        status -> Bool,
        created_at -> Timestamp,
        updated_at -> Timestamp,
    }
}

diesel::table! {
    user_database_credentials (user_id) {
        user_id -> Varchar,
        connection_string -> Nullable<Text>,
        host -> Nullable<Varchar>,
        port -> Nullable<Int4>,
        db_name -> Nullable<Varchar>,
        db_user -> Nullable<Varchar>,
        db_password -> Nullable<Varchar>,
        ssl_mode -> Nullable<Varchar>,
        connection_limit -> Nullable<Int4>,
        created_at -> Timestamp,
    }
}

diesel::table! {
    webhook_receivers (webhook_name) {
        webhook_name -> Varchar,
        webhook_id -> Varchar,
        address_count -> Int4,
        created_at -> Timestamp,
    }
}

diesel::joinable!(subscription_lookup -> subscriptions (subscription_id));

diesel::allow_tables_to_appear_in_same_query!(
    address_registry,
    subscription_lookup,
    subscriptions,
    user_database_credentials,
    webhook_receivers,
);
