use diesel::result::Error;
use diesel_async::{AsyncPgConnection, RunQueryDsl};
use siphon_types::TableName;

pub const PAYLOADS_TABLE: &str = "normalized_webhook_payloads";
pub const ACCOUNT_DATA_TABLE: &str = "normalized_account_data";
pub const TOKEN_BALANCE_CHANGES_TABLE: &str = "normalized_token_balance_changes";
pub const NATIVE_TRANSFERS_TABLE: &str = "normalized_native_transfers";
pub const TOKEN_TRANSFERS_TABLE: &str = "normalized_token_transfers";

const NORMALIZED_DDL: &[&str] = &[
    r#"CREATE TABLE IF NOT EXISTS normalized_webhook_payloads (
        id VARCHAR(255) PRIMARY KEY,
        signature VARCHAR(255) NOT NULL UNIQUE,
        slot BIGINT NOT NULL,
        timestamp TIMESTAMP NOT NULL,
        source VARCHAR(100),
        fee BIGINT,
        fee_payer VARCHAR(255),
        transaction_type VARCHAR(50),
        description TEXT
    )"#,
    r#"CREATE TABLE IF NOT EXISTS normalized_account_data (
        id SERIAL PRIMARY KEY,
        payload_id VARCHAR(255) NOT NULL REFERENCES normalized_webhook_payloads(id) ON DELETE CASCADE,
        account VARCHAR(255) NOT NULL,
        native_balance_change NUMERIC
    )"#,
    r#"CREATE TABLE IF NOT EXISTS normalized_token_balance_changes (
        id SERIAL PRIMARY KEY,
        account_data_id INTEGER NOT NULL REFERENCES normalized_account_data(id) ON DELETE CASCADE,
        mint VARCHAR(255) NOT NULL,
        token_account VARCHAR(255),
        user_account VARCHAR(255),
        token_amount VARCHAR(100) NOT NULL,
        decimals SMALLINT NOT NULL
    )"#,
    r#"CREATE TABLE IF NOT EXISTS normalized_native_transfers (
        id SERIAL PRIMARY KEY,
        payload_id VARCHAR(255) NOT NULL REFERENCES normalized_webhook_payloads(id) ON DELETE CASCADE,
        from_user_account VARCHAR(255),
        to_user_account VARCHAR(255),
        amount NUMERIC NOT NULL
    )"#,
    r#"CREATE TABLE IF NOT EXISTS normalized_token_transfers (
        id SERIAL PRIMARY KEY,
        payload_id VARCHAR(255) NOT NULL REFERENCES normalized_webhook_payloads(id) ON DELETE CASCADE,
        from_token_account VARCHAR(255),
        from_user_account VARCHAR(255),
        to_token_account VARCHAR(255),
        to_user_account VARCHAR(255),
        mint VARCHAR(255) NOT NULL,
        token_amount NUMERIC NOT NULL,
        token_standard VARCHAR(50)
    )"#,
];

pub fn raw_table_ddl(table: &TableName) -> [String; 2] {
    [
        format!(
            "CREATE TABLE IF NOT EXISTS {} (id VARCHAR(255) NOT NULL PRIMARY KEY, jsonData JSONB NOT NULL)",
            table.quoted()
        ),
        format!(
            "CREATE UNIQUE INDEX IF NOT EXISTS {} ON {} ((jsonData->>'signature'))",
            table.signature_index(),
            table.quoted()
        ),
    ]
}

pub async fn ensure_raw_table(conn: &mut AsyncPgConnection, table: &TableName) -> Result<(), Error> {
    for statement in raw_table_ddl(table) {
        diesel::sql_query(statement).execute(conn).await?;
    }
    Ok(())
}

pub async fn ensure_normalized_tables(conn: &mut AsyncPgConnection) -> Result<(), Error> {
    for statement in NORMALIZED_DDL {
        diesel::sql_query(*statement).execute(conn).await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_table_ddl_quotes_identifiers() {
        let table = TableName::parse("bonk_events").unwrap();
        let [create, index] = raw_table_ddl(&table);
        assert_eq!(
            create,
            "CREATE TABLE IF NOT EXISTS \"bonk_events\" (id VARCHAR(255) NOT NULL PRIMARY KEY, jsonData JSONB NOT NULL)"
        );
        assert_eq!(
            index,
            "CREATE UNIQUE INDEX IF NOT EXISTS \"bonk_events_signature_key\" ON \"bonk_events\" ((jsonData->>'signature'))"
        );
    }

    #[test]
    fn test_normalized_tables_share_one_prefix() {
        for (statement, table) in NORMALIZED_DDL.iter().zip([
            PAYLOADS_TABLE,
            ACCOUNT_DATA_TABLE,
            TOKEN_BALANCE_CHANGES_TABLE,
            NATIVE_TRANSFERS_TABLE,
            TOKEN_TRANSFERS_TABLE,
        ]) {
            assert!(statement.contains(&format!("CREATE TABLE IF NOT EXISTS {table} (")));
        }
        for statement in &NORMALIZED_DDL[1..] {
            assert!(statement.contains("REFERENCES normalized_"));
        }
    }
}
