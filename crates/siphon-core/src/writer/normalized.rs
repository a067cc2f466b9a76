use chrono::{DateTime, NaiveDateTime};
use diesel::{
    result::Error,
    sql_types::{BigInt, Integer, SmallInt, Text, Timestamp},
    QueryableByName,
};
use diesel_async::{AsyncPgConnection, RunQueryDsl};
use siphon_types::WebhookPayload;

/// Column values of one event split across the `normalized_*` tables.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedPayload {
    pub id: String,
    pub signature: String,
    pub slot: i64,
    pub timestamp: NaiveDateTime,
    pub source: String,
    pub fee: i64,
    pub fee_payer: String,
    pub transaction_type: String,
    pub description: String,
    pub accounts: Vec<AccountRow>,
    pub native_transfers: Vec<NativeTransferRow>,
    pub token_transfers: Vec<TokenTransferRow>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AccountRow {
    pub account: String,
    pub native_balance_change: String,
    pub token_balance_changes: Vec<TokenBalanceRow>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TokenBalanceRow {
    pub mint: String,
    pub token_account: String,
    pub user_account: String,
    pub token_amount: String,
    pub decimals: i16,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NativeTransferRow {
    pub from_user_account: String,
    pub to_user_account: String,
    pub amount: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TokenTransferRow {
    pub from_token_account: String,
    pub from_user_account: String,
    pub to_token_account: String,
    pub to_user_account: String,
    pub mint: String,
    pub token_amount: String,
    pub token_standard: String,
}

#[derive(QueryableByName)]
struct PayloadId {
    #[diesel(sql_type = Text)]
    #[allow(dead_code)]
    id: String,
}

#[derive(QueryableByName)]
struct SerialId {
    #[diesel(sql_type = Integer)]
    id: i32,
}

impl NormalizedPayload {
    pub fn from_payload(id: &str, payload: &WebhookPayload) -> anyhow::Result<Self> {
        let timestamp = DateTime::from_timestamp(payload.timestamp, 0)
            .ok_or_else(|| anyhow::anyhow!("timestamp {} out of range", payload.timestamp))?
            .naive_utc();

        Ok(Self {
            id: id.to_string(),
            signature: payload.signature.clone(),
            slot: payload.slot,
            timestamp,
            source: payload.source.clone(),
            fee: payload.fee,
            fee_payer: payload.fee_payer.clone(),
            transaction_type: payload.transaction_type.clone(),
            description: payload.description.clone(),
            accounts: payload
                .account_data
                .iter()
                .map(|data| AccountRow {
                    account: data.account.clone(),
                    native_balance_change: data.native_balance_change.to_decimal_string(),
                    token_balance_changes: data
                        .token_balance_changes
                        .iter()
                        .map(|change| TokenBalanceRow {
                            mint: change.mint.clone(),
                            token_account: change.token_account.clone(),
                            user_account: change.user_account.clone(),
                            token_amount: change.raw_token_amount.token_amount.clone(),
                            decimals: change.raw_token_amount.decimals,
                        })
                        .collect(),
                })
                .collect(),
            native_transfers: payload
                .native_transfers
                .iter()
                .map(|t| NativeTransferRow {
                    from_user_account: t.from_user_account.clone(),
                    to_user_account: t.to_user_account.clone(),
                    amount: t.amount.to_decimal_string(),
                })
                .collect(),
            token_transfers: payload
                .token_transfers
                .iter()
                .map(|t| TokenTransferRow {
                    from_token_account: t.from_token_account.clone(),
                    from_user_account: t.from_user_account.clone(),
                    to_token_account: t.to_token_account.clone(),
                    to_user_account: t.to_user_account.clone(),
                    mint: t.mint.clone(),
                    token_amount: t.token_amount.to_decimal_string(),
                    token_standard: t.token_standard.clone(),
                })
                .collect(),
        })
    }
}

/// Insert the decomposed rows. Returns `false` without touching the child tables when the
/// signature is already present.
pub async fn insert_normalized(conn: &mut AsyncPgConnection, rows: &NormalizedPayload) -> Result<bool, Error> {
    let inserted: Vec<PayloadId> = diesel::sql_query(
        "INSERT INTO normalized_webhook_payloads \
         (id, signature, slot, timestamp, source, fee, fee_payer, transaction_type, description) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
         ON CONFLICT (signature) DO NOTHING RETURNING id",
    )
    .bind::<Text, _>(&rows.id)
    .bind::<Text, _>(&rows.signature)
    .bind::<BigInt, _>(rows.slot)
    .bind::<Timestamp, _>(rows.timestamp)
    .bind::<Text, _>(&rows.source)
    .bind::<BigInt, _>(rows.fee)
    .bind::<Text, _>(&rows.fee_payer)
    .bind::<Text, _>(&rows.transaction_type)
    .bind::<Text, _>(&rows.description)
    .load(conn)
    .await?;

    if inserted.is_empty() {
        return Ok(false);
    }

    for account in &rows.accounts {
        let account_id: SerialId = diesel::sql_query(
            "INSERT INTO normalized_account_data (payload_id, account, native_balance_change) \
             VALUES ($1, $2, CAST($3 AS NUMERIC)) RETURNING id",
        )
        .bind::<Text, _>(&rows.id)
        .bind::<Text, _>(&account.account)
        .bind::<Text, _>(&account.native_balance_change)
        .get_result(conn)
        .await?;

        for change in &account.token_balance_changes {
            diesel::sql_query(
                "INSERT INTO normalized_token_balance_changes \
                 (account_data_id, mint, token_account, user_account, token_amount, decimals) \
                 VALUES ($1, $2, $3, $4, $5, $6)",
            )
            .bind::<Integer, _>(account_id.id)
            .bind::<Text, _>(&change.mint)
            .bind::<Text, _>(&change.token_account)
            .bind::<Text, _>(&change.user_account)
            .bind::<Text, _>(&change.token_amount)
            .bind::<SmallInt, _>(change.decimals)
            .execute(conn)
            .await?;
        }
    }

    for transfer in &rows.native_transfers {
        diesel::sql_query(
            "INSERT INTO normalized_native_transfers (payload_id, from_user_account, to_user_account, amount) \
             VALUES ($1, $2, $3, CAST($4 AS NUMERIC))",
        )
        .bind::<Text, _>(&rows.id)
        .bind::<Text, _>(&transfer.from_user_account)
        .bind::<Text, _>(&transfer.to_user_account)
        .bind::<Text, _>(&transfer.amount)
        .execute(conn)
        .await?;
    }

    for transfer in &rows.token_transfers {
        diesel::sql_query(
            "INSERT INTO normalized_token_transfers \
             (payload_id, from_token_account, from_user_account, to_token_account, to_user_account, \
              mint, token_amount, token_standard) \
             VALUES ($1, $2, $3, $4, $5, $6, CAST($7 AS NUMERIC), $8)",
        )
        .bind::<Text, _>(&rows.id)
        .bind::<Text, _>(&transfer.from_token_account)
        .bind::<Text, _>(&transfer.from_user_account)
        .bind::<Text, _>(&transfer.to_token_account)
        .bind::<Text, _>(&transfer.to_user_account)
        .bind::<Text, _>(&transfer.mint)
        .bind::<Text, _>(&transfer.token_amount)
        .bind::<Text, _>(&transfer.token_standard)
        .execute(conn)
        .await?;
    }

    Ok(true)
}
