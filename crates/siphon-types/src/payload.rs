use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::amount::Amount;

/// One enhanced transaction as pushed by the webhook provider.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WebhookPayload {
    #[serde(default)]
    pub account_data: Vec<AccountData>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    #[schema(value_type = Object)]
    pub events: serde_json::Value,
    #[serde(default)]
    pub fee: i64,
    #[serde(default)]
    pub fee_payer: String,
    #[serde(default)]
    pub instructions: Vec<Instruction>,
    #[serde(default)]
    pub native_transfers: Vec<NativeTransfer>,
    pub signature: String,
    #[serde(default)]
    pub slot: i64,
    #[serde(default)]
    pub source: String,
    /// Unix seconds.
    #[serde(default)]
    pub timestamp: i64,
    #[serde(default)]
    pub token_transfers: Vec<TokenTransfer>,
    #[serde(default)]
    #[schema(value_type = Option<Object>)]
    pub transaction_error: Option<serde_json::Value>,
    #[serde(rename = "type", default)]
    pub transaction_type: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AccountData {
    pub account: String,
    #[serde(default)]
    #[schema(value_type = String)]
    pub native_balance_change: Amount,
    #[serde(default)]
    pub token_balance_changes: Vec<TokenBalanceChange>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TokenBalanceChange {
    pub mint: String,
    pub raw_token_amount: RawTokenAmount,
    #[serde(default)]
    pub token_account: String,
    #[serde(default)]
    pub user_account: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RawTokenAmount {
    pub decimals: i16,
    pub token_amount: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Instruction {
    #[serde(default)]
    pub accounts: Vec<String>,
    #[serde(default)]
    pub data: String,
    #[serde(default)]
    pub inner_instructions: Vec<InnerInstruction>,
    pub program_id: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InnerInstruction {
    #[serde(default)]
    pub accounts: Vec<String>,
    #[serde(default)]
    pub data: String,
    pub program_id: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NativeTransfer {
    #[schema(value_type = String)]
    pub amount: Amount,
    #[serde(default)]
    pub from_user_account: String,
    #[serde(default)]
    pub to_user_account: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TokenTransfer {
    #[serde(default)]
    pub from_token_account: String,
    #[serde(default)]
    pub from_user_account: String,
    pub mint: String,
    #[serde(default)]
    pub to_token_account: String,
    #[serde(default)]
    pub to_user_account: String,
    #[schema(value_type = String)]
    pub token_amount: Amount,
    #[serde(default)]
    pub token_standard: String,
}

impl WebhookPayload {
    /// Every address this transaction touches, each exactly once.
    ///
    /// Covers account data (account and each token balance change's mint, user and token
    /// account), the fee payer, instruction and inner instruction accounts, both ends of
    /// native transfers and token transfers (user and token accounts) plus the transfer
    /// mint. Empty strings are not addresses and are left out.
    pub fn addresses<'a>(&'a self) -> BTreeSet<&'a str> {
        let mut set = BTreeSet::new();
        let mut add = |address: &'a str| {
            if !address.is_empty() {
                set.insert(address);
            }
        };

        for data in &self.account_data {
            add(&data.account);
            for change in &data.token_balance_changes {
                add(&change.mint);
                add(&change.user_account);
                add(&change.token_account);
            }
        }

        add(&self.fee_payer);

        for ix in &self.instructions {
            ix.accounts.iter().for_each(|a| add(a.as_str()));
            for inner in &ix.inner_instructions {
                inner.accounts.iter().for_each(|a| add(a.as_str()));
            }
        }

        for transfer in &self.native_transfers {
            add(&transfer.from_user_account);
            add(&transfer.to_user_account);
        }

        for transfer in &self.token_transfers {
            add(&transfer.from_user_account);
            add(&transfer.to_user_account);
            add(&transfer.from_token_account);
            add(&transfer.to_token_account);
            add(&transfer.mint);
        }

        set
    }
}
