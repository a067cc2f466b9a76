pub mod normalized;
pub mod schema;

use anyhow::{Context, Result};
use diesel::sql_types::{Jsonb, Text};
use diesel_async::{scoped_futures::ScopedFutureExt, AsyncPgConnection, RunQueryDsl};
use siphon_types::{TableName, WebhookPayload, WriteOutcome};

use normalized::{insert_normalized, NormalizedPayload};
use schema::{ensure_normalized_tables, ensure_raw_table};

/// Persists one event into one subscriber table inside a serializable transaction.
///
/// The raw event goes into `<table>(id, jsonData)`; in normalized mode it is also split
/// across the shared `normalized_*` tables under the same row id. Either everything is
/// committed or nothing is.
#[derive(Debug, Clone, Copy, Default)]
pub struct PayloadWriter {
    normalized: bool,
}

impl PayloadWriter {
    pub fn new(normalized: bool) -> Self {
        Self { normalized }
    }

    pub async fn write(
        &self,
        conn: &mut AsyncPgConnection,
        table: &TableName,
        payload: &WebhookPayload,
    ) -> Result<WriteOutcome> {
        let row_id = uuid::Uuid::new_v4().to_string();
        let json = serde_json::to_value(payload).context("Failed to serialize event")?;
        let decomposed = self.decompose(&row_id, payload);

        let insert_raw = format!(
            "INSERT INTO {} (id, jsonData) VALUES ($1, $2) ON CONFLICT DO NOTHING",
            table.quoted()
        );

        let outcome = conn
            .build_transaction()
            .serializable()
            .run::<_, diesel::result::Error, _>(|conn| {
                async move {
                    ensure_raw_table(conn, table).await?;

                    let inserted = diesel::sql_query(insert_raw)
                        .bind::<Text, _>(&row_id)
                        .bind::<Jsonb, _>(&json)
                        .execute(conn)
                        .await?;
                    if inserted == 0 {
                        return Ok(WriteOutcome::Duplicate);
                    }

                    if let Some(rows) = &decomposed {
                        ensure_normalized_tables(conn).await?;
                        if !insert_normalized(conn, rows).await? {
                            tracing::debug!(signature = %rows.signature, "Normalized rows already present");
                        }
                    }

                    Ok(WriteOutcome::Inserted)
                }
                .scope_boxed()
            })
            .await
            .with_context(|| format!("Failed to write {} into {}", payload.signature, table))?;

        Ok(outcome)
    }

    /// Rows for the `normalized_*` tables, if enabled. An event that cannot be split is
    /// still written raw.
    fn decompose(&self, row_id: &str, payload: &WebhookPayload) -> Option<NormalizedPayload> {
        if !self.normalized {
            return None;
        }
        match NormalizedPayload::from_payload(row_id, payload) {
            Ok(rows) => Some(rows),
            Err(e) => {
                tracing::warn!(signature = %payload.signature, error = %e, "Skipping normalized rows");
                None
            }
        }
    }
}
