use chrono::NaiveDateTime;
use diesel::prelude::*;
use url::Url;

use crate::errors::CredentialError;

/// Where a tenant's destination database lives.
///
/// Either `connection_string` is set and used verbatim, or the discrete fields are
/// composed into a `postgres://` URL.
#[derive(Queryable, Selectable, Insertable, AsChangeset, Clone, PartialEq)]
#[diesel(table_name = crate::schema::user_database_credentials)]
#[diesel(treat_none_as_null = true)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct UserDatabaseCredential {
    pub user_id: String,
    pub connection_string: Option<String>,
    pub host: Option<String>,
    pub port: Option<i32>,
    pub db_name: Option<String>,
    pub db_user: Option<String>,
    pub db_password: Option<String>,
    pub ssl_mode: Option<String>,
    pub connection_limit: Option<i32>,
    pub created_at: NaiveDateTime,
}

impl std::fmt::Debug for UserDatabaseCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserDatabaseCredential")
            .field("user_id", &self.user_id)
            .field("has_connection_string", &self.connection_string.is_some())
            .field("host", &self.host)
            .field("port", &self.port)
            .field("db_name", &self.db_name)
            .field("ssl_mode", &self.ssl_mode)
            .field("connection_limit", &self.connection_limit)
            .finish()
    }
}

const DEFAULT_PORT: u16 = 5432;
const DEFAULT_SSL_MODE: &str = "prefer";

impl UserDatabaseCredential {
    pub fn connection_string(&self) -> Result<String, CredentialError> {
        if let Some(conn) = self.connection_string.as_deref().filter(|c| !c.trim().is_empty()) {
            return Ok(conn.trim().to_string());
        }

        let host = self.required(&self.host, "host")?;
        let user = self.required(&self.db_user, "db_user")?;
        let db_name = self.required(&self.db_name, "db_name")?;
        let port = match self.port {
            None => DEFAULT_PORT,
            Some(p) => u16::try_from(p).map_err(|_| self.invalid(format!("port {p} out of range")))?,
        };
        let ssl_mode = self.ssl_mode.as_deref().filter(|m| !m.is_empty()).unwrap_or(DEFAULT_SSL_MODE);

        let mut url = Url::parse(&format!("postgres://{host}"))
            .map_err(|e| self.invalid(format!("host {host:?}: {e}")))?;
        url.set_username(user).map_err(|_| self.invalid("cannot set user".to_string()))?;
        if let Some(password) = self.db_password.as_deref().filter(|p| !p.is_empty()) {
            url.set_password(Some(password))
                .map_err(|_| self.invalid("cannot set password".to_string()))?;
        }
        url.set_port(Some(port)).map_err(|_| self.invalid("cannot set port".to_string()))?;
        url.set_path(&format!("/{db_name}"));
        url.query_pairs_mut().append_pair("sslmode", ssl_mode);

        Ok(url.to_string())
    }

    /// Upper bound for the tenant's pool, honouring the stored connection limit.
    pub fn pool_size(&self, default: u32, cap: u32) -> u32 {
        self.connection_limit
            .and_then(|limit| u32::try_from(limit).ok())
            .filter(|limit| *limit > 0)
            .unwrap_or(default)
            .min(cap)
            .max(1)
    }

    fn required<'a>(
        &self,
        field: &'a Option<String>,
        name: &'static str,
    ) -> Result<&'a str, CredentialError> {
        field.as_deref().filter(|v| !v.is_empty()).ok_or_else(|| CredentialError::MissingField {
            user_id: self.user_id.clone(),
            field: name,
        })
    }

    fn invalid(&self, reason: String) -> CredentialError {
        CredentialError::Invalid { user_id: self.user_id.clone(), reason }
    }
}
