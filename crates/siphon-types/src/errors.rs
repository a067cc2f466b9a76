#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum CredentialError {
    #[error("credential for user {user_id} is missing field `{field}`")]
    MissingField { user_id: String, field: &'static str },

    #[error("credential for user {user_id} is invalid: {reason}")]
    Invalid { user_id: String, reason: String },
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TableNameError {
    #[error("table name is empty")]
    Empty,

    #[error("table name `{0}` exceeds {max} characters", max = crate::table_name::MAX_TABLE_NAME_LEN)]
    TooLong(String),

    #[error("table name `{0}` contains characters outside [a-z0-9_] or starts with a digit")]
    InvalidCharacters(String),

    #[error("table name `{0}` is reserved")]
    Reserved(String),
}
