use thiserror::Error;

#[derive(Error, Debug)]
pub enum FilterError {
    #[error("invalid_table_name: {0}")]
    InvalidTableName(String),

    #[error("invalid_column: {0}")]
    InvalidColumn(String),

    #[error("invalid_body: {0}")]
    InvalidBody(String),
}
