pub mod types;
pub mod sort;
pub mod statement;
pub mod error;

pub use error::FilterError;
pub use sort::{parse_list_query, validate_identifier};
pub use statement::Statement;
pub use types::*;
