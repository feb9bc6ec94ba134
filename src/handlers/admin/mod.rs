pub mod bootstrap;
pub mod users;

pub use bootstrap::bootstrap;
pub use users::{create_user, delete_user, list_users};
