pub mod entry;
pub mod health;
pub mod manage;

pub use entry::{endpoint_get_handler, endpoint_post_handler, entry_get_handler, entry_post_handler};
pub use health::health_handler;
pub use manage::{create_handler, delete_handler, list_handler, test_update_handler};
