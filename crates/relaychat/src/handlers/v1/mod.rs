//! V1 API handlers.

mod messages;
mod providers;

pub use messages::send_message;
pub use providers::list_providers;
