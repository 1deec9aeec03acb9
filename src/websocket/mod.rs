pub mod handler;
pub mod msg_join_handler;
pub mod msg_lock_handler;
pub mod msg_unlock_handler;
pub mod msg_update_handler;

pub use handler::websocket_handler;
