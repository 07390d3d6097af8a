pub mod board;
pub mod command;
pub mod error;
pub mod handler;
pub mod io;
pub mod memory;
pub mod model;
pub mod render;
pub mod store;
pub mod tracker;

pub use board::{sync_board, ChatChannel, ChatError, SyncOutcome};
pub use error::{Result, TallyError};
pub use handler::Handler;
pub use model::Document;
pub use tracker::Tracker;
