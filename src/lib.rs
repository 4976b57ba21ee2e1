pub mod config;
pub mod error;
pub mod event;
pub mod filter;
pub mod formatter;
pub mod slack;
pub mod streamer;
pub mod utils;
pub mod watcher;

pub use config::Config;
pub use error::{ErrorKind, Recovery, StreamerError};
pub use event::EventNotification;
pub use streamer::EventStreamer;
