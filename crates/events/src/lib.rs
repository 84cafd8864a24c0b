//! Seatplan change notifications.
//!
//! - [`EventBus`]: in-process publish/subscribe hub backed by
//!   `tokio::sync::broadcast`.
//! - [`ClassroomEvent`]: what a renderer needs to know after a command.
//! - [`DeskBoard`]: a subscriber that mirrors desk labels from the bus.

pub mod board;
pub mod bus;

pub use board::DeskBoard;
pub use bus::{ClassroomEvent, EventBus};
