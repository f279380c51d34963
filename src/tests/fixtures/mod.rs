pub mod events;
pub mod messages;
pub mod publishers;
pub mod state;
