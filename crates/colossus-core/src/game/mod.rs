pub mod book;
pub mod events;

pub use book::{BookError, PredictionBook};
pub use events::GameEvent;
