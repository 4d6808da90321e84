pub mod engine;
pub mod error;
pub mod lifecycle;
pub mod scheduler;
pub mod visibility;
