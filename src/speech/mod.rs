pub mod bridge;
pub mod dispatcher;
