pub mod announce;
pub mod cli;
pub mod engine;
pub mod report;
pub mod scene;
pub mod screen;
pub mod script;
pub mod speech;
pub mod state;
pub mod trace;
