pub mod activation;
pub mod catalog;
pub mod screen_model;
