pub mod memory;
pub mod scene_model;
