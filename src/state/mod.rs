pub mod diff;
pub mod normalize;
pub mod sampler;
pub mod state_model;
