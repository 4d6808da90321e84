pub mod announcement;
pub mod template;
