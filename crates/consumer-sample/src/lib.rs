pub mod backend;
pub mod consumers;
pub mod model;
