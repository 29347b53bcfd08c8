pub mod widget_consumer;

pub use widget_consumer::*;
