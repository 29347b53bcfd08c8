//! Resource shapes exchanged with the widgets API.

pub mod widget;

pub use widget::*;
