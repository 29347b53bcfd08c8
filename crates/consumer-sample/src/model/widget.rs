use serde::{Deserialize, Serialize};

/// A widget as returned by the widgets API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Widget {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default)]
    pub quantity: u32,
}

/// Payload for creating a new widget.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WidgetCreate {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default)]
    pub quantity: u32,
}

/// Payload for updating an existing widget.
///
/// Only the fields that are set are sent, so the server leaves the others untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WidgetUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantity: Option<u32>,
}

impl WidgetCreate {
    /// Creates a payload with no color and zero quantity.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            color: None,
            quantity: 0,
        }
    }

    pub fn color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }

    pub fn quantity(mut self, quantity: u32) -> Self {
        self.quantity = quantity;
        self
    }
}

impl WidgetUpdate {
    pub fn rename(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }
}
