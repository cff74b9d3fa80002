use serde::{Deserialize, Serialize};

/// Structured features pulled out of a product page. Both classification and
/// fingerprinting work from this, never from the raw markup.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SignalSet {
    pub has_notify_affordance: bool,
    pub has_cart_affordance: bool,
    pub normalized_text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub normalized_product_section: Option<String>,
}

/// Lower-case and collapse every whitespace run to a single space.
pub fn normalize_text(text: &str) -> String {
    text.to_lowercase().split_whitespace().collect::<Vec<_>>().join(" ")
}
