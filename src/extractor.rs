use scraper::{ElementRef, Html, Node, Selector};
use std::sync::LazyLock;

use crate::config::DetectionConfig;
use crate::models::{normalize_text, SignalSet};

pub const DEFAULT_NOTIFY_LABELS: &[&str] = &["notify me"];
pub const DEFAULT_CART_LABELS: &[&str] = &["add to cart", "add to bag", "buy now", "purchase"];

// Anything a shopper can click to act on the product
static CONTROL_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(r#"button, [role="button"], input[type="submit"], input[type="button"]"#)
        .expect("control selector is valid")
});

static CLASSED_DIV_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("div[class]").expect("div selector is valid"));

const HIDDEN_ELEMENTS: &[&str] = &["script", "style", "noscript", "template"];

/// Turns raw markup into a [`SignalSet`]. Never fails: html5ever recovers from
/// any input, so malformed pages just yield sparse signals.
#[derive(Debug, Clone)]
pub struct Extractor {
    notify_labels: Vec<String>,
    cart_labels: Vec<String>,
}

impl Default for Extractor {
    fn default() -> Self {
        Self::from_config(&DetectionConfig::default())
    }
}

impl Extractor {
    pub fn new(notify_labels: &[String], cart_labels: &[String]) -> Self {
        Self {
            notify_labels: normalize_phrases(notify_labels),
            cart_labels: normalize_phrases(cart_labels),
        }
    }

    pub fn from_config(config: &DetectionConfig) -> Self {
        Self::new(&config.notify_labels, &config.cart_labels)
    }

    pub fn extract(&self, raw: &str) -> SignalSet {
        let document = Html::parse_document(raw);

        let labels: Vec<String> = document.select(&CONTROL_SELECTOR).map(control_label).collect();
        let any_label = |phrases: &[String]| {
            labels.iter().any(|label| phrases.iter().any(|phrase| label.contains(phrase.as_str())))
        };

        let normalized_product_section = document
            .select(&CLASSED_DIV_SELECTOR)
            .find(|element| {
                element
                    .value()
                    .attr("class")
                    .is_some_and(|class| class.to_lowercase().contains("product"))
            })
            .map(|element| normalize_text(&visible_text(element)));

        SignalSet {
            has_notify_affordance: any_label(&self.notify_labels),
            has_cart_affordance: any_label(&self.cart_labels),
            normalized_text: normalize_text(&visible_text(document.root_element())),
            normalized_product_section,
        }
    }
}

fn normalize_phrases(phrases: &[String]) -> Vec<String> {
    phrases
        .iter()
        .map(|phrase| normalize_text(phrase))
        .filter(|phrase| !phrase.is_empty())
        .collect()
}

/// Normalized label of a control: its text, else `value` (inputs), else `aria-label`.
fn control_label(element: ElementRef) -> String {
    let text = normalize_text(&visible_text(element));
    if !text.is_empty() {
        return text;
    }

    ["value", "aria-label"]
        .iter()
        .filter_map(|attr| element.value().attr(attr))
        .map(normalize_text)
        .find(|label| !label.is_empty())
        .unwrap_or_default()
}

fn visible_text(element: ElementRef) -> String {
    let mut out = String::new();

    for node in element.descendants() {
        if let Node::Text(text) = node.value() {
            let hidden = node.ancestors().any(|ancestor| {
                matches!(ancestor.value(), Node::Element(e) if HIDDEN_ELEMENTS.contains(&e.name()))
            });
            if !hidden {
                out.push_str(text);
                out.push(' ');
            }
        }
    }

    out
}
