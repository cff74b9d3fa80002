use crate::config::DetectionConfig;
use crate::models::{normalize_text, SignalSet, Status};

pub const DEFAULT_OUT_OF_STOCK_PHRASES: &[&str] = &[
    "notify you when this product is back in stock",
    "notify me",
    "out of stock",
    "unavailable",
];
pub const DEFAULT_IN_STOCK_PHRASES: &[&str] = &["add to cart", "add to bag", "buy now", "purchase", "in stock"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Signal {
    NotifyAffordance,
    CartAffordance,
    TextContainsAny(Vec<String>),
}

impl Signal {
    fn matches(&self, signals: &SignalSet) -> bool {
        match self {
            Signal::NotifyAffordance => signals.has_notify_affordance,
            Signal::CartAffordance => signals.has_cart_affordance,
            Signal::TextContainsAny(phrases) => phrases
                .iter()
                .any(|phrase| signals.normalized_text.contains(phrase.as_str())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    pub name: &'static str,
    pub signal: Signal,
    pub status: Status,
}

/// Ordered rule table; the first matching rule decides, `Unknown` if none does.
/// Structural rules sit ahead of text rules since page copy often carries both
/// kinds of phrase at once.
#[derive(Debug, Clone)]
pub struct Classifier {
    rules: Vec<Rule>,
}

impl Default for Classifier {
    fn default() -> Self {
        Self::from_config(&DetectionConfig::default())
    }
}

impl Classifier {
    pub fn new(rules: Vec<Rule>) -> Self {
        Self { rules }
    }

    pub fn from_config(config: &DetectionConfig) -> Self {
        let phrases = |list: &[String]| -> Vec<String> {
            list.iter()
                .map(|phrase| normalize_text(phrase))
                .filter(|phrase| !phrase.is_empty())
                .collect()
        };

        Self::new(vec![
            Rule {
                name: "notify-affordance",
                signal: Signal::NotifyAffordance,
                status: Status::OutOfStock,
            },
            Rule {
                name: "cart-affordance",
                signal: Signal::CartAffordance,
                status: Status::InStock,
            },
            Rule {
                name: "out-of-stock-text",
                signal: Signal::TextContainsAny(phrases(&config.out_of_stock_phrases)),
                status: Status::OutOfStock,
            },
            Rule {
                name: "in-stock-text",
                signal: Signal::TextContainsAny(phrases(&config.in_stock_phrases)),
                status: Status::InStock,
            },
        ])
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// The rule that decides this signal set, if any.
    pub fn matching_rule(&self, signals: &SignalSet) -> Option<&Rule> {
        self.rules.iter().find(|rule| rule.signal.matches(signals))
    }

    pub fn classify(&self, signals: &SignalSet) -> Status {
        self.matching_rule(signals)
            .map(|rule| rule.status)
            .unwrap_or(Status::Unknown)
    }
}
