//! Intent classification.

pub mod classifier;
pub mod label;

pub use classifier::{parse_label, Classifier, ROUTER_PROMPT};
pub use label::RoutingLabel;
