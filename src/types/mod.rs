mod models;
mod rule;

pub use models::*;
pub use rule::{Priority, RuleType};
