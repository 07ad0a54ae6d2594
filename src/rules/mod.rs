//! Per-repository tables consumed by the GitHub event side of the bot.

mod autolabel;
mod priority;

pub use autolabel::{AutolabelTable, compile_pattern};
pub use priority::PriorityTable;

/// Command that gates adding autolabel rules.
pub const AUTOLABEL_ADD_COMMAND: &str = "autolabel add";
/// Command that gates removing autolabel rules.
pub const AUTOLABEL_REMOVE_COMMAND: &str = "autolabel remove";
/// Command that gates changing repository priorities.
pub const PRIORITIZE_COMMAND: &str = "prioritize";
