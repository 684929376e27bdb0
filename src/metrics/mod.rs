mod extract;
mod parse;
mod rules;

pub use extract::load_measures;
pub use parse::ParsedValue;
pub use rules::{RuleProfile, evaluate, summarize};
