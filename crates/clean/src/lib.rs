pub mod compiler;
pub mod pipeline;
pub mod rules;

pub use compiler::{CompiledRule, FieldWrite, RuleCache, RuleError};
pub use pipeline::FieldCleaner;
pub use rules::{Field, FinalizerRule, FinalizerSet, PatternRule, RuleEntry, RuleSet};
