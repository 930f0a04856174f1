use std::collections::BTreeMap;
use std::sync::Arc;

use regex::Regex;
use tracing::{debug, info};

use crate::compiler::{CompiledRule, FieldWrite, RuleCache, RuleError};
use crate::rules::{Field, FinalizerRule, FinalizerSet, RuleSet};

/// Word-like tokens for auto-capitalization: a run of non-space, non-hyphen
/// characters followed by whitespace or end of input. Hyphens are
/// non-breaking, so only the final segment of a hyphenated word is matched.
const WORD_TOKEN: &str = r"([^\s\-]+(\s|$))";

/// Compiled per-field cleaning pipeline.
///
/// Stage order per field: pre-rules, auto-capitalize, main rules, strip.
/// Cross-field writes emitted by the main rules are deferred and applied in
/// one pass after every field has finished, later rules winning on conflict.
pub struct FieldCleaner {
    pre: BTreeMap<Field, Vec<Arc<CompiledRule>>>,
    main: BTreeMap<Field, Vec<Arc<CompiledRule>>>,
    finalizers: BTreeMap<Field, FinalizerRule>,
    word_token: Regex,
    verbose: bool,
}

impl FieldCleaner {
    pub fn compile(
        pre_rules: &RuleSet,
        rules: &RuleSet,
        finalizers: &FinalizerSet,
        verbose: bool,
    ) -> Result<Self, RuleError> {
        Self::compile_with_cache(pre_rules, rules, finalizers, &RuleCache::new(), verbose)
    }

    /// Compile with a caller-provided cache, letting several cleaners (or
    /// repeated config reloads) share compiled rules.
    pub fn compile_with_cache(
        pre_rules: &RuleSet,
        rules: &RuleSet,
        finalizers: &FinalizerSet,
        cache: &RuleCache,
        verbose: bool,
    ) -> Result<Self, RuleError> {
        let mut pre = BTreeMap::new();
        let mut main = BTreeMap::new();
        for field in Field::ALL {
            if let Some(entries) = pre_rules.get(&field) {
                debug!("compiling pre-rules for {field}");
                pre.insert(field, cache.compile(entries)?);
            }
            if let Some(entries) = rules.get(&field) {
                debug!("compiling rules for {field}");
                main.insert(field, cache.compile(entries)?);
            }
        }
        let finalizers = Field::ALL
            .iter()
            .map(|field| (*field, finalizers.get(field).copied().unwrap_or_default()))
            .collect();
        Ok(FieldCleaner {
            pre,
            main,
            finalizers,
            word_token: Regex::new(WORD_TOKEN).expect("word token pattern is valid"),
            verbose,
        })
    }

    /// Clean every present, non-empty field of a record. Absent and empty
    /// fields are untouched and never appear in the output; deferred
    /// cross-field writes may add fields the input did not carry.
    pub fn clean(&self, fields: BTreeMap<Field, String>) -> BTreeMap<Field, String> {
        let mut cleaned = BTreeMap::new();
        let mut pending = Vec::new();

        for (field, original) in fields {
            if original.is_empty() {
                continue;
            }
            let value = self.clean_field(field, &original, &mut pending);
            if self.verbose && value != original {
                info!("cleaned {field}: {original:?} -> {value:?}");
            }
            cleaned.insert(field, value);
        }

        // Deferred writes overwrite outright; collection order means the
        // last rule to target a field wins.
        for FieldWrite { field, value } in pending {
            cleaned.insert(field, value);
        }
        cleaned
    }

    fn clean_field(&self, field: Field, value: &str, pending: &mut Vec<FieldWrite>) -> String {
        let finalizer = self
            .finalizers
            .get(&field)
            .copied()
            .unwrap_or_default();
        let mut current = value.to_string();

        if let Some(rules) = self.pre.get(&field) {
            for rule in rules {
                current = rule.apply(&current).0;
            }
        }

        // Runs before the main rules so patterns match against normalized
        // case rather than whatever the bank shouted.
        if finalizer.capitalize {
            current = self.capitalize(&current);
        }

        if let Some(rules) = self.main.get(&field) {
            for rule in rules {
                let (next, writes) = rule.apply(&current);
                current = next;
                pending.extend(writes);
            }
        }

        if finalizer.strip {
            current = current.trim().to_string();
        }
        current
    }

    /// Uppercase the first character of each word-like token and lowercase
    /// the rest of it.
    fn capitalize(&self, value: &str) -> String {
        self.word_token
            .replace_all(value, |caps: &regex::Captures<'_>| {
                let token = &caps[1];
                let mut chars = token.chars();
                match chars.next() {
                    Some(first) => first
                        .to_uppercase()
                        .chain(chars.flat_map(char::to_lowercase))
                        .collect(),
                    None => String::new(),
                }
            })
            .into_owned()
    }
}
