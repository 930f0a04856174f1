use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use regex::RegexBuilder;
use thiserror::Error;

use crate::rules::{Field, PatternRule, RuleEntry};

#[derive(Debug, Error)]
pub enum RuleError {
    #[error("invalid pattern {pattern:?}: {source}")]
    BadPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

/// A pending cross-field assignment produced by a transform rule. Collected
/// while a record's fields are cleaned and applied once all of them are done.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldWrite {
    pub field: Field,
    pub value: String,
}

#[derive(Debug)]
enum Matcher {
    /// Plain substring deletion.
    Literal { find: String },
    /// Compiled regex substitution, optionally with transform templates.
    Pattern {
        regex: regex::Regex,
        repl: String,
        transforms: Vec<(Field, String)>,
    },
}

/// An executable transformation unit: string in, string plus pending
/// cross-field writes out. Immutable once compiled, safe to share.
#[derive(Debug)]
pub struct CompiledRule {
    matcher: Matcher,
}

impl CompiledRule {
    fn literal(find: &str) -> Self {
        CompiledRule {
            matcher: Matcher::Literal {
                find: find.to_string(),
            },
        }
    }

    fn pattern(rule: &PatternRule) -> Result<Self, RuleError> {
        let regex = RegexBuilder::new(&rule.pattern)
            .case_insensitive(!rule.case_sensitive)
            .build()
            .map_err(|source| RuleError::BadPattern {
                pattern: rule.pattern.clone(),
                source,
            })?;
        let transforms = rule
            .transform
            .iter()
            .map(|(field, template)| (*field, translate_backrefs(template)))
            .collect();
        Ok(CompiledRule {
            matcher: Matcher::Pattern {
                regex,
                repl: translate_backrefs(&rule.repl),
                transforms,
            },
        })
    }

    /// Apply the rule to one field value. Substitution always runs; transform
    /// templates are expanded from an unanchored search against the input and
    /// returned as pending writes, never applied in place.
    pub fn apply(&self, input: &str) -> (String, Vec<FieldWrite>) {
        match &self.matcher {
            Matcher::Literal { find } => (input.replace(find.as_str(), ""), Vec::new()),
            Matcher::Pattern {
                regex,
                repl,
                transforms,
            } => {
                let mut writes = Vec::new();
                if !transforms.is_empty() {
                    if let Some(caps) = regex.captures(input) {
                        for (field, template) in transforms {
                            let mut value = String::new();
                            caps.expand(template, &mut value);
                            writes.push(FieldWrite {
                                field: *field,
                                value,
                            });
                        }
                    }
                }
                (regex.replace_all(input, repl.as_str()).into_owned(), writes)
            }
        }
    }
}

/// Translate `\1`-style backreferences into the `${1}` form the regex crate
/// expands. A literal `$` is escaped as `$$` so it survives expansion, and
/// `\\` collapses to a literal backslash; everything else passes through
/// untouched.
fn translate_backrefs(template: &str) -> String {
    let mut out = String::with_capacity(template.len());
    let mut chars = template.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '$' {
            out.push_str("$$");
            continue;
        }
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.peek() {
            Some(d) if d.is_ascii_digit() => {
                out.push_str("${");
                while let Some(&d) = chars.peek() {
                    if !d.is_ascii_digit() {
                        break;
                    }
                    out.push(d);
                    chars.next();
                }
                out.push('}');
            }
            Some('\\') => {
                chars.next();
                out.push('\\');
            }
            _ => out.push('\\'),
        }
    }
    out
}

/// Memoizes compiled rules by their structural definition, so repeated
/// identical entries share one compiled instance. The map is append-only and
/// compiled rules are immutable, making shared use across threads safe.
#[derive(Default)]
pub struct RuleCache {
    compiled: Mutex<HashMap<RuleEntry, Arc<CompiledRule>>>,
}

impl RuleCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of distinct rule definitions compiled so far.
    pub fn len(&self) -> usize {
        self.compiled.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Compile a rule list into a flat ordered sequence of executable rules.
    /// Nested groups are flattened recursively, preserving order.
    pub fn compile(&self, entries: &[RuleEntry]) -> Result<Vec<Arc<CompiledRule>>, RuleError> {
        let mut out = Vec::new();
        for entry in entries {
            if let RuleEntry::Group(inner) = entry {
                out.extend(self.compile(inner)?);
                continue;
            }
            if let Some(hit) = self.compiled.lock().unwrap().get(entry) {
                out.push(Arc::clone(hit));
                continue;
            }
            let rule = Arc::new(match entry {
                RuleEntry::Literal(find) => CompiledRule::literal(find),
                RuleEntry::Pattern(pattern) => CompiledRule::pattern(pattern)?,
                RuleEntry::Group(_) => continue, // handled above
            });
            self.compiled
                .lock()
                .unwrap()
                .insert(entry.clone(), Arc::clone(&rule));
            out.push(rule);
        }
        Ok(out)
    }
}
