//! Sequential regex substitution over whole files.
//!
//! Rules are data: an ordered list of (pattern, replacement) pairs. Each rule
//! runs over the output of the previous one and replaces every
//! non-overlapping match. Patterns are compiled multi-line and, unless a rule
//! says otherwise, case-insensitive. Replacements use `${N}` / `${name}`
//! group references; `$$` is a literal dollar sign.

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::{Error, Result};
use crate::utils::io;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReplacementRule {
    pub pattern: String,
    pub replacement: String,
    #[serde(default = "default_case_insensitive")]
    pub case_insensitive: bool,
}

fn default_case_insensitive() -> bool {
    true
}

impl ReplacementRule {
    pub fn new(pattern: impl Into<String>, replacement: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            replacement: replacement.into(),
            case_insensitive: true,
        }
    }

    pub fn case_sensitive(mut self) -> Self {
        self.case_insensitive = false;
        self
    }

    fn compile(&self) -> Result<Regex> {
        RegexBuilder::new(&self.pattern)
            .multi_line(true)
            .case_insensitive(self.case_insensitive)
            .build()
            .map_err(|e| Error::validation_invalid_pattern(&self.pattern, e.to_string()))
    }
}

/// A rule list compiled once and reusable across files.
#[derive(Debug, Clone)]
pub struct CompiledRules {
    rules: Vec<(Regex, String)>,
}

impl CompiledRules {
    pub fn compile(rules: &[ReplacementRule]) -> Result<Self> {
        let rules = rules
            .iter()
            .map(|rule| Ok((rule.compile()?, rule.replacement.clone())))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { rules })
    }

    pub fn apply(&self, text: &str) -> String {
        self.rules
            .iter()
            .fold(text.to_string(), |current, (regex, replacement)| {
                regex.replace_all(&current, replacement.as_str()).into_owned()
            })
    }
}

/// Apply `rules` to `text` in order.
pub fn apply_rules(text: &str, rules: &[ReplacementRule]) -> Result<String> {
    Ok(CompiledRules::compile(rules)?.apply(text))
}

/// Read each source, apply the rules, write the result to its destination.
///
/// Sources and destinations may be the same file (in-place rewrite).
pub fn replace_files(mapping: &[(PathBuf, PathBuf)], rules: &[ReplacementRule]) -> Result<()> {
    let compiled = CompiledRules::compile(rules)?;

    for (source, destination) in mapping {
        let content = io::read_file(source, "read replacement source")?;
        let replaced = compiled.apply(&content);
        io::write_file_atomic(destination, replaced.as_bytes(), "write replacement output")?;
    }

    Ok(())
}
