//! Per-run stage state
//!
//! Each pipeline run owns one `StageState`. Stages write exactly one
//! output key each; keys are write-once. Instruction templates reference
//! earlier outputs with `{key}` placeholders, which [`StageState::render`]
//! substitutes before the stage is invoked.

use std::collections::HashMap;

use crate::error::{Error, Result};

/// Write-once key/value state for one pipeline run
#[derive(Debug, Default)]
pub struct StageState {
    values: HashMap<String, String>,
}

impl StageState {
    /// Create empty state for a fresh run
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a stage output. Writing a key twice is an error.
    pub fn insert(&mut self, key: &str, value: String) -> Result<()> {
        if self.values.contains_key(key) {
            return Err(Error::pipeline(format!("state key '{}' written twice", key)));
        }
        self.values.insert(key.to_string(), value);
        Ok(())
    }

    /// Look up a recorded output
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// Remove and return a recorded output
    pub fn take(&mut self, key: &str) -> Option<String> {
        self.values.remove(key)
    }

    /// Number of keys written so far
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether nothing has been written yet
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Substitute `{key}` placeholders in a template with recorded values.
    ///
    /// Brace sequences that do not form a state key (`{not a key!}`,
    /// stray `{`) pass through as literal text. A placeholder naming a key
    /// that has not been written is an error; pipeline validation rules
    /// that out for declared stages.
    pub fn render(&self, template: &str) -> Result<String> {
        let mut out = String::with_capacity(template.len());
        let mut i = 0;
        while i < template.len() {
            let rest = &template[i..];
            if let Some(after_brace) = rest.strip_prefix('{') {
                if let Some(close) = after_brace.find('}') {
                    let candidate = &after_brace[..close];
                    if is_state_key(candidate) {
                        let value = self.values.get(candidate).ok_or_else(|| {
                            Error::pipeline(format!("unresolved placeholder '{{{}}}'", candidate))
                        })?;
                        out.push_str(value);
                        i += 1 + close + 1;
                        continue;
                    }
                }
                out.push('{');
                i += 1;
            } else {
                let next = rest.find('{').unwrap_or(rest.len());
                out.push_str(&rest[..next]);
                i += next;
            }
        }
        Ok(out)
    }
}

/// State keys referenced by a template, in order of first appearance
pub fn placeholders(template: &str) -> Vec<String> {
    let mut found: Vec<String> = Vec::new();
    let mut i = 0;
    while i < template.len() {
        let rest = &template[i..];
        match rest.find('{') {
            None => break,
            Some(pos) => {
                let after = &rest[pos + 1..];
                if let Some(close) = after.find('}') {
                    let candidate = &after[..close];
                    if is_state_key(candidate) {
                        if !found.iter().any(|f| f == candidate) {
                            found.push(candidate.to_string());
                        }
                        i += pos + 1 + close + 1;
                        continue;
                    }
                }
                i += pos + 1;
            }
        }
    }
    found
}

/// Whether a string is a valid state key (`[a-z][a-z0-9_]*`)
pub(crate) fn is_state_key(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_lowercase() => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
}
