//! Parsed rule and violation types.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::registry::{Evaluator, Resolved};

/// A single named predicate with an optional parameter (`min=5`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    pub name: String,
    /// Empty when the expression had no `=`.
    pub param: String,
    /// Set by [`Registry::compile`](super::registry::Registry::compile),
    /// with the parameter already bound.
    pub(crate) resolved: Option<Resolved>,
}

impl Rule {
    pub fn new(name: impl Into<String>, param: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            param: param.into(),
            resolved: None,
        }
    }

    /// The evaluator bound at compile time, if this rule has been compiled.
    pub fn evaluator(&self) -> Option<&dyn Evaluator> {
        self.resolved.as_ref().map(Resolved::as_evaluator)
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.param.is_empty() {
            f.write_str(&self.name)
        } else {
            write!(f, "{}={}", self.name, self.param)
        }
    }
}

/// Alternatives joined by `|`. The group passes when any alternative passes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleGroup {
    pub alternatives: Vec<Rule>,
}

impl RuleGroup {
    pub fn single(rule: Rule) -> Self {
        Self {
            alternatives: vec![rule],
        }
    }

    pub fn is_required(&self) -> bool {
        self.alternatives.len() == 1 && self.alternatives[0].name == "required"
    }
}

/// The rules governing one value, plus what to apply to its contents.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Ruleset {
    /// Skip everything (including the dive) when the value is zero.
    pub omit_empty: bool,
    /// Conjunctive groups, in declaration order.
    pub groups: Vec<RuleGroup>,
    pub dive: Option<Box<Dive>>,
}

impl Ruleset {
    pub fn is_empty(&self) -> bool {
        !self.omit_empty && self.groups.is_empty() && self.dive.is_none()
    }

    /// Every rule in this ruleset and its nested sections.
    pub fn rules(&self) -> Vec<&Rule> {
        let mut out: Vec<&Rule> = self
            .groups
            .iter()
            .flat_map(|g| g.alternatives.iter())
            .collect();
        if let Some(dive) = &self.dive {
            if let Some(keys) = &dive.keys {
                out.extend(keys.rules());
            }
            out.extend(dive.elements.rules());
        }
        out
    }
}

/// Rules applied to each element of a sequence, or each key/value of a map.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Dive {
    /// Set by `keys ... endkeys`; only meaningful for mappings.
    pub keys: Option<Ruleset>,
    /// Rules for sequence elements or map values.
    pub elements: Ruleset,
}

/// A single recorded rule failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Violation {
    /// Dot/bracket path, e.g. `Addresses[0].City` or `Schools{SD}`.
    pub path: String,
    /// Last segment of the path, brackets included (`City`, `Hobbies[2]`).
    pub field: String,
    pub rule: String,
    #[serde(skip_serializing_if = "String::is_empty", default)]
    pub param: String,
    pub message: String,
}

impl Violation {
    /// Build a violation at `path` with the standard message.
    pub fn new(path: impl Into<String>, rule: impl Into<String>, param: impl Into<String>) -> Self {
        let path = path.into();
        let rule = rule.into();
        let param = param.into();
        let message = if param.is_empty() {
            format!("field validation for '{path}' failed on the '{rule}' tag")
        } else {
            format!("field validation for '{path}' failed on the '{rule}' tag (param: {param})")
        };
        Self {
            field: last_segment(&path).to_string(),
            path,
            rule,
            param,
            message,
        }
    }

    /// Re-root a violation reported relative to a record at `prefix`.
    pub(crate) fn rebase(self, prefix: &str) -> Self {
        if prefix.is_empty() {
            return self;
        }
        let path = if self.path.is_empty() {
            prefix.to_string()
        } else if self.path.starts_with('[') || self.path.starts_with('{') {
            format!("{prefix}{}", self.path)
        } else {
            format!("{prefix}.{}", self.path)
        };
        Violation::new(path, self.rule, self.param)
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// The last `.`-separated segment of a path, with any `[..]`/`{..}`
/// suffix kept (`Hobbies[2]`, `Wallet[a.b]`). Dots inside brackets are part
/// of a key, not separators.
fn last_segment(path: &str) -> &str {
    let mut depth = 0usize;
    let mut start = 0;
    for (i, c) in path.char_indices() {
        match c {
            '[' | '{' => depth += 1,
            ']' | '}' => depth = depth.saturating_sub(1),
            '.' if depth == 0 => start = i + 1,
            _ => {}
        }
    }
    &path[start..]
}

/// All violations from one validation call.
///
/// Implements [`std::error::Error`] so callers can bail with `?`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidationErrors(pub Vec<Violation>);

impl ValidationErrors {
    pub fn violations(&self) -> &[Violation] {
        &self.0
    }

    pub fn into_inner(self) -> Vec<Violation> {
        self.0
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, v) in self.0.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{v}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}
