//! Rule expression parser.
//!
//! Turns `"required,dive,keys,min=2,endkeys,required"` into a [`Ruleset`]
//! tree. Parsing is syntax only; rule names are resolved later against a
//! [`Registry`](super::registry::Registry).

use std::collections::HashMap;

use super::rules::{Dive, Rule, RuleGroup, Ruleset};
use crate::error::{CoreError, CoreResult};

/// Apply remaining rules to each element (or map value).
pub const DIVE: &str = "dive";
/// Start of the map-key section; only valid directly after `dive`.
pub const KEYS: &str = "keys";
/// End of the map-key section.
pub const END_KEYS: &str = "endkeys";
/// Skip all remaining rules when the value is zero.
pub const OMIT_EMPTY: &str = "omitempty";

const STRUCTURAL: &[&str] = &[DIVE, KEYS, END_KEYS, OMIT_EMPTY];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Value,
    Keys,
}

struct Cursor<'a> {
    expr: &'a str,
    tokens: Vec<&'a str>,
    pos: usize,
}

/// Parse a rule expression. An empty expression yields an empty ruleset.
pub fn parse(expr: &str) -> CoreResult<Ruleset> {
    let trimmed = expr.trim();
    if trimmed.is_empty() {
        return Ok(Ruleset::default());
    }

    let tokens: Vec<&str> = trimmed.split(',').map(str::trim).collect();
    if let Some(i) = tokens.iter().position(|t| t.is_empty()) {
        return Err(CoreError::malformed(
            expr,
            format!("empty segment at position {i}"),
        ));
    }

    let mut cursor = Cursor {
        expr,
        tokens,
        pos: 0,
    };
    cursor.section(Section::Value)
}

impl<'a> Cursor<'a> {
    fn peek(&self) -> Option<&'a str> {
        self.tokens.get(self.pos).copied()
    }

    fn error(&self, reason: impl Into<String>) -> CoreError {
        CoreError::malformed(self.expr, reason)
    }

    fn section(&mut self, kind: Section) -> CoreResult<Ruleset> {
        let start = self.pos;
        let mut set = Ruleset::default();

        while let Some(token) = self.peek() {
            match token {
                OMIT_EMPTY => {
                    if self.pos != start {
                        return Err(self.error("'omitempty' must be the first rule of its section"));
                    }
                    set.omit_empty = true;
                    self.pos += 1;
                }
                DIVE => {
                    if kind == Section::Keys {
                        return Err(self.error("'dive' is not allowed inside a keys section"));
                    }
                    self.pos += 1;
                    set.dive = Some(Box::new(self.dive()?));
                    return Ok(set);
                }
                KEYS => return Err(self.error("'keys' must directly follow 'dive'")),
                END_KEYS => {
                    if kind == Section::Keys {
                        return Ok(set);
                    }
                    return Err(self.error("'endkeys' without a preceding 'keys'"));
                }
                _ => {
                    set.groups.push(self.group(token)?);
                    self.pos += 1;
                }
            }
        }

        if kind == Section::Keys {
            return Err(self.error("'keys' without a matching 'endkeys'"));
        }
        Ok(set)
    }

    fn dive(&mut self) -> CoreResult<Dive> {
        if self.peek() != Some(KEYS) {
            return Ok(Dive {
                keys: None,
                elements: self.section(Section::Value)?,
            });
        }

        self.pos += 1;
        let keys = self.section(Section::Keys)?;
        if keys.is_empty() {
            return Err(self.error("empty keys section"));
        }
        // Consume `endkeys` and the optional `dive` marker before value rules.
        self.pos += 1;
        if self.peek() == Some(DIVE) {
            self.pos += 1;
        }
        Ok(Dive {
            keys: Some(keys),
            elements: self.section(Section::Value)?,
        })
    }

    fn group(&self, token: &str) -> CoreResult<RuleGroup> {
        let alternatives = token
            .split('|')
            .map(|alt| self.rule(alt.trim(), token))
            .collect::<CoreResult<Vec<_>>>()?;

        if alternatives.len() > 1 {
            if let Some(r) = alternatives
                .iter()
                .find(|r| STRUCTURAL.contains(&r.name.as_str()))
            {
                return Err(self.error(format!(
                    "'{}' cannot be used inside an alternation",
                    r.name
                )));
            }
        }
        Ok(RuleGroup { alternatives })
    }

    fn rule(&self, alt: &str, token: &str) -> CoreResult<Rule> {
        if alt.is_empty() {
            return Err(self.error(format!("empty alternative in '{token}'")));
        }
        let (name, param) = alt.split_once('=').unwrap_or((alt, ""));
        let name = name.trim();
        if name.is_empty() {
            return Err(self.error(format!("rule without a name in '{token}'")));
        }
        Ok(Rule::new(name, param.trim()))
    }
}

// ---------------------------------------------------------------------------
// Alias expansion
// ---------------------------------------------------------------------------

/// Replace every `,`-segment that names an alias with the alias expansion.
///
/// Expansion is single-level: an expansion that itself names an alias is a
/// [`CoreError::NestedAlias`]. Aliases are not allowed inside `|` groups.
pub fn expand_aliases(expr: &str, aliases: &HashMap<String, String>) -> CoreResult<String> {
    if aliases.is_empty() {
        return Ok(expr.to_string());
    }

    let mut out = Vec::new();
    for segment in expr.split(',') {
        let trimmed = segment.trim();
        match aliases.get(trimmed) {
            Some(expansion) => {
                if let Some(nested) = alias_names(expansion).find(|n| aliases.contains_key(*n)) {
                    return Err(CoreError::NestedAlias {
                        alias: trimmed.to_string(),
                        nested: nested.to_string(),
                    });
                }
                out.push(expansion.as_str());
            }
            None => {
                if trimmed.contains('|') {
                    if let Some(name) = alias_names(trimmed).find(|n| aliases.contains_key(*n)) {
                        return Err(CoreError::malformed(
                            expr,
                            format!("alias '{name}' cannot be used inside an alternation"),
                        ));
                    }
                }
                out.push(segment);
            }
        }
    }
    Ok(out.join(","))
}

/// Rule names referenced by an expression, without parameters.
fn alias_names(expr: &str) -> impl Iterator<Item = &str> {
    expr.split([',', '|'])
        .map(|alt| alt.split_once('=').map_or(alt, |(name, _)| name).trim())
}
