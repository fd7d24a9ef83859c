/// Configuration-time errors.
///
/// These abort setup (schema compilation, alias registration, ad-hoc rule
/// expressions). Data-level failures are never reported through this type;
/// they come back as [`crate::Violation`] lists.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Malformed rule expression '{expr}': {reason}")]
    MalformedRuleExpression { expr: String, reason: String },

    #[error("Unknown rule '{rule}' in expression '{expr}'")]
    UnknownRule { expr: String, rule: String },

    #[error("Alias already registered: {0}")]
    DuplicateAlias(String),

    #[error("Alias '{alias}' references another alias '{nested}'")]
    NestedAlias { alias: String, nested: String },

    #[error("Schema already registered for type: {0}")]
    DuplicateSchema(String),
}

pub type CoreResult<T> = Result<T, CoreError>;

impl CoreError {
    pub(crate) fn malformed(expr: &str, reason: impl Into<String>) -> Self {
        Self::MalformedRuleExpression {
            expr: expr.to_string(),
            reason: reason.into(),
        }
    }
}
