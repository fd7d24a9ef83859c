/// Engine behaviour switches.
///
/// The defaults match the documented walker semantics. Use
/// [`ValidatorConfig::from_env`] to override them at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidatorConfig {
    /// Whether `required` on a record fails for a zero-valued record
    /// (default: `true`). When `false`, `required` only rejects an absent
    /// record.
    pub required_struct: bool,
    /// Stop at the first failing rule group of each value instead of
    /// collecting every failing group (default: `false`).
    pub field_fail_fast: bool,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            required_struct: true,
            field_fail_fast: false,
        }
    }
}

impl ValidatorConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                  | Default |
    /// |--------------------------|---------|
    /// | `VETTER_REQUIRED_STRUCT` | `true`  |
    /// | `VETTER_FIELD_FAIL_FAST` | `false` |
    ///
    /// Unrecognised values fall back to the default.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            required_struct: lookup("VETTER_REQUIRED_STRUCT")
                .and_then(|v| parse_flag(&v))
                .unwrap_or(defaults.required_struct),
            field_fail_fast: lookup("VETTER_FIELD_FAIL_FAST")
                .and_then(|v| parse_flag(&v))
                .unwrap_or(defaults.field_fail_fast),
        }
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
