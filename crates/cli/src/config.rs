/// Default `tracing` filter when `VETTER_LOG` is unset.
pub const DEFAULT_LOG_FILTER: &str = "vetter=info,vetter_cli=info,vetter_core=info";

/// Process-level settings of the `vetter` binary, loaded from the
/// environment after `.env` has been applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CliConfig {
    /// `tracing` filter directives (default: [`DEFAULT_LOG_FILTER`]).
    pub log_filter: String,
    /// Emit logs as JSON lines instead of human-readable text (default: `false`).
    pub log_json: bool,
}

impl CliConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var             | Default                                        |
    /// |---------------------|------------------------------------------------|
    /// | `VETTER_LOG`        | `vetter=info,vetter_cli=info,vetter_core=info` |
    /// | `VETTER_LOG_FORMAT` | `text` (`json` switches to JSON lines)         |
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let log_filter = lookup("VETTER_LOG")
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| DEFAULT_LOG_FILTER.into());

        let log_json = lookup("VETTER_LOG_FORMAT")
            .is_some_and(|f| f.trim().eq_ignore_ascii_case("json"));

        Self {
            log_filter,
            log_json,
        }
    }
}
