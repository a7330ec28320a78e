use serde::{Deserialize, Serialize};

/// Behaviour switches for a resource, threaded in at construction time.
///
/// ```rust,ignore
/// let options = CrudOptions::default()
///     .with_delete_all(true)
///     .with_exception_detail(false);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CrudOptions {
    /// Query parameters become filter terms on list, count and delete-all
    pub allow_filters: bool,
    /// `GET /_count` is served; otherwise 403
    pub allow_count: bool,
    /// `DELETE /` is served; otherwise 403
    pub allow_delete_all: bool,
    /// Storage integrity violations are answered with their message (400)
    pub expose_exception_detail: bool,
    /// Permissive CORS headers on every response
    pub cors: bool,
}

impl Default for CrudOptions {
    fn default() -> Self {
        Self {
            allow_filters: true,
            allow_count: true,
            allow_delete_all: false,
            expose_exception_detail: true,
            cors: true,
        }
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn env_flag(name: &str, default: bool) -> bool {
    match std::env::var(name) {
        Ok(raw) => parse_flag(&raw).unwrap_or_else(|| {
            tracing::warn!(variable = name, value = %raw, "Ignoring unparsable flag");
            default
        }),
        Err(_) => default,
    }
}

impl CrudOptions {
    /// Defaults overridden by `CRUDREST_*` environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            allow_filters: env_flag("CRUDREST_ALLOW_FILTERS", defaults.allow_filters),
            allow_count: env_flag("CRUDREST_ALLOW_COUNT", defaults.allow_count),
            allow_delete_all: env_flag("CRUDREST_ALLOW_DELETE_ALL", defaults.allow_delete_all),
            expose_exception_detail: env_flag(
                "CRUDREST_EXPOSE_EXCEPTION_DETAIL",
                defaults.expose_exception_detail,
            ),
            cors: env_flag("CRUDREST_CORS", defaults.cors),
        }
    }

    #[must_use]
    pub const fn with_filters(mut self, enabled: bool) -> Self {
        self.allow_filters = enabled;
        self
    }

    #[must_use]
    pub const fn with_count(mut self, enabled: bool) -> Self {
        self.allow_count = enabled;
        self
    }

    #[must_use]
    pub const fn with_delete_all(mut self, enabled: bool) -> Self {
        self.allow_delete_all = enabled;
        self
    }

    #[must_use]
    pub const fn with_exception_detail(mut self, enabled: bool) -> Self {
        self.expose_exception_detail = enabled;
        self
    }

    #[must_use]
    pub const fn with_cors(mut self, enabled: bool) -> Self {
        self.cors = enabled;
        self
    }
}
