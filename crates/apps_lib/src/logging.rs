//! Log filtering for applications embedding the governance engine
use std::env;

use eyre::{Result, WrapErr};
use tracing_subscriber::filter::EnvFilter;
use tracing_subscriber::fmt::Subscriber;

/// The environment variable holding the log filter directives
pub const ENV_KEY: &str = "QUORUM_LOG";

/// Directives used when [`ENV_KEY`] is not set. Reconciliation and
/// submissions are reported by the engine crates at `info`, everything
/// else only from `warn`.
pub const DEFAULT_DIRECTIVES: &str =
    "warn,quorum_sdk=info,quorum_governance=info";

/// Install a global subscriber filtered by [`ENV_KEY`], or by
/// [`DEFAULT_DIRECTIVES`] if the variable is not set
pub fn init() -> Result<()> {
    set_subscriber(filter_from_env()?)
}

/// The filter from [`ENV_KEY`], or [`DEFAULT_DIRECTIVES`] if the variable
/// is not set
pub fn filter_from_env() -> Result<EnvFilter> {
    filter_from(env::var(ENV_KEY).ok().as_deref())
}

/// Parse the given directives, falling back to [`DEFAULT_DIRECTIVES`] when
/// there are none
pub fn filter_from(directives: Option<&str>) -> Result<EnvFilter> {
    let directives = directives
        .map(str::trim)
        .filter(|directives| !directives.is_empty())
        .unwrap_or(DEFAULT_DIRECTIVES);
    EnvFilter::try_new(directives).wrap_err_with(|| {
        format!("Invalid log directives in {ENV_KEY}: {directives:?}")
    })
}

/// Install a global subscriber with the given filter
pub fn set_subscriber(filter: EnvFilter) -> Result<()> {
    let collector = Subscriber::builder().with_env_filter(filter).finish();
    tracing::subscriber::set_global_default(collector)
        .wrap_err("Failed to set log subscriber")
}

#[cfg(test)]
mod test {
    use tracing::level_filters::LevelFilter;

    use super::*;

    #[test]
    fn test_default_directives() {
        for unset in [None, Some(""), Some("  ")] {
            let filter = filter_from(unset).unwrap();
            assert_eq!(filter.max_level_hint(), Some(LevelFilter::INFO));
            let rendered = filter.to_string();
            assert!(rendered.contains("quorum_sdk=info"), "{rendered}");
            assert!(rendered.contains("quorum_governance=info"), "{rendered}");
            assert!(rendered.contains("warn"), "{rendered}");
        }
    }

    #[test]
    fn test_directives_override_defaults() {
        let filter = filter_from(Some("quorum_sdk=trace")).unwrap();
        assert_eq!(filter.max_level_hint(), Some(LevelFilter::TRACE));
        assert!(!filter.to_string().contains("quorum_governance"));

        let filter = filter_from(Some("debug")).unwrap();
        assert_eq!(filter.max_level_hint(), Some(LevelFilter::DEBUG));
    }

    #[test]
    fn test_invalid_directives_are_reported() {
        let err = filter_from(Some("quorum_sdk=loud")).unwrap_err();
        assert!(err.to_string().contains(ENV_KEY), "{err}");
    }
}
