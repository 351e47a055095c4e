// log setup - tracing to stderr, filtered by --log-level / RUST_LOG

use crate::Error;
use tracing_subscriber::EnvFilter;

// crates that drown our own events at debug
const NOISY: &[(&str, &str)] = &[
    ("sqlx", "warn"),
    ("hyper", "warn"),
    ("hyper_util", "warn"),
    ("reqwest", "warn"),
    ("h2", "warn"),
    ("tower_http", "info"),
];

fn build_env_filter(level: &str) -> Result<EnvFilter, Error> {
    let mut directives = vec![level.to_string()];
    for (target, lvl) in NOISY {
        directives.push(format!("{target}={lvl}"));
    }

    let filter = directives.join(",");
    EnvFilter::try_new(&filter)
        .map_err(|e| Error::Logging(format!("invalid filter '{filter}': {e}")))
}

/// Install the global subscriber. `level` is a level name or a full
/// `EnvFilter` directive string.
pub fn init(level: &str) -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_env_filter(build_env_filter(level)?)
        .with_target(true)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| Error::Logging(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_levels_and_directives() {
        assert!(build_env_filter("info").is_ok());
        assert!(build_env_filter("sqlgate=debug").is_ok());
    }

    #[test]
    fn rejects_garbage() {
        assert!(build_env_filter("sqlgate=loud").is_err());
    }
}
