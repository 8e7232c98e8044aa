//! Runtime configuration read from environment variables.
//!
//! | Variable                   | Default                  |
//! |----------------------------|--------------------------|
//! | `CREO_DOCKER_SOCKET`       | `DOCKER_HOST` or `/var/run/docker.sock` |
//! | `CREO_SAMPLE_INTERVAL_MS`  | `1000`                   |
//! | `CREO_PROCESS_INTERVAL_MS` | `5000` (`0` disables)    |

use std::path::PathBuf;
use std::time::Duration;

use crate::runtime::docker::DEFAULT_SOCKET_PATH;

const DEFAULT_SAMPLE_INTERVAL: Duration = Duration::from_secs(1);
const DEFAULT_PROCESS_INTERVAL: Duration = Duration::from_secs(5);

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid value `{value}` for `{var}`: {source}")]
    InvalidNumber {
        var: &'static str,
        value: String,
        #[source]
        source: std::num::ParseIntError,
    },
    #[error("`{0}` must be greater than zero")]
    ZeroInterval(&'static str),
    #[error("unsupported DOCKER_HOST `{0}`, only unix:// sockets are supported")]
    UnsupportedDockerHost(String),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Pacing of one subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SamplerConfig {
    /// Time between two decode attempts.
    pub sample_interval: Duration,
    /// Time between two process list queries, `None` if process lists are not
    /// attached.
    pub process_interval: Option<Duration>,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            sample_interval: DEFAULT_SAMPLE_INTERVAL,
            process_interval: Some(DEFAULT_PROCESS_INTERVAL),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub socket_path: PathBuf,
    pub sampler: SamplerConfig,
}

impl Config {
    /// Reads the configuration from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Builds the configuration from an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let socket_path = match (lookup("CREO_DOCKER_SOCKET"), lookup("DOCKER_HOST")) {
            (Some(path), _) => PathBuf::from(path),
            (None, Some(host)) => match host.strip_prefix("unix://") {
                Some(path) => PathBuf::from(path),
                None => return Err(Error::UnsupportedDockerHost(host)),
            },
            (None, None) => PathBuf::from(DEFAULT_SOCKET_PATH),
        };

        let sample_interval = match millis(&lookup, "CREO_SAMPLE_INTERVAL_MS")? {
            Some(interval) if interval.is_zero() => {
                return Err(Error::ZeroInterval("CREO_SAMPLE_INTERVAL_MS"));
            }
            Some(interval) => interval,
            None => DEFAULT_SAMPLE_INTERVAL,
        };
        let process_interval = match millis(&lookup, "CREO_PROCESS_INTERVAL_MS")? {
            Some(interval) if interval.is_zero() => None,
            Some(interval) => Some(interval),
            None => Some(DEFAULT_PROCESS_INTERVAL),
        };

        Ok(Self {
            socket_path,
            sampler: SamplerConfig {
                sample_interval,
                process_interval,
            },
        })
    }
}

fn millis(lookup: &impl Fn(&str) -> Option<String>, var: &'static str) -> Result<Option<Duration>> {
    lookup(var)
        .map(|value| {
            value
                .trim()
                .parse::<u64>()
                .map(Duration::from_millis)
                .map_err(|source| Error::InvalidNumber { var, value, source })
        })
        .transpose()
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config_from(vars: &[(&str, &str)]) -> Result<Config> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|var| vars.get(var).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.socket_path, PathBuf::from("/var/run/docker.sock"));
        assert_eq!(config.sampler, SamplerConfig::default());
        assert_eq!(config.sampler.sample_interval, Duration::from_secs(1));
    }

    #[test]
    fn test_socket_path_precedence() {
        let config = config_from(&[
            ("CREO_DOCKER_SOCKET", "/tmp/a.sock"),
            ("DOCKER_HOST", "unix:///tmp/b.sock"),
        ])
        .unwrap();
        assert_eq!(config.socket_path, PathBuf::from("/tmp/a.sock"));

        let config = config_from(&[("DOCKER_HOST", "unix:///tmp/b.sock")]).unwrap();
        assert_eq!(config.socket_path, PathBuf::from("/tmp/b.sock"));

        let err = config_from(&[("DOCKER_HOST", "tcp://10.0.0.1:2375")]).unwrap_err();
        assert!(matches!(err, Error::UnsupportedDockerHost(_)));
    }

    #[test]
    fn test_intervals() {
        let config = config_from(&[
            ("CREO_SAMPLE_INTERVAL_MS", "250"),
            ("CREO_PROCESS_INTERVAL_MS", "0"),
        ])
        .unwrap();
        assert_eq!(config.sampler.sample_interval, Duration::from_millis(250));
        assert_eq!(config.sampler.process_interval, None);

        let err = config_from(&[("CREO_SAMPLE_INTERVAL_MS", "0")]).unwrap_err();
        assert!(matches!(err, Error::ZeroInterval("CREO_SAMPLE_INTERVAL_MS")));

        match config_from(&[("CREO_PROCESS_INTERVAL_MS", "soon")]).unwrap_err() {
            Error::InvalidNumber { var, value, .. } => {
                assert_eq!(var, "CREO_PROCESS_INTERVAL_MS");
                assert_eq!(value, "soon");
            }
            err => panic!("Expected InvalidNumber error, got {err}"),
        }
    }
}
