// Persistent operator options shared by every command

use anyhow::anyhow;
use clap::Args;
use url::Url;

/// Log levels understood by `--loglevel`.
const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Minimum accepted `--timeout`, in seconds.
const MIN_TIMEOUT: u64 = 30;

/// Operator-tunable options for a build run.
///
/// `timeout`, `proxy` and `dry_run` are hand-off values for the build
/// dispatcher; the image-resolution pass itself is neither bounded nor
/// proxied.
#[derive(Debug, Clone, Args)]
pub struct ConfigOptions {
    /// Logging verbosity (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    pub loglevel: String,

    /// Build timeout in seconds
    #[arg(long, default_value_t = 120)]
    pub timeout: u64,

    /// HTTP(S) proxy to hand to the build process
    #[arg(long)]
    pub proxy: Option<String>,

    /// Resolve and report the builder image without dispatching a build
    #[arg(long)]
    pub dry_run: bool,
}

impl ConfigOptions {
    /// Validates every field, returning the full list of violations rather
    /// than stopping at the first one.
    pub fn validate(&self) -> Vec<anyhow::Error> {
        let mut errors = Vec::new();
        if !LOG_LEVELS.contains(&self.loglevel.as_str()) {
            errors.push(anyhow!(
                "log level must be one of: {}",
                LOG_LEVELS.join(", ")
            ));
        }
        if self.timeout < MIN_TIMEOUT {
            errors.push(anyhow!("timeout must be at least {} seconds", MIN_TIMEOUT));
        }
        if let Some(proxy) = &self.proxy {
            if !(proxy.starts_with("http://") || proxy.starts_with("https://")) {
                errors.push(anyhow!("proxy url must start with http:// or https://"));
            } else if Url::parse(proxy).is_err() {
                errors.push(anyhow!("proxy url {:?} is not a valid url", proxy));
            }
        }
        errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn default_options() -> ConfigOptions {
        ConfigOptions {
            loglevel: "info".to_string(),
            timeout: 120,
            proxy: None,
            dry_run: false,
        }
    }

    #[test]
    fn test_defaults_pass_validation() {
        assert!(default_options().validate().is_empty());
    }

    #[test]
    fn test_timeout_below_minimum_is_rejected() {
        let mut options = default_options();
        options.timeout = 29;
        assert_eq!(options.validate().len(), 1);
    }

    #[test]
    fn test_unknown_log_level_is_rejected() {
        let mut options = default_options();
        options.loglevel = "verbose".to_string();
        assert_eq!(options.validate().len(), 1);
    }

    #[test]
    fn test_proxy_must_be_http_or_https() {
        let mut options = default_options();
        options.proxy = Some("socks5://proxy.example.com".to_string());
        assert_eq!(options.validate().len(), 1);

        options.proxy = Some("https://proxy.example.com:3128".to_string());
        assert!(options.validate().is_empty());
    }

    #[test]
    fn test_violations_are_collected_not_short_circuited() {
        let options = ConfigOptions {
            loglevel: "noisy".to_string(),
            timeout: 1,
            proxy: Some("ftp://proxy".to_string()),
            dry_run: false,
        };
        assert_eq!(options.validate().len(), 3);
    }
}
