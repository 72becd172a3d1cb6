use crate::options::Config;
use crate::parse::parse_duration_secs;
use anyhow::{Context, Result};
use fetchall_lib::ClientBuilder;

/// Creates a client according to the command-line config
pub(crate) fn create(cfg: &Config) -> Result<reqwest::Client> {
    ClientBuilder::builder()
        .user_agent(cfg.user_agent.clone())
        .timeout(parse_duration_secs(cfg.timeout))
        .allow_insecure(cfg.insecure)
        .custom_headers(cfg.headers())
        .build()
        .client()
        .context("Failed to create request client")
}

#[cfg(test)]
mod tests {
    use super::create;
    use crate::options::Config;

    #[test]
    fn test_create_with_defaults() {
        assert!(create(&Config::default()).is_ok());
    }

    #[test]
    fn test_invalid_user_agent_is_an_error() {
        let cfg = Config {
            user_agent: "bad\nagent".to_string(),
            ..Config::default()
        };
        let error = create(&cfg).unwrap_err();
        assert!(error.to_string().contains("Failed to create request client"));
    }
}
