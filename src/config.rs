use secrecy::SecretString;
use std::env;

#[derive(Clone, Debug)]
pub struct Config {
    pub api_base_url: String,
    pub bearer_token: SecretString,
    pub ledger_path: String,
    pub request_timeout_secs: u64,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            api_base_url: env::var("CAMPUS_API_BASE_URL")
                .unwrap_or_else(|_| "http://localhost:8080".to_string()),
            bearer_token: SecretString::from(
                env::var("CAMPUS_API_TOKEN").unwrap_or_else(|_| "dev_token".to_string()),
            ),
            ledger_path: env::var("CAMPUS_LEDGER_PATH")
                .unwrap_or_else(|_| "campus-assess-submitted.json".to_string()),
            // Generation is LLM-backed and can be slow; this is the transport
            // default, no per-call timeout is layered on top.
            request_timeout_secs: env::var("CAMPUS_REQUEST_TIMEOUT_SECS")
                .ok()
                .and_then(|t| t.parse().ok())
                .unwrap_or(30),
        }
    }

    #[cfg(test)]
    pub fn test_config() -> Self {
        Self {
            api_base_url: "http://localhost:8080".to_string(),
            bearer_token: SecretString::from("test_token".to_string()),
            ledger_path: "test-submitted.json".to_string(),
            request_timeout_secs: 5,
        }
    }
}
