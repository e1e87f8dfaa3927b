//! Pipeline configuration.
//!
//! Every knob lives in one [`PipelineConfig`] built via its
//! [`PipelineConfigBuilder`], so configs are trivial to share across
//! instances, log, and diff between runs. Service endpoints and
//! credentials come from the environment through [`PipelineConfig::from_env`];
//! a missing required variable is a startup error
//! ([`PipelineError::MissingEnv`]) rather than something an activity
//! discovers mid-workflow.

use crate::error::PipelineError;
use crate::retry::RetryPolicy;
use std::path::PathBuf;
use std::time::Duration;

/// Required environment variables, in the order `from_env` checks them.
const REQUIRED_ENV: [&str; 6] = [
    "DOCSUMM_STORAGE_ROOT",
    "DOCSUMM_ANALYSIS_ENDPOINT",
    "DOCSUMM_ANALYSIS_KEY",
    "DOCSUMM_COMPLETION_ENDPOINT",
    "DOCSUMM_COMPLETION_KEY",
    "DOCSUMM_COMPLETION_DEPLOYMENT",
];

/// Configuration for the summarization pipeline and its host.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Root directory of the filesystem blob store.
    pub storage_root: PathBuf,

    /// Container watched for uploads. Default: `input`.
    pub input_container: String,

    /// Container summaries are written to. Default: `output`.
    pub output_container: String,

    /// Directory for per-instance history files. Defaults to
    /// `<storage_root>/.state` when unset.
    pub state_dir: Option<PathBuf>,

    /// Base URL of the document-analysis service.
    pub analysis_endpoint: String,

    /// Subscription key for the document-analysis service.
    pub analysis_key: String,

    /// Base URL of the text-completion service.
    pub completion_endpoint: String,

    /// Bearer key for the text-completion service.
    pub completion_key: String,

    /// Model deployment name submitted with every completion request.
    pub completion_deployment: String,

    /// Wait between failed activity attempts. Default: 5000 ms.
    ///
    /// Together with `max_attempts` this is the shared retry policy
    /// applied identically to all three activities of every instance.
    pub first_retry_interval_ms: u64,

    /// Activity attempts including the first. Default: 3.
    pub max_attempts: u32,

    /// How often the host lists the input container. Default: 5 s.
    pub poll_interval: Duration,

    /// Warmup tick period. Default: 300 s (the source's five-minute cron).
    pub warmup_interval: Duration,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            storage_root: PathBuf::from("data"),
            input_container: "input".to_string(),
            output_container: "output".to_string(),
            state_dir: None,
            analysis_endpoint: String::new(),
            analysis_key: String::new(),
            completion_endpoint: String::new(),
            completion_key: String::new(),
            completion_deployment: String::new(),
            first_retry_interval_ms: 5000,
            max_attempts: 3,
            poll_interval: Duration::from_secs(5),
            warmup_interval: Duration::from_secs(300),
        }
    }
}

impl PipelineConfig {
    pub fn builder() -> PipelineConfigBuilder {
        PipelineConfigBuilder {
            config: Self::default(),
        }
    }

    /// Read configuration from `DOCSUMM_*` environment variables.
    pub fn from_env() -> Result<Self, PipelineError> {
        let mut builder = Self::builder()
            .storage_root(require_env(REQUIRED_ENV[0])?)
            .analysis_endpoint(require_env(REQUIRED_ENV[1])?)
            .analysis_key(require_env(REQUIRED_ENV[2])?)
            .completion_endpoint(require_env(REQUIRED_ENV[3])?)
            .completion_key(require_env(REQUIRED_ENV[4])?)
            .completion_deployment(require_env(REQUIRED_ENV[5])?);

        if let Some(v) = optional_env("DOCSUMM_INPUT_CONTAINER") {
            builder = builder.input_container(v);
        }
        if let Some(v) = optional_env("DOCSUMM_OUTPUT_CONTAINER") {
            builder = builder.output_container(v);
        }
        if let Some(v) = optional_env("DOCSUMM_STATE_DIR") {
            builder = builder.state_dir(v);
        }
        if let Some(v) = optional_env("DOCSUMM_RETRY_INTERVAL_MS") {
            builder = builder.first_retry_interval_ms(parse_env("DOCSUMM_RETRY_INTERVAL_MS", &v)?);
        }
        if let Some(v) = optional_env("DOCSUMM_MAX_ATTEMPTS") {
            builder = builder.max_attempts(parse_env("DOCSUMM_MAX_ATTEMPTS", &v)?);
        }
        if let Some(v) = optional_env("DOCSUMM_POLL_INTERVAL_SECS") {
            builder = builder
                .poll_interval(Duration::from_secs(parse_env("DOCSUMM_POLL_INTERVAL_SECS", &v)?));
        }
        if let Some(v) = optional_env("DOCSUMM_WARMUP_INTERVAL_SECS") {
            builder = builder.warmup_interval(Duration::from_secs(parse_env(
                "DOCSUMM_WARMUP_INTERVAL_SECS",
                &v,
            )?));
        }

        builder.build()
    }

    /// Resolved history directory.
    pub fn state_dir(&self) -> PathBuf {
        self.state_dir
            .clone()
            .unwrap_or_else(|| self.storage_root.join(".state"))
    }

    /// The shared retry policy value applied to every activity call.
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            Duration::from_millis(self.first_retry_interval_ms),
            self.max_attempts,
        )
    }
}

fn require_env(name: &'static str) -> Result<String, PipelineError> {
    match std::env::var(name) {
        Ok(v) if !v.is_empty() => Ok(v),
        _ => Err(PipelineError::MissingEnv {
            name: name.to_string(),
        }),
    }
}

fn optional_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

fn parse_env<T: std::str::FromStr>(name: &str, value: &str) -> Result<T, PipelineError> {
    value
        .parse()
        .map_err(|_| PipelineError::InvalidConfig(format!("{name}: unparseable value '{value}'")))
}

/// Builder for [`PipelineConfig`].
#[derive(Debug)]
pub struct PipelineConfigBuilder {
    config: PipelineConfig,
}

impl PipelineConfigBuilder {
    pub fn storage_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.config.storage_root = root.into();
        self
    }

    pub fn input_container(mut self, name: impl Into<String>) -> Self {
        self.config.input_container = name.into();
        self
    }

    pub fn output_container(mut self, name: impl Into<String>) -> Self {
        self.config.output_container = name.into();
        self
    }

    pub fn state_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.state_dir = Some(dir.into());
        self
    }

    pub fn analysis_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.config.analysis_endpoint = endpoint.into();
        self
    }

    pub fn analysis_key(mut self, key: impl Into<String>) -> Self {
        self.config.analysis_key = key.into();
        self
    }

    pub fn completion_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.config.completion_endpoint = endpoint.into();
        self
    }

    pub fn completion_key(mut self, key: impl Into<String>) -> Self {
        self.config.completion_key = key.into();
        self
    }

    pub fn completion_deployment(mut self, deployment: impl Into<String>) -> Self {
        self.config.completion_deployment = deployment.into();
        self
    }

    pub fn first_retry_interval_ms(mut self, ms: u64) -> Self {
        self.config.first_retry_interval_ms = ms;
        self
    }

    pub fn max_attempts(mut self, attempts: u32) -> Self {
        self.config.max_attempts = attempts;
        self
    }

    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.config.poll_interval = interval;
        self
    }

    pub fn warmup_interval(mut self, interval: Duration) -> Self {
        self.config.warmup_interval = interval;
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<PipelineConfig, PipelineError> {
        let c = &self.config;
        if c.analysis_endpoint.is_empty() || c.analysis_key.is_empty() {
            return Err(PipelineError::InvalidConfig(
                "analysis endpoint and key are required".into(),
            ));
        }
        if c.completion_endpoint.is_empty()
            || c.completion_key.is_empty()
            || c.completion_deployment.is_empty()
        {
            return Err(PipelineError::InvalidConfig(
                "completion endpoint, key, and deployment are required".into(),
            ));
        }
        if c.max_attempts == 0 {
            return Err(PipelineError::InvalidConfig(
                "max_attempts must be >= 1".into(),
            ));
        }
        if c.input_container == c.output_container {
            return Err(PipelineError::InvalidConfig(
                "input and output containers must differ".into(),
            ));
        }
        if c.poll_interval.is_zero() {
            return Err(PipelineError::InvalidConfig(
                "poll_interval must be non-zero".into(),
            ));
        }
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_builder() -> PipelineConfigBuilder {
        PipelineConfig::builder()
            .analysis_endpoint("https://analysis.example.com")
            .analysis_key("ak")
            .completion_endpoint("https://completion.example.com")
            .completion_key("ck")
            .completion_deployment("summaries-v1")
    }

    #[test]
    fn defaults_match_source_deployment() {
        let config = valid_builder().build().unwrap();
        assert_eq!(config.input_container, "input");
        assert_eq!(config.output_container, "output");
        assert_eq!(config.first_retry_interval_ms, 5000);
        assert_eq!(config.max_attempts, 3);
        assert_eq!(config.warmup_interval, Duration::from_secs(300));
    }

    #[test]
    fn state_dir_defaults_under_storage_root() {
        let config = valid_builder().storage_root("/srv/blobs").build().unwrap();
        assert_eq!(config.state_dir(), PathBuf::from("/srv/blobs/.state"));

        let config = valid_builder().state_dir("/var/docsumm").build().unwrap();
        assert_eq!(config.state_dir(), PathBuf::from("/var/docsumm"));
    }

    #[test]
    fn missing_service_config_is_rejected() {
        let err = PipelineConfig::builder().build().unwrap_err();
        assert!(matches!(err, PipelineError::InvalidConfig(_)));
    }

    #[test]
    fn zero_attempts_is_rejected() {
        let err = valid_builder().max_attempts(0).build().unwrap_err();
        assert!(matches!(err, PipelineError::InvalidConfig(_)));
    }

    #[test]
    fn same_container_twice_is_rejected() {
        let err = valid_builder()
            .input_container("blobs")
            .output_container("blobs")
            .build()
            .unwrap_err();
        assert!(matches!(err, PipelineError::InvalidConfig(_)));
    }

    #[test]
    fn retry_policy_reflects_config() {
        let config = valid_builder()
            .first_retry_interval_ms(250)
            .max_attempts(5)
            .build()
            .unwrap();
        let policy = config.retry_policy();
        assert_eq!(policy.first_retry_interval, Duration::from_millis(250));
        assert_eq!(policy.max_attempts, 5);
    }
}
