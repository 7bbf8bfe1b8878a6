use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::incluster::SERVICE_CERTFILE;
use crate::incluster::SERVICE_TOKENFILE;
use crate::zones::ZONE_CODES;

const DEFAULT_PROBE_TIMEOUT_SECS: u64 = 5;
const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 3;
const DEFAULT_PROBE_DELAY_MILLIS: u64 = 100;
const DEFAULT_OUTPUT_DIR: &str = "/tmp";

/// Configuration for the endpoint prober
#[derive(Debug, Clone)]
pub struct ProberConfig {
    /// Total budget for one probe, from connect to response headers
    pub(crate) timeout: Duration,
    /// Budget for establishing the TCP and TLS connection
    pub(crate) connect_timeout: Duration,
    /// Pause after a negative probe, before the next candidate
    pub(crate) delay: Duration,
    /// Skip TLS peer verification on discovery probes.
    ///
    /// The API server certificate is signed by the cluster CA, which the
    /// prober does not trust. Only applies to the discovery client.
    pub(crate) accept_invalid_certs: bool,
    /// Zone codes to probe, in order
    pub(crate) zone_codes: Vec<String>,
}

impl Default for ProberConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl ProberConfig {
    /// Create a configuration with the default timeouts, delay and zone codes
    pub fn new() -> Self {
        Self {
            timeout: Duration::from_secs(DEFAULT_PROBE_TIMEOUT_SECS),
            connect_timeout: Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS),
            delay: Duration::from_millis(DEFAULT_PROBE_DELAY_MILLIS),
            accept_invalid_certs: true,
            zone_codes: ZONE_CODES.iter().map(|code| code.to_string()).collect(),
        }
    }

    /// Set the total timeout of a single probe
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the connect (TCP + TLS handshake) timeout of a single probe
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Set the pause between negative probes
    ///
    /// A zero delay scans faster but makes provider-side throttling more likely.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Enable or disable TLS peer verification for discovery probes
    pub fn with_accept_invalid_certs(mut self, accept: bool) -> Self {
        self.accept_invalid_certs = accept;
        self
    }

    /// Replace the zone codes to probe, keeping the given order
    pub fn with_zone_codes<I, S>(mut self, codes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.zone_codes = codes.into_iter().map(Into::into).collect();
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    pub fn accept_invalid_certs(&self) -> bool {
        self.accept_invalid_certs
    }

    pub fn zone_codes(&self) -> &[String] {
        &self.zone_codes
    }
}

/// Where the workflows read their inputs and write their output
#[derive(Debug, Clone)]
pub struct Settings {
    pub token_path: PathBuf,
    pub ca_cert_path: PathBuf,
    /// Directory the generated kubeconfig is written to
    pub output_dir: PathBuf,
    pub prober: ProberConfig,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            token_path: PathBuf::from(SERVICE_TOKENFILE),
            ca_cert_path: PathBuf::from(SERVICE_CERTFILE),
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            prober: ProberConfig::new(),
        }
    }
}

impl Settings {
    /// Environment variable overriding the token path
    pub const TOKEN_PATH_ENV: &'static str = "EKS_HOLMES_TOKEN_PATH";
    /// Environment variable overriding the CA certificate path
    pub const CA_PATH_ENV: &'static str = "EKS_HOLMES_CA_PATH";
    /// Environment variable overriding the kubeconfig output directory
    pub const OUTPUT_DIR_ENV: &'static str = "EKS_HOLMES_OUTPUT_DIR";

    /// Defaults, with paths overridden from the environment where set
    pub fn from_env() -> Self {
        let mut settings = Self::default();
        if let Some(path) = env_path(Self::TOKEN_PATH_ENV) {
            settings.token_path = path;
        }
        if let Some(path) = env_path(Self::CA_PATH_ENV) {
            settings.ca_cert_path = path;
        }
        if let Some(path) = env_path(Self::OUTPUT_DIR_ENV) {
            settings.output_dir = path;
        }
        settings
    }

    pub fn with_token_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.token_path = path.into();
        self
    }

    pub fn with_ca_cert_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.ca_cert_path = path.into();
        self
    }

    pub fn with_output_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_dir = path.into();
        self
    }

    pub fn with_prober(mut self, prober: ProberConfig) -> Self {
        self.prober = prober;
        self
    }
}

fn env_path(key: &str) -> Option<PathBuf> {
    env::var_os(key)
        .filter(|value| !value.is_empty())
        .map(PathBuf::from)
}
