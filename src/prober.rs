//! EKS API server discovery
//!
//! There is no directory an unauthenticated caller can ask for the API
//! server hostname of a cluster. What is known is the issuer-derived cluster
//! id and region, and the fixed hostname shape
//! `https://<cluster_id>.<code>.<region>.eks.amazonaws.com`. The prober walks
//! the [zone codes](crate::zones::ZONE_CODES) in order and stops at the first
//! hostname that answers like a Kubernetes API server.
//!
//! An unbound code never produces an HTTP response: DNS resolution, the TCP
//! connect or the TLS handshake fails. Any of `200`, `401` or `403` on the
//! other hand means a live API server, even though the probe sends no
//! credentials. This is a best-effort signal; no content check is done on the
//! responding server.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use reqwest::ClientBuilder;
use reqwest::StatusCode;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use tracing::info;
use tracing::warn;

use crate::config::ProberConfig;
use crate::error::Error;
use crate::error::Result;
use crate::extractor::ClusterLocation;
use crate::zones;

/// Failure of a single probe
///
/// Never leaves the discovery loop: a failed probe only means that the
/// candidate is not bound to the cluster.
#[derive(Error, Debug)]
pub enum ProbeError {
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("Probe failed: {0}")]
    Other(String),
}

/// Trait for probing a single candidate URL
#[async_trait]
pub trait Probe: Send + Sync {
    /// Send one unauthenticated request to `url` and return the response status
    async fn probe(&self, url: &str) -> std::result::Result<StatusCode, ProbeError>;
}

/// HTTPS probe backed by reqwest
///
/// Every probe uses a fresh connection; idle connections are never pooled, so
/// a misbehaving candidate cannot leak state into the next probe.
#[derive(Clone, Debug)]
pub struct HttpProbe {
    client: Client,
}

impl HttpProbe {
    /// Create a probe from the prober configuration
    pub fn new(config: &ProberConfig) -> Result<Self> {
        Self::with_client_builder(Client::builder(), config)
    }

    /// Create a probe from a caller-prepared client builder
    ///
    /// Use this for proxies or extra headers. The timeouts, the invalid
    /// certificate flag and the disabled connection pool of `config` are
    /// applied last and override whatever `builder` set for them.
    pub fn with_client_builder(builder: ClientBuilder, config: &ProberConfig) -> Result<Self> {
        let client = builder
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .pool_max_idle_per_host(0)
            .danger_accept_invalid_certs(config.accept_invalid_certs)
            .build()?;

        Ok(Self { client })
    }
}

#[async_trait]
impl Probe for HttpProbe {
    async fn probe(&self, url: &str) -> std::result::Result<StatusCode, ProbeError> {
        let response = self.client.get(url).send().await?;
        Ok(response.status())
    }
}

/// Whether a response status proves a live API server behind the hostname
pub fn is_live_status(status: StatusCode) -> bool {
    [StatusCode::OK, StatusCode::UNAUTHORIZED, StatusCode::FORBIDDEN].contains(&status)
}

/// Result of probing one candidate
#[derive(Debug)]
pub enum ProbeOutcome {
    /// The candidate answered with a status that signals an API server
    Live(StatusCode),
    /// The candidate answered, but not like an API server
    Rejected(StatusCode),
    /// No HTTP response at all
    Unreachable(ProbeError),
}

impl ProbeOutcome {
    pub fn is_live(&self) -> bool {
        matches!(self, ProbeOutcome::Live(_))
    }
}

impl From<std::result::Result<StatusCode, ProbeError>> for ProbeOutcome {
    fn from(result: std::result::Result<StatusCode, ProbeError>) -> Self {
        match result {
            Ok(status) if is_live_status(status) => ProbeOutcome::Live(status),
            Ok(status) => ProbeOutcome::Rejected(status),
            Err(error) => ProbeOutcome::Unreachable(error),
        }
    }
}

/// Progress report handed to the observer after every probe
#[derive(Debug)]
pub struct ProbeProgress {
    /// Zero-based position of the candidate in the probing order
    pub index: usize,
    /// Number of candidates in this discovery run
    pub total: usize,
    pub url: String,
    pub outcome: ProbeOutcome,
}

/// The API server URL that answered a probe
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredEndpoint {
    pub url: String,
    pub status: StatusCode,
    /// Number of probes sent, the successful one included
    pub attempts: usize,
}

/// Sequential first-match search over the zone codes
pub struct EndpointProber<P: Probe = HttpProbe> {
    probe: P,
    zone_codes: Vec<String>,
    delay: Duration,
}

impl EndpointProber<HttpProbe> {
    /// Create a prober that probes over HTTPS
    pub fn new(config: ProberConfig) -> Result<Self> {
        let probe = HttpProbe::new(&config)?;
        Ok(Self::with_probe(probe, config))
    }
}

impl<P: Probe> EndpointProber<P> {
    /// Create a prober with a custom probe implementation
    pub fn with_probe(probe: P, config: ProberConfig) -> Self {
        Self {
            probe,
            zone_codes: config.zone_codes,
            delay: config.delay,
        }
    }

    /// Number of candidates a full discovery run probes
    pub fn candidate_count(&self) -> usize {
        self.zone_codes.len()
    }

    /// Find the API server of `location`
    pub async fn discover(&self, location: &ClusterLocation) -> Result<DiscoveredEndpoint> {
        self.discover_with(location, |_| {}, &CancellationToken::new())
            .await
    }

    /// Find the API server of `location`, reporting every probe to `observer`
    ///
    /// Candidates are probed one at a time in zone code order. The first live
    /// answer ends the run; unprobed candidates are skipped. Cancelling
    /// `cancel` aborts the run, including a probe in flight.
    pub async fn discover_with<F>(
        &self,
        location: &ClusterLocation,
        mut observer: F,
        cancel: &CancellationToken,
    ) -> Result<DiscoveredEndpoint>
    where
        F: FnMut(&ProbeProgress),
    {
        let candidates = zones::candidate_urls(location, &self.zone_codes);
        let total = candidates.len();

        info!(
            cluster_id = %location.cluster_id,
            region = %location.region,
            total,
            "Enumerating EKS endpoint"
        );

        for (index, url) in candidates.enumerate() {
            let result = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(Error::Cancelled { attempts: index }),
                result = self.probe.probe(&url) => result,
            };

            let outcome = ProbeOutcome::from(result);
            debug!(index, total, %url, ?outcome, "Probed candidate");

            let progress = ProbeProgress {
                index,
                total,
                url,
                outcome,
            };
            observer(&progress);

            if let ProbeOutcome::Live(status) = progress.outcome {
                info!(url = %progress.url, %status, "Found EKS endpoint");
                return Ok(DiscoveredEndpoint {
                    url: progress.url,
                    status,
                    attempts: index + 1,
                });
            }

            if index + 1 < total && !self.delay.is_zero() {
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => return Err(Error::Cancelled { attempts: index + 1 }),
                    _ = tokio::time::sleep(self.delay) => {}
                }
            }
        }

        warn!(
            cluster_id = %location.cluster_id,
            region = %location.region,
            attempts = total,
            "No EKS endpoint found"
        );

        Err(Error::NotFound {
            cluster_id: location.cluster_id.to_string(),
            region: location.region.to_string(),
            attempts: total,
        })
    }
}
