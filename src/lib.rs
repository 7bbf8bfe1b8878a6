//! # eks-holmes
//!
//! Find the EKS API server behind a Kubernetes service account token.
//!
//! A service account token issued by EKS names its cluster in the issuer
//! claim (`https://oidc.eks.<region>.amazonaws.com/id/<cluster_id>`), but not
//! the hostname of the API server. This library recovers it:
//!
//! - decode the token header and payload without verifying the signature
//! - extract the cluster id and region from `iss`, and the service account and
//!   namespace from `sub`
//! - probe the known EKS zone codes until an API server answers
//! - optionally render a kubeconfig for the discovered server
//!
//! ## Example
//!
//! ```rust,no_run
//! use eks_holmes::{decode, extract_issuer_info, EndpointProber, ProberConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let token = "eyJhbGciOiJSUzI1NiIsInR5cCI6IkpXVCJ9...";
//!     let claims = decode(token)?;
//!     let location = extract_issuer_info(&claims.payload)?;
//!
//!     let prober = EndpointProber::new(ProberConfig::new())?;
//!     let endpoint = prober.discover(&location).await?;
//!
//!     println!("API server: {}", endpoint.url);
//!     Ok(())
//! }
//! ```

mod claims;
mod config;
mod error;
mod extractor;
pub mod incluster;
pub mod kubeconfig;
pub mod prober;
pub mod workflow;
pub mod zones;

// Re-exports for public API
pub use claims::decode;
pub use claims::ClaimSet;
pub use claims::DecodedClaims;
pub use claims::Segment;
pub use config::ProberConfig;
pub use config::Settings;
pub use error::Error;
pub use error::Result;
pub use extractor::extract_issuer_info;
pub use extractor::extract_subject_info;
pub use extractor::ClusterLocation;
pub use extractor::IdentityExtractor;
pub use extractor::IssuerExtractor;
pub use extractor::KubernetesIdentity;
pub use extractor::SubjectExtractor;
pub use prober::DiscoveredEndpoint;
pub use prober::EndpointProber;
pub use prober::HttpProbe;
pub use prober::Probe;
pub use prober::ProbeError;
pub use prober::ProbeOutcome;
pub use prober::ProbeProgress;
pub use reqwest::StatusCode;
pub use tokio_util::sync::CancellationToken;
