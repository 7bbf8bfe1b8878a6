use std::sync::Arc;
use std::sync::LazyLock;

use regex::Regex;

use crate::claims::ClaimSet;
use crate::error::Error;
use crate::error::Result;

static EKS_ISSUER_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^https://oidc\.eks\.(?<region>[^.]+)\.amazonaws\.com/id/(?<cluster_id>[A-F0-9]+)$")
        .expect("EKS issuer regex is valid")
});

/// Cluster coordinates recovered from an EKS OIDC issuer
#[derive(Debug, Hash, Eq, PartialEq, Clone)]
pub struct ClusterLocation {
    /// Upper-case hex identifier of the cluster
    pub cluster_id: Arc<str>,
    /// AWS region the cluster runs in, e.g. `us-west-2`
    pub region: Arc<str>,
}

/// Identity information extracted from Kubernetes service account tokens
///
/// Contains the service account name and namespace that identify a
/// Kubernetes workload.
#[derive(Debug, Hash, Eq, PartialEq, Clone)]
pub struct KubernetesIdentity {
    pub service_account: Arc<str>,
    pub namespace: Arc<str>,
}

/// Trait for extracting one piece of information from a decoded payload
///
/// Extractors are independent of each other: a payload that fails one
/// extractor can still satisfy another.
pub trait IdentityExtractor: Send + Sync {
    /// The type of information to extract
    type Identity;

    /// Extract the information from a decoded, unverified payload
    fn extract_identity(&self, payload: &ClaimSet) -> Result<Self::Identity>;
}

/// Extracts the cluster id and region from the `iss` claim
///
/// Expected format: `https://oidc.eks.<region>.amazonaws.com/id/<cluster_id>`
#[derive(Clone, Debug, Default)]
pub struct IssuerExtractor;

impl IdentityExtractor for IssuerExtractor {
    type Identity = ClusterLocation;

    fn extract_identity(&self, payload: &ClaimSet) -> Result<Self::Identity> {
        let iss = string_claim(payload, "iss")?;

        let captures = EKS_ISSUER_PATTERN
            .captures(iss)
            .ok_or_else(|| Error::InvalidIssuerFormat(iss.to_string()))?;

        match (captures.name("cluster_id"), captures.name("region")) {
            (Some(cluster_id), Some(region)) => Ok(ClusterLocation {
                cluster_id: Arc::from(cluster_id.as_str()),
                region: Arc::from(region.as_str()),
            }),
            _ => Err(Error::InvalidIssuerFormat(iss.to_string())),
        }
    }
}

/// Extracts the service account and namespace from the `sub` claim
///
/// Expected format: `system:serviceaccount:<namespace>:<service_account>`
#[derive(Clone, Debug, Default)]
pub struct SubjectExtractor;

impl IdentityExtractor for SubjectExtractor {
    type Identity = KubernetesIdentity;

    fn extract_identity(&self, payload: &ClaimSet) -> Result<Self::Identity> {
        let sub = string_claim(payload, "sub")?;
        let parts: Vec<&str> = sub.split(':').collect();

        match parts.as_slice() {
            ["system", "serviceaccount", namespace, service_account]
                if is_plain_name(namespace) && is_plain_name(service_account) =>
            {
                Ok(KubernetesIdentity {
                    namespace: Arc::from(*namespace),
                    service_account: Arc::from(*service_account),
                })
            }
            _ => Err(Error::InvalidSubjectFormat(sub.to_string())),
        }
    }
}

/// Names end up in the kubeconfig file name, so they must be a single,
/// non-empty path component.
fn is_plain_name(name: &str) -> bool {
    !name.is_empty() && !name.contains(['/', '\\']) && !name.contains("..")
}

/// Extract `{cluster_id, region}` from the payload's issuer
pub fn extract_issuer_info(payload: &ClaimSet) -> Result<ClusterLocation> {
    IssuerExtractor.extract_identity(payload)
}

/// Extract `{service_account, namespace}` from the payload's subject
pub fn extract_subject_info(payload: &ClaimSet) -> Result<KubernetesIdentity> {
    SubjectExtractor.extract_identity(payload)
}

fn string_claim<'a>(payload: &'a ClaimSet, claim: &'static str) -> Result<&'a str> {
    payload
        .get(claim)
        .and_then(|value| value.as_str())
        .ok_or(Error::ClaimMissing(claim))
}
