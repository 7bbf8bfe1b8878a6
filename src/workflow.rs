//! The two top-level operations: endpoint enumeration and kubeconfig generation
//!
//! Both take an observer for probe progress and a cancellation token so the
//! caller can render progress and abort a scan, and both return their error
//! instead of handling it.

use std::path::PathBuf;

use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::claims::DecodedClaims;
use crate::config::Settings;
use crate::error::Result;
use crate::extractor::extract_issuer_info;
use crate::extractor::extract_subject_info;
use crate::extractor::ClusterLocation;
use crate::extractor::KubernetesIdentity;
use crate::incluster;
use crate::kubeconfig;
use crate::kubeconfig::Kubeconfig;
use crate::kubeconfig::KubeconfigData;
use crate::prober::DiscoveredEndpoint;
use crate::prober::EndpointProber;
use crate::prober::Probe;
use crate::prober::ProbeProgress;

/// Outcome of [`enumerate_endpoint`]
#[derive(Debug, Clone)]
pub struct Enumeration {
    pub location: ClusterLocation,
    pub endpoint: DiscoveredEndpoint,
}

/// Outcome of [`generate_kubeconfig`]
#[derive(Debug, Clone)]
pub struct GeneratedKubeconfig {
    pub path: PathBuf,
    pub identity: KubernetesIdentity,
    pub location: ClusterLocation,
    pub endpoint: DiscoveredEndpoint,
}

/// Read the token, recover the cluster location and discover its API server
pub async fn enumerate_endpoint<P, F>(
    settings: &Settings,
    prober: &EndpointProber<P>,
    observer: F,
    cancel: &CancellationToken,
) -> Result<Enumeration>
where
    P: Probe,
    F: FnMut(&ProbeProgress),
{
    let token = incluster::read_token(&settings.token_path)?;
    let claims = DecodedClaims::decode(&token)?;
    let location = extract_issuer_info(&claims.payload)?;

    let endpoint = prober.discover_with(&location, observer, cancel).await?;

    Ok(Enumeration { location, endpoint })
}

/// Discover the API server and write a kubeconfig for the token's service account
///
/// Identity and CA are resolved before any network traffic, so a token
/// without a service account subject fails fast.
pub async fn generate_kubeconfig<P, F>(
    settings: &Settings,
    prober: &EndpointProber<P>,
    observer: F,
    cancel: &CancellationToken,
) -> Result<GeneratedKubeconfig>
where
    P: Probe,
    F: FnMut(&ProbeProgress),
{
    let token = incluster::read_token(&settings.token_path)?;
    let claims = DecodedClaims::decode(&token)?;
    let identity = extract_subject_info(&claims.payload)?;
    let ca_cert_base64 = incluster::read_ca_base64(&settings.ca_cert_path)?;
    let location = extract_issuer_info(&claims.payload)?;

    let endpoint = prober.discover_with(&location, observer, cancel).await?;

    let data = KubeconfigData {
        service_account: identity.service_account.to_string(),
        namespace: identity.namespace.to_string(),
        token: claims.raw,
        ca_cert_base64,
        server: endpoint.url.clone(),
        cluster_name: kubeconfig::cluster_name_from_server(&endpoint.url),
    };

    let path = kubeconfig::kubeconfig_path(&settings.output_dir, &identity);
    kubeconfig::write_kubeconfig(&path, &Kubeconfig::from(&data))?;
    info!(path = %path.display(), "Kubeconfig written");

    Ok(GeneratedKubeconfig {
        path,
        identity,
        location,
        endpoint,
    })
}
