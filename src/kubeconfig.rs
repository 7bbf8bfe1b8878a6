//! Kubeconfig rendering for a discovered cluster
//!
//! Only the subset of the kubeconfig schema needed to talk to one cluster with
//! a bearer token is modelled.

use std::fs;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;

use serde::Deserialize;
use serde::Serialize;

use crate::error::write_file_error;
use crate::error::Result;
use crate::extractor::KubernetesIdentity;

const FALLBACK_CLUSTER_NAME: &str = "eks-cluster";

/// Everything needed to render a kubeconfig for one service account
#[derive(Debug, Clone)]
pub struct KubeconfigData {
    pub service_account: String,
    pub namespace: String,
    pub token: String,
    /// Base64 of the PEM bundle, as stored in `certificate-authority-data`
    pub ca_cert_base64: String,
    pub server: String,
    pub cluster_name: String,
}

/// Client configuration document, serialized as YAML
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Kubeconfig {
    #[serde(rename = "apiVersion")]
    pub api_version: String,
    pub kind: String,
    pub clusters: Vec<NamedCluster>,
    pub contexts: Vec<NamedContext>,
    #[serde(rename = "current-context")]
    pub current_context: String,
    pub users: Vec<NamedAuthInfo>,
}

/// NamedCluster associates name with cluster.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct NamedCluster {
    pub name: String,
    pub cluster: Cluster,
}

/// Cluster stores information to connect Kubernetes cluster.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Cluster {
    pub server: String,
    #[serde(rename = "certificate-authority-data")]
    pub certificate_authority_data: String,
}

/// NamedContext associates name with context.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct NamedContext {
    pub name: String,
    pub context: Context,
}

/// Context binds a cluster, a user and a default namespace.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Context {
    pub cluster: String,
    pub user: String,
    pub namespace: String,
}

/// NamedAuthInfo associates name with authentication.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct NamedAuthInfo {
    pub name: String,
    pub user: AuthInfo,
}

/// AuthInfo holds the bearer token of the user.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct AuthInfo {
    pub token: String,
}

impl From<&KubeconfigData> for Kubeconfig {
    fn from(data: &KubeconfigData) -> Self {
        let context_name = format!("{}-context", data.service_account);

        Self {
            api_version: "v1".to_string(),
            kind: "Config".to_string(),
            clusters: vec![NamedCluster {
                name: data.cluster_name.clone(),
                cluster: Cluster {
                    server: data.server.clone(),
                    certificate_authority_data: data.ca_cert_base64.clone(),
                },
            }],
            contexts: vec![NamedContext {
                name: context_name.clone(),
                context: Context {
                    cluster: data.cluster_name.clone(),
                    user: data.service_account.clone(),
                    namespace: data.namespace.clone(),
                },
            }],
            current_context: context_name,
            users: vec![NamedAuthInfo {
                name: data.service_account.clone(),
                user: AuthInfo {
                    token: data.token.clone(),
                },
            }],
        }
    }
}

impl Kubeconfig {
    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }
}

/// Cluster name taken from the first DNS label of the server URL
///
/// `https://ABC123.gr7.us-west-2.eks.amazonaws.com` gives `ABC123`.
pub fn cluster_name_from_server(server: &str) -> String {
    let host = server
        .strip_prefix("https://")
        .or_else(|| server.strip_prefix("http://"))
        .unwrap_or(server);

    match host.split(['.', '/', ':']).next() {
        Some(label) if !label.is_empty() => label.to_string(),
        _ => FALLBACK_CLUSTER_NAME.to_string(),
    }
}

/// Path of the kubeconfig written for `identity` inside `dir`
pub fn kubeconfig_path(dir: impl AsRef<Path>, identity: &KubernetesIdentity) -> PathBuf {
    dir.as_ref().join(format!(
        "{}-{}-kubeconfig.yaml",
        identity.service_account, identity.namespace
    ))
}

/// Write `config` to `path`, readable and writable by the owner only
pub fn write_kubeconfig(path: impl AsRef<Path>, config: &Kubeconfig) -> Result<()> {
    let path = path.as_ref();
    let yaml = config.to_yaml()?;

    let mut file = owner_only_options()
        .open(path)
        .map_err(write_file_error(path))?;
    restrict_permissions(&file).map_err(write_file_error(path))?;
    file.write_all(yaml.as_bytes())
        .map_err(write_file_error(path))?;

    Ok(())
}

fn owner_only_options() -> fs::OpenOptions {
    let mut options = fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);

    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }

    options
}

// The creation mode is ignored when the file already exists
#[cfg(unix)]
fn restrict_permissions(file: &fs::File) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    file.set_permissions(fs::Permissions::from_mode(0o600))
}

#[cfg(not(unix))]
fn restrict_permissions(_file: &fs::File) -> std::io::Result<()> {
    Ok(())
}
