use std::path::PathBuf;

use thiserror::Error;

use crate::claims::Segment;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid JWT structure: expected at least a header and a payload segment")]
    MalformedToken,
    #[error("Failed to base64url-decode the {segment} segment: {source}")]
    Encoding {
        segment: Segment,
        #[source]
        source: base64::DecodeError,
    },
    #[error("The {segment} segment is not a JSON object: {source}")]
    Schema {
        segment: Segment,
        #[source]
        source: serde_json::Error,
    },
    #[error("Claim '{0}' not found in the JWT payload or not a string")]
    ClaimMissing(&'static str),
    #[error("Issuer does not look like an EKS OIDC issuer: {0}")]
    InvalidIssuerFormat(String),
    #[error("Subject is not a service account subject: {0}")]
    InvalidSubjectFormat(String),
    #[error("No EKS endpoint answered for cluster {cluster_id} in {region} after {attempts} probes")]
    NotFound {
        cluster_id: String,
        region: String,
        attempts: usize,
    },
    #[error("Endpoint discovery cancelled after {attempts} probes")]
    Cancelled { attempts: usize },
    #[error("Token file is empty")]
    EmptyToken,
    #[error("Failed to read {}: {source}", .path.display())]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to write kubeconfig file {}: {source}", .path.display())]
    WriteFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to serialize kubeconfig: {0}")]
    Serialize(#[from] serde_yaml::Error),
    #[error("Failed to build the probing HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),
}

pub(crate) fn read_file_error(path: impl Into<PathBuf>) -> impl FnOnce(std::io::Error) -> Error {
    let path = path.into();
    move |source| Error::ReadFile { path, source }
}

pub(crate) fn write_file_error(path: impl Into<PathBuf>) -> impl FnOnce(std::io::Error) -> Error {
    let path = path.into();
    move |source| Error::WriteFile { path, source }
}
