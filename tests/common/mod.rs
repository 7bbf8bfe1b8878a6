#![allow(dead_code)]

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;

use async_trait::async_trait;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use eks_holmes::Probe;
use eks_holmes::ProbeError;
use eks_holmes::Settings;
use eks_holmes::StatusCode;
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use serde::Serialize;
use tempfile::TempDir;

pub const CLUSTER_ID: &str = "ABCDEF1234567890ABCDEF1234567890";
pub const REGION: &str = "us-west-2";
pub const ISSUER: &str =
    "https://oidc.eks.us-west-2.amazonaws.com/id/ABCDEF1234567890ABCDEF1234567890";

const SIGNING_SECRET: &[u8] = b"not-a-real-cluster-signing-key";

/// Create a signed test JWT with custom claims
///
/// Signed with a throwaway HMAC secret; nothing in the crate verifies it.
pub fn create_test_jwt<T: Serialize>(claims: &T) -> String {
    let mut header = Header::new(Algorithm::HS256);
    header.kid = Some("test-key-1".to_string());

    jsonwebtoken::encode(&header, claims, &EncodingKey::from_secret(SIGNING_SECRET))
        .expect("Failed to encode JWT")
}

/// base64url-encode raw bytes as a token segment
pub fn segment(bytes: &[u8]) -> String {
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Build an unsigned token from raw header and payload JSON text
pub fn raw_token(header: &str, payload: &str) -> String {
    format!("{}.{}", segment(header.as_bytes()), segment(payload.as_bytes()))
}

/// Claims of a projected service account token issued by EKS
#[derive(Debug, Serialize)]
pub struct TestClaims {
    pub iss: String,
    pub sub: String,
    pub aud: Vec<String>,
    pub exp: i64,
    pub iat: i64,
}

impl TestClaims {
    /// Valid EKS claims for `default/test-sa`
    pub fn eks() -> Self {
        Self::with(ISSUER, "system:serviceaccount:default:test-sa")
    }

    pub fn with(iss: &str, sub: &str) -> Self {
        let now = chrono::Utc::now().timestamp();
        Self {
            iss: iss.to_string(),
            sub: sub.to_string(),
            aud: vec!["https://kubernetes.default.svc".to_string()],
            exp: now + 3600,
            iat: now,
        }
    }

    /// Claims that expired an hour ago; expiry is never checked
    pub fn expired() -> Self {
        let mut claims = Self::eks();
        claims.exp -= 7200;
        claims.iat -= 7200;
        claims
    }
}

/// Probe stub answering from a script and recording every URL it saw
///
/// URLs without a scripted answer fail like an unbound hostname.
#[derive(Default)]
pub struct ScriptedProbe {
    answers: HashMap<String, u16>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedProbe {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn answer(mut self, url: impl Into<String>, status: u16) -> Self {
        self.answers.insert(url.into(), status);
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Probe for ScriptedProbe {
    async fn probe(&self, url: &str) -> Result<StatusCode, ProbeError> {
        self.calls.lock().unwrap().push(url.to_string());

        match self.answers.get(url) {
            Some(status) => Ok(StatusCode::from_u16(*status).unwrap()),
            None => Err(ProbeError::Other(format!("dns error: {url}"))),
        }
    }
}

/// A fake service account mount holding a token and a CA bundle
pub struct Workspace {
    pub dir: TempDir,
    pub token_path: PathBuf,
    pub ca_cert_path: PathBuf,
}

pub const TEST_CA_PEM: &str = "-----BEGIN CERTIFICATE-----\nMIIBdummy\n-----END CERTIFICATE-----";

impl Workspace {
    pub fn with_token(token: &str) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let token_path = dir.path().join("token");
        let ca_cert_path = dir.path().join("ca.crt");

        std::fs::write(&token_path, format!("{token}\n")).unwrap();
        std::fs::write(&ca_cert_path, format!("{TEST_CA_PEM}\n")).unwrap();

        Self {
            dir,
            token_path,
            ca_cert_path,
        }
    }

    pub fn settings(&self) -> Settings {
        Settings::default()
            .with_token_path(&self.token_path)
            .with_ca_cert_path(&self.ca_cert_path)
            .with_output_dir(self.dir.path())
    }
}
