//! Service account credentials mounted into every pod

use std::fs;
use std::path::Path;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use crate::error::read_file_error;
use crate::error::Error;
use crate::error::Result;

// Mounted credential files
pub const SERVICE_TOKENFILE: &str = "/var/run/secrets/kubernetes.io/serviceaccount/token";
pub const SERVICE_CERTFILE: &str = "/var/run/secrets/kubernetes.io/serviceaccount/ca.crt";

/// Read a bearer token, trimming surrounding whitespace
pub fn read_token(path: impl AsRef<Path>) -> Result<String> {
    let token = read_trimmed(path.as_ref())?;
    if token.is_empty() {
        return Err(Error::EmptyToken);
    }
    Ok(token)
}

/// Read a PEM bundle and base64-encode it for `certificate-authority-data`
pub fn read_ca_base64(path: impl AsRef<Path>) -> Result<String> {
    let pem = read_trimmed(path.as_ref())?;
    Ok(STANDARD.encode(pem))
}

fn read_trimmed(path: &Path) -> Result<String> {
    let data = fs::read_to_string(path).map_err(read_file_error(path))?;
    Ok(data.trim().to_string())
}
