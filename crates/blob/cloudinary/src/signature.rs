use sha2::{Digest, Sha256};

/// Name sent as `signature_algorithm` alongside every signature.
pub const SIGNATURE_ALGORITHM: &str = "sha256";

/// Sign request parameters: sort by name, join as `k=v` with `&`, append the
/// secret, and hex-encode the SHA-256 digest.
///
/// `file`, `api_key`, `resource_type` and the signature fields themselves are
/// never part of the signed payload; callers pass only signable parameters.
pub fn sign(params: &[(&str, String)], api_secret: &str) -> String {
    let mut sorted: Vec<&(&str, String)> = params.iter().filter(|(_, v)| !v.is_empty()).collect();
    sorted.sort_by(|a, b| a.0.cmp(b.0));

    let payload = sorted
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&");

    let mut hasher = Sha256::new();
    hasher.update(payload.as_bytes());
    hasher.update(api_secret.as_bytes());
    hex::encode(hasher.finalize())
}
