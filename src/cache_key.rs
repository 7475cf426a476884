//! Cache key generation utilities
//!
//! Credential fingerprints are the only keys of the session cache. They are
//! one-way digests so the persisted table never holds a raw password.

use sha2::{Digest, Sha256};
use shared::types::Credentials;

/// Generate the cache key for a set of portal credentials
pub fn credential_fingerprint(credentials: &Credentials) -> String {
    let mut hasher = Sha256::new();
    hasher.update(
        format!(
            "{}:{}:{}",
            credentials.root_url, credentials.username, credentials.password
        )
        .as_bytes(),
    );
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fingerprint_is_deterministic() {
        let a = Credentials::new("https://www.fieldglass.net", "supplier", "hunter22");
        let b = Credentials::new("https://www.fieldglass.net", "supplier", "hunter22");
        assert_eq!(credential_fingerprint(&a), credential_fingerprint(&b));
        assert_eq!(credential_fingerprint(&a).len(), 64);
    }

    #[test]
    fn fingerprint_differs_per_field() {
        let base = Credentials::new("https://www.fieldglass.net", "supplier", "hunter22");
        let other_url = Credentials::new("https://eu.fieldglass.net", "supplier", "hunter22");
        let other_user = Credentials::new("https://www.fieldglass.net", "supplier2", "hunter22");
        let other_pass = Credentials::new("https://www.fieldglass.net", "supplier", "hunter23");

        let key = credential_fingerprint(&base);
        assert_ne!(key, credential_fingerprint(&other_url));
        assert_ne!(key, credential_fingerprint(&other_user));
        assert_ne!(key, credential_fingerprint(&other_pass));
    }

    #[test]
    fn fingerprint_does_not_contain_the_password() {
        let creds = Credentials::new("https://www.fieldglass.net", "supplier", "hunter22");
        assert!(!credential_fingerprint(&creds).contains("hunter22"));
    }
}
