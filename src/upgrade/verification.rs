use crate::core::IrisError;
use sha2::{Digest, Sha256};
use tracing::{debug, info};

/// Verifies downloaded artifacts against the digest published with the release.
///
/// Digests have the form `"<algorithm>:<hex>"`. Only SHA-256 is understood;
/// anything else is [`IrisError::UnsupportedDigestFormat`], which is kept
/// distinct from a failed comparison because it signals an incompatible
/// release format rather than a corrupted or tampered download.
///
/// # Security Benefits
///
/// - **Download Integrity**: Detects corrupted or truncated downloads
/// - **Tamper Detection**: Rejects content that differs from what was published
pub struct DigestVerifier;

impl DigestVerifier {
    /// Prefix of the only supported digest algorithm.
    pub const SHA256_PREFIX: &'static str = "sha256:";

    /// Compute the SHA-256 digest of `data` in `"sha256:<lowercase hex>"` form.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use iris_installer::upgrade::DigestVerifier;
    ///
    /// let digest = DigestVerifier::compute_sha256(b"Hello, World!");
    /// assert_eq!(
    ///     digest,
    ///     "sha256:dffd6021bb2bd5b0af676290809ec3a53191dd81c7f70a4b28688a362182986f"
    /// );
    /// ```
    #[must_use]
    pub fn compute_sha256(data: &[u8]) -> String {
        let mut hasher = Sha256::new();
        hasher.update(data);
        format!("{}{}", Self::SHA256_PREFIX, hex::encode(hasher.finalize()))
    }

    /// Check `data` against `digest`.
    ///
    /// # Returns
    ///
    /// - `Ok(true)` if the lowercase hex of the SHA-256 of `data` equals the
    ///   digest's hex portion exactly (the comparison is case-sensitive)
    /// - `Ok(false)` if it differs
    /// - `Err(IrisError::UnsupportedDigestFormat)` if `digest` does not start
    ///   with `sha256:`
    pub fn verify(data: &[u8], digest: &str) -> Result<bool, IrisError> {
        let Some(expected_hex) = digest.strip_prefix(Self::SHA256_PREFIX) else {
            return Err(IrisError::UnsupportedDigestFormat {
                digest: digest.to_string(),
            });
        };

        let mut hasher = Sha256::new();
        hasher.update(data);
        let actual_hex = hex::encode(hasher.finalize());

        debug!("Comparing sha256 {} against published {}", actual_hex, expected_hex);
        Ok(actual_hex == expected_hex)
    }

    /// Like [`verify`](Self::verify), but a mismatch is an
    /// [`IrisError::DigestMismatch`] carrying both digests.
    pub fn ensure_matches(data: &[u8], digest: &str) -> Result<(), IrisError> {
        if Self::verify(data, digest)? {
            info!("Digest verification successful");
            Ok(())
        } else {
            Err(IrisError::DigestMismatch {
                expected: digest.to_string(),
                actual: Self::compute_sha256(data),
            })
        }
    }
}
