//! # GPG Keyring
//!
//! Imports the Passbolt user's private key into a private, temporary `GNUPGHOME` and
//! decrypts messages with the `gpg` binary.

use super::VaultError;
use async_trait::async_trait;
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};
use zeroize::Zeroizing;

/// Crypto the GPGAuth handshake and secret retrieval need
#[async_trait]
pub trait MessageCrypto: Send + Sync {
    /// Fingerprint of the user key, sent as `keyid` during login
    fn fingerprint(&self) -> &str;

    /// Decrypt an ASCII-armored message
    async fn decrypt(&self, armored: &str) -> Result<Zeroizing<String>, VaultError>;
}

/// Temporary keyring holding one private key
///
/// The home directory is removed when the keyring is dropped.
pub struct GpgKeyring {
    gpg: PathBuf,
    home: tempfile::TempDir,
    fingerprint: String,
    passphrase: Zeroizing<String>,
}

impl fmt::Debug for GpgKeyring {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GpgKeyring")
            .field("home", &self.home.path())
            .field("fingerprint", &self.fingerprint)
            .finish_non_exhaustive()
    }
}

impl GpgKeyring {
    /// Import an armored private key
    #[allow(clippy::missing_errors_doc, reason = "gpg missing or key rejected")]
    pub async fn import(private_key: &str, passphrase: Zeroizing<String>) -> Result<Self, VaultError> {
        let gpg = which::which("gpg")
            .map_err(|e| VaultError::Crypto(format!("gpg binary not found: {e}")))?;
        let home = tempfile::Builder::new()
            .prefix("passbolt-gnupg-")
            .tempdir()
            .map_err(|e| VaultError::Crypto(format!("failed to create GNUPGHOME: {e}")))?;
        debug!("Created temporary GPG home: {:?}", home.path());

        let output = run_gpg(
            &gpg,
            home.path(),
            &["--batch", "--yes", "--pinentry-mode", "loopback", "--import"],
            private_key.as_bytes(),
        )
        .await?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            warn!("GPG stderr: {}", stderr);
            return Err(VaultError::Crypto(format!(
                "failed to import private key: {stderr}"
            )));
        }

        let listing = run_gpg(
            &gpg,
            home.path(),
            &["--batch", "--list-secret-keys", "--with-colons", "--fingerprint"],
            &[],
        )
        .await?;
        let fingerprint = parse_fingerprint(&String::from_utf8_lossy(&listing.stdout))
            .ok_or_else(|| VaultError::Crypto("no secret key found after import".to_string()))?;

        info!("Imported Passbolt private key {}", fingerprint);
        Ok(Self {
            gpg,
            home,
            fingerprint,
            passphrase,
        })
    }
}

#[async_trait]
impl MessageCrypto for GpgKeyring {
    fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    async fn decrypt(&self, armored: &str) -> Result<Zeroizing<String>, VaultError> {
        // the passphrase goes through stdin, so the message has to come from a file
        let message = self
            .home
            .path()
            .join(format!("message-{}.asc", uuid::Uuid::new_v4()));
        tokio::fs::write(&message, armored)
            .await
            .map_err(|e| VaultError::Crypto(format!("failed to write message: {e}")))?;

        let message_arg = message.to_string_lossy().into_owned();
        let mut stdin = Zeroizing::new(self.passphrase.as_bytes().to_vec());
        stdin.push(b'\n');
        let output = run_gpg(
            &self.gpg,
            self.home.path(),
            &[
                "--batch",
                "--yes",
                "--quiet",
                "--pinentry-mode",
                "loopback",
                "--passphrase-fd",
                "0",
                "--decrypt",
                message_arg.as_str(),
            ],
            &stdin,
        )
        .await;
        if let Err(e) = tokio::fs::remove_file(&message).await {
            warn!("Failed to remove {:?}: {}", message, e);
        }
        let output = output?;

        if !output.status.success() {
            return Err(VaultError::Crypto(format!(
                "decryption failed: {}",
                String::from_utf8_lossy(&output.stderr)
            )));
        }
        String::from_utf8(output.stdout)
            .map(Zeroizing::new)
            .map_err(|e| VaultError::Crypto(format!("decrypted message is not UTF-8: {e}")))
    }
}

async fn run_gpg(
    gpg: &Path,
    home: &Path,
    args: &[&str],
    input: &[u8],
) -> Result<std::process::Output, VaultError> {
    let mut child = tokio::process::Command::new(gpg)
        .env("GNUPGHOME", home)
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| VaultError::Crypto(format!("failed to spawn gpg: {e}")))?;

    if let Some(mut stdin) = child.stdin.take() {
        stdin
            .write_all(input)
            .await
            .map_err(|e| VaultError::Crypto(format!("failed to write to gpg stdin: {e}")))?;
        stdin
            .shutdown()
            .await
            .map_err(|e| VaultError::Crypto(format!("failed to close gpg stdin: {e}")))?;
    }

    child
        .wait_with_output()
        .await
        .map_err(|e| VaultError::Crypto(format!("failed to wait for gpg: {e}")))
}

/// First `fpr` record of `--with-colons` output (field 10)
fn parse_fingerprint(listing: &str) -> Option<String> {
    listing
        .lines()
        .filter(|line| line.starts_with("fpr:"))
        .find_map(|line| line.split(':').nth(9).filter(|f| !f.is_empty()))
        .map(ToString::to_string)
}
