//! SSH keypair bootstrap.
//!
//! On first start an Ed25519 keypair is generated in the key directory.
//! Every start logs the public half so an operator can add it to the
//! remote `authorized_keys`.

use std::fs;
use std::path::{Path, PathBuf};

use ssh_key::{Algorithm, LineEnding, PrivateKey, PublicKey};

use crate::error::KeyError;
use crate::Result;

/// File name of the private key inside the key directory.
pub const PRIVATE_KEY_NAME: &str = "id_ed25519";

/// File name of the public key inside the key directory.
pub const PUBLIC_KEY_NAME: &str = "id_ed25519.pub";

/// Comment attached to generated public keys.
pub const KEY_COMMENT: &str = "downloader-uploader";

/// Locations of the keypair on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyPaths {
    pub private: PathBuf,
    pub public: PathBuf,
}

impl KeyPaths {
    /// Paths of the keypair inside `key_dir`.
    #[must_use]
    pub fn in_dir(key_dir: &Path) -> Self {
        Self {
            private: key_dir.join(PRIVATE_KEY_NAME),
            public: key_dir.join(PUBLIC_KEY_NAME),
        }
    }
}

/// Make sure a keypair exists in `key_dir`, generating one if needed, and
/// log the public key.
///
/// # Errors
///
/// Returns an error if the directory cannot be created or the key cannot
/// be generated or written.
pub fn ensure_keypair(key_dir: &Path) -> Result<KeyPaths> {
    fs::create_dir_all(key_dir)?;
    let paths = KeyPaths::in_dir(key_dir);

    if paths.private.exists() {
        tracing::info!("Using existing keypair: {}", paths.private.display());
    } else {
        tracing::info!("Generating new Ed25519 SSH keypair...");
        generate_keypair(&paths)?;
        tracing::info!("Keypair generated: {}", paths.private.display());
    }

    if let Some(public) = read_public_key(&paths.public)? {
        let rule = "=".repeat(60);
        tracing::info!("{rule}");
        tracing::info!("SFTP PUBLIC KEY (add to remote authorized_keys):");
        tracing::info!("{public}");
        tracing::info!("{rule}");
    }

    Ok(paths)
}

fn generate_keypair(paths: &KeyPaths) -> Result<()> {
    let private = PrivateKey::random(&mut rand::rngs::OsRng, Algorithm::Ed25519)
        .map_err(|e| KeyError::Generate(e.to_string()))?;

    let private_pem = private
        .to_openssh(LineEnding::LF)
        .map_err(|e| encode_error(&paths.private, &e))?;
    write_private(&paths.private, private_pem.as_bytes())?;

    let public = PublicKey::new(private.public_key().key_data().clone(), KEY_COMMENT);
    let public_line = public
        .to_openssh()
        .map_err(|e| encode_error(&paths.public, &e))?;
    fs::write(&paths.public, format!("{public_line}\n"))?;
    set_mode(&paths.public, 0o644)?;

    Ok(())
}

/// Read the public key line, if the file exists.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read.
pub fn read_public_key(path: &Path) -> Result<Option<String>> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)?;
    Ok(Some(content.trim().to_string()))
}

fn encode_error(path: &Path, err: &ssh_key::Error) -> KeyError {
    KeyError::Encode {
        path: path.display().to_string(),
        reason: err.to_string(),
    }
}

/// Create the private key file, readable by the owner only from the start.
#[cfg(unix)]
fn write_private(path: &Path, contents: &[u8]) -> Result<()> {
    use std::io::Write;
    use std::os::unix::fs::OpenOptionsExt;

    let mut file = fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .mode(0o600)
        .open(path)?;
    file.write_all(contents)?;
    Ok(())
}

#[cfg(not(unix))]
fn write_private(path: &Path, contents: &[u8]) -> Result<()> {
    fs::write(path, contents)?;
    Ok(())
}

#[cfg(unix)]
fn set_mode(path: &Path, mode: u32) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(mode))?;
    Ok(())
}

#[cfg(not(unix))]
fn set_mode(_path: &Path, _mode: u32) -> Result<()> {
    Ok(())
}
