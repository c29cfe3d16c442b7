use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;

use sha2::{Digest, Sha256};

use crate::domain::errors::DomainError;
use crate::domain::ports::{BillImageStore, StoredImage};

/// Path the stored images are served under, relative to the public base URL.
pub const IMAGE_ROUTE: &str = "/bills/images";

/// Keeps bill images on local disk, named by the SHA-256 of their content,
/// so uploading the same bill twice yields the same URL.
#[derive(Debug, Clone)]
pub struct LocalBillImageStore {
    dir: PathBuf,
    public_base_url: String,
}

impl LocalBillImageStore {
    pub fn new(dir: impl Into<PathBuf>, public_base_url: &str) -> Self {
        Self {
            dir: dir.into(),
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
        }
    }

    fn url_for(&self, name: &str) -> String {
        format!("{}{IMAGE_ROUTE}/{name}", self.public_base_url)
    }
}

/// Accepts only names this store hands out: `<hex>.<png|jpg>`.
fn is_stored_name(name: &str) -> bool {
    match name.split_once('.') {
        Some((stem, ext)) => {
            !stem.is_empty()
                && stem.chars().all(|c| c.is_ascii_hexdigit())
                && matches!(ext, "png" | "jpg")
        }
        None => false,
    }
}

impl BillImageStore for LocalBillImageStore {
    fn put(&self, bytes: &[u8], extension: &str) -> Result<StoredImage, DomainError> {
        let name = format!("{}.{extension}", hex::encode(Sha256::digest(bytes)));
        if !is_stored_name(&name) {
            return Err(DomainError::invalid(format!(
                "unsupported image extension '{extension}'"
            )));
        }

        fs::create_dir_all(&self.dir)
            .map_err(|e| DomainError::Internal(format!("creating bill directory: {e}")))?;
        let path = self.dir.join(&name);
        if !path.exists() {
            fs::write(&path, bytes)
                .map_err(|e| DomainError::Internal(format!("writing {}: {e}", path.display())))?;
        }

        Ok(StoredImage {
            url: self.url_for(&name),
            name,
        })
    }

    fn get(&self, name: &str) -> Result<Option<Vec<u8>>, DomainError> {
        if !is_stored_name(name) {
            return Ok(None);
        }
        match fs::read(self.dir.join(name)) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(DomainError::Internal(format!("reading {name}: {e}"))),
        }
    }
}
