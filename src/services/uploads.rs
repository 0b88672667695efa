//! File storage for patient documents
//!
//! Files are stored flat in the configured directory, named after their owner
//! and the hex SHA-256 of their content, and referenced as `/uploads/<name>`
//! from the database.

use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};

use crate::{
    config::UploadsConfig,
    error::{AppError, AppResult},
};

/// URL prefix under which stored files are served
pub const PUBLIC_PREFIX: &str = "/uploads/";

#[derive(Clone)]
pub struct UploadsService {
    config: UploadsConfig,
}

/// Name a stored file after its owner and content, keeping the original extension
pub fn stored_name(owner: &str, original_name: &str, content: &[u8]) -> String {
    let digest = hex::encode(Sha256::digest(content));
    match original_name.rsplit_once('.') {
        Some((_, ext)) => format!("{}-{}.{}", owner, digest, ext.to_ascii_lowercase()),
        None => format!("{}-{}", owner, digest),
    }
}

/// File name referenced by a public path, rejecting anything that could
/// escape the uploads directory
pub fn file_name_from_path(path: &str) -> AppResult<&str> {
    let name = path.strip_prefix(PUBLIC_PREFIX).unwrap_or(path);
    let valid = !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains(|c: char| c == '/' || c == '\\')
        && !name.contains("..");
    if valid {
        Ok(name)
    } else {
        Err(AppError::BadRequest(format!("Invalid file path: {}", path)))
    }
}

impl UploadsService {
    pub fn new(config: UploadsConfig) -> Self {
        Self { config }
    }

    pub fn directory(&self) -> &Path {
        Path::new(&self.config.directory)
    }

    fn full_path(&self, name: &str) -> PathBuf {
        self.directory().join(name)
    }

    /// Check and write an uploaded file; returns its public path
    pub async fn store(&self, owner: &str, original_name: &str, content: &[u8]) -> AppResult<String> {
        if content.is_empty() {
            return Err(AppError::Validation("Uploaded file is empty".to_string()));
        }
        if content.len() > self.config.max_file_size {
            return Err(AppError::Validation(format!(
                "File exceeds the maximum size of {} bytes",
                self.config.max_file_size
            )));
        }
        if !self.config.is_allowed(original_name) {
            return Err(AppError::Validation(format!(
                "File type not allowed; accepted: {}",
                self.config.allowed_extensions.join(", ")
            )));
        }

        let name = stored_name(owner, original_name, content);
        tokio::fs::create_dir_all(self.directory())
            .await
            .map_err(|e| AppError::Internal(format!("Cannot create uploads directory: {}", e)))?;
        tokio::fs::write(self.full_path(&name), content)
            .await
            .map_err(|e| AppError::Internal(format!("Cannot write uploaded file: {}", e)))?;

        tracing::debug!(file = %name, size = content.len(), "Stored upload");
        Ok(format!("{}{}", PUBLIC_PREFIX, name))
    }

    /// Remove a stored file; a file already gone is not an error
    pub async fn remove(&self, path: &str) -> AppResult<()> {
        let name = file_name_from_path(path)?;
        match tokio::fs::remove_file(self.full_path(name)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::warn!(file = %name, "Upload already removed from disk");
                Ok(())
            }
            Err(e) => Err(AppError::Internal(format!("Cannot remove file {}: {}", name, e))),
        }
    }

    /// Remove several files, logging failures instead of returning them
    pub async fn remove_all(&self, paths: &[String]) {
        for path in paths {
            if let Err(e) = self.remove(path).await {
                tracing::warn!(file = %path, error = %e, "Failed to remove upload");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stored_name_is_content_addressed() {
        let a = stored_name("patient-3", "Ordonnance.PDF", b"same bytes");
        let b = stored_name("patient-3", "autre.pdf", b"same bytes");
        assert_eq!(a, b);
        assert!(a.starts_with("patient-3-"));
        assert!(a.ends_with(".pdf"));
        assert_ne!(a, stored_name("patient-3", "x.pdf", b"other bytes"));
        assert_ne!(a, stored_name("patient-4", "autre.pdf", b"same bytes"));
    }

    #[test]
    fn test_path_traversal_is_rejected() {
        assert_eq!(file_name_from_path("/uploads/abc.pdf").unwrap(), "abc.pdf");
        assert_eq!(file_name_from_path("abc.pdf").unwrap(), "abc.pdf");
        assert!(file_name_from_path("/uploads/../config/default.toml").is_err());
        assert!(file_name_from_path("/uploads/sub/abc.pdf").is_err());
        assert!(file_name_from_path("..").is_err());
        assert!(file_name_from_path("/uploads/").is_err());
    }

    #[tokio::test]
    async fn test_store_checks_size_and_extension() {
        let dir = std::env::temp_dir().join(format!("creative-uploads-{}", uuid::Uuid::new_v4()));
        let service = UploadsService::new(UploadsConfig {
            directory: dir.to_string_lossy().into_owned(),
            max_file_size: 16,
            allowed_extensions: vec!["pdf".to_string()],
        });

        assert!(service.store("p1", "a.exe", b"MZ").await.is_err());
        assert!(service.store("p1", "a.pdf", &[0u8; 32]).await.is_err());
        assert!(service.store("p1", "a.pdf", b"").await.is_err());

        let path = service.store("p1", "a.pdf", b"%PDF-1.4").await.unwrap();
        assert!(path.starts_with(PUBLIC_PREFIX));
        let name = file_name_from_path(&path).unwrap();
        assert!(dir.join(name).exists());

        service.remove(&path).await.unwrap();
        assert!(!dir.join(name).exists());
        // Second removal is a no-op
        service.remove(&path).await.unwrap();

        let _ = std::fs::remove_dir_all(&dir);
    }
}
