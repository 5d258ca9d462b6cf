//! Local image storage with time-limited, HMAC-signed retrieval URLs.

use chrono::{DateTime, Duration, Utc};
use hmac::{Hmac, Mac};
use serde::Serialize;
use sha2::Sha256;
use std::path::PathBuf;
use uuid::Uuid;

use crate::config::Config;
use crate::error::AppError;

type HmacSha256 = Hmac<Sha256>;

const ALLOWED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png"];

#[derive(Debug, thiserror::Error)]
pub enum ImageError {
    #[error("Unsupported image type: {0} (expected jpg, jpeg or png)")]
    UnsupportedType(String),

    #[error("Image is empty")]
    Empty,

    #[error("Invalid image reference")]
    InvalidReference,

    #[error("Image not found")]
    NotFound,

    #[error("Image signing key rejected")]
    Signing,

    #[error("Image storage I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<ImageError> for AppError {
    fn from(err: ImageError) -> Self {
        match err {
            ImageError::UnsupportedType(_) | ImageError::Empty | ImageError::InvalidReference => {
                AppError::Validation(err.to_string())
            }
            ImageError::NotFound => AppError::NotFound(err.to_string()),
            ImageError::Signing | ImageError::Io(_) => AppError::Internal(err.into()),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SignedUrl {
    pub url: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct ImageStore {
    root: PathBuf,
    secret: String,
    url_ttl_secs: i64,
    public_base_url: String,
}

impl ImageStore {
    pub fn new(
        root: impl Into<PathBuf>,
        secret: impl Into<String>,
        url_ttl_secs: i64,
        public_base_url: impl Into<String>,
    ) -> Self {
        Self {
            root: root.into(),
            secret: secret.into(),
            url_ttl_secs,
            public_base_url: public_base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.image_dir.clone(),
            config.image_signing_secret.clone(),
            config.image_url_ttl_secs,
            config.public_base_url.clone(),
        )
    }

    /// Stores the bytes under a fresh `<uuid>.<ext>` reference.
    pub async fn save(&self, bytes: &[u8], original_name: &str) -> Result<String, ImageError> {
        if bytes.is_empty() {
            return Err(ImageError::Empty);
        }
        let ext = original_name
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .filter(|ext| ALLOWED_EXTENSIONS.contains(&ext.as_str()))
            .ok_or_else(|| ImageError::UnsupportedType(original_name.to_string()))?;

        let reference = format!("{}.{}", Uuid::new_v4(), ext);
        tokio::fs::create_dir_all(&self.root).await?;
        tokio::fs::write(self.root.join(&reference), bytes).await?;

        tracing::info!(reference = %reference, size = bytes.len(), "Image stored");
        Ok(reference)
    }

    pub async fn load(&self, reference: &str) -> Result<Vec<u8>, ImageError> {
        validate_reference(reference)?;
        match tokio::fs::read(self.root.join(reference)).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(ImageError::NotFound),
            Err(e) => Err(e.into()),
        }
    }

    pub fn signed_url(&self, reference: &str, now: DateTime<Utc>) -> Result<SignedUrl, ImageError> {
        validate_reference(reference)?;
        let expires_at = now + Duration::seconds(self.url_ttl_secs);
        let expires = expires_at.timestamp();
        let signature = self.signature(reference, expires)?;

        Ok(SignedUrl {
            url: format!(
                "{}/images/{}?expires={}&signature={}",
                self.public_base_url, reference, expires, signature
            ),
            expires_at,
        })
    }

    /// Rejects malformed references, expired links and bad signatures.
    pub fn verify(&self, reference: &str, expires: i64, signature: &str, now: DateTime<Utc>) -> bool {
        if validate_reference(reference).is_err() || now.timestamp() > expires {
            return false;
        }
        let Ok(expected) = hex::decode(signature) else {
            return false;
        };
        match self.mac(reference, expires) {
            Ok(mac) => mac.verify_slice(&expected).is_ok(),
            Err(_) => false,
        }
    }

    fn signature(&self, reference: &str, expires: i64) -> Result<String, ImageError> {
        Ok(hex::encode(self.mac(reference, expires)?.finalize().into_bytes()))
    }

    fn mac(&self, reference: &str, expires: i64) -> Result<HmacSha256, ImageError> {
        let mut mac =
            HmacSha256::new_from_slice(self.secret.as_bytes()).map_err(|_| ImageError::Signing)?;
        mac.update(b"image-url:");
        mac.update(reference.as_bytes());
        mac.update(b":");
        mac.update(expires.to_string().as_bytes());
        Ok(mac)
    }
}

/// References are exactly `<uuid>.<allowed ext>`, which keeps them inside the
/// storage root.
pub fn validate_reference(reference: &str) -> Result<(), ImageError> {
    let (stem, ext) = reference
        .split_once('.')
        .ok_or(ImageError::InvalidReference)?;
    if Uuid::parse_str(stem).is_err() || !ALLOWED_EXTENSIONS.contains(&ext) {
        return Err(ImageError::InvalidReference);
    }
    Ok(())
}

pub fn content_type(reference: &str) -> &'static str {
    if reference.ends_with(".png") {
        "image/png"
    } else {
        "image/jpeg"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store(dir: &TempDir) -> ImageStore {
        ImageStore::new(dir.path(), "test-secret", 600, "http://journal.test/")
    }

    #[tokio::test]
    async fn test_save_and_load() {
        let dir = TempDir::new().unwrap();
        let images = store(&dir);

        let reference = images.save(b"\x89PNG fake", "Sunset.PNG").await.unwrap();
        assert!(reference.ends_with(".png"));
        assert!(validate_reference(&reference).is_ok());
        assert_eq!(images.load(&reference).await.unwrap(), b"\x89PNG fake");
        assert_eq!(content_type(&reference), "image/png");
    }

    #[tokio::test]
    async fn test_save_rejects_bad_input() {
        let dir = TempDir::new().unwrap();
        let images = store(&dir);

        assert!(matches!(
            images.save(b"GIF89a", "anim.gif").await,
            Err(ImageError::UnsupportedType(_))
        ));
        assert!(matches!(
            images.save(b"data", "no_extension").await,
            Err(ImageError::UnsupportedType(_))
        ));
        assert!(matches!(images.save(b"", "a.jpg").await, Err(ImageError::Empty)));
    }

    #[tokio::test]
    async fn test_load_missing_and_traversal() {
        let dir = TempDir::new().unwrap();
        let images = store(&dir);

        let missing = format!("{}.jpg", Uuid::new_v4());
        assert!(matches!(images.load(&missing).await, Err(ImageError::NotFound)));
        assert!(matches!(
            images.load("../etc/passwd").await,
            Err(ImageError::InvalidReference)
        ));
    }

    #[test]
    fn test_signed_url_round_trip() {
        let dir = TempDir::new().unwrap();
        let images = store(&dir);
        let reference = format!("{}.jpg", Uuid::new_v4());
        let now = Utc::now();

        let signed = images.signed_url(&reference, now).unwrap();
        assert!(signed
            .url
            .starts_with(&format!("http://journal.test/images/{reference}?expires=")));
        assert_eq!(signed.expires_at, now + Duration::seconds(600));

        let signature = signed.url.rsplit_once("signature=").unwrap().1;
        let expires = signed.expires_at.timestamp();
        assert!(images.verify(&reference, expires, signature, now));

        // expired
        let later = now + Duration::seconds(601);
        assert!(!images.verify(&reference, expires, signature, later));
        // tampered expiry
        assert!(!images.verify(&reference, expires + 3600, signature, now));
        // other image
        let other = format!("{}.jpg", Uuid::new_v4());
        assert!(!images.verify(&other, expires, signature, now));
        // garbage signature
        assert!(!images.verify(&reference, expires, "zz", now));
    }

    #[test]
    fn test_signature_depends_on_secret() {
        let dir = TempDir::new().unwrap();
        let reference = format!("{}.png", Uuid::new_v4());
        let now = Utc::now();

        let signed = store(&dir).signed_url(&reference, now).unwrap();
        let signature = signed.url.rsplit_once("signature=").unwrap().1;

        let other = ImageStore::new(dir.path(), "another-secret", 600, "http://journal.test");
        assert!(!other.verify(&reference, signed.expires_at.timestamp(), signature, now));
    }

    #[test]
    fn test_links_survive_jwt_secret_rotation() {
        let dir = TempDir::new().unwrap();
        let reference = format!("{}.png", Uuid::new_v4());
        let now = Utc::now();

        let config = Config::for_tests(dir.path().to_path_buf());
        let signed = ImageStore::from_config(&config).signed_url(&reference, now).unwrap();
        let signature = signed.url.rsplit_once("signature=").unwrap().1;

        let mut rotated = config.clone();
        rotated.jwt_secret = "rotated-jwt-secret".into();
        let images = ImageStore::from_config(&rotated);
        assert!(images.verify(&reference, signed.expires_at.timestamp(), signature, now));

        let mut rekeyed = config;
        rekeyed.image_signing_secret = "new-image-secret".into();
        let images = ImageStore::from_config(&rekeyed);
        assert!(!images.verify(&reference, signed.expires_at.timestamp(), signature, now));
    }
}
