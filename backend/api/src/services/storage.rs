/// Upload pass-through to S3-compatible object storage.
use aws_sdk_s3::config::{Credentials, Region};
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use uuid::Uuid;

use crate::config::StorageConfig;
use crate::error::{AppError, Result};

// Key prefixes per asset class
pub const SONG_AUDIO_PREFIX: &str = "songs/audio";
pub const SONG_COVER_PREFIX: &str = "songs/covers";
pub const ALBUM_COVER_PREFIX: &str = "albums/covers";
pub const PLAYLIST_COVER_PREFIX: &str = "playlists/covers";
pub const AVATAR_PREFIX: &str = "avatars";
pub const ARTIST_AVATAR_PREFIX: &str = "artists/avatars";
pub const ARTIST_COVER_PREFIX: &str = "artists/covers";
pub const VERIFICATION_PREFIX: &str = "verification";

#[derive(Clone)]
pub struct StorageService {
    client: Client,
    bucket: String,
    public_base_url: String,
}

impl StorageService {
    /// Build the S3 client from configuration; custom endpoints cover
    /// S3-compatible providers.
    pub async fn from_config(config: &StorageConfig) -> Self {
        let credentials = Credentials::new(
            &config.access_key_id,
            &config.secret_access_key,
            None,
            None,
            "vibesync-api",
        );

        let shared_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(Region::new(config.region.clone()))
            .credentials_provider(credentials)
            .load()
            .await;

        let mut builder = aws_sdk_s3::config::Builder::from(&shared_config);
        if let Some(endpoint) = &config.endpoint {
            if !endpoint.trim().is_empty() {
                builder = builder.endpoint_url(endpoint);
            }
        }

        Self {
            client: Client::from_conf(builder.build()),
            bucket: config.bucket_name.clone(),
            public_base_url: config.public_base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Store bytes under the given prefix and return the public URL.
    pub async fn upload(
        &self,
        prefix: &str,
        filename: &str,
        content_type: &str,
        data: Vec<u8>,
    ) -> Result<String> {
        let key = object_key(prefix, filename);

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(&key)
            .content_type(content_type)
            .body(ByteStream::from(data))
            .send()
            .await
            .map_err(|e| AppError::Storage(format!("Upload failed: {}", e)))?;

        tracing::debug!(key = %key, "stored object");

        Ok(format!("{}/{}", self.public_base_url, key))
    }
}

/// Random object key preserving the original extension.
fn object_key(prefix: &str, filename: &str) -> String {
    let ext = std::path::Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .filter(|e| e.chars().all(|c| c.is_ascii_alphanumeric()))
        .unwrap_or("bin");

    format!("{}/{}.{}", prefix.trim_matches('/'), Uuid::new_v4(), ext)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_keeps_extension() {
        let key = object_key(SONG_AUDIO_PREFIX, "track.mp3");
        assert!(key.starts_with("songs/audio/"));
        assert!(key.ends_with(".mp3"));
    }

    #[test]
    fn hostile_extension_falls_back() {
        let key = object_key("avatars", "x.%2e%2e");
        assert!(key.ends_with(".bin"));

        let no_ext = object_key("avatars", "avatar");
        assert!(no_ext.ends_with(".bin"));
    }
}
