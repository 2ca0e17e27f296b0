//! Image Saving
//!
//! A terminal can't show the generated picture, so inline image results are
//! written to disk and the transcript shows where.

use std::path::PathBuf;

use anyhow::Context;

use artbot_core::ImagePayload;

/// Writes inline image payloads as `artbot-<n>.<ext>`
#[derive(Debug)]
pub struct ImageSaver {
    dir: PathBuf,
    next: u32,
}

impl ImageSaver {
    /// Save into `dir` (created on first save)
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            next: 1,
        }
    }

    /// Write `payload` if it carries bytes.
    ///
    /// Returns the written path, or `None` for references.
    pub async fn save(&mut self, payload: &ImagePayload) -> anyhow::Result<Option<PathBuf>> {
        let ImagePayload::Inline { data, .. } = payload else {
            return Ok(None);
        };

        tokio::fs::create_dir_all(&self.dir)
            .await
            .with_context(|| format!("creating {}", self.dir.display()))?;

        let path = loop {
            let candidate = self
                .dir
                .join(format!("artbot-{}.{}", self.next, payload.extension()));
            self.next += 1;
            if !tokio::fs::try_exists(&candidate).await.unwrap_or(false) {
                break candidate;
            }
        };

        tokio::fs::write(&path, data)
            .await
            .with_context(|| format!("writing {}", path.display()))?;
        tracing::info!(path = %path.display(), bytes = data.len(), "Saved generated image");
        Ok(Some(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn png(bytes: &[u8]) -> ImagePayload {
        ImagePayload::Inline {
            mime_type: "image/png".to_string(),
            data: bytes.to_vec(),
        }
    }

    #[tokio::test]
    async fn test_save_inline_payload() {
        let dir = tempfile::tempdir().unwrap();
        let mut saver = ImageSaver::new(dir.path().join("images"));

        let path = saver.save(&png(&[1, 2, 3])).await.unwrap().unwrap();

        assert_eq!(path, dir.path().join("images").join("artbot-1.png"));
        assert_eq!(std::fs::read(&path).unwrap(), vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_save_skips_existing_names() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("artbot-1.png"), b"old").unwrap();
        let mut saver = ImageSaver::new(dir.path());

        let path = saver.save(&png(&[9])).await.unwrap().unwrap();
        assert_eq!(path, dir.path().join("artbot-2.png"));
        assert_eq!(std::fs::read(dir.path().join("artbot-1.png")).unwrap(), b"old");
    }

    #[tokio::test]
    async fn test_reference_is_not_saved() {
        let dir = tempfile::tempdir().unwrap();
        let mut saver = ImageSaver::new(dir.path());

        let saved = saver
            .save(&ImagePayload::Reference("https://example.com/a.png".to_string()))
            .await
            .unwrap();
        assert!(saved.is_none());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }
}
