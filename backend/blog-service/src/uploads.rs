/// Image uploads on the local filesystem
///
/// Files are stored flat in the configured directory as
/// `<unix-millis>-<sanitized original name>` and referenced by posts and
/// profiles as `/uploads/<name>`.
use crate::config::UploadConfig;
use crate::error::{AppError, Result};
use actix_multipart::{Field, Multipart};
use chrono::Utc;
use futures_util::stream::StreamExt;
use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;

/// Most images a single post may carry.
pub const MAX_POST_IMAGES: usize = 5;

/// URL prefix under which stored files are served.
pub const PUBLIC_PREFIX: &str = "/uploads/";

const ALLOWED_EXTENSIONS: &[&str] = &["jpeg", "jpg", "png", "gif"];
const MAX_TEXT_FIELD_BYTES: usize = 64 * 1024;
/// Parts (text and file) accepted in one multipart request.
const MAX_FORM_PARTS: usize = 16;

/// Text fields and stored file references from one multipart request.
#[derive(Debug, Default)]
pub struct UploadForm {
    pub fields: HashMap<String, String>,
    pub files: Vec<String>,
}

impl UploadForm {
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }
}

#[derive(Debug, Clone)]
pub struct UploadStore {
    dir: PathBuf,
    max_file_bytes: usize,
}

impl UploadStore {
    pub fn new(config: &UploadConfig) -> Self {
        Self {
            dir: config.dir.clone(),
            max_file_bytes: config.max_file_bytes,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub async fn ensure_dir(&self) -> Result<()> {
        tokio::fs::create_dir_all(&self.dir).await?;
        Ok(())
    }

    /// Path on disk for a stored file name, or `None` if the name could
    /// escape the upload directory.
    pub fn resolve(&self, name: &str) -> Option<PathBuf> {
        let safe = !name.is_empty()
            && !name.starts_with('.')
            && !name.contains(['/', '\\', '\0'])
            && !name.contains("..");
        safe.then(|| self.dir.join(name))
    }

    /// Read a multipart body. Files in `file_field` are validated and stored;
    /// fields named in `text_fields` are collected as text and any other part
    /// is drained without being kept. Stored files are removed again if the request
    /// turns out to be invalid.
    pub async fn read_form(
        &self,
        mut payload: Multipart,
        text_fields: &[&str],
        file_field: &str,
        max_files: usize,
    ) -> Result<UploadForm> {
        let mut form = UploadForm::default();
        let mut parts = 0;

        while let Some(item) = payload.next().await {
            parts += 1;
            let result = match item {
                Ok(_) if parts > MAX_FORM_PARTS => Err(AppError::Validation(format!(
                    "At most {} form fields are allowed",
                    MAX_FORM_PARTS
                ))),
                Ok(field) => {
                    self.read_field(field, text_fields, file_field, max_files, &mut form)
                        .await
                }
                Err(e) => Err(AppError::Validation(format!("Invalid multipart payload: {}", e))),
            };

            if let Err(err) = result {
                self.remove_all(&form.files).await;
                return Err(err);
            }
        }

        Ok(form)
    }

    async fn read_field(
        &self,
        mut field: Field,
        text_fields: &[&str],
        file_field: &str,
        max_files: usize,
        form: &mut UploadForm,
    ) -> Result<()> {
        let name = field.name().unwrap_or_default().to_string();
        let file_name = field
            .content_disposition()
            .and_then(|cd| cd.get_filename())
            .map(str::to_string);

        if name != file_field {
            if !text_fields.contains(&name.as_str()) {
                return drain(&mut field).await;
            }
            let bytes = read_limited(&mut field, MAX_TEXT_FIELD_BYTES).await?;
            let value = String::from_utf8(bytes)
                .map_err(|_| AppError::Validation(format!("Field '{}' is not valid UTF-8", name)))?;
            form.fields.insert(name, value);
            return Ok(());
        }

        // Browsers send an empty part for an untouched file input.
        let Some(file_name) = file_name.filter(|f| !f.is_empty()) else {
            drain(&mut field).await?;
            return Ok(());
        };

        if form.files.len() >= max_files {
            return Err(AppError::Validation(format!(
                "At most {} images are allowed",
                max_files
            )));
        }

        let content_type = field.content_type().cloned();
        if !is_allowed_image(&file_name, content_type.as_ref()) {
            return Err(AppError::Validation("Images only!".to_string()));
        }

        let bytes = read_limited(&mut field, self.max_file_bytes).await?;
        let reference = self.save(&file_name, &bytes).await?;
        form.files.push(reference);
        Ok(())
    }

    /// Write a file under a fresh name and return its public reference.
    pub async fn save(&self, original_name: &str, bytes: &[u8]) -> Result<String> {
        let millis = Utc::now().timestamp_millis();
        let base = sanitize_file_name(original_name);

        for attempt in 0u32.. {
            let stored = if attempt == 0 {
                format!("{}-{}", millis, base)
            } else {
                format!("{}-{}-{}", millis, attempt, base)
            };

            let open = tokio::fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(self.dir.join(&stored))
                .await;

            match open {
                Ok(mut file) => {
                    file.write_all(bytes).await?;
                    file.flush().await?;
                    tracing::debug!(file = %stored, size = bytes.len(), "upload stored");
                    return Ok(format!("{}{}", PUBLIC_PREFIX, stored));
                }
                Err(e) if e.kind() == ErrorKind::AlreadyExists => continue,
                Err(e) => return Err(e.into()),
            }
        }

        Err(AppError::Internal("no free upload name".to_string()))
    }

    /// Best-effort removal of stored files by public reference.
    pub async fn remove_all(&self, references: &[String]) {
        for reference in references {
            let Some(path) = reference
                .strip_prefix(PUBLIC_PREFIX)
                .and_then(|name| self.resolve(name))
            else {
                continue;
            };

            if let Err(e) = tokio::fs::remove_file(&path).await {
                if e.kind() != ErrorKind::NotFound {
                    tracing::warn!(path = %path.display(), "failed to remove upload: {}", e);
                }
            }
        }
    }
}

async fn read_limited(field: &mut Field, limit: usize) -> Result<Vec<u8>> {
    let mut bytes = Vec::new();
    while let Some(chunk) = field.next().await {
        let chunk =
            chunk.map_err(|e| AppError::Validation(format!("Invalid multipart payload: {}", e)))?;
        if bytes.len() + chunk.len() > limit {
            return Err(AppError::Validation(format!(
                "File too large (limit {} bytes)",
                limit
            )));
        }
        bytes.extend_from_slice(&chunk);
    }
    Ok(bytes)
}

async fn drain(field: &mut Field) -> Result<()> {
    while let Some(chunk) = field.next().await {
        chunk.map_err(|e| AppError::Validation(format!("Invalid multipart payload: {}", e)))?;
    }
    Ok(())
}

fn extension(file_name: &str) -> Option<String> {
    Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
}

/// Extension must be jpeg/jpg/png/gif and the declared type must be an image.
pub fn is_allowed_image(file_name: &str, content_type: Option<&mime::Mime>) -> bool {
    let ext_ok = extension(file_name)
        .map(|e| ALLOWED_EXTENSIONS.contains(&e.as_str()))
        .unwrap_or(false);
    let type_ok = content_type
        .map(|m| m.type_() == mime::IMAGE)
        .unwrap_or(false);
    ext_ok && type_ok
}

/// Last path component with whitespace turned into `_` and anything outside
/// `[A-Za-z0-9._-]` dropped.
pub fn sanitize_file_name(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or_default();
    let cleaned: String = base
        .chars()
        .filter_map(|c| match c {
            c if c.is_whitespace() => Some('_'),
            c if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') => Some(c),
            _ => None,
        })
        .collect();
    let cleaned = cleaned.trim_start_matches('.');

    if cleaned.is_empty() {
        "upload".to_string()
    } else {
        cleaned.to_string()
    }
}

/// Content type to serve a stored file with.
pub fn content_type_for(name: &str) -> mime::Mime {
    match extension(name).as_deref() {
        Some("png") => mime::IMAGE_PNG,
        Some("gif") => mime::IMAGE_GIF,
        Some("jpg") | Some("jpeg") => mime::IMAGE_JPEG,
        _ => mime::APPLICATION_OCTET_STREAM,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store(dir: &Path) -> UploadStore {
        UploadStore::new(&UploadConfig {
            dir: dir.to_path_buf(),
            max_file_bytes: 1024,
        })
    }

    #[test]
    fn test_sanitize_file_name() {
        assert_eq!(sanitize_file_name("my cat.png"), "my_cat.png");
        assert_eq!(sanitize_file_name("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_file_name("C:\\photos\\dog.JPG"), "dog.JPG");
        assert_eq!(sanitize_file_name(".hidden.gif"), "hidden.gif");
        assert_eq!(sanitize_file_name("日本.png"), "png");
        assert_eq!(sanitize_file_name("???"), "upload");
    }

    #[test]
    fn test_allowed_images() {
        assert!(is_allowed_image("a.PNG", Some(&mime::IMAGE_PNG)));
        assert!(is_allowed_image("a.jpeg", Some(&mime::IMAGE_JPEG)));
        assert!(!is_allowed_image("a.png", Some(&mime::TEXT_PLAIN)));
        assert!(!is_allowed_image("a.svg", Some(&mime::IMAGE_SVG)));
        assert!(!is_allowed_image("a.gif", None));
        assert!(!is_allowed_image("noext", Some(&mime::IMAGE_PNG)));
    }

    #[test]
    fn test_resolve_rejects_traversal() {
        let s = store(Path::new("/srv/uploads"));
        assert_eq!(
            s.resolve("1-a.png"),
            Some(PathBuf::from("/srv/uploads/1-a.png"))
        );
        assert!(s.resolve("../secret").is_none());
        assert!(s.resolve("a/b.png").is_none());
        assert!(s.resolve(".env").is_none());
        assert!(s.resolve("").is_none());
    }

    #[tokio::test]
    async fn test_save_and_remove() {
        let dir = tempfile::tempdir().unwrap();
        let s = store(dir.path());

        let first = s.save("my pic.png", b"png-bytes").await.unwrap();
        let second = s.save("my pic.png", b"other").await.unwrap();
        assert!(first.starts_with(PUBLIC_PREFIX));
        assert!(first.ends_with("-my_pic.png"));
        assert_ne!(first, second);

        let name = first.strip_prefix(PUBLIC_PREFIX).unwrap();
        let stored = tokio::fs::read(dir.path().join(name)).await.unwrap();
        assert_eq!(stored, b"png-bytes");

        s.remove_all(&[first.clone(), second]).await;
        assert!(!dir.path().join(name).exists());
    }
}
