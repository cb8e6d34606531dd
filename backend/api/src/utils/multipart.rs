use std::collections::HashMap;

use actix_multipart::Multipart;
use futures_util::StreamExt;

use crate::error::{AppError, Result};

/// One uploaded file from a multipart form.
#[derive(Debug, Clone)]
pub struct FilePart {
    pub filename: String,
    pub content_type: String,
    pub data: Vec<u8>,
}

/// A fully-consumed multipart form: text fields plus named file parts.
#[derive(Debug, Default)]
pub struct CollectedForm {
    pub fields: HashMap<String, String>,
    pub files: HashMap<String, FilePart>,
}

impl CollectedForm {
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(|s| s.as_str()).filter(|s| !s.trim().is_empty())
    }

    pub fn file(&self, name: &str) -> Option<&FilePart> {
        self.files.get(name)
    }
}

/// Drain a multipart payload into memory.
///
/// Parts with a filename become `files`, everything else is decoded as a UTF-8
/// text field. Later parts with the same name overwrite earlier ones.
pub async fn collect_form(mut payload: Multipart) -> Result<CollectedForm> {
    let mut form = CollectedForm::default();

    while let Some(item) = payload.next().await {
        let mut field =
            item.map_err(|e| AppError::BadRequest(format!("Multipart error: {}", e)))?;

        let name = field.name().to_string();
        let filename = field
            .content_disposition()
            .get_filename()
            .map(|f| f.to_string());
        let content_type = field.content_type().to_string();

        let mut data = Vec::new();
        while let Some(chunk) = field.next().await {
            let chunk =
                chunk.map_err(|e| AppError::BadRequest(format!("Multipart error: {}", e)))?;
            data.extend_from_slice(&chunk);
        }

        match filename {
            Some(filename) => {
                form.files.insert(
                    name,
                    FilePart {
                        filename,
                        content_type,
                        data,
                    },
                );
            }
            None => {
                let value = String::from_utf8(data).map_err(|_| {
                    AppError::BadRequest(format!("Field '{}' is not valid UTF-8", name))
                })?;
                form.fields.insert(name, value);
            }
        }
    }

    Ok(form)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_fields_read_as_missing() {
        let mut form = CollectedForm::default();
        form.fields.insert("title".to_string(), "  ".to_string());
        form.fields.insert("artist".to_string(), "Mina".to_string());

        assert_eq!(form.field("title"), None);
        assert_eq!(form.field("artist"), Some("Mina"));
        assert_eq!(form.field("missing"), None);
    }
}
