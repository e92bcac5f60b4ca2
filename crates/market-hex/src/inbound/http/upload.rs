use std::collections::HashMap;

use axum::extract::Multipart;
use serde::de::DeserializeOwned;

use crate::application::Upload;
use crate::errors::AppError;

/// A drained multipart body: text parts by name, file parts grouped by name.
#[derive(Debug, Default)]
pub(crate) struct Form {
    fields: HashMap<String, String>,
    files: HashMap<String, Vec<Upload>>,
}

impl Form {
    pub(crate) async fn read(mut multipart: Multipart) -> Result<Self, AppError> {
        let mut form = Form::default();
        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| AppError::BadRequest(e.body_text()))?
        {
            let name = field.name().unwrap_or_default().to_string();
            let content_type = field
                .content_type()
                .unwrap_or("application/octet-stream")
                .to_string();
            let is_file = field.file_name().is_some() || content_type.starts_with("image/");
            let bytes = field
                .bytes()
                .await
                .map_err(|e| AppError::BadRequest(e.body_text()))?;

            if is_file {
                form.files.entry(name).or_default().push(Upload {
                    content_type,
                    bytes: bytes.to_vec(),
                });
            } else {
                let text = String::from_utf8(bytes.to_vec())
                    .map_err(|_| AppError::BadRequest(format!("field {name} is not utf-8")))?;
                form.fields.insert(name, text);
            }
        }
        Ok(form)
    }

    /// Parses a JSON text part.
    pub(crate) fn json<T: DeserializeOwned>(&self, name: &str) -> Result<Option<T>, AppError> {
        match self.fields.get(name) {
            Some(raw) => serde_json::from_str(raw)
                .map(Some)
                .map_err(|e| AppError::BadRequest(format!("invalid {name}: {e}"))),
            None => Ok(None),
        }
    }

    pub(crate) fn files(&mut self, name: &str) -> Vec<Upload> {
        self.files.remove(name).unwrap_or_default()
    }

    pub(crate) fn file(&mut self, name: &str) -> Option<Upload> {
        self.files(name).into_iter().next()
    }
}
