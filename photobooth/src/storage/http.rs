//! HTTP object storage backend.
//!
//! Speaks the unsigned multipart upload convention: POST the file with a
//! requested public id, get back a JSON body naming the stored object and
//! its serving URL. Any transport or non-2xx failure is reported as
//! retryable.

use serde::Deserialize;

use super::{content_type_for, StoredPhoto};
use crate::booth::BoothError;

/// Upload response from the storage service.
#[derive(Debug, Deserialize)]
struct UploadReply {
    secure_url: Option<String>,
    url: Option<String>,
    public_id: Option<String>,
}

/// Remote object storage reached over HTTP.
#[derive(Clone)]
pub struct HttpStorage {
    client: reqwest::Client,
    upload_url: String,
}

impl HttpStorage {
    /// Create a backend posting uploads to the given endpoint.
    pub fn new(upload_url: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            upload_url,
        }
    }

    /// Upload one photo.
    pub async fn upload(
        &self,
        photo_id: &str,
        filename: &str,
        bytes: &[u8],
    ) -> Result<StoredPhoto, BoothError> {
        let part = reqwest::multipart::Part::bytes(bytes.to_vec())
            .file_name(filename.to_string())
            .mime_str(content_type_for(filename))
            .map_err(|err| BoothError::StorageUnavailable(err.to_string()))?;
        let form = reqwest::multipart::Form::new()
            .part("file", part)
            .text("public_id", photo_id.to_string());

        let response = self
            .client
            .post(&self.upload_url)
            .multipart(form)
            .send()
            .await
            .map_err(|err| BoothError::StorageUnavailable(err.to_string()))?;

        if !response.status().is_success() {
            return Err(BoothError::StorageUnavailable(format!(
                "upload returned {}",
                response.status()
            )));
        }

        let reply: UploadReply = response
            .json()
            .await
            .map_err(|err| BoothError::StorageUnavailable(err.to_string()))?;

        let url = reply
            .secure_url
            .or(reply.url)
            .ok_or_else(|| BoothError::StorageUnavailable("upload reply had no url".to_string()))?;

        Ok(StoredPhoto {
            url,
            storage_id: reply.public_id.unwrap_or_else(|| photo_id.to_string()),
        })
    }
}
