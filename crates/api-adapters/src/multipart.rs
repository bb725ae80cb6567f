//! Parses the multipart body shared by post create and update.

use axum::extract::Multipart;
use bytes::Bytes;
use domains::UploadedFile;
use mime::Mime;

use crate::error::ApiResult;

/// Fields of a post create/update form. Unknown fields are ignored.
#[derive(Debug, Default)]
pub struct BoardForm {
    pub title: String,
    pub content: String,
    pub files: Vec<UploadedFile>,
    pub delete_file_names: Vec<String>,
}

impl BoardForm {
    pub async fn read(mut multipart: Multipart) -> ApiResult<Self> {
        let mut form = Self::default();

        while let Some(field) = multipart.next_field().await? {
            let Some(name) = field.name().map(str::to_owned) else {
                continue;
            };
            match name.as_str() {
                "title" => form.title = field.text().await?,
                "content" => form.content = field.text().await?,
                "deleteFileNames" | "deleteFileNames[]" => {
                    let value = field.text().await?;
                    if !value.trim().is_empty() {
                        form.delete_file_names.push(value);
                    }
                }
                "files" | "files[]" => {
                    let file_name = field.file_name().unwrap_or_default().to_owned();
                    let declared = field.content_type().and_then(|ct| ct.parse::<Mime>().ok());
                    let data: Bytes = field.bytes().await?;
                    // browsers send an unnamed empty part when no file is picked
                    if file_name.is_empty() && data.is_empty() {
                        continue;
                    }
                    let content_type = declared.unwrap_or_else(|| {
                        mime_guess::from_path(&file_name).first_or_octet_stream()
                    });
                    form.files.push(UploadedFile {
                        name: file_name,
                        content_type,
                        data,
                    });
                }
                _ => {}
            }
        }

        Ok(form)
    }
}
