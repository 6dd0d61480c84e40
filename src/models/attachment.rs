//! Files attached to user stories, tasks, issues, epics and wiki pages.

use std::path::{Path, PathBuf};

use tokio::fs::File;
use tokio::io::AsyncReadExt;

use super::collection::Collection;
use super::resource::Resource;
use super::searchable::SearchableList;
use crate::error::{Result, TaigaError};
use crate::request::{FilePart, Payload, Query};
use crate::traits::List;

/// A file to upload, given by path, by contents or as an open handle.
#[derive(Debug)]
pub enum AttachedFile {
    /// Read from disk when the upload starts.
    Path(PathBuf),
    /// Contents already in memory.
    Bytes {
        /// File name reported to the server.
        file_name: String,
        /// File contents.
        data: Vec<u8>,
    },
    /// An open file, read to the end when the upload starts.
    Handle {
        /// File name reported to the server.
        file_name: String,
        /// The open file.
        file: File,
    },
}

impl AttachedFile {
    pub fn path(path: impl Into<PathBuf>) -> Self {
        Self::Path(path.into())
    }

    pub fn bytes(file_name: impl Into<String>, data: impl Into<Vec<u8>>) -> Self {
        Self::Bytes {
            file_name: file_name.into(),
            data: data.into(),
        }
    }

    pub fn handle(file_name: impl Into<String>, file: File) -> Self {
        Self::Handle {
            file_name: file_name.into(),
            file,
        }
    }

    /// Read the contents into a multipart file part.
    pub(crate) async fn into_part(self, field_name: &str) -> Result<FilePart> {
        let (file_name, bytes) = match self {
            Self::Path(path) => {
                let bytes = read_path(&path).await?;
                (file_name_of(&path), bytes)
            }
            Self::Bytes { file_name, data } => (file_name, data),
            Self::Handle { file_name, mut file } => {
                let mut bytes = Vec::new();
                file.read_to_end(&mut bytes).await.map_err(|e| {
                    TaigaError::Usage(format!("Could not read attachment {file_name}: {e}"))
                })?;
                (file_name, bytes)
            }
        };

        Ok(FilePart {
            field_name: field_name.to_string(),
            file_name,
            bytes,
        })
    }
}

impl From<PathBuf> for AttachedFile {
    fn from(path: PathBuf) -> Self {
        Self::Path(path)
    }
}

impl From<&Path> for AttachedFile {
    fn from(path: &Path) -> Self {
        Self::Path(path.to_path_buf())
    }
}

impl From<&str> for AttachedFile {
    fn from(path: &str) -> Self {
        Self::Path(PathBuf::from(path))
    }
}

async fn read_path(path: &Path) -> Result<Vec<u8>> {
    let is_file = tokio::fs::metadata(path)
        .await
        .map(|meta| meta.is_file())
        .unwrap_or(false);
    if !is_file {
        return Err(TaigaError::Usage(format!(
            "Attachment file {} does not exist",
            path.display()
        )));
    }

    tokio::fs::read(path).await.map_err(|e| {
        TaigaError::Usage(format!("Could not read attachment {}: {e}", path.display()))
    })
}

fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

impl Resource {
    fn attachment_collection(&self) -> Result<Collection> {
        let kind = self.kind().attachments.ok_or_else(|| {
            TaigaError::Usage(format!("{} does not take attachments", self.kind().name))
        })?;
        Ok(Collection::new(self.client(), kind))
    }

    /// Attach a file to this instance.
    ///
    /// # Errors
    ///
    /// Returns a usage error if the kind takes no attachments, the instance
    /// lacks `id` or `project`, or the file cannot be read; a REST error if
    /// the upload is rejected.
    pub async fn attach(&self, file: impl Into<AttachedFile>, attrs: Payload) -> Result<Resource> {
        let attachments = self.attachment_collection()?;
        let id = self.require_id()?;
        let project = self.get_i64("project").ok_or_else(|| {
            TaigaError::Usage(format!("{} instance has no project", self.kind().name))
        })?;

        attachments
            .create_attachment(project, id, file.into(), attrs)
            .await
    }

    /// Attachments of this instance.
    ///
    /// # Errors
    ///
    /// Returns a usage error if the kind takes no attachments, or the error
    /// of any page request.
    pub async fn list_attachments(&self) -> Result<SearchableList> {
        let attachments = self.attachment_collection()?;
        let id = self.require_id()?;
        attachments.list(Query::new().with("object_id", id)).await
    }
}
