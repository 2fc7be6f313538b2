//! Document library: upload, type inference and the filtered listing.

use std::path::Path;
use std::rc::Rc;

use chrono::NaiveDate;
use tracing::{debug, info};

use crate::error::StateError;
use crate::filter::{DocumentFilter, document_types};
use crate::model::{Document, DocumentStatus, FileHandle, new_id};
use crate::state::AppState;

pub const ACCEPTED_EXTENSIONS: [&str; 4] = ["pdf", "doc", "docx", "txt"];

const SIZE_UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];

pub fn is_accepted_file(name: &str) -> bool {
    Path::new(name)
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            ACCEPTED_EXTENSIONS
                .iter()
                .any(|accepted| accepted.eq_ignore_ascii_case(ext))
        })
}

/// Guess a document type from keywords in the file name.
pub fn infer_document_type(name: &str) -> &'static str {
    let lower = name.to_lowercase();
    let has = |needle: &str| lower.contains(needle);

    if has("personal statement") || has("essay") {
        "Personal Statement"
    } else if has("recommendation") || has("lor") {
        "Letter of Recommendation"
    } else if has("transcript") {
        "Transcript"
    } else if has("resume") || has("cv") {
        "Resume"
    } else {
        "Other"
    }
}

/// `0 Bytes`, `512 Bytes`, `1.5 KB`, `2.25 MB`. Anything past GB stays in GB.
pub fn format_file_size(bytes: u64) -> String {
    if bytes == 0 {
        return "0 Bytes".to_string();
    }

    let mut unit = 0;
    let mut value = bytes as f64;
    while value >= 1024.0 && unit < SIZE_UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }

    let rounded = format!("{value:.2}");
    let trimmed = rounded.trim_end_matches('0').trim_end_matches('.');
    format!("{trimmed} {}", SIZE_UNITS[unit])
}

/// Validate one file and add it to the library as a pending document.
#[tracing::instrument(skip(state, file), fields(name = %file.name, bytes = file.bytes.len()))]
pub fn upload_document(
    state: &mut AppState,
    file: FileHandle,
    today: NaiveDate,
) -> anyhow::Result<Document> {
    if !is_accepted_file(&file.name) {
        return Err(StateError::UnsupportedFileType { name: file.name }.into());
    }

    let document = Document {
        id: new_id(),
        name: file.name.clone(),
        doc_type: infer_document_type(&file.name).to_string(),
        upload_date: today,
        status: DocumentStatus::Pending,
        size: format_file_size(file.bytes.len() as u64),
        file: Some(Rc::new(file)),
    };

    state.add_document(document.clone())?;
    info!(id = %document.id, doc_type = %document.doc_type, "uploaded document");
    Ok(document)
}

/// All files are checked before any is added, so a bad name rejects the batch.
pub fn upload_documents(
    state: &mut AppState,
    files: Vec<FileHandle>,
    today: NaiveDate,
) -> anyhow::Result<Vec<Document>> {
    if let Some(bad) = files.iter().find(|file| !is_accepted_file(&file.name)) {
        return Err(StateError::UnsupportedFileType {
            name: bad.name.clone(),
        }
        .into());
    }

    files
        .into_iter()
        .map(|file| upload_document(state, file, today))
        .collect()
}

pub fn set_document_status(
    state: &mut AppState,
    id: &str,
    status: DocumentStatus,
) -> anyhow::Result<Document> {
    let mut document = state
        .find_document(id)
        .cloned()
        .ok_or_else(|| StateError::NotFound {
            kind: "document",
            id: id.to_string(),
        })?;
    document.status = status;
    state.replace_document(document.clone())?;
    debug!(id, %status, "document status changed");
    Ok(document)
}

#[derive(Debug, Clone, PartialEq)]
pub struct DocumentRow {
    pub id: String,
    pub name: String,
    pub doc_type: String,
    pub upload_date: NaiveDate,
    pub status: DocumentStatus,
    pub size: String,
    pub has_file: bool,
}

impl From<&Document> for DocumentRow {
    fn from(doc: &Document) -> Self {
        Self {
            id: doc.id.clone(),
            name: doc.name.clone(),
            doc_type: doc.doc_type.clone(),
            upload_date: doc.upload_date,
            status: doc.status,
            size: doc.size.clone(),
            has_file: doc.file.is_some(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct DocumentsModel {
    pub rows: Vec<DocumentRow>,
    /// Every type in the library, for the type selector.
    pub types: Vec<String>,
    pub filter_active: bool,
}

pub struct DocumentsView<'a> {
    state: &'a AppState,
    filter: DocumentFilter,
}

impl<'a> DocumentsView<'a> {
    pub fn new(state: &'a AppState, filter: DocumentFilter) -> Self {
        Self { state, filter }
    }

    pub fn model(&self) -> DocumentsModel {
        let docs = self.state.documents();
        DocumentsModel {
            rows: self
                .filter
                .apply(docs)
                .into_iter()
                .map(DocumentRow::from)
                .collect(),
            types: document_types(docs),
            filter_active: self.filter.is_active(),
        }
    }
}
