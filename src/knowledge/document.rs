//! Reference document loading.

use std::path::{Path, PathBuf};

use crate::error::KnowledgeError;

/// Raw extracted text of the reference source. Read-only once loaded.
#[derive(Debug, Clone)]
pub struct Document {
    pub source: PathBuf,
    pub text: String,
}

impl Document {
    pub fn new(source: impl Into<PathBuf>, text: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            text: text.into(),
        }
    }

    pub fn word_count(&self) -> usize {
        self.text.split_whitespace().count()
    }
}

/// Load the reference document from disk.
///
/// `.pdf` files go through text extraction; anything else is read as UTF-8.
/// A document with no words is an error so the caller can degrade.
pub async fn load_document(path: &Path) -> Result<Document, KnowledgeError> {
    if !tokio::fs::try_exists(path).await.unwrap_or(false) {
        return Err(KnowledgeError::DocumentNotFound(path.display().to_string()));
    }

    let is_pdf = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("pdf"));

    let text = if is_pdf {
        let owned = path.to_path_buf();
        tokio::task::spawn_blocking(move || pdf_extract::extract_text(&owned))
            .await
            .map_err(|e| KnowledgeError::Extraction {
                path: path.display().to_string(),
                reason: e.to_string(),
            })?
            .map_err(|e| KnowledgeError::Extraction {
                path: path.display().to_string(),
                reason: e.to_string(),
            })?
    } else {
        tokio::fs::read_to_string(path).await?
    };

    let document = Document::new(path, text);
    if document.word_count() == 0 {
        return Err(KnowledgeError::EmptyDocument(path.display().to_string()));
    }
    Ok(document)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_file_is_not_found() {
        let tmp = tempfile::tempdir().unwrap();
        let err = load_document(&tmp.path().join("absent.pdf"))
            .await
            .unwrap_err();
        assert!(matches!(err, KnowledgeError::DocumentNotFound(_)));
    }

    #[tokio::test]
    async fn text_file_is_read_verbatim() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("brochure.txt");
        std::fs::write(&path, "Invock provides inventory management.\nIt is fast.").unwrap();

        let doc = load_document(&path).await.unwrap();
        assert_eq!(doc.word_count(), 7);
        assert!(doc.text.starts_with("Invock provides"));
    }

    #[tokio::test]
    async fn whitespace_only_file_is_empty() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("blank.md");
        std::fs::write(&path, "  \n\n ").unwrap();
        assert!(matches!(
            load_document(&path).await,
            Err(KnowledgeError::EmptyDocument(_))
        ));
    }

    #[tokio::test]
    async fn corrupt_pdf_is_extraction_error() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("broken.pdf");
        std::fs::write(&path, b"this is not a pdf").unwrap();
        assert!(matches!(
            load_document(&path).await,
            Err(KnowledgeError::Extraction { .. })
        ));
    }
}
