//! Extraction service — pulls text, document metadata and hyperlinks out of
//! an uploaded PDF.
//!
//! Text goes through `pdf-extract`; metadata and link annotations are read
//! from the object tree with `lopdf`. Parsing is CPU-bound, so it runs on the
//! blocking pool, which also turns a parser panic into an `ExtractError`.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use lopdf::{Document, Object};
use serde_json::{json, Map, Value};
use thiserror::Error;

pub mod links;

use links::find_text_links;

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("PDF text extraction failed: {0}")]
    Text(String),

    #[error("PDF parse failed: {0}")]
    Parse(String),

    #[error("Extraction task aborted: {0}")]
    Aborted(String),
}

/// Output of [`Extractor::extract_text_and_metadata`].
#[derive(Debug, Clone, PartialEq)]
pub struct TextAndMetadata {
    pub text: String,
    pub metadata: Value,
    pub text_links: Vec<String>,
}

#[async_trait]
pub trait Extractor: Send + Sync {
    async fn extract_text_and_metadata(
        &self,
        local_path: &Path,
    ) -> Result<TextAndMetadata, ExtractError>;

    /// URIs of `Link` annotations across all pages.
    async fn extract_hyperlinks(&self, local_path: &Path) -> Result<Vec<String>, ExtractError>;
}

#[derive(Debug, Default, Clone)]
pub struct PdfExtractor;

async fn read_file(path: &Path) -> Result<Vec<u8>, ExtractError> {
    tokio::fs::read(path)
        .await
        .map_err(|source| ExtractError::Read {
            path: path.to_path_buf(),
            source,
        })
}

async fn blocking<T, F>(f: F) -> Result<T, ExtractError>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, ExtractError> + Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| ExtractError::Aborted(e.to_string()))?
}

#[async_trait]
impl Extractor for PdfExtractor {
    async fn extract_text_and_metadata(
        &self,
        local_path: &Path,
    ) -> Result<TextAndMetadata, ExtractError> {
        let bytes = read_file(local_path).await?;
        blocking(move || {
            let text = pdf_extract::extract_text_from_mem(&bytes)
                .map_err(|e| ExtractError::Text(e.to_string()))?;
            let doc = Document::load_mem(&bytes).map_err(|e| ExtractError::Parse(e.to_string()))?;
            let metadata = document_metadata(&doc);
            let text_links = find_text_links(&text);
            Ok(TextAndMetadata {
                text,
                metadata,
                text_links,
            })
        })
        .await
    }

    async fn extract_hyperlinks(&self, local_path: &Path) -> Result<Vec<String>, ExtractError> {
        let bytes = read_file(local_path).await?;
        blocking(move || {
            let doc = Document::load_mem(&bytes).map_err(|e| ExtractError::Parse(e.to_string()))?;
            Ok(annotation_links(&doc))
        })
        .await
    }
}

// ────────────────────────────────────────────────────────────────────────────
// lopdf helpers
// ────────────────────────────────────────────────────────────────────────────

fn resolve<'a>(doc: &'a Document, obj: &'a Object) -> &'a Object {
    match obj {
        Object::Reference(id) => doc.get_object(*id).unwrap_or(obj),
        _ => obj,
    }
}

fn decode_pdf_string(bytes: &[u8]) -> String {
    match bytes {
        [0xFE, 0xFF, rest @ ..] => {
            let units: Vec<u16> = rest
                .chunks_exact(2)
                .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
                .collect();
            String::from_utf16_lossy(&units)
        }
        _ => String::from_utf8_lossy(bytes).into_owned(),
    }
}

/// `{page_count, info: {Title, Author, ...}}` from the trailer's Info dictionary.
fn document_metadata(doc: &Document) -> Value {
    let mut info = Map::new();
    if let Ok(info_ref) = doc.trailer.get(b"Info") {
        if let Object::Dictionary(dict) = resolve(doc, info_ref) {
            for (key, value) in dict.iter() {
                let value = match resolve(doc, value) {
                    Object::String(bytes, _) => Value::String(decode_pdf_string(bytes)),
                    Object::Name(name) => Value::String(String::from_utf8_lossy(name).into_owned()),
                    Object::Integer(n) => json!(n),
                    Object::Boolean(b) => json!(b),
                    _ => continue,
                };
                info.insert(String::from_utf8_lossy(key).into_owned(), value);
            }
        }
    }

    json!({
        "page_count": doc.get_pages().len(),
        "info": info,
    })
}

fn annotation_links(doc: &Document) -> Vec<String> {
    let mut found = Vec::new();

    for page_id in doc.get_pages().into_values() {
        let Ok(Object::Dictionary(page)) = doc.get_object(page_id) else {
            continue;
        };
        let Ok(annots) = page.get(b"Annots") else {
            continue;
        };
        let Object::Array(annots) = resolve(doc, annots) else {
            continue;
        };

        for annot in annots {
            let Object::Dictionary(annot) = resolve(doc, annot) else {
                continue;
            };
            let is_link = matches!(annot.get(b"Subtype"), Ok(Object::Name(n)) if n.as_slice() == b"Link");
            if !is_link {
                continue;
            }
            let Ok(action) = annot.get(b"A") else {
                continue;
            };
            let Object::Dictionary(action) = resolve(doc, action) else {
                continue;
            };
            if let Ok(uri) = action.get(b"URI") {
                if let Object::String(bytes, _) = resolve(doc, uri) {
                    found.push(decode_pdf_string(bytes).trim().to_string());
                }
            }
        }
    }

    links::union_links(found, Vec::new())
}
