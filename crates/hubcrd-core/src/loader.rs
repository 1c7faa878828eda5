//! Manifest loading
//!
//! Walks a [`FileSystem`], picks the YAML and JSON files and splits each one
//! into its `---` separated documents.

use tracing::debug;

use crate::error::{CoreError, Result};
use crate::files::FileSystem;

const DOCUMENT_SEPARATOR: &str = "---";

/// One document of a manifest file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Manifest {
    /// Path of the originating file, relative to the filesystem root
    pub path: String,
    pub data: Vec<u8>,
}

impl Manifest {
    pub fn text(&self) -> std::borrow::Cow<'_, str> {
        String::from_utf8_lossy(&self.data)
    }
}

/// Load every document of every YAML or JSON file
///
/// Any read error aborts the walk.
pub fn load_manifests(fs: &dyn FileSystem) -> Result<Vec<Manifest>> {
    let mut manifests = Vec::new();

    for path in fs.walk()? {
        if !is_yaml_or_json(&path) {
            continue;
        }

        let content = fs.read(&path)?;
        let documents = split_documents(&content).map_err(|e| CoreError::ReadContent {
            path: path.clone(),
            source: Box::new(e),
        })?;

        debug!(path = %path, documents = documents.len(), "loaded manifest file");

        manifests.extend(documents.into_iter().map(|data| Manifest {
            path: path.clone(),
            data,
        }));
    }

    Ok(manifests)
}

/// Whether the file extension is `.yaml`, `.yml` or `.json`, in any case
pub fn is_yaml_or_json(path: &str) -> bool {
    let Some((_, extension)) = path.rsplit_once('.') else {
        return false;
    };
    if extension.contains('/') {
        return false;
    }
    matches!(
        extension.to_ascii_lowercase().as_str(),
        "yaml" | "yml" | "json"
    )
}

/// Split a YAML stream into documents
///
/// A line starting with `---` ends the current document. Only spaces or a
/// comment may follow the separator on that line. Documents holding nothing
/// but blank lines and comments are dropped.
pub fn split_documents(content: &[u8]) -> Result<Vec<Vec<u8>>> {
    let mut documents = Vec::new();
    let mut buffer: Vec<u8> = Vec::new();

    for line in content.split_inclusive(|&b| b == b'\n') {
        if let Some(rest) = line.strip_prefix(DOCUMENT_SEPARATOR.as_bytes()) {
            let trimmed = String::from_utf8_lossy(rest).trim().to_string();
            if !trimmed.is_empty() && !trimmed.starts_with('#') {
                return Err(CoreError::InvalidSeparator(trimmed));
            }

            flush(&mut buffer, &mut documents);
            continue;
        }

        buffer.extend_from_slice(line);
    }
    flush(&mut buffer, &mut documents);

    Ok(documents)
}

fn flush(buffer: &mut Vec<u8>, documents: &mut Vec<Vec<u8>>) {
    let document = std::mem::take(buffer);
    if has_content(&document) {
        documents.push(document);
    }
}

fn has_content(document: &[u8]) -> bool {
    String::from_utf8_lossy(document).lines().any(|line| {
        let line = line.trim();
        !line.is_empty() && !line.starts_with('#')
    })
}
