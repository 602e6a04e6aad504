use crate::error::RagError;
use crate::models::Page;
use crate::traits::DocumentSource;
use lopdf::Document;
use std::path::Path;

#[derive(Debug, Default)]
pub struct PdfSource;

impl DocumentSource for PdfSource {
    fn load(&self, path: &Path, document_id: &str) -> Result<Vec<Page>, RagError> {
        ensure_exists(path)?;
        let document = Document::load(path).map_err(|error| {
            RagError::DocumentParse(format!("{}: {error}", path.display()))
        })?;

        let page_ids = document.get_pages();
        if page_ids.is_empty() {
            return Err(RagError::DocumentParse(format!(
                "pdf has no pages: {}",
                path.display()
            )));
        }

        let mut pages = Vec::new();
        for (page_number, _page_id) in page_ids {
            let text = document.extract_text(&[page_number]).map_err(|error| {
                RagError::DocumentParse(format!(
                    "{} page {page_number}: {error}",
                    path.display()
                ))
            })?;

            pages.push(Page {
                document_id: document_id.to_string(),
                page_number,
                text,
            });
        }

        Ok(pages)
    }
}

#[derive(Debug, Default)]
pub struct TextFileSource;

impl DocumentSource for TextFileSource {
    fn load(&self, path: &Path, document_id: &str) -> Result<Vec<Page>, RagError> {
        ensure_exists(path)?;
        let bytes = std::fs::read(path).map_err(|error| {
            RagError::DocumentParse(format!("{}: {error}", path.display()))
        })?;
        let text = String::from_utf8(bytes).map_err(|error| {
            RagError::DocumentParse(format!("{} is not valid UTF-8: {error}", path.display()))
        })?;

        Ok(text_to_pages(&text, document_id))
    }
}

pub(crate) fn text_to_pages(text: &str, document_id: &str) -> Vec<Page> {
    text.split('\u{000c}')
        .enumerate()
        .map(|(index, section)| Page {
            document_id: document_id.to_string(),
            page_number: (index + 1) as u32,
            text: section.to_string(),
        })
        .collect()
}

pub fn source_for_path(path: &Path) -> Box<dyn DocumentSource + Send + Sync> {
    let is_pdf = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"));

    if is_pdf {
        Box::new(PdfSource)
    } else {
        Box::new(TextFileSource)
    }
}

fn ensure_exists(path: &Path) -> Result<(), RagError> {
    if path.is_file() {
        Ok(())
    } else {
        Err(RagError::DocumentNotFound(path.display().to_string()))
    }
}
