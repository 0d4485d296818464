use anyhow::{anyhow, bail, Context, Result};
use lopdf::Document as PdfDocument;
use std::path::Path;
use tracing::{debug, warn};

/// Text of a single PDF page (1-based page number)
#[derive(Debug, Clone)]
pub struct PageText {
    pub page_number: u32,
    pub text: String,
}

#[derive(Debug, Clone)]
pub struct ParsedDocument {
    pub pages: Vec<PageText>,
    pub metadata: DocumentMetadata,
}

#[derive(Debug, Clone)]
pub struct DocumentMetadata {
    pub file_type: String,
    pub pages: usize,
    pub char_count: usize,
}

pub struct DocumentParser;

impl DocumentParser {
    /// Parse document dari path
    pub fn parse(path: &Path) -> Result<ParsedDocument> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .ok_or_else(|| anyhow!("No file extension: {:?}", path))?
            .to_lowercase();

        debug!("Parsing file: {:?} (type: {})", path, extension);

        match extension.as_str() {
            "pdf" => {
                let doc = PdfDocument::load(path)
                    .with_context(|| format!("Failed to load PDF file {:?}", path))?;
                Ok(Self::extract_pages(&doc))
            }
            other => bail!("Unsupported document type: {}", other),
        }
    }

    /// Parse PDF already held in memory
    pub fn parse_pdf_bytes(bytes: &[u8]) -> Result<ParsedDocument> {
        let doc = PdfDocument::load_mem(bytes).context("Failed to load PDF bytes")?;
        Ok(Self::extract_pages(&doc))
    }

    /// One entry per page, like a page-wise PDF loader. Blank pages are dropped.
    fn extract_pages(doc: &PdfDocument) -> ParsedDocument {
        let page_map = doc.get_pages();
        let page_count = page_map.len();

        let mut pages = Vec::with_capacity(page_count);
        for page_num in page_map.keys() {
            match doc.extract_text(&[*page_num]) {
                Ok(text) if !text.trim().is_empty() => pages.push(PageText {
                    page_number: *page_num,
                    text,
                }),
                Ok(_) => debug!("Page {} has no extractable text", page_num),
                Err(e) => warn!("Failed to extract text from page {}: {}", page_num, e),
            }
        }

        let char_count = pages.iter().map(|p| p.text.chars().count()).sum();
        debug!(
            "Extracted {} characters from {}/{} pages",
            char_count,
            pages.len(),
            page_count
        );

        ParsedDocument {
            pages,
            metadata: DocumentMetadata {
                file_type: "application/pdf".to_string(),
                pages: page_count,
                char_count,
            },
        }
    }
}
