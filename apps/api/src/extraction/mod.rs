//! Document Text Extractor: turns an uploaded resume (PDF, DOCX, TXT) into plain text.
//!
//! Failures never escape as panics or raw library errors: every problem is an
//! `ExtractionError` whose message starts with `Error:` so callers can show it
//! to the user as-is.

pub mod handlers;

use std::fmt;

use bytes::Bytes;
use docx_rs::{DocumentChild, ParagraphChild, RunChild};
use serde::Serialize;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentFormat {
    Pdf,
    Docx,
    Txt,
}

impl DocumentFormat {
    /// Detects the format from the filename's final extension, case-insensitively.
    pub fn from_filename(filename: &str) -> Option<Self> {
        let (_, extension) = filename.rsplit_once('.')?;
        match extension.to_ascii_lowercase().as_str() {
            "pdf" => Some(DocumentFormat::Pdf),
            "docx" => Some(DocumentFormat::Docx),
            "txt" => Some(DocumentFormat::Txt),
            _ => None,
        }
    }
}

impl fmt::Display for DocumentFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DocumentFormat::Pdf => "PDF",
            DocumentFormat::Docx => "DOCX",
            DocumentFormat::Txt => "TXT",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractionError {
    #[error("Error: Unsupported file format. Please upload a PDF, DOCX, or TXT file.")]
    UnsupportedFormat { filename: String },

    #[error("Error: failed to parse {format} file: {cause}")]
    Parse {
        format: DocumentFormat,
        cause: String,
    },
}

/// An uploaded resume: raw bytes plus the format declared by its filename.
/// Transient; dropped once its text has been extracted.
#[derive(Debug, Clone)]
pub struct ResumeDocument {
    pub filename: String,
    pub format: DocumentFormat,
    pub bytes: Bytes,
}

impl ResumeDocument {
    pub fn from_upload(filename: &str, bytes: Bytes) -> Result<Self, ExtractionError> {
        let format = DocumentFormat::from_filename(filename).ok_or_else(|| {
            ExtractionError::UnsupportedFormat {
                filename: filename.to_string(),
            }
        })?;

        Ok(Self {
            filename: filename.to_string(),
            format,
            bytes,
        })
    }

    pub fn extract_text(&self) -> Result<String, ExtractionError> {
        let result = match self.format {
            DocumentFormat::Pdf => extract_pdf(&self.bytes),
            DocumentFormat::Docx => extract_docx(&self.bytes),
            DocumentFormat::Txt => extract_txt(&self.bytes),
        };

        let text = result.map_err(|cause| ExtractionError::Parse {
            format: self.format,
            cause,
        })?;

        debug!(
            "Extracted {} chars from {} ({})",
            text.len(),
            self.filename,
            self.format
        );
        Ok(text)
    }
}

/// Page-by-page text; pages without a text layer (scans) contribute "".
fn extract_pdf(bytes: &[u8]) -> Result<String, String> {
    // pdf-extract panics on some malformed inputs instead of returning Err.
    let pages = std::panic::catch_unwind(|| pdf_extract::extract_text_from_mem_by_pages(bytes))
        .map_err(|_| "the PDF structure could not be read".to_string())?
        .map_err(|e| e.to_string())?;

    Ok(pages.concat())
}

/// Top-level body paragraphs, each followed by a newline.
fn extract_docx(bytes: &[u8]) -> Result<String, String> {
    let docx = docx_rs::read_docx(bytes).map_err(|e| e.to_string())?;

    let mut text = String::new();
    for child in &docx.document.children {
        if let DocumentChild::Paragraph(paragraph) = child {
            push_paragraph_text(&paragraph.children, &mut text);
            text.push('\n');
        }
    }
    Ok(text)
}

fn push_paragraph_text(children: &[ParagraphChild], out: &mut String) {
    for child in children {
        match child {
            ParagraphChild::Run(run) => {
                for run_child in &run.children {
                    match run_child {
                        RunChild::Text(t) => out.push_str(&t.text),
                        RunChild::Tab(_) => out.push('\t'),
                        RunChild::Break(_) => out.push('\n'),
                        _ => {}
                    }
                }
            }
            ParagraphChild::Hyperlink(link) => push_paragraph_text(&link.children, out),
            _ => {}
        }
    }
}

fn extract_txt(bytes: &[u8]) -> Result<String, String> {
    String::from_utf8(bytes.to_vec()).map_err(|e| e.to_string())
}

/// Packs paragraphs into an in-memory .docx; shared by tests across modules.
#[cfg(test)]
pub(crate) fn docx_fixture(paragraphs: &[&str]) -> Vec<u8> {
    use docx_rs::{Docx, Paragraph, Run};
    use std::io::Cursor;

    let docx = paragraphs.iter().fold(Docx::new(), |doc, p| {
        doc.add_paragraph(Paragraph::new().add_run(Run::new().add_text(*p)))
    });
    let mut buf = Cursor::new(Vec::new());
    docx.build().pack(&mut buf).unwrap();
    buf.into_inner()
}
