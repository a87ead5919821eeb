//! PDF receipt rendering.
//!
//! # Documents
//!
//! - [`donation`] - one-donation tax receipt (`RT-{year}-{ID}`)
//! - [`annual`] - per-donor yearly summary (`AN-{year}-{id}`)
//!
//! Rendering is pure: both layouts return PDF bytes, uploading is done by
//! [`crate::services`].

pub mod annual;
pub mod donation;
pub mod pdf;

use thiserror::Error;

use crate::db::RepositoryError;
use crate::supabase::SupabaseError;

/// Errors that can occur while producing a PDF.
#[derive(Debug, Error)]
pub enum PdfError {
    /// `lopdf` failed to encode or write the document.
    #[error("PDF encoding error: {0}")]
    Encode(#[from] lopdf::Error),

    /// Writing the encoded document to the buffer failed.
    #[error("PDF write error: {0}")]
    Write(#[from] std::io::Error),
}

/// Errors that can occur while generating and storing a receipt.
#[derive(Debug, Error)]
pub enum ReceiptError {
    /// Rendering failed.
    #[error("PDF error: {0}")]
    Pdf(#[from] PdfError),

    /// Upload or URL signing failed.
    #[error("Storage error: {0}")]
    Storage(#[from] SupabaseError),

    /// Reading donations or writing the tax receipt failed.
    #[error("Database error: {0}")]
    Repository(#[from] RepositoryError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_failure_is_pdf_error() {
        let err: PdfError = std::io::Error::other("disk full").into();
        assert_eq!(err.to_string(), "PDF write error: disk full");
        let err: ReceiptError = err.into();
        assert_eq!(err.to_string(), "PDF error: PDF write error: disk full");
    }
}
