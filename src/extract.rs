//! Text extraction dispatch for ingested files.
//!
//! The pipeline branches on file extension: PDFs go through document
//! analysis (remote service or in-process fallback), text and CSV files are
//! decoded as UTF-8 with invalid sequences replaced. Unsupported extensions
//! and failed extractions are skippable errors; the pipeline logs and moves on.

/// File extensions the ingestion pipeline accepts.
pub const SUPPORTED_EXTENSIONS: &[&str] = &["pdf", "txt", "csv"];

/// The extraction strategy for a given blob name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractKind {
    Pdf,
    Text,
}

/// Extraction error. No panic; the pipeline skips the file.
#[derive(Debug)]
pub enum ExtractError {
    UnsupportedExtension(String),
    Pdf(String),
}

impl std::fmt::Display for ExtractError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExtractError::UnsupportedExtension(name) => {
                write!(f, "unsupported file type: {}", name)
            }
            ExtractError::Pdf(e) => write!(f, "PDF extraction failed: {}", e),
        }
    }
}

impl std::error::Error for ExtractError {}

/// Classify a blob name by extension.
pub fn classify(blob_name: &str) -> Result<ExtractKind, ExtractError> {
    let lower = blob_name.to_lowercase();
    match lower.rsplit('.').next() {
        Some("pdf") => Ok(ExtractKind::Pdf),
        Some("txt" | "csv") => Ok(ExtractKind::Text),
        _ => Err(ExtractError::UnsupportedExtension(blob_name.to_string())),
    }
}

/// Decode text/CSV bytes, replacing invalid UTF-8 sequences.
pub fn decode_text(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).to_string()
}

/// Extract PDF text in-process (`document_analysis.mode = "local"`).
pub fn extract_pdf_local(bytes: &[u8]) -> Result<String, ExtractError> {
    pdf_extract::extract_text_from_mem(bytes).map_err(|e| ExtractError::Pdf(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pdf_extension_classified() {
        assert_eq!(classify("gpcsf_2.pdf").unwrap(), ExtractKind::Pdf);
        assert_eq!(classify("GPCSF_2.PDF").unwrap(), ExtractKind::Pdf);
    }

    #[test]
    fn txt_and_csv_classified_as_text() {
        assert_eq!(classify("ocga_sections.txt").unwrap(), ExtractKind::Text);
        assert_eq!(classify("tax_bill_data.csv").unwrap(), ExtractKind::Text);
    }

    #[test]
    fn unsupported_extension_returns_error() {
        let err = classify("scan.docx").unwrap_err();
        assert!(matches!(err, ExtractError::UnsupportedExtension(_)));
        let err = classify("no_extension").unwrap_err();
        assert!(matches!(err, ExtractError::UnsupportedExtension(_)));
    }

    #[test]
    fn decode_replaces_invalid_utf8() {
        let bytes = b"O.C.G.A. \xff 53-2-1";
        let text = decode_text(bytes);
        assert!(text.starts_with("O.C.G.A. "));
        assert!(text.contains('\u{FFFD}'));
    }

    #[test]
    fn invalid_pdf_returns_error() {
        let err = extract_pdf_local(b"not a pdf").unwrap_err();
        assert!(matches!(err, ExtractError::Pdf(_)));
    }

    /// Minimal valid PDF containing one text phrase. Body objects are laid
    /// out first so the xref table can carry correct byte offsets.
    fn minimal_pdf(phrase: &str) -> Vec<u8> {
        let stream = format!("BT /F1 12 Tf 100 700 Td ({}) Tj ET\n", phrase);
        let mut out = Vec::new();
        out.extend_from_slice(b"%PDF-1.4\n");
        let o1 = out.len();
        out.extend_from_slice(b"1 0 obj << /Type /Catalog /Pages 2 0 R >> endobj\n");
        let o2 = out.len();
        out.extend_from_slice(b"2 0 obj << /Type /Pages /Kids [3 0 R] /Count 1 >> endobj\n");
        let o3 = out.len();
        out.extend_from_slice(b"3 0 obj << /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] /Contents 4 0 R /Resources << /Font << /F1 5 0 R >> >> >> endobj\n");
        let o4 = out.len();
        out.extend_from_slice(
            format!(
                "4 0 obj << /Length {} >> stream\n{}endstream endobj\n",
                stream.len(),
                stream
            )
            .as_bytes(),
        );
        let o5 = out.len();
        out.extend_from_slice(
            b"5 0 obj << /Type /Font /Subtype /Type1 /BaseFont /Helvetica >> endobj\n",
        );
        let xref_start = out.len();
        out.extend_from_slice(b"xref\n0 6\n");
        out.extend_from_slice(format!("{:010} 65535 f \n", 0).as_bytes());
        for offset in [o1, o2, o3, o4, o5] {
            out.extend_from_slice(format!("{:010} 00000 n \n", offset).as_bytes());
        }
        out.extend_from_slice(b"trailer << /Size 6 /Root 1 0 R >>\nstartxref\n");
        out.extend_from_slice(format!("{}\n", xref_start).as_bytes());
        out.extend_from_slice(b"%%EOF\n");
        out
    }

    #[test]
    fn local_pdf_extraction_reads_text() {
        let pdf = minimal_pdf("letters of administration");
        let text = extract_pdf_local(&pdf).unwrap();
        assert!(text.contains("letters of administration"));
    }
}
