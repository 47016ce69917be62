//! Document enrichment and role tagging.
//!
//! Classifies each ingested file by filename and source container into a
//! document type, legal category, and role allow-list, then builds the
//! [`DocumentRecord`] uploaded to the search index.
//!
//! Classification is an ordered rule table evaluated top to bottom; the
//! first matching rule wins. Keeping the rules in one table (rather than
//! nested conditionals) makes precedence auditable: reordering the table
//! is the only way to change which rule fires.

use crate::models::{DocumentRecord, DocumentType, EMBEDDING_DIMS};

/// Default allow-list for documents with no specific restrictions.
pub const DEFAULT_ALLOWED_ROLES: &[&str] = &["public", "client", "admin"];

/// Maximum summary length before truncation.
const SUMMARY_MAX_CHARS: usize = 500;

/// One entry in the classification table.
struct TagRule {
    /// Decides whether this rule applies to `(filename, container)`,
    /// both already lowercased.
    matches: fn(&str, &str) -> bool,
    document_type: DocumentType,
    legal_category: &'static str,
    allowed_roles: &'static [&'static str],
}

/// Classification rules, in precedence order. First match wins.
const TAG_RULES: &[TagRule] = &[
    // Empty Georgia Probate Court standard forms. No owner or case can be
    // extracted from a blank form, so access follows the document class.
    TagRule {
        matches: |filename, container| filename.contains("gpcsf") && container == "gpcsf-forms",
        document_type: DocumentType::ProbateStandardForm,
        legal_category: "probate_template",
        allowed_roles: &["public", "legal_professional"],
    },
    // O.C.G.A. statute text: public reference material.
    TagRule {
        matches: |filename, container| {
            filename.contains("ocga_sections") || container == "legal-statutes"
        },
        document_type: DocumentType::LegalStatute,
        legal_category: "statute",
        allowed_roles: &["public"],
    },
    // Tax records are sensitive by default.
    TagRule {
        matches: |filename, container| {
            filename.contains("tax_bill_data") || container == "tax-data"
        },
        document_type: DocumentType::TaxRecord,
        legal_category: "tax",
        allowed_roles: &["admin", "tax_analyst"],
    },
    // Anything in the sensitive-heir container is restricted regardless of name.
    TagRule {
        matches: |_filename, container| container == "sensitive-heir-data",
        document_type: DocumentType::SensitiveHeirFiling,
        legal_category: "sensitive",
        allowed_roles: &["admin", "specific_legal_team_heir"],
    },
];

/// Enrich an extracted file into a [`DocumentRecord`] with RBAC tags.
///
/// Pure and deterministic: the same `(filename, content, container)` always
/// yields the same record, so re-ingestion upserts cleanly by id.
pub fn enrich_and_tag(filename: &str, content: &str, container: &str) -> DocumentRecord {
    let filename_lower = filename.to_lowercase();
    let container_lower = container.to_lowercase();

    let (document_type, legal_category, allowed_roles) = TAG_RULES
        .iter()
        .find(|rule| (rule.matches)(&filename_lower, &container_lower))
        .map(|rule| (rule.document_type, rule.legal_category, rule.allowed_roles))
        .unwrap_or((DocumentType::Unknown, "general", DEFAULT_ALLOWED_ROLES));

    DocumentRecord {
        id: document_id(filename),
        filename: filename.to_string(),
        filepath: format!("azblob://{}/{}", container, filename),
        document_type,
        content: content.to_string(),
        summary: summarize(content),
        legal_category: legal_category.to_string(),
        tax_redemption_period_days: None,
        effective_date: None,
        // Blank forms carry no owner or case; filled-form field extraction
        // would populate these.
        owner_id: None,
        case_id: None,
        allowed_roles: allowed_roles.iter().map(|r| r.to_string()).collect(),
        content_vector: vec![0.0; EMBEDDING_DIMS],
    }
}

/// Derive a search-index key from a filename.
///
/// Index keys may not contain dots or slashes; both map to underscores.
pub fn document_id(filename: &str) -> String {
    filename.replace(['.', '/'], "_").to_lowercase()
}

/// First [`SUMMARY_MAX_CHARS`] characters of `content`, marked when truncated.
pub fn summarize(content: &str) -> String {
    let mut chars = content.char_indices();
    match chars.nth(SUMMARY_MAX_CHARS) {
        Some((byte_idx, _)) => format!("{}...", &content[..byte_idx]),
        None => content.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gpcsf_form_in_forms_container() {
        let record = enrich_and_tag("gpcsf_2.pdf", "PETITION FOR LETTERS", "gpcsf-forms");
        assert_eq!(record.document_type, DocumentType::ProbateStandardForm);
        assert_eq!(record.legal_category, "probate_template");
        assert_eq!(record.allowed_roles, vec!["public", "legal_professional"]);
        assert_eq!(record.id, "gpcsf_2_pdf");
        assert_eq!(record.filepath, "azblob://gpcsf-forms/gpcsf_2.pdf");
        assert!(record.owner_id.is_none());
        assert!(record.case_id.is_none());
    }

    #[test]
    fn gpcsf_filename_outside_forms_container_is_not_a_form() {
        // Rule 1 requires both the filename and the container to match.
        let record = enrich_and_tag("gpcsf_2.pdf", "text", "misc-uploads");
        assert_eq!(record.document_type, DocumentType::Unknown);
        assert_eq!(record.legal_category, "general");
    }

    #[test]
    fn statute_by_filename() {
        let record = enrich_and_tag("ocga_sections.txt", "O.C.G.A. 53-2-1 ...", "legal-statutes");
        assert_eq!(record.document_type, DocumentType::LegalStatute);
        assert_eq!(record.allowed_roles, vec!["public"]);
    }

    #[test]
    fn statute_by_container_alone() {
        let record = enrich_and_tag("title_53.txt", "text", "legal-statutes");
        assert_eq!(record.document_type, DocumentType::LegalStatute);
    }

    #[test]
    fn tax_record_restricted_roles() {
        let record = enrich_and_tag("tax_bill_data.csv", "parcel,owner,amount", "tax-data");
        assert_eq!(record.document_type, DocumentType::TaxRecord);
        assert_eq!(record.allowed_roles, vec!["admin", "tax_analyst"]);
    }

    #[test]
    fn sensitive_container_never_public() {
        let record = enrich_and_tag("heir_filing_17.pdf", "text", "sensitive-heir-data");
        assert_eq!(record.document_type, DocumentType::SensitiveHeirFiling);
        assert!(!record.allowed_roles.iter().any(|r| r == "public"));
        assert_eq!(
            record.allowed_roles,
            vec!["admin", "specific_legal_team_heir"]
        );
    }

    #[test]
    fn unmatched_falls_back_to_default_roles() {
        let record = enrich_and_tag("notes.txt", "misc", "scratch");
        assert_eq!(record.document_type, DocumentType::Unknown);
        assert_eq!(record.allowed_roles, DEFAULT_ALLOWED_ROLES);
        assert!(!record.allowed_roles.is_empty());
    }

    #[test]
    fn filename_rules_beat_later_container_rules() {
        // A tax_bill_data file sitting in the sensitive container: rule 3
        // precedes rule 4, so it tags as a tax record.
        let record = enrich_and_tag("tax_bill_data.csv", "text", "sensitive-heir-data");
        assert_eq!(record.document_type, DocumentType::TaxRecord);
    }

    #[test]
    fn matching_is_case_insensitive() {
        let record = enrich_and_tag("GPCSF_5.PDF", "text", "GPCSF-Forms");
        assert_eq!(record.document_type, DocumentType::ProbateStandardForm);
    }

    #[test]
    fn tagging_is_idempotent() {
        let a = enrich_and_tag("gpcsf_3.pdf", "form body", "gpcsf-forms");
        let b = enrich_and_tag("gpcsf_3.pdf", "form body", "gpcsf-forms");
        assert_eq!(serde_json::to_value(&a).unwrap(), serde_json::to_value(&b).unwrap());
    }

    #[test]
    fn short_content_summary_is_content() {
        let content = "x".repeat(500);
        assert_eq!(summarize(&content), content);
    }

    #[test]
    fn long_content_summary_truncates_with_marker() {
        let content = "y".repeat(501);
        let summary = summarize(&content);
        assert_eq!(summary.len(), 503);
        assert!(summary.ends_with("..."));
        assert_eq!(&summary[..500], &content[..500]);
    }

    #[test]
    fn summary_truncation_respects_char_boundaries() {
        let content = "é".repeat(600);
        let summary = summarize(&content);
        assert_eq!(summary.chars().count(), 503);
        assert!(summary.ends_with("..."));
    }

    #[test]
    fn document_id_replaces_dots_and_slashes() {
        assert_eq!(document_id("forms/GPCSF_2.pdf"), "forms_gpcsf_2_pdf");
    }

    #[test]
    fn zero_vector_placeholder_has_index_dims() {
        let record = enrich_and_tag("notes.txt", "misc", "scratch");
        assert_eq!(record.content_vector.len(), EMBEDDING_DIMS);
        assert!(record.content_vector.iter().all(|v| *v == 0.0));
    }
}
