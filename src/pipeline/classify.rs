//! Heuristic document-type classification.
//!
//! Pure keyword-weight scoring over the extracted text: each document type
//! has a table of indicator phrases; every phrase found in the lowercased
//! text adds its weight to that type's score; the highest score wins, capped
//! at 1.0. A best score under the confidence floor falls back to
//! [`DocumentType::Other`].
//!
//! Vietnamese documents arrive with or without diacritics depending on the
//! OCR pass, so most phrases are listed in diacritic, ASCII-folded, and
//! English variants.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The document categories the heuristics distinguish.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentType {
    Invoice,
    Contract,
    Blueprint,
    Certificate,
    Receipt,
    Other,
}

impl DocumentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentType::Invoice => "invoice",
            DocumentType::Contract => "contract",
            DocumentType::Blueprint => "blueprint",
            DocumentType::Certificate => "certificate",
            DocumentType::Receipt => "receipt",
            DocumentType::Other => "other",
        }
    }
}

impl fmt::Display for DocumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classification outcome: winning type, capped confidence, and the
/// indicator phrases that fired (in discovery order, deduplicated).
#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    pub doc_type: DocumentType,
    pub confidence: f32,
    pub keywords: Vec<String>,
}

type KeywordTable = &'static [(&'static str, f32)];

const INVOICE_KEYWORDS: KeywordTable = &[
    // Main invoice terms
    ("hóa đơn", 0.35),
    ("hoá đơn", 0.35),
    ("hoa don", 0.35),
    ("invoice", 0.35),
    ("hóa đơn gtgt", 0.4),
    ("hóa đơn vat", 0.4),
    // Tax terms
    ("vat", 0.25),
    ("gtgt", 0.25),
    ("thuế", 0.15),
    ("thue", 0.15),
    ("mst", 0.2),
    ("mã số thuế", 0.2),
    ("ma so thue", 0.2),
    ("tax code", 0.2),
    // Payment terms
    ("thành tiền", 0.12),
    ("thanh tien", 0.12),
    ("tổng cộng", 0.12),
    ("tong cong", 0.12),
    ("total", 0.12),
    ("tổng tiền", 0.12),
    ("tong tien", 0.12),
    ("tiền thuế", 0.1),
    ("tien thue", 0.1),
    ("cộng tiền hàng", 0.1),
    ("cong tien hang", 0.1),
];

const CONTRACT_KEYWORDS: KeywordTable = &[
    // Main contract terms
    ("hợp đồng", 0.45),
    ("hop dong", 0.45),
    ("contract", 0.45),
    ("hợp đồng thế chấp", 0.5),
    ("hop dong the chap", 0.5),
    ("hợp đồng tín dụng", 0.5),
    ("hop dong tin dung", 0.5),
    // Parties
    ("bên a", 0.3),
    ("ben a", 0.3),
    ("party a", 0.3),
    ("bên b", 0.3),
    ("ben b", 0.3),
    ("party b", 0.3),
    ("bên thế chấp", 0.3),
    ("ben the chap", 0.3),
    ("bên vay", 0.25),
    ("ben vay", 0.25),
    ("bên cho vay", 0.25),
    ("ben cho vay", 0.25),
    ("người đại diện", 0.2),
    ("nguoi dai dien", 0.2),
    // Legal structure
    ("điều khoản", 0.2),
    ("dieu khoan", 0.2),
    ("clause", 0.2),
    ("điều 1", 0.15),
    ("dieu 1", 0.15),
    ("quyền và nghĩa vụ", 0.25),
    ("quyen va nghia vu", 0.25),
    ("thỏa thuận", 0.15),
    ("thoa thuan", 0.15),
    ("agreement", 0.15),
    ("cam kết", 0.15),
    ("cam ket", 0.15),
    // Signatures
    ("chữ ký", 0.12),
    ("chu ky", 0.12),
    ("signature", 0.12),
    ("ký kết", 0.15),
    ("ky ket", 0.15),
    ("đại diện pháp luật", 0.2),
    ("dai dien phap luat", 0.2),
    // Common phrases
    ("cơ sở pháp lý", 0.1),
    ("co so phap ly", 0.1),
    ("hiệu lực", 0.1),
    ("hieu luc", 0.1),
];

const BLUEPRINT_KEYWORDS: KeywordTable = &[
    ("bản vẽ", 0.4),
    ("ban ve", 0.4),
    ("blueprint", 0.4),
    ("tỷ lệ", 0.2),
    ("ty le", 0.2),
    ("scale", 0.2),
    ("kích thước", 0.15),
    ("dimension", 0.15),
    ("mặt cắt", 0.1),
    ("section", 0.1),
];

const CERTIFICATE_KEYWORDS: KeywordTable = &[
    ("chứng nhận", 0.4),
    ("chung nhan", 0.4),
    ("certificate", 0.4),
    ("giấy chứng nhận", 0.4),
    ("certification", 0.4),
    ("cấp cho", 0.15),
    ("issued to", 0.15),
    ("có giá trị", 0.1),
    ("valid until", 0.1),
];

const RECEIPT_KEYWORDS: KeywordTable = &[
    ("biên lai", 0.4),
    ("bien lai", 0.4),
    ("receipt", 0.4),
    ("phiếu thu", 0.3),
    ("phieu thu", 0.3),
    ("đã nhận", 0.15),
    ("da nhan", 0.15),
    ("received", 0.15),
];

/// A best score below this floor is reported as `Other`.
const MIN_CONFIDENCE: f32 = 0.3;

/// Confidence assigned to the `Other` fallback.
const OTHER_CONFIDENCE: f32 = 0.5;

/// Classify a document from its extracted text.
pub fn classify(text: &str) -> Classification {
    let lower = text.to_lowercase();
    let mut keywords = Vec::new();

    let scored: [(DocumentType, f32); 5] = [
        (
            DocumentType::Invoice,
            score(&lower, INVOICE_KEYWORDS, &mut keywords),
        ),
        (
            DocumentType::Contract,
            score(&lower, CONTRACT_KEYWORDS, &mut keywords),
        ),
        (
            DocumentType::Blueprint,
            score(&lower, BLUEPRINT_KEYWORDS, &mut keywords),
        ),
        (
            DocumentType::Certificate,
            score(&lower, CERTIFICATE_KEYWORDS, &mut keywords),
        ),
        (
            DocumentType::Receipt,
            score(&lower, RECEIPT_KEYWORDS, &mut keywords),
        ),
    ];

    // Highest score wins; earlier entries win ties.
    let (doc_type, best) = scored
        .into_iter()
        .fold((DocumentType::Other, 0.0_f32), |best, cur| {
            if cur.1 > best.1 {
                cur
            } else {
                best
            }
        });

    let confidence = best.min(1.0);
    if confidence < MIN_CONFIDENCE {
        Classification {
            doc_type: DocumentType::Other,
            confidence: OTHER_CONFIDENCE,
            keywords,
        }
    } else {
        Classification {
            doc_type,
            confidence,
            keywords,
        }
    }
}

fn score(text: &str, table: KeywordTable, found: &mut Vec<String>) -> f32 {
    let mut total = 0.0;
    for (keyword, weight) in table {
        if text.contains(keyword) {
            total += weight;
            if !found.iter().any(|k| k == keyword) {
                found.push((*keyword).to_string());
            }
        }
    }
    total
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vietnamese_invoice_is_detected() {
        let text = "HÓA ĐƠN GTGT\nMã số thuế: 0312345678\nThành tiền: 1.200.000\nTổng cộng: 1.320.000";
        let c = classify(text);
        assert_eq!(c.doc_type, DocumentType::Invoice);
        assert!(c.confidence >= MIN_CONFIDENCE);
        assert!(c.keywords.iter().any(|k| k == "hóa đơn"));
    }

    #[test]
    fn ascii_folded_contract_is_detected() {
        let text = "HOP DONG TIN DUNG\nBen A: Ngan hang X\nBen B: Cong ty Y\nDieu 1. Quyen va nghia vu";
        let c = classify(text);
        assert_eq!(c.doc_type, DocumentType::Contract);
    }

    #[test]
    fn english_certificate_is_detected() {
        let text = "CERTIFICATE of completion\nThis certification is issued to Nguyen Van An\nValid until 2026";
        let c = classify(text);
        assert_eq!(c.doc_type, DocumentType::Certificate);
    }

    #[test]
    fn generic_text_falls_back_to_other() {
        let c = classify("Meeting notes from Tuesday. Coffee was fine.");
        assert_eq!(c.doc_type, DocumentType::Other);
        assert_eq!(c.confidence, OTHER_CONFIDENCE);
    }

    #[test]
    fn confidence_is_capped_at_one() {
        // Stack enough invoice phrases that the raw score exceeds 1.0.
        let text = "hóa đơn gtgt invoice vat gtgt mã số thuế tax code thành tiền tổng cộng total tổng tiền tiền thuế cộng tiền hàng";
        let c = classify(text);
        assert_eq!(c.doc_type, DocumentType::Invoice);
        assert!(c.confidence <= 1.0);
    }

    #[test]
    fn keywords_are_deduplicated() {
        let text = "invoice invoice invoice";
        let c = classify(text);
        assert_eq!(
            c.keywords.iter().filter(|k| k.as_str() == "invoice").count(),
            1
        );
    }
}
