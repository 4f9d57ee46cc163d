use std::sync::LazyLock;

use regex::Regex;

use crate::models::DocumentCategory;

/// Keyword evidence for one category.
///
/// Content terms are lowercase phrases with a weight. Filename terms are
/// matched against the file name with separators turned into spaces.
pub struct CategoryRule {
    pub category: DocumentCategory,
    pub content_terms: &'static [(&'static str, f32)],
    pub filename_terms: &'static [&'static str],
}

/// Document-shape evidence that plain keywords miss.
pub struct StructuralMarker {
    pub category: DocumentCategory,
    pub regex: Regex,
    pub weight: f32,
    pub label: &'static str,
}

pub static CATEGORY_RULES: &[CategoryRule] = &[
    CategoryRule {
        category: DocumentCategory::Proposal,
        content_terms: &[
            ("grant", 1.0),
            ("funding", 1.0),
            ("proposal", 1.0),
            ("budget", 0.8),
            ("matching funds", 1.0),
            ("cost share", 0.8),
            ("indirect costs", 0.8),
            ("program income", 0.8),
            ("request for proposals", 1.0),
            ("notice of funding opportunity", 1.0),
            ("award", 0.6),
            ("applicant", 0.5),
            ("deliverables", 0.6),
            ("sustainability", 0.4),
            ("objectives", 0.4),
        ],
        filename_terms: &["proposal", "grant", "budget", "rfp", "nofo", "funding"],
    },
    CategoryRule {
        category: DocumentCategory::NoticeToAppear,
        content_terms: &[
            ("notice to appear", 2.0),
            ("form i-862", 2.0),
            ("removal proceedings", 1.5),
            ("you are ordered to appear", 1.5),
            ("inadmissible", 1.0),
            ("removable", 1.0),
            ("immigration judge", 0.8),
            ("department of homeland security", 0.8),
            ("alleged", 0.6),
            ("alien", 0.6),
            ("charge", 0.5),
        ],
        filename_terms: &["nta", "notice to appear", "i 862", "i862"],
    },
    CategoryRule {
        category: DocumentCategory::MotionBrief,
        content_terms: &[
            ("motion to reopen", 1.5),
            ("motion to reconsider", 1.5),
            ("memorandum of law", 1.2),
            ("motion", 1.0),
            ("wherefore", 1.0),
            ("prayer for relief", 1.0),
            ("certificate of service", 1.0),
            ("brief", 0.8),
            ("respectfully", 0.8),
            ("in support of", 0.6),
            ("argument", 0.6),
            ("counsel for", 0.6),
        ],
        filename_terms: &["motion", "brief", "mtr"],
    },
    CategoryRule {
        category: DocumentCategory::AdjudicatorDecision,
        content_terms: &[
            ("order of the immigration judge", 2.0),
            ("it is hereby ordered", 1.5),
            ("findings of fact", 1.2),
            ("conclusions of law", 1.2),
            ("oral decision", 1.2),
            ("ordered that", 1.0),
            ("board of immigration appeals", 1.0),
            ("the court finds", 1.0),
            ("decision", 0.6),
            ("granted", 0.6),
            ("denied", 0.6),
            ("appeal", 0.6),
        ],
        filename_terms: &["decision", "order", "ruling", "ij"],
    },
    CategoryRule {
        category: DocumentCategory::GovernmentForm,
        content_terms: &[
            ("for uscis use only", 2.0),
            ("omb no", 1.5),
            ("signature of applicant", 1.2),
            ("edition date", 1.2),
            ("form i-", 1.2),
            ("uscis", 1.0),
            ("applicant information", 1.0),
            ("check one", 0.8),
            ("instructions", 0.6),
            ("part 1", 0.6),
        ],
        filename_terms: &["form", "uscis", "i 589", "i589", "i 130", "i 765", "g 28"],
    },
    CategoryRule {
        category: DocumentCategory::CountryConditions,
        content_terms: &[
            ("country conditions", 2.0),
            ("country report", 1.5),
            ("human rights", 1.2),
            ("state department", 1.0),
            ("human rights watch", 1.0),
            ("amnesty international", 1.0),
            ("persecution", 0.8),
            ("security forces", 0.8),
            ("refugees", 0.6),
            ("ngo", 0.6),
            ("minority", 0.4),
        ],
        filename_terms: &["country", "conditions", "human rights"],
    },
    CategoryRule {
        category: DocumentCategory::Administrative,
        content_terms: &[
            ("agenda", 0.8),
            ("invoice", 0.8),
            ("meeting minutes", 0.8),
            ("memo", 0.6),
            ("correspondence", 0.6),
            ("staff", 0.4),
            ("policy", 0.4),
        ],
        filename_terms: &["memo", "invoice", "letter", "minutes", "agenda"],
    },
];

pub static STRUCTURAL_MARKERS: LazyLock<Vec<StructuralMarker>> = LazyLock::new(|| {
    vec![
        StructuralMarker {
            category: DocumentCategory::Proposal,
            regex: Regex::new(r"\$\s?\d[\d,]*(?:\.\d{2})?|\bUSD\s?\d[\d,]*").unwrap(),
            weight: 1.0,
            label: "monetary amount",
        },
        StructuralMarker {
            category: DocumentCategory::Proposal,
            regex: Regex::new(r"(?i)\b(?:project|performance|grant|budget|award)\s+period\b|\bperiod\s+of\s+performance\b|\bfor\s+the\s+period\b").unwrap(),
            weight: 1.0,
            label: "project period language",
        },
        StructuralMarker {
            category: DocumentCategory::Proposal,
            regex: Regex::new(r"(?i)\b2\s*C\.?F\.?R\.?\s*(?:part\s*)?200\b|\buniform\s+guidance\b").unwrap(),
            weight: 1.5,
            label: "federal grant regulation citation",
        },
        StructuralMarker {
            category: DocumentCategory::NoticeToAppear,
            regex: Regex::new(r"(?i)\byou\s+are\s+(?:an?\s+)?(?:arriving\s+alien|alien|removable|subject\s+to\s+removal)\b|\bon\s+the\s+basis\s+of\s+the\s+following\s+allegations\b|\bsection\s+(?:212|237)\(a\)").unwrap(),
            weight: 1.5,
            label: "charging language",
        },
        StructuralMarker {
            category: DocumentCategory::NoticeToAppear,
            regex: Regex::new(r"(?i)\b(?:master\s+calendar|individual)\s+hearing\b|\bhearing\s+(?:date|time|location)\b|\bappear\s+before\s+an\s+immigration\s+judge\b").unwrap(),
            weight: 1.0,
            label: "hearing or venue language",
        },
        StructuralMarker {
            category: DocumentCategory::MotionBrief,
            regex: Regex::new(r"(?i)\b(?:comes\s+now|respectfully\s+(?:submits|moves|requests)|hereby\s+moves)\b").unwrap(),
            weight: 1.5,
            label: "filing language",
        },
        StructuralMarker {
            category: DocumentCategory::AdjudicatorDecision,
            regex: Regex::new(r"(?i)\bit\s+is\s+(?:hereby|further)\s+ordered\b|\bis\s+hereby\s+(?:granted|denied)\b|\bapplication\b.{0,40}\bis\s+(?:granted|denied)\b").unwrap(),
            weight: 1.5,
            label: "decision language",
        },
        StructuralMarker {
            category: DocumentCategory::GovernmentForm,
            regex: Regex::new(r"(?i)\bform\s+[a-z]-\d{2,4}[a-z]?\b|\bOMB\s+No\.?\s*\d{4}-\d{4}\b").unwrap(),
            weight: 1.5,
            label: "form number",
        },
        StructuralMarker {
            category: DocumentCategory::CountryConditions,
            regex: Regex::new(r"(?i)\bcountry\s+reports?\s+on\s+human\s+rights\s+practices\b|\bhuman\s+rights\s+(?:report|situation)\b|\bthe\s+government\s+(?:of|in)\s+\w+\s+(?:did\s+not|failed\s+to)\b").unwrap(),
            weight: 1.5,
            label: "country-report language",
        },
    ]
});

/// A case caption such as `Smith v. Jones`.
pub static COURT_CAPTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b[A-Z][A-Za-z'&-]+(?:\s+[A-Z][A-Za-z'&-]+)*,?\s+vs?\.\s+[A-Z][A-Za-z'&-]+").unwrap()
});

/// Vocabulary that places a document in litigation rather than funding.
pub const LITIGATION_TERMS: &[&str] = &[
    "plaintiff",
    "defendant",
    "petitioner",
    "appellant",
    "appellee",
    "docket",
    "opinion of the court",
    "order granting",
];

/// Distinct litigation terms needed to override funding vocabulary.
pub const LITIGATION_TERMS_REQUIRED: usize = 2;

/// Lowercase the file name and turn separators into spaces
/// (`Notice_To-Appear.pdf` → `notice to appear pdf`).
pub fn normalize_file_name(file_name: &str) -> String {
    file_name
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}
