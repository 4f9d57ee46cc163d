use crate::db::DatabaseError;
use serde::{Deserialize, Serialize};

/// Macro to generate enum with as_str + std::str::FromStr pattern.
/// The string form doubles as the serde representation.
macro_rules! str_enum {
    ($name:ident { $($variant:ident => $s:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub enum $name {
            $(#[serde(rename = $s)] $variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $s),+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = DatabaseError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($s => Ok(Self::$variant)),+,
                    _ => Err(DatabaseError::InvalidEnum {
                        field: stringify!($name).into(),
                        value: s.into(),
                    }),
                }
            }
        }
    };
}

str_enum!(JobStatus {
    Pending => "PENDING",
    Processing => "PROCESSING",
    Done => "DONE",
    Error => "ERROR",
});

impl JobStatus {
    /// `DONE` and `ERROR` are final.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Error)
    }

    /// Lifecycle is `PENDING → PROCESSING → DONE | ERROR`. A pending job may
    /// also fail directly (e.g. the store rejects the processing update).
    pub fn can_transition_to(&self, next: JobStatus) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Processing)
                | (Self::Pending, Self::Error)
                | (Self::Processing, Self::Done)
                | (Self::Processing, Self::Error)
        )
    }
}

str_enum!(DocumentCategory {
    Proposal => "proposal",
    NoticeToAppear => "notice_to_appear",
    MotionBrief => "motion_brief",
    AdjudicatorDecision => "adjudicator_decision",
    GovernmentForm => "government_form",
    CountryConditions => "country_conditions",
    Administrative => "administrative",
});

impl DocumentCategory {
    pub const ALL: [DocumentCategory; 7] = [
        Self::Proposal,
        Self::NoticeToAppear,
        Self::MotionBrief,
        Self::AdjudicatorDecision,
        Self::GovernmentForm,
        Self::CountryConditions,
        Self::Administrative,
    ];

    /// Human-readable name used in reasoning strings and synthetic text.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Proposal => "proposal / funding request",
            Self::NoticeToAppear => "notice to appear",
            Self::MotionBrief => "motion or brief",
            Self::AdjudicatorDecision => "adjudicator decision",
            Self::GovernmentForm => "government form",
            Self::CountryConditions => "country-conditions report",
            Self::Administrative => "administrative / other",
        }
    }
}

str_enum!(MediaKind {
    Pdf => "pdf",
    PlainText => "plain_text",
    Other => "other",
});

str_enum!(ExtractionMethod {
    PdfTextLayer => "pdf_text_layer",
    PdfObjectText => "pdf_object_text",
    Utf8Decode => "utf8_decode",
    LossyDecode => "lossy_decode",
    SyntheticFallback => "synthetic_fallback",
});

str_enum!(TextOrigin {
    Extracted => "extracted",
    Corrupted => "corrupted",
    Synthetic => "synthetic",
});

str_enum!(CorruptionSignal {
    Sentinel => "sentinel",
    LowAlphabeticRatio => "low_alphabetic_ratio",
    NoiseRuns => "noise_runs",
    RepeatedShortTokens => "repeated_short_tokens",
    UnrecognizableWords => "unrecognizable_words",
});

str_enum!(FindingSource {
    Matched => "matched",
    Canned => "canned",
});

str_enum!(PiiKind {
    Ssn => "ssn",
    AlienNumber => "alien_number",
    CreditCard => "credit_card",
    Phone => "phone",
    Email => "email",
    DriversLicense => "drivers_license",
    StreetAddress => "street_address",
});

str_enum!(QuestionIntent {
    Timeline => "timeline",
    Payment => "payment",
    Terms => "terms",
    Scope => "scope",
    Summary => "summary",
    General => "general",
});

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn job_status_round_trips_through_str() {
        for status in [
            JobStatus::Pending,
            JobStatus::Processing,
            JobStatus::Done,
            JobStatus::Error,
        ] {
            assert_eq!(JobStatus::from_str(status.as_str()).unwrap(), status);
        }
    }

    #[test]
    fn invalid_enum_value_is_rejected() {
        let err = DocumentCategory::from_str("contract").unwrap_err();
        assert!(matches!(err, DatabaseError::InvalidEnum { .. }));
    }

    #[test]
    fn serde_uses_string_form() {
        let json = serde_json::to_string(&JobStatus::Processing).unwrap();
        assert_eq!(json, "\"PROCESSING\"");
        let back: DocumentCategory = serde_json::from_str("\"notice_to_appear\"").unwrap();
        assert_eq!(back, DocumentCategory::NoticeToAppear);
    }

    #[test]
    fn lifecycle_is_monotonic() {
        assert!(JobStatus::Pending.can_transition_to(JobStatus::Processing));
        assert!(JobStatus::Processing.can_transition_to(JobStatus::Done));
        assert!(JobStatus::Processing.can_transition_to(JobStatus::Error));
        assert!(!JobStatus::Done.can_transition_to(JobStatus::Processing));
        assert!(!JobStatus::Error.can_transition_to(JobStatus::Done));
        assert!(!JobStatus::Processing.can_transition_to(JobStatus::Pending));
        assert!(!JobStatus::Done.can_transition_to(JobStatus::Done));
    }

    #[test]
    fn every_category_has_a_label() {
        for category in DocumentCategory::ALL {
            assert!(!category.label().is_empty());
        }
    }
}
