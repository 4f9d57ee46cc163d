use std::sync::LazyLock;

use regex::Regex;

use crate::models::QuestionIntent;

/// Classify a question by keyword heuristics, checked in a fixed order.
pub fn classify_intent(question: &str) -> QuestionIntent {
    let lower = question.to_lowercase();

    if has_timeline_pattern(&lower) {
        return QuestionIntent::Timeline;
    }

    if has_payment_pattern(&lower) {
        return QuestionIntent::Payment;
    }

    if has_terms_pattern(&lower) {
        return QuestionIntent::Terms;
    }

    if has_scope_pattern(&lower) {
        return QuestionIntent::Scope;
    }

    if has_summary_pattern(&lower) {
        return QuestionIntent::Summary;
    }

    QuestionIntent::General
}

fn has_timeline_pattern(text: &str) -> bool {
    let patterns = [
        "when",
        "deadline",
        "due date",
        "what date",
        "which date",
        "how long",
        "how many days",
        "schedule",
        "hearing date",
        "period",
        "until",
        "expire",
        "start date",
        "end date",
    ];
    patterns.iter().any(|p| text.contains(p))
}

fn has_payment_pattern(text: &str) -> bool {
    let patterns = [
        "how much",
        "cost",
        "pay",
        "fee",
        "amount",
        "money",
        "budget",
        "fund",
        "price",
        "dollar",
        "salary",
        "rate",
    ];
    patterns.iter().any(|p| text.contains(p))
}

fn has_terms_pattern(text: &str) -> bool {
    let patterns = [
        "require",
        "obligat",
        "must",
        "shall",
        "condition",
        "comply",
        "complian",
        "regulation",
        "rule",
        "allowed",
        "permitted",
        "terms",
    ];
    patterns.iter().any(|p| text.contains(p))
}

fn has_scope_pattern(text: &str) -> bool {
    let patterns = [
        "responsib",
        "who will",
        "who is",
        "scope",
        "services",
        "deliverable",
        "duties",
        "tasks",
        "covered",
        "what will",
    ];
    patterns.iter().any(|p| text.contains(p))
}

fn has_summary_pattern(text: &str) -> bool {
    let patterns = [
        "summar",
        "overview",
        "what is this",
        "what's this",
        "about",
        "main point",
        "gist",
        "explain",
        "key points",
    ];
    patterns.iter().any(|p| text.contains(p))
}

static TIMELINE_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:January|February|March|April|May|June|July|August|September|October|November|December)\s+\d{1,2}\b|\b\d{1,2}/\d{1,2}/\d{4}\b|\b\d{4}-\d{2}-\d{2}\b|\b(?:deadline|due|no\s+later\s+than|within\s+\d+\s+days)\b").unwrap()
});

static PAYMENT_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\$\s?\d|\bUSD\s?\d|\b\d+(?:\.\d+)?\s?%").unwrap()
});

static TERMS_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:shall|must|required\s+to|pursuant\s+to|in\s+accordance\s+with|comply|complies)\b").unwrap()
});

static SCOPE_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:responsible\s+for|will\s+(?:provide|deliver|conduct|manage)|shall\s+(?:provide|deliver)|scope\s+of|duties)\b").unwrap()
});

/// Whether a sentence carries the kind of content the intent asks for
/// (a date, an amount, an obligation, a responsibility).
pub fn has_intent_marker(intent: QuestionIntent, sentence: &str) -> bool {
    match intent {
        QuestionIntent::Timeline => TIMELINE_MARKER.is_match(sentence),
        QuestionIntent::Payment => PAYMENT_MARKER.is_match(sentence),
        QuestionIntent::Terms => TERMS_MARKER.is_match(sentence),
        QuestionIntent::Scope => SCOPE_MARKER.is_match(sentence),
        QuestionIntent::Summary | QuestionIntent::General => false,
    }
}

/// A rephrasing hint for a question that found nothing.
pub fn rephrasing_for(intent: QuestionIntent) -> &'static str {
    match intent {
        QuestionIntent::Timeline => {
            "Name the event whose date you need, for example \"When is the hearing?\" or \"What is the filing deadline?\""
        }
        QuestionIntent::Payment => {
            "Name the amount you are looking for, for example \"What is the total budget?\""
        }
        QuestionIntent::Terms => {
            "Ask about a specific obligation, for example \"What must the applicant report?\""
        }
        QuestionIntent::Scope => "Ask who is responsible for a specific task or deliverable.",
        QuestionIntent::Summary => "Ask about one section or topic of the document.",
        QuestionIntent::General => "Use words that appear in the document itself.",
    }
}
