use std::sync::LazyLock;

use regex::Regex;

pub const COBY: &str = "coby";
pub const RODION: &str = "rodion";

static COBY_MENTION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bcoby\b").expect("static pattern"));
static RODION_MENTION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\brodion\b").expect("static pattern"));

const LEADING_SELF_REFERENCES: [&str; 2] = ["i need", "i should"];
const SELF_REFERENCE: &str = "remind me";
const ERRAND_VERBS: [&str; 5] = ["call ", "email ", "buy ", "pick up", "schedule "];

/// Decide who a new todo belongs to. Explicit names win, then self-referential
/// phrasing and personal errands go to rodion, everything else to coby.
pub fn infer_assignee(text: &str) -> &'static str {
    let lower = text.trim_start().to_lowercase();

    if COBY_MENTION.is_match(&lower) {
        return COBY;
    }
    if RODION_MENTION.is_match(&lower)
        || LEADING_SELF_REFERENCES.iter().any(|phrase| lower.starts_with(phrase))
        || lower.contains(SELF_REFERENCE)
    {
        return RODION;
    }
    if ERRAND_VERBS.iter().any(|verb| lower.contains(verb)) {
        return RODION;
    }

    COBY
}
