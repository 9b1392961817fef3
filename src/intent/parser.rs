use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;

use super::{infer_assignee, parse_due_date, Intent, TodoRef};

fn compile(patterns: &[&str]) -> Vec<Regex> {
    patterns
        .iter()
        .map(|p| Regex::new(p).expect("static pattern"))
        .collect()
}

/// "X is done" phrasings, in priority order. Group 1 is the search term.
static COMPLETION_TEMPLATES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    compile(&[
        r"(?i)^(?:done|finished|completed|complete|did|checked off?)\s+(?:with\s+)?(?:the\s+)?(.+)",
        r"(?i)^(?:mark|check)\s+(?:off\s+)?(?:the\s+)?(.+?)(?:\s+(?:as\s+)?(?:done|complete|finished))?$",
        r"(?i)^(.+?)\s+(?:is\s+)?(?:done|complete|finished)$",
    ])
});

/// Reschedule phrasings. Group 1 is the search term, group 2 the date phrase.
static UPDATE_TEMPLATES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    compile(&[
        r"(?i)^(?:push|move|reschedule|delay)\s+(?:the\s+)?(.+?)\s+(?:to|until|by)\s+(.+)$",
        r"(?i)^(?:change|update)\s+(?:the\s+)?(.+?)\s+(?:due\s+)?(?:date\s+)?(?:to|until|by)\s+(.+)$",
    ])
});

static ASSIGNEE_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^(?:coby|rodion)[,:]?\s*").expect("static pattern"));
static ASSIGNEE_SUFFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\s+for\s+(?:coby|rodion)\s*$").expect("static pattern"));
static IMPERATIVE_PREFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?:remind\s+me\s+to|i\s+need\s+to|i\s+should|need\s+to)\s*")
        .expect("static pattern")
});

/// Date phrases removed from a new todo's title once a due date was found.
static DATE_PHRASES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    compile(&[
        r"(?i)\s+(?:by|on|due|before)\s+(?:today|tomorrow|next week|monday|tuesday|wednesday|thursday|friday|saturday|sunday)",
        r"(?i)\s+(?:by|on|due|before)\s+(?:jan|feb|mar|apr|may|jun|jul|aug|sep|oct|nov|dec)\w*\s+\d{1,2}",
        r"(?i)\s+in\s+\d+\s+days?",
        r"(?i)\s+tomorrow$",
        r"(?i)\s+today$",
        r"(?i)\s+next\s+week$",
    ])
});

type Stage = fn(&str, &[TodoRef], NaiveDate) -> Option<Intent>;

/// Stages tried in order; the first to produce an intent wins. Creation is
/// the fallback when none does.
const STAGES: [Stage; 2] = [match_completion, match_update];

pub fn parse_intent(text: &str, open_todos: &[TodoRef], today: NaiveDate) -> Intent {
    let text = text.trim();

    STAGES
        .iter()
        .find_map(|stage| stage(text, open_todos, today))
        .unwrap_or_else(|| build_create(text, today))
}

/// A completion phrasing always resolves here: to the first matching todo, or
/// to `Unclear` when nothing matches. It never falls through to creation.
fn match_completion(text: &str, open_todos: &[TodoRef], _today: NaiveDate) -> Option<Intent> {
    let caps = COMPLETION_TEMPLATES
        .iter()
        .find_map(|template| template.captures(text))?;
    let term = caps[1].trim().to_lowercase();

    let matched = open_todos.iter().find(|todo| {
        let title = todo.title.to_lowercase();
        title.contains(&term)
            || title
                .split_whitespace()
                .next()
                .is_some_and(|first| term.contains(first))
    });

    Some(match matched {
        Some(todo) => Intent::Complete {
            todo_id: todo.id.clone(),
        },
        None => Intent::Unclear,
    })
}

/// Reschedules apply only when the search term names an open todo; otherwise
/// the next template (and finally creation) gets a chance.
fn match_update(text: &str, open_todos: &[TodoRef], today: NaiveDate) -> Option<Intent> {
    UPDATE_TEMPLATES.iter().find_map(|template| {
        let caps = template.captures(text)?;
        let term = caps[1].trim().to_lowercase();
        let date_phrase = caps[2].trim();

        let todo = open_todos
            .iter()
            .find(|todo| todo.title.to_lowercase().contains(&term))?;

        Some(Intent::Update {
            todo_id: todo.id.clone(),
            due_date: parse_due_date(date_phrase, today),
        })
    })
}

fn build_create(text: &str, today: NaiveDate) -> Intent {
    let mut title = ASSIGNEE_PREFIX.replace(text, "").into_owned();
    title = ASSIGNEE_SUFFIX.replace(&title, "").into_owned();

    let due_date = parse_due_date(text, today);
    if due_date.is_some() {
        for phrase in DATE_PHRASES.iter() {
            title = phrase.replace_all(&title, "").into_owned();
        }
    }

    title = IMPERATIVE_PREFIX.replace(&title, "").into_owned();

    let mut title = capitalize_first(title.trim());
    if title.is_empty() {
        title = capitalize_first(text);
    }

    Intent::Create {
        title,
        assignee: infer_assignee(text).to_string(),
        due_date,
    }
}

fn capitalize_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::intent::{COBY, RODION};
    use chrono::{Datelike, Weekday};

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 19).unwrap()
    }

    fn create(title: &str, assignee: &str, due_date: Option<NaiveDate>) -> Intent {
        Intent::Create {
            title: title.to_string(),
            assignee: assignee.to_string(),
            due_date,
        }
    }

    #[test]
    fn errand_with_relative_date() {
        let intent = parse_intent("call dentist tomorrow", &[], today());
        assert_eq!(
            intent,
            create("Call dentist", RODION, NaiveDate::from_ymd_opt(2026, 10, 20))
        );
    }

    #[test]
    fn completion_matches_by_first_word() {
        let open = [TodoRef::new("t1", "Call dentist")];
        let intent = parse_intent("done with the dentist call", &open, today());
        assert_eq!(intent, Intent::Complete { todo_id: "t1".to_string() });
    }

    #[test]
    fn completion_suffix_and_mark_forms() {
        let open = [
            TodoRef::new("t1", "Buy groceries"),
            TodoRef::new("t2", "Renew passport"),
        ];
        assert_eq!(
            parse_intent("passport is done", &open, today()),
            Intent::Complete { todo_id: "t2".to_string() }
        );
        assert_eq!(
            parse_intent("mark groceries as done", &open, today()),
            Intent::Complete { todo_id: "t1".to_string() }
        );
    }

    #[test]
    fn unmatched_completion_is_unclear_not_create() {
        let open = [TodoRef::new("t1", "Buy groceries")];
        assert_eq!(parse_intent("finished the taxes", &open, today()), Intent::Unclear);
    }

    #[test]
    fn unrecognised_text_falls_through_to_create() {
        let intent = parse_intent("xyzzy nonsense", &[], today());
        assert_eq!(intent, create("Xyzzy nonsense", COBY, None));
    }

    #[test]
    fn reschedule_updates_matching_todo() {
        let open = [TodoRef::new("t9", "Quarterly report")];
        let intent = parse_intent("push the quarterly report to friday", &open, today());
        assert_eq!(
            intent,
            Intent::Update {
                todo_id: "t9".to_string(),
                due_date: NaiveDate::from_ymd_opt(2026, 10, 23),
            }
        );
    }

    #[test]
    fn reschedule_without_match_creates() {
        let intent = parse_intent("move couch to garage", &[], today());
        assert_eq!(intent, create("Move couch to garage", COBY, None));
    }

    #[test]
    fn weekday_phrase_is_stripped_and_rolls_a_week() {
        assert_eq!(today().weekday(), Weekday::Mon);
        let intent = parse_intent("coby: draft proposal by monday", &[], today());
        assert_eq!(
            intent,
            create("Draft proposal", COBY, NaiveDate::from_ymd_opt(2026, 10, 26))
        );
    }

    #[test]
    fn imperative_and_suffix_assignee_are_stripped() {
        let intent = parse_intent("remind me to water plants in 2 days", &[], today());
        assert_eq!(
            intent,
            create("Water plants", RODION, NaiveDate::from_ymd_opt(2026, 10, 21))
        );

        let intent = parse_intent("research flights for coby", &[], today());
        assert_eq!(intent, create("Research flights", COBY, None));
    }
}
