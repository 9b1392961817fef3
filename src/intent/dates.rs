use std::sync::LazyLock;

use chrono::{Datelike, Days, NaiveDate, Weekday};
use regex::Regex;

const WEEKDAYS: [(&str, Weekday); 7] = [
    ("sunday", Weekday::Sun),
    ("monday", Weekday::Mon),
    ("tuesday", Weekday::Tue),
    ("wednesday", Weekday::Wed),
    ("thursday", Weekday::Thu),
    ("friday", Weekday::Fri),
    ("saturday", Weekday::Sat),
];

const MONTHS: [&str; 12] = [
    "jan", "feb", "mar", "apr", "may", "jun", "jul", "aug", "sep", "oct", "nov", "dec",
];

static IN_DAYS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"in (\d+) days?").expect("static pattern"));

static MONTH_DAY: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    MONTHS
        .iter()
        .map(|month| Regex::new(&format!(r"\b{}\w*\s+(\d{{1,2}})", month)).expect("static pattern"))
        .collect()
});

/// Resolve the first recognised date phrase in `text` relative to `today`.
///
/// Rules are tried in order: today, tomorrow, next week, "in N days", a
/// weekday name (always strictly after today), then "<month> <day>" in the
/// current year, rolled to next year once that day has passed.
pub fn parse_due_date(text: &str, today: NaiveDate) -> Option<NaiveDate> {
    let lower = text.to_lowercase();

    if lower.contains("today") {
        return Some(today);
    }
    if lower.contains("tomorrow") {
        return today.checked_add_days(Days::new(1));
    }
    if lower.contains("next week") {
        return today.checked_add_days(Days::new(7));
    }

    if let Some(caps) = IN_DAYS.captures(&lower) {
        let days: u64 = caps[1].parse().ok()?;
        return today.checked_add_days(Days::new(days));
    }

    for (name, weekday) in WEEKDAYS {
        if lower.contains(name) {
            return Some(next_weekday(today, weekday));
        }
    }

    for (idx, pattern) in MONTH_DAY.iter().enumerate() {
        if let Some(caps) = pattern.captures(&lower) {
            let day: u32 = caps[1].parse().ok()?;
            let month = idx as u32 + 1;
            let date = NaiveDate::from_ymd_opt(today.year(), month, day)?;
            if date < today {
                return NaiveDate::from_ymd_opt(today.year() + 1, month, day);
            }
            return Some(date);
        }
    }

    None
}

fn next_weekday(today: NaiveDate, target: Weekday) -> NaiveDate {
    let current = today.weekday().num_days_from_sunday() as i64;
    let wanted = target.num_days_from_sunday() as i64;
    let mut ahead = wanted - current;
    if ahead <= 0 {
        ahead += 7;
    }
    today + chrono::Duration::days(ahead)
}
