use crate::models::{Draft, Priority};
use chrono::{Duration, NaiveDate};
use regex::Regex;

/// Parses a one-line quick add such as `Pay rent #Personal !high @tomorrow`.
///
/// `!priority`, `#category` and `@date` tokens are lifted out of the name.
/// The first token of each kind wins; later ones are dropped. Tokens that
/// do not parse stay in the name.
pub fn parse_quick_add(input: &str, today: NaiveDate) -> Draft {
    let priority_re = Regex::new(r"^!(\w+)$").unwrap();
    let category_re = Regex::new(r"^#(\S+)$").unwrap();
    let due_re = Regex::new(r"^@(\S+)$").unwrap();

    let mut draft = Draft::default();
    let mut words = Vec::new();

    for word in input.split_whitespace() {
        // Priority
        if let Some(caps) = priority_re.captures(word) {
            if let Some(priority) = Priority::parse(&caps[1]) {
                if draft.priority.is_empty() {
                    draft.priority = priority.as_str().to_string();
                }
                continue;
            }
        }

        // Category
        if let Some(caps) = category_re.captures(word) {
            if draft.category.is_empty() {
                draft.category = caps[1].to_string();
            }
            continue;
        }

        // Due date
        if let Some(caps) = due_re.captures(word) {
            if let Some(date) = parse_due(&caps[1], today) {
                if draft.due_date.is_empty() {
                    draft.due_date = date.format("%Y-%m-%d").to_string();
                }
                continue;
            }
        }

        words.push(word);
    }

    draft.name = words.join(" ");
    draft
}

fn parse_due(value: &str, today: NaiveDate) -> Option<NaiveDate> {
    match value.to_ascii_lowercase().as_str() {
        "today" => Some(today),
        "tomorrow" => Some(today + Duration::days(1)),
        other => NaiveDate::parse_from_str(other, "%Y-%m-%d").ok(),
    }
}
