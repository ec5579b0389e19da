//! Readers for model output.
//!
//! `parse_legacy` scans labelled free text; `extract_json_object` digs the
//! JSON object out of a reply that may be wrapped in markdown.

use super::model::AnalysisResult;

/// Result fields the legacy format can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LegacyField {
    Name,
    Price,
    Availability,
    Description,
    Origin,
}

/// Label spellings per field: the Chinese form the prompt asks for, then English.
const LEGACY_LABELS: [(LegacyField, &[&str]); 5] = [
    (LegacyField::Name, &["物品名稱", "item name"]),
    (LegacyField::Price, &["估計價格", "estimated price"]),
    (LegacyField::Availability, &["購買管道", "purchase channel"]),
    (LegacyField::Description, &["物品描述", "item description"]),
    (LegacyField::Origin, &["歷史起源", "historical origin"]),
];

/// Parse labelled free text into a result.
///
/// Each line is split at its first colon (`:` or `：`); the part before it is
/// checked against the known labels and the part after it is the value. The
/// first non-empty match per field wins and unmatched fields keep their
/// placeholder. When a name is found it also becomes the search term for
/// every online listing.
pub fn parse_legacy(text: &str) -> AnalysisResult {
    let mut result = AnalysisResult::placeholder();
    let mut seen: Vec<LegacyField> = Vec::new();

    for line in text.lines() {
        let Some((label, value)) = split_label(line) else {
            continue;
        };
        let label = label.to_lowercase();
        let matched = LEGACY_LABELS.iter().find(|(field, labels)| {
            !seen.contains(field) && labels.iter().any(|l| label.contains(l))
        });
        let Some((field, _)) = matched else {
            continue;
        };

        seen.push(*field);
        let slot = match field {
            LegacyField::Name => &mut result.name,
            LegacyField::Price => &mut result.price,
            LegacyField::Availability => &mut result.availability,
            LegacyField::Description => &mut result.description,
            LegacyField::Origin => &mut result.origin,
        };
        *slot = value.to_string();
    }

    if seen.contains(&LegacyField::Name) {
        let name = result.name.clone();
        result.set_search_terms(&name);
    }

    result
}

/// Split a line at its first colon (`:` or `：`) into label and value.
///
/// Lines without a colon or with an empty value yield `None`.
fn split_label(line: &str) -> Option<(&str, &str)> {
    let idx = line.find([':', '：'])?;
    let colon_len = line[idx..].chars().next().map_or(1, char::len_utf8);
    let value = line[idx + colon_len..].trim().trim_matches('*').trim();
    if value.is_empty() {
        None
    } else {
        Some((&line[..idx], value))
    }
}

/// Extract a JSON object from text that might be wrapped in a markdown fence.
///
/// The fence's language tag (`json`, `JSON`, anything) is skipped along with
/// the rest of the opening line.
pub fn extract_json_object(text: &str) -> &str {
    let trimmed = text.trim();

    if let Some(body) = fenced_body(trimmed) {
        return body;
    }

    if let (Some(start), Some(end)) = (trimmed.find('{'), trimmed.rfind('}')) {
        if end > start {
            return &trimmed[start..=end];
        }
    }

    trimmed
}

fn fenced_body(text: &str) -> Option<&str> {
    let open = text.find("```")?;
    let after_open = &text[open + 3..];
    // Body starts after the opening line, or right after the ticks for one-line fences
    let body_start = match after_open.find('\n') {
        Some(nl) if !after_open[..nl].contains('{') => nl + 1,
        _ => after_open.find('{').unwrap_or(0),
    };
    let body = &after_open[body_start..];
    let close = body.find("```")?;
    Some(body[..close].trim())
}
