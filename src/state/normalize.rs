use crate::state::state_model::{ElementSnapshot, SampledValue};

/// Clean a raw text value for speech.
///
/// Returns `None` for empty text and for the element's placeholder label,
/// so unrendered template text is never narrated.
pub fn normalize_text(raw: &str, placeholder: Option<&str>) -> Option<String> {
    let text = raw.trim();

    if text.is_empty() {
        return None;
    }

    if let Some(placeholder) = placeholder {
        if text == placeholder.trim() {
            return None;
        }
    }

    // Collapse line breaks and runs of spaces
    let normalized = text.split_whitespace().collect::<Vec<_>>().join(" ");

    Some(normalized)
}

/// Parse a displayed number such as "60%", " 15 " or "1,000".
///
/// Decimals are truncated. Unparseable text counts as 0.
pub fn parse_number(text: &str) -> i64 {
    let cleaned = clean_number(text);
    cleaned
        .parse::<i64>()
        .ok()
        .or_else(|| {
            cleaned
                .parse::<f64>()
                .ok()
                .filter(|n| n.is_finite())
                .map(|n| n.trunc() as i64)
        })
        .unwrap_or(0)
}

/// Parse a displayed number keeping its fraction, e.g. "100.0%" or "100 %".
///
/// Returns `None` when the text is not a number at all.
pub fn parse_decimal(text: &str) -> Option<f64> {
    clean_number(text)
        .parse::<f64>()
        .ok()
        .filter(|n| n.is_finite())
}

fn clean_number(text: &str) -> String {
    text.trim()
        .trim_end_matches('%')
        .chars()
        .filter(|c| *c != ',' && !c.is_whitespace())
        .collect()
}

/// Stable fingerprint of a snapshot, used in trace output.
pub fn snapshot_fingerprint(snapshot: &ElementSnapshot) -> String {
    use sha1::{Digest, Sha1};

    let mut hasher = Sha1::new();
    for key in snapshot.keys() {
        let rendered = match snapshot.get(key) {
            Some(SampledValue::Text(text)) => format!("{}=t:{}\n", key, text),
            Some(SampledValue::Toggle(on)) => format!("{}=b:{}\n", key, on),
            Some(SampledValue::Count(n)) => format!("{}=n:{}\n", key, n),
            None => continue,
        };
        hasher.update(rendered.as_bytes());
    }
    format!("{:x}", hasher.finalize())
}
