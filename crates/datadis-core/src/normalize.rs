//! Response normalization.
//!
//! Datadis returns Spanish place and company names that are frequently
//! garbled (UTF-8 bytes decoded as Latin-1/CP1252) and wraps record lists in
//! envelopes whose shape depends on the endpoint and API version. This
//! module turns both into something predictable.

use serde_json::{Map, Value};

/// Key carrying per-distributor partial failures in v2 envelopes
pub const DISTRIBUTOR_ERROR_KEY: &str = "distributorError";

/// Accented letters folded to plain ASCII
const ACCENT_FOLDS: &[(char, char)] = &[
    ('Á', 'A'),
    ('À', 'A'),
    ('Â', 'A'),
    ('Ä', 'A'),
    ('Ã', 'A'),
    ('É', 'E'),
    ('È', 'E'),
    ('Ê', 'E'),
    ('Ë', 'E'),
    ('Í', 'I'),
    ('Ì', 'I'),
    ('Ï', 'I'),
    ('Ó', 'O'),
    ('Ò', 'O'),
    ('Ô', 'O'),
    ('Ö', 'O'),
    ('Ú', 'U'),
    ('Ù', 'U'),
    ('Ü', 'U'),
    ('Ñ', 'N'),
    ('Ç', 'C'),
    ('á', 'a'),
    ('à', 'a'),
    ('â', 'a'),
    ('ä', 'a'),
    ('ã', 'a'),
    ('é', 'e'),
    ('è', 'e'),
    ('ê', 'e'),
    ('ë', 'e'),
    ('í', 'i'),
    ('ì', 'i'),
    ('ï', 'i'),
    ('ó', 'o'),
    ('ò', 'o'),
    ('ô', 'o'),
    ('ö', 'o'),
    ('ú', 'u'),
    ('ù', 'u'),
    ('ü', 'u'),
    ('ñ', 'n'),
    ('ç', 'c'),
];

/// CP1252 characters occupying the 0x80-0x9F range
const CP1252_HIGH: &[(char, u8)] = &[
    ('€', 0x80),
    ('‚', 0x82),
    ('ƒ', 0x83),
    ('„', 0x84),
    ('…', 0x85),
    ('†', 0x86),
    ('‡', 0x87),
    ('ˆ', 0x88),
    ('‰', 0x89),
    ('Š', 0x8A),
    ('‹', 0x8B),
    ('Œ', 0x8C),
    ('Ž', 0x8E),
    ('‘', 0x91),
    ('’', 0x92),
    ('“', 0x93),
    ('”', 0x94),
    ('•', 0x95),
    ('–', 0x96),
    ('—', 0x97),
    ('˜', 0x98),
    ('™', 0x99),
    ('š', 0x9A),
    ('›', 0x9B),
    ('œ', 0x9C),
    ('ž', 0x9E),
    ('Ÿ', 0x9F),
];

/// Resources exposed by the API, each with its envelope key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    Supplies,
    Contracts,
    Consumption,
    MaxPower,
    Distributors,
    ReactiveEnergy,
}

impl Resource {
    pub fn envelope_key(&self) -> &'static str {
        match self {
            Resource::Supplies => "supplies",
            Resource::Contracts => "contract",
            Resource::Consumption => "timeCurve",
            Resource::MaxPower => "maxPower",
            Resource::Distributors => "distExistenceUser",
            Resource::ReactiveEnergy => "reactiveEnergy",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Resource::Supplies => "supplies",
            Resource::Contracts => "contracts",
            Resource::Consumption => "consumption",
            Resource::MaxPower => "max power",
            Resource::Distributors => "distributors",
            Resource::ReactiveEnergy => "reactive energy",
        }
    }
}

/// Repair mojibake and fold accented letters to ASCII.
///
/// Idempotent: the output never contains a character that either step
/// rewrites.
pub fn normalize_text(text: &str) -> String {
    let repaired = repair_mojibake(text);
    let source = repaired.as_deref().unwrap_or(text);

    source
        .chars()
        .map(|c| {
            ACCENT_FOLDS
                .iter()
                .find(|(from, _)| *from == c)
                .map(|(_, to)| *to)
                .unwrap_or(c)
        })
        .collect()
}

/// Re-encode as Latin-1/CP1252 and decode as UTF-8, if that round trip works
fn repair_mojibake(text: &str) -> Option<String> {
    if !text.contains(|c: char| c == 'Ã' || c == 'Â') {
        return None;
    }

    let mut bytes = Vec::with_capacity(text.len());
    for c in text.chars() {
        let code = c as u32;
        if code <= 0xFF {
            bytes.push(code as u8);
        } else {
            let (_, byte) = CP1252_HIGH.iter().find(|(from, _)| *from == c)?;
            bytes.push(*byte);
        }
    }

    String::from_utf8(bytes).ok()
}

/// Normalize every string value in a decoded JSON tree. Keys are kept as-is.
pub fn normalize_value(value: Value) -> Value {
    match value {
        Value::String(s) => Value::String(normalize_text(&s)),
        Value::Array(items) => Value::Array(items.into_iter().map(normalize_value).collect()),
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(k, v)| (k, normalize_value(v)))
                .collect::<Map<String, Value>>(),
        ),
        other => other,
    }
}

/// Extract the record list for `resource` from whatever envelope the API sent
pub fn unwrap_envelope(response: Value, resource: Resource) -> Vec<Value> {
    match response {
        Value::Array(items) => items,
        Value::Object(mut map) => {
            let key = resource.envelope_key();
            if map.contains_key(key) || map.contains_key(DISTRIBUTOR_ERROR_KEY) {
                match map.remove(key) {
                    Some(Value::Array(items)) => items,
                    Some(Value::Object(inner)) if !inner.is_empty() => {
                        vec![Value::Object(inner)]
                    }
                    _ => Vec::new(),
                }
            } else if map.is_empty() {
                Vec::new()
            } else {
                vec![Value::Object(map)]
            }
        }
        _ => Vec::new(),
    }
}

/// Raw `distributorError` entries of a v2 envelope
pub fn extract_distributor_errors(response: &Value) -> Vec<Value> {
    response
        .get(DISTRIBUTOR_ERROR_KEY)
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_accent_folding() {
        let cases = [
            ("MÁLAGA", "MALAGA"),
            ("CORUÑA", "CORUNA"),
            ("JOSÉ", "JOSE"),
            ("ESPAÑA", "ESPANA"),
            ("E-DISTRIBUCIÓN", "E-DISTRIBUCION"),
            ("Hello World", "Hello World"),
        ];
        for (input, expected) in cases {
            assert_eq!(normalize_text(input), expected);
        }
    }

    #[test]
    fn test_mojibake_repair() {
        // "EDISTRIBUCIÓN" encoded as UTF-8 and read back as CP1252
        assert_eq!(normalize_text("EDISTRIBUCIÃ“N"), "EDISTRIBUCION");
        // "Málaga" read back as Latin-1
        assert_eq!(normalize_text("MÃ¡laga"), "Malaga");
        assert_eq!(normalize_text("CoruÃ±a"), "Coruna");
    }

    #[test]
    fn test_unrepairable_text_is_still_folded() {
        let result = normalize_text("EDISTRIBUCIÃlN");
        assert!(!result.contains('Ã'));
        assert_eq!(result, "EDISTRIBUCIAlN");
    }

    #[test]
    fn test_normalize_text_is_idempotent() {
        let samples = [
            "MÁLAGA",
            "EDISTRIBUCIÃ“N",
            "EDISTRIBUCIÃlN",
            "Ã",
            "ÃÃ±",
            "plain",
            "",
            "ÂÃ\u{81}",
        ];
        for sample in samples {
            let once = normalize_text(sample);
            assert_eq!(normalize_text(&once), once, "sample {:?}", sample);
        }
    }

    #[test]
    fn test_normalize_value_recurses() {
        let input = json!({
            "province": "MÁLAGA",
            "nested": {"city": "CORUÑA", "count": 3},
            "list": ["NIÑO", 1.5, null, true],
        });
        let expected = json!({
            "province": "MALAGA",
            "nested": {"city": "CORUNA", "count": 3},
            "list": ["NINO", 1.5, null, true],
        });
        assert_eq!(normalize_value(input), expected);
        assert_eq!(normalize_value(json!(42)), json!(42));
    }

    #[test]
    fn test_unwrap_bare_list() {
        let list = json!([{"cups": "A"}, {"cups": "B"}]);
        let records = unwrap_envelope(list.clone(), Resource::Supplies);
        assert_eq!(Value::Array(records), list);
    }

    #[test]
    fn test_unwrap_keyed_envelope() {
        let envelope = json!({
            "supplies": [{"cups": "A"}],
            "distributorError": [{"distributorCode": "2"}],
        });
        let records = unwrap_envelope(envelope, Resource::Supplies);
        assert_eq!(records, vec![json!({"cups": "A"})]);
    }

    #[test]
    fn test_unwrap_envelope_edge_cases() {
        // Key present but not a list
        assert!(unwrap_envelope(json!({"timeCurve": null}), Resource::Consumption).is_empty());
        // Only a distributor error: nothing to return
        assert!(unwrap_envelope(
            json!({"distributorError": [{"distributorCode": "2"}]}),
            Resource::MaxPower
        )
        .is_empty());
        // Object under the key becomes a single record
        let records = unwrap_envelope(
            json!({"distExistenceUser": {"distributorCodes": ["2"]}, "distributorError": []}),
            Resource::Distributors,
        );
        assert_eq!(records, vec![json!({"distributorCodes": ["2"]})]);
        // Unknown non-empty mapping is treated as one record
        let records = unwrap_envelope(json!({"cups": "A"}), Resource::Contracts);
        assert_eq!(records, vec![json!({"cups": "A"})]);
        assert!(unwrap_envelope(json!({}), Resource::Contracts).is_empty());
        assert!(unwrap_envelope(json!("invalid_response"), Resource::Supplies).is_empty());
    }

    #[test]
    fn test_extract_distributor_errors() {
        let envelope = json!({"supplies": [], "distributorError": [{"distributorCode": "2"}]});
        assert_eq!(extract_distributor_errors(&envelope).len(), 1);
        assert!(extract_distributor_errors(&json!([])).is_empty());
    }
}
