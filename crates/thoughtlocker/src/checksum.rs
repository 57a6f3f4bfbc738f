use std::collections::BTreeMap;

use serde_json::Value;
use sha2::{Digest, Sha256};

/// Fields every declared spec must carry, in schema order.
///
/// Only these feed the checksum, so edits to tags, aliases or notes alone
/// are not treated as changes by the loader.
pub const REQUIRED_FIELDS: [&str; 9] = [
    "description",
    "provider",
    "model",
    "web_search",
    "reasoning_effort",
    "context_size",
    "temperature",
    "max_output_tokens",
    "system_instruction",
];

/// Hex-encoded SHA-256 of the payload serialized as compact JSON.
///
/// `BTreeMap` iterates in key order, so the digest does not depend on the
/// order fields were declared in.
pub fn compute_checksum(payload: &BTreeMap<String, Value>) -> String {
    // A map of strings to JSON values cannot fail to serialize.
    let normalized = serde_json::to_string(payload).unwrap_or_default();
    format!("{:x}", Sha256::digest(normalized.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn payload() -> BTreeMap<String, Value> {
        BTreeMap::from([
            ("description".to_owned(), json!("d")),
            ("provider".to_owned(), json!("openai")),
            ("model".to_owned(), json!("gpt-x")),
            ("web_search".to_owned(), json!(false)),
            ("reasoning_effort".to_owned(), json!("low")),
            ("context_size".to_owned(), json!("small")),
            ("temperature".to_owned(), json!(0.5)),
            ("max_output_tokens".to_owned(), json!(100)),
            ("system_instruction".to_owned(), json!("Be nice.")),
        ])
    }

    #[test]
    fn checksum_is_lowercase_hex_sha256() {
        let sum = compute_checksum(&payload());
        assert_eq!(sum.len(), 64);
        assert!(sum.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn checksum_of_empty_payload_is_digest_of_empty_object() {
        assert_eq!(
            compute_checksum(&BTreeMap::new()),
            "44136fa355b3678a1146ad16f7e8649e94fb4fc21fe77e8310c060f61caaff8a"
        );
    }

    #[test]
    fn checksum_ignores_insertion_order() {
        let forward = payload();
        let mut reversed = BTreeMap::new();
        for (k, v) in forward.iter().rev() {
            reversed.insert(k.clone(), v.clone());
        }
        assert_eq!(compute_checksum(&forward), compute_checksum(&reversed));
    }

    #[test]
    fn every_required_field_changes_the_checksum() {
        let base = compute_checksum(&payload());
        for field in REQUIRED_FIELDS {
            let mut changed = payload();
            changed.insert(field.to_owned(), json!("something else"));
            assert_ne!(compute_checksum(&changed), base, "field {field}");
        }
    }
}
