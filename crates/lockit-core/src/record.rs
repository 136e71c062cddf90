//! Plaintext record model: what a vault item looks like before encryption.
//!
//! Each category is a variant of one tagged union so every item goes through
//! the same encrypt/decrypt entry point; the `category` tag survives the
//! JSON round-trip inside the ciphertext.

use serde::{Deserialize, Serialize};

/// A decrypted vault item, tagged by category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "category", rename_all = "camelCase")]
pub enum RecordData {
    #[serde(rename_all = "camelCase")]
    Login {
        username: String,
        password: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        url: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        notes: Option<String>,
    },
    #[serde(rename_all = "camelCase")]
    Card {
        cardholder: String,
        number: String,
        expiry: String,
        cvv: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        notes: Option<String>,
    },
    #[serde(rename_all = "camelCase")]
    Note { text: String },
}

/// What a record ciphertext decrypted to.
///
/// Stored blobs are usually a [`RecordData`] JSON document, but historical
/// producers wrote plain strings and attachments are raw bytes; decrypt
/// falls through these in order rather than failing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordPayload {
    Structured(RecordData),
    Text(String),
    Binary(Vec<u8>),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_login_round_trips_with_category_tag() {
        let rec = RecordData::Login {
            username: "ada".into(),
            password: "s3cret".into(),
            url: Some("https://example.com".into()),
            notes: None,
        };
        let json = serde_json::to_string(&rec).unwrap();
        assert!(json.contains(r#""category":"login""#));
        let back: RecordData = serde_json::from_str(&json).unwrap();
        assert_eq!(back, rec);
    }

    #[test]
    fn test_card_omits_empty_notes() {
        let rec = RecordData::Card {
            cardholder: "Ada Lovelace".into(),
            number: "4111111111111111".into(),
            expiry: "12/30".into(),
            cvv: "123".into(),
            notes: None,
        };
        let json = serde_json::to_value(&rec).unwrap();
        assert!(json.get("notes").is_none());
        assert_eq!(json["category"], "card");
    }
}
