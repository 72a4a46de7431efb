//! Field-named records produced from spreadsheet rows.
//!
//! Each sheet defines its own columns, so a record is an ordered mapping
//! from lower-cased header to an optional value rather than a fixed struct.

use std::fmt;

use indexmap::IndexMap;
use serde::de::{self, Deserializer, SeqAccess, Visitor};
use serde::{Deserialize, Serialize};

/// A single cell value.
///
/// Cells are text; reference resolution replaces a code list with the
/// records it points to.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Field {
    Text(String),
    Records(Vec<Record>),
}

impl Field {
    /// The text content, if this is a text cell.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Field::Text(text) => Some(text),
            Field::Records(_) => None,
        }
    }
}

impl From<&str> for Field {
    fn from(value: &str) -> Self {
        Field::Text(value.to_string())
    }
}

impl From<String> for Field {
    fn from(value: String) -> Self {
        Field::Text(value)
    }
}

/// One element of a list-valued field.
#[derive(Deserialize)]
#[serde(untagged)]
enum Element {
    Record(Record),
    Field(Field),
    Other(#[allow(dead_code)] de::IgnoredAny),
}

// Hand-edited data files may carry bare numbers or booleans; those are kept
// as their textual form. A list of scalars is joined into one text cell.
impl<'de> Deserialize<'de> for Field {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct FieldVisitor;

        impl<'de> Visitor<'de> for FieldVisitor {
            type Value = Field;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a scalar cell value or a list")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Field, E> {
                Ok(Field::Text(v.to_string()))
            }

            fn visit_string<E: de::Error>(self, v: String) -> Result<Field, E> {
                Ok(Field::Text(v))
            }

            fn visit_bool<E: de::Error>(self, v: bool) -> Result<Field, E> {
                Ok(Field::Text(v.to_string()))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<Field, E> {
                Ok(Field::Text(v.to_string()))
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<Field, E> {
                Ok(Field::Text(v.to_string()))
            }

            fn visit_f64<E: de::Error>(self, v: f64) -> Result<Field, E> {
                Ok(Field::Text(v.to_string()))
            }

            fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Field, A::Error> {
                let mut records = Vec::new();
                let mut texts = Vec::new();
                while let Some(element) = seq.next_element::<Element>()? {
                    match element {
                        Element::Record(record) => records.push(record),
                        Element::Field(Field::Text(text)) => texts.push(text),
                        Element::Field(Field::Records(_)) | Element::Other(_) => {}
                    }
                }
                if texts.is_empty() {
                    Ok(Field::Records(records))
                } else {
                    Ok(Field::Text(texts.join(", ")))
                }
            }
        }

        deserializer.deserialize_any(FieldVisitor)
    }
}

/// An ordered, field-named record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record(IndexMap<String, Option<Field>>);

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a record from a header row and a data row.
    ///
    /// Rows shorter than the header are padded with absent values so every
    /// header key is present; extra trailing cells are dropped.
    pub fn from_row(headers: &[String], row: Vec<String>) -> Self {
        let mut cells = row.into_iter();
        let fields = headers
            .iter()
            .map(|header| (header.clone(), cells.next().map(Field::Text)))
            .collect();
        Self(fields)
    }

    /// Whether the key exists, even with an absent value.
    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn get(&self, key: &str) -> Option<&Field> {
        self.0.get(key).and_then(Option::as_ref)
    }

    /// Text value of a field, if present and textual.
    pub fn text(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Field::as_text)
    }

    /// Trimmed text value of a field, treating blank text as missing.
    pub fn non_empty(&self, key: &str) -> Option<&str> {
        self.text(key).map(str::trim).filter(|s| !s.is_empty())
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Field>) {
        self.0.insert(key.into(), Some(value.into()));
    }

    pub fn set_records(&mut self, key: impl Into<String>, records: Vec<Record>) {
        self.0.insert(key.into(), Some(Field::Records(records)));
    }

    /// Mark a field as absent, keeping the key.
    pub fn clear(&mut self, key: &str) {
        if let Some(slot) = self.0.get_mut(key) {
            *slot = None;
        }
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<Field>> FromIterator<(K, V)> for Record {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), Some(v.into())))
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn short_row_is_padded_with_absent_values() {
        let record = Record::from_row(
            &headers(&["name", "bio", "image"]),
            vec!["Alice".to_string()],
        );

        assert_eq!(record.len(), 3);
        assert_eq!(record.text("name"), Some("Alice"));
        assert!(record.contains_key("bio"));
        assert!(record.get("bio").is_none());
        assert!(record.get("image").is_none());
    }

    #[test]
    fn keys_follow_header_order() {
        let record = Record::from_row(
            &headers(&["website", "name"]),
            vec!["https://a.dev".into(), "A".into()],
        );
        assert_eq!(record.keys().collect::<Vec<_>>(), vec!["website", "name"]);
    }

    #[test]
    fn non_empty_ignores_blank_text() {
        let record: Record = [("name", "  "), ("bio", " hi ")].into_iter().collect();
        assert_eq!(record.non_empty("name"), None);
        assert_eq!(record.non_empty("bio"), Some("hi"));
    }

    #[test]
    fn clear_keeps_key() {
        let mut record: Record = [("image", "https://x/y.png")].into_iter().collect();
        record.clear("image");
        assert!(record.contains_key("image"));
        assert!(record.get("image").is_none());
    }

    #[test]
    fn yaml_null_and_numbers_deserialize() {
        let record: Record = serde_yaml::from_str("name: Alice\nbio:\nmember number: 12\n").unwrap();
        assert_eq!(record.text("name"), Some("Alice"));
        assert!(record.contains_key("bio"));
        assert!(record.get("bio").is_none());
        assert_eq!(record.text("member number"), Some("12"));
    }

    #[test]
    fn nested_records_serialize_as_list() {
        let mut record: Record = [("title", "Study")].into_iter().collect();
        let member: Record = [("name", "Alice")].into_iter().collect();
        record.set_records("collaborators", vec![member]);

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["collaborators"][0]["name"], "Alice");

        let back: Record = serde_json::from_value(json).unwrap();
        assert_eq!(back, record);
    }

    #[test]
    fn scalar_list_joins_into_text() {
        let record: Record =
            serde_yaml::from_str("name: Alice\ntags: [rust, 42, ~]\nfriends: []\n").unwrap();
        assert_eq!(record.text("tags"), Some("rust, 42"));
        assert_eq!(record.get("friends"), Some(&Field::Records(Vec::new())));
    }

    #[test]
    fn list_of_mappings_stays_records() {
        let record: Record =
            serde_yaml::from_str("collaborators:\n  - name: Alice\n  - name: Bob\n").unwrap();
        let Some(Field::Records(people)) = record.get("collaborators") else {
            panic!("collaborators should be records");
        };
        assert_eq!(people.len(), 2);
        assert_eq!(people[1].text("name"), Some("Bob"));
    }
}
