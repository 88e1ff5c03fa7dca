//! Response bodies

use kernel::pagination::Metadata;
use serde::ser::{Serialize, SerializeMap, Serializer};

/// `{"<key>": value}` or `{"<key>": [...], "metadata": {...}}`
#[derive(Debug)]
pub struct Envelope<T> {
    key: &'static str,
    value: T,
    metadata: Option<Metadata>,
}

impl<T> Envelope<T> {
    pub fn new(key: &'static str, value: T) -> Self {
        Self {
            key,
            value,
            metadata: None,
        }
    }

    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = Some(metadata);
        self
    }
}

impl<T: Serialize> Serialize for Envelope<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let len = if self.metadata.is_some() { 2 } else { 1 };
        let mut map = serializer.serialize_map(Some(len))?;
        map.serialize_entry(self.key, &self.value)?;
        if let Some(metadata) = &self.metadata {
            map.serialize_entry("metadata", metadata)?;
        }
        map.end()
    }
}

#[derive(Debug, serde::Serialize)]
pub struct MessageEnvelope {
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_record() {
        let json = serde_json::to_value(Envelope::new("movie", serde_json::json!({"id": 1}))).unwrap();
        assert_eq!(json, serde_json::json!({"movie": {"id": 1}}));
    }

    #[test]
    fn test_page_with_empty_metadata() {
        let env = Envelope::new("modules", Vec::<u8>::new()).with_metadata(Metadata::default());
        assert_eq!(
            serde_json::to_string(&env).unwrap(),
            r#"{"modules":[],"metadata":{}}"#
        );
    }
}
