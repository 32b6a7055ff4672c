//! # Field Messages
//!
//! An insertion-ordered map from failing data paths to the messages reported
//! for them. Paths are JSON-pointer-like: `/` for the root value, `/a/0/b`
//! for nested members.

use std::fmt;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Ordered `path -> [message]` mapping.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldMessages {
    entries: Vec<(String, Vec<String>)>,
}

impl FieldMessages {
    /// Create an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a message for `path`. A new path is appended at the end; an
    /// existing path keeps its position. Duplicate messages are dropped.
    pub fn push(&mut self, path: impl Into<String>, message: impl Into<String>) {
        let path = path.into();
        let message = message.into();
        match self.entries.iter_mut().find(|(p, _)| *p == path) {
            Some((_, messages)) => {
                if !messages.contains(&message) {
                    messages.push(message);
                }
            }
            None => self.entries.push((path, vec![message])),
        }
    }

    /// Messages recorded for `path`.
    pub fn get(&self, path: &str) -> Option<&[String]> {
        self.entries
            .iter()
            .find(|(p, _)| p == path)
            .map(|(_, messages)| messages.as_slice())
    }

    /// Number of distinct paths.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when no path has been recorded.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Paths in insertion order.
    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(p, _)| p.as_str())
    }

    /// `(path, messages)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.entries
            .iter()
            .map(|(p, messages)| (p.as_str(), messages.as_slice()))
    }

    /// First message of the first path.
    pub fn first_message(&self) -> Option<&str> {
        self.entries
            .first()
            .and_then(|(_, messages)| messages.first())
            .map(String::as_str)
    }
}

impl Serialize for FieldMessages {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (path, messages) in &self.entries {
            map.serialize_entry(path, messages)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for FieldMessages {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct FieldMessagesVisitor;

        impl<'de> Visitor<'de> for FieldMessagesVisitor {
            type Value = FieldMessages;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of paths to message lists")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut messages = FieldMessages::new();
                while let Some((path, list)) = access.next_entry::<String, Vec<String>>()? {
                    for message in list {
                        messages.push(path.clone(), message);
                    }
                }
                Ok(messages)
            }
        }

        deserializer.deserialize_map(FieldMessagesVisitor)
    }
}
