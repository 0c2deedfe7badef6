use chrono::{DateTime, SecondsFormat, Utc};
use serde::{
    ser::{SerializeMap, Serializer},
    Deserialize, Serialize,
};

use crate::domain::{PageId, VisitorId};

/// One answer: a single value, or every value of a repeated field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AnswerValue {
    Single(String),
    Multiple(Vec<String>),
}

impl From<&str> for AnswerValue {
    fn from(value: &str) -> Self {
        Self::Single(value.to_string())
    }
}

impl From<Vec<&str>> for AnswerValue {
    fn from(values: Vec<&str>) -> Self {
        Self::Multiple(values.into_iter().map(str::to_string).collect())
    }
}

/// Question key to answer, kept in the order the form listed the questions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Answers {
    entries: Vec<(String, AnswerValue)>,
}

impl Answers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets `key`, replacing an earlier value in place.
    pub fn insert(&mut self, key: impl Into<String>, value: AnswerValue) {
        let key = key.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&AnswerValue> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Compact JSON object; non-ASCII text is written as-is.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

impl Serialize for Answers {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, value) in &self.entries {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

/// A single logged submission. Never modified after it is appended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionRecord {
    pub timestamp: DateTime<Utc>,
    pub visitor_id: VisitorId,
    pub page: PageId,
    pub answers: Answers,
}

impl SubmissionRecord {
    pub fn new(visitor_id: VisitorId, page: PageId, answers: Answers) -> Self {
        Self {
            timestamp: Utc::now(),
            visitor_id,
            page,
            answers,
        }
    }

    /// ISO-8601 UTC timestamp with microseconds, e.g. `2024-05-01T09:30:00.123456Z`.
    pub fn timestamp_text(&self) -> String {
        self.timestamp.to_rfc3339_opts(SecondsFormat::Micros, true)
    }

    /// The four logged columns in order: timestamp, visitor, page, answers.
    pub fn columns(&self) -> serde_json::Result<[String; 4]> {
        Ok([
            self.timestamp_text(),
            self.visitor_id.to_string(),
            self.page.to_string(),
            self.answers.to_json()?,
        ])
    }
}

#[cfg(test)]
#[path = "tests/protocol_tests.rs"]
mod tests;
