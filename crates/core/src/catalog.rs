//! Content Catalog
//!
//! Static course data loaded once at start-up. The source document maps each
//! course name to its topics; topic bodies are not used by the tutor, only
//! their names and order.

use anyhow::{Context, Result, bail};
use serde_json::{Map, Value};
use std::path::Path;

/// A course and its ordered topic names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Course {
    pub name: String,
    pub topics: Vec<String>,
}

/// Read-only catalog of courses, kept in load order.
#[derive(Debug, Clone, Default)]
pub struct ContentCatalog {
    courses: Vec<Course>,
}

impl ContentCatalog {
    /// Builds a catalog from `(course, topics)` pairs.
    pub fn from_courses<I, C, T>(courses: I) -> Self
    where
        I: IntoIterator<Item = (C, Vec<T>)>,
        C: Into<String>,
        T: Into<String>,
    {
        Self {
            courses: courses
                .into_iter()
                .map(|(name, topics)| Course {
                    name: name.into(),
                    topics: topics.into_iter().map(Into::into).collect(),
                })
                .collect(),
        }
    }

    /// Parses a JSON document of the form `{"Course": {"Topic": ..., ...}, ...}`.
    ///
    /// A course may also list its topics as a plain array of strings.
    pub fn from_json_str(raw: &str) -> Result<Self> {
        let document: Map<String, Value> =
            serde_json::from_str(raw).context("Course data must be a JSON object")?;

        let mut courses = Vec::with_capacity(document.len());
        for (name, body) in document {
            let topics = match body {
                Value::Object(topics) => topics.keys().cloned().collect(),
                Value::Array(items) => items
                    .into_iter()
                    .map(|item| match item {
                        Value::String(topic) => Ok(topic),
                        other => bail!("Topic in course '{}' is not a string: {}", name, other),
                    })
                    .collect::<Result<Vec<_>>>()?,
                other => bail!("Course '{}' has unsupported topic data: {}", name, other),
            };
            courses.push(Course { name, topics });
        }

        Ok(Self { courses })
    }

    /// Loads the catalog from a JSON file.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read course data from {}", path.display()))?;
        Self::from_json_str(&raw)
            .with_context(|| format!("Invalid course data in {}", path.display()))
    }

    /// Course names in load order.
    pub fn courses(&self) -> Vec<String> {
        self.courses.iter().map(|c| c.name.clone()).collect()
    }

    /// Finds the course whose full name equals `input`, ignoring case.
    pub fn match_course(&self, input: &str) -> Option<&str> {
        let wanted = input.trim().to_lowercase();
        self.courses
            .iter()
            .find(|c| c.name.to_lowercase() == wanted)
            .map(|c| c.name.as_str())
    }

    /// Ordered topics for `course`; empty if the course is unknown.
    pub fn topics(&self, course: &str) -> Vec<String> {
        self.courses
            .iter()
            .find(|c| c.name == course)
            .map(|c| c.topics.clone())
            .unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.courses.is_empty()
    }
}
