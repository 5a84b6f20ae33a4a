//! Query types

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{Error, Result};

/// Longest accepted query, in characters after trimming
pub const MAX_QUERY_CHARS: usize = 1000;

/// Body of `POST /support-query`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SupportQueryRequest {
    /// Customer support query
    #[serde(default)]
    pub query: Option<String>,
}

impl SupportQueryRequest {
    /// Validate the body into a [`Query`]
    pub fn into_query(self) -> Result<Query> {
        match self.query {
            Some(text) => Query::new(text),
            None => Err(Error::validation("Field 'query' is required")),
        }
    }
}

/// Raw text submitted by the caller, trimmed and non-empty
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Query(String);

impl Query {
    /// Validate and trim caller input
    pub fn new(text: impl Into<String>) -> Result<Self> {
        let text = text.into();
        let trimmed = text.trim();

        if trimmed.is_empty() {
            return Err(Error::validation("Query cannot be empty or only whitespace"));
        }
        if trimmed.chars().count() > MAX_QUERY_CHARS {
            return Err(Error::validation(format!(
                "Query must be at most {} characters",
                MAX_QUERY_CHARS
            )));
        }

        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Retrieval-optimised form of a [`Query`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReformulatedQuery {
    text: String,
    original: Query,
    fallback: bool,
}

impl ReformulatedQuery {
    /// Wrap generated text; falls back to the original when the text is blank
    pub fn new(original: Query, text: impl Into<String>) -> Self {
        let text = text.into().trim().to_string();
        if text.is_empty() {
            return Self::passthrough(original);
        }
        Self {
            text,
            original,
            fallback: false,
        }
    }

    /// Use the raw query unchanged
    pub fn passthrough(original: Query) -> Self {
        Self {
            text: original.as_str().to_string(),
            original,
            fallback: true,
        }
    }

    /// Text used for retrieval and drafting
    pub fn text(&self) -> &str {
        &self.text
    }

    /// The caller's query this was derived from
    pub fn original(&self) -> &Query {
        &self.original
    }

    /// True when reformulation was skipped or failed
    pub fn is_fallback(&self) -> bool {
        self.fallback
    }
}
