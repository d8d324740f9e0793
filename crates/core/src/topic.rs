use std::fmt;

/// Reasons a raw topic string is refused at the request boundary.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TopicError {
    #[error("Topic must be at least {min} characters long (got {actual})")]
    TooShort { min: usize, actual: usize },
}

/// A learning topic supplied by the user.
///
/// The original text is kept for display and for prompts, while the
/// normalized form (trimmed, lower-cased) identifies the topic in the
/// result cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Topic {
    raw: String,
    key: String,
}

impl Topic {
    /// Shortest accepted topic, counted in characters of the raw input.
    pub const MIN_LENGTH: usize = 5;

    /// Validates and wraps a raw topic string.
    pub fn parse(raw: impl Into<String>) -> Result<Self, TopicError> {
        let raw = raw.into();
        let actual = raw.chars().count();
        if actual < Self::MIN_LENGTH {
            return Err(TopicError::TooShort {
                min: Self::MIN_LENGTH,
                actual,
            });
        }
        let key = raw.trim().to_lowercase();
        Ok(Self { raw, key })
    }

    /// The topic exactly as the user wrote it.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// The normalized topic used as cache identity.
    pub fn cache_key(&self) -> &str {
        &self.key
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}
