//! Course Outline Data Model
//!
//! These are the shapes that leave the system: a learning path is a list of
//! modules, a module is a list of lessons, and a lesson carries the videos
//! found for it. Field names are part of the wire format.

use serde::{Deserialize, Serialize};

/// A single candidate video for a lesson.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct VideoInfo {
    pub title: String,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Lesson {
    pub lesson_title: String,
    pub videos: Vec<VideoInfo>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Module {
    pub module_title: String,
    pub lessons: Vec<Lesson>,
}

/// The aggregated batch-mode document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct LearningPath {
    pub learning_topic: String,
    pub modules: Vec<Module>,
}

/// One record of the streaming response.
///
/// A module is written as the bare module object; a fatal failure is
/// written as `{"error": "..."}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StreamChunk {
    Module(Module),
    Error { error: String },
}

impl StreamChunk {
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            error: message.into(),
        }
    }

    /// Serializes the chunk as one newline-terminated JSON line.
    pub fn to_ndjson_line(&self) -> serde_json::Result<String> {
        let mut line = serde_json::to_string(self)?;
        line.push('\n');
        Ok(line)
    }
}
