//! Outline Generation Service
//!
//! This module turns a topic into module titles and a module into lesson
//! titles. Both steps ask the text-generation model for a JSON document that
//! follows a fixed schema and refuse anything that does not.

use crate::{
    error::GenerationError,
    llm_client::{LLMClient, ResponseSchema},
};
use async_trait::async_trait;
use schemars::JsonSchema;
use serde::{Deserialize, de::DeserializeOwned};
use std::{collections::HashMap, sync::Arc};
use tracing::{debug, warn};

/// Expected number of entries per generated list. Lists outside this range
/// are passed through with a warning.
const EXPECTED_ITEMS: std::ops::RangeInclusive<usize> = 3..=5;

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ModuleTitleItem {
    pub module_title: String,
}

/// Schema for the module-list reply.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct ModuleList {
    pub modules: Vec<ModuleTitleItem>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct LessonTitleItem {
    pub lesson_title: String,
}

/// Schema for the lesson-list reply.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct LessonList {
    pub lessons: Vec<LessonTitleItem>,
}

/// Defines the contract for any service that can outline a course.
///
/// This abstraction allows the pipeline to swap between different outline
/// sources (LLM-backed, static, recorded) without changing orchestration.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait OutlineGenerator: Send + Sync {
    /// Produces the ordered module titles for a course on `topic`.
    async fn modules_for(&self, topic: &str) -> Result<Vec<String>, GenerationError>;

    /// Produces the ordered lesson titles for one module of the course.
    async fn lessons_for(
        &self,
        module_title: &str,
        topic: &str,
    ) -> Result<Vec<String>, GenerationError>;
}

/// Prompt templates for the two generation steps.
///
/// `{topic}` and `{module}` are substituted before sending.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTemplates {
    pub module_titles: String,
    pub lesson_titles: String,
}

impl PromptTemplates {
    pub const MODULE_TITLES_KEY: &'static str = "module_titles";
    pub const LESSON_TITLES_KEY: &'static str = "lesson_titles";

    /// Builds templates from a map of loaded prompt files, falling back to
    /// the built-in text for any key that is missing.
    pub fn from_map(mut prompts: HashMap<String, String>) -> Self {
        let defaults = Self::default();
        Self {
            module_titles: prompts
                .remove(Self::MODULE_TITLES_KEY)
                .unwrap_or(defaults.module_titles),
            lesson_titles: prompts
                .remove(Self::LESSON_TITLES_KEY)
                .unwrap_or(defaults.lesson_titles),
        }
    }

    fn render_modules(&self, topic: &str) -> String {
        self.module_titles.replace("{topic}", topic)
    }

    fn render_lessons(&self, module_title: &str, topic: &str) -> String {
        self.lesson_titles
            .replace("{module}", module_title)
            .replace("{topic}", topic)
    }
}

impl Default for PromptTemplates {
    fn default() -> Self {
        Self {
            module_titles: "Generate 3-5 module titles for a course on '{topic}'.".to_string(),
            lesson_titles:
                "Generate 3-5 lesson titles for the module '{module}' of a course on '{topic}'."
                    .to_string(),
        }
    }
}

/// An implementation of `OutlineGenerator` backed by an `LLMClient`.
pub struct LLMOutlineGenerator {
    client: Arc<dyn LLMClient>,
    prompts: PromptTemplates,
}

impl LLMOutlineGenerator {
    pub fn new(client: Arc<dyn LLMClient>, prompts: PromptTemplates) -> Self {
        Self { client, prompts }
    }

    /// Sends `prompt` constrained to the schema of `T` and validates the reply.
    async fn call_with_schema<T>(&self, prompt: String, name: &'static str) -> Result<T, GenerationError>
    where
        T: JsonSchema + DeserializeOwned,
    {
        let schema = ResponseSchema::of::<T>(name).map_err(GenerationError::Request)?;
        let raw = self
            .client
            .complete_structured(prompt, schema)
            .await
            .map_err(GenerationError::Request)?;

        if raw.trim().is_empty() {
            return Err(GenerationError::EmptyContent);
        }
        serde_json::from_str(&raw).map_err(|source| GenerationError::InvalidSchema {
            schema: name,
            source,
        })
    }
}

#[async_trait]
impl OutlineGenerator for LLMOutlineGenerator {
    async fn modules_for(&self, topic: &str) -> Result<Vec<String>, GenerationError> {
        let prompt = self.prompts.render_modules(topic);
        let list: ModuleList = self.call_with_schema(prompt, "module_list").await?;
        let titles = list.modules.into_iter().map(|m| m.module_title).collect();
        checked_titles(titles, "module")
    }

    async fn lessons_for(
        &self,
        module_title: &str,
        topic: &str,
    ) -> Result<Vec<String>, GenerationError> {
        let prompt = self.prompts.render_lessons(module_title, topic);
        let list: LessonList = self.call_with_schema(prompt, "lesson_list").await?;
        let titles = list.lessons.into_iter().map(|l| l.lesson_title).collect();
        checked_titles(titles, "lesson")
    }
}

fn checked_titles(titles: Vec<String>, kind: &'static str) -> Result<Vec<String>, GenerationError> {
    if titles.is_empty() {
        return Err(GenerationError::EmptyContent);
    }
    if !EXPECTED_ITEMS.contains(&titles.len()) {
        warn!(kind, count = titles.len(), "Generator returned an unexpected number of titles");
    }
    debug!(kind, ?titles, "Generated titles");
    Ok(titles)
}
