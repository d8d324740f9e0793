//! Course Generation Pipeline
//!
//! Drives the two-level generation: module titles for the topic, then for
//! each module (one at a time) its lesson titles followed by a concurrent
//! video search per lesson. Module-list failure aborts the run; a failure
//! for one module only drops that module.

use crate::{
    course::{LearningPath, Lesson, Module, StreamChunk},
    error::{GenerationError, PipelineError},
    fanout::resolve_lessons,
    outline::OutlineGenerator,
    topic::Topic,
    video::VideoResolver,
};
use std::{sync::Arc, time::Duration};
use tokio::sync::mpsc;
use tracing::{info, warn};

/// How a streaming run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamOutcome {
    /// Every module was processed; holds the modules that were emitted, in order.
    Complete(Vec<Module>),
    /// The module list could not be generated. An error chunk was emitted.
    Aborted,
    /// The consumer went away before the run finished.
    Disconnected,
}

pub struct CoursePipeline {
    outline: Arc<dyn OutlineGenerator>,
    resolver: VideoResolver,
}

impl CoursePipeline {
    pub fn new(outline: Arc<dyn OutlineGenerator>, resolver: VideoResolver) -> Self {
        Self { outline, resolver }
    }

    /// Generates the module titles for `topic`.
    pub async fn fetch_modules(&self, topic: &Topic) -> Result<Vec<String>, GenerationError> {
        info!(topic = %topic, "Generating module titles");
        self.outline.modules_for(topic.as_str()).await
    }

    /// Builds one module: lesson titles, then videos for all lessons at once.
    pub async fn assemble_module(
        &self,
        topic: &Topic,
        module_title: &str,
    ) -> Result<Module, GenerationError> {
        info!(module = %module_title, "Processing module");
        let lesson_titles = self
            .outline
            .lessons_for(module_title, topic.as_str())
            .await?;
        let videos = resolve_lessons(&self.resolver, &lesson_titles).await;

        let lessons = lesson_titles
            .into_iter()
            .zip(videos)
            .map(|(lesson_title, videos)| Lesson {
                lesson_title,
                videos,
            })
            .collect();

        Ok(Module {
            module_title: module_title.to_string(),
            lessons,
        })
    }

    /// Runs the whole pipeline and returns the aggregated document.
    pub async fn build_path(&self, topic: &Topic) -> Result<LearningPath, PipelineError> {
        let module_titles = self
            .fetch_modules(topic)
            .await
            .map_err(PipelineError::ModuleGeneration)?;

        let mut modules = Vec::with_capacity(module_titles.len());
        for title in &module_titles {
            match self.assemble_module(topic, title).await {
                Ok(module) if !module.lessons.is_empty() => modules.push(module),
                Ok(_) => warn!(module = %title, "Module has no lessons, skipping"),
                Err(e) => warn!(module = %title, error = %e, "Lesson generation failed, skipping module"),
            }
        }

        if modules.is_empty() {
            return Err(PipelineError::EmptyPath);
        }
        info!(topic = %topic, modules = modules.len(), "Learning path complete");
        Ok(LearningPath {
            learning_topic: topic.as_str().to_string(),
            modules,
        })
    }

    /// Runs the pipeline, handing each finished module to `sink` as soon as
    /// it is ready and pausing `pacing` after every chunk.
    ///
    /// A module is only started once the previous one has been delivered, so
    /// a closed `sink` stops the run after the module in progress.
    pub async fn stream_into(
        &self,
        topic: &Topic,
        sink: &mpsc::Sender<StreamChunk>,
        pacing: Duration,
    ) -> StreamOutcome {
        let module_titles = match self.fetch_modules(topic).await {
            Ok(titles) => titles,
            Err(e) => {
                warn!(topic = %topic, error = %e, "Module generation failed, aborting stream");
                let chunk = StreamChunk::error(format!("Failed to generate modules: {e}"));
                let _ = sink.send(chunk).await;
                return StreamOutcome::Aborted;
            }
        };

        let mut emitted = Vec::with_capacity(module_titles.len());
        for title in &module_titles {
            if sink.is_closed() {
                return StreamOutcome::Disconnected;
            }
            let module = match self.assemble_module(topic, title).await {
                Ok(module) => module,
                Err(e) => {
                    warn!(module = %title, error = %e, "Lesson generation failed, skipping module");
                    continue;
                }
            };
            if sink.send(StreamChunk::Module(module.clone())).await.is_err() {
                info!(module = %title, "Consumer disconnected, stopping stream");
                return StreamOutcome::Disconnected;
            }
            emitted.push(module);
            tokio::time::sleep(pacing).await;
        }

        info!(topic = %topic, modules = emitted.len(), "Stream complete");
        StreamOutcome::Complete(emitted)
    }
}
