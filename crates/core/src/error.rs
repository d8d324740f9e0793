//! Error types shared by the generation pipeline.

/// Failure of a single call to the outline generator.
#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    /// The text-generation collaborator could not be reached or refused the request.
    #[error("generator request failed: {0:#}")]
    Request(#[source] anyhow::Error),
    /// The collaborator answered with nothing usable.
    #[error("generator returned empty content")]
    EmptyContent,
    /// The collaborator answered with content that is not a valid `schema` document.
    #[error("generator output does not match the {schema} schema: {source}")]
    InvalidSchema {
        schema: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

/// Errors that cross the batch-mode boundary.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("Failed to generate modules: {0}")]
    ModuleGeneration(#[source] GenerationError),
    #[error("Could not generate any modules for this topic. Please try a different topic.")]
    EmptyPath,
}
