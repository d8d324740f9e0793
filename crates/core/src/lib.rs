//! Learning path generation core.
//!
//! Turns a free-text topic into a course outline (modules, lessons and
//! candidate videos) by chaining a text-generation model and a video search
//! backend, either as one document or as a stream of finished modules.

pub mod cache;
pub mod course;
pub mod delivery;
pub mod error;
pub mod fanout;
pub mod llm_client;
pub mod outline;
pub mod pipeline;
pub mod topic;
pub mod video;
