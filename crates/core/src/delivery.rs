//! Streaming delivery of course modules.
//!
//! A request is served either by replaying a cached run or by running the
//! pipeline live; both paths produce the same chunk sequence with the same
//! pacing between chunks.

use crate::{
    cache::{CachedModules, Lookup, ResultCache},
    course::StreamChunk,
    pipeline::{CoursePipeline, StreamOutcome},
    topic::Topic,
};
use futures::Stream;
use std::{sync::Arc, time::Duration};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{Instrument, info, info_span};

/// Default pause between two emitted chunks.
pub const DEFAULT_PACING: Duration = Duration::from_millis(100);

/// Streams the course for `topic` chunk by chunk.
///
/// The producer runs as its own task feeding a one-slot channel. When the
/// returned stream is dropped the producer finishes the module it is working
/// on and then stops; nothing is cached for an unfinished run.
pub fn course_stream(
    pipeline: Arc<CoursePipeline>,
    cache: Arc<ResultCache>,
    topic: Topic,
    pacing: Duration,
) -> impl Stream<Item = StreamChunk> + Send + 'static {
    let (tx, rx) = mpsc::channel(1);
    let span = info_span!("course_stream", topic = %topic, key = %topic.cache_key());
    tokio::spawn(produce(pipeline, cache, topic, pacing, tx).instrument(span));
    ReceiverStream::new(rx)
}

async fn produce(
    pipeline: Arc<CoursePipeline>,
    cache: Arc<ResultCache>,
    topic: Topic,
    pacing: Duration,
    tx: mpsc::Sender<StreamChunk>,
) {
    loop {
        match cache.begin(topic.cache_key()) {
            Lookup::Hit(modules) => {
                info!("Cache hit");
                replay(&modules, pacing, &tx).await;
                return;
            }
            Lookup::Follower(waiter) => {
                if let Some(modules) = waiter.wait().await {
                    replay(&modules, pacing, &tx).await;
                    return;
                }
                info!("In-flight run ended without a result, retrying");
            }
            Lookup::Leader(guard) => {
                info!("Cache miss, processing live");
                match pipeline.stream_into(&topic, &tx, pacing).await {
                    StreamOutcome::Complete(modules) => {
                        guard.complete(modules);
                    }
                    StreamOutcome::Aborted | StreamOutcome::Disconnected => {}
                }
                return;
            }
        }
    }
}

async fn replay(modules: &CachedModules, pacing: Duration, tx: &mpsc::Sender<StreamChunk>) {
    for module in modules.iter() {
        if tx.send(StreamChunk::Module(module.clone())).await.is_err() {
            info!("Consumer disconnected during replay");
            return;
        }
        tokio::time::sleep(pacing).await;
    }
}
