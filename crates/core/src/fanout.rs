use crate::{course::VideoInfo, video::VideoResolver};
use futures::future::join_all;
use tracing::info;

/// Resolves videos for every lesson of a module concurrently.
///
/// All searches are started together and all are awaited. `result[i]`
/// belongs to `lesson_titles[i]` whatever order the searches finish in.
pub async fn resolve_lessons(
    resolver: &VideoResolver,
    lesson_titles: &[String],
) -> Vec<Vec<VideoInfo>> {
    info!(lessons = lesson_titles.len(), "Starting parallel video search");
    let results = join_all(
        lesson_titles
            .iter()
            .map(|title| resolver.resolve(title.as_str())),
    )
    .await;
    info!("Finished parallel video search");
    results
}
