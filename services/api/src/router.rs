//! Axum Router Configuration
//!
//! This module defines the complete HTTP routing for the application:
//! the two generation endpoints, the static UI and the OpenAPI documentation.

use crate::{
    handlers,
    models::{ErrorResponse, LearningRequest, StreamErrorChunk},
    state::AppState,
};

use axum::{Router, routing::post};
use learnpath_core::course::{LearningPath, Lesson, Module, VideoInfo};
use std::{path::Path, sync::Arc};
use tower_http::services::ServeDir;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::generate_learning_path,
        handlers::generate_learning_path_stream,
    ),
    components(
        schemas(LearningRequest, ErrorResponse, StreamErrorChunk, LearningPath, Module, Lesson, VideoInfo)
    ),
    tags(
        (name = "Learning Path API", description = "Course outlines with videos, generated from a topic")
    )
)]
pub struct ApiDoc;

/// Creates the main Axum router for the application.
///
/// Files under `static_dir` are served below `/ui`.
pub fn create_router(app_state: Arc<AppState>, static_dir: &Path) -> Router {
    let api_router = Router::new()
        .route(
            "/generate-learning-path",
            post(handlers::generate_learning_path),
        )
        .route(
            "/generate-learning-path-stream",
            post(handlers::generate_learning_path_stream),
        )
        .with_state(app_state);

    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .nest_service("/ui", ServeDir::new(static_dir))
        .merge(api_router)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::NDJSON_CONTENT_TYPE;
    use anyhow::Result;
    use async_trait::async_trait;
    use axum::{
        body::{Body, to_bytes},
        http::{Request, StatusCode, header},
    };
    use learnpath_core::{
        cache::ResultCache,
        error::GenerationError,
        outline::OutlineGenerator,
        pipeline::CoursePipeline,
        video::{RawVideoRecord, VideoResolver, VideoSearch},
    };
    use std::{
        collections::HashSet,
        sync::{
            Mutex,
            atomic::{AtomicUsize, Ordering},
        },
        time::Duration,
    };
    use tower::ServiceExt;

    /// Scripted outline: fixed module list, lessons named after their module.
    #[derive(Default)]
    struct FakeOutline {
        modules: Vec<&'static str>,
        fail_modules: bool,
        failing_lessons: HashSet<&'static str>,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl OutlineGenerator for FakeOutline {
        async fn modules_for(&self, _topic: &str) -> Result<Vec<String>, GenerationError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_modules {
                return Err(GenerationError::Request(anyhow::anyhow!(
                    "429 quota exhausted"
                )));
            }
            Ok(self.modules.iter().map(|m| m.to_string()).collect())
        }

        async fn lessons_for(
            &self,
            module_title: &str,
            _topic: &str,
        ) -> Result<Vec<String>, GenerationError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.failing_lessons.contains(module_title) {
                return Err(GenerationError::EmptyContent);
            }
            Ok(vec![
                format!("{module_title} / first"),
                format!("{module_title} / second"),
            ])
        }
    }

    #[derive(Default)]
    struct FakeSearch {
        queries: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl VideoSearch for FakeSearch {
        async fn search(&self, keywords: &str, _max_results: usize) -> Result<Vec<RawVideoRecord>> {
            self.queries.lock().unwrap().push(keywords.to_string());
            Ok(vec![RawVideoRecord {
                title: Some(format!("{keywords} (video)")),
                url: Some("https://www.youtube.com/watch?v=dQw4w9WgXcQ".to_string()),
                ..Default::default()
            }])
        }
    }

    struct Harness {
        router: Router,
        outline: Arc<FakeOutline>,
        search: Arc<FakeSearch>,
    }

    fn harness(outline: FakeOutline) -> Harness {
        let outline = Arc::new(outline);
        let search = Arc::new(FakeSearch::default());
        let pipeline = CoursePipeline::new(
            outline.clone(),
            VideoResolver::new(search.clone(), 3),
        );
        let state = Arc::new(AppState {
            pipeline: Arc::new(pipeline),
            cache: Arc::new(ResultCache::in_memory()),
            stream_pacing: Duration::ZERO,
        });
        Harness {
            router: create_router(state, Path::new("./static")),
            outline,
            search,
        }
    }

    fn outline_with(modules: &[&'static str]) -> FakeOutline {
        FakeOutline {
            modules: modules.to_vec(),
            ..Default::default()
        }
    }

    fn post_json(uri: &str, topic: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(serde_json::json!({ "topic": topic }).to_string()))
            .unwrap()
    }

    async fn body_string(response: axum::response::Response) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_short_topic_is_rejected_before_generation() {
        for uri in ["/generate-learning-path", "/generate-learning-path-stream"] {
            let h = harness(outline_with(&["Never"]));

            let response = h.router.oneshot(post_json(uri, "Math")).await.unwrap();

            assert_eq!(response.status(), StatusCode::BAD_REQUEST);
            let body: ErrorResponse = serde_json::from_str(&body_string(response).await).unwrap();
            assert!(body.detail.contains("at least 5 characters"));
            assert_eq!(h.outline.calls.load(Ordering::SeqCst), 0);
            assert!(h.search.queries.lock().unwrap().is_empty());
        }
    }

    #[tokio::test]
    async fn test_batch_returns_learning_path() {
        let h = harness(outline_with(&["Intro to Gravity", "Event Horizons"]));

        let response = h
            .router
            .oneshot(post_json("/generate-learning-path", "Black Holes"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let path: LearningPath = serde_json::from_str(&body_string(response).await).unwrap();
        assert_eq!(path.learning_topic, "Black Holes");
        assert_eq!(path.modules.len(), 2);
        assert_eq!(path.modules[0].lessons.len(), 2);
        assert_eq!(path.modules[0].lessons[0].videos.len(), 1);
    }

    #[tokio::test]
    async fn test_batch_drops_module_with_failed_lessons() {
        let h = harness(FakeOutline {
            modules: vec!["M1", "M2", "M3", "M4"],
            failing_lessons: HashSet::from(["M2"]),
            ..Default::default()
        });

        let response = h
            .router
            .oneshot(post_json("/generate-learning-path", "Black Holes"))
            .await
            .unwrap();

        let path: LearningPath = serde_json::from_str(&body_string(response).await).unwrap();
        let titles: Vec<_> = path.modules.iter().map(|m| m.module_title.as_str()).collect();
        assert_eq!(titles, vec!["M1", "M3", "M4"]);
    }

    #[tokio::test]
    async fn test_batch_module_failure_is_service_unavailable() {
        let h = harness(FakeOutline {
            fail_modules: true,
            ..Default::default()
        });

        let response = h
            .router
            .oneshot(post_json("/generate-learning-path", "Black Holes"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        let body: ErrorResponse = serde_json::from_str(&body_string(response).await).unwrap();
        assert!(body.detail.starts_with("Failed to generate modules:"));
        assert!(body.detail.contains("429 quota exhausted"));
    }

    #[tokio::test]
    async fn test_batch_with_no_surviving_module_is_not_found() {
        let h = harness(FakeOutline {
            modules: vec!["Only"],
            failing_lessons: HashSet::from(["Only"]),
            ..Default::default()
        });

        let response = h
            .router
            .oneshot(post_json("/generate-learning-path", "Black Holes"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_stream_emits_one_module_per_line() {
        let h = harness(outline_with(&["Intro to Gravity", "Event Horizons"]));

        let response = h
            .router
            .oneshot(post_json(
                "/generate-learning-path-stream",
                "I want to learn about Black Holes",
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            NDJSON_CONTENT_TYPE
        );
        let body = body_string(response).await;
        let lines: Vec<&str> = body.lines().collect();
        assert_eq!(lines.len(), 2);

        let first: Module = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(first.module_title, "Intro to Gravity");
        assert_eq!(first.lessons.len(), 2);
        assert!(first.lessons.iter().all(|l| l.videos.len() == 1));
    }

    #[tokio::test]
    async fn test_stream_module_failure_is_single_error_line() {
        let h = harness(FakeOutline {
            fail_modules: true,
            ..Default::default()
        });
        let state_cache_probe = h.router.clone();

        let response = h
            .router
            .oneshot(post_json("/generate-learning-path-stream", "Black Holes"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_string(response).await;

        let lines: Vec<&str> = body.lines().collect();
        assert_eq!(lines.len(), 1);
        let value: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
        assert!(
            value["error"]
                .as_str()
                .unwrap()
                .starts_with("Failed to generate modules:")
        );

        // Nothing was cached: a second request calls the generator again.
        let _ = body_string(
            state_cache_probe
                .oneshot(post_json("/generate-learning-path-stream", "black holes"))
                .await
                .unwrap(),
        )
        .await;
        assert_eq!(h.outline.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_stream_repeat_is_served_from_cache() {
        let h = harness(outline_with(&["Intro to Gravity", "Event Horizons"]));

        let first = body_string(
            h.router
                .clone()
                .oneshot(post_json("/generate-learning-path-stream", "  Black Holes "))
                .await
                .unwrap(),
        )
        .await;
        let calls_after_first = h.outline.calls.load(Ordering::SeqCst);
        let searches_after_first = h.search.queries.lock().unwrap().len();

        let second = body_string(
            h.router
                .oneshot(post_json("/generate-learning-path-stream", "black holes"))
                .await
                .unwrap(),
        )
        .await;

        assert_eq!(first, second);
        assert_eq!(h.outline.calls.load(Ordering::SeqCst), calls_after_first);
        assert_eq!(h.search.queries.lock().unwrap().len(), searches_after_first);
    }

    #[test]
    fn test_openapi_lists_both_endpoints() {
        let doc = ApiDoc::openapi();
        assert!(doc.paths.paths.contains_key("/generate-learning-path"));
        assert!(doc.paths.paths.contains_key("/generate-learning-path-stream"));
    }
}
