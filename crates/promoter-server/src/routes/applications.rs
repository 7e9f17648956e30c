//! Application, stage and promotion endpoints.

use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use promoter_core::{PromotionOutcome, Stage};
use promoter_engine::{RenderMode, unified_diff};
use serde::Serialize;
use tracing::info;

use crate::AppState;
use crate::error::ApiError;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_applications))
        .route("/{app}/stages", get(list_stages))
        .route("/{app}/stages/{stage}/preview", get(preview))
        .route("/{app}/stages/{stage}/promotion", post(promote))
}

#[derive(Debug, Serialize)]
struct ApplicationResponse {
    name: String,
    stages: Vec<Stage>,
}

#[derive(Debug, Serialize)]
struct PreviewResponse {
    application: String,
    stage: String,
    has_changes: bool,
    diff: String,
}

async fn list_applications(
    State(state): State<AppState>,
) -> Result<Json<Vec<ApplicationResponse>>, ApiError> {
    let checkout = state.checkout().await;
    let engine = checkout.workflow.engine();

    let mut response = Vec::new();
    for name in engine.list_applications()? {
        let stages = engine.list_stages(&name)?;
        response.push(ApplicationResponse { name, stages });
    }
    Ok(Json(response))
}

async fn list_stages(
    State(state): State<AppState>,
    Path(app): Path<String>,
) -> Result<Json<Vec<Stage>>, ApiError> {
    let checkout = state.checkout().await;
    Ok(Json(checkout.workflow.engine().list_stages(&app)?))
}

async fn preview(
    State(state): State<AppState>,
    Path((app, stage)): Path<(String, String)>,
) -> Result<Json<PreviewResponse>, ApiError> {
    let checkout = state.checkout().await;
    let preview = checkout
        .workflow
        .engine()
        .preview_release(&app, &stage, RenderMode::Compare)
        .await?;

    Ok(Json(PreviewResponse {
        has_changes: preview.has_changes(),
        diff: unified_diff(&preview.current, &preview.candidate),
        application: app,
        stage,
    }))
}

async fn promote(
    State(state): State<AppState>,
    Path((app, stage)): Path<(String, String)>,
) -> Result<Json<PromotionOutcome>, ApiError> {
    let checkout = state.checkout().await;
    info!(application = %app, stage = %stage, "Promotion requested");
    let outcome = checkout.workflow.push(&app, &stage).await?;
    Ok(Json(outcome))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repo::ManagedRepo;
    use crate::routes;
    use crate::testing::{RecordingVcs, StubHost};
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode};
    use promoter_core::MemoryFileStore;
    use promoter_engine::{Engine, PromotionWorkflow};
    use serde_json::Value;
    use std::sync::Arc;
    use tower::ServiceExt;

    fn app(host: StubHost) -> (Router, Arc<RecordingVcs>, Arc<MemoryFileStore>) {
        let store = Arc::new(
            MemoryFileStore::new()
                .with_file("apps/a1/releases/00-head/c.yaml", "image: 00-head-v2")
                .with_file("apps/a1/releases/01-staging/c.yaml", "image: 01-staging-v1")
                .with_file("apps/a2/releases/00-head/c.yaml", "image: v1")
                .with_file("apps/a2/releases/01-staging/c.yaml", "image: v1"),
        );
        let vcs = Arc::new(RecordingVcs::default());
        let engine = Engine::new(store.clone(), vcs.clone(), Arc::new(host));
        let repo = ManagedRepo::new(vcs.clone(), "/unused", None, None);
        let state = AppState::new(PromotionWorkflow::new(engine), repo);
        (routes::router(state), vcs, store)
    }

    async fn call(router: Router, method: &str, uri: &str) -> (StatusCode, Value) {
        let response = router
            .oneshot(
                Request::builder()
                    .method(method)
                    .uri(uri)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[tokio::test]
    async fn test_health() {
        let (router, _, _) = app(StubHost::default());
        let (status, body) = call(router, "GET", "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn test_status_reports_pending_with_pull_request() {
        let (router, vcs, _) = app(StubHost::default().with_open_pr("promoter-a1-01-staging", 7));
        let (status, body) = call(router, "GET", "/api/v1/status").await;

        assert_eq!(status, StatusCode::OK);
        let apps = body["applications"].as_array().unwrap();
        assert_eq!(apps.len(), 2);
        assert_eq!(apps[0]["name"], "a1");
        assert_eq!(apps[0]["stages"][0]["status"], "released");
        assert_eq!(apps[0]["stages"][1]["status"], "pending");
        assert_eq!(apps[0]["stages"][1]["pull_request"], 7);
        assert_eq!(apps[1]["stages"][1]["status"], "released");
        assert_eq!(vcs.calls()[0], "fetch_all");
    }

    #[tokio::test]
    async fn test_pending_status_without_refresh() {
        let (router, vcs, _) = app(StubHost::default());
        let (status, body) = call(router, "GET", "/api/v1/status/pending?refresh=false").await;

        assert_eq!(status, StatusCode::OK);
        let apps = body["applications"].as_array().unwrap();
        assert_eq!(apps.len(), 1);
        assert_eq!(apps[0]["stages"].as_array().unwrap().len(), 1);
        assert_eq!(apps[0]["stages"][0]["pull_request"], 0);
        assert!(!vcs.calls().contains(&"fetch_all".to_string()));
    }

    #[tokio::test]
    async fn test_refresh() {
        let (router, _, _) = app(StubHost::default());
        let (status, body) = call(router, "POST", "/api/v1/refresh").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["revision"], "abc123");
    }

    #[tokio::test]
    async fn test_list_applications_and_stages() {
        let (router, _, _) = app(StubHost::default());
        let (status, body) = call(router.clone(), "GET", "/api/v1/applications").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body[0]["name"], "a1");
        assert_eq!(body[0]["stages"][1]["name"], "01-staging");
        assert_eq!(body[0]["stages"][1]["kind"], "rendered");

        let (status, _) = call(router, "GET", "/api/v1/applications/missing/stages").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_preview() {
        let (router, _, _) = app(StubHost::default());
        let (status, body) =
            call(router.clone(), "GET", "/api/v1/applications/a1/stages/01-staging/preview").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["has_changes"], true);
        assert!(body["diff"].as_str().unwrap().contains("+image: 01-staging-v2"));

        let (status, _) =
            call(router, "GET", "/api/v1/applications/a1/stages/00-head/preview").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_promotion_opens_then_reports_no_changes() {
        let (router, _, store) = app(StubHost::default());
        let uri = "/api/v1/applications/a1/stages/01-staging/promotion";

        let (status, body) = call(router.clone(), "POST", uri).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "new_pull_request");
        assert_eq!(body["pull_request"], 100);
        assert_eq!(
            store.get("apps/a1/releases/01-staging/c.yaml").as_deref(),
            Some("image: 01-staging-v2")
        );

        let (status, body) = call(router, "POST", uri).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "no_changes");
    }
}
