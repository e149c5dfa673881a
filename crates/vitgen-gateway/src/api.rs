use std::sync::Arc;

use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::handler::Handler;
use axum::routing::{any, get, MethodRouter};
use axum::Router;
use serde::Serialize;
use tower_http::cors::{Any, CorsLayer};
use tracing::debug;

use vitgen_core::constants::{API_PREFIX, PROXIED_RESOURCES};
use vitgen_core::dataset::CompiledDataset;
use vitgen_core::error::VitgenError;

use crate::error::ApiError;
use crate::proxy::{self, Upstream};

/// Shared, read-only state of every handler.
#[derive(Clone)]
pub struct GatewayState {
    pub dataset: Arc<CompiledDataset>,
    pub upstream: Arc<Upstream>,
}

impl GatewayState {
    pub fn new(dataset: Arc<CompiledDataset>, upstream: Upstream) -> Self {
        Self {
            dataset,
            upstream: Arc::new(upstream),
        }
    }
}

pub fn build_router(state: GatewayState) -> Router {
    let mut api = Router::new()
        .route("/proposals", local(list_proposals))
        .route("/proposals/:internal_id", local(get_proposal))
        .route("/fund", local(get_fund))
        .route("/block0", local(get_block0));

    for resource in PROXIED_RESOURCES {
        api = api
            .route(&format!("/{resource}"), any(proxy::forward))
            .route(&format!("/{resource}/*rest"), any(proxy::forward));
    }

    Router::new()
        .nest(API_PREFIX, api)
        .fallback(not_found)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

// ── Local handlers ───────────────────────────────────────────────────────────

async fn list_proposals(State(state): State<GatewayState>) -> Result<Response, ApiError> {
    if state.dataset.proposals().is_empty() {
        return Err(ApiError::not_found("empty data"));
    }
    json(&state.dataset.records())
}

async fn get_proposal(
    State(state): State<GatewayState>,
    Path(internal_id): Path<String>,
) -> Result<Response, ApiError> {
    let proposal = state
        .dataset
        .proposal(&internal_id)
        .ok_or_else(|| ApiError::not_found("not found"))?;
    json(&state.dataset.record(proposal))
}

async fn get_fund(State(state): State<GatewayState>) -> Result<Response, ApiError> {
    let fund = state
        .dataset
        .current_fund()
        .ok_or_else(|| ApiError::not_found("empty data"))?;
    json(fund)
}

async fn get_block0(State(state): State<GatewayState>) -> Response {
    let bin = state.dataset.block0().to_vec();
    let len = bin.len();
    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "application/octet-stream".to_string()),
            (header::CONTENT_LENGTH, len.to_string()),
        ],
        Body::from(bin),
    )
        .into_response()
}

/// GET only. HEAD is answered like any other method.
fn local<H, T>(handler: H) -> MethodRouter<GatewayState>
where
    H: Handler<T, GatewayState>,
    T: 'static,
{
    get(handler).head(only_get).fallback(only_get)
}

async fn only_get() -> ApiError {
    ApiError::method_not_allowed()
}

async fn not_found() -> ApiError {
    ApiError::not_found("not found")
}

/// Encode `value` afresh for every request.
fn json<T: Serialize + ?Sized>(value: &T) -> Result<Response, ApiError> {
    let body = serde_json::to_vec_pretty(value).map_err(VitgenError::from)?;
    debug!(bytes = body.len(), "json response encoded");
    Ok(([(header::CONTENT_TYPE, "application/json")], body).into_response())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use axum::http::Request;
    use std::time::Duration;
    use tower::ServiceExt;
    use vitgen_core::fund::{Fund, PlanWindow, VotePlanSummary};
    use vitgen_core::proposal::{ChainProposal, Proposal, VoteOptions};

    fn upstream() -> Upstream {
        Upstream::new("http://127.0.0.1:9", Duration::from_secs(1)).unwrap()
    }

    fn app(dataset: CompiledDataset) -> Router {
        build_router(GatewayState::new(Arc::new(dataset), upstream()))
    }

    fn compiled() -> CompiledDataset {
        let proposal = Proposal {
            internal_id: 7,
            category: Default::default(),
            details: Default::default(),
            proposer: Default::default(),
            chain: ChainProposal {
                external_id: Some("ext7".into()),
                index: Some(0),
                vote_options: VoteOptions::parse_list("blank,yes,no"),
                plan_id: Some("vp-a".into()),
                ..Default::default()
            },
        };
        let fund = Fund {
            fund_id: 4,
            chain_vote_plans: vec![VotePlanSummary {
                row_id: 1,
                chain_voteplan_id: "vp-a".into(),
                window: PlanWindow {
                    chain_vote_end_time: "2021-01-07T00:00:00Z".into(),
                    fund_id: 4,
                    ..Default::default()
                },
            }],
            ..Default::default()
        };
        let mut ds = CompiledDataset::new(vec![proposal], vec![fund]);
        ds.set_block0(vec![0xde, 0xad, 0xbe, 0xef], "hash".into());
        ds
    }

    async fn get_json(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn empty_dataset_reports_empty_data() {
        let (status, body) = get_json(app(CompiledDataset::default()), "/api/v0/proposals").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, serde_json::json!({ "error": "empty data" }));

        let (status, body) = get_json(app(CompiledDataset::default()), "/api/v0/fund").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "empty data");
    }

    #[tokio::test]
    async fn proposals_are_joined_with_their_plan() {
        let (status, body) = get_json(app(compiled()), "/api/v0/proposals").await;
        assert_eq!(status, StatusCode::OK);
        let first = &body[0];
        assert_eq!(first["internal_id"], 7);
        assert_eq!(first["chain_proposal_id"], "ext7");
        assert_eq!(first["chain_voteplan_id"], "vp-a");
        assert_eq!(first["chain_vote_end_time"], "2021-01-07T00:00:00Z");
        assert_eq!(first["chain_vote_options"]["yes"], 1);
    }

    #[tokio::test]
    async fn single_proposal_lookup() {
        let (status, body) = get_json(app(compiled()), "/api/v0/proposals/7").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["fund_id"], 4);

        let (status, body) = get_json(app(compiled()), "/api/v0/proposals/8").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, serde_json::json!({ "error": "not found" }));
    }

    #[tokio::test]
    async fn fund_lists_its_plans() {
        let (status, body) = get_json(app(compiled()), "/api/v0/fund").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["id"], 4);
        assert_eq!(body["chain_vote_plans"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn block0_is_served_raw() {
        let response = app(compiled())
            .oneshot(Request::builder().uri("/api/v0/block0").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "application/octet-stream");
        assert_eq!(response.headers()[header::CONTENT_LENGTH], "4");
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], &[0xde, 0xad, 0xbe, 0xef]);
    }

    #[tokio::test]
    async fn local_routes_only_accept_get() {
        for method in ["POST", "HEAD", "DELETE"] {
            for uri in ["/api/v0/proposals", "/api/v0/proposals/1", "/api/v0/fund", "/api/v0/block0"] {
                let response = app(compiled())
                    .oneshot(Request::builder().method(method).uri(uri).body(Body::empty()).unwrap())
                    .await
                    .unwrap();
                assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED, "{method} {uri}");
            }
        }
    }

    #[tokio::test]
    async fn unknown_paths_are_not_found() {
        let (status, _) = get_json(app(compiled()), "/api/v0/nothing-here").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (status, _) = get_json(app(compiled()), "/elsewhere").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn responses_allow_any_origin() {
        let response = app(compiled())
            .oneshot(
                Request::builder()
                    .uri("/api/v0/fund")
                    .header(header::ORIGIN, "https://wallet.example")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
    }
}
