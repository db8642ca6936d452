mod common;

use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode, header},
};
use common::{Call, RecordingHandler, test_config, test_state, test_state_with, token};
use profile_gateway::{
    AppConfig, create_router,
    models::{ErrorResponse, ProfileDto, StatusMessage},
    service::HandlerError,
};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tower::util::ServiceExt;

const ALL: &[&str] = &["profile:*"];

fn app(handler: Arc<RecordingHandler>) -> Router {
    create_router(test_state(handler))
}

fn request(method: Method, uri: &str, auth: Option<&str>, body: Option<serde_json::Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(auth) = auth {
        builder = builder.header(header::AUTHORIZATION, auth);
    }
    match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn read_json<T: DeserializeOwned>(response: axum::response::Response) -> T {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn read_text(response: axum::response::Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

#[tokio::test]
async fn test_health_check() {
    let response = app(Arc::default())
        .oneshot(request(Method::GET, "/health", None, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("x-request-id"));
}

#[tokio::test]
async fn test_liveness_endpoints_need_no_authorization() {
    for (uri, expected) in [
        ("/profiles/test", "profile microservice working"),
        ("/profiles-search/test", "profiles-search microservice working"),
    ] {
        let response = app(Arc::default())
            .oneshot(request(Method::GET, uri, None, None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(read_text(response).await, expected);
    }
}

#[tokio::test]
async fn test_add_profile_scenario() {
    let handler = Arc::new(RecordingHandler::default());
    let auth = token(&["profile:create"]);

    let response = app(handler.clone())
        .oneshot(request(
            Method::POST,
            "/profiles",
            Some(&auth),
            Some(serde_json::json!({ "screenName": "alice" })),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let expected = ProfileDto {
        screen_name: "alice".to_string(),
        company_id: Some("org1".to_string()),
        group_id: Some("g1".to_string()),
        user_id: Some("alice".to_string()),
        ..ProfileDto::default()
    };
    assert_eq!(handler.calls(), vec![Call::AddProfile(expected.clone())]);
    let body: ProfileDto = read_json(response).await;
    assert_eq!(body, expected);
}

#[tokio::test]
async fn test_bearer_prefix_is_accepted() {
    let handler = Arc::new(RecordingHandler::default());
    let auth = format!("Bearer {}", token(&["profile:read"]));

    let response = app(handler.clone())
        .oneshot(request(Method::GET, "/profiles/added", Some(&auth), None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(handler.calls().len(), 1);
}

#[tokio::test]
async fn test_delete_search_scenario_forwards_body_unmodified() {
    let handler = Arc::new(RecordingHandler::default());
    let auth = token(&["profile:delete"]);

    let response = app(handler.clone())
        .oneshot(request(
            Method::POST,
            "/profiles-search/delete",
            Some(&auth),
            Some(serde_json::json!({ "query": "foo", "companyId": "ignored" })),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let message: StatusMessage = read_json(response).await;
    assert_eq!(message.desc, "Profile search deleted successfully");

    let calls = handler.calls();
    let Call::DeleteSearch(received) = &calls[0] else {
        panic!("expected delete_search, got {:?}", calls);
    };
    assert_eq!(received.query, "foo");
    assert_eq!(received.company_id.as_deref(), Some("ignored"));
    assert_eq!(received.group_id, None);
    assert_eq!(received.user_id, None);
}

#[tokio::test]
async fn test_delete_profile_returns_fixed_message() {
    let handler = Arc::new(RecordingHandler::default());
    let auth = token(&["profile:delete"]);

    let response = app(handler)
        .oneshot(request(
            Method::POST,
            "/profiles/delete",
            Some(&auth),
            Some(serde_json::json!({ "screenName": "bob" })),
        ))
        .await
        .unwrap();

    let body: serde_json::Value = read_json(response).await;
    assert_eq!(body, serde_json::json!({ "desc": "Profile deleted successfully" }));
}

#[tokio::test]
async fn test_authorized_profiles_ignore_user_id() {
    let handler = Arc::new(RecordingHandler::default());
    let auth = token(&["profile:read"]);

    let response = app(handler.clone())
        .oneshot(request(
            Method::GET,
            "/profiles/authorized?userId=mallory",
            Some(&auth),
            None,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        handler.calls(),
        vec![Call::GetAuthorized("alice".to_string())]
    );
}

#[tokio::test]
async fn test_discovery_result_by_key() {
    let handler = Arc::new(RecordingHandler::default());
    let auth = token(ALL);

    let response = app(handler.clone())
        .oneshot(request(
            Method::GET,
            "/profiles-search/discovery-results/42",
            Some(&auth),
            None,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        handler.calls(),
        vec![Call::GetDiscoveryResultById(
            "42".to_string(),
            "org1".to_string(),
            "g1".to_string(),
            "alice".to_string()
        )]
    );
}

// --- Fail-closed authorization ---

#[tokio::test]
async fn test_missing_authorization_is_rejected_before_handler() {
    let guarded = [
        (Method::POST, "/profiles", true),
        (Method::POST, "/profiles/delete", true),
        (Method::GET, "/profiles", false),
        (Method::GET, "/profiles/added", false),
        (Method::GET, "/profiles/discovered", false),
        (Method::GET, "/profiles/authorized", false),
        (Method::POST, "/profiles-search", true),
        (Method::POST, "/profiles-search/delete", true),
        (Method::GET, "/profiles-search", false),
        (Method::GET, "/profiles-search/discovery-results/1", false),
    ];

    for (method, uri, has_body) in guarded {
        let handler = Arc::new(RecordingHandler::default());
        let body = has_body.then(|| serde_json::json!({ "screenName": "x", "query": "x" }));
        let response = app(handler.clone())
            .oneshot(request(method.clone(), uri, None, body))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{} {}", method, uri);
        assert!(handler.calls().is_empty(), "{} {} reached the handler", method, uri);
    }
}

#[tokio::test]
async fn test_insufficient_permission_fails_closed() {
    let cases: [(Method, &str, &[&str]); 5] = [
        (Method::POST, "/profiles", &["profile:read"]),
        (Method::POST, "/profiles/delete", &["profile:create", "profile:read"]),
        (Method::GET, "/profiles", &["profile:create"]),
        // Searching needs both create and read.
        (Method::POST, "/profiles-search", &["profile:create"]),
        (Method::POST, "/profiles-search/delete", &["profile:read"]),
    ];

    for (method, uri, grants) in cases {
        let handler = Arc::new(RecordingHandler::default());
        let body = (method == Method::POST)
            .then(|| serde_json::json!({ "screenName": "x", "query": "x" }));
        let response = app(handler.clone())
            .oneshot(request(method.clone(), uri, Some(&token(grants)), body))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::FORBIDDEN, "{} {}", method, uri);
        assert!(handler.calls().is_empty(), "{} {} reached the handler", method, uri);
        let error: ErrorResponse = read_json(response).await;
        assert_eq!(error.code, "forbidden");
    }
}

#[tokio::test]
async fn test_search_with_create_and_read_is_allowed() {
    let handler = Arc::new(RecordingHandler::default());
    let auth = token(&["profile:create", "profile:read"]);

    let response = app(handler.clone())
        .oneshot(request(
            Method::POST,
            "/profiles-search",
            Some(&auth),
            Some(serde_json::json!({ "query": "coffee" })),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(handler.calls().len(), 1);
}

#[tokio::test]
async fn test_token_signed_with_other_secret_is_rejected() {
    let handler = Arc::new(RecordingHandler::default());
    let config = AppConfig {
        jwt_secret: "a-different-secret".to_string(),
        ..test_config()
    };
    let router = create_router(test_state_with(handler.clone(), config));

    let response = router
        .oneshot(request(Method::GET, "/profiles", Some(&token(ALL)), None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(handler.calls().is_empty());
}

// --- Error mapping & routing ---

#[tokio::test]
async fn test_handler_errors_map_to_status_codes() {
    let cases = [
        (HandlerError::NotFound("x".to_string()), StatusCode::NOT_FOUND, "not_found"),
        (HandlerError::InvalidRequest("x".to_string()), StatusCode::BAD_REQUEST, "invalid_request"),
        (HandlerError::Unavailable("x".to_string()), StatusCode::SERVICE_UNAVAILABLE, "unavailable"),
        (HandlerError::Internal("db exploded".to_string()), StatusCode::INTERNAL_SERVER_ERROR, "internal"),
    ];

    for (error, status, code) in cases {
        let handler = Arc::new(RecordingHandler::failing(error));
        let response = app(handler)
            .oneshot(request(Method::GET, "/profiles", Some(&token(ALL)), None))
            .await
            .unwrap();

        assert_eq!(response.status(), status);
        let body: ErrorResponse = read_json(response).await;
        assert_eq!(body.code, code);
        assert!(!body.message.contains("db exploded"));
    }
}

#[tokio::test]
async fn test_malformed_body_is_rejected_before_handler() {
    let handler = Arc::new(RecordingHandler::default());
    let response = app(handler.clone())
        .oneshot(
            Request::builder()
                .method(Method::POST)
                .uri("/profiles")
                .header(header::AUTHORIZATION, token(ALL))
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from("{not json"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert!(response.status().is_client_error());
    assert!(handler.calls().is_empty());
}

#[tokio::test]
async fn test_service_root_prefixes_profile_routes() {
    let handler = Arc::new(RecordingHandler::default());
    let config = AppConfig {
        service_root: "/cafyne".to_string(),
        ..test_config()
    };
    let router = create_router(test_state_with(handler.clone(), config));

    let prefixed = router
        .clone()
        .oneshot(request(Method::GET, "/cafyne/profiles", Some(&token(ALL)), None))
        .await
        .unwrap();
    assert_eq!(prefixed.status(), StatusCode::OK);

    let bare = router
        .oneshot(request(Method::GET, "/profiles", Some(&token(ALL)), None))
        .await
        .unwrap();
    assert_eq!(bare.status(), StatusCode::NOT_FOUND);
    assert_eq!(handler.calls().len(), 1);
}
