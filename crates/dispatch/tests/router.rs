//! Tests for the typed path routers.

use std::sync::Arc;

use dispatch_engine::{PathActionRoute, PathActionRouter, PathRouter, RouteValue};

struct AppState {
    name: &'static str,
}

struct HttpRequest {
    path: String,
}

fn request(path: &str) -> Arc<HttpRequest> {
    Arc::new(HttpRequest {
        path: path.to_string(),
    })
}

#[tokio::test]
async fn routes_by_extracted_path() {
    let mut router: PathRouter<AppState, HttpRequest, String> =
        PathRouter::new(|req: &HttpRequest| req.path.clone());
    router
        .register("/users/{id}", |state, _req, path_match| async move {
            let id = path_match
                .and_then(|m| m.get("id").map(str::to_string))
                .unwrap_or_default();
            format!("{}:{}", state.name, id)
        })
        .unwrap();

    let state = Arc::new(AppState { name: "app" });
    let out = router.dispatch(Arc::clone(&state), request("/users/42")).await;
    assert_eq!(out.as_deref(), Some("app:42"));

    let miss = router.dispatch(state, request("/posts/1")).await;
    assert_eq!(miss, None);
}

#[tokio::test]
async fn first_matching_rule_wins() {
    let mut router: PathRouter<AppState, HttpRequest, &'static str> =
        PathRouter::new(|req: &HttpRequest| req.path.clone());
    router
        .register("/api/**", |_, _, _| async { "api" })
        .unwrap()
        .register("/**", |_, _, _| async { "fallback" })
        .unwrap();

    let state = Arc::new(AppState { name: "app" });
    assert_eq!(
        router
            .dispatch(Arc::clone(&state), request("/api/v1/users"))
            .await,
        Some("api")
    );
    assert_eq!(router.dispatch(state, request("/health")).await, Some("fallback"));
}

#[tokio::test]
async fn action_router_filters_by_action() {
    let mut router: PathActionRouter<AppState, HttpRequest, &'static str> =
        PathActionRouter::new(|req: &HttpRequest| req.path.clone());
    router
        .register_in("/users/*", [RouteValue::from("GET")], |_, _, _| async {
            "read"
        })
        .unwrap()
        .register_not_in("/users/*", [RouteValue::from("DELETE")], |_, _, _| async {
            "write"
        })
        .unwrap();

    let state = Arc::new(AppState { name: "app" });

    let out = router
        .dispatch(
            Arc::clone(&state),
            request("/users/1"),
            Some(RouteValue::from("GET")),
        )
        .await;
    assert_eq!(out, Some("read"));

    let out = router
        .dispatch(
            Arc::clone(&state),
            request("/users/1"),
            Some(RouteValue::from("POST")),
        )
        .await;
    assert_eq!(out, Some("write"));

    // DELETE is excluded by both rules.
    let out = router
        .dispatch(state, request("/users/1"), Some(RouteValue::from("DELETE")))
        .await;
    assert_eq!(out, None);
}

#[tokio::test]
async fn route_tables_register_in_order() {
    let routes = vec![
        PathActionRoute::in_actions(
            "/orders/{id}",
            [RouteValue::from("GET")],
            |_: Arc<AppState>, _: Arc<HttpRequest>, m| async move {
                m.and_then(|m| m.get("id").map(str::to_string))
                    .unwrap_or_default()
            },
        ),
        PathActionRoute::all("/**", |_, _, _| async { "any".to_string() }),
    ];

    let mut router: PathActionRouter<AppState, HttpRequest, String> =
        PathActionRouter::new(|req: &HttpRequest| req.path.clone());
    router.register_routes(routes).unwrap();
    assert_eq!(router.len(), 2);

    let state = Arc::new(AppState { name: "app" });
    let out = router
        .dispatch(
            Arc::clone(&state),
            request("/orders/9"),
            Some(RouteValue::from("GET")),
        )
        .await;
    assert_eq!(out.as_deref(), Some("9"));

    let out = router.dispatch(state, request("/orders/9"), None).await;
    assert_eq!(out.as_deref(), Some("any"));
}

#[tokio::test]
async fn empty_pattern_registration_fails() {
    let mut router: PathRouter<AppState, HttpRequest, ()> =
        PathRouter::new(|req: &HttpRequest| req.path.clone());
    assert!(router.register("", |_, _, _| async {}).is_err());
    assert!(router.is_empty());
}
