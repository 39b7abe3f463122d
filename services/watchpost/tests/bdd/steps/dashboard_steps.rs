//! BDD step definitions for the dashboard feature

use axum::body::Body;
use axum::http::Request;
use cucumber::{then, when};
use tower::ServiceExt;

use watchpost::config::TierThresholds;
use watchpost::dashboard::build_router;

use crate::world::WatchpostWorld;

async fn send(world: &mut WatchpostWorld, request: Request<Body>) {
    let app = build_router(world.controller(), TierThresholds::default(), 2000);
    let response = app.oneshot(request).await.unwrap();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    world.response_body = Some(String::from_utf8(body.to_vec()).unwrap());
}

#[when(expr = "the dashboard page {string} is requested")]
async fn request_page(world: &mut WatchpostWorld, uri: String) {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    send(world, request).await;
}

#[when(expr = "the dashboard receives a POST to {string}")]
async fn post_page(world: &mut WatchpostWorld, uri: String) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    send(world, request).await;
}

#[then(expr = "the response should contain {string}")]
fn response_contains(world: &mut WatchpostWorld, expected: String) {
    let body = world.response_body.as_ref().expect("no response body");
    assert!(
        body.contains(&expected),
        "Expected response to contain '{}', but it didn't.\nResponse body:\n{}",
        expected,
        body
    );
}

#[then(expr = "the response should not contain {string}")]
fn response_lacks(world: &mut WatchpostWorld, unexpected: String) {
    let body = world.response_body.as_ref().expect("no response body");
    assert!(
        !body.contains(&unexpected),
        "Expected response not to contain '{}'.\nResponse body:\n{}",
        unexpected,
        body
    );
}

#[then(expr = "camera {string} should be shown fullscreen")]
async fn fullscreen_is(world: &mut WatchpostWorld, camera: String) {
    let controller = world.controller();
    let state = controller.state().read().await;
    assert_eq!(state.fullscreen.current(), Some(camera.as_str()));
}

#[then("no camera should be shown fullscreen")]
async fn fullscreen_closed(world: &mut WatchpostWorld) {
    let controller = world.controller();
    let state = controller.state().read().await;
    assert!(!state.fullscreen.is_open());
}
