//! BDD step definitions for the session feature

use std::sync::atomic::Ordering;
use std::time::Duration;

use cucumber::{given, then, when};

use watchpost::backend::Credentials;
use watchpost::grid::build_tiles;
use watchpost::storage::{FileTokenStore, TokenStore};

use crate::world::{eventually, WatchpostWorld};

#[given(expr = "a backend that issues token {string} for password {string}")]
fn backend_issues_token(world: &mut WatchpostWorld, token: String, password: String) {
    *world.backend.token.lock().unwrap() = token;
    *world.backend.password.lock().unwrap() = password;
}

#[given(expr = "the backend lists camera {string} at {string}")]
fn backend_lists_camera(world: &mut WatchpostWorld, id: String, location: String) {
    let cameras = serde_json::json!([{ "id": id, "location": location }]);
    *world.backend.cameras_json.lock().unwrap() = cameras.to_string();
}

#[given("the backend lists no cameras")]
fn backend_lists_no_cameras(world: &mut WatchpostWorld) {
    *world.backend.cameras_json.lock().unwrap() = "[]".to_string();
}

#[given(expr = "a persisted session token {string}")]
async fn persisted_token(world: &mut WatchpostWorld, token: String) {
    let store = FileTokenStore::new(world.token_path());
    store.save(&token).await.unwrap();
}

#[given(expr = "the operator is logged in with token {string}")]
async fn logged_in(world: &mut WatchpostWorld, token: String) {
    backend_issues_token(world, token, "hunter2".to_string());
    if world.backend.cameras_json.lock().unwrap().is_empty() {
        backend_lists_camera(world, "cam1".to_string(), "Lobby".to_string());
    }
    log_in(world, "ops".to_string(), "hunter2".to_string()).await;
    world.login_result.as_ref().unwrap().as_ref().unwrap();
    let push = world.push.clone();
    let connected = eventually(|| {
        let push = push.clone();
        async move { push.connect_count() >= 1 }
    })
    .await;
    assert!(connected, "alert channel never connected");
}

#[when(expr = "the operator logs in as {string} with password {string}")]
async fn log_in(world: &mut WatchpostWorld, username: String, password: String) {
    let controller = world.controller();
    let result = controller
        .login(&Credentials::new(username, password))
        .await;
    world.login_result = Some(result);
}

#[when("the operator logs out")]
async fn log_out(world: &mut WatchpostWorld) {
    world.controller().logout().await.unwrap();
}

#[when("the dashboard starts")]
async fn dashboard_starts(world: &mut WatchpostWorld) {
    world.controller().rehydrate().await.unwrap();
}

#[when("the camera list starts failing")]
fn cameras_fail(world: &mut WatchpostWorld) {
    world.backend.cameras_failing.store(true, Ordering::SeqCst);
}

#[then("the login should succeed")]
fn login_succeeds(world: &mut WatchpostWorld) {
    let result = world.login_result.as_ref().expect("no login attempt");
    result.as_ref().unwrap();
}

#[then(expr = "the login should fail with {string}")]
async fn login_fails_with(world: &mut WatchpostWorld, message: String) {
    let result = world.login_result.as_ref().expect("no login attempt");
    let err = result.as_ref().unwrap_err();
    assert_eq!(err.to_string(), message);

    let controller = world.controller();
    let state = controller.state().read().await;
    assert_eq!(state.login_error.as_deref(), Some(message.as_str()));
}

#[then(expr = "the session token should be {string}")]
async fn session_token_is(world: &mut WatchpostWorld, token: String) {
    let session = world.controller().session().current().await.expect("no session");
    assert_eq!(session.token(), token);
}

#[then(expr = "the persisted token should be {string}")]
async fn persisted_token_is(world: &mut WatchpostWorld, token: String) {
    let store = FileTokenStore::new(world.token_path());
    assert_eq!(store.load().await.unwrap(), Some(token));
}

#[then("there should be no session")]
async fn no_session(world: &mut WatchpostWorld) {
    assert!(!world.controller().session().is_active().await);
}

#[then("no token should be persisted")]
async fn no_persisted_token(world: &mut WatchpostWorld) {
    let store = FileTokenStore::new(world.token_path());
    assert_eq!(store.load().await.unwrap(), None);
}

#[then(expr = "the grid should show {int} tile(s)")]
async fn grid_shows_tiles(world: &mut WatchpostWorld, count: usize) {
    let controller = world.controller();
    let ok = eventually(|| {
        let controller = controller.clone();
        async move {
            let shown = controller.state().read().await.cameras.len();
            shown == count
        }
    })
    .await;
    assert!(ok, "grid never showed {} tiles", count);
}

#[then(expr = "the stream for {string} should carry token {string}")]
async fn stream_carries_token(world: &mut WatchpostWorld, camera_id: String, token: String) {
    let controller = world.controller();
    let session = controller.session().current().await.expect("no session");
    let state = controller.state().read().await;
    let started = state.session_started_epoch_ms.expect("session not started");
    let tiles = build_tiles(&state.cameras, &session, started, controller.backend());

    let tile = tiles
        .iter()
        .find(|t| t.camera_id == camera_id)
        .expect("no tile for camera");
    assert_eq!(
        tile.stream_url,
        format!(
            "http://localhost:8000/stream/{}?token={}&t={}",
            camera_id, token, started
        )
    );
}

#[then(expr = "the camera list should have been requested with token {string}")]
async fn cameras_requested_with(world: &mut WatchpostWorld, token: String) {
    let backend = world.backend.clone();
    let ok = eventually(|| {
        let backend = backend.clone();
        let token = token.clone();
        async move {
            let requested = backend.camera_requests.lock().unwrap().contains(&token);
            requested
        }
    })
    .await;
    assert!(ok, "camera list never requested with token {}", token);
}

#[then("no further camera requests should be made")]
async fn no_further_camera_requests(world: &mut WatchpostWorld) {
    let before = world.backend.camera_request_count();
    tokio::time::sleep(Duration::from_millis(1500)).await;
    assert_eq!(world.backend.camera_request_count(), before);
}

#[then("the alert feed should be empty")]
async fn alert_feed_empty(world: &mut WatchpostWorld) {
    assert!(world.controller().state().read().await.alerts.is_empty());
}
