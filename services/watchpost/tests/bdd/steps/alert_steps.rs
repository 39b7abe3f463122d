//! BDD step definitions for the alerts feature

use cucumber::{then, when};

use watchpost::config::TierThresholds;
use watchpost::panel::{build_views, AlertView};

use crate::world::{eventually, WatchpostWorld};

fn detection(camera_id: &str, confidence: f64) -> String {
    serde_json::json!({
        "type": "detection",
        "data": {
            "person": { "name": null },
            "camera_id": camera_id,
            "track_id": 7,
            "timestamp": "2024-01-01T00:00:00Z",
            "confidence": confidence,
        }
    })
    .to_string()
}

async fn views(world: &mut WatchpostWorld) -> Vec<AlertView> {
    let controller = world.controller();
    let state = controller.state().read().await;
    build_views(&state.alerts, &TierThresholds::default(), controller.backend())
}

async fn wait_for_alerts(world: &mut WatchpostWorld, count: usize) {
    let controller = world.controller();
    let ok = eventually(|| {
        let controller = controller.clone();
        async move {
            let len = controller.state().read().await.alerts.len();
            len == count
        }
    })
    .await;
    assert!(ok, "alert feed never reached {} entries", count);
}

#[when(expr = "the backend publishes a detection on {string} with confidence {float}")]
fn publish_detection(world: &mut WatchpostWorld, camera_id: String, confidence: f64) {
    world.push.publish(&detection(&camera_id, confidence));
}

#[when(expr = "the backend publishes {int} detections")]
fn publish_many(world: &mut WatchpostWorld, count: usize) {
    for i in 0..count {
        world.push.publish(&detection(&format!("cam{}", i), 0.5));
    }
}

#[when(expr = "the backend publishes the raw message {string}")]
fn publish_raw(world: &mut WatchpostWorld, text: String) {
    world.push.publish(&text);
}

#[then(expr = "the alert feed should hold {int} alert(s)")]
async fn feed_holds(world: &mut WatchpostWorld, count: usize) {
    wait_for_alerts(world, count).await;
}

#[then("the newest alert should be tagged NEW")]
async fn newest_is_new(world: &mut WatchpostWorld) {
    let views = views(world).await;
    assert!(views[0].is_new);
    assert_eq!(views.iter().filter(|v| v.is_new).count(), 1);
}

#[then(expr = "the newest alert should be in the {string} tier")]
async fn newest_tier(world: &mut WatchpostWorld, tier: String) {
    let views = views(world).await;
    let actual = views[0].tier.map(|t| t.label()).unwrap_or("none");
    assert_eq!(actual, tier);
}

#[then(expr = "the newest alert should read {string} on {string} as {string}")]
async fn newest_reads(world: &mut WatchpostWorld, subject: String, camera: String, track: String) {
    let views = views(world).await;
    assert_eq!(views[0].subject, subject);
    assert_eq!(views[0].camera_id, camera);
    assert_eq!(views[0].track_label.as_deref(), Some(track.as_str()));
}

#[then(expr = "the newest alert should come from {string}")]
async fn newest_from(world: &mut WatchpostWorld, camera: String) {
    let views = views(world).await;
    assert_eq!(views[0].camera_id, camera);
}

#[then(expr = "the oldest alert should come from {string}")]
async fn oldest_from(world: &mut WatchpostWorld, camera: String) {
    let views = views(world).await;
    assert_eq!(views.last().expect("empty feed").camera_id, camera);
}
