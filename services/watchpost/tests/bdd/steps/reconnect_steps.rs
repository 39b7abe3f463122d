//! BDD step definitions for the push channel reconnection feature

use std::sync::atomic::Ordering;
use std::time::Duration;

use cucumber::{given, then, when};

use watchpost::state::ChannelStatus;

use crate::world::{eventually, WatchpostWorld};

fn parse_status(s: &str) -> ChannelStatus {
    match s {
        "disconnected" => ChannelStatus::Disconnected,
        "connecting" => ChannelStatus::Connecting,
        "connected" => ChannelStatus::Connected,
        "retry pending" => ChannelStatus::RetryPending,
        other => panic!("Unknown channel status: {}", other),
    }
}

#[given(expr = "a reconnect delay of {int} ms")]
fn reconnect_delay(world: &mut WatchpostWorld, delay_ms: u64) {
    world.reconnect_delay_ms = Some(delay_ms);
}

#[when("the backend drops the alert channel")]
fn drop_channel(world: &mut WatchpostWorld) {
    world.push.drop_connection();
}

#[when("the backend refuses new alert channels")]
fn refuse_channels(world: &mut WatchpostWorld) {
    world.push.refuse.store(true, Ordering::SeqCst);
}

#[when("the backend accepts alert channels again")]
fn accept_channels(world: &mut WatchpostWorld) {
    world.push.refuse.store(false, Ordering::SeqCst);
}

#[when(expr = "{int} ms pass")]
async fn time_passes(_world: &mut WatchpostWorld, millis: u64) {
    tokio::time::sleep(Duration::from_millis(millis)).await;
}

#[then(expr = "the alert channel should be {string}")]
async fn channel_is(world: &mut WatchpostWorld, status: String) {
    let expected = parse_status(&status);
    let controller = world.controller();
    let ok = eventually(|| {
        let controller = controller.clone();
        async move {
            let channel = controller.state().read().await.channel;
            channel == expected
        }
    })
    .await;
    assert!(ok, "alert channel never became {}", status);
}

#[then(expr = "the alert channel should have been opened {int} time(s)")]
async fn opened_times(world: &mut WatchpostWorld, count: usize) {
    let push = world.push.clone();
    let ok = eventually(|| {
        let push = push.clone();
        async move { push.connect_count() >= count }
    })
    .await;
    assert!(ok, "alert channel opened only {} times", push.connect_count());
    assert_eq!(push.connect_count(), count);
}

#[then(expr = "consecutive openings should be at least {int} ms apart")]
fn openings_spaced(world: &mut WatchpostWorld, delay_ms: u64) {
    let connects = world.push.connects.lock().unwrap().clone();
    for pair in connects.windows(2) {
        let gap = pair[1] - pair[0];
        assert!(
            gap >= Duration::from_millis(delay_ms),
            "reconnected after only {:?}",
            gap
        );
    }
}

#[then(expr = "{int} reconnection attempt(s) should be reported")]
async fn attempts_reported(world: &mut WatchpostWorld, attempts: u32) {
    let controller = world.controller();
    let state = controller.state().read().await;
    assert_eq!(state.reconnect_attempts, attempts);
}
