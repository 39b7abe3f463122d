//! Web dashboard: login form, camera grid, alerts panel and JSON API

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::header;
use axum::response::{Html, IntoResponse, Redirect};
use axum::routing::{get, post};
use axum::{Form, Router};
use serde::Deserialize;

use crate::backend::Credentials;
use crate::config::{LoginMode, TierThresholds};
use crate::controller::SessionController;
use crate::grid::{build_tiles, CameraTile, OverlayClick, PLACEHOLDER_PATH};
use crate::panel::{build_views, AlertView};

const PLACEHOLDER_SVG: &str = r##"<svg xmlns="http://www.w3.org/2000/svg" width="640" height="360" viewBox="0 0 640 360"><rect width="640" height="360" fill="#343a40"/><g fill="none" stroke="#adb5bd" stroke-width="8"><rect x="250" y="140" width="110" height="80" rx="8"/><path d="M360 165l40-25v80l-40-25z"/><path d="M240 120l170 120"/></g><text x="320" y="290" fill="#adb5bd" font-family="system-ui, sans-serif" font-size="22" text-anchor="middle">Camera offline</text></svg>"##;

/// Dashboard application state
#[derive(Clone)]
pub struct AppState {
    pub controller: Arc<SessionController>,
    pub tiers: TierThresholds,
    pub alerts_refresh_ms: u64,
}

/// Build the dashboard axum router
pub fn build_router(
    controller: Arc<SessionController>,
    tiers: TierThresholds,
    alerts_refresh_ms: u64,
) -> Router {
    let app_state = AppState {
        controller,
        tiers,
        alerts_refresh_ms,
    };

    Router::new()
        .route("/", get(index_handler))
        .route("/fragments/alerts", get(alerts_fragment_handler))
        .route(PLACEHOLDER_PATH, get(placeholder_handler))
        .route("/login", post(login_handler))
        .route("/logout", post(logout_handler))
        .route("/login/error/dismiss", post(dismiss_error_handler))
        .route("/cameras/{id}/fullscreen", post(fullscreen_open_handler))
        .route("/fullscreen/close", post(fullscreen_close_handler))
        .route("/alerts/{seq}/toggle", post(toggle_alert_handler))
        .route("/api/session", get(session_handler))
        .route("/api/cameras", get(cameras_handler))
        .route("/api/alerts", get(alerts_handler))
        .route("/health", get(health_handler))
        .with_state(app_state)
}

#[derive(Debug, Deserialize)]
struct LoginForm {
    #[serde(default)]
    username: String,
    #[serde(default)]
    password: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CloseParams {
    #[serde(default)]
    target: Option<String>,
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

async fn index_handler(State(app): State<AppState>) -> impl IntoResponse {
    let Some(session) = app.controller.session().current().await else {
        let login_error = app.controller.state().read().await.login_error.clone();
        return Html(render_login(
            login_error.as_deref(),
            app.controller.backend().login_mode(),
        ));
    };

    let state = app.controller.state().read().await;
    let backend = app.controller.backend();
    let discriminator = state.session_started_epoch_ms.unwrap_or_default();
    let tiles = build_tiles(&state.cameras, &session, discriminator, backend);
    let overlay = state
        .fullscreen
        .current()
        .and_then(|id| tiles.iter().find(|t| t.camera_id == id));
    let views = build_views(&state.alerts, &app.tiers, backend);

    Html(render_dashboard(
        &tiles,
        overlay,
        &render_alerts(&views),
        &state.channel.to_string(),
        state.reconnect_attempts,
        app.alerts_refresh_ms,
    ))
}

fn render_login(error: Option<&str>, mode: LoginMode) -> String {
    let banner = error
        .map(|message| {
            format!(
                r#"<div id="login-error" style="display: flex; justify-content: space-between; align-items: center; padding: 0.75rem 1rem; margin-bottom: 1rem; border-radius: 0.25rem; color: #721c24; background-color: #f8d7da;">
            <span>{}</span>
            <form method="post" action="/login/error/dismiss" style="margin: 0;">
                <button type="submit" aria-label="Dismiss" style="border: none; background: none; font-size: 1.25rem; cursor: pointer; color: #721c24;">&times;</button>
            </form>
        </div>"#,
                escape(message)
            )
        })
        .unwrap_or_default();

    let fields = match mode {
        LoginMode::Password => {
            r#"<label style="display: block; margin-bottom: 0.75rem;">Username
                <input name="username" type="text" autocomplete="username" style="display: block; width: 100%; padding: 0.5rem; margin-top: 0.25rem;">
            </label>
            <label style="display: block; margin-bottom: 1rem;">Password
                <input name="password" type="password" autocomplete="current-password" style="display: block; width: 100%; padding: 0.5rem; margin-top: 0.25rem;">
            </label>"#
        }
        LoginMode::Passwordless => {
            r#"<label style="display: block; margin-bottom: 1rem;">Email
                <input name="username" type="email" autocomplete="email" style="display: block; width: 100%; padding: 0.5rem; margin-top: 0.25rem;">
            </label>"#
        }
    };

    format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
    <meta name="viewport" content="width=device-width, initial-scale=1">
    <title>Watchpost Login</title>
</head>
<body style="font-family: system-ui, sans-serif; max-width: 360px; margin: 4rem auto; padding: 1rem;">
    <h1>Watchpost</h1>
    {banner}
    <form method="post" action="/login">
        {fields}
        <button type="submit" style="width: 100%; padding: 0.5rem; border: none; border-radius: 0.25rem; color: #fff; background-color: #0d6efd; cursor: pointer;">Log in</button>
    </form>
</body>
</html>"#,
        banner = banner,
        fields = fields,
    )
}

fn render_tile(tile: &CameraTile) -> String {
    format!(
        r#"<div style="border: 1px solid #dee2e6; border-radius: 0.25rem; overflow: hidden;">
            <div style="padding: 0.25rem 0.5rem; font-weight: 600; background-color: #f8f9fa;">{title}</div>
            <form method="post" action="/cameras/{id}/fullscreen" style="margin: 0;">
                <button type="submit" style="display: block; width: 100%; padding: 0; border: none; background: #000; cursor: zoom-in;">
                    <img src="{src}" alt="{title}" onerror="this.onerror=null;this.src='{placeholder}'" style="display: block; width: 100%; aspect-ratio: 16 / 9; object-fit: cover;">
                </button>
            </form>
        </div>"#,
        title = escape(&tile.title),
        id = escape(&path_segment(&tile.camera_id)),
        src = escape(&tile.stream_url),
        placeholder = tile.placeholder_url,
    )
}

/// Percent-encode a camera id for use as one path segment
fn path_segment(id: &str) -> String {
    let mut out = String::with_capacity(id.len());
    for b in id.bytes() {
        if b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b'.' | b'~') {
            out.push(b as char);
        } else {
            out.push_str(&format!("%{:02X}", b));
        }
    }
    out
}

fn render_overlay(tile: &CameraTile) -> String {
    format!(
        r#"<form id="overlay-close" method="post" action="/fullscreen/close"></form>
    <div id="overlay" onclick="document.getElementById('overlay-close').submit()" style="position: fixed; inset: 0; display: flex; flex-direction: column; align-items: center; justify-content: center; background-color: rgba(0, 0, 0, 0.85); z-index: 10; cursor: zoom-out;">
        <div style="color: #fff; margin-bottom: 0.5rem;">{title}</div>
        <img src="{src}" alt="{title}" onclick="event.stopPropagation()" onerror="this.onerror=null;this.src='{placeholder}'" style="max-width: 95vw; max-height: 85vh; cursor: default;">
    </div>"#,
        title = escape(&tile.title),
        src = escape(&tile.stream_url),
        placeholder = tile.placeholder_url,
    )
}

fn render_dashboard(
    tiles: &[CameraTile],
    overlay: Option<&CameraTile>,
    alerts_html: &str,
    channel: &str,
    reconnect_attempts: u32,
    alerts_refresh_ms: u64,
) -> String {
    let grid = if tiles.is_empty() {
        r#"<p style="color: #6c757d;">No cameras available.</p>"#.to_string()
    } else {
        let tiles: String = tiles.iter().map(render_tile).collect();
        format!(
            r#"<div style="display: grid; grid-template-columns: repeat(auto-fill, minmax(320px, 1fr)); gap: 1rem;">{}</div>"#,
            tiles
        )
    };
    let overlay = overlay.map(render_overlay).unwrap_or_default();
    let camera_ids: Vec<&str> = tiles.iter().map(|t| t.camera_id.as_str()).collect();
    let camera_ids = serde_json::to_string(&camera_ids)
        .unwrap_or_else(|_| "[]".to_string())
        .replace('<', "\\u003c");

    format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
    <meta name="viewport" content="width=device-width, initial-scale=1">
    <title>Watchpost Dashboard</title>
    <script>
        const knownCameras = JSON.stringify({camera_ids});
        function refreshAlerts() {{
            fetch('/fragments/alerts')
                .then(r => r.text())
                .then(html => {{ document.getElementById('alerts-panel').innerHTML = html; }});
        }}
        function toggleAlert(seq) {{
            fetch('/alerts/' + seq + '/toggle', {{ method: 'POST' }})
                .then(r => r.text())
                .then(html => {{ document.getElementById('alerts-panel').innerHTML = html; }});
        }}
        function refreshSession() {{
            fetch('/api/session')
                .then(r => r.json())
                .then(session => {{
                    if (!session.logged_in) {{ location.reload(); return; }}
                    document.getElementById('channel-status').textContent = session.channel;
                    return fetch('/api/cameras')
                        .then(r => r.json())
                        .then(cameras => {{
                            if (JSON.stringify(cameras.map(c => c.camera_id)) !== knownCameras) {{
                                location.reload();
                            }}
                        }});
                }});
        }}
        setInterval(refreshAlerts, {alerts_refresh_ms});
        setInterval(refreshSession, 5000);
    </script>
</head>
<body style="font-family: system-ui, sans-serif; max-width: 1280px; margin: 0 auto; padding: 1rem;">
    <header style="display: flex; justify-content: space-between; align-items: center;">
        <h1>Watchpost Dashboard</h1>
        <div>
            <span style="margin-right: 1rem; color: #6c757d;">Alerts: <span id="channel-status">{channel}</span> (reconnects: {reconnect_attempts})</span>
            <form method="post" action="/logout" style="display: inline;">
                <button type="submit" style="padding: 0.25rem 0.75rem;">Log out</button>
            </form>
        </div>
    </header>
    <div style="display: grid; grid-template-columns: 3fr 1fr; gap: 1rem;">
        <section>
            <h2>Cameras</h2>
            {grid}
        </section>
        <section>
            <h2>Alerts</h2>
            <div id="alerts-panel">{alerts_html}</div>
        </section>
    </div>
    {overlay}
</body>
</html>"#,
        camera_ids = camera_ids,
        alerts_refresh_ms = alerts_refresh_ms,
        channel = escape(channel),
        reconnect_attempts = reconnect_attempts,
        grid = grid,
        alerts_html = alerts_html,
        overlay = overlay,
    )
}

fn render_alert(view: &AlertView) -> String {
    let (color, bg) = view
        .tier
        .map(|t| t.colors())
        .unwrap_or(("#383d41", "#e2e3e5"));
    let new_badge = if view.is_new {
        r#"<span style="margin-left: 0.5rem; padding: 0.1em 0.4em; border-radius: 0.25rem; font-size: 0.75em; font-weight: 700; color: #fff; background-color: #dc3545;">NEW</span>"#
    } else {
        ""
    };
    let track = view
        .track_label
        .as_deref()
        .map(|t| format!(" · {}", escape(t)))
        .unwrap_or_default();
    let score = view
        .score
        .as_deref()
        .map(|s| {
            format!(
                r#"<span style="display: inline-block; padding: 0.1em 0.5em; border-radius: 0.25rem; font-size: 0.85em; font-weight: 600; color: {}; background-color: {};">{}</span>"#,
                color,
                bg,
                escape(s)
            )
        })
        .unwrap_or_default();

    let snapshot = view
        .snapshot_url
        .as_deref()
        .map(|url| {
            format!(
                r#"<img src="{}" alt="Snapshot" onerror="this.style.display='none'" style="display: block; width: 100%; margin-top: 0.5rem; border-radius: 0.25rem;">"#,
                escape(url)
            )
        })
        .unwrap_or_default();

    let details = if view.expanded {
        let tier = view.tier.map(|t| t.label()).unwrap_or("none");
        format!(
            r#"<div style="margin-top: 0.5rem; font-size: 0.85em; color: #495057;">
                <div>Camera: {camera}</div>
                <div>Timestamp: {raw}</div>
                <div>Confidence tier: {tier}</div>
            </div>"#,
            camera = escape(&view.camera_id),
            raw = escape(&view.raw_timestamp),
            tier = tier,
        )
    } else {
        String::new()
    };

    format!(
        r#"<li onclick="toggleAlert({seq})" style="padding: 0.5rem; border-left: 4px solid {color}; border-bottom: 1px solid #dee2e6; cursor: pointer; list-style: none;">
            <div><strong>{subject}</strong>{new_badge}</div>
            <div style="font-size: 0.85em; color: #6c757d;">{camera}{track} · {time}</div>
            <div>{score}</div>
            {snapshot}
            {details}
        </li>"#,
        seq = view.seq,
        color = color,
        subject = escape(&view.subject),
        new_badge = new_badge,
        camera = escape(&view.camera_id),
        track = track,
        time = escape(&view.time),
        score = score,
        snapshot = snapshot,
        details = details,
    )
}

fn render_alerts(views: &[AlertView]) -> String {
    if views.is_empty() {
        return r#"<p style="color: #6c757d;">No detections yet.</p>"#.to_string();
    }
    let items: String = views.iter().map(render_alert).collect();
    format!(r#"<ul style="margin: 0; padding: 0;">{}</ul>"#, items)
}

async fn current_alerts_html(app: &AppState) -> String {
    let state = app.controller.state().read().await;
    render_alerts(&build_views(
        &state.alerts,
        &app.tiers,
        app.controller.backend(),
    ))
}

async fn alerts_fragment_handler(State(app): State<AppState>) -> impl IntoResponse {
    Html(current_alerts_html(&app).await)
}

async fn placeholder_handler() -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "image/svg+xml")], PLACEHOLDER_SVG)
}

async fn login_handler(
    State(app): State<AppState>,
    Form(form): Form<LoginForm>,
) -> impl IntoResponse {
    let credentials = match app.controller.backend().login_mode() {
        LoginMode::Password => {
            Credentials::new(form.username, form.password.unwrap_or_default())
        }
        LoginMode::Passwordless => Credentials::passwordless(form.username),
    };
    // Failures are recorded on the shared state and shown by the login page
    let _ = app.controller.login(&credentials).await;
    Redirect::to("/")
}

async fn logout_handler(State(app): State<AppState>) -> impl IntoResponse {
    if let Err(e) = app.controller.logout().await {
        tracing::warn!("Logout could not clear stored session: {}", e);
    }
    Redirect::to("/")
}

async fn dismiss_error_handler(State(app): State<AppState>) -> impl IntoResponse {
    app.controller.dismiss_error().await;
    Redirect::to("/")
}

async fn fullscreen_open_handler(
    State(app): State<AppState>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    {
        let mut guard = app.controller.state().write().await;
        let state = &mut *guard;
        state.fullscreen.open(&id, &state.cameras);
    }
    Redirect::to("/")
}

async fn fullscreen_close_handler(
    State(app): State<AppState>,
    Query(params): Query<CloseParams>,
) -> impl IntoResponse {
    let target = match params.target.as_deref() {
        Some("image") => OverlayClick::Image,
        _ => OverlayClick::Backdrop,
    };
    app.controller.state().write().await.fullscreen.click(target);
    Redirect::to("/")
}

async fn toggle_alert_handler(
    State(app): State<AppState>,
    Path(seq): Path<u64>,
) -> impl IntoResponse {
    app.controller
        .state()
        .write()
        .await
        .alerts
        .toggle_selection(seq);
    Html(current_alerts_html(&app).await)
}

async fn session_handler(State(app): State<AppState>) -> impl IntoResponse {
    let logged_in = app.controller.session().is_active().await;
    let state = app.controller.state().read().await;

    axum::Json(serde_json::json!({
        "logged_in": logged_in,
        "channel": state.channel,
        "reconnect_attempts": state.reconnect_attempts,
        "login_error": state.login_error,
        "session_started_epoch_ms": state.session_started_epoch_ms,
        "fullscreen": state.fullscreen.current(),
        "uptime_seconds": state.started_at.elapsed().as_secs(),
    }))
}

async fn cameras_handler(State(app): State<AppState>) -> impl IntoResponse {
    let Some(session) = app.controller.session().current().await else {
        return axum::Json(Vec::<CameraTile>::new());
    };
    let state = app.controller.state().read().await;
    let discriminator = state.session_started_epoch_ms.unwrap_or_default();
    axum::Json(build_tiles(
        &state.cameras,
        &session,
        discriminator,
        app.controller.backend(),
    ))
}

async fn alerts_handler(State(app): State<AppState>) -> impl IntoResponse {
    let state = app.controller.state().read().await;
    axum::Json(build_views(
        &state.alerts,
        &app.tiers,
        app.controller.backend(),
    ))
}

async fn health_handler() -> impl IntoResponse {
    "OK"
}
