//! Camera grid: one live tile per camera plus a fullscreen overlay

use serde::Serialize;

use crate::backend::BackendClient;
use crate::models::Camera;
use crate::session::Session;

/// Image shown when a tile's stream cannot be loaded
pub const PLACEHOLDER_PATH: &str = "/static/camera-offline.svg";

/// Render-ready description of one camera tile
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CameraTile {
    pub camera_id: String,
    pub title: String,
    pub stream_url: String,
    pub placeholder_url: String,
}

/// Tile heading from location and id; a missing location reads "Camera"
pub fn tile_title(camera: &Camera) -> String {
    let location = camera
        .location
        .as_deref()
        .filter(|l| !l.trim().is_empty())
        .unwrap_or("Camera");
    format!("{} — {}", location, camera.id)
}

/// One tile per camera, in registry order
pub fn build_tiles(
    cameras: &[Camera],
    session: &Session,
    discriminator: u64,
    backend: &BackendClient,
) -> Vec<CameraTile> {
    cameras
        .iter()
        .map(|camera| CameraTile {
            camera_id: camera.id.clone(),
            title: tile_title(camera),
            stream_url: backend.stream_url(&camera.id, session.token(), discriminator),
            placeholder_url: PLACEHOLDER_PATH.to_string(),
        })
        .collect()
}

/// Where a click inside the open overlay landed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverlayClick {
    Backdrop,
    Image,
}

/// Single-tile fullscreen view
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FullscreenOverlay {
    camera_id: Option<String>,
}

impl FullscreenOverlay {
    /// Show `camera_id` fullscreen. Cameras not in `cameras` are ignored.
    pub fn open(&mut self, camera_id: &str, cameras: &[Camera]) -> bool {
        if !cameras.iter().any(|c| c.id == camera_id) {
            tracing::debug!("Ignoring fullscreen request for unknown camera '{}'", camera_id);
            return false;
        }
        self.camera_id = Some(camera_id.to_string());
        true
    }

    pub fn close(&mut self) {
        self.camera_id = None;
    }

    /// Backdrop clicks close the overlay; clicks on the image itself do not
    pub fn click(&mut self, target: OverlayClick) {
        if target == OverlayClick::Backdrop {
            self.close();
        }
    }

    /// Close the overlay if its camera is no longer present
    pub fn retain(&mut self, cameras: &[Camera]) {
        if let Some(id) = &self.camera_id {
            if !cameras.iter().any(|c| &c.id == id) {
                self.camera_id = None;
            }
        }
    }

    pub fn current(&self) -> Option<&str> {
        self.camera_id.as_deref()
    }

    pub fn is_open(&self) -> bool {
        self.camera_id.is_some()
    }
}
