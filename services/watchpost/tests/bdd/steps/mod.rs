//! BDD step definitions for the watchpost dashboard

pub mod alert_steps;
pub mod dashboard_steps;
pub mod reconnect_steps;
pub mod session_steps;
