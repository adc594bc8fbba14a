//! Caller side services
//!
//! The device control client answers one request at a time. The services
//! here hold the session state around it and schedule status polling.

pub mod poller;
pub mod session;
