//! Door session
//!
//! Keeps the in-memory values a user interface works with: the configured
//! controller, the last known door state and when it was last confirmed.

use crate::{
    device_control_client::{DeviceConfig, DoorController, DoorState, OperationResult},
    error::ClientError,
};
use chrono::{DateTime, Local};
use log::{debug, info};
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::Mutex;

/// A user intent handled by the session
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Action {
    Refresh,
    Lock,
    Unlock,
}

impl Action {
    /// Title under which a failure of this action is shown
    pub fn failure_title(&self) -> &'static str {
        match self {
            Action::Refresh => "Connection Error",
            Action::Lock => "Lock Error",
            Action::Unlock => "Unlock Error",
        }
    }

    /// Confirmation shown after a successful command; status refreshes are silent
    pub fn success_message(&self) -> Option<&'static str> {
        match self {
            Action::Refresh => None,
            Action::Lock => Some("Door locked successfully"),
            Action::Unlock => Some("Door unlocked successfully"),
        }
    }
}

#[derive(Debug)]
struct SessionState {
    config: DeviceConfig,
    door: DoorState,
    reported_door: Option<String>,
    last_update: Option<DateTime<Local>>,
}

pub struct DoorSession<Controller> {
    controller: Controller,
    state: Mutex<SessionState>,
    in_flight: AtomicUsize,
}

struct InFlightGuard<'a>(&'a AtomicUsize);

impl<'a> InFlightGuard<'a> {
    fn enter(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(counter)
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl<Controller> DoorSession<Controller>
where
    Controller: DoorController,
{
    pub fn new(controller: Controller, config: DeviceConfig) -> Self {
        Self {
            controller,
            state: Mutex::new(SessionState {
                config,
                door: DoorState::Unknown,
                reported_door: None,
                last_update: None,
            }),
            in_flight: AtomicUsize::new(0),
        }
    }

    /// Replace the controller address and key
    ///
    /// The previous configuration is kept if the new one is incomplete.
    pub async fn update_config(
        &self,
        host_address: impl Into<String>,
        auth_key: impl Into<String>,
    ) -> Result<(), ClientError> {
        let config = DeviceConfig::new(host_address, auth_key);
        config.validate()?;

        info!("door controller set to {}", config.host_address);
        self.state.lock().await.config = config;
        Ok(())
    }

    pub async fn config(&self) -> DeviceConfig {
        self.state.lock().await.config.clone()
    }

    pub async fn has_valid_config(&self) -> bool {
        self.state.lock().await.config.validate().is_ok()
    }

    pub async fn door_state(&self) -> DoorState {
        self.state.lock().await.door
    }

    /// Door value exactly as last reported by the controller
    pub async fn reported_door(&self) -> Option<String> {
        self.state.lock().await.reported_door.clone()
    }

    pub async fn last_update(&self) -> Option<DateTime<Local>> {
        self.state.lock().await.last_update
    }

    /// Whether any controller request started by this session is outstanding
    pub fn is_busy(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst) > 0
    }

    pub async fn refresh(&self) -> Result<OperationResult, ClientError> {
        self.run(Action::Refresh).await
    }

    pub async fn lock(&self) -> Result<OperationResult, ClientError> {
        self.run(Action::Lock).await
    }

    pub async fn unlock(&self) -> Result<OperationResult, ClientError> {
        self.run(Action::Unlock).await
    }

    /// Perform one controller request for `action`
    ///
    /// On success the reported state becomes the last known state. On failure
    /// the last known state is left untouched.
    pub async fn run(&self, action: Action) -> Result<OperationResult, ClientError> {
        let _guard = InFlightGuard::enter(&self.in_flight);
        let config = self.config().await;

        let result = match action {
            Action::Refresh => self.controller.get_status(config).await,
            Action::Lock => self.controller.lock(config).await,
            Action::Unlock => self.controller.unlock(config).await,
        }?;

        let mut state = self.state.lock().await;
        state.door = result.state();
        state.reported_door = Some(result.door.clone());
        state.last_update = Some(Local::now());
        debug!("{action:?}: door is {}", result.door);

        Ok(result)
    }
}
