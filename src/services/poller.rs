//! Periodic door status polling
//!
//! The poller is owned by the caller and drives `DoorSession::refresh` on a
//! fixed cadence. The controller client itself never polls.

use crate::{
    config::PollerConfig,
    device_control_client::{DoorController, DoorState},
    error::ClientError,
    services::session::{Action, DoorSession},
};
use log::{debug, error, info};
use std::time::Duration;
use tokio::{
    sync::watch,
    time::{MissedTickBehavior, interval},
};

/// What a single poll did
#[derive(Debug, PartialEq)]
pub enum PollOutcome {
    /// A request was still outstanding or the configuration is incomplete
    Skipped,
    Updated(DoorState),
    Failed(ClientError),
}

pub struct StatusPoller {
    interval: Duration,
}

impl StatusPoller {
    pub fn new(config: &PollerConfig) -> Self {
        Self {
            interval: config.interval,
        }
    }

    /// Poll until `shutdown` changes or its sender is dropped
    ///
    /// The first status check happens immediately. Ticks that fall due while
    /// a poll is still running are skipped rather than queued.
    pub async fn run<Controller>(
        &self,
        session: &DoorSession<Controller>,
        mut shutdown: watch::Receiver<bool>,
    ) where
        Controller: DoorController,
    {
        info!("polling door status every {}s", self.interval.as_secs());

        let mut ticker = interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.poll_once(session).await;
                }
                _ = shutdown.changed() => {
                    debug!("status polling stopped");
                    break;
                }
            }
        }
    }

    /// Run one status check unless the session is busy or unconfigured
    pub async fn poll_once<Controller>(&self, session: &DoorSession<Controller>) -> PollOutcome
    where
        Controller: DoorController,
    {
        if session.is_busy() {
            debug!("skipping status poll: request in progress");
            return PollOutcome::Skipped;
        }

        if !session.has_valid_config().await {
            debug!("skipping status poll: controller not configured");
            return PollOutcome::Skipped;
        }

        match session.run(Action::Refresh).await {
            Ok(result) => PollOutcome::Updated(result.state()),
            Err(e) => {
                error!("{}: {e} ({})", Action::Refresh.failure_title(), e.kind());
                PollOutcome::Failed(e)
            }
        }
    }
}
