use anyhow::{Context, Result, bail};
use env_logger::{Builder, Env, Target};
use log::{debug, error, info};
use smart_door_lock::{
    DeviceConfig, DeviceControlClient,
    config::AppConfig,
    services::{
        poller::StatusPoller,
        session::{Action, DoorSession},
    },
};
use std::io::Write;
use tokio::sync::watch;

enum Command {
    Once(Action),
    Watch,
}

impl Command {
    fn parse(arg: Option<&str>) -> Result<Self> {
        Ok(match arg {
            None | Some("watch") => Command::Watch,
            Some("status") => Command::Once(Action::Refresh),
            Some("lock") => Command::Once(Action::Lock),
            Some("unlock") => Command::Once(Action::Unlock),
            Some(other) => bail!("unknown command {other:?}, expected status, lock, unlock or watch"),
        })
    }
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("application error: {e:#}");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    initialize();

    let command = Command::parse(std::env::args().nth(1).as_deref())?;
    let config = AppConfig::load().context("failed to load configuration")?;

    let client =
        DeviceControlClient::new(&config.client).context("failed to create door controller client")?;
    let device = DeviceConfig::new(config.device.host_address, config.device.auth_key);
    device
        .validate()
        .context("invalid door controller configuration")?;
    let session = DoorSession::new(client, device);

    match command {
        Command::Once(action) => run_once(&session, action).await,
        Command::Watch => {
            watch_door(&session, StatusPoller::new(&config.poller)).await;
            Ok(())
        }
    }
}

fn initialize() {
    log_panics::init();

    let mut builder = if cfg!(debug_assertions) {
        Builder::from_env(Env::default().default_filter_or("debug"))
    } else {
        Builder::from_env(Env::default().default_filter_or("info"))
    };

    builder.format(|f, record| match record.level() {
        log::Level::Error => {
            eprintln!("{}", record.args());
            Ok(())
        }
        _ => {
            writeln!(f, "{}", record.args())
        }
    });

    builder.target(Target::Stdout).init();

    info!("module version: {}", env!("CARGO_PKG_VERSION"));
}

async fn run_once(session: &DoorSession<DeviceControlClient>, action: Action) -> Result<()> {
    let result = session
        .run(action)
        .await
        .with_context(|| action.failure_title())?;

    if let Some(message) = action.success_message() {
        info!("{message}");
    }
    info!("door: {}", result.door);

    Ok(())
}

async fn watch_door(session: &DoorSession<DeviceControlClient>, poller: StatusPoller) {
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let stop = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("failed to listen for ctrl-c: {e}");
            return;
        }
        debug!("ctrl-c received");
        let _ = shutdown_tx.send(true);
    };

    tokio::join!(poller.run(session, shutdown_rx), stop);

    match session.last_update().await {
        Some(at) => info!(
            "last known door state: {} (updated {})",
            session.door_state().await,
            at.format("%H:%M:%S")
        ),
        None => info!("door state was never confirmed"),
    }
}
