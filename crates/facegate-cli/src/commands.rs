//! Subcommand handlers.

use crate::config::Settings;
use anyhow::{Context, Result};
use facegate_access::{
    AccessError, AuthorizationCoordinator, Matcher, OpaqueTokenIssuer, SessionConfig,
};
use facegate_core::{Identity, IdentityId};
use facegate_hardware::{
    AnyFaceExtractor, DeviceBridge, DeviceMirror, PrecomputedExtractor, SerialPortConnector,
    TransportLink, available_ports,
};
use facegate_storage::{
    AccessEventRepository, Database, SqliteAccessEventRepository, SqliteSignatureStore,
};
use serde::Serialize;
use std::io::Read;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

type Coordinator = AuthorizationCoordinator<
    AnyFaceExtractor,
    SqliteSignatureStore,
    SqliteAccessEventRepository,
    OpaqueTokenIssuer,
>;

async fn open_database(settings: &Settings) -> Result<Database> {
    Database::new(settings.database())
        .await
        .with_context(|| format!("opening database {}", settings.database))
}

fn open_link(settings: &Settings) -> Arc<TransportLink> {
    Arc::new(TransportLink::new(settings.link(), SerialPortConnector::new()))
}

fn coordinator(settings: &Settings, db: &Database) -> Result<Coordinator> {
    Ok(AuthorizationCoordinator::new(
        PrecomputedExtractor::new().into(),
        SqliteSignatureStore::with_policy(db.pool().clone(), settings.policy),
        SqliteAccessEventRepository::new(db.pool().clone()),
        OpaqueTokenIssuer::new(SessionConfig::default())?,
        Matcher::new(settings.matcher())?,
        open_link(settings),
    ))
}

fn read_frame(path: &Path) -> Result<Vec<u8>> {
    if path == Path::new("-") {
        let mut buffer = Vec::new();
        std::io::stdin()
            .read_to_end(&mut buffer)
            .context("reading frame from stdin")?;
        return Ok(buffer);
    }
    std::fs::read(path).with_context(|| format!("reading frame {}", path.display()))
}

fn print_json(value: &impl Serialize) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub async fn enroll(settings: &Settings, id: &str, name: Option<&str>, frame: &Path) -> Result<()> {
    let identity = Identity::new(IdentityId::new(id)?, name.unwrap_or(id))?;
    let frame = read_frame(frame)?;
    let db = open_database(settings).await?;

    let enrollment = coordinator(settings, &db)?.enroll(&identity, &frame).await?;
    info!(
        identity = %enrollment.identity.id,
        samples = enrollment.sample_count,
        "Face registered"
    );
    print_json(&enrollment)?;

    db.close().await;
    Ok(())
}

pub async fn authenticate(settings: &Settings, frame: &Path) -> Result<()> {
    let frame = read_frame(frame)?;
    let db = open_database(settings).await?;
    let coordinator = coordinator(settings, &db)?;

    let outcome = coordinator.authorize(&frame).await;
    coordinator.link().disconnect();
    db.close().await;

    match outcome {
        Ok(authorization) => {
            println!("Welcome, {}!", authorization.identity.display_name);
            print_json(&authorization)
        }
        Err(e @ (AccessError::NoFaceDetected
        | AccessError::NoCandidates
        | AccessError::RejectedMatch { .. })) => {
            anyhow::bail!("Access denied: {e}")
        }
        Err(e) => Err(e.into()),
    }
}

pub async fn list_faces(settings: &Settings) -> Result<()> {
    let db = open_database(settings).await?;
    let faces = coordinator(settings, &db)?.list_enrollments().await?;

    if faces.is_empty() {
        println!("No faces enrolled.");
    } else {
        print_json(&faces)?;
    }

    db.close().await;
    Ok(())
}

pub async fn remove_face(settings: &Settings, id: &str) -> Result<()> {
    let identity_id = IdentityId::new(id)?;
    let db = open_database(settings).await?;

    coordinator(settings, &db)?.remove(&identity_id).await?;
    println!("Face for \"{identity_id}\" deleted");

    db.close().await;
    Ok(())
}

pub async fn events(settings: &Settings, limit: i64, identity: Option<&str>) -> Result<()> {
    let db = open_database(settings).await?;
    let repo = SqliteAccessEventRepository::new(db.pool().clone());

    let events = match identity {
        Some(id) => repo.find_by_identity(&IdentityId::new(id)?, limit).await?,
        None => repo.find_recent(limit).await?,
    };
    print_json(&events)?;

    db.close().await;
    Ok(())
}

pub async fn monitor(settings: &Settings, interval: u64) -> Result<()> {
    let link = open_link(settings);
    let mirror = Arc::new(DeviceMirror::new());
    let reader = link.spawn_reader(Arc::clone(&mirror))?;
    let bridge = DeviceBridge::new(link, mirror);

    info!(port = %settings.port, baud = settings.baud, "Monitoring controller, Ctrl-C to stop");

    let mut ticker = tokio::time::interval(Duration::from_secs(interval.max(1)));
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let sensors = bridge.snapshot_sensors();
                let devices = bridge.snapshot_devices();
                match bridge.last_seen() {
                    Some(last_seen) => info!(
                        link = ?bridge.link().state(),
                        temperature = ?sensors.temperature,
                        humidity = ?sensors.humidity,
                        motion = sensors.motion,
                        devices = ?devices,
                        %last_seen,
                        "Controller state"
                    ),
                    None => warn!(link = ?bridge.link().state(), "No status received from controller yet"),
                }
            }
            result = &mut shutdown => {
                result.context("waiting for Ctrl-C")?;
                break;
            }
        }
    }

    tokio::task::spawn_blocking(move || reader.shutdown()).await??;
    bridge.link().disconnect();
    Ok(())
}

pub async fn toggle(settings: &Settings, device: &str, state: &str) -> Result<()> {
    let bridge = DeviceBridge::new(open_link(settings), Arc::new(DeviceMirror::new()));

    let change = bridge.set_power_by_name(device, state).await?;
    bridge.link().disconnect();

    if !change.delivered {
        warn!(port = %settings.port, "Controller unreachable; state recorded locally only");
    }
    print_json(&change)
}

pub fn ports() -> Result<()> {
    let ports = available_ports()?;
    if ports.is_empty() {
        println!("No serial ports found.");
    }
    for port in ports {
        println!("{}\t{}", port.name, port.description);
    }
    Ok(())
}
