//! tether demo - a full session against the simulated library.

use log::{debug, info, warn};
use std::error::Error;
use std::sync::Arc;
use tether::{Session, SessionConfig, SessionEvent, SessionTag, SimulatedBackend};

const DEFAULT_USER: &str = "demo";
const DEFAULT_PASSWORD: &str = "demo";

const SAMPLE_TRACKS: [&str; 7] = [
    "Aerodynamic",
    "Digital Love",
    "Harder, Better, Faster, Stronger",
    "Crescendolls",
    "Nightvision",
    "Superheroes",
    "High Life",
];

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();
    info!("Starting tether demo...");

    let config = SessionConfig::load_default()?;
    let user = std::env::var("TETHER_USER").unwrap_or_else(|_| DEFAULT_USER.to_string());
    let password =
        std::env::var("TETHER_PASSWORD").unwrap_or_else(|_| DEFAULT_PASSWORD.to_string());

    let backend = SimulatedBackend::new(config.user_agent.clone())
        .with_account(DEFAULT_USER, DEFAULT_PASSWORD)
        .with_tracks(SAMPLE_TRACKS);
    let mut session = Session::start(config, Arc::new(backend))?;

    session.on(SessionTag::LogMessage, |event| {
        if let SessionEvent::LogMessage(text) = event {
            info!("[native] {}", text);
        }
    });
    session.on(SessionTag::MetadataUpdated, |_| debug!("Metadata updated"));
    session.on(SessionTag::ConnectionstateUpdated, |_| {
        debug!("Connection state changed")
    });

    if let Err(e) = session.login_blocking(&user, &password, false) {
        warn!("Login failed: {}", e);
        session.shutdown()?;
        return Err(e.into());
    }

    session.load_tracks(None)?;
    let tracks = session.tracks();
    info!("{} tracks", tracks.len());
    for (index, name) in tracks.iter().enumerate() {
        match name {
            Some(name) => info!("{:>3}. {}", index + 1, name),
            None => info!("{:>3}. <loading>", index + 1),
        }
    }
    if let Some(Some(last)) = tracks.last() {
        info!("Last track: {}", last);
    }

    session.logout_blocking()?;
    let relayed = session.shutdown()?;
    info!("Done, {} events relayed", relayed);
    Ok(())
}
