//! Scripted headless sessions: bootstrap, simulated collaborators and the tick loop.

use crate::command::{CommandReceiver, CommandSubmit, drain_pending_commands};
use anyhow::{Context, Result};
use plaza_core::{
    Avatar, AvatarId, LayoutConfig, Position, PresenceConfig, PresenceEngine, PresenceSnapshot,
    SessionCommand,
};
use rand::{Rng, SeedableRng, rngs::SmallRng};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info};

/// On-disk session description. Both sections are optional.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionFile {
    #[serde(default)]
    pub config: PresenceConfig,
    #[serde(default = "LayoutConfig::default_office")]
    pub layout: LayoutConfig,
}

impl Default for SessionFile {
    fn default() -> Self {
        Self {
            config: PresenceConfig::default(),
            layout: LayoutConfig::default_office(),
        }
    }
}

pub fn load_session_file(path: &Path) -> Result<SessionFile> {
    let data = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read layout file {}", path.display()))?;
    serde_json::from_str(&data)
        .with_context(|| format!("layout file {} did not contain a valid session", path.display()))
}

/// Build an engine and seed the demo roster. Returns the remote avatar ids.
pub fn bootstrap_engine(file: SessionFile) -> Result<(PresenceEngine, Vec<AvatarId>)> {
    let controlled = Avatar::new("Kousik G", Position::new(400.0, 300.0)).with_video(true);
    let mut engine = PresenceEngine::new(file.config, file.layout, controlled)
        .context("invalid presence configuration")?;

    let remotes = vec![
        engine.join(Avatar::new("Ashok Manthena", Position::new(450.0, 320.0)).with_video(true)),
        engine.join(Avatar::new("Sarah Chen", Position::new(200.0, 200.0)).with_talking(true)),
        engine.join(Avatar::new("Mike Johnson", Position::new(600.0, 150.0)).with_online(false)),
    ];
    info!(
        zones = engine.zones().zones().len(),
        avatars = engine.roster().len(),
        location = engine.location_label(),
        "presence session bootstrapped",
    );
    Ok((engine, remotes))
}

/// Key held for a number of ticks; the tour loops forever.
const TOUR: &[(&str, u64)] = &[("d", 70), ("s", 60), ("a", 80), ("w", 60), ("d", 10)];

/// Stands in for the keyboard and network collaborators of a live session.
#[derive(Debug)]
pub struct ScriptedDriver {
    rng: SmallRng,
    remotes: Vec<AvatarId>,
    wander_interval: u64,
    wander_step: f32,
}

impl ScriptedDriver {
    pub fn new(seed: u64, remotes: Vec<AvatarId>) -> Self {
        Self {
            rng: SmallRng::seed_from_u64(seed),
            remotes,
            wander_interval: 15,
            wander_step: 12.0,
        }
    }

    /// Queue the commands for `tick` on the bus.
    pub fn plan(&mut self, tick: u64, engine: &PresenceEngine, submit: &CommandSubmit) {
        if let Some((release, press)) = tour_transition(tick) {
            if let Some(key) = release {
                submit(SessionCommand::Key {
                    key: key.to_string(),
                    pressed: false,
                });
            }
            submit(SessionCommand::Key {
                key: press.to_string(),
                pressed: true,
            });
        }

        if tick % self.wander_interval != 0 {
            return;
        }
        let bounds = engine.config().world_bounds;
        for &id in &self.remotes {
            let Some(avatar) = engine.avatar(id) else {
                continue;
            };
            if !avatar.online {
                continue;
            }
            let step = self.wander_step;
            let next = bounds.clamp(Position::new(
                avatar.position.x + self.rng.gen_range(-step..=step),
                avatar.position.y + self.rng.gen_range(-step..=step),
            ));
            submit(SessionCommand::MoveRemote { id, position: next });
            if self.rng.gen_bool(0.1) {
                submit(SessionCommand::SetTalking {
                    id,
                    talking: !avatar.talking,
                });
            }
        }
    }
}

/// Key changes at `tick`: the key to release (if any) and the key to press.
fn tour_transition(tick: u64) -> Option<(Option<&'static str>, &'static str)> {
    let cycle: u64 = TOUR.iter().map(|&(_, ticks)| ticks).sum();
    let offset = tick % cycle;
    let mut start = 0;
    for (idx, &(key, ticks)) in TOUR.iter().enumerate() {
        if offset == start {
            let previous = if tick == 0 {
                None
            } else {
                let prev_idx = (idx + TOUR.len() - 1) % TOUR.len();
                Some(TOUR[prev_idx].0)
            };
            return Some((previous, key));
        }
        start += ticks;
    }
    None
}

/// Outcome of a scripted session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionReport {
    pub ticks: u64,
    pub commands_applied: usize,
    /// Distinct locations in the order they were first entered.
    pub locations_visited: Vec<String>,
    pub peak_nearby: usize,
    pub snapshot: PresenceSnapshot,
}

/// Drive `engine` for `ticks` ticks, draining the bus before each one.
pub fn run_session(
    engine: &mut PresenceEngine,
    receiver: &CommandReceiver,
    submit: &CommandSubmit,
    driver: &mut ScriptedDriver,
    ticks: u64,
) -> SessionReport {
    let mut commands_applied = 0;
    let mut locations_visited = vec![engine.location_label().to_string()];
    let mut peak_nearby = engine.nearby().len();
    let mut last_location = engine.location_label().to_string();
    let mut snapshot = engine.snapshot();

    for tick in 0..ticks {
        driver.plan(tick, engine, submit);
        commands_applied += drain_pending_commands(receiver, engine);
        snapshot = engine.tick();

        peak_nearby = peak_nearby.max(snapshot.nearby.len());
        if snapshot.location.label != last_location {
            info!(
                tick = snapshot.tick.0,
                location = %snapshot.location.label,
                nearby = snapshot.nearby.len(),
                "entered location",
            );
            if !locations_visited.contains(&snapshot.location.label) {
                locations_visited.push(snapshot.location.label.clone());
            }
            last_location.clone_from(&snapshot.location.label);
        }
        debug!(
            tick = snapshot.tick.0,
            nearby = snapshot.nearby.len(),
            zoom = snapshot.camera.zoom,
            "tick complete",
        );
    }

    SessionReport {
        ticks,
        commands_applied,
        locations_visited,
        peak_nearby,
        snapshot,
    }
}
