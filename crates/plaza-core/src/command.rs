//! Commands delivered by the input and session collaborators between ticks.

use crate::{AvatarId, Direction, Position, PresenceEngine};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionCommand {
    /// Raw keyboard event, reduced through [`Direction::from_key`].
    Key { key: String, pressed: bool },
    Direction { direction: Direction, pressed: bool },
    /// Position update for a remote avatar (e.g. from a network layer).
    MoveRemote { id: AvatarId, position: Position },
    SetOnline { id: AvatarId, online: bool },
    SetTalking { id: AvatarId, talking: bool },
    SetVideo { id: AvatarId, enabled: bool },
    /// Pointer click in screen coordinates.
    ClickToMove { screen: Position },
    ZoomIn,
    ZoomOut,
    SetZoom { zoom: f32 },
    ResizeViewport { width: f32, height: f32 },
}

/// Apply `command` to the engine. Returns `false` when it had no effect
/// (unknown avatar, non-movement key, rejected value).
pub fn apply_session_command(engine: &mut PresenceEngine, command: SessionCommand) -> bool {
    debug!(?command, "applying session command");
    let applied = match &command {
        SessionCommand::Key { key, pressed } => engine.apply_key(key, *pressed),
        SessionCommand::Direction { direction, pressed } => {
            engine.set_direction(*direction, *pressed);
            true
        }
        SessionCommand::MoveRemote { id, position } => {
            engine.set_remote_position(*id, *position)
        }
        SessionCommand::SetOnline { id, online } => engine.set_online(*id, *online),
        SessionCommand::SetTalking { id, talking } => engine.set_talking(*id, *talking),
        SessionCommand::SetVideo { id, enabled } => engine.set_video_enabled(*id, *enabled),
        SessionCommand::ClickToMove { screen } => {
            engine.click_to_move(*screen);
            true
        }
        SessionCommand::ZoomIn => {
            engine.zoom_in();
            true
        }
        SessionCommand::ZoomOut => {
            engine.zoom_out();
            true
        }
        SessionCommand::SetZoom { zoom } => {
            engine.set_zoom(*zoom);
            true
        }
        SessionCommand::ResizeViewport { width, height } => {
            engine.resize_viewport(*width, *height)
        }
    };

    if !applied && command_targets_avatar(&command).is_some_and(|id| engine.avatar(id).is_none()) {
        warn!(?command, "session command references an unknown avatar");
    }
    applied
}

fn command_targets_avatar(command: &SessionCommand) -> Option<AvatarId> {
    match command {
        SessionCommand::MoveRemote { id, .. }
        | SessionCommand::SetOnline { id, .. }
        | SessionCommand::SetTalking { id, .. }
        | SessionCommand::SetVideo { id, .. } => Some(*id),
        _ => None,
    }
}
