use crossfire::mpmc;
use crossfire::{MAsyncTx, MRx, TryRecvError, TrySendError, detect_backoff_cfg};
use plaza_core::{PresenceEngine, SessionCommand, apply_session_command};
use std::sync::Arc;
use tracing::warn;

pub type CommandSender = MAsyncTx<SessionCommand>;
pub type CommandReceiver = MRx<SessionCommand>;
pub type CommandSubmit = Arc<dyn Fn(SessionCommand) -> bool + Send + Sync>;

pub fn create_command_bus(capacity: usize) -> (CommandSender, CommandReceiver) {
    detect_backoff_cfg();
    mpmc::bounded_tx_async_rx_blocking(capacity.max(1))
}

/// Apply everything queued since the last tick. Returns the number of
/// commands that had an effect.
pub fn drain_pending_commands(receiver: &CommandReceiver, engine: &mut PresenceEngine) -> usize {
    let mut applied = 0;
    loop {
        match receiver.try_recv() {
            Ok(command) => {
                if apply_session_command(engine, command) {
                    applied += 1;
                }
            }
            Err(TryRecvError::Empty) => break,
            Err(TryRecvError::Disconnected) => break,
        }
    }
    applied
}

pub fn make_command_submit(sender: CommandSender) -> CommandSubmit {
    let sender = Arc::new(sender);
    Arc::new(
        move |command: SessionCommand| match sender.try_send(command) {
            Ok(()) => true,
            Err(TrySendError::Full(cmd)) => {
                warn!(?cmd, "session command queue full; dropping command");
                false
            }
            Err(TrySendError::Disconnected(cmd)) => {
                warn!(?cmd, "session command queue disconnected");
                false
            }
        },
    )
}
