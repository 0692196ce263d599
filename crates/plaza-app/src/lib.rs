//! Shared application plumbing for headless plaza sessions.

pub mod command;
pub mod session;

pub use command::{
    CommandReceiver, CommandSender, CommandSubmit, create_command_bus, drain_pending_commands,
    make_command_submit,
};
pub use session::{
    ScriptedDriver, SessionFile, SessionReport, bootstrap_engine, load_session_file, run_session,
};
