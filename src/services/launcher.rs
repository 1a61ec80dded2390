use std::process::Stdio;

use tokio::process::Command;
use tracing::debug;

use crate::error::AutomationError;

/// Starts a program without waiting for it.
pub trait ProcessLauncher: Send + Sync {
    fn launch(&self, command: &str) -> Result<(), AutomationError>;
}

/// Spawns the command line (split shell-style) as a detached child.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemLauncher;

impl ProcessLauncher for SystemLauncher {
    fn launch(&self, command: &str) -> Result<(), AutomationError> {
        let mut words = shell_words::split(command)
            .map_err(|e| AutomationError::Launch(format!("cannot parse {:?}: {}", command, e)))?;
        if words.is_empty() {
            return Err(AutomationError::Launch("empty command".to_string()));
        }
        let program = words.remove(0);
        debug!("Launching '{}' {:?}", program, words);

        // The child handle is dropped; the process keeps running on its own.
        Command::new(&program)
            .args(&words)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map(|_| ())
            .map_err(|e| AutomationError::Launch(format!("{}: {}", program, e)))
    }
}
