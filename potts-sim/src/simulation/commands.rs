use std::sync::mpsc::Sender;

use crate::config::UpdateRule;
use crate::error::{check_temperature, PottsError, Result};

/// Parameter change requested from outside the sampling loop.
///
/// Queued changes are applied in order at the next sweep boundary, never in
/// the middle of a step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Command {
    SetTemperature(f64),
    Resize(usize),
    ChangeStateCount(u8),
    Reset,
    SetRule(UpdateRule),
}

impl Command {
    pub(crate) fn validate(&self) -> Result<()> {
        match *self {
            Command::SetTemperature(t) => check_temperature(t).map(|_| ()),
            Command::Resize(0) => Err(PottsError::Config("size must be >= 1".into())),
            Command::ChangeStateCount(q) if q < 2 => {
                Err(PottsError::Config("num_states must be >= 2".into()))
            }
            _ => Ok(()),
        }
    }
}

/// Cloneable handle for queueing [`Command`]s to a running simulation,
/// e.g. from a UI thread.
#[derive(Debug, Clone)]
pub struct CommandSender {
    pub(crate) tx: Sender<Command>,
}

impl CommandSender {
    /// Validate and queue `command`.
    pub fn send(&self, command: Command) -> Result<()> {
        command.validate()?;
        self.tx
            .send(command)
            .map_err(|_| PottsError::CommandChannelClosed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation() {
        assert!(Command::SetTemperature(1.0).validate().is_ok());
        assert!(Command::SetTemperature(0.0).validate().is_err());
        assert!(Command::SetTemperature(f64::NAN).validate().is_err());
        assert!(Command::Resize(0).validate().is_err());
        assert!(Command::Resize(1).validate().is_ok());
        assert!(Command::ChangeStateCount(1).validate().is_err());
        assert!(Command::ChangeStateCount(2).validate().is_ok());
        assert!(Command::Reset.validate().is_ok());
    }

    #[test]
    fn test_closed_channel() {
        let (tx, rx) = std::sync::mpsc::channel();
        let sender = CommandSender { tx };
        drop(rx);
        assert_eq!(
            sender.send(Command::Reset),
            Err(PottsError::CommandChannelClosed)
        );
        // invalid commands are rejected before touching the channel
        assert!(matches!(
            sender.send(Command::Resize(0)),
            Err(PottsError::Config(_))
        ));
    }
}
