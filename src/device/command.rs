use alloc::{boxed::Box, vec::Vec};
use core::fmt::{self, Debug, Formatter};

use bevy::platform::collections::HashMap;

use crate::prelude::*;

/// Device-specific request sent through [`InputDevices::execute_command`].
///
/// Queries store their answer in the command itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceCommand {
    QueryEnabledState { is_enabled: bool },
    EnableDevice,
    DisableDevice,
    QueryCanRunInBackground { can_run_in_background: bool },
    RequestReset,
    /// Command with a user-defined tag.
    Custom { tag: FourCc, payload: Vec<u8> },
}

impl DeviceCommand {
    pub const QUERY_ENABLED_STATE: FourCc = FourCc::new(b'Q', b'E', b'N', b'B');
    pub const ENABLE_DEVICE: FourCc = FourCc::new(b'E', b'N', b'B', b'L');
    pub const DISABLE_DEVICE: FourCc = FourCc::new(b'D', b'S', b'B', b'L');
    pub const QUERY_CAN_RUN_IN_BACKGROUND: FourCc = FourCc::new(b'Q', b'R', b'I', b'B');
    pub const REQUEST_RESET: FourCc = FourCc::new(b'R', b'S', b'E', b'T');

    /// Returns the tag used to find the handler.
    #[must_use]
    pub fn tag(&self) -> FourCc {
        match self {
            Self::QueryEnabledState { .. } => Self::QUERY_ENABLED_STATE,
            Self::EnableDevice => Self::ENABLE_DEVICE,
            Self::DisableDevice => Self::DISABLE_DEVICE,
            Self::QueryCanRunInBackground { .. } => Self::QUERY_CAN_RUN_IN_BACKGROUND,
            Self::RequestReset => Self::REQUEST_RESET,
            Self::Custom { tag, .. } => *tag,
        }
    }
}

/// Outcome of a [`DeviceCommand`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandResult {
    Success,
    Failure,
    /// The device has no handler for the command tag.
    NotHandled,
}

/// Data available to command handlers.
pub struct CommandContext<'a> {
    pub device: DeviceId,
    /// Queue for state events, can be moved to other threads after cloning.
    pub sender: &'a StateEventSender,
}

/// Handles a single command tag for a device.
pub type CommandHandler =
    dyn FnMut(&CommandContext, &mut DeviceCommand) -> CommandResult + Send + Sync;

/// Per-device mapping from command tags to handlers.
#[derive(Default)]
pub struct CommandTable {
    handlers: HashMap<FourCc, Box<CommandHandler>>,
}

impl CommandTable {
    /// Adds a handler for the tag, replacing the previous one.
    #[must_use]
    pub fn with(
        mut self,
        tag: FourCc,
        handler: impl FnMut(&CommandContext, &mut DeviceCommand) -> CommandResult
        + Send
        + Sync
        + 'static,
    ) -> Self {
        self.insert(tag, handler);
        self
    }

    /// Like [`Self::with`], but modifies in place.
    pub fn insert(
        &mut self,
        tag: FourCc,
        handler: impl FnMut(&CommandContext, &mut DeviceCommand) -> CommandResult
        + Send
        + Sync
        + 'static,
    ) {
        self.handlers.insert(tag, Box::new(handler));
    }

    #[must_use]
    pub fn contains(&self, tag: FourCc) -> bool {
        self.handlers.contains_key(&tag)
    }

    /// Runs the handler for the command's tag.
    ///
    /// Returns [`CommandResult::NotHandled`] if there is no handler.
    pub(crate) fn execute(
        &mut self,
        context: &CommandContext,
        command: &mut DeviceCommand,
    ) -> CommandResult {
        match self.handlers.get_mut(&command.tag()) {
            Some(handler) => handler(context, command),
            None => CommandResult::NotHandled,
        }
    }
}

impl Debug for CommandTable {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        f.debug_set().entries(self.handlers.keys()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dispatch_by_tag() {
        let mut table = CommandTable::default()
            .with(DeviceCommand::QUERY_CAN_RUN_IN_BACKGROUND, |_, command| {
                let DeviceCommand::QueryCanRunInBackground {
                    can_run_in_background,
                } = command
                else {
                    return CommandResult::Failure;
                };
                *can_run_in_background = true;
                CommandResult::Success
            })
            .with(DeviceCommand::REQUEST_RESET, |_, _| CommandResult::Failure);

        let sender = StateEventSender::default();
        let context = CommandContext {
            device: DeviceId(0),
            sender: &sender,
        };

        let mut command = DeviceCommand::QueryCanRunInBackground {
            can_run_in_background: false,
        };
        assert_eq!(table.execute(&context, &mut command), CommandResult::Success);
        assert_eq!(
            command,
            DeviceCommand::QueryCanRunInBackground {
                can_run_in_background: true
            }
        );

        assert_eq!(
            table.execute(&context, &mut DeviceCommand::RequestReset),
            CommandResult::Failure
        );
        assert_eq!(
            table.execute(&context, &mut DeviceCommand::EnableDevice),
            CommandResult::NotHandled
        );

        let tag = FourCc::new(b'V', b'I', b'B', b'R');
        let mut custom = DeviceCommand::Custom {
            tag,
            payload: alloc::vec![1, 2],
        };
        assert!(!table.contains(tag));
        assert_eq!(table.execute(&context, &mut custom), CommandResult::NotHandled);
    }
}
