//! Console command language
//!
//! One command per line. Transport commands go to the controller, the rest
//! simulate what the OS would report (focus changes, calls, unplugging).

use crate::error::SimError;
use soul_playback::{CallState, FocusChange, TransportCommand};
use std::str::FromStr;

/// A parsed console line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Transport(TransportCommand),
    Select(usize),
    Focus(FocusChange),
    Call(CallState),
    /// Headphones unplugged
    Unplug,
    /// Answer future focus requests with this value
    GrantFocus(bool),
    /// Press a notification or media button by action id
    Button(String),
    Status,
    Help,
    Quit,
}

pub const HELP: &str = "\
commands:
  play | pause | next | prev | stop | seek <ms> | select <index>
  focus grant|loss|transient|duck      simulate an audio focus change
  call ringing|offhook|idle            simulate a phone call
  unplug                               headphones removed
  grant on|off                         allow or deny future focus requests
  button <action>                      press a notification/media button
  status | help | quit";

impl FromStr for Command {
    type Err = SimError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut words = line.split_whitespace();
        let name = words
            .next()
            .ok_or_else(|| SimError::UnknownCommand(String::new()))?
            .to_ascii_lowercase();
        let arg = words.next();
        let unknown = || SimError::UnknownCommand(line.trim().to_string());

        let command = match (name.as_str(), arg) {
            ("play", None) => Command::Transport(TransportCommand::Play),
            ("pause", None) => Command::Transport(TransportCommand::Pause),
            ("next", None) => Command::Transport(TransportCommand::Next),
            ("prev" | "previous", None) => Command::Transport(TransportCommand::Previous),
            ("stop", None) => Command::Transport(TransportCommand::Stop),
            ("seek", Some(ms)) => {
                Command::Transport(TransportCommand::SeekTo(ms.parse().map_err(|_| unknown())?))
            }
            ("select", Some(index)) => Command::Select(index.parse().map_err(|_| unknown())?),
            ("focus", Some(change)) => Command::Focus(match change {
                "grant" | "gain" => FocusChange::Grant,
                "loss" => FocusChange::PermanentLoss,
                "transient" => FocusChange::TransientLoss,
                "duck" => FocusChange::TransientLossCanDuck,
                _ => return Err(unknown()),
            }),
            ("call", Some(state)) => Command::Call(match state {
                "ringing" => CallState::Ringing,
                "offhook" => CallState::OffHook,
                "idle" => CallState::Idle,
                _ => return Err(unknown()),
            }),
            ("unplug", None) => Command::Unplug,
            ("grant", Some("on")) => Command::GrantFocus(true),
            ("grant", Some("off")) => Command::GrantFocus(false),
            ("button", Some(action)) => Command::Button(action.to_string()),
            ("status", None) => Command::Status,
            ("help" | "?", None) => Command::Help,
            ("quit" | "exit", None) => Command::Quit,
            _ => return Err(unknown()),
        };

        if words.next().is_some() {
            return Err(unknown());
        }
        Ok(command)
    }
}
