//! Utterance interpreter
//!
//! Grammar, checked in order against the normalized (lowercased, trimmed)
//! utterance:
//!
//! ```text
//! utterance   := mass-phrase | verb-command
//! mass-phrase := "kick them" | "disconnect everyone"
//!              | "mute them" | "unmute them"
//!              | "move them to " channel-fragment
//! verb-command := verb member-fragment
//!               | "move" member-fragment "to" channel-fragment
//! verb        := "mute" | "unmute" | "move" | "disconnect"
//!              | "kick" | "remove" | "ban"
//! ```
//!
//! Fragments stay unresolved here; the dispatcher owns resolution.

use thiserror::Error;

use super::{Action, ActionRequest, TargetSpec};

/// Prefix marking a mass move, remainder is the destination fragment
const MASS_MOVE_PREFIX: &str = "move them to ";

/// Why an utterance couldn't be interpreted
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum InterpretError {
    /// Nothing left after normalization
    #[error("no command detected in the input")]
    Empty,

    /// First token isn't a known action keyword
    #[error("unrecognized action: '{0}'")]
    UnrecognizedAction(String),

    /// Action recognized but a required name fragment is missing
    #[error("missing a name after '{}'", .0.verb())]
    MissingArgument(Action),
}

/// Map the leading keyword to an action
fn keyword_action(word: &str) -> Option<Action> {
    match word {
        "mute" => Some(Action::Mute),
        "unmute" => Some(Action::Unmute),
        "move" => Some(Action::Move),
        "disconnect" | "kick" | "remove" => Some(Action::Disconnect),
        "ban" => Some(Action::Ban),
        _ => None,
    }
}

/// Interpret a normalized utterance into an [`ActionRequest`]
///
/// # Errors
///
/// Returns [`InterpretError`] when the utterance is empty, the keyword is
/// unknown, or a required fragment is missing.
pub fn interpret(utterance: &str) -> Result<ActionRequest, InterpretError> {
    let utterance = utterance.trim();

    // Mass phrases first; they'd otherwise parse as member fragments
    // like "them" or "everyone".
    match utterance {
        "kick them" | "disconnect everyone" => {
            return Ok(mass(Action::Disconnect, None));
        }
        "mute them" => return Ok(mass(Action::Mute, None)),
        "unmute them" => return Ok(mass(Action::Unmute, None)),
        _ => {}
    }

    if let Some(remainder) = utterance.strip_prefix(MASS_MOVE_PREFIX) {
        let destination = remainder.trim();
        if destination.is_empty() {
            return Err(InterpretError::MissingArgument(Action::Move));
        }
        return Ok(mass(Action::Move, Some(destination.to_string())));
    }

    let mut words = utterance.split_whitespace();
    let Some(first) = words.next() else {
        return Err(InterpretError::Empty);
    };

    let action =
        keyword_action(first).ok_or_else(|| InterpretError::UnrecognizedAction(first.into()))?;

    let rest: Vec<&str> = words.collect();
    if rest.is_empty() {
        return Err(InterpretError::MissingArgument(action));
    }

    if action == Action::Move {
        // Split at the first literal "to": member fragment before,
        // channel fragment after.
        let Some(to_index) = rest.iter().position(|w| *w == "to") else {
            return Err(InterpretError::MissingArgument(action));
        };

        let member = rest[..to_index].join(" ");
        let channel = rest[to_index + 1..].join(" ");
        if member.is_empty() || channel.is_empty() {
            return Err(InterpretError::MissingArgument(action));
        }

        return Ok(ActionRequest {
            action,
            target: TargetSpec::Named(member),
            destination: Some(channel),
        });
    }

    Ok(ActionRequest {
        action,
        target: TargetSpec::Named(rest.join(" ")),
        destination: None,
    })
}

const fn mass(action: Action, destination: Option<String>) -> ActionRequest {
    ActionRequest {
        action,
        target: TargetSpec::Everyone,
        destination,
    }
}
