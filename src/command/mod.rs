//! Command model
//!
//! An utterance (spoken or typed) is interpreted into an [`ActionRequest`]
//! carrying unresolved name fragments; resolution against the guild
//! snapshot happens at dispatch time, where the resolution scope is known.

mod interpreter;
mod resolver;

pub use interpreter::{InterpretError, interpret};
pub use resolver::{
    EntityKind, MAX_AMBIGUOUS_NAMES, ResolveError, resolve_channel, resolve_member,
};

use crate::guild::Permission;

/// A moderation action derived from the utterance's keyword
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Mute,
    Unmute,
    Move,
    Disconnect,
    Ban,
}

impl Action {
    /// Platform permission the bot needs before attempting this action
    #[must_use]
    pub const fn required_permission(self) -> Permission {
        match self {
            Self::Mute | Self::Unmute => Permission::MuteMembers,
            Self::Move | Self::Disconnect => Permission::MoveMembers,
            Self::Ban => Permission::BanMembers,
        }
    }

    /// Base verb, e.g. "mute"
    #[must_use]
    pub const fn verb(self) -> &'static str {
        match self {
            Self::Mute => "mute",
            Self::Unmute => "unmute",
            Self::Move => "move",
            Self::Disconnect => "disconnect",
            Self::Ban => "ban",
        }
    }

    /// Present participle, e.g. "muting"
    #[must_use]
    pub const fn gerund(self) -> &'static str {
        match self {
            Self::Mute => "muting",
            Self::Unmute => "unmuting",
            Self::Move => "moving",
            Self::Disconnect => "disconnecting",
            Self::Ban => "banning",
        }
    }

    /// Past participle, e.g. "muted"
    #[must_use]
    pub const fn past(self) -> &'static str {
        match self {
            Self::Mute => "muted",
            Self::Unmute => "unmuted",
            Self::Move => "moved",
            Self::Disconnect => "disconnected",
            Self::Ban => "banned",
        }
    }
}

/// Who an action applies to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetSpec {
    /// Every eligible member of the bot's current voice channel
    Everyone,

    /// A single member, identified by an unresolved name fragment
    Named(String),
}

/// An interpreted command, ready for dispatch
///
/// Dispatched at most once; the dispatcher never retries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionRequest {
    pub action: Action,
    pub target: TargetSpec,

    /// Destination channel fragment, only for [`Action::Move`]
    pub destination: Option<String>,
}

impl ActionRequest {
    /// Whether this request targets the whole voice channel
    #[must_use]
    pub const fn is_mass(&self) -> bool {
        matches!(self.target, TargetSpec::Everyone)
    }
}
