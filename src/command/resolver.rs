//! Name fragment resolution
//!
//! Maps a free-text fragment to exactly one member or voice channel.
//! Exact matches win over substring matches, and a substring hit is only
//! accepted when it is unique; anything else is a user-visible outcome.

use thiserror::Error;

use crate::guild::{Member, VoiceChannelInfo};

/// Cap on candidate names echoed back on an ambiguous fragment
pub const MAX_AMBIGUOUS_NAMES: usize = 3;

/// What kind of entity a fragment failed to resolve to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Member,
    Channel,
}

impl EntityKind {
    #[must_use]
    pub const fn describe(self) -> &'static str {
        match self {
            Self::Member => "member",
            Self::Channel => "voice channel",
        }
    }
}

/// Failure to resolve a fragment to exactly one entity
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ResolveError {
    /// Nothing matched
    #[error("could not find {} '{fragment}'", .kind.describe())]
    NotFound { kind: EntityKind, fragment: String },

    /// More than one substring match and no exact match
    #[error("multiple {}s match '{fragment}': {}", .kind.describe(), .candidates.join(", "))]
    Ambiguous {
        kind: EntityKind,
        fragment: String,
        /// At most [`MAX_AMBIGUOUS_NAMES`] display names
        candidates: Vec<String>,
    },
}

/// Resolve a member name fragment
///
/// Order: exact display name, exact account name, then unique
/// case-insensitive substring over both.
///
/// # Errors
///
/// [`ResolveError::NotFound`] for zero matches (including an empty
/// fragment), [`ResolveError::Ambiguous`] for several substring matches.
pub fn resolve_member<'a>(
    fragment: &str,
    members: &'a [Member],
) -> Result<&'a Member, ResolveError> {
    if fragment.is_empty() {
        return Err(not_found(EntityKind::Member, fragment));
    }

    if let Some(member) = members.iter().find(|m| m.display_name == fragment) {
        return Ok(member);
    }
    if let Some(member) = members.iter().find(|m| m.username == fragment) {
        return Ok(member);
    }

    let needle = fragment.to_lowercase();
    let matches: Vec<&Member> = members
        .iter()
        .filter(|m| {
            m.display_name.to_lowercase().contains(&needle)
                || m.username.to_lowercase().contains(&needle)
        })
        .collect();

    match matches.as_slice() {
        [] => Err(not_found(EntityKind::Member, fragment)),
        [only] => Ok(*only),
        several => Err(ResolveError::Ambiguous {
            kind: EntityKind::Member,
            fragment: fragment.to_string(),
            candidates: several
                .iter()
                .take(MAX_AMBIGUOUS_NAMES)
                .map(|m| m.display_name.clone())
                .collect(),
        }),
    }
}

/// Resolve a voice channel name fragment
///
/// Same scheme as members, with only one name to match against.
///
/// # Errors
///
/// [`ResolveError::NotFound`] or [`ResolveError::Ambiguous`] as for
/// [`resolve_member`].
pub fn resolve_channel<'a>(
    fragment: &str,
    channels: &'a [VoiceChannelInfo],
) -> Result<&'a VoiceChannelInfo, ResolveError> {
    if fragment.is_empty() {
        return Err(not_found(EntityKind::Channel, fragment));
    }

    if let Some(channel) = channels.iter().find(|c| c.name == fragment) {
        return Ok(channel);
    }

    let needle = fragment.to_lowercase();
    let matches: Vec<&VoiceChannelInfo> = channels
        .iter()
        .filter(|c| c.name.to_lowercase().contains(&needle))
        .collect();

    match matches.as_slice() {
        [] => Err(not_found(EntityKind::Channel, fragment)),
        [only] => Ok(*only),
        several => Err(ResolveError::Ambiguous {
            kind: EntityKind::Channel,
            fragment: fragment.to_string(),
            candidates: several
                .iter()
                .take(MAX_AMBIGUOUS_NAMES)
                .map(|c| c.name.clone())
                .collect(),
        }),
    }
}

fn not_found(kind: EntityKind, fragment: &str) -> ResolveError {
    ResolveError::NotFound {
        kind,
        fragment: fragment.to_string(),
    }
}
