//! Guild directory snapshots
//!
//! The dispatcher never talks to the live platform cache directly. Each
//! incoming command gets an owned [`GuildSnapshot`] built from the gateway
//! cache, so dispatch logic operates on plain data and stays testable.

mod gateway;
pub mod serenity;

pub use gateway::{GatewayError, GatewayResult, ModerationGateway};

/// Opaque member identifier (Discord user id)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MemberId(pub u64);

/// Opaque voice channel identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChannelId(pub u64);

/// A member's current voice-channel membership and mute flag
#[derive(Debug, Clone, Copy)]
pub struct VoiceState {
    /// Channel the member is connected to
    pub channel: ChannelId,

    /// Server-side mute flag
    pub muted: bool,
}

/// A guild member as seen at snapshot time
#[derive(Debug, Clone)]
pub struct Member {
    pub id: MemberId,

    /// Nickname or global display name
    pub display_name: String,

    /// Account (login) name
    pub username: String,

    /// Position of the member's highest role; the everyone role is 0
    pub top_role_rank: u16,

    /// Voice state, if the member is connected to voice
    pub voice: Option<VoiceState>,
}

/// A voice channel and its current occupants
#[derive(Debug, Clone)]
pub struct VoiceChannelInfo {
    pub id: ChannelId,
    pub name: String,

    /// Members currently connected, in cache enumeration order
    pub members: Vec<MemberId>,
}

/// Platform permission required by a moderation action
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Permission {
    MuteMembers,
    MoveMembers,
    BanMembers,
}

impl Permission {
    /// Human-readable permission name for report messages
    #[must_use]
    pub const fn describe(self) -> &'static str {
        match self {
            Self::MuteMembers => "mute members",
            Self::MoveMembers => "move members",
            Self::BanMembers => "ban members",
        }
    }
}

/// The bot's effective permission set at snapshot time
#[derive(Debug, Clone, Copy, Default)]
pub struct PermissionSet {
    pub mute_members: bool,
    pub move_members: bool,
    pub ban_members: bool,
}

impl PermissionSet {
    /// Permission set with everything granted
    #[must_use]
    pub const fn all() -> Self {
        Self {
            mute_members: true,
            move_members: true,
            ban_members: true,
        }
    }

    /// Check a single permission
    #[must_use]
    pub const fn allows(&self, permission: Permission) -> bool {
        match permission {
            Permission::MuteMembers => self.mute_members,
            Permission::MoveMembers => self.move_members,
            Permission::BanMembers => self.ban_members,
        }
    }
}

/// An immutable view of the guild directory, built fresh per command
#[derive(Debug, Clone)]
pub struct GuildSnapshot {
    pub members: Vec<Member>,
    pub voice_channels: Vec<VoiceChannelInfo>,

    /// The bot's own member id
    pub bot: MemberId,

    /// The guild owner's member id
    pub owner: MemberId,

    /// The bot's effective guild-wide permissions
    pub bot_permissions: PermissionSet,
}

impl GuildSnapshot {
    /// Look up a member by id
    #[must_use]
    pub fn member(&self, id: MemberId) -> Option<&Member> {
        self.members.iter().find(|m| m.id == id)
    }

    /// Look up a voice channel by id
    #[must_use]
    pub fn voice_channel(&self, id: ChannelId) -> Option<&VoiceChannelInfo> {
        self.voice_channels.iter().find(|c| c.id == id)
    }

    /// The voice channel the bot is currently in, if any
    #[must_use]
    pub fn bot_voice_channel(&self) -> Option<&VoiceChannelInfo> {
        let state = self.member(self.bot).and_then(|m| m.voice)?;
        self.voice_channel(state.channel)
    }

    /// Display name for a member id, falling back to the raw id
    #[must_use]
    pub fn display_name(&self, id: MemberId) -> String {
        self.member(id)
            .map_or_else(|| id.0.to_string(), |m| m.display_name.clone())
    }

    /// The bot's top role rank
    #[must_use]
    pub fn bot_rank(&self) -> u16 {
        self.member(self.bot).map_or(0, |m| m.top_role_rank)
    }

    /// Whether the bot owns the guild (hierarchy checks don't apply then)
    #[must_use]
    pub const fn bot_is_owner(&self) -> bool {
        self.bot.0 == self.owner.0
    }
}
