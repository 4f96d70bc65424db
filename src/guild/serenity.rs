//! Serenity-backed guild access
//!
//! Builds [`GuildSnapshot`]s from the gateway cache and implements the
//! [`ModerationGateway`] mutation seam over the serenity HTTP client.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serenity::all::{
    Cache, ChannelId as DiscordChannelId, ChannelType, EditMember, GuildId, Http, RoleId, UserId,
};
use serenity::http::HttpError;

use super::{
    ChannelId, GatewayError, GatewayResult, GuildSnapshot, Member, MemberId, ModerationGateway,
    PermissionSet, VoiceChannelInfo, VoiceState,
};

/// Build a snapshot of the guild directory from the gateway cache
///
/// `bot_channel` injects the bot's active voice channel when the bot
/// tracks its presence out of band (it joins channels as a marker, not as
/// an audio peer, so the cache may have no voice state for it).
///
/// Returns `None` when the guild is not cached yet.
#[must_use]
pub fn snapshot_from_cache(
    cache: &Cache,
    guild_id: GuildId,
    bot_channel: Option<ChannelId>,
) -> Option<GuildSnapshot> {
    let bot_id = MemberId(cache.current_user().id.get());
    let guild = cache.guild(guild_id)?;

    let mut members: Vec<Member> = guild
        .members
        .values()
        .map(|member| {
            let top_role_rank = member
                .roles
                .iter()
                .filter_map(|role_id| guild.roles.get(role_id))
                .map(|role| role.position)
                .max()
                .unwrap_or(0);

            let voice = guild.voice_states.get(&member.user.id).and_then(|state| {
                state.channel_id.map(|channel| VoiceState {
                    channel: ChannelId(channel.get()),
                    muted: state.mute,
                })
            });

            Member {
                id: MemberId(member.user.id.get()),
                display_name: member.display_name().to_string(),
                username: member.user.name.clone(),
                top_role_rank,
                voice,
            }
        })
        .collect();

    if let Some(channel) = bot_channel {
        if let Some(bot) = members.iter_mut().find(|m| m.id == bot_id) {
            if bot.voice.is_none() {
                bot.voice = Some(VoiceState {
                    channel,
                    muted: false,
                });
            }
        }
    }

    // Group voice states by channel for occupancy lists
    let mut occupants: HashMap<u64, Vec<MemberId>> = HashMap::new();
    for (user_id, state) in &guild.voice_states {
        if let Some(channel) = state.channel_id {
            occupants
                .entry(channel.get())
                .or_default()
                .push(MemberId(user_id.get()));
        }
    }

    let voice_channels: Vec<VoiceChannelInfo> = guild
        .channels
        .values()
        .filter(|channel| channel.kind == ChannelType::Voice)
        .map(|channel| VoiceChannelInfo {
            id: ChannelId(channel.id.get()),
            name: channel.name.clone(),
            members: occupants.remove(&channel.id.get()).unwrap_or_default(),
        })
        .collect();

    let owner = MemberId(guild.owner_id.get());
    let bot_permissions = bot_permission_set(&guild, bot_id, owner);

    Some(GuildSnapshot {
        members,
        voice_channels,
        bot: bot_id,
        owner,
        bot_permissions,
    })
}

/// Effective guild-wide permission set for the bot member
fn bot_permission_set(
    guild: &serenity::all::Guild,
    bot: MemberId,
    owner: MemberId,
) -> PermissionSet {
    if bot == owner {
        return PermissionSet::all();
    }

    let Some(member) = guild.members.get(&UserId::new(bot.0)) else {
        return PermissionSet::default();
    };

    // The everyone role shares the guild's id and isn't listed on members
    let everyone = RoleId::new(guild.id.get());
    let mut permissions = guild
        .roles
        .get(&everyone)
        .map(|role| role.permissions)
        .unwrap_or_default();

    for role_id in &member.roles {
        if let Some(role) = guild.roles.get(role_id) {
            permissions |= role.permissions;
        }
    }

    if permissions.administrator() {
        return PermissionSet::all();
    }

    PermissionSet {
        mute_members: permissions.mute_members(),
        move_members: permissions.move_members(),
        ban_members: permissions.ban_members(),
    }
}

/// Moderation mutations over the serenity HTTP client
pub struct SerenityGateway {
    http: Arc<Http>,
    guild: GuildId,
}

impl SerenityGateway {
    #[must_use]
    pub const fn new(http: Arc<Http>, guild: GuildId) -> Self {
        Self { http, guild }
    }
}

#[async_trait]
impl ModerationGateway for SerenityGateway {
    async fn set_mute(&self, member: MemberId, muted: bool, reason: &str) -> GatewayResult<()> {
        let builder = EditMember::new().mute(muted).audit_log_reason(reason);
        self.guild
            .edit_member(&self.http, UserId::new(member.0), builder)
            .await
            .map(drop)
            .map_err(map_client_error)
    }

    async fn move_member(
        &self,
        member: MemberId,
        channel: Option<ChannelId>,
        reason: &str,
    ) -> GatewayResult<()> {
        let builder = match channel {
            Some(channel) => EditMember::new().voice_channel(DiscordChannelId::new(channel.0)),
            None => EditMember::new().disconnect_member(),
        }
        .audit_log_reason(reason);

        self.guild
            .edit_member(&self.http, UserId::new(member.0), builder)
            .await
            .map(drop)
            .map_err(map_client_error)
    }

    async fn ban_member(&self, member: MemberId, reason: &str) -> GatewayResult<()> {
        self.guild
            .ban_with_reason(&self.http, UserId::new(member.0), 0, reason)
            .await
            .map_err(map_client_error)
    }
}

/// Collapse serenity errors into the gateway failure taxonomy
fn map_client_error(err: serenity::Error) -> GatewayError {
    match err {
        serenity::Error::Http(HttpError::UnsuccessfulRequest(response)) => {
            let code = response.status_code.as_u16();
            if code == 403 {
                GatewayError::Forbidden
            } else {
                GatewayError::Remote(code)
            }
        }
        other => GatewayError::Other(other.to_string()),
    }
}
