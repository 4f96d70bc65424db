//! Mass-action executor
//!
//! Applies one action to every eligible member of the scope channel,
//! sequentially. One member's failure never aborts the loop; the whole
//! eligible set is always processed into one consolidated report.

use std::time::Duration;

use crate::command::Action;
use crate::guild::{GuildSnapshot, Member, MemberId, ModerationGateway, VoiceChannelInfo};

use super::report::{ActionReport, FailureReason, TargetFailure};

/// Everything a mass action needs, passed explicitly
pub(super) struct MassAction<'a> {
    pub action: Action,

    /// The bot's current voice channel
    pub scope: &'a VoiceChannelInfo,

    /// Invoking member, excluded from the eligible set
    pub caller: MemberId,

    /// Destination channel for a mass move
    pub destination: Option<&'a VoiceChannelInfo>,

    /// Delay inserted after each issued mutation call
    pub pacing: Duration,

    /// Audit-log reason attached to every mutation
    pub reason: &'a str,
}

/// Run a mass action over the scope channel
///
/// Eligible set = scope members minus the caller and the bot. Members
/// already in the requested state count as acted on with the mutation
/// elided, so the success tally plus named failures always covers the
/// whole eligible set.
pub(super) async fn execute_mass(
    gateway: &dyn ModerationGateway,
    snapshot: &GuildSnapshot,
    params: MassAction<'_>,
) -> ActionReport {
    let action = params.action;
    let mut report = ActionReport::mass(action);
    report.scope = Some(params.scope.name.clone());
    report.destination = params.destination.map(|d| d.name.clone());

    let eligible: Vec<&Member> = params
        .scope
        .members
        .iter()
        .filter(|&&id| id != snapshot.bot && id != params.caller)
        .filter_map(|&id| snapshot.member(id))
        .collect();

    if eligible.is_empty() {
        tracing::debug!(channel = %params.scope.name, "no eligible members");
        return report;
    }

    tracing::info!(
        action = action.gerund(),
        channel = %params.scope.name,
        count = eligible.len(),
        "starting mass action"
    );

    let bot_rank = snapshot.bot_rank();
    let bot_is_owner = snapshot.bot_is_owner();
    let total = eligible.len();

    for (index, member) in eligible.into_iter().enumerate() {
        let name = member.display_name.clone();

        // The bot cannot moderate someone with an equal or higher top
        // role unless it owns the guild.
        if member.top_role_rank >= bot_rank && !bot_is_owner {
            tracing::debug!(member = %name, "skipped, role hierarchy");
            report
                .failures
                .push(TargetFailure::new(name, FailureReason::RoleHierarchy));
            continue;
        }

        // Elide mutations for members already in the requested state.
        let already = match action {
            Action::Mute => member.voice.is_some_and(|v| v.muted),
            Action::Unmute => member.voice.is_some_and(|v| !v.muted),
            Action::Move | Action::Disconnect | Action::Ban => false,
        };
        if already {
            report.acted.push(name);
            continue;
        }

        let outcome = match action {
            Action::Mute => gateway.set_mute(member.id, true, params.reason).await,
            Action::Unmute => gateway.set_mute(member.id, false, params.reason).await,
            Action::Move => {
                gateway
                    .move_member(member.id, params.destination.map(|d| d.id), params.reason)
                    .await
            }
            Action::Disconnect => gateway.move_member(member.id, None, params.reason).await,
            Action::Ban => gateway.ban_member(member.id, params.reason).await,
        };

        match outcome {
            Ok(()) => {
                tracing::info!(action = action.past(), member = %name, "mass action applied");
                report.acted.push(name);
            }
            Err(err) => {
                tracing::warn!(member = %name, error = %err, "mass action failed for member");
                report.failures.push(TargetFailure::new(name, err));
            }
        }

        // Pace remote calls to respect API rate limits.
        if index + 1 < total {
            tokio::time::sleep(params.pacing).await;
        }
    }

    report
}
