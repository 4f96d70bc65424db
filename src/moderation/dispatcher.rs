//! Moderation dispatcher
//!
//! Takes an interpreted [`ActionRequest`], a fresh [`GuildSnapshot`], and
//! the invoking member, and turns them into at most one remote mutation
//! per target. All precondition failures become named report entries;
//! nothing propagates past this boundary and nothing is retried.

use std::future::Future;
use std::time::Duration;

use crate::command::{Action, ActionRequest, TargetSpec, resolve_channel, resolve_member};
use crate::guild::{
    GatewayResult, GuildSnapshot, Member, MemberId, ModerationGateway, VoiceChannelInfo,
};

use super::mass::{MassAction, execute_mass};
use super::report::{ActionReport, FailureReason, TargetFailure};

/// Delay between successive mutation calls in a mass action
pub const DEFAULT_PACING: Duration = Duration::from_millis(200);

/// Dispatches action requests against a moderation gateway
pub struct Dispatcher<'a> {
    gateway: &'a dyn ModerationGateway,
    pacing: Duration,
}

impl<'a> Dispatcher<'a> {
    /// Create a dispatcher with the default mass-action pacing
    #[must_use]
    pub const fn new(gateway: &'a dyn ModerationGateway) -> Self {
        Self {
            gateway,
            pacing: DEFAULT_PACING,
        }
    }

    /// Override the pacing delay (tests use zero)
    #[must_use]
    pub const fn with_pacing(mut self, pacing: Duration) -> Self {
        self.pacing = pacing;
        self
    }

    /// Dispatch a request
    ///
    /// The request is applied at most once; every outcome, including each
    /// precondition refusal, lands in the returned report.
    pub async fn dispatch(
        &self,
        request: &ActionRequest,
        snapshot: &GuildSnapshot,
        caller: MemberId,
    ) -> ActionReport {
        let reason = format!("Voice command from {}", snapshot.display_name(caller));

        match &request.target {
            TargetSpec::Everyone => self.dispatch_mass(request, snapshot, caller, &reason).await,
            TargetSpec::Named(fragment) => {
                self.dispatch_individual(request, fragment, snapshot, &reason)
                    .await
            }
        }
    }

    async fn dispatch_individual(
        &self,
        request: &ActionRequest,
        fragment: &str,
        snapshot: &GuildSnapshot,
        reason: &str,
    ) -> ActionReport {
        let action = request.action;
        let mut report = ActionReport::individual(action);

        let member = match resolve_member(fragment, &snapshot.members) {
            Ok(member) => member,
            Err(err) => {
                report.failures.push(TargetFailure::new(fragment, err));
                return report;
            }
        };
        let name = member.display_name.clone();

        // Resolve the destination before any mutation so a bad channel
        // fragment refuses the whole request.
        let destination = if action == Action::Move {
            let dest_fragment = request.destination.as_deref().unwrap_or_default();
            match resolve_channel(dest_fragment, &snapshot.voice_channels) {
                Ok(channel) => {
                    report.destination = Some(channel.name.clone());
                    Some(channel)
                }
                Err(err) => {
                    report.failures.push(TargetFailure::new(dest_fragment, err));
                    return report;
                }
            }
        } else {
            None
        };

        let permission = action.required_permission();
        if !snapshot.bot_permissions.allows(permission) {
            tracing::warn!(action = action.verb(), "missing bot permission");
            report.failures.push(TargetFailure::new(
                name,
                FailureReason::PermissionDenied(permission),
            ));
            return report;
        }

        match action {
            Action::Mute | Action::Unmute => {
                self.toggle_mute(action, member, name, reason, &mut report)
                    .await;
            }
            Action::Move => {
                if let Some(destination) = destination {
                    self.move_to(member, destination, name, reason, &mut report)
                        .await;
                } else {
                    report.failures.push(TargetFailure::new(
                        name,
                        FailureReason::Unexpected("destination channel not resolved".to_string()),
                    ));
                }
            }
            Action::Disconnect => {
                if member.voice.is_none() {
                    report
                        .failures
                        .push(TargetFailure::new(name, FailureReason::NotInVoice));
                } else {
                    self.mutate(
                        self.gateway.move_member(member.id, None, reason),
                        name,
                        &mut report,
                    )
                    .await;
                }
            }
            Action::Ban => {
                if member.top_role_rank >= snapshot.bot_rank() && !snapshot.bot_is_owner() {
                    tracing::debug!(member = %name, "ban refused, role hierarchy");
                    report
                        .failures
                        .push(TargetFailure::new(name, FailureReason::RoleHierarchy));
                } else {
                    self.mutate(self.gateway.ban_member(member.id, reason), name, &mut report)
                        .await;
                }
            }
        }

        report
    }

    async fn toggle_mute(
        &self,
        action: Action,
        member: &Member,
        name: String,
        reason: &str,
        report: &mut ActionReport,
    ) {
        let Some(voice) = member.voice else {
            report
                .failures
                .push(TargetFailure::new(name, FailureReason::NotInVoice));
            return;
        };

        let mute = action == Action::Mute;
        if voice.muted == mute {
            report.already.push(name);
            return;
        }

        self.mutate(self.gateway.set_mute(member.id, mute, reason), name, report)
            .await;
    }

    async fn move_to(
        &self,
        member: &Member,
        destination: &VoiceChannelInfo,
        name: String,
        reason: &str,
        report: &mut ActionReport,
    ) {
        let Some(voice) = member.voice else {
            report
                .failures
                .push(TargetFailure::new(name, FailureReason::NotInVoice));
            return;
        };

        if voice.channel == destination.id {
            report.already.push(name);
            return;
        }

        self.mutate(
            self.gateway.move_member(member.id, Some(destination.id), reason),
            name,
            report,
        )
        .await;
    }

    async fn mutate(
        &self,
        call: impl Future<Output = GatewayResult<()>> + Send,
        name: String,
        report: &mut ActionReport,
    ) {
        match call.await {
            Ok(()) => {
                tracing::info!(action = report.action.verb(), member = %name, "action applied");
                report.acted.push(name);
            }
            Err(err) => {
                tracing::warn!(
                    action = report.action.verb(),
                    member = %name,
                    error = %err,
                    "action failed"
                );
                report.failures.push(TargetFailure::new(name, err));
            }
        }
    }

    async fn dispatch_mass(
        &self,
        request: &ActionRequest,
        snapshot: &GuildSnapshot,
        caller: MemberId,
        reason: &str,
    ) -> ActionReport {
        let action = request.action;
        let mut report = ActionReport::mass(action);

        let Some(scope) = snapshot.bot_voice_channel() else {
            report
                .failures
                .push(TargetFailure::new("everyone", FailureReason::NoVoiceScope));
            return report;
        };
        report.scope = Some(scope.name.clone());

        let destination = if action == Action::Move {
            let dest_fragment = request.destination.as_deref().unwrap_or_default();
            match resolve_channel(dest_fragment, &snapshot.voice_channels) {
                Ok(channel) => {
                    report.destination = Some(channel.name.clone());
                    if channel.id == scope.id {
                        report.already.push("everyone".to_string());
                        return report;
                    }
                    Some(channel)
                }
                Err(err) => {
                    report.failures.push(TargetFailure::new(dest_fragment, err));
                    return report;
                }
            }
        } else {
            None
        };

        let permission = action.required_permission();
        if !snapshot.bot_permissions.allows(permission) {
            tracing::warn!(
                action = action.verb(),
                "missing bot permission for mass action"
            );
            report.failures.push(TargetFailure::new(
                "everyone",
                FailureReason::PermissionDenied(permission),
            ));
            return report;
        }

        let reason = format!("{reason} (mass {})", action.verb());
        execute_mass(
            self.gateway,
            snapshot,
            MassAction {
                action,
                scope,
                caller,
                destination,
                pacing: self.pacing,
                reason: &reason,
            },
        )
        .await
    }
}
