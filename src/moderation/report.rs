//! Dispatch outcome reporting
//!
//! Every dispatch produces exactly one [`ActionReport`], rendered to the
//! invoking user and then discarded. No failure is silently swallowed:
//! each target that wasn't acted on appears by name with its reason.

use crate::command::{Action, EntityKind, ResolveError};
use crate::guild::{GatewayError, Permission};

/// Why a target wasn't acted on
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureReason {
    /// Name fragment matched nothing
    NotFound(EntityKind),

    /// Name fragment matched several candidates
    Ambiguous(EntityKind, Vec<String>),

    /// Bot lacks the platform permission for the action
    PermissionDenied(Permission),

    /// Target's top role is at or above the bot's
    RoleHierarchy,

    /// Target is not connected to any voice channel
    NotInVoice,

    /// The bot itself is not in a voice channel (mass actions only)
    NoVoiceScope,

    /// Remote call rejected mid-flight
    Forbidden,

    /// Remote call failed with an HTTP status code
    Remote(u16),

    /// Anything else
    Unexpected(String),
}

impl FailureReason {
    /// Short code used in mass-report failure lists
    #[must_use]
    pub fn short_code(&self) -> String {
        match self {
            Self::RoleHierarchy => "role".to_string(),
            Self::PermissionDenied(_) | Self::Forbidden => "perm".to_string(),
            Self::Remote(code) => format!("http: {code}"),
            _ => "err".to_string(),
        }
    }
}

impl From<GatewayError> for FailureReason {
    fn from(err: GatewayError) -> Self {
        match err {
            GatewayError::Forbidden => Self::Forbidden,
            GatewayError::Remote(code) => Self::Remote(code),
            GatewayError::Other(detail) => Self::Unexpected(detail),
        }
    }
}

impl From<ResolveError> for FailureReason {
    fn from(err: ResolveError) -> Self {
        match err {
            ResolveError::NotFound { kind, .. } => Self::NotFound(kind),
            ResolveError::Ambiguous {
                kind, candidates, ..
            } => Self::Ambiguous(kind, candidates),
        }
    }
}

/// A named failure inside a report
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetFailure {
    /// Display name, or the raw fragment when resolution itself failed
    pub name: String,
    pub reason: FailureReason,
}

impl TargetFailure {
    #[must_use]
    pub fn new(name: impl Into<String>, reason: impl Into<FailureReason>) -> Self {
        Self {
            name: name.into(),
            reason: reason.into(),
        }
    }
}

/// Consolidated outcome of one dispatched [`crate::command::ActionRequest`]
#[derive(Debug, Clone)]
pub struct ActionReport {
    pub action: Action,

    /// Whether this was a mass action over a voice channel
    pub mass: bool,

    /// Name of the voice channel a mass action ran over
    pub scope: Option<String>,

    /// Resolved destination channel name, for move actions
    pub destination: Option<String>,

    /// Display names acted on (state already correct counts here for mass
    /// actions, where the mutation is elided)
    pub acted: Vec<String>,

    /// Individual no-ops: target already in the requested state
    pub already: Vec<String>,

    /// Every target that failed, with its reason
    pub failures: Vec<TargetFailure>,
}

impl ActionReport {
    /// Empty report for an individual action
    #[must_use]
    pub const fn individual(action: Action) -> Self {
        Self::empty(action, false)
    }

    /// Empty report for a mass action
    #[must_use]
    pub const fn mass(action: Action) -> Self {
        Self::empty(action, true)
    }

    const fn empty(action: Action, mass: bool) -> Self {
        Self {
            action,
            mass,
            scope: None,
            destination: None,
            acted: Vec::new(),
            already: Vec::new(),
            failures: Vec::new(),
        }
    }

    /// Number of targets acted on
    #[must_use]
    pub fn succeeded(&self) -> usize {
        self.acted.len()
    }

    /// Render the user-facing message for this report
    #[must_use]
    pub fn render(&self) -> String {
        if self.mass {
            self.render_mass()
        } else {
            self.render_individual()
        }
    }

    fn render_individual(&self) -> String {
        let verb = self.action.verb();

        if let Some(failure) = self.failures.first() {
            return render_failure(failure, verb);
        }

        if let Some(name) = self.already.first() {
            return match self.action {
                Action::Mute => format!("{name} is already voice muted."),
                Action::Unmute => format!("{name} is not currently voice muted."),
                Action::Move => format!(
                    "{name} is already in {}.",
                    self.destination.as_deref().unwrap_or("that channel")
                ),
                Action::Disconnect | Action::Ban => {
                    format!("Nothing to do for {name}.")
                }
            };
        }

        let name = self.acted.first().map_or("them", String::as_str);
        match self.action {
            Action::Mute => format!("Voice muted {name}."),
            Action::Unmute => format!("Voice unmuted {name}."),
            Action::Move => format!(
                "Moved {name} to {}.",
                self.destination.as_deref().unwrap_or("the channel")
            ),
            Action::Disconnect => format!("Disconnected {name} from voice."),
            Action::Ban => format!("Banned {name}."),
        }
    }

    fn render_mass(&self) -> String {
        // Whole-request refusals carry a single failure and nothing else
        if self.acted.is_empty() && self.already.is_empty() {
            if let Some(failure) = self.failures.first() {
                if self.failures.len() == 1 && !is_per_member(&failure.reason) {
                    return render_failure(failure, self.action.verb());
                }
            }
        }

        // Mass move to the channel everyone is already in
        if self.action == Action::Move && !self.already.is_empty() {
            return format!(
                "Everyone is already in {}.",
                self.destination.as_deref().unwrap_or("that channel")
            );
        }

        // Nothing eligible at all
        if self.acted.is_empty() && self.failures.is_empty() {
            return format!(
                "No one else to {} in {} (besides you and me).",
                self.action.verb(),
                self.scope.as_deref().unwrap_or("this channel")
            );
        }

        let mut feedback = match self.action {
            Action::Mute | Action::Unmute => format!(
                "{} {} member(s) in {}.",
                capitalize(self.action.past()),
                self.succeeded(),
                self.scope.as_deref().unwrap_or("the channel")
            ),
            Action::Move => format!(
                "Moved {} member(s) to {}.",
                self.succeeded(),
                self.destination.as_deref().unwrap_or("the channel")
            ),
            Action::Disconnect | Action::Ban => format!(
                "{} {} member(s).",
                capitalize(self.action.past()),
                self.succeeded()
            ),
        };

        if !self.failures.is_empty() {
            let failed: Vec<String> = self
                .failures
                .iter()
                .map(|f| format!("{} ({})", f.name, f.reason.short_code()))
                .collect();
            feedback.push_str(&format!(" Failed for: {}.", failed.join(", ")));
        }

        feedback
    }
}

/// Whether a reason arises per member inside the mass loop, as opposed to
/// refusing the whole request up front
const fn is_per_member(reason: &FailureReason) -> bool {
    matches!(
        reason,
        FailureReason::RoleHierarchy
            | FailureReason::Forbidden
            | FailureReason::Remote(_)
            | FailureReason::Unexpected(_)
    )
}

fn render_failure(failure: &TargetFailure, verb: &str) -> String {
    let name = &failure.name;
    match &failure.reason {
        FailureReason::NotFound(kind) => {
            format!("Could not find {} '{name}'.", kind.describe())
        }
        FailureReason::Ambiguous(kind, candidates) => format!(
            "Multiple {}s match '{name}': {}. Please be more specific.",
            kind.describe(),
            candidates.join(", ")
        ),
        FailureReason::PermissionDenied(permission) => {
            format!("I don't have permission to {}.", permission.describe())
        }
        FailureReason::RoleHierarchy => {
            format!("I cannot {verb} {name} due to role hierarchy.")
        }
        FailureReason::NotInVoice => format!("{name} is not in a voice channel."),
        FailureReason::NoVoiceScope => {
            "I'm not in a voice channel to perform this action.".to_string()
        }
        FailureReason::Forbidden => {
            format!("I lack permissions to {verb} {name}.")
        }
        FailureReason::Remote(code) => {
            format!("A Discord API error occurred ({code}) trying to {verb} {name}.")
        }
        FailureReason::Unexpected(detail) => {
            format!("An unexpected error occurred trying to {verb} {name}: {detail}")
        }
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().collect::<String>() + chars.as_str()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn individual_success_lines() {
        let mut report = ActionReport::individual(Action::Mute);
        report.acted.push("alice".to_string());
        assert_eq!(report.render(), "Voice muted alice.");

        let mut report = ActionReport::individual(Action::Move);
        report.destination = Some("Lounge".to_string());
        report.acted.push("alice".to_string());
        assert_eq!(report.render(), "Moved alice to Lounge.");
    }

    #[test]
    fn individual_no_op_lines() {
        let mut report = ActionReport::individual(Action::Mute);
        report.already.push("alice".to_string());
        assert_eq!(report.render(), "alice is already voice muted.");

        let mut report = ActionReport::individual(Action::Unmute);
        report.already.push("alice".to_string());
        assert_eq!(report.render(), "alice is not currently voice muted.");
    }

    #[test]
    fn ambiguous_member_line() {
        let mut report = ActionReport::individual(Action::Ban);
        report.failures.push(TargetFailure::new(
            "smith",
            FailureReason::Ambiguous(
                EntityKind::Member,
                vec!["smith one".into(), "smith two".into()],
            ),
        ));
        assert_eq!(
            report.render(),
            "Multiple members match 'smith': smith one, smith two. Please be more specific."
        );
    }

    #[test]
    fn mass_summary_with_failures() {
        let mut report = ActionReport::mass(Action::Mute);
        report.scope = Some("General".to_string());
        report.acted.push("alice".to_string());
        report.acted.push("bob".to_string());
        report
            .failures
            .push(TargetFailure::new("eve", FailureReason::RoleHierarchy));
        report
            .failures
            .push(TargetFailure::new("mallory", FailureReason::Remote(403)));

        assert_eq!(
            report.render(),
            "Muted 2 member(s) in General. Failed for: eve (role), mallory (http: 403)."
        );
    }

    #[test]
    fn mass_empty_scope() {
        let mut report = ActionReport::mass(Action::Disconnect);
        report.scope = Some("General".to_string());
        assert_eq!(
            report.render(),
            "No one else to disconnect in General (besides you and me)."
        );
    }

    #[test]
    fn mass_refusal_lines() {
        let mut report = ActionReport::mass(Action::Mute);
        report.failures.push(TargetFailure::new(
            "everyone",
            FailureReason::PermissionDenied(Permission::MuteMembers),
        ));
        assert_eq!(report.render(), "I don't have permission to mute members.");

        let mut report = ActionReport::mass(Action::Disconnect);
        report
            .failures
            .push(TargetFailure::new("everyone", FailureReason::NoVoiceScope));
        assert_eq!(
            report.render(),
            "I'm not in a voice channel to perform this action."
        );
    }

    #[test]
    fn mass_move_everyone_already_there() {
        let mut report = ActionReport::mass(Action::Move);
        report.scope = Some("General".to_string());
        report.destination = Some("General".to_string());
        report.already.push("everyone".to_string());
        assert_eq!(report.render(), "Everyone is already in General.");
    }
}
