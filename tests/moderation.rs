//! Moderation dispatch integration tests
//!
//! Exercises the interpret → dispatch pipeline against a call-recording
//! gateway double, without touching Discord.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use warden_bot::command::{Action, TargetSpec, interpret};
use warden_bot::guild::{
    ChannelId, GatewayError, GatewayResult, GuildSnapshot, Member, MemberId, ModerationGateway,
    PermissionSet, VoiceChannelInfo, VoiceState,
};
use warden_bot::moderation::Dispatcher;

/// A recorded mutation call
#[derive(Debug, Clone, PartialEq, Eq)]
enum Call {
    SetMute(u64, bool),
    Move(u64, Option<u64>),
    Ban(u64),
}

/// Gateway double that records calls and can fail per member
#[derive(Default)]
struct MockGateway {
    calls: Mutex<Vec<Call>>,
    failures: Mutex<HashMap<u64, GatewayError>>,
}

impl MockGateway {
    fn failing(member: u64, error: GatewayError) -> Self {
        let gateway = Self::default();
        gateway.failures.lock().unwrap().insert(member, error);
        gateway
    }

    fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    fn outcome(&self, member: MemberId) -> GatewayResult<()> {
        match self.failures.lock().unwrap().get(&member.0) {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl ModerationGateway for MockGateway {
    async fn set_mute(&self, member: MemberId, muted: bool, _reason: &str) -> GatewayResult<()> {
        self.calls
            .lock()
            .unwrap()
            .push(Call::SetMute(member.0, muted));
        self.outcome(member)
    }

    async fn move_member(
        &self,
        member: MemberId,
        channel: Option<ChannelId>,
        _reason: &str,
    ) -> GatewayResult<()> {
        self.calls
            .lock()
            .unwrap()
            .push(Call::Move(member.0, channel.map(|c| c.0)));
        self.outcome(member)
    }

    async fn ban_member(&self, member: MemberId, _reason: &str) -> GatewayResult<()> {
        self.calls.lock().unwrap().push(Call::Ban(member.0));
        self.outcome(member)
    }
}

const BOT: u64 = 1;
const CALLER: u64 = 2;
const GENERAL: u64 = 100;
const LOUNGE: u64 = 101;

fn member(id: u64, name: &str, rank: u16, voice: Option<(u64, bool)>) -> Member {
    Member {
        id: MemberId(id),
        display_name: name.to_string(),
        username: format!("{name}_account"),
        top_role_rank: rank,
        voice: voice.map(|(channel, muted)| VoiceState {
            channel: ChannelId(channel),
            muted,
        }),
    }
}

/// Guild with the bot (rank 5) and caller in General plus the given extras
fn snapshot(extras: Vec<Member>) -> GuildSnapshot {
    let mut members = vec![
        member(BOT, "warden", 5, Some((GENERAL, false))),
        member(CALLER, "caller", 4, Some((GENERAL, false))),
    ];
    members.extend(extras);

    let occupants = |channel: u64| {
        members
            .iter()
            .filter(|m| m.voice.is_some_and(|v| v.channel.0 == channel))
            .map(|m| m.id)
            .collect()
    };

    let voice_channels = vec![
        VoiceChannelInfo {
            id: ChannelId(GENERAL),
            name: "General".to_string(),
            members: occupants(GENERAL),
        },
        VoiceChannelInfo {
            id: ChannelId(LOUNGE),
            name: "Lounge".to_string(),
            members: occupants(LOUNGE),
        },
    ];

    GuildSnapshot {
        members,
        voice_channels,
        bot: MemberId(BOT),
        owner: MemberId(999),
        bot_permissions: PermissionSet::all(),
    }
}

async fn run(gateway: &MockGateway, snapshot: &GuildSnapshot, utterance: &str) -> warden_bot::ActionReport {
    let request = interpret(utterance).expect("utterance should parse");
    Dispatcher::new(gateway)
        .with_pacing(Duration::ZERO)
        .dispatch(&request, snapshot, MemberId(CALLER))
        .await
}

#[tokio::test]
async fn mute_issues_one_call() {
    let gateway = MockGateway::default();
    let snapshot = snapshot(vec![member(3, "alice", 0, Some((GENERAL, false)))]);

    let report = run(&gateway, &snapshot, "mute alice").await;

    assert_eq!(gateway.calls(), vec![Call::SetMute(3, true)]);
    assert_eq!(report.succeeded(), 1);
    assert_eq!(report.render(), "Voice muted alice.");
}

#[tokio::test]
async fn mute_already_muted_is_a_no_op() {
    let gateway = MockGateway::default();
    let snapshot = snapshot(vec![member(3, "alice", 0, Some((GENERAL, true)))]);

    let report = run(&gateway, &snapshot, "mute alice").await;

    assert!(gateway.calls().is_empty(), "no duplicate mutation call");
    assert_eq!(report.succeeded(), 0);
    assert_eq!(report.render(), "alice is already voice muted.");
}

#[tokio::test]
async fn unmute_unmuted_is_a_no_op() {
    let gateway = MockGateway::default();
    let snapshot = snapshot(vec![member(3, "alice", 0, Some((GENERAL, false)))]);

    let report = run(&gateway, &snapshot, "unmute alice").await;

    assert!(gateway.calls().is_empty());
    assert_eq!(report.render(), "alice is not currently voice muted.");
}

#[tokio::test]
async fn mute_requires_voice_presence() {
    let gateway = MockGateway::default();
    let snapshot = snapshot(vec![member(3, "alice", 0, None)]);

    let report = run(&gateway, &snapshot, "mute alice").await;

    assert!(gateway.calls().is_empty());
    assert_eq!(report.render(), "alice is not in a voice channel.");
}

#[tokio::test]
async fn missing_permission_refuses_without_calling() {
    let gateway = MockGateway::default();
    let mut snapshot = snapshot(vec![member(3, "alice", 0, Some((GENERAL, false)))]);
    snapshot.bot_permissions = PermissionSet::default();

    let report = run(&gateway, &snapshot, "mute alice").await;

    assert!(gateway.calls().is_empty());
    assert_eq!(report.render(), "I don't have permission to mute members.");
}

#[tokio::test]
async fn ban_refused_by_role_hierarchy_never_calls() {
    let gateway = MockGateway::default();
    // admin outranks the bot (rank 9 vs 5)
    let snapshot = snapshot(vec![member(3, "admin", 9, Some((GENERAL, false)))]);

    let report = run(&gateway, &snapshot, "ban admin").await;

    assert!(gateway.calls().is_empty(), "hierarchy refusal must not mutate");
    assert_eq!(report.render(), "I cannot ban admin due to role hierarchy.");
}

#[tokio::test]
async fn ban_lands_below_the_bot() {
    let gateway = MockGateway::default();
    let snapshot = snapshot(vec![member(3, "mallory", 0, None)]);

    let report = run(&gateway, &snapshot, "ban mallory").await;

    assert_eq!(gateway.calls(), vec![Call::Ban(3)]);
    assert_eq!(report.render(), "Banned mallory.");
}

#[tokio::test]
async fn move_resolves_member_and_channel() {
    let gateway = MockGateway::default();
    let snapshot = snapshot(vec![member(3, "alice", 0, Some((GENERAL, false)))]);

    let report = run(&gateway, &snapshot, "move alice to lounge").await;

    assert_eq!(gateway.calls(), vec![Call::Move(3, Some(LOUNGE))]);
    assert_eq!(report.render(), "Moved alice to Lounge.");
}

#[tokio::test]
async fn move_to_current_channel_is_a_no_op() {
    let gateway = MockGateway::default();
    let snapshot = snapshot(vec![member(3, "alice", 0, Some((LOUNGE, false)))]);

    let report = run(&gateway, &snapshot, "move alice to lounge").await;

    assert!(gateway.calls().is_empty());
    assert_eq!(report.render(), "alice is already in Lounge.");
}

#[tokio::test]
async fn move_to_unknown_channel_refuses() {
    let gateway = MockGateway::default();
    let snapshot = snapshot(vec![member(3, "alice", 0, Some((GENERAL, false)))]);

    let report = run(&gateway, &snapshot, "move alice to atlantis").await;

    assert!(gateway.calls().is_empty());
    assert_eq!(report.render(), "Could not find voice channel 'atlantis'.");
}

#[tokio::test]
async fn ambiguous_member_refuses_with_candidates() {
    let gateway = MockGateway::default();
    let snapshot = snapshot(vec![
        member(3, "smith one", 0, Some((GENERAL, false))),
        member(4, "smith two", 0, Some((GENERAL, false))),
    ]);

    let report = run(&gateway, &snapshot, "disconnect smith").await;

    assert!(gateway.calls().is_empty());
    assert_eq!(
        report.render(),
        "Multiple members match 'smith': smith one, smith two. Please be more specific."
    );
}

#[tokio::test]
async fn remote_failure_is_reported_not_retried() {
    let gateway = MockGateway::failing(3, GatewayError::Remote(500));
    let snapshot = snapshot(vec![member(3, "alice", 0, Some((GENERAL, false)))]);

    let report = run(&gateway, &snapshot, "kick alice").await;

    assert_eq!(gateway.calls(), vec![Call::Move(3, None)]);
    assert_eq!(
        report.render(),
        "A Discord API error occurred (500) trying to disconnect alice."
    );
}

#[tokio::test]
async fn mass_disconnect_spares_caller_and_bot() {
    let gateway = MockGateway::default();
    let snapshot = snapshot(vec![
        member(3, "alice", 0, Some((GENERAL, false))),
        member(4, "bob", 0, Some((GENERAL, false))),
        member(5, "carol", 0, Some((LOUNGE, false))),
    ]);

    let report = run(&gateway, &snapshot, "kick them").await;

    // carol is in another channel; caller and bot are excluded
    assert_eq!(
        gateway.calls(),
        vec![Call::Move(3, None), Call::Move(4, None)]
    );
    assert_eq!(report.succeeded(), 2);
    assert_eq!(report.render(), "Disconnected 2 member(s).");
}

#[tokio::test]
async fn mass_report_covers_every_member() {
    let gateway = MockGateway::failing(4, GatewayError::Remote(500));
    let snapshot = snapshot(vec![
        member(3, "alice", 0, Some((GENERAL, false))),
        member(4, "bob", 0, Some((GENERAL, false))),
        member(5, "dave", 9, Some((GENERAL, false))),
        member(6, "erin", 0, Some((GENERAL, true))),
    ]);

    let report = run(&gateway, &snapshot, "mute them").await;

    // dave outranks the bot, bob's call fails remotely, erin was already
    // muted (mutation elided), alice goes through
    assert_eq!(
        gateway.calls(),
        vec![Call::SetMute(3, true), Call::SetMute(4, true)]
    );
    assert_eq!(report.succeeded(), 2);
    assert_eq!(report.failures.len(), 2);

    let eligible = 4;
    assert_eq!(report.succeeded(), eligible - report.failures.len());
    assert_eq!(
        report.render(),
        "Muted 2 member(s) in General. Failed for: bob (http: 500), dave (role)."
    );
}

#[tokio::test]
async fn mass_unmute_skips_members_who_are_not_muted() {
    let gateway = MockGateway::default();
    let snapshot = snapshot(vec![
        member(3, "alice", 0, Some((GENERAL, true))),
        member(4, "bob", 0, Some((GENERAL, false))),
    ]);

    let report = run(&gateway, &snapshot, "unmute them").await;

    assert_eq!(gateway.calls(), vec![Call::SetMute(3, false)]);
    assert_eq!(report.succeeded(), 2);
    assert!(report.failures.is_empty());
}

#[tokio::test]
async fn mass_with_no_one_else_makes_no_calls() {
    let gateway = MockGateway::default();
    let snapshot = snapshot(vec![]);

    let report = run(&gateway, &snapshot, "mute them").await;

    assert!(gateway.calls().is_empty());
    assert_eq!(
        report.render(),
        "No one else to mute in General (besides you and me)."
    );
}

#[tokio::test]
async fn mass_move_sends_everyone_to_the_destination() {
    let gateway = MockGateway::default();
    let snapshot = snapshot(vec![
        member(3, "alice", 0, Some((GENERAL, false))),
        member(4, "bob", 0, Some((GENERAL, false))),
    ]);

    let report = run(&gateway, &snapshot, "move them to lounge").await;

    assert_eq!(
        gateway.calls(),
        vec![Call::Move(3, Some(LOUNGE)), Call::Move(4, Some(LOUNGE))]
    );
    assert_eq!(report.render(), "Moved 2 member(s) to Lounge.");
}

#[tokio::test]
async fn mass_move_to_current_channel_is_refused_up_front() {
    let gateway = MockGateway::default();
    let snapshot = snapshot(vec![member(3, "alice", 0, Some((GENERAL, false)))]);

    let report = run(&gateway, &snapshot, "move them to general").await;

    assert!(gateway.calls().is_empty());
    assert_eq!(report.render(), "Everyone is already in General.");
}

#[tokio::test]
async fn mass_requires_the_bot_in_voice() {
    let gateway = MockGateway::default();
    let mut snapshot = snapshot(vec![member(3, "alice", 0, Some((GENERAL, false)))]);
    for m in &mut snapshot.members {
        if m.id == MemberId(BOT) {
            m.voice = None;
        }
    }

    let report = run(&gateway, &snapshot, "kick them").await;

    assert!(gateway.calls().is_empty());
    assert_eq!(
        report.render(),
        "I'm not in a voice channel to perform this action."
    );
}

#[tokio::test]
async fn owner_bot_ignores_role_hierarchy() {
    let gateway = MockGateway::default();
    let mut snapshot = snapshot(vec![member(3, "admin", 9, Some((GENERAL, false)))]);
    snapshot.owner = MemberId(BOT);

    let report = run(&gateway, &snapshot, "ban admin").await;

    assert_eq!(gateway.calls(), vec![Call::Ban(3)]);
    assert_eq!(report.render(), "Banned admin.");
}

#[tokio::test]
async fn forbidden_mid_flight_is_surfaced() {
    let gateway = MockGateway::failing(3, GatewayError::Forbidden);
    let snapshot = snapshot(vec![member(3, "alice", 0, Some((GENERAL, false)))]);

    let report = run(&gateway, &snapshot, "mute alice").await;

    assert_eq!(gateway.calls(), vec![Call::SetMute(3, true)]);
    assert_eq!(report.render(), "I lack permissions to mute alice.");
}

#[tokio::test]
async fn interpreted_request_matches_grammar() {
    // Pipeline sanity: grammar output drives the dispatcher scope
    let request = interpret("move them to lounge").expect("should parse");
    assert_eq!(request.action, Action::Move);
    assert_eq!(request.target, TargetSpec::Everyone);

    let request = interpret("ban smith").expect("should parse");
    assert_eq!(request.target, TargetSpec::Named("smith".to_string()));
}
