//! The mutation seam between the dispatcher and the platform

use async_trait::async_trait;
use thiserror::Error;

use super::{ChannelId, MemberId};

/// Result type for gateway mutations
pub type GatewayResult<T> = std::result::Result<T, GatewayError>;

/// Failure of a single remote mutation call
///
/// Never retried; the dispatcher reports each failure against the target
/// it occurred on.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GatewayError {
    /// The platform rejected the call outright (permission revoked mid-flight)
    #[error("forbidden")]
    Forbidden,

    /// Transient API failure with its HTTP status code
    #[error("remote error (http {0})")]
    Remote(u16),

    /// Anything else the client surfaced
    #[error("unexpected error: {0}")]
    Other(String),
}

/// Moderation mutations against the live guild
///
/// Implemented over the serenity HTTP client in production and by a
/// call-recording double in tests. Each call maps to exactly one remote
/// mutation; idempotence guards live in the dispatcher, not here.
#[async_trait]
pub trait ModerationGateway: Send + Sync {
    /// Set a member's server-side voice mute flag
    async fn set_mute(&self, member: MemberId, muted: bool, reason: &str) -> GatewayResult<()>;

    /// Move a member to another voice channel, or disconnect with `None`
    async fn move_member(
        &self,
        member: MemberId,
        channel: Option<ChannelId>,
        reason: &str,
    ) -> GatewayResult<()>;

    /// Ban a member from the guild
    async fn ban_member(&self, member: MemberId, reason: &str) -> GatewayResult<()>;
}
