//! Warden - Voice-command moderation bot for Discord guilds
//!
//! This library provides the core functionality for the Warden bot:
//! - Utterance interpretation (mass phrases + `verb target [to target2]`)
//! - Name fragment resolution against guild directory snapshots
//! - Moderation dispatch (mute, unmute, move, disconnect, ban) with
//!   per-target failure reporting
//! - Microphone capture and speech-to-text for ad-hoc voice commands
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │                    Interfaces                        │
//! │     Text commands   │   Voice (mic + STT)           │
//! └────────────────────┬────────────────────────────────┘
//!                      │ utterance
//! ┌────────────────────▼────────────────────────────────┐
//! │                  Warden core                         │
//! │  Interpreter │ Resolver │ Dispatcher │ Mass executor │
//! └────────────────────┬────────────────────────────────┘
//!                      │ mutations
//! ┌────────────────────▼────────────────────────────────┐
//! │              Discord (serenity)                      │
//! │   Gateway cache  │  Member edits  │  Bans           │
//! └─────────────────────────────────────────────────────┘
//! ```

pub mod bot;
pub mod command;
pub mod config;
pub mod error;
pub mod guild;
pub mod moderation;
pub mod voice;

pub use bot::WardenBot;
pub use command::{Action, ActionRequest, InterpretError, TargetSpec, interpret};
pub use config::Config;
pub use error::{Error, Result};
pub use guild::{GuildSnapshot, ModerationGateway};
pub use moderation::{ActionReport, Dispatcher};
