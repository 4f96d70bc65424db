//! Discord bot front-end
//!
//! Wires the gateway event stream to the interpreter and dispatcher.
//! Text commands (`!join`, `!leave`, `!listen`, `!do <utterance>`) feed
//! the same pipeline: utterance in, rendered report out.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serenity::Client;
use serenity::all::{Context, EventHandler, GatewayIntents, GuildId, Message, Ready};
use tokio::sync::Mutex;

use crate::command::{Action, InterpretError, interpret};
use crate::config::Config;
use crate::guild::serenity::{SerenityGateway, snapshot_from_cache};
use crate::guild::{ChannelId, MemberId};
use crate::moderation::Dispatcher;
use crate::voice::{
    RecognitionError, SAMPLE_RATE, Transcriber, normalize, record_window, samples_to_wav,
};
use crate::{Error, Result};

/// The Warden bot: owns the serenity client lifecycle
pub struct WardenBot {
    config: Config,
}

impl WardenBot {
    #[must_use]
    pub const fn new(config: Config) -> Self {
        Self { config }
    }

    /// Connect to Discord and run until the gateway connection ends
    ///
    /// # Errors
    ///
    /// Returns error if the client cannot be built or the connection
    /// fails fatally
    pub async fn run(self) -> Result<()> {
        let intents = GatewayIntents::GUILDS
            | GatewayIntents::GUILD_MEMBERS
            | GatewayIntents::GUILD_VOICE_STATES
            | GatewayIntents::GUILD_MESSAGES
            | GatewayIntents::MESSAGE_CONTENT;

        let transcriber = if self.config.voice.enabled {
            match self.config.voice.transcriber() {
                Ok(transcriber) => Some(transcriber),
                Err(e) => {
                    tracing::warn!(error = %e, "voice recognition disabled");
                    None
                }
            }
        } else {
            None
        };

        let handler = Handler {
            config: self.config.clone(),
            transcriber,
            active_channels: Mutex::new(HashMap::new()),
        };

        let mut client = Client::builder(&self.config.discord_token, intents)
            .event_handler(handler)
            .await
            .map_err(|e| Error::Discord(format!("client error: {e}")))?;

        client
            .start()
            .await
            .map_err(|e| Error::Discord(format!("gateway error: {e}")))
    }
}

/// Discord event handler
struct Handler {
    config: Config,
    transcriber: Option<Transcriber>,

    /// Voice channel the bot was asked to join, per guild. The bot joins
    /// as a marker for the mass-action scope, not as an audio peer.
    active_channels: Mutex<HashMap<GuildId, ChannelId>>,
}

#[async_trait]
impl EventHandler for Handler {
    async fn ready(&self, _ctx: Context, ready: Ready) {
        tracing::info!(
            user = %ready.user.name,
            prefix = %self.config.command_prefix,
            wake_word = %self.config.wake_word,
            "bot ready"
        );
    }

    async fn message(&self, ctx: Context, msg: Message) {
        if msg.author.bot {
            return;
        }
        let Some(guild_id) = msg.guild_id else {
            return;
        };
        let Some(rest) = msg.content.strip_prefix(&self.config.command_prefix) else {
            return;
        };

        let (command, args) = rest
            .split_once(|c: char| c.is_whitespace())
            .unwrap_or((rest, ""));

        let reply = match command {
            "join" => self.join(&ctx, guild_id, &msg).await,
            "leave" => self.leave(guild_id).await,
            "listen" => self.listen(&ctx, guild_id, &msg).await,
            "do" => {
                self.run_utterance(&ctx, guild_id, &msg, &normalize(args))
                    .await
            }
            _ => return,
        };

        if let Err(e) = msg.channel_id.say(&ctx.http, reply).await {
            tracing::warn!(error = %e, "failed to send reply");
        }
    }
}

impl Handler {
    /// Mark the caller's voice channel as the bot's active channel
    async fn join(&self, ctx: &Context, guild_id: GuildId, msg: &Message) -> String {
        let caller_channel = {
            let Some(guild) = ctx.cache.guild(guild_id) else {
                return "Guild not cached yet, try again shortly.".to_string();
            };

            guild
                .voice_states
                .get(&msg.author.id)
                .and_then(|state| state.channel_id)
                .map(|id| {
                    let name = guild
                        .channels
                        .get(&id)
                        .map_or_else(|| id.to_string(), |c| c.name.clone());
                    (ChannelId(id.get()), name)
                })
        };

        match caller_channel {
            Some((channel, name)) => {
                self.active_channels.lock().await.insert(guild_id, channel);
                tracing::info!(channel = %name, "joined voice channel");
                format!(
                    "Joined {name}. Use {prefix}listen for a voice command or {prefix}do <command>.",
                    prefix = self.config.command_prefix
                )
            }
            None => "You are not connected to a voice channel.".to_string(),
        }
    }

    /// Clear the bot's active voice channel
    async fn leave(&self, guild_id: GuildId) -> String {
        if self.active_channels.lock().await.remove(&guild_id).is_some() {
            tracing::info!("left voice channel");
            "Disconnected from the voice channel.".to_string()
        } else {
            "I am not connected to a voice channel.".to_string()
        }
    }

    /// Capture one utterance from the host microphone and run it
    async fn listen(&self, ctx: &Context, guild_id: GuildId, msg: &Message) -> String {
        let Some(transcriber) = &self.transcriber else {
            return "Voice recognition is not configured.".to_string();
        };

        if !self.active_channels.lock().await.contains_key(&guild_id) {
            return format!(
                "I'm not in a voice channel. Use {}join first.",
                self.config.command_prefix
            );
        }

        let samples = match record_window(self.config.voice.listen_window).await {
            Ok(samples) => samples,
            Err(e) => {
                tracing::warn!(error = %e, "microphone capture failed");
                return format!("Could not record audio: {e}.");
            }
        };

        let wav = match samples_to_wav(&samples, SAMPLE_RATE) {
            Ok(wav) => wav,
            Err(e) => return format!("Could not encode audio: {e}."),
        };

        match transcriber.recognize(&wav).await {
            Ok(utterance) => {
                let report = self.run_utterance(ctx, guild_id, msg, &utterance).await;
                format!("Recognized: \"{utterance}\"\n{report}")
            }
            Err(err @ RecognitionError::Unintelligible) => {
                tracing::debug!("speech not understood");
                format!("Sorry, I did not understand the audio ({err}).")
            }
            Err(RecognitionError::Timeout) => {
                "Speech recognition timed out, try again.".to_string()
            }
            Err(err @ RecognitionError::ServiceUnavailable(_)) => {
                format!("Speech recognition service error: {err}.")
            }
        }
    }

    /// Interpret a normalized utterance and dispatch the resulting request
    async fn run_utterance(
        &self,
        ctx: &Context,
        guild_id: GuildId,
        msg: &Message,
        utterance: &str,
    ) -> String {
        let utterance = strip_wake_word(utterance, &self.config.wake_word);
        tracing::info!(author = %msg.author.name, utterance = %utterance, "processing utterance");

        let request = match interpret(&utterance) {
            Ok(request) => request,
            Err(err) => return interpret_reply(&err),
        };

        let bot_channel = self.active_channels.lock().await.get(&guild_id).copied();
        let Some(snapshot) = snapshot_from_cache(&ctx.cache, guild_id, bot_channel) else {
            return "Guild not cached yet, try again shortly.".to_string();
        };

        let gateway = SerenityGateway::new(Arc::clone(&ctx.http), guild_id);
        let dispatcher = Dispatcher::new(&gateway).with_pacing(self.config.moderation.pacing);
        let caller = MemberId(msg.author.id.get());

        dispatcher.dispatch(&request, &snapshot, caller).await.render()
    }
}

/// User-facing message for an interpretation failure
fn interpret_reply(err: &InterpretError) -> String {
    match err {
        InterpretError::Empty => "No command detected in the input.".to_string(),
        InterpretError::UnrecognizedAction(word) => {
            format!("Unrecognized action: '{word}'. Say 'action member_name'.")
        }
        InterpretError::MissingArgument(Action::Move) => {
            "For 'move', say 'move member_name to channel_name'.".to_string()
        }
        InterpretError::MissingArgument(action) => {
            format!("Please specify a member name after '{}'.", action.verb())
        }
    }
}

/// Strip a leading wake word plus trailing punctuation from an utterance
fn strip_wake_word(utterance: &str, wake_word: &str) -> String {
    utterance.strip_prefix(wake_word).map_or_else(
        || utterance.to_string(),
        |rest| {
            rest.trim_start_matches(|c: char| c.is_whitespace() || c == ',' || c == '.')
                .to_string()
        },
    )
}
