use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Player state codes used by the embedded player.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerState {
    Unstarted,
    Ended,
    Playing,
    Paused,
    Buffering,
    Cued,
    Unknown(i64),
}

impl PlayerState {
    pub fn from_code(code: i64) -> Self {
        match code {
            -1 => PlayerState::Unstarted,
            0 => PlayerState::Ended,
            1 => PlayerState::Playing,
            2 => PlayerState::Paused,
            3 => PlayerState::Buffering,
            5 => PlayerState::Cued,
            other => PlayerState::Unknown(other),
        }
    }

    /// `Some(paused)` when the state says something definite about playback,
    /// `None` for transient states that should keep the previous flag.
    pub fn paused_flag(self) -> Option<bool> {
        match self {
            PlayerState::Playing => Some(false),
            PlayerState::Paused | PlayerState::Ended | PlayerState::Cued => Some(true),
            PlayerState::Unstarted | PlayerState::Buffering | PlayerState::Unknown(_) => None,
        }
    }
}

impl<'de> Deserialize<'de> for PlayerState {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let code = f64::deserialize(deserializer)?;
        Ok(PlayerState::from_code(code as i64))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InfoDelivery {
    #[serde(default)]
    pub current_time: Option<f64>,
    #[serde(default)]
    pub player_state: Option<PlayerState>,
    #[serde(default)]
    pub playback_rate: Option<f64>,
}

/// Messages the player surface pushes to us. Anything else is dropped.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "event", content = "info")]
pub enum InboundMessage {
    #[serde(rename = "onStateChange")]
    StateChange(PlayerState),
    #[serde(rename = "onPlaybackRateChange")]
    RateChange(f64),
    #[serde(rename = "infoDelivery", alias = "initialDelivery")]
    Info(InfoDelivery),
}

impl InboundMessage {
    /// Parse a raw message. Returns `None` for anything unparseable or of
    /// an unknown shape.
    pub fn parse(raw: &str) -> Option<Self> {
        serde_json::from_str(raw).ok()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum PlayerCommand {
    GetCurrentTime,
    GetPlayerState,
}

/// Messages we post to the player surface.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum OutboundMessage {
    Command {
        func: PlayerCommand,
        args: Vec<Value>,
    },
    /// Asks the embed to start pushing `infoDelivery` events.
    Listening { id: String, channel: String },
}

impl OutboundMessage {
    pub fn command(func: PlayerCommand) -> Self {
        OutboundMessage::Command {
            func,
            args: Vec::new(),
        }
    }

    pub fn listening(id: impl Into<String>) -> Self {
        OutboundMessage::Listening {
            id: id.into(),
            channel: "widget".into(),
        }
    }

    pub fn to_json(&self) -> String {
        // Serializing these variants cannot fail: no maps with non-string keys.
        serde_json::to_string(self).unwrap_or_default()
    }
}
