//! GUI update messages carried inside envelopes.
//!
//! The remote app renders a page/card/button layout that the host describes
//! once (`JSON=...`) and then updates piecemeal:
//!
//! - `TEXT=BTN:<id>:<text>` replaces the text of a button
//! - `STATE=BTN:<id>:<0|1>` toggles a button's highlight
//! - `JSON=<layout>` replaces the whole layout
//!
//! Text and layout content is carried verbatim.

use serde::{Deserialize, Serialize};

use crate::error::{ProtocolError, ProtocolResult};

const TEXT_PREFIX: &str = "TEXT=BTN:";
const STATE_PREFIX: &str = "STATE=BTN:";
const JSON_PREFIX: &str = "JSON=";

/// One GUI update for the remote app.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuiMessage {
    /// Replace a button's text.
    ButtonText {
        /// Button id from the layout.
        id: String,
        /// New text; may contain `:`.
        text: String,
    },
    /// Set a button's on/off state.
    ButtonState {
        /// Button id from the layout.
        id: String,
        /// Highlighted or not.
        on: bool,
    },
    /// Replace the layout description.
    Layout(String),
}

impl GuiMessage {
    /// Encode as the text placed inside an envelope.
    pub fn encode(&self) -> String {
        match self {
            GuiMessage::ButtonText { id, text } => format!("{}{}:{}", TEXT_PREFIX, id, text),
            GuiMessage::ButtonState { id, on } => {
                format!("{}{}:{}", STATE_PREFIX, id, if *on { 1 } else { 0 })
            }
            GuiMessage::Layout(json) => format!("{}{}", JSON_PREFIX, json),
        }
    }

    /// Parse a reassembled envelope payload.
    pub fn parse(payload: &[u8]) -> ProtocolResult<GuiMessage> {
        let text = std::str::from_utf8(payload)
            .map_err(|_| ProtocolError::InvalidGui("payload is not UTF-8".to_string()))?;

        if let Some(rest) = text.strip_prefix(TEXT_PREFIX) {
            let (id, text) = split_id(rest)?;
            return Ok(GuiMessage::ButtonText {
                id: id.to_string(),
                text: text.to_string(),
            });
        }

        if let Some(rest) = text.strip_prefix(STATE_PREFIX) {
            let (id, value) = split_id(rest)?;
            let on = match value.trim_end() {
                "1" => true,
                "0" => false,
                other => {
                    return Err(ProtocolError::InvalidGui(format!(
                        "button state must be 0 or 1, got '{}'",
                        other
                    )))
                }
            };
            return Ok(GuiMessage::ButtonState {
                id: id.to_string(),
                on,
            });
        }

        if let Some(rest) = text.strip_prefix(JSON_PREFIX) {
            return Ok(GuiMessage::Layout(rest.to_string()));
        }

        Err(ProtocolError::InvalidGui(format!("unknown message: {}", text)))
    }
}

fn split_id(rest: &str) -> ProtocolResult<(&str, &str)> {
    match rest.split_once(':') {
        Some((id, value)) if !id.is_empty() => Ok((id, value)),
        _ => Err(ProtocolError::InvalidGui(format!(
            "expected <id>:<value>, got '{}'",
            rest
        ))),
    }
}

// ============================================================================
// Layout Description
// ============================================================================

/// Whole app layout, sent once as `JSON=...`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuiLayout {
    /// Icon shown by the app.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    /// Pages of cards.
    pub pages: Vec<GuiPage>,
    /// Built-in app pages to add (for example a serial monitor).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prescription: Option<Prescription>,
}

/// One swipeable page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuiPage {
    /// Page title.
    pub title: String,
    /// Cards on the page.
    pub cards: Vec<GuiCard>,
}

/// A titled row of buttons.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuiCard {
    /// Card title.
    pub name: String,
    /// Buttons in the card.
    pub buttons: Vec<GuiButton>,
}

/// A button or text field. A button with an `id` but no `cmd` is a display field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuiButton {
    /// Visible label.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// Characters sent back to the host when pressed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cmd: Option<String>,
    /// Id targeted by `TEXT=BTN` / `STATE=BTN` updates.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Width in grid columns out of 12 (the app expects a string).
    pub width: String,
}

impl GuiButton {
    /// Pressable button.
    pub fn command(label: &str, cmd: &str, width: u8) -> Self {
        GuiButton {
            label: Some(label.to_string()),
            cmd: Some(cmd.to_string()),
            id: None,
            width: width.to_string(),
        }
    }

    /// Text field updated by id.
    pub fn indicator(id: &str, width: u8) -> Self {
        GuiButton {
            label: None,
            cmd: None,
            id: Some(id.to_string()),
            width: width.to_string(),
        }
    }
}

/// Built-in app pages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Prescription {
    /// Prescription type understood by the app.
    #[serde(rename = "type")]
    pub kind: String,
    /// Built-in page names.
    pub pages: Vec<String>,
}

impl GuiLayout {
    /// Serialize the layout description.
    pub fn to_json(&self) -> ProtocolResult<String> {
        serde_json::to_string(self).map_err(|e| ProtocolError::Layout(e.to_string()))
    }

    /// Wrap the layout as a [`GuiMessage::Layout`].
    pub fn to_message(&self) -> ProtocolResult<GuiMessage> {
        Ok(GuiMessage::Layout(self.to_json()?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_messages() {
        let text = GuiMessage::ButtonText {
            id: "gainIndicator".to_string(),
            text: "12.0".to_string(),
        };
        assert_eq!(text.encode(), "TEXT=BTN:gainIndicator:12.0");

        let state = GuiMessage::ButtonState {
            id: "cpuStart".to_string(),
            on: true,
        };
        assert_eq!(state.encode(), "STATE=BTN:cpuStart:1");
    }

    #[test]
    fn test_parse_text_keeps_colons() {
        let msg = GuiMessage::parse(b"TEXT=BTN:clock:12:30").unwrap();
        assert_eq!(
            msg,
            GuiMessage::ButtonText {
                id: "clock".to_string(),
                text: "12:30".to_string()
            }
        );
    }

    #[test]
    fn test_parse_padded_state() {
        // Envelope padding may leave a trailing space
        let msg = GuiMessage::parse(b"STATE=BTN:x:0 ").unwrap();
        assert_eq!(
            msg,
            GuiMessage::ButtonState {
                id: "x".to_string(),
                on: false
            }
        );
        assert!(GuiMessage::parse(b"STATE=BTN:x:2").is_err());
        assert!(GuiMessage::parse(b"STATE=BTN::1").is_err());
    }

    #[test]
    fn test_parse_layout_verbatim() {
        let raw = b"JSON={'pages':[]}";
        assert_eq!(
            GuiMessage::parse(raw).unwrap(),
            GuiMessage::Layout("{'pages':[]}".to_string())
        );
        assert!(GuiMessage::parse(b"HELLO").is_err());
    }

    #[test]
    fn test_layout_json() {
        let layout = GuiLayout {
            icon: Some("tympan.png".to_string()),
            pages: vec![GuiPage {
                title: "Treble Boost".to_string(),
                cards: vec![GuiCard {
                    name: "Highpass Gain (dB)".to_string(),
                    buttons: vec![
                        GuiButton::command("-", "K", 4),
                        GuiButton::indicator("gainIndicator", 4),
                        GuiButton::command("+", "k", 4),
                    ],
                }],
            }],
            prescription: None,
        };

        let json = layout.to_json().unwrap();
        assert!(json.starts_with(r#"{"icon":"tympan.png","pages":[{"title":"Treble Boost""#));
        assert!(json.contains(r#"{"id":"gainIndicator","width":"4"}"#));

        let parsed: GuiLayout = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, layout);
        assert!(layout.to_message().unwrap().encode().starts_with("JSON={"));
    }
}
