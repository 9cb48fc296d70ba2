use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::config::{
    ContentType, FieldConfig, InputType, KeyboardType, ReturnKeyType, Rgba, TextAlign,
};
use crate::error::{BridgeError, Result};
use crate::geometry::NormalizedRect;
use crate::registry::FieldId;

/// Flat key/value payload exchanged with the native peer.
pub type Message = Map<String, Value>;

/// Commands sent to the native peer for one field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "msg")]
pub enum Command {
    #[serde(rename = "CREATE_EDIT")]
    CreateEdit(CreateEdit),
    #[serde(rename = "REMOVE_EDIT")]
    RemoveEdit,
    #[serde(rename = "SET_TEXT")]
    SetText { text: String },
    #[serde(rename = "SET_PLACEHOLDER")]
    SetPlaceholder { placeholder: String },
    #[serde(rename = "SET_RECT")]
    SetRect(RectPayload),
    #[serde(rename = "SET_FOCUS")]
    SetFocus {
        #[serde(deserialize_with = "wire::flag")]
        is_focus: bool,
    },
    #[serde(rename = "SET_VISIBLE")]
    SetVisible {
        #[serde(deserialize_with = "wire::flag")]
        is_visible: bool,
    },
    #[serde(rename = "ANDROID_KEY_DOWN")]
    AndroidKeyDown { key: String },
}

impl Command {
    pub fn kind(&self) -> &'static str {
        match self {
            Command::CreateEdit(_) => "CREATE_EDIT",
            Command::RemoveEdit => "REMOVE_EDIT",
            Command::SetText { .. } => "SET_TEXT",
            Command::SetPlaceholder { .. } => "SET_PLACEHOLDER",
            Command::SetRect(_) => "SET_RECT",
            Command::SetFocus { .. } => "SET_FOCUS",
            Command::SetVisible { .. } => "SET_VISIBLE",
            Command::AndroidKeyDown { .. } => "ANDROID_KEY_DOWN",
        }
    }

    /// Encodes the command for `id`, which is appended as the last key.
    pub fn encode(&self, id: FieldId) -> Result<Message> {
        let mut message = match serde_json::to_value(self)? {
            Value::Object(map) => map,
            other => {
                return Err(BridgeError::UnknownMessage(format!(
                    "command encoded to non-object: {other}"
                )));
            }
        };

        message.insert("id".to_string(), Value::from(id.get()));
        Ok(message)
    }

    pub fn decode(message: &Message) -> Result<Self> {
        if !message.contains_key("msg") {
            return Err(BridgeError::MissingField("msg"));
        }

        Ok(serde_json::from_value(Value::Object(message.clone()))?)
    }
}

/// Normalised placement, with every component as a decimal string.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RectPayload {
    #[serde(with = "wire::decimal")]
    pub x: f32,
    #[serde(with = "wire::decimal")]
    pub y: f32,
    #[serde(with = "wire::decimal")]
    pub width: f32,
    #[serde(with = "wire::decimal")]
    pub height: f32,
}

impl From<NormalizedRect> for RectPayload {
    fn from(rect: NormalizedRect) -> Self {
        Self {
            x: rect.x,
            y: rect.y,
            width: rect.width,
            height: rect.height,
        }
    }
}

impl From<RectPayload> for NormalizedRect {
    fn from(payload: RectPayload) -> Self {
        Self {
            x: payload.x,
            y: payload.y,
            width: payload.width,
            height: payload.height,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateEdit {
    #[serde(with = "wire::decimal")]
    pub x: f32,
    #[serde(with = "wire::decimal")]
    pub y: f32,
    #[serde(with = "wire::decimal")]
    pub width: f32,
    #[serde(with = "wire::decimal")]
    pub height: f32,
    #[serde(deserialize_with = "wire::int")]
    pub character_limit: i32,
    #[serde(with = "wire::decimal")]
    pub text_color_r: f32,
    #[serde(with = "wire::decimal")]
    pub text_color_g: f32,
    #[serde(with = "wire::decimal")]
    pub text_color_b: f32,
    #[serde(with = "wire::decimal")]
    pub text_color_a: f32,
    #[serde(with = "wire::decimal")]
    pub back_color_r: f32,
    #[serde(with = "wire::decimal")]
    pub back_color_g: f32,
    #[serde(with = "wire::decimal")]
    pub back_color_b: f32,
    #[serde(with = "wire::decimal")]
    pub back_color_a: f32,
    #[serde(with = "wire::decimal")]
    pub font_size: f32,
    pub content_type: ContentType,
    pub align: TextAlign,
    #[serde(deserialize_with = "wire::flag")]
    pub with_done_button: bool,
    #[serde(deserialize_with = "wire::flag")]
    pub with_clear_button: bool,
    pub placeholder: String,
    #[serde(with = "wire::decimal")]
    pub placeholder_color_r: f32,
    #[serde(with = "wire::decimal")]
    pub placeholder_color_g: f32,
    #[serde(with = "wire::decimal")]
    pub placeholder_color_b: f32,
    #[serde(with = "wire::decimal")]
    pub placeholder_color_a: f32,
    #[serde(deserialize_with = "wire::flag")]
    pub multiline: bool,
    pub font: String,
    pub input_type: InputType,
    pub keyboard_type: KeyboardType,
    pub return_key_type: ReturnKeyType,
}

impl CreateEdit {
    pub fn new(rect: NormalizedRect, config: &FieldConfig) -> Self {
        Self {
            x: rect.x,
            y: rect.y,
            width: rect.width,
            height: rect.height,
            character_limit: config.character_limit,
            text_color_r: config.text_color.r,
            text_color_g: config.text_color.g,
            text_color_b: config.text_color.b,
            text_color_a: config.text_color.a,
            back_color_r: config.background_color.r,
            back_color_g: config.background_color.g,
            back_color_b: config.background_color.b,
            back_color_a: config.background_color.a,
            font_size: config.font_size,
            content_type: config.content_type,
            align: config.align,
            with_done_button: config.with_done_button,
            with_clear_button: config.with_clear_button,
            placeholder: config.placeholder.clone(),
            placeholder_color_r: config.placeholder_color.r,
            placeholder_color_g: config.placeholder_color.g,
            placeholder_color_b: config.placeholder_color.b,
            placeholder_color_a: config.placeholder_color.a,
            multiline: config.multiline,
            font: config.font.clone(),
            input_type: config.input_type,
            keyboard_type: config.keyboard_type,
            return_key_type: config.return_key,
        }
    }

    pub fn rect(&self) -> NormalizedRect {
        NormalizedRect {
            x: self.x,
            y: self.y,
            width: self.width,
            height: self.height,
        }
    }

    pub fn config(&self) -> FieldConfig {
        FieldConfig {
            multiline: self.multiline,
            text_color: Rgba::new(
                self.text_color_r,
                self.text_color_g,
                self.text_color_b,
                self.text_color_a,
            ),
            background_color: Rgba::new(
                self.back_color_r,
                self.back_color_g,
                self.back_color_b,
                self.back_color_a,
            ),
            placeholder_color: Rgba::new(
                self.placeholder_color_r,
                self.placeholder_color_g,
                self.placeholder_color_b,
                self.placeholder_color_a,
            ),
            content_type: self.content_type,
            input_type: self.input_type,
            keyboard_type: self.keyboard_type,
            font_size: self.font_size,
            align: self.align,
            character_limit: self.character_limit,
            font: self.font.clone(),
            placeholder: self.placeholder.clone(),
            return_key: self.return_key_type,
            with_done_button: self.with_done_button,
            with_clear_button: self.with_clear_button,
        }
    }
}

/// Messages emitted by the native peer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "msg")]
pub enum NativeEvent {
    #[serde(rename = "READY")]
    Ready { id: FieldId },
    #[serde(rename = "TEXT_CHANGE")]
    TextChange { id: FieldId, text: String },
    #[serde(rename = "TEXT_END_EDIT")]
    TextEndEdit { id: FieldId, text: String },
    #[serde(rename = "ON_FOCUS")]
    OnFocus { id: FieldId },
    #[serde(rename = "ON_UNFOCUS")]
    OnUnfocus { id: FieldId },
    #[serde(rename = "RETURN_PRESSED")]
    ReturnPressed { id: FieldId },
    #[serde(rename = "KEYBOARD_ACTION")]
    KeyboardAction {
        #[serde(deserialize_with = "wire::flag")]
        show: bool,
        #[serde(default, deserialize_with = "wire::int")]
        height: i32,
    },
}

const NATIVE_EVENT_KINDS: &[&str] = &[
    "READY",
    "TEXT_CHANGE",
    "TEXT_END_EDIT",
    "ON_FOCUS",
    "ON_UNFOCUS",
    "RETURN_PRESSED",
    "KEYBOARD_ACTION",
];

/// A field-scoped inbound event with the routing id stripped off.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldEvent {
    Ready,
    TextChange(String),
    TextEndEdit(String),
    Focus,
    Unfocus,
    ReturnPressed,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Inbound {
    Field(FieldId, FieldEvent),
    Keyboard { show: bool, height: i32 },
}

impl NativeEvent {
    pub fn decode(message: &Message) -> Result<Self> {
        let kind = message
            .get("msg")
            .and_then(Value::as_str)
            .ok_or(BridgeError::MissingField("msg"))?;

        if !NATIVE_EVENT_KINDS.contains(&kind) {
            return Err(BridgeError::UnknownMessage(kind.to_string()));
        }

        Ok(serde_json::from_value(Value::Object(message.clone()))?)
    }

    pub fn route(self) -> Inbound {
        match self {
            NativeEvent::Ready { id } => Inbound::Field(id, FieldEvent::Ready),
            NativeEvent::TextChange { id, text } => Inbound::Field(id, FieldEvent::TextChange(text)),
            NativeEvent::TextEndEdit { id, text } => {
                Inbound::Field(id, FieldEvent::TextEndEdit(text))
            }
            NativeEvent::OnFocus { id } => Inbound::Field(id, FieldEvent::Focus),
            NativeEvent::OnUnfocus { id } => Inbound::Field(id, FieldEvent::Unfocus),
            NativeEvent::ReturnPressed { id } => Inbound::Field(id, FieldEvent::ReturnPressed),
            NativeEvent::KeyboardAction { show, height } => Inbound::Keyboard { show, height },
        }
    }
}

/// A decoded plugin envelope: routing name plus the payload for the plugin.
#[derive(Debug, Clone, PartialEq)]
pub struct Envelope {
    pub name: String,
    pub is_error: bool,
    pub body: Message,
}

/// Decodes `{"name": .., "data": ..}` or `{"name": .., "error": ..}`.
///
/// Native layers usually send `data` as a JSON-encoded string; an inline
/// object is accepted too, and without `data` the envelope itself is the body.
/// Error envelopes keep every key so the handler can log the full report.
pub fn decode_envelope(raw: &str) -> Result<Envelope> {
    let mut info: Message = serde_json::from_str(raw)?;

    let name = info
        .get("name")
        .and_then(Value::as_str)
        .ok_or(BridgeError::MissingField("name"))?
        .to_string();

    if info.contains_key("error") {
        return Ok(Envelope {
            name,
            is_error: true,
            body: info,
        });
    }

    let body = match info.remove("data") {
        Some(Value::String(inner)) => serde_json::from_str::<Message>(&inner)?,
        Some(Value::Object(map)) => map,
        Some(other) => {
            return Err(BridgeError::UnknownMessage(format!(
                "data must be an object or encoded object, got {other}"
            )));
        }
        None => {
            info.remove("name");
            info
        }
    };

    Ok(Envelope {
        name,
        is_error: false,
        body,
    })
}

/// Builds the envelope a native layer would send for `body`.
pub fn encode_envelope(name: &str, body: &Message) -> Result<String> {
    let data = serde_json::to_string(body)?;
    let mut info = Message::new();
    info.insert("name".to_string(), Value::from(name));
    info.insert("data".to_string(), Value::from(data));
    Ok(serde_json::to_string(&info)?)
}

/// Leniency shims for values that cross the boundary as strings.
pub(crate) mod wire {
    use serde::de::{self, Deserializer};
    use serde::{Deserialize, Serializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Scalar {
        Bool(bool),
        Int(i64),
        Float(f64),
        Text(String),
    }

    pub mod decimal {
        use super::*;

        pub fn serialize<S: Serializer>(value: &f32, serializer: S) -> Result<S::Ok, S::Error> {
            serializer.collect_str(value)
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f32, D::Error> {
            match Scalar::deserialize(deserializer)? {
                Scalar::Text(raw) => raw
                    .trim()
                    .parse::<f32>()
                    .map_err(|_| de::Error::custom(format!("invalid decimal '{raw}'"))),
                Scalar::Int(value) => Ok(value as f32),
                Scalar::Float(value) => Ok(value as f32),
                Scalar::Bool(_) => Err(de::Error::custom("expected decimal, got bool")),
            }
        }
    }

    pub fn flag<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
        match Scalar::deserialize(deserializer)? {
            Scalar::Bool(value) => Ok(value),
            Scalar::Text(raw) => match raw.trim() {
                "true" | "True" | "1" => Ok(true),
                "false" | "False" | "0" => Ok(false),
                other => Err(de::Error::custom(format!("invalid flag '{other}'"))),
            },
            Scalar::Int(value) => Ok(value != 0),
            Scalar::Float(_) => Err(de::Error::custom("expected flag, got float")),
        }
    }

    pub fn int<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i32, D::Error> {
        let value = match Scalar::deserialize(deserializer)? {
            Scalar::Int(value) => value,
            Scalar::Text(raw) => raw
                .trim()
                .parse::<i64>()
                .map_err(|_| de::Error::custom(format!("invalid integer '{raw}'")))?,
            Scalar::Float(value) if value.fract() == 0.0 => value as i64,
            _ => return Err(de::Error::custom("expected integer")),
        };

        i32::try_from(value).map_err(|_| de::Error::custom(format!("integer out of range: {value}")))
    }
}
