use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::element::ElementStyle;

/// Native keyboards render text this many points larger than the managed
/// layer does for the same nominal size.
pub const NATIVE_FONT_SIZE_OFFSET: f32 = 12.5;

const DEFAULT_OUTBOUND_QUEUE_CAP: usize = 256;
const DEFAULT_READY_TIMEOUT_TICKS: u32 = 300;
const DEFAULT_MAX_CREATE_ATTEMPTS: u32 = 3;

pub const OUTBOUND_QUEUE_CAP_VAR: &str = "NATIVE_INPUT_OUTBOUND_QUEUE_CAP";
pub const READY_TIMEOUT_TICKS_VAR: &str = "NATIVE_INPUT_READY_TIMEOUT_TICKS";
pub const MAX_CREATE_ATTEMPTS_VAR: &str = "NATIVE_INPUT_MAX_CREATE_ATTEMPTS";
pub const FONT_DIR_VAR: &str = "NATIVE_INPUT_FONT_DIR";
pub const FONT_CACHE_DIR_VAR: &str = "NATIVE_INPUT_FONT_CACHE_DIR";

/// Colour with normalised `0.0..=1.0` components.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Rgba {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Rgba {
    pub const CLEAR: Rgba = Rgba::new(0.0, 0.0, 0.0, 0.0);
    pub const BLACK: Rgba = Rgba::new(0.0, 0.0, 0.0, 1.0);
    pub const WHITE: Rgba = Rgba::new(1.0, 1.0, 1.0, 1.0);

    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TextAlign {
    #[default]
    UpperLeft,
    UpperCenter,
    UpperRight,
    MiddleLeft,
    MiddleCenter,
    MiddleRight,
    LowerLeft,
    LowerCenter,
    LowerRight,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContentType {
    #[default]
    Standard,
    Autocorrected,
    IntegerNumber,
    DecimalNumber,
    Alphanumeric,
    Name,
    EmailAddress,
    Password,
    Pin,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum InputType {
    #[default]
    Standard,
    AutoCorrect,
    Password,
}

#[allow(clippy::upper_case_acronyms)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum KeyboardType {
    #[default]
    Default,
    ASCIICapable,
    NumbersAndPunctuation,
    URL,
    NumberPad,
    PhonePad,
    NamePhonePad,
    EmailAddress,
    Social,
    Search,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReturnKeyType {
    #[default]
    Default,
    Next,
    Done,
    Search,
    Send,
}

/// Per-field settings chosen by the application rather than resolved from
/// the element's style.
#[derive(Clone, Debug, PartialEq)]
pub struct FieldOptions {
    pub custom_font: String,
    /// Leave hiding to the application instead of dismissing on outside taps.
    pub manual_hide_control: bool,
    pub with_done_button: bool,
    pub with_clear_button: bool,
    pub return_key: ReturnKeyType,
    pub content_type: ContentType,
    pub input_type: InputType,
    pub keyboard_type: KeyboardType,
    pub placeholder: String,
    pub placeholder_color: Rgba,
}

impl Default for FieldOptions {
    fn default() -> Self {
        Self {
            custom_font: String::new(),
            manual_hide_control: false,
            with_done_button: false,
            with_clear_button: false,
            return_key: ReturnKeyType::Default,
            content_type: ContentType::Standard,
            input_type: InputType::Standard,
            keyboard_type: KeyboardType::Default,
            placeholder: String::new(),
            placeholder_color: Rgba::CLEAR,
        }
    }
}

/// Everything the native peer needs to build a widget. Fixed for the
/// lifetime of one native widget; changing it means recreating the field.
#[derive(Clone, Debug, PartialEq)]
pub struct FieldConfig {
    pub multiline: bool,
    pub text_color: Rgba,
    pub background_color: Rgba,
    pub placeholder_color: Rgba,
    pub content_type: ContentType,
    pub input_type: InputType,
    pub keyboard_type: KeyboardType,
    pub font_size: f32,
    pub align: TextAlign,
    pub character_limit: i32,
    pub font: String,
    pub placeholder: String,
    pub return_key: ReturnKeyType,
    pub with_done_button: bool,
    pub with_clear_button: bool,
}

impl FieldConfig {
    pub fn capture(style: &ElementStyle, options: &FieldOptions) -> Self {
        Self {
            multiline: style.multiline,
            text_color: style.text_color,
            background_color: style.background_color,
            placeholder_color: options.placeholder_color,
            content_type: options.content_type,
            input_type: options.input_type,
            keyboard_type: options.keyboard_type,
            font_size: style.font_size - NATIVE_FONT_SIZE_OFFSET,
            align: style.align,
            character_limit: style.max_length,
            font: options.custom_font.clone(),
            placeholder: options.placeholder.clone(),
            return_key: options.return_key,
            with_done_button: options.with_done_button,
            with_clear_button: options.with_clear_button,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct BridgeSettings {
    pub outbound_queue_cap: usize,
    /// Ticks a created field waits for `READY` before it is recreated.
    pub ready_timeout_ticks: u32,
    /// Total `CREATE_EDIT` sends per field before it is reported stalled.
    pub max_create_attempts: u32,
    /// Directory holding `.ttf` files the native peer needs.
    pub font_dir: Option<PathBuf>,
    /// Writable directory the native peer loads fonts from.
    pub font_cache_dir: Option<PathBuf>,
}

impl Default for BridgeSettings {
    fn default() -> Self {
        Self {
            outbound_queue_cap: DEFAULT_OUTBOUND_QUEUE_CAP,
            ready_timeout_ticks: DEFAULT_READY_TIMEOUT_TICKS,
            max_create_attempts: DEFAULT_MAX_CREATE_ATTEMPTS,
            font_dir: None,
            font_cache_dir: None,
        }
    }
}

impl BridgeSettings {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        Self {
            outbound_queue_cap: parse_positive(lookup(OUTBOUND_QUEUE_CAP_VAR))
                .unwrap_or(defaults.outbound_queue_cap),
            ready_timeout_ticks: parse_positive(lookup(READY_TIMEOUT_TICKS_VAR))
                .unwrap_or(defaults.ready_timeout_ticks),
            max_create_attempts: parse_positive(lookup(MAX_CREATE_ATTEMPTS_VAR))
                .unwrap_or(defaults.max_create_attempts),
            font_dir: parse_path(lookup(FONT_DIR_VAR)),
            font_cache_dir: parse_path(lookup(FONT_CACHE_DIR_VAR)),
        }
    }
}

fn parse_positive<T>(raw: Option<String>) -> Option<T>
where
    T: std::str::FromStr + PartialOrd + Default,
{
    raw.and_then(|raw| raw.trim().parse::<T>().ok())
        .filter(|value| *value > T::default())
}

fn parse_path(raw: Option<String>) -> Option<PathBuf> {
    raw.filter(|raw| !raw.is_empty()).map(PathBuf::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn capture_applies_native_font_offset() {
        let style = ElementStyle {
            font_size: 40.0,
            max_length: 12,
            multiline: true,
            ..ElementStyle::default()
        };
        let options = FieldOptions {
            custom_font: "Saira".to_string(),
            return_key: ReturnKeyType::Send,
            ..FieldOptions::default()
        };

        let config = FieldConfig::capture(&style, &options);

        assert_eq!(config.font_size, 27.5);
        assert_eq!(config.character_limit, 12);
        assert!(config.multiline);
        assert_eq!(config.font, "Saira");
        assert_eq!(config.return_key, ReturnKeyType::Send);
        assert_eq!(config.placeholder_color, Rgba::CLEAR);
    }

    #[test]
    fn settings_fall_back_to_defaults() {
        let settings = BridgeSettings::from_lookup(|_| None);
        assert_eq!(settings, BridgeSettings::default());
    }

    #[test]
    fn settings_read_overrides_and_reject_zero() {
        let vars: HashMap<&str, &str> = HashMap::from([
            (OUTBOUND_QUEUE_CAP_VAR, "32"),
            (READY_TIMEOUT_TICKS_VAR, "0"),
            (MAX_CREATE_ATTEMPTS_VAR, "not-a-number"),
            (FONT_DIR_VAR, "/opt/fonts"),
            (FONT_CACHE_DIR_VAR, ""),
        ]);

        let settings = BridgeSettings::from_lookup(|key| vars.get(key).map(|v| v.to_string()));

        assert_eq!(settings.outbound_queue_cap, 32);
        assert_eq!(settings.ready_timeout_ticks, DEFAULT_READY_TIMEOUT_TICKS);
        assert_eq!(settings.max_create_attempts, DEFAULT_MAX_CREATE_ATTEMPTS);
        assert_eq!(settings.font_dir, Some(PathBuf::from("/opt/fonts")));
        assert_eq!(settings.font_cache_dir, None);
    }
}
