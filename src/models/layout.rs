use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;

use super::common::{LabelKey, TemplateId};
use crate::core::{CertificateError, CertificateResult, Orientation, PaperSize};

pub const DEFAULT_TEXT_COLOR: &str = "#1f2937";

/// Smallest scale the resize handle can produce.
pub const MIN_ELEMENT_SCALE: f64 = 0.2;

const CUSTOM_TEXT_PREFIX: &str = "custom_";

/// Stable key of one positionable, stylable and hideable region of a template.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ElementId {
    Logo,
    Title,
    PresentedTo,
    Recipient,
    EventStr,
    EventName,
    EntryNo,
    Date,
    Qr,
    SignatureImg,
    Signature,
    Seal,
    /// A freeform text block from `customTexts`, keyed by its id.
    Custom(String),
    /// Keys written by older editors that this version does not know about.
    Other(String),
}

impl ElementId {
    pub const BUILT_IN: [ElementId; 12] = [
        ElementId::Logo,
        ElementId::Title,
        ElementId::PresentedTo,
        ElementId::Recipient,
        ElementId::EventStr,
        ElementId::EventName,
        ElementId::EntryNo,
        ElementId::Date,
        ElementId::Qr,
        ElementId::SignatureImg,
        ElementId::Signature,
        ElementId::Seal,
    ];

    pub fn parse(key: &str) -> ElementId {
        match key {
            "logo" => ElementId::Logo,
            "title" => ElementId::Title,
            "presentedTo" => ElementId::PresentedTo,
            "recipient" => ElementId::Recipient,
            "eventStr" => ElementId::EventStr,
            "eventName" => ElementId::EventName,
            "entryNo" => ElementId::EntryNo,
            "date" => ElementId::Date,
            "qr" => ElementId::Qr,
            "signatureImg" => ElementId::SignatureImg,
            "signature" => ElementId::Signature,
            "seal" => ElementId::Seal,
            other => match other.strip_prefix(CUSTOM_TEXT_PREFIX) {
                Some(id) if !id.is_empty() => ElementId::Custom(id.to_string()),
                _ => ElementId::Other(other.to_string()),
            },
        }
    }

    /// Default anchor on the Custom template, in percent of the canvas.
    pub fn default_position(&self) -> Position {
        let (x, y) = match self {
            ElementId::Logo => (50.0, 12.0),
            ElementId::Title => (50.0, 25.0),
            ElementId::PresentedTo => (50.0, 36.0),
            ElementId::Recipient => (50.0, 47.0),
            ElementId::EventStr => (50.0, 57.0),
            ElementId::EventName => (50.0, 64.0),
            ElementId::EntryNo => (15.0, 92.0),
            ElementId::Date => (75.0, 76.0),
            ElementId::Qr => (12.0, 80.0),
            ElementId::SignatureImg => (75.0, 84.0),
            ElementId::Signature => (75.0, 92.0),
            ElementId::Seal => (62.0, 82.0),
            ElementId::Custom(_) | ElementId::Other(_) => (50.0, 50.0),
        };
        Position { x, y }
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ElementId::Logo => "logo",
            ElementId::Title => "title",
            ElementId::PresentedTo => "presentedTo",
            ElementId::Recipient => "recipient",
            ElementId::EventStr => "eventStr",
            ElementId::EventName => "eventName",
            ElementId::EntryNo => "entryNo",
            ElementId::Date => "date",
            ElementId::Qr => "qr",
            ElementId::SignatureImg => "signatureImg",
            ElementId::Signature => "signature",
            ElementId::Seal => "seal",
            ElementId::Custom(id) => return write!(f, "{}{}", CUSTOM_TEXT_PREFIX, id),
            ElementId::Other(key) => key,
        };
        write!(f, "{}", name)
    }
}

impl Serialize for ElementId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ElementId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let key = String::deserialize(deserializer)?;
        Ok(ElementId::parse(&key))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FontStyle {
    #[default]
    Serif,
    Sans,
    Handwriting,
    Times,
}

impl FontStyle {
    pub const ALL: [FontStyle; 4] = [
        FontStyle::Serif,
        FontStyle::Sans,
        FontStyle::Handwriting,
        FontStyle::Times,
    ];

    /// Webfont the style is designed around.
    pub fn primary_family(&self) -> &'static str {
        match self {
            FontStyle::Serif => "Playfair Display",
            FontStyle::Sans => "Be Vietnam Pro",
            FontStyle::Handwriting => "Dancing Script",
            FontStyle::Times => "Times New Roman",
        }
    }

    pub fn generic_family(&self) -> &'static str {
        match self {
            FontStyle::Sans => "sans-serif",
            FontStyle::Handwriting => "cursive",
            FontStyle::Serif | FontStyle::Times => "serif",
        }
    }

    /// CSS/SVG `font-family` list with fallbacks.
    pub fn css_family(&self) -> String {
        match self {
            FontStyle::Serif => "'Playfair Display', 'Noto Serif', serif".to_string(),
            FontStyle::Sans => "'Be Vietnam Pro', 'Noto Sans', Arial, sans-serif".to_string(),
            FontStyle::Handwriting => "'Dancing Script', 'Great Vibes', cursive".to_string(),
            FontStyle::Times => "'Times New Roman', Times, serif".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BgMode {
    #[default]
    Cover,
    Contain,
    Fill,
}

impl BgMode {
    /// SVG `preserveAspectRatio` equivalent of the CSS background sizing.
    pub fn preserve_aspect_ratio(&self) -> &'static str {
        match self {
            BgMode::Cover => "xMidYMid slice",
            BgMode::Contain => "xMidYMid meet",
            BgMode::Fill => "none",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogoAlignment {
    Left,
    #[default]
    Center,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Position { x, y }.clamped()
    }

    pub fn clamped(self) -> Self {
        Position {
            x: clamp_percent(self.x),
            y: clamp_percent(self.y),
        }
    }
}

fn clamp_percent(value: f64) -> f64 {
    if value.is_nan() {
        return 0.0;
    }
    value.clamp(0.0, 100.0)
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ElementStyle {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

/// Style of an element after defaults are applied.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedStyle {
    pub scale: f64,
    pub color: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Labels {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub presented_to: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_prefix: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_prefix: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entry_no: Option<String>,
}

impl Labels {
    pub fn get(&self, key: LabelKey) -> Option<&str> {
        self.slot(key).as_deref()
    }

    pub fn set(&mut self, key: LabelKey, text: impl Into<String>) {
        *self.slot_mut(key) = Some(text.into());
    }

    fn slot(&self, key: LabelKey) -> &Option<String> {
        match key {
            LabelKey::Title => &self.title,
            LabelKey::PresentedTo => &self.presented_to,
            LabelKey::EventPrefix => &self.event_prefix,
            LabelKey::DatePrefix => &self.date_prefix,
            LabelKey::Signature => &self.signature,
            LabelKey::EntryNo => &self.entry_no,
        }
    }

    fn slot_mut(&mut self, key: LabelKey) -> &mut Option<String> {
        match key {
            LabelKey::Title => &mut self.title,
            LabelKey::PresentedTo => &mut self.presented_to,
            LabelKey::EventPrefix => &mut self.event_prefix,
            LabelKey::DatePrefix => &mut self.date_prefix,
            LabelKey::Signature => &mut self.signature,
            LabelKey::EntryNo => &mut self.entry_no,
        }
    }

    /// Rewrites every configured caption in place.
    pub fn map_configured(&mut self, mut f: impl FnMut(&str) -> String) {
        for key in LabelKey::ALL {
            if let Some(text) = self.slot_mut(key) {
                *text = f(text);
            }
        }
    }
}

fn default_custom_font_size() -> f64 {
    20.0
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomText {
    pub id: String,
    pub content: String,
    pub x: f64,
    pub y: f64,
    #[serde(default = "default_custom_font_size")]
    pub font_size: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_style: Option<FontStyle>,
}

/// Which text role a font is requested for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontRole {
    Body,
    Title,
    Recipient,
}

/// Full serializable visual description of one certificate design.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LayoutConfig {
    pub paper_size: PaperSize,
    pub orientation: Orientation,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_style: Option<FontStyle>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title_font: Option<FontStyle>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recipient_font: Option<FontStyle>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text_color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bg_image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logo_image: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub logos: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signature_image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seal_image: Option<String>,
    pub bg_mode: BgMode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bg_opacity: Option<f64>,
    pub logo_alignment: LogoAlignment,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logo_scale: Option<f64>,
    pub positions: BTreeMap<ElementId, Position>,
    pub element_styles: BTreeMap<ElementId, ElementStyle>,
    pub visibility: BTreeMap<ElementId, bool>,
    pub labels: Labels,
    pub custom_texts: Vec<CustomText>,
}

impl LayoutConfig {
    pub fn canvas_size(&self) -> (u32, u32) {
        self.paper_size.canvas_px(self.orientation)
    }

    pub fn text_color(&self) -> &str {
        self.text_color.as_deref().unwrap_or(DEFAULT_TEXT_COLOR)
    }

    pub fn font_for(&self, role: FontRole) -> FontStyle {
        let base = self.font_style.unwrap_or_default();
        match role {
            FontRole::Body => base,
            FontRole::Title => self.title_font.unwrap_or(base),
            FontRole::Recipient => self.recipient_font.unwrap_or(base),
        }
    }

    /// Every font style the config can put on the canvas.
    pub fn fonts_in_use(&self) -> Vec<FontStyle> {
        let mut fonts = vec![
            self.font_for(FontRole::Body),
            self.font_for(FontRole::Title),
            self.font_for(FontRole::Recipient),
        ];
        fonts.extend(self.custom_texts.iter().filter_map(|t| t.font_style));
        let mut unique = Vec::new();
        for font in fonts {
            if !unique.contains(&font) {
                unique.push(font);
            }
        }
        unique
    }

    pub fn bg_opacity(&self) -> f64 {
        self.bg_opacity.unwrap_or(1.0).clamp(0.0, 1.0)
    }

    pub fn logo_scale(&self) -> f64 {
        self.logo_scale.unwrap_or(1.0).clamp(0.5, 2.0)
    }

    /// Configured logo sources, the single `logoImage` slot first.
    pub fn logo_sources(&self) -> Vec<&str> {
        self.logo_image
            .iter()
            .chain(self.logos.iter())
            .map(String::as_str)
            .filter(|src| !src.trim().is_empty())
            .collect()
    }

    pub fn position(&self, element: &ElementId) -> Position {
        if let ElementId::Custom(id) = element {
            if let Some(text) = self.custom_texts.iter().find(|t| &t.id == id) {
                return Position { x: text.x, y: text.y }.clamped();
            }
        }
        self.positions
            .get(element)
            .map(|p| p.clamped())
            .unwrap_or_else(|| element.default_position())
    }

    pub fn style(&self, element: &ElementId) -> ResolvedStyle {
        let configured = self.element_styles.get(element);
        ResolvedStyle {
            scale: configured.and_then(|s| s.scale).unwrap_or(1.0),
            color: configured
                .and_then(|s| s.color.clone())
                .unwrap_or_else(|| self.text_color().to_string()),
        }
    }

    pub fn is_visible(&self, template: TemplateId, element: &ElementId) -> bool {
        match self.visibility.get(element) {
            Some(visible) => *visible,
            None => match element {
                ElementId::Qr => !template.is_custom(),
                _ => true,
            },
        }
    }

    pub fn label(&self, template: TemplateId, key: LabelKey) -> String {
        self.labels
            .get(key)
            .map(str::to_string)
            .unwrap_or_else(|| template.default_label(key).to_string())
    }

    /// Merges one editor update into the config.
    pub fn apply(&mut self, update: LayoutUpdate) {
        match update {
            LayoutUpdate::Position { element, x, y } => {
                let position = Position::new(x, y);
                if let ElementId::Custom(id) = &element {
                    if let Some(text) = self.custom_texts.iter_mut().find(|t| &t.id == id) {
                        text.x = position.x;
                        text.y = position.y;
                        return;
                    }
                }
                self.positions.insert(element, position);
            }
            LayoutUpdate::Style { element, property } => {
                let style = self.element_styles.entry(element).or_default();
                match property {
                    StyleProperty::Scale(scale) => style.scale = Some(scale),
                    StyleProperty::Color(color) => style.color = Some(color),
                }
            }
            LayoutUpdate::Visibility { element, visible } => {
                self.visibility.insert(element, visible);
            }
            LayoutUpdate::Label { key, text } => self.labels.set(key, text),
        }
    }

    /// Image slots as (slot name, source) pairs.
    pub fn image_slots(&self) -> Vec<(String, &str)> {
        let mut slots = Vec::new();
        if let Some(src) = &self.bg_image {
            slots.push(("bgImage".to_string(), src.as_str()));
        }
        if let Some(src) = &self.logo_image {
            slots.push(("logoImage".to_string(), src.as_str()));
        }
        for (i, src) in self.logos.iter().enumerate() {
            slots.push((format!("logos[{}]", i), src.as_str()));
        }
        if let Some(src) = &self.signature_image {
            slots.push(("signatureImage".to_string(), src.as_str()));
        }
        if let Some(src) = &self.seal_image {
            slots.push(("sealImage".to_string(), src.as_str()));
        }
        slots
    }

    pub fn image_slots_mut(&mut self) -> Vec<(String, &mut String)> {
        let mut slots = Vec::new();
        if let Some(src) = self.bg_image.as_mut() {
            slots.push(("bgImage".to_string(), src));
        }
        if let Some(src) = self.logo_image.as_mut() {
            slots.push(("logoImage".to_string(), src));
        }
        for (i, src) in self.logos.iter_mut().enumerate() {
            slots.push((format!("logos[{}]", i), src));
        }
        if let Some(src) = self.signature_image.as_mut() {
            slots.push(("signatureImage".to_string(), src));
        }
        if let Some(src) = self.seal_image.as_mut() {
            slots.push(("sealImage".to_string(), src));
        }
        slots
    }

    /// Rejects embedded images above the upload cap.
    pub fn validate_assets(&self, max_bytes: usize) -> CertificateResult<()> {
        for (slot, src) in self.image_slots() {
            if let Some(size) = data_uri_payload_size(src) {
                if size > max_bytes {
                    return Err(CertificateError::AssetTooLarge {
                        slot,
                        size,
                        limit: max_bytes,
                    });
                }
            }
        }
        Ok(())
    }
}

/// Decoded byte size of a base64 data URI, `None` for URLs.
pub fn data_uri_payload_size(src: &str) -> Option<usize> {
    let rest = src.strip_prefix("data:")?;
    let (_, payload) = rest.split_once(";base64,")?;
    let padding = payload.bytes().rev().take_while(|b| *b == b'=').count();
    Some(((payload.len() / 4) * 3 + (payload.len() % 4) * 3 / 4).saturating_sub(padding.min(2)))
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StyleProperty {
    Scale(f64),
    Color(String),
}

/// One change emitted by the interactive editor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum LayoutUpdate {
    Position { element: ElementId, x: f64, y: f64 },
    Style { element: ElementId, property: StyleProperty },
    Visibility { element: ElementId, visible: bool },
    Label { key: LabelKey, text: String },
}

impl LayoutUpdate {
    /// Parses the prefixed key scheme browser editors send:
    /// `pos_<id>`, `style_<id>_scale`, `style_<id>_color`, `visibility_<id>`
    /// or a bare label key.
    pub fn from_key(key: &str, value: &serde_json::Value) -> CertificateResult<LayoutUpdate> {
        let invalid = || CertificateError::Validation(format!("Invalid value for {}: {}", key, value));

        if let Some(element) = key.strip_prefix("pos_") {
            let position: Position = serde_json::from_value(value.clone()).map_err(|_| invalid())?;
            return Ok(LayoutUpdate::Position {
                element: ElementId::parse(element),
                x: position.x,
                y: position.y,
            });
        }

        if let Some(rest) = key.strip_prefix("style_") {
            if let Some(element) = rest.strip_suffix("_scale") {
                let scale = value.as_f64().ok_or_else(invalid)?;
                return Ok(LayoutUpdate::Style {
                    element: ElementId::parse(element),
                    property: StyleProperty::Scale(scale),
                });
            }
            if let Some(element) = rest.strip_suffix("_color") {
                let color = value.as_str().ok_or_else(invalid)?;
                return Ok(LayoutUpdate::Style {
                    element: ElementId::parse(element),
                    property: StyleProperty::Color(color.to_string()),
                });
            }
        }

        if let Some(element) = key.strip_prefix("visibility_") {
            let visible = value.as_bool().ok_or_else(invalid)?;
            return Ok(LayoutUpdate::Visibility {
                element: ElementId::parse(element),
                visible,
            });
        }

        if let Some(label) = LabelKey::parse(key) {
            let text = value.as_str().ok_or_else(invalid)?;
            return Ok(LayoutUpdate::Label {
                key: label,
                text: text.to_string(),
            });
        }

        Err(CertificateError::Validation(format!("Unknown layout key: {}", key)))
    }
}
