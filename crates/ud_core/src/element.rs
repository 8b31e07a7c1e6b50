use std::fmt;
use std::ops::{BitOr, BitOrAssign};
use std::str::FromStr;

use serde::ser::SerializeSeq;
use serde::{Deserialize, Serialize, Serializer};

use crate::geometry::BoundingRect;
use crate::heuristics::guess_type_from_ocr_text;

/// Confidence reported for elements that come from the accessibility tree.
pub const ACCESSIBILITY_CONFIDENCE: f32 = 1.0;

/// Semantic control category.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub enum ControlType {
    Button,
    TextBox,
    MenuItem,
    CheckBox,
    RadioButton,
    ComboBox,
    List,
    ListItem,
    Tab,
    Link,
    Text,
    Icon,
    Image,
    Pane,
    Window,
    /// A label the vocabulary above does not know about.
    Other(String),
}

impl ControlType {
    pub fn as_str(&self) -> &str {
        match self {
            ControlType::Button => "Button",
            ControlType::TextBox => "TextBox",
            ControlType::MenuItem => "MenuItem",
            ControlType::CheckBox => "CheckBox",
            ControlType::RadioButton => "RadioButton",
            ControlType::ComboBox => "ComboBox",
            ControlType::List => "List",
            ControlType::ListItem => "ListItem",
            ControlType::Tab => "Tab",
            ControlType::Link => "Link",
            ControlType::Text => "Text",
            ControlType::Icon => "Icon",
            ControlType::Image => "Image",
            ControlType::Pane => "Pane",
            ControlType::Window => "Window",
            ControlType::Other(name) => name,
        }
    }

    /// Types that say nothing about interactivity. A more specific type from another
    /// source is preferred over these when merging.
    pub fn is_generic(&self) -> bool {
        matches!(
            self,
            ControlType::Text | ControlType::Image | ControlType::Pane | ControlType::Other(_)
        )
    }
}

impl fmt::Display for ControlType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for ControlType {
    fn from(label: &str) -> Self {
        match label {
            "Button" => ControlType::Button,
            "TextBox" | "Edit" => ControlType::TextBox,
            "MenuItem" => ControlType::MenuItem,
            "CheckBox" => ControlType::CheckBox,
            "RadioButton" => ControlType::RadioButton,
            "ComboBox" => ControlType::ComboBox,
            "List" => ControlType::List,
            "ListItem" => ControlType::ListItem,
            "Tab" | "TabItem" => ControlType::Tab,
            "Link" | "Hyperlink" => ControlType::Link,
            "Text" => ControlType::Text,
            "Icon" => ControlType::Icon,
            "Image" => ControlType::Image,
            "Pane" | "Group" => ControlType::Pane,
            "Window" => ControlType::Window,
            other => ControlType::Other(other.to_string()),
        }
    }
}

impl From<String> for ControlType {
    fn from(label: String) -> Self {
        ControlType::from(label.as_str())
    }
}

impl From<ControlType> for String {
    fn from(t: ControlType) -> Self {
        match t {
            ControlType::Other(name) => name,
            known => known.as_str().to_string(),
        }
    }
}

/// One detection tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Tier {
    Accessibility,
    Ocr,
    PixelAnalysis,
}

impl Tier {
    pub const ALL: [Tier; 3] = [Tier::Accessibility, Tier::Ocr, Tier::PixelAnalysis];

    pub fn name(self) -> &'static str {
        match self {
            Tier::Accessibility => "accessibility",
            Tier::Ocr => "ocr",
            Tier::PixelAnalysis => "pixelAnalysis",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Error returned when a tier name is not recognized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownTier(pub String);

impl fmt::Display for UnknownTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown detection tier: {}", self.0)
    }
}

impl std::error::Error for UnknownTier {}

impl FromStr for Tier {
    type Err = UnknownTier;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "accessibility" | "uia" | "a11y" => Ok(Tier::Accessibility),
            "ocr" => Ok(Tier::Ocr),
            "pixel" | "pixelanalysis" | "pixel_analysis" | "visual" => Ok(Tier::PixelAnalysis),
            _ => Err(UnknownTier(s.to_string())),
        }
    }
}

/// Set of tiers that contributed to an element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Sources(u8);

impl Sources {
    pub const NONE: Sources = Sources(0);
    pub const ACCESSIBILITY: Sources = Sources(0b001);
    pub const OCR: Sources = Sources(0b010);
    pub const PIXEL_ANALYSIS: Sources = Sources(0b100);

    #[inline]
    pub fn bits(self) -> u8 {
        self.0
    }

    #[inline]
    pub fn contains(self, other: Sources) -> bool {
        other.0 != 0 && self.0 & other.0 == other.0
    }

    #[inline]
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub fn count(self) -> u32 {
        self.0.count_ones()
    }

    pub fn tiers(self) -> impl Iterator<Item = Tier> {
        Tier::ALL
            .into_iter()
            .filter(move |t| self.contains(Sources::from(*t)))
    }
}

impl From<Tier> for Sources {
    fn from(tier: Tier) -> Self {
        match tier {
            Tier::Accessibility => Sources::ACCESSIBILITY,
            Tier::Ocr => Sources::OCR,
            Tier::PixelAnalysis => Sources::PIXEL_ANALYSIS,
        }
    }
}

impl FromIterator<Tier> for Sources {
    fn from_iter<I: IntoIterator<Item = Tier>>(iter: I) -> Self {
        iter.into_iter()
            .fold(Sources::NONE, |acc, t| acc | Sources::from(t))
    }
}

impl BitOr for Sources {
    type Output = Sources;

    fn bitor(self, rhs: Sources) -> Sources {
        Sources(self.0 | rhs.0)
    }
}

impl BitOrAssign for Sources {
    fn bitor_assign(&mut self, rhs: Sources) {
        self.0 |= rhs.0;
    }
}

impl Serialize for Sources {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.count() as usize))?;
        for tier in self.tiers() {
            seq.serialize_element(tier.name())?;
        }
        seq.end()
    }
}

/// A fused, externally visible UI element.
#[derive(Debug, Clone, PartialEq)]
pub struct DetectedElement {
    /// 1-based, assigned after fusion. 0 until then.
    pub id: u32,
    pub element_type: ControlType,
    pub name: String,
    pub bounds: BoundingRect,
    pub stable_id: Option<String>,
    pub is_enabled: bool,
    pub is_interactable: bool,
    pub sources: Sources,
    pub confidence: f32,
}

impl DetectedElement {
    pub fn new(
        element_type: ControlType,
        name: impl Into<String>,
        bounds: BoundingRect,
        sources: Sources,
        confidence: f32,
    ) -> Self {
        Self {
            id: 0,
            element_type,
            name: name.into(),
            bounds,
            stable_id: None,
            is_enabled: true,
            is_interactable: true,
            sources,
            confidence: clamp_confidence(confidence),
        }
    }

    #[inline]
    pub fn center(&self) -> (i32, i32) {
        self.bounds.center()
    }

    /// Whether the accessibility tree vouches for this element.
    #[inline]
    pub fn is_authoritative(&self) -> bool {
        self.sources.contains(Sources::ACCESSIBILITY)
    }
}

#[derive(Serialize)]
struct Point {
    x: i32,
    y: i32,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ElementRecord<'a> {
    id: u32,
    #[serde(rename = "type")]
    element_type: &'a str,
    name: &'a str,
    bbox: &'a BoundingRect,
    center: Point,
    source: Sources,
    confidence: f32,
    automation_id: Option<&'a str>,
    is_enabled: bool,
    interactable: bool,
}

impl Serialize for DetectedElement {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let (x, y) = self.center();
        ElementRecord {
            id: self.id,
            element_type: self.element_type.as_str(),
            name: &self.name,
            bbox: &self.bounds,
            center: Point { x, y },
            source: self.sources,
            confidence: self.confidence,
            automation_id: self.stable_id.as_deref(),
            is_enabled: self.is_enabled,
            interactable: self.is_interactable,
        }
        .serialize(serializer)
    }
}

/// Raw element from the accessibility/automation API.
#[derive(Debug, Clone, PartialEq)]
pub struct AccessibilityElement {
    pub control_type: ControlType,
    pub name: String,
    pub stable_id: Option<String>,
    pub is_enabled: bool,
    pub is_interactable: bool,
    pub bounds: BoundingRect,
}

/// Raw OCR candidate.
#[derive(Debug, Clone, PartialEq)]
pub struct TextRegion {
    pub text: String,
    pub bounds: BoundingRect,
    pub confidence: f32,
}

/// Raw pixel-analysis candidate.
#[derive(Debug, Clone, PartialEq)]
pub struct VisualElement {
    pub element_type: ControlType,
    pub bounds: BoundingRect,
    pub confidence: f32,
}

/// A raw record tagged by the tier that produced it.
#[derive(Debug, Clone, PartialEq)]
pub enum Candidate {
    Accessibility(AccessibilityElement),
    Ocr(TextRegion),
    Pixel(VisualElement),
}

impl Candidate {
    pub fn tier(&self) -> Tier {
        match self {
            Candidate::Accessibility(_) => Tier::Accessibility,
            Candidate::Ocr(_) => Tier::Ocr,
            Candidate::Pixel(_) => Tier::PixelAnalysis,
        }
    }

    /// Normalize into the unified element shape (id left at 0).
    pub fn into_element(self) -> DetectedElement {
        match self {
            Candidate::Accessibility(a) => DetectedElement {
                id: 0,
                element_type: a.control_type,
                name: a.name,
                bounds: a.bounds,
                stable_id: a.stable_id,
                is_enabled: a.is_enabled,
                is_interactable: a.is_interactable,
                sources: Sources::ACCESSIBILITY,
                confidence: ACCESSIBILITY_CONFIDENCE,
            },
            Candidate::Ocr(t) => {
                let element_type = guess_type_from_ocr_text(&t.text);
                DetectedElement::new(element_type, t.text, t.bounds, Sources::OCR, t.confidence)
            }
            Candidate::Pixel(v) => DetectedElement::new(
                v.element_type,
                String::new(),
                v.bounds,
                Sources::PIXEL_ANALYSIS,
                v.confidence,
            ),
        }
    }
}

impl From<AccessibilityElement> for Candidate {
    fn from(a: AccessibilityElement) -> Self {
        Candidate::Accessibility(a)
    }
}

impl From<TextRegion> for Candidate {
    fn from(t: TextRegion) -> Self {
        Candidate::Ocr(t)
    }
}

impl From<VisualElement> for Candidate {
    fn from(v: VisualElement) -> Self {
        Candidate::Pixel(v)
    }
}

#[inline]
pub(crate) fn clamp_confidence(c: f32) -> f32 {
    if c.is_nan() { 0.0 } else { c.clamp(0.0, 1.0) }
}
