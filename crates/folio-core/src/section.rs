//! Page sections and navigation candidates

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::borrow::Borrow;
use std::fmt;

/// Identifier of a page section, also used as its URL fragment
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SectionId(String);

impl SectionId {
    /// Id of the always-present landing section
    pub const HERO: &'static str = "hero";

    /// Create a section id
    #[inline]
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Parse a raw URL fragment (`"#projects"`, `"projects"`)
    ///
    /// A single leading `#` is dropped and whitespace trimmed. Empty
    /// fragments yield `None`.
    #[must_use]
    pub fn from_fragment(raw: &str) -> Option<Self> {
        let id = raw.strip_prefix('#').unwrap_or(raw).trim();
        (!id.is_empty()).then(|| Self::new(id))
    }

    /// The landing section
    #[inline]
    #[must_use]
    pub fn hero() -> Self {
        Self::new(Self::HERO)
    }

    /// Borrow as `&str`
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Fragment form, `"#id"`
    #[inline]
    #[must_use]
    pub fn fragment(&self) -> String {
        format!("#{}", self.0)
    }
}

impl fmt::Display for SectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SectionId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for SectionId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl AsRef<str> for SectionId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for SectionId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// A section that may appear in the navigation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavCandidate {
    /// Section id
    pub id: SectionId,
    /// Navigation label
    pub label: String,
    /// Whether the section is rendered
    pub enabled: bool,
}

impl NavCandidate {
    /// Enabled candidate
    #[inline]
    #[must_use]
    pub fn new(id: impl Into<SectionId>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            enabled: true,
        }
    }

    /// Set enabled flag
    #[inline]
    #[must_use]
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }
}

/// Loose truthiness of a JSON value
fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0 && !n.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn section_enabled(payload: &Value, key: &str) -> bool {
    payload
        .get(key)
        .and_then(|section| section.get("enabled"))
        .is_some_and(truthy)
}

/// Navigation candidates derived from the content payload
///
/// Hero, projects and contact are always enabled; the rest follow the
/// `enabled` flag of their payload section. Order is page order.
#[must_use]
pub fn nav_candidates(payload: &Value) -> Vec<NavCandidate> {
    vec![
        NavCandidate::new(SectionId::HERO, "Home"),
        NavCandidate::new("about", "About").with_enabled(section_enabled(payload, "about")),
        NavCandidate::new("resume", "Resume").with_enabled(section_enabled(payload, "resume")),
        NavCandidate::new("tech", "Tech").with_enabled(section_enabled(payload, "techStack")),
        NavCandidate::new("projects", "Projects"),
        NavCandidate::new("portfolio", "Portfolio")
            .with_enabled(section_enabled(payload, "portfolio")),
        NavCandidate::new("contact", "Contact"),
    ]
}
