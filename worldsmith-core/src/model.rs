//! World-model domain types.
//!
//! Plain value types for concepts, relations, and placed instances. Raw wire
//! records from `worldsmith-client` are converted into these exactly once, at
//! registry load time; nothing downstream ever handles undecoded data.

use std::fmt;

use serde::{Deserialize, Serialize};
use worldsmith_client::{ConceptRecord, InstanceRecord, PropertyRecord, RelationRecord, RuleRecord};

// ============================================================================
// ID types
// ============================================================================

/// Unique identifier for concepts (server-assigned).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ConceptId(pub i64);

impl fmt::Display for ConceptId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for placed instances (server-assigned, used as the
/// storage key everywhere).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct InstanceId(pub i64);

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Display attributes
// ============================================================================

/// An opaque sRGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    /// Fallback fill for concepts without a declared color.
    pub const DEFAULT_FILL: Color = Color::rgb(0xaa, 0xaa, 0xaa);

    /// Default map background.
    pub const BACKGROUND: Color = Color::rgb(0xcc, 0xcc, 0xcc);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse a `#rrggbb` string. Anything unparseable yields the default
    /// fill rather than an error.
    pub fn parse_or_default(s: &str) -> Self {
        Self::parse(s).unwrap_or(Self::DEFAULT_FILL)
    }

    fn parse(s: &str) -> Option<Self> {
        let hex = s.strip_prefix('#')?;
        if hex.len() != 6 {
            return None;
        }
        let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
        let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
        let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
        Some(Self { r, g, b })
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

/// How a concept is drawn: fill color and stacking order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisplayAttrs {
    pub color: Color,
    pub z_index: i32,
}

impl Default for DisplayAttrs {
    fn default() -> Self {
        Self {
            color: Color::DEFAULT_FILL,
            z_index: 0,
        }
    }
}

// ============================================================================
// Concepts and relations
// ============================================================================

/// A typed property slot declared on a concept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Property {
    pub label: String,
    pub kind: Option<String>,
}

impl From<PropertyRecord> for Property {
    fn from(record: PropertyRecord) -> Self {
        Self {
            label: record.label,
            kind: record.kind,
        }
    }
}

/// A property-default override declared on a concept.
#[derive(Debug, Clone, PartialEq)]
pub struct Rule {
    pub property: String,
    pub value: serde_json::Value,
}

impl From<RuleRecord> for Rule {
    fn from(record: RuleRecord) -> Self {
        Self {
            property: record.property,
            value: record.value,
        }
    }
}

/// A directed edge template from its owning concept to `target`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relation {
    pub label: String,
    pub target: ConceptId,
}

impl From<RelationRecord> for Relation {
    fn from(record: RelationRecord) -> Self {
        Self {
            label: record.label,
            target: ConceptId(record.concept_id),
        }
    }
}

/// A node type in the world graph.
///
/// `relations` is either wholly unpopulated (`None`, nothing fetched yet) or
/// wholly populated for this concept; there is no partial state.
#[derive(Debug, Clone)]
pub struct Concept {
    pub id: ConceptId,
    pub label: String,
    pub properties: Vec<Property>,
    pub rules: Vec<Rule>,
    pub display: DisplayAttrs,
    pub relations: Option<Vec<Relation>>,
}

impl Concept {
    /// Whether relations have been materialized for this concept.
    pub fn relations_loaded(&self) -> bool {
        self.relations.is_some()
    }
}

impl From<ConceptRecord> for Concept {
    fn from(record: ConceptRecord) -> Self {
        let color = record
            .display
            .color
            .as_deref()
            .map(Color::parse_or_default)
            .unwrap_or(Color::DEFAULT_FILL);

        Self {
            id: ConceptId(record.id),
            label: record.label,
            properties: record.properties.into_iter().map(Property::from).collect(),
            rules: record.rules.into_iter().map(Rule::from).collect(),
            display: DisplayAttrs {
                color,
                z_index: record.display.zindex,
            },
            relations: None,
        }
    }
}

// ============================================================================
// Instances
// ============================================================================

/// Integer grid coordinates, always within the map bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Coordinates {
    pub x: u32,
    pub y: u32,
}

impl fmt::Display for Coordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// A placed occurrence of a concept on the map grid.
#[derive(Debug, Clone)]
pub struct Instance {
    pub id: InstanceId,
    pub label: String,
    pub coordinates: Coordinates,
    pub concept: ConceptId,
    pub properties: Vec<serde_json::Value>,
}

impl Instance {
    /// Decode a wire record, enforcing `0 <= x < width`, `0 <= y < height`.
    /// Out-of-bounds records are rejected rather than stored.
    pub fn decode(record: InstanceRecord, width: u32, height: u32) -> Result<Self, DecodeError> {
        let (x, y) = (record.coordinates.x, record.coordinates.y);
        if x < 0 || y < 0 || x >= i64::from(width) || y >= i64::from(height) {
            return Err(DecodeError::OutOfBounds {
                id: InstanceId(record.id),
                x,
                y,
            });
        }

        Ok(Self {
            id: InstanceId(record.id),
            label: record.label,
            coordinates: Coordinates {
                x: x as u32,
                y: y as u32,
            },
            concept: ConceptId(record.concept),
            properties: record.properties,
        })
    }
}

/// Failure to decode a wire record into a domain value.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    #[error("instance {id} at ({x}, {y}) is outside the map bounds")]
    OutOfBounds { id: InstanceId, x: i64, y: i64 },
}

#[cfg(test)]
mod tests {
    use super::*;
    use worldsmith_client::CoordinatesRecord;

    fn record(id: i64, x: i64, y: i64) -> InstanceRecord {
        InstanceRecord {
            id,
            label: format!("instance-{id}"),
            coordinates: CoordinatesRecord { x, y },
            concept: 1,
            properties: Vec::new(),
        }
    }

    #[test]
    fn test_color_parsing() {
        assert_eq!(Color::parse_or_default("#00aaff"), Color::rgb(0, 0xaa, 0xff));
        assert_eq!(Color::parse_or_default("#zzzzzz"), Color::DEFAULT_FILL);
        assert_eq!(Color::parse_or_default("blue"), Color::DEFAULT_FILL);
        assert_eq!(Color::rgb(0, 0xaa, 0xff).to_string(), "#00aaff");
    }

    #[test]
    fn test_concept_from_record_defaults_color() {
        let concept: Concept = worldsmith_client::ConceptRecord {
            id: 3,
            label: "Tree".to_string(),
            properties: Vec::new(),
            display: Default::default(),
            rules: Vec::new(),
        }
        .into();

        assert_eq!(concept.id, ConceptId(3));
        assert_eq!(concept.display.color, Color::DEFAULT_FILL);
        assert!(!concept.relations_loaded());
    }

    #[test]
    fn test_instance_decode_bounds() {
        assert!(Instance::decode(record(1, 0, 0), 3, 2).is_ok());
        assert!(Instance::decode(record(2, 2, 1), 3, 2).is_ok());
        assert!(Instance::decode(record(3, 3, 1), 3, 2).is_err());
        assert!(Instance::decode(record(4, 0, 2), 3, 2).is_err());
        assert!(Instance::decode(record(5, -1, 0), 3, 2).is_err());
    }
}
