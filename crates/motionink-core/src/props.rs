//! Property values carried by scene objects, keyframes and edit commands.

use crate::color::{HexColor, lerp_hex};
use crate::geometry::{Bezier, Point};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// A single property value.
///
/// On the wire: numbers, strings, `[x, y]` pairs and flat Bézier point lists.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum PropValue {
    Number(f64),
    /// Free text; colors are `#rrggbb(aa)` strings.
    Text(String),
    Point(Point),
    Bezier(Bezier),
}

/// Property dictionary, ordered by key so serialized payloads are stable.
pub type Props = BTreeMap<String, PropValue>;

impl From<f64> for PropValue {
    fn from(v: f64) -> Self {
        PropValue::Number(v)
    }
}

impl From<&str> for PropValue {
    fn from(v: &str) -> Self {
        PropValue::Text(v.to_string())
    }
}

impl From<String> for PropValue {
    fn from(v: String) -> Self {
        PropValue::Text(v)
    }
}

impl From<Point> for PropValue {
    fn from(v: Point) -> Self {
        PropValue::Point(v)
    }
}

impl From<Bezier> for PropValue {
    fn from(v: Bezier) -> Self {
        PropValue::Bezier(v)
    }
}

impl<'de> Deserialize<'de> for PropValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        PropValue::from_json(&value).ok_or_else(|| {
            serde::de::Error::custom(format!("unsupported property value: {value}"))
        })
    }
}

fn json_point(value: &Value) -> Option<Point> {
    match value {
        Value::Array(items) if items.len() == 2 => {
            Some(Point::new(items[0].as_f64()?, items[1].as_f64()?))
        }
        Value::Object(map) => Some(Point::new(map.get("x")?.as_f64()?, map.get("y")?.as_f64()?)),
        _ => None,
    }
}

impl PropValue {
    /// Coerce raw JSON into a property value.
    ///
    /// Numeric pairs and `{x, y}` objects become points; arrays of pairs
    /// become Bézier curves. Anything else (booleans, null, nested objects)
    /// is rejected.
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => n.as_f64().map(PropValue::Number),
            Value::String(s) => Some(PropValue::Text(s.clone())),
            Value::Object(_) => json_point(value).map(PropValue::Point),
            Value::Array(items) => {
                if let Some(p) = json_point(value) {
                    return Some(PropValue::Point(p));
                }
                let points = items.iter().map(json_point).collect::<Option<Vec<_>>>()?;
                Some(PropValue::Bezier(Bezier::from_points(&points)))
            }
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            PropValue::Number(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            PropValue::Text(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_point(&self) -> Option<Point> {
        match self {
            PropValue::Point(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_bezier(&self) -> Option<&Bezier> {
        match self {
            PropValue::Bezier(v) => Some(v),
            _ => None,
        }
    }

    /// Interpolate towards `other`.
    ///
    /// Numbers and points are linear, colors per channel, curves per control
    /// point. Mismatched kinds, non-color text and curves with different
    /// segment counts keep `self`.
    pub fn lerp(&self, factor: f64, other: &PropValue) -> PropValue {
        if self == other {
            return self.clone();
        }
        match (self, other) {
            (PropValue::Number(a), PropValue::Number(b)) => {
                PropValue::Number(crate::geometry::lerp(factor, *a, *b))
            }
            (PropValue::Point(a), PropValue::Point(b)) => PropValue::Point(a.lerp(factor, *b)),
            (PropValue::Bezier(a), PropValue::Bezier(b)) => PropValue::Bezier(a.lerp(factor, b)),
            (PropValue::Text(a), PropValue::Text(b)) if a.starts_with('#') => {
                PropValue::Text(lerp_hex(factor, a, b))
            }
            _ => self.clone(),
        }
    }
}

/// Typed lookups on a property dictionary.
pub trait PropsExt {
    fn number(&self, key: &str) -> Option<f64>;
    fn text(&self, key: &str) -> Option<&str>;
    fn point(&self, key: &str) -> Option<Point>;
    fn bezier(&self, key: &str) -> Option<&Bezier>;
    fn color(&self, key: &str) -> HexColor;
    /// Copy of the entries whose keys appear in `keys`.
    fn subset<I, S>(&self, keys: I) -> Props
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>;
    /// Whether both dictionaries have the same key set.
    fn same_keys(&self, other: &Props) -> bool;
}

impl PropsExt for Props {
    fn number(&self, key: &str) -> Option<f64> {
        self.get(key).and_then(PropValue::as_number)
    }

    fn text(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(PropValue::as_text)
    }

    fn point(&self, key: &str) -> Option<Point> {
        self.get(key).and_then(PropValue::as_point)
    }

    fn bezier(&self, key: &str) -> Option<&Bezier> {
        self.get(key).and_then(PropValue::as_bezier)
    }

    fn color(&self, key: &str) -> HexColor {
        self.text(key)
            .map(HexColor::parse_or_black)
            .unwrap_or(HexColor::BLACK)
    }

    fn subset<I, S>(&self, keys: I) -> Props
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        keys.into_iter()
            .filter_map(|k| {
                self.get_key_value(k.as_ref())
                    .map(|(k, v)| (k.clone(), v.clone()))
            })
            .collect()
    }

    fn same_keys(&self, other: &Props) -> bool {
        self.len() == other.len() && self.keys().zip(other.keys()).all(|(a, b)| a == b)
    }
}

/// Build a [`Props`] from `key => value` pairs.
#[macro_export]
macro_rules! props {
    ($($key:expr => $value:expr),* $(,)?) => {{
        #[allow(unused_mut)]
        let mut props = $crate::props::Props::new();
        $(props.insert(String::from($key), $crate::props::PropValue::from($value));)*
        props
    }};
}
