//! Dimensioned config values such as `3 deg` or `1 hour`
//!
//! Only the unit is checked against a physical type; no conversion is done.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_yaml::Value;

use crate::schema::{Rule, describe};

/// Physical type a quantity must have.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhysicalType {
    Angle,
    Time,
}

impl PhysicalType {
    pub fn units(&self) -> &'static [&'static str] {
        match self {
            Self::Angle => &["deg", "arcmin", "arcsec", "mas", "rad", "mrad"],
            Self::Time => &["s", "ms", "min", "h", "hour", "d", "day"],
        }
    }

    pub fn accepts(&self, unit: &str) -> bool {
        self.units().contains(&unit)
    }
}

impl fmt::Display for PhysicalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Angle => write!(f, "angle"),
            Self::Time => write!(f, "time"),
        }
    }
}

/// A number with a unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Quantity {
    pub value: f64,
    pub unit: String,
}

impl Quantity {
    pub fn new(value: f64, unit: impl Into<String>) -> Self {
        Self {
            value,
            unit: unit.into(),
        }
    }

    pub fn physical_type(&self) -> Option<PhysicalType> {
        [PhysicalType::Angle, PhysicalType::Time]
            .into_iter()
            .find(|pt| pt.accepts(&self.unit))
    }
}

impl FromStr for Quantity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (number, unit) = match s.split_once(char::is_whitespace) {
            Some((number, unit)) => (number, unit.trim()),
            None => {
                let idx = s
                    .find(|c: char| c.is_ascii_alphabetic() && c != 'e' && c != 'E')
                    .unwrap_or(s.len());
                s.split_at(idx)
            }
        };
        if unit.is_empty() {
            return Err(format!("'{s}' has no unit"));
        }
        let value = number
            .parse::<f64>()
            .map_err(|_| format!("'{s}' does not start with a number"))?;
        Ok(Self::new(value, unit))
    }
}

impl TryFrom<String> for Quantity {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<Quantity> for String {
    fn from(q: Quantity) -> Self {
        q.to_string()
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.value, self.unit)
    }
}

/// Rule accepting `"<number> <unit>"` strings of physical type `pt`.
///
/// Accepted values are rewritten in canonical form.
pub fn quantity_rule(pt: PhysicalType) -> Rule {
    Rule::transform(move |value, _| {
        let Value::String(s) = &value else {
            return Err(format!("expected a {pt} quantity, got {}", describe(&value)));
        };
        let quantity: Quantity = s.parse()?;
        if !pt.accepts(&quantity.unit) {
            return Err(format!(
                "unit '{}' is not a {pt} unit (one of {})",
                quantity.unit,
                pt.units().join(", ")
            ));
        }
        Ok(Value::from(quantity.to_string()))
    })
}
