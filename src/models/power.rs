// Capacity in bytes. Network totals overflow u64, so values are arbitrary precision and
// travel as decimal strings (JSON and SQLite TEXT).

use num_bigint::BigUint;
use num_traits::{ToPrimitive, Zero};
use serde::de::value::MapAccessDeserializer;
use serde::de::{self, MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// 1 PiB = 1024^5 bytes.
pub const PIB_BYTES: u64 = 1 << 50;

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Power(BigUint);

impl Power {
    pub fn zero() -> Self {
        Power(BigUint::zero())
    }

    /// `count` whole PiB.
    pub fn from_pib(count: u64) -> Self {
        Power(BigUint::from(count) * BigUint::from(PIB_BYTES))
    }

    /// Value in PiB as a double. Scaling by a power of two keeps this a single rounding.
    pub fn to_pib(&self) -> f64 {
        self.0.to_f64().unwrap_or(f64::INFINITY) / PIB_BYTES as f64
    }
}

impl From<u64> for Power {
    fn from(bytes: u64) -> Self {
        Power(BigUint::from(bytes))
    }
}

impl From<u128> for Power {
    fn from(bytes: u128) -> Self {
        Power(BigUint::from(bytes))
    }
}

impl From<BigUint> for Power {
    fn from(bytes: BigUint) -> Self {
        Power(bytes)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid power value {0:?}: expected a decimal unsigned integer")]
pub struct ParsePowerError(String);

impl FromStr for Power {
    type Err = ParsePowerError;

    /// Digits only: no sign, separators or surrounding whitespace.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(ParsePowerError(s.to_string()));
        }
        BigUint::from_str(s)
            .map(Power)
            .map_err(|_| ParsePowerError(s.to_string()))
    }
}

impl fmt::Display for Power {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Serialize for Power {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&self.0)
    }
}

struct PowerVisitor;

impl<'de> Visitor<'de> for PowerVisitor {
    type Value = Power;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a non-negative integer or decimal string")
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Power, E> {
        Ok(Power::from(v))
    }

    fn visit_u128<E: de::Error>(self, v: u128) -> Result<Power, E> {
        Ok(Power::from(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Power, E> {
        u64::try_from(v)
            .map(Power::from)
            .map_err(|_| E::invalid_value(de::Unexpected::Signed(v), &self))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Power, E> {
        Power::from_str(v).map_err(E::custom)
    }

    /// serde_json hands integer literals wider than 64 bits over as an exact `Number`.
    fn visit_map<A: MapAccess<'de>>(self, map: A) -> Result<Power, A::Error> {
        let number = serde_json::Number::deserialize(MapAccessDeserializer::new(map))?;
        Power::from_str(&number.to_string()).map_err(de::Error::custom)
    }
}

impl<'de> Deserialize<'de> for Power {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(PowerVisitor)
    }
}
