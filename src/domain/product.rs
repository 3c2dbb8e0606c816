//! Product identifiers and product details.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Opaque product identifier, used verbatim as lookup and cache key.
///
/// Equality and hashing are exact and case-sensitive; no normalization is
/// applied. Never empty. Decodes from a JSON string or integer; integers
/// keep their decimal rendering.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "RawProductId", into = "String")]
pub struct ProductId(String);

#[derive(Deserialize)]
#[serde(untagged)]
enum RawProductId {
    Text(String),
    Signed(i64),
    Unsigned(u64),
}

/// Rejected product identifier.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidProductId {
    #[error("product id must not be empty")]
    Empty,

    #[error("product id '{0}' is not an integer")]
    NotNumeric(String),
}

impl ProductId {
    /// Wrap a raw token. Only the empty string is rejected.
    pub fn new(raw: impl Into<String>) -> Result<Self, InvalidProductId> {
        let raw = raw.into();
        if raw.is_empty() {
            return Err(InvalidProductId::Empty);
        }
        Ok(Self(raw))
    }

    /// Inbound validation rule: the token must parse as a 32-bit integer.
    /// The original token is kept as the id, not its parsed value.
    pub fn parse_numeric(raw: &str) -> Result<Self, InvalidProductId> {
        if raw.is_empty() {
            return Err(InvalidProductId::Empty);
        }
        raw.parse::<i32>()
            .map_err(|_| InvalidProductId::NotNumeric(raw.to_string()))?;
        Ok(Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for ProductId {
    type Error = InvalidProductId;

    fn try_from(raw: String) -> Result<Self, Self::Error> {
        Self::new(raw)
    }
}

impl TryFrom<RawProductId> for ProductId {
    type Error = InvalidProductId;

    fn try_from(raw: RawProductId) -> Result<Self, Self::Error> {
        match raw {
            RawProductId::Text(text) => Self::new(text),
            RawProductId::Signed(n) => Self::new(n.to_string()),
            RawProductId::Unsigned(n) => Self::new(n.to_string()),
        }
    }
}

impl From<ProductId> for String {
    fn from(id: ProductId) -> Self {
        id.0
    }
}

impl AsRef<str> for ProductId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// A product as described by the upstream catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductDetail {
    pub id: ProductId,
    pub name: String,
    /// Absent price is a valid catalog state; negative prices are not.
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default)]
    pub availability: bool,
}

impl ProductDetail {
    pub fn new(id: ProductId, name: impl Into<String>, price: Option<f64>, availability: bool) -> Self {
        Self {
            id,
            name: name.into(),
            price,
            availability,
        }
    }

    /// False when the catalog reports a negative price.
    pub fn has_valid_price(&self) -> bool {
        self.price.map_or(true, |price| price >= 0.0)
    }
}

/// Similar products of one product, in upstream order, failed lookups dropped.
pub type AggregatedResult = Vec<ProductDetail>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_id_rejected() {
        assert_eq!(ProductId::new(""), Err(InvalidProductId::Empty));
        assert!(ProductId::new("abc").is_ok());
    }

    #[test]
    fn test_numeric_validation_matches_integer_parsing() {
        assert!(ProductId::parse_numeric("123").is_ok());
        assert!(ProductId::parse_numeric("-7").is_ok());
        assert!(ProductId::parse_numeric("+7").is_ok());
        assert_eq!(ProductId::parse_numeric("+7").unwrap().as_str(), "+7");

        for bad in ["abc", "1.5", " 1", "2147483648", ""] {
            assert!(ProductId::parse_numeric(bad).is_err(), "{bad:?} should be rejected");
        }
    }

    #[test]
    fn test_ids_are_case_sensitive() {
        assert_ne!(ProductId::new("A").unwrap(), ProductId::new("a").unwrap());
    }

    #[test]
    fn test_detail_deserializes_upstream_payload() {
        let detail: ProductDetail = serde_json::from_str(
            r#"{"id":"1","name":"Shirt","price":9.99,"availability":true}"#,
        )
        .unwrap();
        assert_eq!(detail.id.as_str(), "1");
        assert_eq!(detail.price, Some(9.99));
        assert!(detail.availability);

        let no_price: ProductDetail =
            serde_json::from_str(r#"{"id":"2","name":"Dress","price":null,"availability":false}"#).unwrap();
        assert_eq!(no_price.price, None);
    }

    #[test]
    fn test_integer_ids_keep_decimal_rendering() {
        let ids: Vec<ProductId> = serde_json::from_str("[2,-3,18446744073709551615]").unwrap();
        let raw: Vec<&str> = ids.iter().map(ProductId::as_str).collect();
        assert_eq!(raw, vec!["2", "-3", "18446744073709551615"]);

        let detail: ProductDetail =
            serde_json::from_str(r#"{"id":1,"name":"Shirt","price":9.99,"availability":true}"#).unwrap();
        assert_eq!(detail.id.as_str(), "1");
        assert_eq!(serde_json::to_string(&detail.id).unwrap(), r#""1""#);
    }

    #[test]
    fn test_non_scalar_id_is_rejected() {
        assert!(serde_json::from_str::<ProductId>("1.5").is_err());
        assert!(serde_json::from_str::<ProductId>("true").is_err());
        assert!(serde_json::from_str::<ProductId>(r#"{"id":"1"}"#).is_err());
    }

    #[test]
    fn test_negative_price_is_invalid() {
        let id = ProductId::new("1").unwrap();
        assert!(ProductDetail::new(id.clone(), "a", Some(0.0), true).has_valid_price());
        assert!(ProductDetail::new(id.clone(), "a", None, true).has_valid_price());
        assert!(!ProductDetail::new(id, "a", Some(-0.01), true).has_valid_price());
    }

    #[test]
    fn test_detail_with_empty_id_is_rejected() {
        let res: Result<ProductDetail, _> =
            serde_json::from_str(r#"{"id":"","name":"x","price":1.0,"availability":true}"#);
        assert!(res.is_err());
    }
}
