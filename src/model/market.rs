//! Market price records.

use serde::{Deserialize, Serialize};

/// One row from the market-price provider.
///
/// Field names follow the provider's capitalized keys.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketRecord {
    #[serde(rename = "Commodity")]
    pub commodity: String,

    #[serde(rename = "Market")]
    pub market: String,

    #[serde(rename = "State")]
    pub state: String,

    #[serde(rename = "Variety", default)]
    pub variety: String,

    /// Modal price in rupees per quintal, as the provider formats it.
    #[serde(rename = "Modal_Price", deserialize_with = "price_as_string")]
    pub modal_price: String,
}

/// The provider sends prices as strings on some resources and numbers on others.
fn price_as_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::String(s) => s,
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_provider_keys() {
        let json = r#"{"Commodity":"Tomato","Market":"Koyambedu","State":"Tamil Nadu","Variety":"Hybrid","Modal_Price":"1800"}"#;
        let record: MarketRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.commodity, "Tomato");
        assert_eq!(record.modal_price, "1800");
    }

    #[test]
    fn numeric_price_is_accepted() {
        let json = r#"{"Commodity":"Onion","Market":"Madurai","State":"Tamil Nadu","Modal_Price":2250}"#;
        let record: MarketRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.modal_price, "2250");
        assert_eq!(record.variety, "");
    }
}
