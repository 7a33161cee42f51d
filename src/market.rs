//! Commodity prices from the public market-price provider.

use std::collections::BTreeMap;

use reqwest::blocking::Client;
use serde::Deserialize;

use crate::http::{self, TransportError};
use crate::model::MarketRecord;

/// A filtered page of market records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarketQuery {
    /// Provider column name to required value, e.g. `State` → `Tamil Nadu`.
    pub filters: BTreeMap<String, String>,
    pub limit: u32,
    pub offset: u32,
}

impl MarketQuery {
    /// The first `limit` records for one state.
    pub fn for_state(state: &str, limit: u32) -> Self {
        let mut filters = BTreeMap::new();
        if !state.trim().is_empty() {
            filters.insert("State".to_string(), state.to_string());
        }
        Self {
            filters,
            limit,
            offset: 0,
        }
    }

    /// Request parameters in provider form, minus the key.
    fn params(&self) -> Vec<(String, String)> {
        let mut params = vec![
            ("format".to_string(), "json".to_string()),
            ("limit".to_string(), self.limit.to_string()),
            ("offset".to_string(), self.offset.to_string()),
        ];
        params.extend(
            self.filters
                .iter()
                .map(|(k, v)| (format!("filters[{k}]"), v.clone())),
        );
        params
    }
}

/// A source of market prices.
pub trait MarketPrices {
    fn fetch(&self, query: &MarketQuery) -> Result<Vec<MarketRecord>, TransportError>;
}

#[derive(Deserialize)]
struct RecordsPage {
    #[serde(default)]
    records: Vec<MarketRecord>,
}

/// data.gov.in resource client.
pub struct DataGovMarket {
    client: Client,
    base_url: String,
    api_key: String,
}

impl DataGovMarket {
    pub fn new(client: Client, base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            api_key: api_key.into(),
        }
    }
}

impl MarketPrices for DataGovMarket {
    fn fetch(&self, query: &MarketQuery) -> Result<Vec<MarketRecord>, TransportError> {
        let request = self
            .client
            .get(&self.base_url)
            .query(&[("api-key", &self.api_key)])
            .query(&query.params());
        let page: RecordsPage = http::send_json(request)?;
        tracing::debug!(records = page.records.len(), "market prices loaded");
        Ok(page.records)
    }
}

/// Fetch records for display; any failure is logged and yields an empty list.
pub fn load_or_empty(prices: &dyn MarketPrices, query: &MarketQuery) -> Vec<MarketRecord> {
    match prices.fetch(query) {
        Ok(records) => records,
        Err(e) => {
            tracing::warn!(error = %e, "failed to load market prices");
            Vec::new()
        }
    }
}

/// One display line per record.
pub fn render(records: &[MarketRecord]) -> Vec<String> {
    if records.is_empty() {
        return vec!["No market data available.".to_string()];
    }
    records
        .iter()
        .map(|r| {
            let variety = if r.variety.is_empty() {
                String::new()
            } else {
                format!(" ({})", r.variety)
            };
            format!(
                "{}{variety} at {}, {}: ₹{}/quintal",
                r.commodity, r.market, r.state, r.modal_price
            )
        })
        .collect()
}


#[cfg(test)]
mod tests {
    use super::testing::{FakeMarket, record};
    use super::*;

    #[test]
    fn params_bracket_each_filter() {
        let mut query = MarketQuery::for_state("Tamil Nadu", 5);
        query
            .filters
            .insert("Commodity".to_string(), "Tomato".to_string());
        let params = query.params();
        assert!(params.contains(&("limit".to_string(), "5".to_string())));
        assert!(params.contains(&("offset".to_string(), "0".to_string())));
        assert!(params.contains(&("format".to_string(), "json".to_string())));
        assert!(params.contains(&("filters[State]".to_string(), "Tamil Nadu".to_string())));
        assert!(params.contains(&("filters[Commodity]".to_string(), "Tomato".to_string())));
    }

    #[test]
    fn blank_state_means_no_filter() {
        assert!(MarketQuery::for_state(" ", 5).filters.is_empty());
    }

    #[test]
    fn records_page_tolerates_missing_records() {
        let page: RecordsPage = serde_json::from_str(r#"{"total":0}"#).unwrap();
        assert!(page.records.is_empty());
    }

    #[test]
    fn failure_yields_empty_list() {
        let market = FakeMarket::failing();
        let records = load_or_empty(&market, &MarketQuery::for_state("Kerala", 3));
        assert!(records.is_empty());
        assert_eq!(market.queries.borrow()[0].limit, 3);
        assert_eq!(render(&records), vec!["No market data available."]);
    }

    #[test]
    fn fetch_sends_key_and_encoded_filters() {
        let server = crate::http::testing::OneShotServer::start(
            200,
            r#"{"records":[{"Commodity":"Tomato","Market":"Salem","State":"Tamil Nadu","Variety":"Local","Modal_Price":"1800"}]}"#,
        );
        let client = crate::http::build_client(2000).unwrap();
        let market = DataGovMarket::new(client, &server.url, "KEY");

        let records = market.fetch(&MarketQuery::for_state("Tamil Nadu", 5)).unwrap();
        assert_eq!(records[0].market, "Salem");

        let request = String::from_utf8_lossy(&server.request()).into_owned();
        let line = request.lines().next().unwrap();
        assert!(line.contains("api-key=KEY"), "{line}");
        assert!(line.contains("filters%5BState%5D=Tamil+Nadu"), "{line}");
        assert!(line.contains("format=json"), "{line}");
    }

    #[test]
    fn renders_price_per_quintal() {
        let mut onion = record("Onion", "2250");
        onion.variety = "Bellary".to_string();
        assert_eq!(
            render(&[onion]),
            vec!["Onion (Bellary) at Koyambedu, Tamil Nadu: ₹2250/quintal"]
        );
    }
}
