use std::collections::BTreeMap;

use serde::de::Error as DeError;
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::detail::AssetDetail;
use crate::directory::AssetRecord;
use crate::error::{UpstreamError, ValidationError};
use crate::query::Query;

/// Inbound client message: `{action, symbol, page, pagination}`.
///
/// Clients send the paging fields as either JSON numbers or numeric
/// strings; both decode identically.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ClientMessage {
    #[serde(default)]
    pub action: String,
    #[serde(default)]
    pub symbol: String,
    #[serde(default)]
    pub page: Option<NumericField>,
    #[serde(default)]
    pub pagination: Option<NumericField>,
}

impl ClientMessage {
    pub fn into_query(self) -> Query {
        Query {
            raw_text: self.symbol,
            page: self.page.map(i64::from),
            page_size: self.pagination.map(i64::from),
        }
    }
}

/// Integer field tolerating both `2` and `"2"` on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NumericField(pub i64);

impl From<NumericField> for i64 {
    fn from(value: NumericField) -> Self {
        value.0
    }
}

impl<'de> Deserialize<'de> for NumericField {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Number(i64),
            Text(String),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Number(value) => Ok(Self(value)),
            Raw::Text(text) => text
                .trim()
                .parse::<i64>()
                .map(Self)
                .map_err(|_| D::Error::custom(format!("invalid numeric field: '{text}'"))),
        }
    }
}

/// Combined detail response: metadata entries keyed by symbol plus the
/// paged statistics records keyed by their zero-based index, all under one
/// `"Data"` map.
#[derive(Debug, Clone, PartialEq)]
pub struct DetailPayload {
    pub metadata: BTreeMap<String, AssetDetail>,
    pub stats: Vec<AssetDetail>,
}

impl Serialize for DetailPayload {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut data: BTreeMap<String, &AssetDetail> = BTreeMap::new();
        for (symbol, detail) in &self.metadata {
            data.insert(symbol.clone(), detail);
        }
        for (index, detail) in self.stats.iter().enumerate() {
            data.insert(index.to_string(), detail);
        }

        let mut outer = serializer.serialize_map(Some(1))?;
        outer.serialize_entry("Data", &data)?;
        outer.end()
    }
}

/// Outbound response union.
///
/// Serializes to the suggestion envelope `{"symbols": [...]}`, the keyed
/// detail mapping `{"Data": {...}}`, or `{"error": "..."}`. Validation and
/// upstream failures stay typed internally but share the error envelope on
/// the wire.
#[derive(Debug, Clone, PartialEq)]
pub enum Response {
    Suggestions { symbols: Vec<AssetRecord> },
    Detail(DetailPayload),
    Validation(ValidationError),
    Upstream(UpstreamError),
    /// Session-level failures (undecodable message, dropped reply).
    Error { error: String },
}

impl Response {
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            error: message.into(),
        }
    }
}

impl Serialize for Response {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Self::Suggestions { symbols } => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry("symbols", symbols)?;
                map.end()
            }
            Self::Detail(payload) => payload.serialize(serializer),
            Self::Validation(error) => serialize_error(serializer, &error.to_string()),
            Self::Upstream(error) => serialize_error(serializer, &error.to_string()),
            Self::Error { error } => serialize_error(serializer, error),
        }
    }
}

fn serialize_error<S>(serializer: S, message: &str) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    let mut map = serializer.serialize_map(Some(1))?;
    map.serialize_entry("error", message)?;
    map.end()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_paging_fields_accept_numbers_and_strings() {
        let from_numbers: ClientMessage =
            serde_json::from_str(r#"{"action":"lookup","symbol":"BTC","page":2,"pagination":20}"#)
                .expect("numbers must decode");
        let from_strings: ClientMessage = serde_json::from_str(
            r#"{"action":"lookup","symbol":"BTC","page":"2","pagination":"20"}"#,
        )
        .expect("numeric strings must decode");

        assert_eq!(from_numbers.page, Some(NumericField(2)));
        assert_eq!(from_numbers.page, from_strings.page);
        assert_eq!(from_numbers.pagination, from_strings.pagination);
    }

    #[test]
    fn non_numeric_paging_field_is_a_decode_error() {
        let result: Result<ClientMessage, _> =
            serde_json::from_str(r#"{"symbol":"BTC","page":"two"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn paging_fields_may_be_omitted() {
        let message: ClientMessage =
            serde_json::from_str(r#"{"symbol":"BT"}"#).expect("must decode");
        let query = message.into_query();

        assert_eq!(query.raw_text, "BT");
        assert_eq!(query.page, None);
        assert_eq!(query.page_size, None);
    }

    #[test]
    fn suggestions_serialize_to_the_symbols_envelope() {
        let response = Response::Suggestions {
            symbols: vec![AssetRecord::new("ETH", "Ethereum")],
        };

        let json = serde_json::to_value(&response).expect("must serialize");
        assert_eq!(
            json,
            serde_json::json!({"symbols": [{"symbol": "ETH", "name": "Ethereum"}]})
        );
    }

    #[test]
    fn errors_serialize_to_the_error_envelope() {
        let json = serde_json::to_value(Response::error("boom")).expect("must serialize");
        assert_eq!(json, serde_json::json!({"error": "boom"}));
    }

    #[test]
    fn typed_failures_share_the_error_envelope() {
        let validation = Response::Validation(ValidationError::PageTooSmall { got: 0 });
        let upstream = Response::Upstream(UpstreamError::Status { status: 503 });

        assert_eq!(
            serde_json::to_value(validation).expect("must serialize"),
            serde_json::json!({"error": "page must be at least 1: got 0"})
        );
        assert_eq!(
            serde_json::to_value(upstream).expect("must serialize"),
            serde_json::json!({"error": "upstream returned status 503"})
        );
    }

    #[test]
    fn detail_payload_merges_metadata_and_indexed_stats_under_data() {
        let detail = AssetDetail {
            symbol: Some(String::from("BTC")),
            name: String::from("Bitcoin"),
            asset_type: String::from("BLOCKCHAIN"),
            price_usd: 50_000.0,
            created_on: 0,
            created_on_formatted: Some(String::from("1970-01-01T00:00:00Z")),
            launch_date: 0,
            launch_date_formatted: Some(String::from("1970-01-01T00:00:00Z")),
            price_last_updated: 0,
            price_last_updated_formatted: Some(String::from("1970-01-01T00:00:00Z")),
            description: String::new(),
        };

        let payload = DetailPayload {
            metadata: BTreeMap::from([(String::from("BTC"), detail.clone())]),
            stats: vec![detail],
        };

        let json = serde_json::to_value(Response::Detail(payload)).expect("must serialize");
        let data = json
            .get("Data")
            .and_then(|value| value.as_object())
            .expect("detail must nest under Data");

        assert!(data.contains_key("BTC"));
        assert!(data.contains_key("0"));
        assert_eq!(data["0"]["NAME"], "Bitcoin");
    }
}
