use serde::{Deserialize, Serialize};
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

use crate::error::UpstreamError;
use crate::upstream::CoinDeskClient;
use crate::wire::DetailPayload;

/// One asset's metadata/statistics record, carrying the upstream's field
/// names plus RFC3339-rendered companions for the epoch-second timestamps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetDetail {
    #[serde(rename = "SYMBOL", default, skip_serializing_if = "Option::is_none")]
    pub symbol: Option<String>,
    #[serde(rename = "NAME", default)]
    pub name: String,
    #[serde(rename = "ASSET_TYPE", default)]
    pub asset_type: String,
    #[serde(rename = "PRICE_USD", default)]
    pub price_usd: f64,
    #[serde(rename = "CREATED_ON", default)]
    pub created_on: i64,
    #[serde(
        rename = "CREATED_ON_FORMATTED",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub created_on_formatted: Option<String>,
    #[serde(rename = "LAUNCH_DATE", default)]
    pub launch_date: i64,
    #[serde(
        rename = "LAUNCH_DATE_FORMATTED",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub launch_date_formatted: Option<String>,
    #[serde(rename = "PRICE_USD_LAST_UPDATE_TS", default)]
    pub price_last_updated: i64,
    #[serde(
        rename = "PRICE_USD_LAST_FORMATTED",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub price_last_updated_formatted: Option<String>,
    #[serde(rename = "ASSET_DESCRIPTION", default)]
    pub description: String,
}

/// Render an epoch-second timestamp as RFC3339 (date + time + UTC offset).
///
/// Zero and negative epochs render to pre-epoch calendar times; values the
/// calendar cannot represent fall back to the raw integer.
pub fn format_epoch(epoch: i64) -> String {
    OffsetDateTime::from_unix_timestamp(epoch)
        .ok()
        .and_then(|moment| moment.format(&Rfc3339).ok())
        .unwrap_or_else(|| epoch.to_string())
}

fn render_timestamps(detail: &mut AssetDetail) {
    detail.created_on_formatted = Some(format_epoch(detail.created_on));
    detail.launch_date_formatted = Some(format_epoch(detail.launch_date));
    detail.price_last_updated_formatted = Some(format_epoch(detail.price_last_updated));
}

/// Assembles the combined detail response for a resolved symbol.
#[derive(Clone)]
pub struct DetailFetcher {
    client: CoinDeskClient,
}

impl DetailFetcher {
    pub fn new(client: CoinDeskClient) -> Self {
        Self { client }
    }

    /// Fetch metadata plus paged top-list statistics for one symbol.
    ///
    /// Both upstream calls must succeed; if either fails the whole
    /// operation fails with that call's error and no partial detail is
    /// returned.
    pub async fn fetch_detail(
        &self,
        symbol: &str,
        page: i64,
        page_size: i64,
    ) -> Result<DetailPayload, UpstreamError> {
        let metadata = self.client.asset_metadata(symbol).await?;
        let stats = self.client.top_list(page, page_size).await?;

        let mut metadata = metadata.data;
        for detail in metadata.values_mut() {
            render_timestamps(detail);
        }

        let mut stats = stats.data.list;
        for detail in &mut stats {
            render_timestamps(detail);
        }

        Ok(DetailPayload { metadata, stats })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_the_unix_epoch() {
        assert_eq!(format_epoch(0), "1970-01-01T00:00:00Z");
    }

    #[test]
    fn formats_negative_epochs_as_pre_epoch_times() {
        assert_eq!(format_epoch(-1), "1969-12-31T23:59:59Z");
    }

    #[test]
    fn formats_recent_epochs() {
        assert_eq!(format_epoch(1_700_000_000), "2023-11-14T22:13:20Z");
    }

    #[test]
    fn unrepresentable_epochs_fall_back_to_the_raw_value() {
        assert_eq!(format_epoch(i64::MAX), i64::MAX.to_string());
    }

    #[test]
    fn render_fills_all_three_formatted_fields() {
        let mut detail = AssetDetail {
            symbol: Some(String::from("BTC")),
            name: String::from("Bitcoin"),
            asset_type: String::from("BLOCKCHAIN"),
            price_usd: 50_000.0,
            created_on: 0,
            created_on_formatted: None,
            launch_date: 1_231_006_505,
            launch_date_formatted: None,
            price_last_updated: 1_700_000_000,
            price_last_updated_formatted: None,
            description: String::new(),
        };

        render_timestamps(&mut detail);

        assert_eq!(
            detail.created_on_formatted.as_deref(),
            Some("1970-01-01T00:00:00Z")
        );
        assert_eq!(
            detail.launch_date_formatted.as_deref(),
            Some("2009-01-03T18:15:05Z")
        );
        assert_eq!(
            detail.price_last_updated_formatted.as_deref(),
            Some("2023-11-14T22:13:20Z")
        );
    }
}
