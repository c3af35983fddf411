use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::detail::AssetDetail;
use crate::error::UpstreamError;
use crate::http::{HttpAuth, HttpClient, HttpRequest};

/// Authenticated client for the CoinDesk pricing API.
///
/// All three endpoints are plain GETs carrying the static API key; a body
/// with a non-empty embedded error message counts as a failure even when
/// the transport call itself succeeded.
#[derive(Clone)]
pub struct CoinDeskClient {
    http: Arc<dyn HttpClient>,
    base_url: String,
    api_key: String,
}

impl CoinDeskClient {
    pub fn new(
        http: Arc<dyn HttpClient>,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        Self {
            http,
            base_url: base_url.into(),
            api_key: api_key.into(),
        }
    }

    /// Full asset snapshot used to rebuild the directory.
    pub async fn summary_list(&self) -> Result<SummaryListResponse, UpstreamError> {
        let url = format!(
            "{}/asset/v1/summary/list?asset_lookup_priority=SYMBOL",
            self.base_url
        );
        self.get_json(url).await
    }

    /// Metadata for one resolved symbol.
    pub async fn asset_metadata(&self, symbol: &str) -> Result<MetadataResponse, UpstreamError> {
        let url = format!(
            "{}/asset/v2/metadata?asset_lookup_priority=SYMBOL&assets={}&asset_language=en-US&quote_asset=USD",
            self.base_url,
            urlencoding::encode(symbol)
        );
        self.get_json(url).await
    }

    /// Paged statistics sorted by circulating market cap, descending.
    /// Page boundaries are entirely the upstream's business; `page` and
    /// `page_size` pass through verbatim.
    pub async fn top_list(
        &self,
        page: i64,
        page_size: i64,
    ) -> Result<TopListResponse, UpstreamError> {
        let url = format!(
            "{}/asset/v1/top/list?page={}&page_size={}&sort_by=CIRCULATING_MKT_CAP_USD&sort_direction=DESC&groups=ID,BASIC,SUPPLY,PRICE,MKT_CAP,VOLUME,CHANGE,TOPLIST_RANK&toplist_quote_asset=USD",
            self.base_url, page, page_size
        );
        self.get_json(url).await
    }

    async fn get_json<T: DeserializeOwned>(&self, url: String) -> Result<T, UpstreamError> {
        let request = HttpRequest::get(url)
            .with_header("accepts", "application/json")
            .with_auth(&HttpAuth::Apikey(self.api_key.clone()));

        let response = self
            .http
            .execute(request)
            .await
            .map_err(|error| UpstreamError::Transport(error.message().to_owned()))?;

        if !response.is_success() {
            return Err(UpstreamError::Status {
                status: response.status,
            });
        }

        decode_payload(&response.body)
    }
}

/// Decode a response body, surfacing an embedded API error first.
fn decode_payload<T: DeserializeOwned>(body: &str) -> Result<T, UpstreamError> {
    if let Ok(probe) = serde_json::from_str::<ErrorProbe>(body) {
        if let Some(err) = probe.err {
            if !err.message.is_empty() {
                return Err(UpstreamError::Api {
                    message: err.message,
                });
            }
        }
    }

    serde_json::from_str(body).map_err(|error| UpstreamError::Decode(error.to_string()))
}

#[derive(Debug, Deserialize)]
struct ErrorProbe {
    #[serde(rename = "Err", default)]
    err: Option<ApiErrorPayload>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorPayload {
    #[serde(default)]
    message: String,
}

/// `GET /asset/v1/summary/list` payload. Absent sections decode to their
/// empty forms, matching the upstream's sparse responses.
#[derive(Debug, Deserialize)]
pub struct SummaryListResponse {
    #[serde(rename = "Data", default)]
    pub data: SummaryListData,
}

#[derive(Debug, Default, Deserialize)]
pub struct SummaryListData {
    #[serde(rename = "LIST", default)]
    pub list: Vec<SummaryEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SummaryEntry {
    #[serde(rename = "SYMBOL", default)]
    pub symbol: String,
    #[serde(rename = "NAME", default)]
    pub name: String,
}

/// `GET /asset/v2/metadata` payload, keyed by symbol.
#[derive(Debug, Deserialize)]
pub struct MetadataResponse {
    #[serde(rename = "Data", default)]
    pub data: std::collections::BTreeMap<String, AssetDetail>,
}

/// `GET /asset/v1/top/list` payload.
#[derive(Debug, Deserialize)]
pub struct TopListResponse {
    #[serde(rename = "Data", default)]
    pub data: TopListData,
}

#[derive(Debug, Default, Deserialize)]
pub struct TopListData {
    #[serde(rename = "LIST", default)]
    pub list: Vec<AssetDetail>,
}
