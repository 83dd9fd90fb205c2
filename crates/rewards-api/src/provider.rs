use std::fmt;

use contracts::{
    AggregateTotal, MetricKind, ProviderStatus, TokenExchangeRequest, TokenExchangeResponse,
    SCHEMA_VERSION_V1,
};
use serde::Deserialize;
use serde_json::json;
use tracing::warn;

const DEFAULT_AUTHORIZE_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const DEFAULT_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const DEFAULT_AGGREGATE_URL: &str =
    "https://www.googleapis.com/fitness/v1/users/me/dataset:aggregate";

#[derive(Debug)]
pub enum ProviderError {
    NotConfigured,
    Http(reqwest::Error),
    Upstream { status: u16, body: String },
}

impl fmt::Display for ProviderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotConfigured => write!(f, "provider credentials are not configured"),
            Self::Http(err) => write!(f, "provider request failed: {err}"),
            Self::Upstream { status, body } => {
                write!(f, "provider returned status {status}: {body}")
            }
        }
    }
}

impl std::error::Error for ProviderError {}

impl From<reqwest::Error> for ProviderError {
    fn from(value: reqwest::Error) -> Self {
        Self::Http(value)
    }
}

#[derive(Debug, Clone, Default)]
pub struct ProviderConfig {
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub authorize_url: Option<String>,
    pub token_url: Option<String>,
    pub aggregate_url: Option<String>,
}

impl ProviderConfig {
    pub fn from_env() -> Self {
        Self {
            client_id: env_value("STRIDE_PROVIDER_CLIENT_ID"),
            client_secret: env_value("STRIDE_PROVIDER_CLIENT_SECRET"),
            authorize_url: env_value("STRIDE_PROVIDER_AUTHORIZE_URL"),
            token_url: env_value("STRIDE_PROVIDER_TOKEN_URL"),
            aggregate_url: env_value("STRIDE_PROVIDER_AGGREGATE_URL"),
        }
    }

    /// Both secrets must be present; a partial configuration stays in demo
    /// mode rather than failing half the flows.
    pub fn configured(&self) -> bool {
        self.client_id.is_some() && self.client_secret.is_some()
    }

    fn token_url(&self) -> &str {
        self.token_url.as_deref().unwrap_or(DEFAULT_TOKEN_URL)
    }

    fn aggregate_url(&self) -> &str {
        self.aggregate_url.as_deref().unwrap_or(DEFAULT_AGGREGATE_URL)
    }

    fn authorize_url(&self) -> Option<String> {
        let client_id = self.client_id.as_deref()?;
        let base = self.authorize_url.as_deref().unwrap_or(DEFAULT_AUTHORIZE_URL);
        Some(format!(
            "{base}?client_id={client_id}&response_type=code&scope=activity%20heart_rate"
        ))
    }
}

fn env_value(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .filter(|value| !value.trim().is_empty())
}

#[derive(Clone)]
pub struct ProviderClient {
    config: ProviderConfig,
    http: reqwest::Client,
}

impl ProviderClient {
    pub fn new(config: ProviderConfig) -> Self {
        Self {
            config,
            http: reqwest::Client::new(),
        }
    }

    pub fn status(&self) -> ProviderStatus {
        let configured = self.config.configured();
        ProviderStatus {
            schema_version: SCHEMA_VERSION_V1.to_string(),
            configured,
            demo_mode: !configured,
            authorize_url: self.config.authorize_url(),
        }
    }

    /// Authorization-code grant against the provider token endpoint. No retry
    /// or backoff; upstream failures surface with the response body attached.
    pub async fn exchange_code(
        &self,
        request: &TokenExchangeRequest,
    ) -> Result<TokenExchangeResponse, ProviderError> {
        let (Some(client_id), Some(client_secret)) = (
            self.config.client_id.as_deref(),
            self.config.client_secret.as_deref(),
        ) else {
            return Err(ProviderError::NotConfigured);
        };

        let form = [
            ("code", request.code.as_str()),
            ("client_id", client_id),
            ("client_secret", client_secret),
            ("redirect_uri", request.redirect_uri.as_str()),
            ("grant_type", "authorization_code"),
        ];

        let response = self
            .http
            .post(self.config.token_url())
            .form(&form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), "token exchange rejected upstream");
            return Err(ProviderError::Upstream {
                status: status.as_u16(),
                body,
            });
        }

        Ok(response.json().await?)
    }

    /// Aggregates one metric over a millisecond window. Unconfigured clients
    /// fall back to a deterministic demo series instead of failing so the
    /// rest of the app stays usable without provider credentials.
    pub async fn aggregate(
        &self,
        access_token: &str,
        metric: MetricKind,
        start_millis: i64,
        end_millis: i64,
    ) -> Result<AggregateTotal, ProviderError> {
        if !self.config.configured() {
            return Ok(demo_aggregate(metric));
        }

        let body = json!({
            "aggregateBy": [{ "dataTypeName": data_type_name(metric) }],
            "bucketByTime": { "durationMillis": (end_millis - start_millis).max(1) },
            "startTimeMillis": start_millis,
            "endTimeMillis": end_millis,
        });

        let response = self
            .http
            .post(self.config.aggregate_url())
            .bearer_auth(access_token)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), "aggregate query rejected upstream");
            return Err(ProviderError::Upstream {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: AggregateResponse = response.json().await?;
        let (total, bucket_count) = sum_buckets(&parsed);

        Ok(AggregateTotal {
            metric,
            total,
            bucket_count,
            demo: false,
        })
    }
}

fn data_type_name(metric: MetricKind) -> &'static str {
    match metric {
        MetricKind::Steps => "com.google.step_count.delta",
        MetricKind::Calories => "com.google.calories.expended",
        MetricKind::DistanceMeters => "com.google.distance.delta",
        MetricKind::ActiveMinutes => "com.google.active_minutes",
        MetricKind::HeartPoints => "com.google.heart_minutes",
    }
}

/// Fixed per-metric totals, so an unconfigured deployment still renders a
/// believable dashboard.
fn demo_aggregate(metric: MetricKind) -> AggregateTotal {
    let total = match metric {
        MetricKind::Steps => 8_432,
        MetricKind::Calories => 1_890,
        MetricKind::DistanceMeters => 6_250,
        MetricKind::ActiveMinutes => 47,
        MetricKind::HeartPoints => 28,
    };

    AggregateTotal {
        metric,
        total,
        bucket_count: 1,
        demo: true,
    }
}

#[derive(Debug, Deserialize)]
struct AggregateResponse {
    #[serde(default)]
    bucket: Vec<AggregateBucket>,
}

#[derive(Debug, Deserialize)]
struct AggregateBucket {
    #[serde(default)]
    dataset: Vec<AggregateDataset>,
}

#[derive(Debug, Deserialize)]
struct AggregateDataset {
    #[serde(default)]
    point: Vec<AggregatePoint>,
}

#[derive(Debug, Deserialize)]
struct AggregatePoint {
    #[serde(default)]
    value: Vec<AggregateValue>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AggregateValue {
    int_val: Option<i64>,
    fp_val: Option<f64>,
}

/// Sums every integer and floating-point value across buckets, datasets, and
/// points; floating-point contributions are floored into the token-safe total.
fn sum_buckets(response: &AggregateResponse) -> (u64, usize) {
    let mut int_total = 0_i64;
    let mut fp_total = 0_f64;

    for bucket in &response.bucket {
        for dataset in &bucket.dataset {
            for point in &dataset.point {
                for value in &point.value {
                    if let Some(int_val) = value.int_val {
                        int_total += int_val;
                    }
                    if let Some(fp_val) = value.fp_val {
                        fp_total += fp_val;
                    }
                }
            }
        }
    }

    let combined = int_total.max(0) as u64 + fp_total.max(0.0).floor() as u64;
    (combined, response.bucket.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unconfigured_client_reports_demo_mode() {
        let client = ProviderClient::new(ProviderConfig::default());
        let status = client.status();

        assert!(!status.configured);
        assert!(status.demo_mode);
        assert_eq!(status.authorize_url, None);
    }

    #[test]
    fn configured_status_carries_an_authorize_url() {
        let client = ProviderClient::new(ProviderConfig {
            client_id: Some("client-123".to_string()),
            client_secret: Some("secret".to_string()),
            ..ProviderConfig::default()
        });
        let status = client.status();

        assert!(status.configured);
        assert!(!status.demo_mode);
        let url = status.authorize_url.expect("url present");
        assert!(url.contains("client_id=client-123"));
    }

    #[test]
    fn aggregate_sums_floor_floating_point_values() {
        let raw = json!({
            "bucket": [
                {
                    "dataset": [
                        { "point": [ { "value": [ { "intVal": 1200 } ] } ] },
                        { "point": [ { "value": [ { "fpVal": 350.9 } ] } ] }
                    ]
                },
                {
                    "dataset": [
                        { "point": [ { "value": [ { "intVal": 800, "fpVal": 0.4 } ] } ] }
                    ]
                }
            ]
        });
        let response: AggregateResponse = serde_json::from_value(raw).expect("decode");

        let (total, bucket_count) = sum_buckets(&response);
        assert_eq!(total, 1_200 + 800 + 350);
        assert_eq!(bucket_count, 2);
    }

    #[test]
    fn every_metric_maps_to_a_provider_data_type() {
        assert_eq!(
            data_type_name(MetricKind::Steps),
            "com.google.step_count.delta"
        );
        assert_eq!(
            data_type_name(MetricKind::HeartPoints),
            "com.google.heart_minutes"
        );
    }

    #[test]
    fn demo_series_is_deterministic() {
        let first = demo_aggregate(MetricKind::Steps);
        let second = demo_aggregate(MetricKind::Steps);

        assert!(first.demo);
        assert_eq!(first.total, second.total);
        assert_eq!(first.total, 8_432);
    }
}
