// Redeam Booking API v1.2 client
// Four plain GET calls, authenticated with the key/secret header pair

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use crate::config::{ApiSettings, Credentials};
use crate::error::{AvailabilityError, Result};
use crate::models::{
    AvailabilityResponse, ErrorResponse, ProductResponse, Rate, RateResponse, SupplierResponse,
};

pub const API_VERSION: &str = "v1.2";
pub const API_KEY_HEADER: &str = "X-API-Key";
pub const API_SECRET_HEADER: &str = "X-API-Secret";

/// Status and body of a response, before any validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
}

impl RawResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }
}

// The calls the lookup makes against the booking API
#[async_trait]
pub trait AvailabilityApi: Send + Sync {
    // listAvailabilities, returned unvalidated
    async fn get_availabilities(
        &self,
        supplier_id: &str,
        product_id: &str,
        start: &str,
        end: &str,
    ) -> Result<RawResponse>;

    // getSupplier -> supplier.mainLocation.name
    async fn get_supplier_name(&self, supplier_id: &str) -> Result<String>;

    // getProduct -> product.title
    async fn get_product_name(&self, supplier_id: &str, product_id: &str) -> Result<String>;

    // getRate -> rate name and retail price per tier
    async fn get_rate(&self, supplier_id: &str, product_id: &str, rate_id: &str) -> Result<Rate>;
}

/// Checks the status of a response and parses its body.
///
/// Anything but 200 becomes [`AvailabilityError::ApiError`] carrying the
/// API's `error.message`, or the raw body when it has no such field.
pub fn check_response(response: &RawResponse) -> Result<Value> {
    if response.status != 200 {
        let message = serde_json::from_str::<ErrorResponse>(&response.body)
            .map(|body| body.error.message)
            .unwrap_or_else(|_| response.body.trim().to_string());
        return Err(AvailabilityError::ApiError {
            status: response.status,
            message,
        });
    }

    serde_json::from_str(&response.body)
        .map_err(|e| AvailabilityError::MalformedResponse(e.to_string()))
}

fn decode<T: DeserializeOwned>(value: Value) -> Result<T> {
    serde_json::from_value(value).map_err(|e| AvailabilityError::MalformedResponse(e.to_string()))
}

/// Validates a listAvailabilities response and decodes it.
pub fn parse_availabilities(response: &RawResponse) -> Result<AvailabilityResponse> {
    decode(check_response(response)?)
}

/// Builds the auth header pair attached to every request.
pub fn auth_headers(credentials: &Credentials) -> Result<HeaderMap> {
    let key = HeaderValue::from_str(&credentials.api_key)
        .map_err(|e| AvailabilityError::Config(format!("invalid api_key: {}", e)))?;
    let mut secret = HeaderValue::from_str(&credentials.api_secret)
        .map_err(|e| AvailabilityError::Config(format!("invalid api_secret: {}", e)))?;
    secret.set_sensitive(true);

    let mut headers = HeaderMap::new();
    headers.insert(API_KEY_HEADER, key);
    headers.insert(API_SECRET_HEADER, secret);
    Ok(headers)
}

pub struct RedeamClient {
    http: reqwest::Client,
    base_url: String,
}

impl RedeamClient {
    pub fn new(credentials: &Credentials, settings: &ApiSettings) -> Result<Self> {
        let mut builder = reqwest::Client::builder().default_headers(auth_headers(credentials)?);
        if let Some(secs) = settings.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }

        Ok(Self::with_http(builder.build()?, &settings.base_url))
    }

    /// Uses an already configured reqwest client. It must carry the auth
    /// headers from [`auth_headers`] itself.
    pub fn with_http(http: reqwest::Client, base_url: &str) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn supplier_url(&self, supplier_id: &str) -> String {
        format!("{}/{}/suppliers/{}", self.base_url, API_VERSION, supplier_id)
    }

    pub fn product_url(&self, supplier_id: &str, product_id: &str) -> String {
        format!("{}/products/{}", self.supplier_url(supplier_id), product_id)
    }

    pub fn availabilities_url(&self, supplier_id: &str, product_id: &str) -> String {
        format!("{}/availabilities", self.product_url(supplier_id, product_id))
    }

    pub fn rate_url(&self, supplier_id: &str, product_id: &str, rate_id: &str) -> String {
        format!("{}/rates/{}", self.product_url(supplier_id, product_id), rate_id)
    }

    async fn fetch(&self, url: &str, query: &[(&str, &str)]) -> Result<RawResponse> {
        let mut request = self.http.get(url);
        if !query.is_empty() {
            request = request.query(query);
        }

        let response = request.send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;
        debug!(url, status, bytes = body.len(), "booking api request completed");

        Ok(RawResponse { status, body })
    }

    async fn fetch_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        let response = self.fetch(url, &[]).await?;
        decode(check_response(&response)?)
    }
}

#[async_trait]
impl AvailabilityApi for RedeamClient {
    async fn get_availabilities(
        &self,
        supplier_id: &str,
        product_id: &str,
        start: &str,
        end: &str,
    ) -> Result<RawResponse> {
        let url = self.availabilities_url(supplier_id, product_id);
        self.fetch(&url, &[("start", start), ("end", end)]).await
    }

    async fn get_supplier_name(&self, supplier_id: &str) -> Result<String> {
        let response: SupplierResponse = self.fetch_json(&self.supplier_url(supplier_id)).await?;
        Ok(response.supplier.main_location.name)
    }

    async fn get_product_name(&self, supplier_id: &str, product_id: &str) -> Result<String> {
        let response: ProductResponse = self
            .fetch_json(&self.product_url(supplier_id, product_id))
            .await?;
        Ok(response.product.title)
    }

    async fn get_rate(&self, supplier_id: &str, product_id: &str, rate_id: &str) -> Result<Rate> {
        let response: RateResponse = self
            .fetch_json(&self.rate_url(supplier_id, product_id, rate_id))
            .await?;
        Ok(response.into())
    }
}
