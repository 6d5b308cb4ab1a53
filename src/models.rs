use std::fmt;

use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer};
use serde_json::Number;

// Data structures for the listAvailabilities response
#[derive(Debug, Deserialize)]
pub struct AvailabilityResponse {
    pub availabilities: Availabilities,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Availabilities {
    #[serde(default)]
    pub by_rate: ByRate,
}

/// Availabilities keyed by rate id, in the order the API listed them.
#[derive(Debug, Default)]
pub struct ByRate(pub Vec<(String, RateAvailability)>);

impl ByRate {
    /// True when no rate has a single availability window.
    pub fn is_empty(&self) -> bool {
        self.0.iter().all(|(_, rate)| rate.availability.is_empty())
    }

    pub fn get(&self, rate_id: &str) -> Option<&RateAvailability> {
        self.0
            .iter()
            .find(|(key, _)| key == rate_id)
            .map(|(_, rate)| rate)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &RateAvailability)> {
        self.0.iter().map(|(key, rate)| (key.as_str(), rate))
    }
}

impl<'de> Deserialize<'de> for ByRate {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct ByRateVisitor;

        impl<'de> Visitor<'de> for ByRateVisitor {
            type Value = ByRate;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("an object keyed by rate id")
            }

            fn visit_map<A>(self, mut access: A) -> Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut rates = Vec::with_capacity(access.size_hint().unwrap_or(0));
                while let Some((key, value)) = access.next_entry::<String, RateAvailability>()? {
                    rates.push((key, value));
                }
                Ok(ByRate(rates))
            }
        }

        deserializer.deserialize_map(ByRateVisitor)
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct RateAvailability {
    #[serde(default)]
    pub availability: Vec<Availability>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Availability {
    pub start: String,
    pub end: String,
    #[serde(default)]
    pub capacity: Option<i64>,
}

// Error payload returned with non-200 statuses
#[derive(Debug, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
pub struct ErrorDetail {
    pub message: String,
}

// getSupplier
#[derive(Debug, Deserialize)]
pub struct SupplierResponse {
    pub supplier: Supplier,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Supplier {
    pub main_location: Location,
}

#[derive(Debug, Deserialize)]
pub struct Location {
    pub name: String,
}

// getProduct
#[derive(Debug, Deserialize)]
pub struct ProductResponse {
    pub product: Product,
}

#[derive(Debug, Deserialize)]
pub struct Product {
    pub title: String,
}

// getRate
#[derive(Debug, Deserialize)]
pub struct RateResponse {
    pub rate: RateBody,
}

#[derive(Debug, Deserialize)]
pub struct RateBody {
    #[serde(default)]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub prices: Vec<RatePrice>,
}

#[derive(Debug, Deserialize)]
pub struct RatePrice {
    pub name: String,
    pub retail: Money,
}

#[derive(Debug, Deserialize)]
pub struct Money {
    pub amount: Number,
}

/// A rate with its retail price per tier ("Adult", "Child", ...).
#[derive(Debug, Clone, PartialEq)]
pub struct Rate {
    pub id: String,
    pub name: String,
    pub prices: Vec<(String, Number)>,
}

impl Rate {
    // Later tiers with the same name win
    pub fn price(&self, tier: &str) -> Option<&Number> {
        self.prices
            .iter()
            .rev()
            .find(|(name, _)| name == tier)
            .map(|(_, amount)| amount)
    }
}

impl From<RateResponse> for Rate {
    fn from(item: RateResponse) -> Self {
        Rate {
            id: item.rate.id,
            name: item.rate.name,
            prices: item
                .rate
                .prices
                .into_iter()
                .map(|price| (price.name, price.retail.amount))
                .collect(),
        }
    }
}
