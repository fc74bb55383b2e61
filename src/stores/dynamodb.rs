use std::time::{Duration, SystemTime};

use async_trait::async_trait;
use aws_sdk_dynamodb::Client;
use aws_sdk_dynamodb::primitives::Blob;
use aws_sdk_dynamodb::types::{AttributeValue, TimeToLiveSpecification};
use tracing::warn;

use crate::config::{Clock, DEFAULT_ITEM_EXPIRATION, wall_clock};
use crate::entry::{CacheEntry, unix_seconds};
use crate::error::CacheError;
use crate::store::{Lookup, Store};

use super::row_expiration;

const ATTR_URL: &str = "url";
const ATTR_RESPONSE: &str = "response";
const ATTR_CREATED_AT: &str = "created_at";
const ATTR_UPDATED_AT: &str = "updated_at";
const ATTR_EXPIRED_AT: &str = "expired_at";

/// Configuration for DynamoStore.
#[derive(Debug, Clone)]
pub struct DynamoConfig {
    /// Table holding the cache rows.
    pub table: String,

    /// Region override; the ambient AWS configuration applies when
    /// unset.
    pub region: Option<String>,

    /// Row lifetime written for entries that carry no freshness
    /// lifetime of their own.
    pub item_expiration: Duration,

    /// Register `expired_at` as the table's native TTL attribute so
    /// DynamoDB removes expired rows on its own schedule.
    pub delete_expired_items: bool,
}

impl DynamoConfig {
    /// Configuration for `table` with the default row lifetime and no
    /// native TTL registration.
    pub fn new(table: impl Into<String>) -> Self {
        DynamoConfig {
            table: table.into(),
            region: None,
            item_expiration: DEFAULT_ITEM_EXPIRATION,
            delete_expired_items: false,
        }
    }
}

/// DynamoDB-backed cache store.
///
/// One string partition key `url`, a binary `response` attribute, and
/// Unix-second bookkeeping attributes identical to the SQL columns.
/// Reads are strongly consistent; the freshness verdict is made
/// against the `expired_at` attribute.
pub struct DynamoStore {
    client: Client,
    table: String,
    item_expiration: Duration,
    now: Clock,
}

impl DynamoStore {
    /// Construct the store from the ambient AWS configuration.
    pub async fn new(config: DynamoConfig) -> Result<Self, CacheError> {
        let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest());
        if let Some(region) = config.region.clone() {
            loader = loader.region(aws_config::Region::new(region));
        }
        let aws = loader.load().await;

        Self::with_client(Client::new(&aws), config).await
    }

    /// Like [`DynamoStore::new`] with a caller-supplied client, useful
    /// against DynamoDB Local.
    pub async fn with_client(client: Client, config: DynamoConfig) -> Result<Self, CacheError> {
        if config.table.is_empty() {
            return Err(CacheError::Validation(
                "dynamodb table name is empty".to_string(),
            ));
        }

        if config.delete_expired_items {
            enable_native_ttl(&client, &config.table).await;
        }

        Ok(DynamoStore {
            client,
            table: config.table,
            item_expiration: config.item_expiration,
            now: wall_clock(),
        })
    }

    /// Replace the wall clock, mainly for tests.
    pub fn with_clock(mut self, now: Clock) -> Self {
        self.now = now;
        self
    }
}

// The table may already have TTL enabled, which DynamoDB reports as an
// error; failures are logged, not propagated.
async fn enable_native_ttl(client: &Client, table: &str) {
    let spec = TimeToLiveSpecification::builder()
        .enabled(true)
        .attribute_name(ATTR_EXPIRED_AT)
        .build();

    match spec {
        Ok(spec) => {
            if let Err(err) = client
                .update_time_to_live()
                .table_name(table)
                .time_to_live_specification(spec)
                .send()
                .await
            {
                warn!(table, error = %err, "enabling native row ttl failed");
            }
        }
        Err(err) => {
            warn!(table, error = %err, "building ttl specification failed");
        }
    }
}

fn number(value: i64) -> AttributeValue {
    AttributeValue::N(value.to_string())
}

#[async_trait]
impl Store for DynamoStore {
    fn name(&self) -> &'static str {
        "dynamodb"
    }

    async fn get(&self, key: &str) -> Result<Lookup, CacheError> {
        let output = self
            .client
            .get_item()
            .table_name(&self.table)
            .key(ATTR_URL, AttributeValue::S(key.to_string()))
            .consistent_read(true)
            .send()
            .await
            .map_err(|e| CacheError::backend(self.name(), key, e.to_string()))?;

        let Some(item) = output.item else {
            return Ok(Lookup::Miss);
        };

        let blob = item
            .get(ATTR_RESPONSE)
            .and_then(|v| v.as_b().ok())
            .ok_or_else(|| {
                CacheError::backend(self.name(), key, "row has no response attribute")
            })?;
        let entry = CacheEntry::from_bytes(blob.as_ref())?;

        let expired_at = item
            .get(ATTR_EXPIRED_AT)
            .and_then(|v| v.as_n().ok())
            .and_then(|n| n.parse::<i64>().ok())
            .unwrap_or(0);

        if unix_seconds((self.now)()) < expired_at {
            Ok(Lookup::Hit(entry))
        } else {
            Ok(Lookup::Expired(entry))
        }
    }

    async fn set(&self, key: &str, entry: CacheEntry) -> Result<(), CacheError> {
        let created_at = (self.now)();
        let blob = entry.to_bytes()?;
        let expired_at = row_expiration(&entry, created_at, self.item_expiration);

        self.client
            .put_item()
            .table_name(&self.table)
            .item(ATTR_URL, AttributeValue::S(key.to_string()))
            .item(ATTR_RESPONSE, AttributeValue::B(Blob::new(blob)))
            .item(ATTR_CREATED_AT, number(unix_seconds(created_at)))
            .item(ATTR_UPDATED_AT, number(unix_seconds(created_at)))
            .item(ATTR_EXPIRED_AT, number(expired_at))
            .send()
            .await
            .map_err(|e| CacheError::backend(self.name(), key, e.to_string()))?;

        Ok(())
    }

    async fn update(&self, key: &str, expiration: SystemTime) -> Result<(), CacheError> {
        let result = self
            .client
            .update_item()
            .table_name(&self.table)
            .key(ATTR_URL, AttributeValue::S(key.to_string()))
            .update_expression("SET #expired_at = :expired_at, #updated_at = :updated_at")
            .condition_expression("attribute_exists(#url)")
            .expression_attribute_names("#url", ATTR_URL)
            .expression_attribute_names("#expired_at", ATTR_EXPIRED_AT)
            .expression_attribute_names("#updated_at", ATTR_UPDATED_AT)
            .expression_attribute_values(":expired_at", number(unix_seconds(expiration)))
            .expression_attribute_values(":updated_at", number(unix_seconds((self.now)())))
            .send()
            .await;

        match result {
            Ok(_) => Ok(()),
            // updating a missing key is a no-op by contract
            Err(err)
                if err
                    .as_service_error()
                    .map(|e| e.is_conditional_check_failed_exception())
                    .unwrap_or(false) =>
            {
                Ok(())
            }
            Err(err) => Err(CacheError::backend(self.name(), key, err.to_string())),
        }
    }
}
