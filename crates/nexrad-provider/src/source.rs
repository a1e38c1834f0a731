//! Remote object sources.
//!
//! The catalog only needs two calls from a store: a prefix listing and a
//! whole-object get. [`S3ObjectSource`] talks to the public NOAA/Unidata
//! buckets with unsigned requests; [`MemoryObjectSource`] serves tests and
//! offline use.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region};
use bytes::Bytes;
use chrono::{DateTime, Utc};
use nexrad_common::{NexradError, NexradResult};
use tracing::{debug, instrument, warn};

/// Metadata of one listed object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectSummary {
    pub key: String,
    pub last_modified: DateTime<Utc>,
    pub size: u64,
}

/// Result of a prefix listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListOutput {
    pub objects: Vec<ObjectSummary>,
    /// Prefixes rolled up by the delimiter, if one was given.
    pub common_prefixes: Vec<String>,
}

/// Read-only access to a bucket of objects.
#[async_trait]
pub trait ObjectSource: Send + Sync {
    /// List every object under `prefix`, following pagination.
    async fn list(
        &self,
        bucket: &str,
        prefix: &str,
        delimiter: Option<&str>,
    ) -> NexradResult<ListOutput>;

    /// Fetch a whole object.
    async fn get(&self, bucket: &str, key: &str) -> NexradResult<Bytes>;
}

/// S3 source using anonymous requests.
#[derive(Debug, Clone)]
pub struct S3ObjectSource {
    client: aws_sdk_s3::Client,
}

impl S3ObjectSource {
    pub async fn new(region: &str) -> Self {
        // The NEXRAD buckets are public; requests go out unsigned
        let aws_config = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(region.to_string()))
            .no_credentials()
            .load()
            .await;

        Self {
            client: aws_sdk_s3::Client::new(&aws_config),
        }
    }

    pub fn from_client(client: aws_sdk_s3::Client) -> Self {
        Self { client }
    }
}

fn to_chrono(time: Option<&aws_sdk_s3::primitives::DateTime>) -> DateTime<Utc> {
    time.and_then(|t| DateTime::from_timestamp(t.secs(), t.subsec_nanos()))
        .unwrap_or_default()
}

#[async_trait]
impl ObjectSource for S3ObjectSource {
    #[instrument(skip(self))]
    async fn list(
        &self,
        bucket: &str,
        prefix: &str,
        delimiter: Option<&str>,
    ) -> NexradResult<ListOutput> {
        let mut output = ListOutput::default();
        let mut continuation_token: Option<String> = None;

        loop {
            let mut request = self.client.list_objects_v2().bucket(bucket).prefix(prefix);

            if let Some(delimiter) = delimiter {
                request = request.delimiter(delimiter);
            }
            if let Some(ref token) = continuation_token {
                request = request.continuation_token(token.clone());
            }

            let response = request
                .send()
                .await
                .map_err(|e| NexradError::ListError(format!("{}: {}", prefix, e)))?;

            for object in response.contents() {
                if let Some(key) = object.key() {
                    output.objects.push(ObjectSummary {
                        key: key.to_string(),
                        last_modified: to_chrono(object.last_modified()),
                        size: object.size().unwrap_or(0).max(0) as u64,
                    });
                }
            }
            output.common_prefixes.extend(
                response
                    .common_prefixes()
                    .iter()
                    .filter_map(|p| p.prefix().map(str::to_string)),
            );

            if response.is_truncated() == Some(true) {
                continuation_token = response.next_continuation_token().map(|s| s.to_string());
            } else {
                break;
            }
        }

        debug!(
            objects = output.objects.len(),
            prefixes = output.common_prefixes.len(),
            "Listed objects"
        );
        Ok(output)
    }

    #[instrument(skip(self))]
    async fn get(&self, bucket: &str, key: &str) -> NexradResult<Bytes> {
        let response = self
            .client
            .get_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| {
                if e.as_service_error().is_some_and(|s| s.is_no_such_key()) {
                    NexradError::ObjectNotFound(key.to_string())
                } else {
                    NexradError::GetError {
                        key: key.to_string(),
                        message: e.to_string(),
                    }
                }
            })?;

        let body = response.body.collect().await.map_err(|e| NexradError::GetError {
            key: key.to_string(),
            message: e.to_string(),
        })?;

        let bytes = body.into_bytes();
        debug!(size = bytes.len(), "Fetched object");
        Ok(bytes)
    }
}

#[derive(Debug, Clone)]
struct MemoryObject {
    last_modified: DateTime<Utc>,
    body: Bytes,
}

/// In-memory bucket. The bucket argument of each call is ignored.
#[derive(Debug, Default)]
pub struct MemoryObjectSource {
    objects: Mutex<BTreeMap<String, MemoryObject>>,
    requested_prefixes: Mutex<Vec<String>>,
    failing: AtomicBool,
}

impl MemoryObjectSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, key: &str, last_modified: DateTime<Utc>, body: impl Into<Bytes>) {
        lock(&self.objects).insert(
            key.to_string(),
            MemoryObject {
                last_modified,
                body: body.into(),
            },
        );
    }

    pub fn remove(&self, key: &str) {
        lock(&self.objects).remove(key);
    }

    pub fn len(&self) -> usize {
        lock(&self.objects).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Make every subsequent call fail as a transport error.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Prefixes passed to `list`, in call order.
    pub fn requested_prefixes(&self) -> Vec<String> {
        lock(&self.requested_prefixes).clone()
    }

    pub fn clear_requests(&self) {
        lock(&self.requested_prefixes).clear();
    }
}

/// Lock a mutex, recovering the data if a holder panicked. Every update to
/// the guarded maps is a single call, so the data is never half-written.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| {
        warn!("Memory source lock poisoned, recovering");
        poisoned.into_inner()
    })
}

#[async_trait]
impl ObjectSource for MemoryObjectSource {
    async fn list(
        &self,
        _bucket: &str,
        prefix: &str,
        delimiter: Option<&str>,
    ) -> NexradResult<ListOutput> {
        lock(&self.requested_prefixes).push(prefix.to_string());
        if self.failing.load(Ordering::SeqCst) {
            warn!(prefix = %prefix, "Simulated listing failure");
            return Err(NexradError::ListError(format!("{}: unavailable", prefix)));
        }

        let objects = lock(&self.objects);
        let mut output = ListOutput::default();

        for (key, object) in objects.range(prefix.to_string()..) {
            let Some(rest) = key.strip_prefix(prefix) else {
                break;
            };

            let rolled_up = delimiter.and_then(|d| rest.find(d).map(|i| i + d.len()));
            match rolled_up {
                Some(end) => {
                    let common = format!("{}{}", prefix, &rest[..end]);
                    if output.common_prefixes.last() != Some(&common) {
                        output.common_prefixes.push(common);
                    }
                }
                None => output.objects.push(ObjectSummary {
                    key: key.clone(),
                    last_modified: object.last_modified,
                    size: object.body.len() as u64,
                }),
            }
        }

        Ok(output)
    }

    async fn get(&self, _bucket: &str, key: &str) -> NexradResult<Bytes> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(NexradError::GetError {
                key: key.to_string(),
                message: "unavailable".to_string(),
            });
        }

        lock(&self.objects)
            .get(key)
            .map(|o| o.body.clone())
            .ok_or_else(|| NexradError::ObjectNotFound(key.to_string()))
    }
}
