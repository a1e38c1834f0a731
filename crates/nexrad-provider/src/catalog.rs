//! Time-indexed catalog of the radar objects published for one site.

use std::collections::{BTreeMap, VecDeque};
use std::sync::Arc;

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use nexrad_common::{NexradError, NexradResult};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, instrument, trace, warn};
use wsr88d_parser::{load_file, NexradFile};

use crate::config::ProviderConfig;
use crate::layout::{site_id, KeyLayout};
use crate::products::ProductCache;
use crate::source::{ObjectSource, ObjectSummary};

/// Sidecar metadata objects listed alongside the volumes.
const METADATA_SUFFIX: &str = "_MDM";

/// One catalog entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectRecord {
    pub key: String,
    pub last_modified: DateTime<Utc>,
    pub size: u64,
}

impl From<ObjectSummary> for ObjectRecord {
    fn from(summary: ObjectSummary) -> Self {
        Self {
            key: summary.key,
            last_modified: summary.last_modified,
            size: summary.size,
        }
    }
}

#[derive(Debug, Default)]
struct CatalogState {
    objects: BTreeMap<DateTime<Utc>, ObjectRecord>,
    /// Days that received new objects, least recently updated first.
    dates: VecDeque<NaiveDate>,
    refresh_date: Option<NaiveDate>,
    last_modified: Option<DateTime<Utc>>,
    update_period: Option<Duration>,
}

impl CatalogState {
    fn touch_date(&mut self, date: NaiveDate) {
        self.dates.retain(|d| *d != date);
        self.dates.push_back(date);
    }

    /// Drop whole days older than yesterday while over `max_objects`, keeping
    /// at least `min_dates` days in the ledger.
    fn prune(&mut self, today: NaiveDate, max_objects: usize, min_dates: usize) -> usize {
        let yesterday = today.pred_opt().unwrap_or(today);
        let before = self.objects.len();

        let mut index = 0;
        while self.objects.len() > max_objects && self.dates.len() > min_dates {
            let Some(&date) = self.dates.get(index) else {
                break;
            };

            if date < yesterday {
                let (start, end) = day_bounds(date);
                let doomed: Vec<DateTime<Utc>> =
                    self.objects.range(start..end).map(|(time, _)| *time).collect();
                for time in doomed {
                    self.objects.remove(&time);
                }
                self.dates.remove(index);
                debug!(date = %date, "Pruned catalog date");
            } else {
                index += 1;
            }
        }

        before - self.objects.len()
    }

    fn update_metadata(&mut self) {
        let mut newest = self.objects.values().rev();
        let last = newest.next();
        let previous = newest.next();

        self.last_modified = last.map(|r| r.last_modified);
        self.update_period = match (last, previous) {
            (Some(last), Some(previous)) => Some(last.last_modified - previous.last_modified),
            _ => None,
        };
    }
}

/// Start (inclusive) and end (exclusive) of `date` in UTC.
fn day_bounds(date: NaiveDate) -> (DateTime<Utc>, DateTime<Utc>) {
    let start = Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN));
    (start, start + Duration::days(1))
}

/// Catalog of the objects a public NEXRAD bucket holds for one site.
///
/// Listings insert `(start time, record)` pairs keyed by the time encoded in
/// each key. Lookups take the read lock and may run concurrently; listings
/// take the write lock only to apply their results. [`refresh`] calls are
/// serialised by a separate mutex.
///
/// [`refresh`]: AwsNexradDataProvider::refresh
pub struct AwsNexradDataProvider {
    site: String,
    bucket: String,
    layout: KeyLayout,
    source: Arc<dyn ObjectSource>,
    state: RwLock<CatalogState>,
    refresh_lock: Mutex<()>,
    max_objects: usize,
    min_dates_before_pruning: usize,
    products: Arc<ProductCache>,
}

impl AwsNexradDataProvider {
    pub fn new(config: &ProviderConfig, source: Arc<dyn ObjectSource>) -> Self {
        Self::with_product_cache(config, source, Arc::new(ProductCache::new()))
    }

    /// Catalog sharing an existing product cache with other catalogs.
    pub fn with_product_cache(
        config: &ProviderConfig,
        source: Arc<dyn ObjectSource>,
        products: Arc<ProductCache>,
    ) -> Self {
        Self {
            site: config.site.clone(),
            bucket: config.bucket().to_string(),
            layout: config.layout(),
            source,
            state: RwLock::new(CatalogState::default()),
            refresh_lock: Mutex::new(()),
            max_objects: config.max_objects,
            min_dates_before_pruning: config.min_dates_before_pruning,
            products,
        }
    }

    pub fn site(&self) -> &str {
        &self.site
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    pub fn layout(&self) -> &KeyLayout {
        &self.layout
    }

    /// List the objects for `date`, returning `(new, total)` counts.
    pub async fn list_objects(&self, date: NaiveDate) -> (usize, usize) {
        self.list_objects_at(date, Utc::now()).await
    }

    /// List the objects for `date`, pruning relative to `now`.
    #[instrument(skip(self), fields(site = %self.site))]
    pub async fn list_objects_at(&self, date: NaiveDate, now: DateTime<Utc>) -> (usize, usize) {
        let today = now.date_naive();
        let prefix = self.layout.prefix(&self.site, date);
        debug!(bucket = %self.bucket, prefix = %prefix, "ListObjects");

        let listing = match self.source.list(&self.bucket, &prefix, None).await {
            Ok(listing) => listing,
            Err(e) => {
                warn!(prefix = %prefix, error = %e, "Could not list objects");
                return (0, 0);
            }
        };

        let found: Vec<(DateTime<Utc>, ObjectRecord)> = listing
            .objects
            .into_iter()
            .filter(|object| !object.key.ends_with(METADATA_SUFFIX))
            .filter_map(|object| {
                let time = self.layout.time_point(&object.key)?;
                Some((time, ObjectRecord::from(object)))
            })
            .collect();

        let total = found.len();
        let mut new = 0;

        let mut state = self.state.write().await;
        for (time, record) in found {
            trace!(key = %record.key, "Found object");
            if state.objects.insert(time, record).is_none() {
                new += 1;
            }
        }

        debug!(new, total, "Found objects");

        if new > 0 {
            state.touch_date(date);
            let pruned = state.prune(today, self.max_objects, self.min_dates_before_pruning);
            if pruned > 0 {
                info!(pruned, remaining = state.objects.len(), "Pruned catalog");
            }
            state.update_metadata();
        }

        (new, total)
    }

    /// Refresh the catalog against the current time.
    pub async fn refresh(&self) -> (usize, usize) {
        self.refresh_at(Utc::now()).await
    }

    /// List today's objects, and yesterday's too until an object dated today
    /// has been seen.
    #[instrument(skip(self), fields(site = %self.site))]
    pub async fn refresh_at(&self, now: DateTime<Utc>) -> (usize, usize) {
        let _guard = self.refresh_lock.lock().await;

        let today = now.date_naive();
        let yesterday = today.pred_opt().unwrap_or(today);
        let refresh_date = self.state.read().await.refresh_date;

        let mut new = 0;
        let mut total = 0;

        if refresh_date.map_or(true, |date| date < today) {
            let (n, t) = self.list_objects_at(yesterday, now).await;
            if t > 0 {
                self.state.write().await.refresh_date = Some(yesterday);
            }
            new += n;
            total += t;
        }

        let (n, t) = self.list_objects_at(today, now).await;
        if t > 0 {
            self.state.write().await.refresh_date = Some(today);
        }
        new += n;
        total += t;

        debug!(new, total, "Refreshed catalog");
        (new, total)
    }

    /// Key of the latest object starting at or before `time`.
    pub async fn find_key(&self, time: DateTime<Utc>) -> Option<String> {
        let state = self.state.read().await;
        state
            .objects
            .range(..=time)
            .next_back()
            .map(|(_, record)| record.key.clone())
    }

    pub async fn find_latest_key(&self) -> Option<String> {
        let state = self.state.read().await;
        state
            .objects
            .values()
            .next_back()
            .map(|record| record.key.clone())
    }

    pub async fn find_record(&self, time: DateTime<Utc>) -> Option<(DateTime<Utc>, ObjectRecord)> {
        let state = self.state.read().await;
        state
            .objects
            .range(..=time)
            .next_back()
            .map(|(time, record)| (*time, record.clone()))
    }

    /// Start times of the cataloged objects on `date`, ascending.
    pub async fn time_points_by_date(&self, date: NaiveDate) -> Vec<DateTime<Utc>> {
        let (start, end) = day_bounds(date);
        let state = self.state.read().await;
        state.objects.range(start..end).map(|(time, _)| *time).collect()
    }

    pub async fn cache_size(&self) -> usize {
        self.state.read().await.objects.len()
    }

    /// Last-modified time of the newest object.
    pub async fn last_modified(&self) -> Option<DateTime<Utc>> {
        self.state.read().await.last_modified
    }

    /// Interval between the last-modified times of the two newest objects.
    pub async fn update_period(&self) -> Option<Duration> {
        self.state.read().await.update_period
    }

    /// Days currently held in the date ledger.
    pub async fn dates(&self) -> Vec<NaiveDate> {
        self.state.read().await.dates.iter().copied().collect()
    }

    /// Fetch and decode the object stored under `key`.
    #[instrument(skip(self))]
    pub async fn load_object_by_key(&self, key: &str) -> NexradResult<NexradFile> {
        let body = self.source.get(&self.bucket, key).await?;
        debug!(size = body.len(), "Loading object");

        let file = tokio::task::spawn_blocking(move || load_file(&body))
            .await
            .map_err(|e| NexradError::InternalError(format!("Decode task failed: {}", e)))??;

        Ok(file)
    }

    pub async fn load_latest_object(&self) -> NexradResult<NexradFile> {
        let key = self
            .find_latest_key()
            .await
            .ok_or_else(|| NexradError::ObjectNotFound(format!("no objects for {}", self.site)))?;
        self.load_object_by_key(&key).await
    }

    /// List the Level III products published for this site, once per site.
    #[instrument(skip(self), fields(site = %self.site))]
    pub async fn request_available_products(&self) -> Vec<String> {
        if matches!(self.layout, KeyLayout::Level2) {
            return Vec::new();
        }
        if let Some(products) = self.products.get(&self.site).await {
            trace!("Available products already cached");
            return products;
        }

        let prefix = format!("{}_", site_id(&self.site));
        let listing = match self.source.list(&self.bucket, &prefix, Some("_")).await {
            Ok(listing) => listing,
            Err(e) => {
                warn!(prefix = %prefix, error = %e, "Could not list available products");
                return Vec::new();
            }
        };

        let products: Vec<String> = listing
            .common_prefixes
            .iter()
            .filter_map(|common| common.strip_prefix(&prefix))
            .map(|rest| rest.trim_end_matches('_'))
            .filter(|product| !product.is_empty())
            .map(str::to_string)
            .collect();

        info!(count = products.len(), "Found available products");
        self.products.insert(&self.site, products.clone()).await;
        products
    }

    /// Products found by [`request_available_products`](Self::request_available_products).
    pub async fn available_products(&self) -> Vec<String> {
        self.products.get(&self.site).await.unwrap_or_default()
    }

    pub fn product_cache(&self) -> &Arc<ProductCache> {
        &self.products
    }
}
