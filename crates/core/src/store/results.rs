//! Analysis result persistence on SQLite.
//!
//! Every `save` appends a row; nothing is ever upserted. Rows leave the table
//! only through the two delete operations.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use tokio_rusqlite::params;
use tokio_rusqlite::rusqlite;

use super::{CacheDb, ResultStore, StoreStats};
use crate::Error;
use crate::model::{AnalysisOptions, AnalysisResult, CacheKey, PageMetadata, ResourceCollection};

const SELECT_COLUMNS: &str = "url, interaction_level, device_type, verbose_logging, analyzed_at_ns, \
                              duration_ms, resources_json, metadata_json";

/// A row as read from `analysis_results`, before decoding.
struct StoredRow {
    url: String,
    interaction_level: String,
    device_type: String,
    verbose_logging: bool,
    analyzed_at_ns: i64,
    duration_ms: i64,
    resources_json: String,
    metadata_json: String,
}

impl StoredRow {
    fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            url: row.get(0)?,
            interaction_level: row.get(1)?,
            device_type: row.get(2)?,
            verbose_logging: row.get::<_, i32>(3)? == 1,
            analyzed_at_ns: row.get(4)?,
            duration_ms: row.get(5)?,
            resources_json: row.get(6)?,
            metadata_json: row.get(7)?,
        })
    }

    fn decode(self) -> Result<AnalysisResult, Error> {
        let corrupt = |e: Error| Error::CorruptEntry(e.to_string());
        let options = AnalysisOptions::new(
            self.interaction_level.parse().map_err(corrupt)?,
            self.device_type.parse().map_err(corrupt)?,
        )
        .with_verbose_logging(self.verbose_logging);
        let timestamp = DateTime::from_timestamp_nanos(self.analyzed_at_ns);
        let resources: ResourceCollection = serde_json::from_str(&self.resources_json)?;
        let metadata: PageMetadata = serde_json::from_str(&self.metadata_json)?;

        Ok(AnalysisResult {
            url: self.url,
            timestamp,
            options,
            duration: u64::try_from(self.duration_ms).unwrap_or_default(),
            resources,
            metadata,
        })
    }
}

/// Exact epoch nanoseconds, for values that are read back as timestamps.
fn to_nanos(instant: DateTime<Utc>) -> Result<i64, Error> {
    instant
        .timestamp_nanos_opt()
        .ok_or_else(|| Error::InvalidInput(format!("timestamp {instant} is outside the storable range")))
}

/// Epoch nanoseconds for comparison bounds, pinned to the `i64` extremes
/// outside the representable range.
fn to_nanos_bound(instant: DateTime<Utc>) -> i64 {
    match instant.timestamp_nanos_opt() {
        Some(ns) => ns,
        None if instant.timestamp() < 0 => i64::MIN,
        None => i64::MAX,
    }
}

#[async_trait]
impl ResultStore for CacheDb {
    async fn find_valid(
        &self, key: &CacheKey, ttl: Duration, now: DateTime<Utc>,
    ) -> Result<Option<AnalysisResult>, Error> {
        let key_hash = key.digest();
        let url = key.url.clone();
        let oldest_valid_ns = to_nanos_bound(now).saturating_sub(ttl.num_nanoseconds().unwrap_or(i64::MAX));

        let row = self
            .conn
            .call(move |conn| -> Result<Option<StoredRow>, Error> {
                let mut stmt = conn.prepare(&format!(
                    "SELECT {SELECT_COLUMNS} FROM analysis_results
                     WHERE key_hash = ?1 AND url = ?2 AND analyzed_at_ns > ?3
                     ORDER BY analyzed_at_ns DESC, id DESC
                     LIMIT 1"
                ))?;

                let result = stmt.query_row(params![key_hash, url, oldest_valid_ns], StoredRow::from_row);

                match result {
                    Ok(row) => Ok(Some(row)),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(Error::from)?;

        row.map(StoredRow::decode).transpose()
    }

    async fn save(&self, result: &AnalysisResult, ttl: Duration) -> Result<(), Error> {
        let key_hash = result.cache_key().digest();
        let url = result.url.clone();
        let interaction_level = result.options.interaction_level().as_str();
        let device_type = result.options.device_type().as_str();
        let verbose_logging = result.options.verbose_logging() as i32;
        let analyzed_at_ns = to_nanos(result.timestamp)?;
        let expires_at = result
            .timestamp
            .checked_add_signed(ttl)
            .ok_or_else(|| Error::InvalidInput(format!("expiration of {} overflows", result.timestamp)))?;
        let expires_at_ns = to_nanos_bound(expires_at);
        let duration_ms = i64::try_from(result.duration).unwrap_or(i64::MAX);
        let resource_count = i64::try_from(result.resources.resource_count).unwrap_or(i64::MAX);
        let resources_json = serde_json::to_string(&result.resources)?;
        let metadata_json = serde_json::to_string(&result.metadata)?;
        let created_at = Utc::now().to_rfc3339();

        self.conn
            .call(move |conn| -> Result<(), Error> {
                conn.execute(
                    "INSERT INTO analysis_results (
                        key_hash, url, interaction_level, device_type, verbose_logging,
                        analyzed_at_ns, expires_at_ns, duration_ms, resource_count,
                        resources_json, metadata_json, created_at
                    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
                    params![
                        key_hash,
                        url,
                        interaction_level,
                        device_type,
                        verbose_logging,
                        analyzed_at_ns,
                        expires_at_ns,
                        duration_ms,
                        resource_count,
                        resources_json,
                        metadata_json,
                        created_at,
                    ],
                )?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    async fn stats(&self) -> Result<StoreStats, Error> {
        self.conn
            .call(|conn| -> Result<StoreStats, Error> {
                let (total, unique): (i64, i64) = conn.query_row(
                    "SELECT COUNT(*), COUNT(DISTINCT url) FROM analysis_results",
                    [],
                    |row| Ok((row.get(0)?, row.get(1)?)),
                )?;
                Ok(StoreStats { total_analyses: total as u64, unique_urls: unique as u64 })
            })
            .await
            .map_err(Error::from)
    }

    async fn delete_older_than(&self, cutoff: DateTime<Utc>) -> Result<u64, Error> {
        let cutoff_ns = to_nanos_bound(cutoff);
        self.conn
            .call(move |conn| -> Result<u64, Error> {
                let count = conn.execute("DELETE FROM analysis_results WHERE analyzed_at_ns < ?1", params![cutoff_ns])?;
                Ok(count as u64)
            })
            .await
            .map_err(Error::from)
    }

    async fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64, Error> {
        let now_ns = to_nanos_bound(now);
        self.conn
            .call(move |conn| -> Result<u64, Error> {
                let count = conn.execute("DELETE FROM analysis_results WHERE expires_at_ns <= ?1", params![now_ns])?;
                Ok(count as u64)
            })
            .await
            .map_err(Error::from)
    }

    async fn find_recent(&self, url: &str, limit: usize) -> Result<Vec<AnalysisResult>, Error> {
        let url = url.to_string();
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);

        let rows = self
            .conn
            .call(move |conn| -> Result<Vec<StoredRow>, Error> {
                let mut stmt = conn.prepare(&format!(
                    "SELECT {SELECT_COLUMNS} FROM analysis_results
                     WHERE url = ?1
                     ORDER BY analyzed_at_ns DESC, id DESC
                     LIMIT ?2"
                ))?;
                let rows = stmt
                    .query_map(params![url, limit], StoredRow::from_row)?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(rows)
            })
            .await
            .map_err(Error::from)?;

        rows.into_iter().map(StoredRow::decode).collect()
    }

    async fn set_expiration(&self, key: &CacheKey, expires_at: DateTime<Utc>) -> Result<bool, Error> {
        let key_hash = key.digest();
        let url = key.url.clone();
        let expires_at_ns = to_nanos_bound(expires_at);

        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let updated = conn.execute(
                    "UPDATE analysis_results SET expires_at_ns = ?1
                     WHERE id = (
                        SELECT id FROM analysis_results
                        WHERE key_hash = ?2 AND url = ?3
                        ORDER BY analyzed_at_ns DESC, id DESC
                        LIMIT 1
                     )",
                    params![expires_at_ns, key_hash, url],
                )?;
                Ok(updated > 0)
            })
            .await
            .map_err(Error::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{DeviceType, InteractionLevel, PageSize};
    use chrono::TimeZone;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 5, 4, 9, 0, 0).unwrap()
    }

    fn make_result(url: &str, level: InteractionLevel, device: DeviceType, at: DateTime<Utc>) -> AnalysisResult {
        AnalysisResult {
            url: url.to_string(),
            timestamp: at,
            options: AnalysisOptions::new(level, device),
            duration: 1_500,
            resources: ResourceCollection { resource_count: 17, ..Default::default() },
            metadata: PageMetadata {
                page_title: Some("Test".to_string()),
                has_frames: false,
                has_service_worker: false,
                page_size: PageSize { width: 1920, height: 3000 },
            },
        }
    }

    fn key(url: &str, level: InteractionLevel, device: DeviceType) -> CacheKey {
        CacheKey::new(url, &AnalysisOptions::new(level, device))
    }

    #[tokio::test]
    async fn test_save_and_find_valid() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let result = make_result("https://example.com", InteractionLevel::Default, DeviceType::Desktop, t0());
        db.save(&result, Duration::hours(1)).await.unwrap();

        let found = db
            .find_valid(
                &key("https://example.com", InteractionLevel::Default, DeviceType::Desktop),
                Duration::hours(1),
                t0() + Duration::minutes(10),
            )
            .await
            .unwrap();
        assert_eq!(found, Some(result));
    }

    #[tokio::test]
    async fn test_find_valid_boundary_is_exclusive() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let k = key("https://example.com", InteractionLevel::Minimal, DeviceType::Desktop);
        db.save(
            &make_result("https://example.com", InteractionLevel::Minimal, DeviceType::Desktop, t0()),
            Duration::hours(2),
        )
        .await
        .unwrap();

        let just_before = t0() + Duration::hours(2) - Duration::milliseconds(1);
        assert!(db.find_valid(&k, Duration::hours(2), just_before).await.unwrap().is_some());
        assert!(db.find_valid(&k, Duration::hours(2), t0() + Duration::hours(2)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_sub_millisecond_timestamp_round_trips() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let k = key("https://example.com", InteractionLevel::Default, DeviceType::Desktop);
        let at = t0() + Duration::microseconds(600) + Duration::nanoseconds(7);
        let result = make_result("https://example.com", InteractionLevel::Default, DeviceType::Desktop, at);
        db.save(&result, Duration::hours(1)).await.unwrap();

        let almost_expired = at + Duration::hours(1) - Duration::microseconds(300);
        let found = db.find_valid(&k, Duration::hours(1), almost_expired).await.unwrap();
        assert_eq!(found.as_ref().map(|r| r.timestamp), Some(at));
        assert_eq!(found, Some(result));

        let expired = at + Duration::hours(1);
        assert!(db.find_valid(&k, Duration::hours(1), expired).await.unwrap().is_none());
        assert_eq!(db.delete_expired(expired - Duration::nanoseconds(1)).await.unwrap(), 0);
        assert_eq!(db.delete_expired(expired).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_unrepresentable_instants_do_not_panic() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let far_future = make_result(
            "https://example.com",
            InteractionLevel::Default,
            DeviceType::Desktop,
            DateTime::<Utc>::MAX_UTC,
        );
        assert!(matches!(db.save(&far_future, Duration::hours(1)).await, Err(Error::InvalidInput(_))));

        db.save(
            &make_result("https://example.com", InteractionLevel::Default, DeviceType::Desktop, t0()),
            Duration::hours(1),
        )
        .await
        .unwrap();
        assert_eq!(db.delete_older_than(DateTime::<Utc>::MIN_UTC).await.unwrap(), 0);
        assert_eq!(db.delete_expired(DateTime::<Utc>::MIN_UTC).await.unwrap(), 0);
        assert_eq!(db.delete_older_than(DateTime::<Utc>::MAX_UTC).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_find_valid_returns_freshest() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let older = make_result("https://example.com", InteractionLevel::Default, DeviceType::Mobile, t0());
        let mut newer = older.clone();
        newer.timestamp = t0() + Duration::minutes(5);
        newer.resources.resource_count = 99;

        db.save(&newer, Duration::hours(1)).await.unwrap();
        db.save(&older, Duration::hours(1)).await.unwrap();

        let found = db
            .find_valid(
                &key("https://example.com", InteractionLevel::Default, DeviceType::Mobile),
                Duration::hours(1),
                t0() + Duration::minutes(6),
            )
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.resources.resource_count, 99);
    }

    #[tokio::test]
    async fn test_find_valid_respects_key() {
        let db = CacheDb::open_in_memory().await.unwrap();
        db.save(
            &make_result("https://example.com", InteractionLevel::Default, DeviceType::Desktop, t0()),
            Duration::hours(1),
        )
        .await
        .unwrap();

        let now = t0() + Duration::minutes(1);
        for k in [
            key("https://example.com", InteractionLevel::Default, DeviceType::Mobile),
            key("https://example.com", InteractionLevel::Thorough, DeviceType::Desktop),
            key("https://example.org", InteractionLevel::Default, DeviceType::Desktop),
        ] {
            assert!(db.find_valid(&k, Duration::hours(1), now).await.unwrap().is_none(), "{k:?}");
        }
    }

    #[tokio::test]
    async fn test_history_is_kept() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let result = make_result("https://example.com", InteractionLevel::Default, DeviceType::Desktop, t0());
        db.save(&result, Duration::hours(1)).await.unwrap();
        db.save(&result, Duration::hours(1)).await.unwrap();

        let stats = db.stats().await.unwrap();
        assert_eq!(stats, StoreStats { total_analyses: 2, unique_urls: 1 });
    }

    #[tokio::test]
    async fn test_delete_older_than() {
        let db = CacheDb::open_in_memory().await.unwrap();
        db.save(
            &make_result("https://a.example", InteractionLevel::Default, DeviceType::Desktop, t0() - Duration::days(40)),
            Duration::hours(1),
        )
        .await
        .unwrap();
        db.save(
            &make_result("https://b.example", InteractionLevel::Default, DeviceType::Desktop, t0()),
            Duration::hours(1),
        )
        .await
        .unwrap();

        let deleted = db.delete_older_than(t0() - Duration::days(30)).await.unwrap();
        assert_eq!(deleted, 1);
        assert_eq!(db.stats().await.unwrap(), StoreStats { total_analyses: 1, unique_urls: 1 });
    }

    #[tokio::test]
    async fn test_delete_expired() {
        let db = CacheDb::open_in_memory().await.unwrap();
        db.save(
            &make_result("https://a.example", InteractionLevel::Default, DeviceType::Desktop, t0()),
            Duration::hours(1),
        )
        .await
        .unwrap();
        db.save(
            &make_result("https://b.example", InteractionLevel::Default, DeviceType::Desktop, t0()),
            Duration::hours(3),
        )
        .await
        .unwrap();

        assert_eq!(db.delete_expired(t0() + Duration::minutes(59)).await.unwrap(), 0);
        assert_eq!(db.delete_expired(t0() + Duration::hours(1)).await.unwrap(), 1);
        assert_eq!(db.stats().await.unwrap().total_analyses, 1);
    }

    #[tokio::test]
    async fn test_find_recent_orders_and_limits() {
        let db = CacheDb::open_in_memory().await.unwrap();
        for (i, device) in [DeviceType::Desktop, DeviceType::Mobile, DeviceType::Desktop].into_iter().enumerate() {
            let at = t0() + Duration::minutes(i as i64);
            db.save(&make_result("https://example.com", InteractionLevel::Default, device, at), Duration::hours(1))
                .await
                .unwrap();
        }
        db.save(
            &make_result("https://other.example", InteractionLevel::Default, DeviceType::Desktop, t0()),
            Duration::hours(1),
        )
        .await
        .unwrap();

        let recent = db.find_recent("https://example.com", 2).await.unwrap();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].timestamp, t0() + Duration::minutes(2));
        assert_eq!(recent[1].timestamp, t0() + Duration::minutes(1));
        assert_eq!(recent[1].options.device_type(), DeviceType::Mobile);

        let all = db.find_recent("https://example.com", 10).await.unwrap();
        assert_eq!(all.len(), 3);
    }

    #[tokio::test]
    async fn test_set_expiration_targets_freshest_entry() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let k = key("https://example.com", InteractionLevel::Default, DeviceType::Desktop);
        assert!(!db.set_expiration(&k, t0()).await.unwrap());

        let older = make_result("https://example.com", InteractionLevel::Default, DeviceType::Desktop, t0());
        let mut newer = older.clone();
        newer.timestamp = t0() + Duration::minutes(1);
        db.save(&older, Duration::hours(24)).await.unwrap();
        db.save(&newer, Duration::hours(24)).await.unwrap();

        assert!(db.set_expiration(&k, t0() + Duration::minutes(2)).await.unwrap());

        let deleted = db.delete_expired(t0() + Duration::minutes(5)).await.unwrap();
        assert_eq!(deleted, 1);
        let remaining = db.find_recent("https://example.com", 10).await.unwrap();
        assert_eq!(remaining, vec![older]);
    }

    #[tokio::test]
    async fn test_corrupt_row_is_reported() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let result = make_result("https://example.com", InteractionLevel::Default, DeviceType::Desktop, t0());
        db.save(&result, Duration::hours(1)).await.unwrap();
        db.conn
            .call(|conn| conn.execute("UPDATE analysis_results SET interaction_level = 'turbo'", []))
            .await
            .unwrap();

        let err = db.find_recent("https://example.com", 1).await.unwrap_err();
        assert!(matches!(err, Error::CorruptEntry(_)));
    }
}
