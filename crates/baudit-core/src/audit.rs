//! One audit run: list the bucket, snapshot prior records, plan, verify.
//!
//! Listing and snapshot failures abort the run. Per-object failures do not;
//! they are reported in the `RunReport`.

use anyhow::{Context, Result};
use futures::TryStreamExt;
use std::sync::Arc;

use crate::bucket::{self, InventoryEntry, ObjectStore};
use crate::planner::{self, EligibilityPolicy, Plan, PlanSummary};
use crate::record_db::RecordStore;
use crate::verifier::{RunReport, VerifyPool, VerifySettings};

/// Result of a full audit run.
#[derive(Debug, Clone)]
pub struct AuditOutcome {
    pub plan: PlanSummary,
    pub report: RunReport,
}

/// List the bucket and compute the plan against the current records.
pub async fn build_plan<S, R, P>(storage: &S, records: &R, policy: &P) -> Result<Plan>
where
    S: ObjectStore,
    R: RecordStore,
    P: EligibilityPolicy + ?Sized,
{
    let prior = records
        .all_records()
        .await
        .context("read prior checksum records")?;
    let prior = planner::index_records(prior);
    tracing::info!("fetching keys ({} known)", prior.len());

    let live: Vec<InventoryEntry> = bucket::list_all(storage)
        .try_collect()
        .await
        .context("list bucket")?;

    let plan = planner::plan(live, &prior, policy);
    let s = &plan.summary;
    tracing::info!(
        listed = s.listed,
        new = s.new,
        stale = s.stale,
        unchanged = s.unchanged,
        excluded = s.excluded,
        "have {} tasks",
        plan.tasks.len()
    );
    if s.duplicates > 0 {
        tracing::warn!("listing returned {} duplicate key(s)", s.duplicates);
    }
    Ok(plan)
}

/// Plan and then verify every selected object under `settings`.
pub async fn run_audit<S, R, P>(
    storage: Arc<S>,
    records: Arc<R>,
    policy: &P,
    settings: VerifySettings,
) -> Result<AuditOutcome>
where
    S: ObjectStore,
    R: RecordStore,
    P: EligibilityPolicy + ?Sized,
{
    let plan = build_plan(&*storage, &*records, policy).await?;
    let pool = VerifyPool::new(storage, records, settings);
    let report = pool.run(plan.tasks).await;

    tracing::info!(
        selected = report.selected,
        verified = report.verified,
        dry_run = report.touched,
        failed = report.failed.len(),
        suppressed = report.suppressed_transport_errors,
        "audit run finished"
    );

    Ok(AuditOutcome {
        plan: plan.summary,
        report,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bucket::{ListPage, StorageError};
    use crate::checksum::DigestAlgorithm;
    use crate::planner::WatchPolicy;
    use crate::record_db::ChecksumDb;
    use crate::record_db::ObjectRecord;
    use crate::retry::RetryPolicy;
    use std::collections::BTreeMap;
    use std::sync::Mutex;
    use std::time::Duration;

    /// Two-page bucket whose contents the test can change between runs.
    struct ScriptedBucket {
        objects: Mutex<BTreeMap<String, (f64, Vec<u8>)>>,
        fail_listing: bool,
    }

    impl ScriptedBucket {
        fn new(objects: &[(&str, f64, &str)]) -> Self {
            Self {
                objects: Mutex::new(
                    objects
                        .iter()
                        .map(|(k, t, b)| (k.to_string(), (*t, b.as_bytes().to_vec())))
                        .collect(),
                ),
                fail_listing: false,
            }
        }

        fn touch(&self, key: &str, last_modified: f64, body: &str) {
            self.objects
                .lock()
                .unwrap()
                .insert(key.to_string(), (last_modified, body.as_bytes().to_vec()));
        }
    }

    impl ObjectStore for ScriptedBucket {
        type Body = std::io::Cursor<Vec<u8>>;

        async fn list_page(&self, continuation: Option<String>) -> Result<ListPage, StorageError> {
            if self.fail_listing {
                return Err(StorageError::Http(403));
            }
            let objects = self.objects.lock().unwrap();
            let all: Vec<InventoryEntry> = objects
                .iter()
                .map(|(k, (t, b))| InventoryEntry {
                    key: k.clone(),
                    size: b.len() as u64,
                    last_modified: *t,
                })
                .collect();
            let half = all.len() / 2;
            Ok(match continuation {
                None => ListPage {
                    entries: all[..half].to_vec(),
                    next: Some("second".to_string()),
                },
                Some(_) => ListPage {
                    entries: all[half..].to_vec(),
                    next: None,
                },
            })
        }

        async fn open(&self, key: &str) -> Result<Self::Body, StorageError> {
            let objects = self.objects.lock().unwrap();
            let (_, body) = objects.get(key).ok_or(StorageError::Http(404))?;
            Ok(std::io::Cursor::new(body.clone()))
        }
    }

    fn settings() -> VerifySettings {
        VerifySettings {
            retry: RetryPolicy {
                max_attempts: 2,
                base_delay: Duration::from_millis(1),
                max_delay: Duration::from_millis(5),
            },
            ..VerifySettings::default()
        }
    }

    #[tokio::test]
    async fn second_run_without_changes_selects_nothing() {
        let bucket = Arc::new(ScriptedBucket::new(&[
            ("a/1.txt", 100.0, "one"),
            ("a/2.txt", 200.0, "two"),
            ("b/3.txt", 300.0, "three"),
        ]));
        let db = Arc::new(crate::record_db::db::open_memory().await.unwrap());
        let policy = WatchPolicy::all();

        let first = run_audit(Arc::clone(&bucket), Arc::clone(&db), &policy, settings())
            .await
            .unwrap();
        assert_eq!(first.plan.listed, 3);
        assert_eq!(first.report.verified, 3);

        let second = run_audit(Arc::clone(&bucket), Arc::clone(&db), &policy, settings())
            .await
            .unwrap();
        assert_eq!(second.plan.selected(), 0);
        assert_eq!(second.report.selected, 0);
        assert_eq!(second.plan.unchanged, 3);
    }

    #[tokio::test]
    async fn touched_tracked_object_is_rehashed() {
        let bucket = Arc::new(ScriptedBucket::new(&[
            ("a/1.txt", 100.0, "one"),
            ("z/9.txt", 100.0, "nine"),
        ]));
        let db = Arc::new(crate::record_db::db::open_memory().await.unwrap());
        let policy = WatchPolicy::all().with_prefixes(["a/"]);
        run_audit(Arc::clone(&bucket), Arc::clone(&db), &policy, settings())
            .await
            .unwrap();

        bucket.touch("a/1.txt", 150.0, "one, edited");
        bucket.touch("z/9.txt", 150.0, "nine, edited");
        let out = run_audit(Arc::clone(&bucket), Arc::clone(&db), &policy, settings())
            .await
            .unwrap();
        assert_eq!(out.plan.stale, 1);
        assert_eq!(out.plan.excluded, 1);

        let a = db.get("a/1.txt").await.unwrap().unwrap();
        assert_eq!(a.last_modified, 150.0);
        assert_eq!(
            a.checksum.as_deref(),
            Some(format!("{:x}", md5::compute(b"one, edited")).as_str())
        );
        let z = db.get("z/9.txt").await.unwrap().unwrap();
        assert_eq!(z.last_modified, 100.0);
    }

    #[tokio::test]
    async fn listing_failure_aborts_the_run() {
        let mut bucket = ScriptedBucket::new(&[("a", 1.0, "x")]);
        bucket.fail_listing = true;
        let db = Arc::new(crate::record_db::db::open_memory().await.unwrap());
        let res = run_audit(Arc::new(bucket), db, &WatchPolicy::all(), settings()).await;
        assert!(res.is_err());
    }

    #[tokio::test]
    async fn example_scenario_plan() {
        let bucket = ScriptedBucket::new(&[("a/1.txt", 100.0, "one"), ("a/2.txt", 200.0, "two")]);
        let db: ChecksumDb = crate::record_db::db::open_memory().await.unwrap();
        db.upsert_record(&ObjectRecord {
            key: "a/1.txt".to_string(),
            size: 3,
            last_modified: 100.0,
            checksum: Some("abc".to_string()),
            algorithm: Some(DigestAlgorithm::Md5),
            verified_at: None,
        })
        .await
        .unwrap();
        let plan = build_plan(&bucket, &db, &WatchPolicy::all().with_prefixes(["a/"]))
            .await
            .unwrap();
        let keys: Vec<&str> = plan.tasks.iter().map(|t| t.key.as_str()).collect();
        assert_eq!(keys, vec!["a/2.txt"]);
    }
}
