use std::fmt;
use std::ops::Range;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};
use rayon::{ThreadPool, ThreadPoolBuilder};
use relstore_error::{internal, RelError, Result};
use tracing::{debug, trace};

use crate::config::ExecutionConfig;
use crate::relation::Relation;
use crate::selection::SelectionVector;

/// Owned worker pool for running partitioned joins.
#[derive(Clone)]
pub struct JoinScheduler {
    pool: Arc<ThreadPool>,
    config: ExecutionConfig,
}

impl fmt::Debug for JoinScheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JoinScheduler")
            .field("num_threads", &self.pool.current_num_threads())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl JoinScheduler {
    pub fn try_new(config: ExecutionConfig) -> Result<Self> {
        config.validate()?;

        let thread_pool = ThreadPoolBuilder::new()
            .thread_name(|idx| format!("relstore_join_{idx}"))
            .num_threads(config.num_threads)
            .build()
            .map_err(|e| RelError::ThreadPool(Box::new(e)))?;

        debug!(
            num_threads = config.num_threads,
            partitions = config.partitions,
            "created join scheduler"
        );

        Ok(JoinScheduler {
            pool: Arc::new(thread_pool),
            config,
        })
    }

    pub fn config(&self) -> &ExecutionConfig {
        &self.config
    }

    pub fn num_threads(&self) -> usize {
        self.pool.current_num_threads()
    }
}

/// Split `0..num_rows` into `k` contiguous ranges of at most
/// `ceil(num_rows / k)` rows. Trailing ranges may be empty.
pub fn partition_ranges(num_rows: usize, k: usize) -> Vec<Range<usize>> {
    let k = k.max(1);
    let chunk = num_rows.div_ceil(k);
    (0..k)
        .map(|idx| {
            let start = (idx * chunk).min(num_rows);
            let end = (start + chunk).min(num_rows);
            start..end
        })
        .collect()
}

#[derive(Debug)]
struct CollectorState {
    results: Vec<Option<Result<Relation>>>,
    remaining: usize,
}

/// Slots for partition results, filled in by worker tasks.
#[derive(Debug)]
struct PartitionCollector {
    state: Mutex<CollectorState>,
    done: Condvar,
}

impl PartitionCollector {
    fn new(num_partitions: usize) -> Self {
        PartitionCollector {
            state: Mutex::new(CollectorState {
                results: (0..num_partitions).map(|_| None).collect(),
                remaining: num_partitions,
            }),
            done: Condvar::new(),
        }
    }

    fn report(&self, partition: usize, result: Result<Relation>) {
        let mut state = self.state.lock();
        if let Some(slot) = state.results.get_mut(partition) {
            if slot.replace(result).is_none() {
                state.remaining -= 1;
            }
        }
        if state.remaining == 0 {
            self.done.notify_all();
        }
    }

    /// Block until every partition has reported.
    ///
    /// With a timeout, expiry fails the whole wait. Results that did arrive
    /// are discarded.
    fn wait(&self, timeout: Option<Duration>) -> Result<Vec<Result<Relation>>> {
        let mut state = self.state.lock();
        match timeout {
            None => {
                while state.remaining > 0 {
                    self.done.wait(&mut state);
                }
            }
            Some(timeout) => {
                let deadline = Instant::now() + timeout;
                while state.remaining > 0 {
                    let timed_out = self.done.wait_until(&mut state, deadline).timed_out();
                    if timed_out && state.remaining > 0 {
                        return Err(RelError::Timeout(timeout));
                    }
                }
            }
        }

        state
            .results
            .iter_mut()
            .enumerate()
            .map(|(idx, slot)| {
                slot.take()
                    .ok_or_else(|| internal!("partition {idx} finished without a result"))
            })
            .collect()
    }
}

impl Relation {
    /// Index join with this relation split into partitions that are joined in
    /// parallel on the scheduler's pool.
    ///
    /// `other` should be keyed on `right_col`. Partition results are combined
    /// in partition order, so the output matches [`Relation::index_join`]
    /// row for row.
    ///
    /// When called from a worker of the scheduler's own pool the calling
    /// thread takes part in the join and any configured timeout is ignored.
    pub fn partitioned_join(
        &self,
        other: &Relation,
        left_col: &str,
        right_col: &str,
        scheduler: &JoinScheduler,
    ) -> Result<Relation> {
        // Fail early on bad columns rather than once per partition.
        super::resolve_join_columns(self, other, &[left_col], &[right_col])?;

        let ranges = partition_ranges(self.rows(), scheduler.config.partitions);
        let collector = Arc::new(PartitionCollector::new(ranges.len()));
        let right = Arc::new(other.clone());

        let parts = ranges
            .iter()
            .enumerate()
            .map(|(partition, range)| {
                self.take(
                    &SelectionVector::with_range(range.clone()),
                    format!("{}[{partition}]", self.name),
                )
            })
            .collect::<Result<Vec<_>>>()?;

        if scheduler.pool.current_thread_index().is_some() {
            // Called from one of the pool's own workers. Blocking on the
            // collector could starve the pool, so this thread helps run the
            // partitions and the deadline is not enforced.
            scheduler.pool.in_place_scope(|scope| {
                for (partition, part) in parts.into_iter().enumerate() {
                    let (right, collector) = (&right, &collector);
                    scope.spawn(move |_| {
                        trace!(partition, rows = part.rows(), "joining partition");
                        let result = part.index_join(right, left_col, right_col);
                        collector.report(partition, result);
                    });
                }
            });
        } else {
            for (partition, part) in parts.into_iter().enumerate() {
                let right = right.clone();
                let collector = collector.clone();
                let (left_col, right_col) = (left_col.to_string(), right_col.to_string());

                scheduler.pool.spawn(move || {
                    trace!(partition, rows = part.rows(), "joining partition");
                    let result = part.index_join(&right, &left_col, &right_col);
                    collector.report(partition, result);
                });
            }
        }

        let results = collector.wait(scheduler.config.join_timeout)?;

        let mut merged: Option<Relation> = None;
        for result in results {
            let part = result?;
            merged = Some(match merged {
                Some(acc) => acc.union(&part)?,
                None => part,
            });
        }
        let merged = merged.ok_or_else(|| internal!("partitioned join produced no partitions"))?;

        debug!(
            left = %self.name,
            right = %other.name,
            partitions = ranges.len(),
            rows = merged.rows(),
            "partitioned join"
        );

        Ok(merged.with_name(format!("partitioned_join({},{})", self.name, other.name)))
    }
}
