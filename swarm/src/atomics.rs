use crate::task::TaskData;
use metrics_util::AtomicBucket;
use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};
use swarm_core::{RequestEvent, StatsTable};

/// Counters and request events shared between the runner and its users.
pub(crate) struct RunAtomics {
    success: Arc<AtomicU64>,
    error: Arc<AtomicU64>,
    events: Arc<AtomicBucket<RequestEvent>>,
    table: StatsTable,
}

impl RunAtomics {
    pub fn new() -> Self {
        Self {
            success: Arc::new(AtomicU64::new(0)),
            error: Arc::new(AtomicU64::new(0)),
            events: Arc::new(AtomicBucket::new()),
            table: StatsTable::new(),
        }
    }

    pub fn clone_to_task_data(&self) -> TaskData {
        TaskData {
            success: self.success.clone(),
            error: self.error.clone(),
        }
    }

    pub fn events(&self) -> Arc<AtomicBucket<RequestEvent>> {
        self.events.clone()
    }

    /// Move pending request events into the stats table. Returns how many were moved.
    pub fn collect(&mut self) -> usize {
        let table = &mut self.table;
        let mut count = 0;
        self.events.clear_with(|events| {
            count += events.len();
            for event in events {
                table.log(event);
            }
        });
        count
    }

    pub fn table(&self) -> &StatsTable {
        &self.table
    }

    pub fn task_runs(&self) -> u64 {
        self.success.load(Ordering::Relaxed) + self.error.load(Ordering::Relaxed)
    }

    pub fn task_failures(&self) -> u64 {
        self.error.load(Ordering::Relaxed)
    }
}
