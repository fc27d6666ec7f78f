//! Per-key deduplication of in-flight loads.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use futures::future::{BoxFuture, FutureExt, Shared, WeakShared};
use gatehouse_core::Result;
use parking_lot::{Mutex, MutexGuard};

use super::CacheEntry;

type LoadFuture = BoxFuture<'static, Result<CacheEntry>>;

/// A load shared by every caller that asked for the same key while it ran.
///
/// The underlying future is driven by whichever waiter polls it, so a
/// waiter going away does not cancel the load for the others. Once the
/// last waiter is gone the load is dropped, aborting its network call.
pub(crate) type SharedLoad = Shared<LoadFuture>;

struct Flight {
    id: u64,
    load: WeakShared<LoadFuture>,
}

/// Table of loads currently in flight, keyed by routing key.
///
/// Only waiters own a load; the table holds it weakly.
#[derive(Clone, Default)]
pub(crate) struct Flights {
    inner: Arc<Mutex<HashMap<String, Flight>>>,
    next_id: Arc<AtomicU64>,
}

impl Flights {
    /// Locks the table. Callers must not hold the guard across an await.
    pub(crate) fn lock(&self) -> FlightTable<'_> {
        FlightTable {
            guard: self.inner.lock(),
            flights: self,
        }
    }

    /// Removes flight `id` for `key`. A newer flight for the same key is
    /// left alone.
    fn finish(&self, key: &str, id: u64) {
        let mut table = self.inner.lock();
        if table.get(key).is_some_and(|flight| flight.id == id) {
            table.remove(key);
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.inner.lock().len()
    }
}

pub(crate) struct FlightTable<'a> {
    guard: MutexGuard<'a, HashMap<String, Flight>>,
    flights: &'a Flights,
}

impl FlightTable<'_> {
    /// Returns the flight still running for `key`, if any.
    pub(crate) fn joinable(&self, key: &str) -> Option<SharedLoad> {
        self.guard.get(key).and_then(|flight| flight.load.upgrade())
    }

    /// Reserves a flight for `key`. The returned guard must move into the
    /// load future and clears the entry when that future completes or is
    /// dropped.
    pub(crate) fn reserve(&mut self, key: &str) -> FlightGuard {
        FlightGuard {
            flights: self.flights.clone(),
            key: key.to_string(),
            id: self.flights.next_id.fetch_add(1, Ordering::Relaxed),
        }
    }

    /// Registers the load reserved by `guard` and returns a handle to it.
    pub(crate) fn start(&mut self, key: &str, id: u64, load: LoadFuture) -> SharedLoad {
        let shared = load.shared();
        if let Some(weak) = shared.downgrade() {
            self.guard.insert(key.to_string(), Flight { id, load: weak });
        }
        shared
    }
}

/// Clears its flight from the table on drop.
pub(crate) struct FlightGuard {
    flights: Flights,
    key: String,
    id: u64,
}

impl FlightGuard {
    pub(crate) fn id(&self) -> u64 {
        self.id
    }
}

impl Drop for FlightGuard {
    fn drop(&mut self) {
        self.flights.finish(&self.key, self.id);
    }
}
