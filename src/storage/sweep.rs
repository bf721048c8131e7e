//! Asynchronous Expiration Sweeps
//!
//! Every mutating store operation schedules a best-effort background sweep
//! that walks the map and physically removes expired entries together with
//! their trie nodes. Correctness never depends on a sweep having run: the
//! read paths shadow expired entries on their own, so the sweep exists only
//! to reclaim memory and keep the raw count close to the live count.
//!
//! ## Coalescing
//!
//! Scheduling is cheap and mutators call it unconditionally, so sweeps are
//! coalesced: an atomic flag keeps at most one sweep task in flight, and a
//! request arriving while one is running is simply dropped. Whatever it
//! would have found is picked up by the next mutation's sweep or by lazy
//! expiry in the meantime.
//!
//! Sweeps run on the ambient tokio runtime. When no runtime is present (the
//! store used synchronously, e.g. from a plain unit test) scheduling is a
//! no-op and lazy expiry carries the contract by itself.

use std::sync::atomic::Ordering;
use std::sync::Arc;

use tracing::debug;

use super::engine::Shared;

/// Schedules one background sweep over the store, unless one is already in
/// flight or there is no runtime to put it on.
pub(crate) fn schedule(shared: &Arc<Shared>) {
    let Ok(runtime) = tokio::runtime::Handle::try_current() else {
        return;
    };

    if shared.sweep_in_flight.swap(true, Ordering::AcqRel) {
        return;
    }

    let shared = Arc::clone(shared);
    runtime.spawn(async move {
        let removed = shared.remove_expired();
        shared.sweep_in_flight.store(false, Ordering::Release);

        if removed > 0 {
            debug!(removed, "swept expired entries");
        }
    });
}
