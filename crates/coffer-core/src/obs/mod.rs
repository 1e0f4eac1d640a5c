//! Metrics sink boundary.
//!
//! Table logic MUST NOT mutate counter state directly.
//! All instrumentation flows through [`MetricsEvent`] and [`record`].

use std::cell::RefCell;

thread_local! {
    static STATE: RefCell<Counters> = RefCell::new(Counters::default());
}

///
/// MetricsEvent
///

#[derive(Clone, Copy, Debug)]
pub enum MetricsEvent {
    RowsScanned { rows: u64 },
    RowWrite,
    RowRemove,
    ReverseIndexDelta { inserts: u64, removes: u64 },
}

///
/// Counters
///
/// Process-local operation counters, accumulated per thread.
///

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Counters {
    pub rows_scanned: u64,
    pub row_writes: u64,
    pub row_removes: u64,
    pub reverse_index_inserts: u64,
    pub reverse_index_removes: u64,
}

pub(crate) fn record(event: MetricsEvent) {
    STATE.with_borrow_mut(|state| match event {
        MetricsEvent::RowsScanned { rows } => {
            state.rows_scanned = state.rows_scanned.saturating_add(rows);
        }
        MetricsEvent::RowWrite => {
            state.row_writes = state.row_writes.saturating_add(1);
        }
        MetricsEvent::RowRemove => {
            state.row_removes = state.row_removes.saturating_add(1);
        }
        MetricsEvent::ReverseIndexDelta { inserts, removes } => {
            state.reverse_index_inserts = state.reverse_index_inserts.saturating_add(inserts);
            state.reverse_index_removes = state.reverse_index_removes.saturating_add(removes);
        }
    });
}

/// Snapshot the current counters for endpoint/test plumbing.
#[must_use]
pub fn report() -> Counters {
    STATE.with_borrow(|state| *state)
}

/// Reset all counters.
pub fn reset() {
    STATE.with_borrow_mut(|state| *state = Counters::default());
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_accumulate_and_reset() {
        reset();

        record(MetricsEvent::RowsScanned { rows: 3 });
        record(MetricsEvent::RowWrite);
        record(MetricsEvent::RowRemove);
        record(MetricsEvent::ReverseIndexDelta {
            inserts: 2,
            removes: 1,
        });

        let counters = report();
        assert_eq!(counters.rows_scanned, 3);
        assert_eq!(counters.row_writes, 1);
        assert_eq!(counters.row_removes, 1);
        assert_eq!(counters.reverse_index_inserts, 2);
        assert_eq!(counters.reverse_index_removes, 1);

        reset();
        assert_eq!(report(), Counters::default());
    }

    #[test]
    fn counters_saturate_instead_of_wrapping() {
        reset();
        record(MetricsEvent::RowsScanned { rows: u64::MAX });
        record(MetricsEvent::RowsScanned { rows: 1 });
        assert_eq!(report().rows_scanned, u64::MAX);
        reset();
    }
}
