//! Ordering key for the event queue.

use netsim_types::{ProcessId, SimTime};

/// Key for events in the queue.
///
/// Events are ordered by time, then by the order in which they were
/// scheduled. Two processes waking at the same time therefore resume in
/// scheduling order, which keeps runs reproducible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EventKey {
    /// When the event fires.
    pub time: SimTime,

    /// Scheduling sequence number, unique per environment.
    pub sequence: u64,

    /// Process to resume.
    pub process: ProcessId,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    #[test]
    fn test_time_then_sequence_ordering() {
        let keys: BTreeSet<EventKey> = [
            EventKey {
                time: 2,
                sequence: 0,
                process: ProcessId(0),
            },
            EventKey {
                time: 1,
                sequence: 5,
                process: ProcessId(1),
            },
            EventKey {
                time: 1,
                sequence: 3,
                process: ProcessId(2),
            },
        ]
        .into_iter()
        .collect();

        let order: Vec<u64> = keys.iter().map(|k| k.process.0).collect();
        assert_eq!(order, vec![2, 1, 0]);
    }
}
