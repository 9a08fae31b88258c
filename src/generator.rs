//! Time-based (version 1) generator and related types.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::{fmt, time};

use crate::error::Result;
use crate::saver::{Saver, Scheduler, Store, MAX_SEQUENCE};
use crate::Uuid;

/// Number of 100-nanosecond intervals between 1582-10-15 and 1970-01-01.
pub const GREGORIAN_OFFSET: u64 = 0x01b2_1dd2_1381_4000;

/// A trait that defines the minimum system clock interface for [`Generator`].
pub trait TimeSource: Send + Sync {
    /// Returns the current time in 100-nanosecond intervals since 1582-10-15 00:00:00 UTC.
    fn timestamp(&self) -> u64;
}

/// The default [`TimeSource`] that uses [`std::time::SystemTime`].
#[derive(Clone, Copy, Eq, PartialEq, Hash, Debug, Default)]
pub struct StdSystemTime;

impl TimeSource for StdSystemTime {
    fn timestamp(&self) -> u64 {
        let since_unix = time::SystemTime::now()
            .duration_since(time::UNIX_EPOCH)
            .expect("clock may have gone backwards");
        GREGORIAN_OFFSET + (since_unix.as_nanos() / 100) as u64
    }
}

/// Represents a version 1 generator whose state is loaded from, and periodically written back
/// to, a [`Saver`].
///
/// Issuance locks the state for the whole read-decide-write step, so concurrent callers never
/// receive the same timestamp and clock sequence pair:
///
/// 1.  If the clock reading is later than the last recorded timestamp, it is used as is.
/// 2.  Otherwise (the same tick again, or a clock that went backwards) the clock sequence is
///     incremented, wrapping at 14 bits, and the reading is used with it.
///
/// On startup the generator bumps a persisted clock sequence once more, so a process that
/// restarts within the interval of the last save cannot repeat a pair issued before the crash.
///
/// # Examples
///
/// ```rust
/// use rfc4122::{Generator, Version};
/// use std::{sync::Arc, thread};
///
/// let g = Arc::new(Generator::builder().node([0x01, 0x23, 0x45, 0x67, 0x89, 0xab]).build()?);
/// thread::scope(|s| {
///     for i in 0..4 {
///         let g = Arc::clone(&g);
///         s.spawn(move || {
///             for _ in 0..8 {
///                 let id = g.generate();
///                 assert_eq!(id.version(), Version::TimeBased);
///                 println!("{} by thread {}", id, i);
///             }
///         });
///     }
/// });
/// # Ok::<(), rfc4122::Error>(())
/// ```
pub struct Generator<T = StdSystemTime> {
    state: Arc<Mutex<Store>>,
    clock: T,
    saver: Option<Arc<dyn Saver>>,
    /// Held across copy-and-save so scheduled and explicit saves never overlap.
    saving: Arc<Mutex<()>>,
    scheduler: Option<Scheduler>,
}

/// Configures and starts a [`Generator`].
pub struct Builder<T = StdSystemTime> {
    clock: T,
    node: Option<[u8; 6]>,
    saver: Option<Arc<dyn Saver>>,
}

impl Generator {
    /// Returns a builder with the system clock, a random node, and no saver.
    pub fn builder() -> Builder {
        Builder {
            clock: StdSystemTime,
            node: None,
            saver: None,
        }
    }
}

impl<T> Builder<T> {
    /// Replaces the clock.
    pub fn time_source<U: TimeSource>(self, clock: U) -> Builder<U> {
        Builder {
            clock,
            node: self.node,
            saver: self.saver,
        }
    }

    /// Sets the node id embedded in every UUID.
    ///
    /// Without this, the generator keeps the persisted node, or picks a random one with the
    /// multicast bit set when nothing was persisted.
    pub fn node(mut self, node: [u8; 6]) -> Self {
        self.node = Some(node);
        self
    }

    /// Sets the saver that holds the generator state across restarts.
    pub fn saver(mut self, saver: impl Saver + 'static) -> Self {
        self.saver = Some(Arc::new(saver));
        self
    }
}

impl<T: TimeSource> Builder<T> {
    /// Loads the persisted state, arms the saver's schedule if it has one, and returns the
    /// running generator.
    pub fn build(self) -> Result<Generator<T>> {
        let persisted = match &self.saver {
            Some(saver) => saver.read()?,
            None => Store::default(),
        };
        let store = initial_store(persisted, self.node);
        tracing::info!(
            timestamp = store.timestamp,
            sequence = store.sequence,
            restored = !persisted.is_empty(),
            "started time-based generator"
        );

        let state = Arc::new(Mutex::new(store));
        let saving = Arc::new(Mutex::new(()));
        let scheduler = match &self.saver {
            Some(saver) => match saver.schedule() {
                Some(schedule) => {
                    let (saver, state, saving) =
                        (Arc::clone(saver), Arc::clone(&state), Arc::clone(&saving));
                    Some(Scheduler::arm(schedule, move || {
                        persist(&saving, &state, saver.as_ref())
                    })?)
                }
                None => None,
            },
            None => None,
        };

        Ok(Generator {
            state,
            clock: self.clock,
            saver: self.saver,
            saving,
            scheduler,
        })
    }
}

/// Derives the starting state from what was persisted and the configured node.
fn initial_store(persisted: Store, node: Option<[u8; 6]>) -> Store {
    let node = match node {
        Some(node) => node,
        None if !persisted.is_empty() => persisted.node,
        None => random_node(),
    };
    let sequence = if persisted.is_empty() || persisted.node != node {
        rand::random::<u16>() & MAX_SEQUENCE
    } else {
        persisted.sequence.wrapping_add(1) & MAX_SEQUENCE
    };
    Store {
        timestamp: persisted.timestamp,
        sequence,
        node,
    }
}

/// Returns a random node id with the multicast bit set, so it cannot collide with a hardware
/// address.
fn random_node() -> [u8; 6] {
    let mut node: [u8; 6] = rand::random();
    node[0] |= 0x01;
    node
}

fn lock<V>(mutex: &Mutex<V>) -> MutexGuard<'_, V> {
    // a panic elsewhere cannot leave plain data half written
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Copies the state and writes the copy to `saver`, one save at a time.
fn persist(saving: &Mutex<()>, state: &Mutex<Store>, saver: &dyn Saver) -> Result<Store> {
    let _serial = lock(saving);
    let store = *lock(state);
    saver.save(&store)?;
    Ok(store)
}

impl<T: TimeSource> Generator<T> {
    /// Generates a new version 1 UUID.
    pub fn generate(&self) -> Uuid {
        let (timestamp, sequence, node) = {
            let mut store = lock(&self.state);
            let now = self.clock.timestamp();
            if now <= store.timestamp {
                store.sequence = (store.sequence + 1) & MAX_SEQUENCE;
            }
            store.timestamp = now;
            (store.timestamp, store.sequence, store.node)
        };
        Uuid::from_fields_v1(timestamp & ((1 << 60) - 1), sequence, node)
    }

    /// Returns a copy of the current state.
    pub fn snapshot(&self) -> Store {
        *lock(&self.state)
    }

    /// Returns the node id embedded in every UUID.
    pub fn node(&self) -> [u8; 6] {
        lock(&self.state).node
    }

    /// Writes the current state to the saver, if any.
    pub fn save(&self) -> Result<()> {
        match &self.saver {
            Some(saver) => persist(&self.saving, &self.state, saver.as_ref()).map(drop),
            None => Ok(()),
        }
    }

    /// Stops the periodic saves and writes the state one last time.
    pub fn shutdown(mut self) -> Result<()> {
        self.close()
    }

    fn close(&mut self) -> Result<()> {
        if let Some(mut scheduler) = self.scheduler.take() {
            scheduler.disarm();
        }
        match self.saver.take() {
            Some(saver) => {
                let store = persist(&self.saving, &self.state, saver.as_ref())?;
                tracing::info!(
                    timestamp = store.timestamp,
                    sequence = store.sequence,
                    "saved generator state on shutdown"
                );
                Ok(())
            }
            None => Ok(()),
        }
    }
}

impl<T> Drop for Generator<T> {
    fn drop(&mut self) {
        if let Some(mut scheduler) = self.scheduler.take() {
            scheduler.disarm();
        }
        if let Some(saver) = self.saver.take() {
            if let Err(err) = persist(&self.saving, &self.state, saver.as_ref()) {
                tracing::warn!(error = %err, "final state save failed");
            }
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Generator<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Generator")
            .field("state", &self.state)
            .field("clock", &self.clock)
            .field("scheduler", &self.scheduler)
            .finish_non_exhaustive()
    }
}

/// Supports operations as an infinite iterator that produces a new UUID for each call of
/// `next()`.
///
/// # Examples
///
/// ```rust
/// use rfc4122::Generator;
///
/// let g = Generator::builder().build()?;
/// (&g).enumerate()
///     .skip(4)
///     .take(4)
///     .for_each(|(i, e)| println!("[{}] {}", i, e));
/// # Ok::<(), rfc4122::Error>(())
/// ```
impl<T: TimeSource> Iterator for &Generator<T> {
    type Item = Uuid;

    fn next(&mut self) -> Option<Self::Item> {
        Some(self.generate())
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (usize::MAX, None)
    }
}

impl<T: TimeSource> std::iter::FusedIterator for &Generator<T> {}

#[cfg(test)]
mod tests {
    use super::{Generator, StdSystemTime, TimeSource, GREGORIAN_OFFSET};
    use crate::saver::filesystem::FileSystemSaver;
    use crate::saver::tests::MemorySaver;
    use crate::saver::{Saver, Schedule, Store};
    use crate::{Variant, Version};
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::Arc;
    use std::time::Duration;
    use std::{thread, time};

    const NODE: [u8; 6] = [0x01, 0x23, 0x45, 0x67, 0x89, 0xab];

    /// Clock that returns a value set by the test.
    #[derive(Debug)]
    struct ManualClock(AtomicU64);

    impl ManualClock {
        fn set(&self, ts: u64) {
            self.0.store(ts, Ordering::SeqCst);
        }
    }

    impl TimeSource for Arc<ManualClock> {
        fn timestamp(&self) -> u64 {
            self.0.load(Ordering::SeqCst)
        }
    }

    fn manual_clock(ts: u64) -> Arc<ManualClock> {
        Arc::new(ManualClock(AtomicU64::new(ts)))
    }

    /// Generates canonical string
    #[test]
    fn generates_canonical_string() {
        let pattern = r"^[0-9a-f]{8}-[0-9a-f]{4}-1[0-9a-f]{3}-[89ab][0-9a-f]{3}-[0-9a-f]{12}$";
        let re = regex::Regex::new(pattern).unwrap();
        let g = Generator::builder().build().unwrap();
        for e in (&g).take(10_000) {
            assert!(re.is_match(&e.to_string()));
            assert_eq!(e.version(), Version::TimeBased);
            assert_eq!(e.variant(), Variant::Rfc4122);
        }
    }

    /// Encodes up-to-date timestamp
    #[test]
    fn encodes_up_to_date_timestamp() {
        let g = Generator::builder().build().unwrap();
        for _ in 0..10_000 {
            let ts_now = (time::SystemTime::now()
                .duration_since(time::UNIX_EPOCH)
                .expect("clock may have gone backwards")
                .as_millis()) as i64;
            let ts = g.generate().timestamp().unwrap();
            let ms = ((ts - GREGORIAN_OFFSET) / 10_000) as i64;
            assert!((ts_now - ms).abs() < 16);
        }
    }

    /// Embeds configured node and keeps clock sequence on advancing clock
    #[test]
    fn embeds_configured_node_and_keeps_clock_sequence_on_advancing_clock() {
        let clock = manual_clock(1_000);
        let g = Generator::builder()
            .time_source(Arc::clone(&clock))
            .node(NODE)
            .build()
            .unwrap();

        let first = g.generate();
        assert_eq!(first.node(), Some(NODE));
        assert_eq!(first.timestamp(), Some(1_000));
        for ts in 1_001..1_100 {
            clock.set(ts);
            let e = g.generate();
            assert_eq!(e.timestamp(), Some(ts));
            assert_eq!(e.clock_sequence(), first.clock_sequence());
        }
    }

    /// Increments clock sequence within the same tick
    #[test]
    fn increments_clock_sequence_within_the_same_tick() {
        let clock = manual_clock(5_000);
        let g = Generator::builder()
            .time_source(Arc::clone(&clock))
            .node(NODE)
            .build()
            .unwrap();

        let mut prev = g.generate().clock_sequence().unwrap();
        for _ in 0..100 {
            let curr = g.generate().clock_sequence().unwrap();
            assert_eq!(curr, (prev + 1) & 0x3fff);
            prev = curr;
        }
    }

    /// Generates distinct UUIDs with decreasing or constant timestamp
    #[test]
    fn generates_distinct_uuids_with_decreasing_or_constant_timestamp() {
        let ts = 0x0123_4567_89ab_cdefu64 & ((1 << 60) - 1);
        let clock = manual_clock(ts);
        let g = Generator::builder()
            .time_source(Arc::clone(&clock))
            .node(NODE)
            .build()
            .unwrap();

        let mut seen = HashSet::new();
        for i in 0..10_000u64 {
            clock.set(ts - i.min(4_000));
            assert!(seen.insert(g.generate()));
        }
        // clock moves forward again through the range it has already used
        for i in 0..4_000u64 {
            clock.set(ts - 4_000 + i);
            assert!(seen.insert(g.generate()));
        }
    }

    /// Wraps clock sequence at 14 bits
    #[test]
    fn wraps_clock_sequence_at_14_bits() {
        let clock = manual_clock(7);
        let g = Generator::builder()
            .time_source(Arc::clone(&clock))
            .node(NODE)
            .build()
            .unwrap();

        let start = g.generate().clock_sequence().unwrap();
        let mut last = start;
        for _ in 0..0x4000 {
            last = g.generate().clock_sequence().unwrap();
            assert!(last <= 0x3fff);
        }
        assert_eq!(last, start);
    }

    /// Generates no duplicates under multithreading
    #[test]
    fn generates_no_duplicates_under_multithreading() -> Result<(), Box<dyn std::error::Error>> {
        use std::sync::mpsc;

        const THREADS: usize = 16;
        const PER_THREAD: usize = 10_000;

        let g = Arc::new(Generator::builder().node(NODE).build()?);
        let (tx, rx) = mpsc::channel();
        for _ in 0..THREADS {
            let tx = tx.clone();
            let g = Arc::clone(&g);
            thread::Builder::new()
                .spawn(move || {
                    for _ in 0..PER_THREAD {
                        tx.send(g.generate()).unwrap();
                    }
                })
                .map_err(|err| format!("failed to spawn thread: {:?}", err))?;
        }
        drop(tx);

        let mut s = HashSet::new();
        while let Ok(e) = rx.recv() {
            s.insert(e);
        }

        assert_eq!(s.len(), THREADS * PER_THREAD);
        Ok(())
    }

    /// Picks random multicast node when none is configured or persisted
    #[test]
    fn picks_random_multicast_node_when_none_is_configured_or_persisted() {
        let g: Generator<StdSystemTime> = Generator::builder().build().unwrap();
        assert_eq!(g.node()[0] & 0x01, 0x01);
        assert_eq!(g.generate().node(), Some(g.node()));
    }

    /// Bumps persisted clock sequence on restart
    #[test]
    fn bumps_persisted_clock_sequence_on_restart() {
        let saver = Arc::new(MemorySaver::default());
        *saver.last.lock().unwrap() = Store {
            timestamp: 9_000,
            sequence: 0x3fff,
            node: NODE,
        };

        let clock = manual_clock(8_000);
        let g = Generator::builder()
            .time_source(Arc::clone(&clock))
            .saver(Arc::clone(&saver))
            .build()
            .unwrap();
        assert_eq!(g.node(), NODE);
        assert_eq!(g.snapshot().sequence, 0);

        // clock is behind the persisted timestamp, so the sequence moves on again
        let e = g.generate();
        assert_eq!(e.clock_sequence(), Some(1));
        assert_eq!(e.timestamp(), Some(8_000));
    }

    /// Reseeds clock sequence when node changes
    #[test]
    fn reseeds_clock_sequence_when_node_changes() {
        let persisted = Store {
            timestamp: 9_000,
            sequence: 0x0123,
            node: NODE,
        };
        let other = [0x03, 0, 0, 0, 0, 0x01];

        // random reseeding may land on the bumped value; try until it does not
        let reseeded = (0..8).any(|_| {
            let saver = Arc::new(MemorySaver::default());
            *saver.last.lock().unwrap() = persisted;
            let g = Generator::builder().node(other).saver(saver).build().unwrap();
            assert_eq!(g.node(), other);
            g.snapshot().sequence != 0x0124
        });
        assert!(reseeded);
    }

    /// Never reissues UUIDs across a restart
    #[test]
    fn never_reissues_uuids_across_a_restart() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state").join("generator.state");
        let clock = manual_clock(0x1000_0000);
        let mut seen = HashSet::new();

        for _ in 0..3 {
            let saver = FileSystemSaver::new(&path, Duration::from_secs(3600));
            let g = Generator::builder()
                .time_source(Arc::clone(&clock))
                .node(NODE)
                .saver(saver)
                .build()
                .unwrap();
            for _ in 0..100 {
                assert!(seen.insert(g.generate()));
            }
            g.shutdown().unwrap();
        }
        assert_eq!(seen.len(), 300);
    }

    /// Saves on schedule without blocking issuance
    #[test]
    fn saves_on_schedule_without_blocking_issuance() {
        let saver = Arc::new(MemorySaver {
            schedule: Some(Schedule {
                interval: Duration::from_millis(20),
                report: true,
            }),
            ..Default::default()
        });
        let g = Generator::builder()
            .node(NODE)
            .saver(Arc::clone(&saver))
            .build()
            .unwrap();

        let deadline = time::Instant::now() + Duration::from_millis(200);
        let mut last = g.generate();
        while time::Instant::now() < deadline {
            last = g.generate();
        }
        g.shutdown().unwrap();

        assert!(saver.saves.load(Ordering::SeqCst) >= 2);
        let saved = *saver.last.lock().unwrap();
        assert_eq!(saved.timestamp, last.timestamp().unwrap());
        assert_eq!(saved.sequence, last.clock_sequence().unwrap());
        assert_eq!(saved.node, NODE);
    }

    /// Saves once more when dropped
    #[test]
    fn saves_once_more_when_dropped() {
        let saver = Arc::new(MemorySaver::default());
        let g = Generator::builder()
            .node(NODE)
            .saver(Arc::clone(&saver))
            .build()
            .unwrap();
        let e = g.generate();
        g.save().unwrap();
        assert_eq!(saver.saves.load(Ordering::SeqCst), 1);

        drop(g);
        assert_eq!(saver.saves.load(Ordering::SeqCst), 2);
        assert_eq!(saver.last.lock().unwrap().timestamp, e.timestamp().unwrap());
    }

    /// Serializes explicit saves with scheduled ones
    #[test]
    fn serializes_explicit_saves_with_scheduled_ones() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("generator.state");
        let saver = FileSystemSaver::new(&path, Duration::from_millis(1));
        let g = Arc::new(Generator::builder().node(NODE).saver(saver).build().unwrap());

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let g = Arc::clone(&g);
                thread::spawn(move || {
                    for _ in 0..100 {
                        g.generate();
                        g.save().unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let last = g.snapshot();
        Arc::try_unwrap(g).unwrap().shutdown().unwrap();
        let saved = FileSystemSaver::new(&path, Duration::ZERO).read().unwrap();
        assert_eq!(saved, last);
    }

    /// Saves only at shutdown with zero interval
    #[test]
    fn saves_only_at_shutdown_with_zero_interval() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("generator.state");
        let g = Generator::builder()
            .node(NODE)
            .saver(FileSystemSaver::new(&path, Duration::ZERO))
            .build()
            .unwrap();
        let e = g.generate();
        assert_eq!(std::fs::metadata(&path).unwrap().len(), 0);

        g.shutdown().unwrap();
        let saved = FileSystemSaver::new(&path, Duration::ZERO).read().unwrap();
        assert_eq!(saved.timestamp, e.timestamp().unwrap());
        assert_eq!(saved.node, NODE);
    }

    /// Returns error from failed final save
    #[test]
    fn returns_error_from_failed_final_save() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("generator.state");
        let saver = FileSystemSaver::new(&path, Duration::from_secs(3600));
        let g = Generator::builder().node(NODE).saver(saver).build().unwrap();
        g.generate();

        // a directory in place of the target makes the rename fail
        std::fs::remove_file(&path).unwrap();
        std::fs::create_dir(&path).unwrap();
        std::fs::write(path.join("occupant"), b"x").unwrap();
        assert!(g.shutdown().is_err());
    }
}
