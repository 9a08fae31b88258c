//! Persistence of generator state.
//!
//! A [`Generator`](crate::Generator) loads its [`Store`] from a [`Saver`] once at startup. If the
//! saver reports a [`Schedule`], a [`Scheduler`] thread then writes a fresh snapshot of the store
//! every interval, and the generator writes a final one when it shuts down.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crossbeam_channel::{select, Sender};

use crate::error::{Error, Result};

pub mod filesystem;

/// Largest clock sequence value; the sequence field is 14 bits wide.
pub const MAX_SEQUENCE: u16 = (1 << 14) - 1;

/// Generator state that must outlive the process.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default, bincode::Encode, bincode::Decode)]
pub struct Store {
    /// Last timestamp used, in 100-nanosecond intervals since 1582-10-15 00:00:00 UTC.
    pub timestamp: u64,

    /// Clock sequence that went with `timestamp`.
    pub sequence: u16,

    /// Node id embedded in every time-based UUID.
    pub node: [u8; 6],
}

impl Store {
    /// Returns true if nothing has been recorded yet.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Settings of the background save loop.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct Schedule {
    /// Time between two scheduled saves.
    pub interval: Duration,

    /// Whether every scheduled save is logged.
    pub report: bool,
}

/// Storage for a [`Store`].
///
/// Implementations receive snapshots only; they never see the generator's live state.
pub trait Saver: Send + Sync {
    /// Loads the persisted state, or an empty [`Store`] if nothing was persisted yet.
    fn read(&self) -> Result<Store>;

    /// Persists `store`, replacing whatever was persisted before.
    fn save(&self, store: &Store) -> Result<()>;

    /// Returns the schedule for periodic saves, or `None` to save only at shutdown.
    fn schedule(&self) -> Option<Schedule> {
        None
    }
}

impl<S: Saver + ?Sized> Saver for Arc<S> {
    fn read(&self) -> Result<Store> {
        (**self).read()
    }

    fn save(&self, store: &Store) -> Result<()> {
        (**self).save(store)
    }

    fn schedule(&self) -> Option<Schedule> {
        (**self).schedule()
    }
}

impl<S: Saver + ?Sized> Saver for Box<S> {
    fn read(&self) -> Result<Store> {
        (**self).read()
    }

    fn save(&self, store: &Store) -> Result<()> {
        (**self).save(store)
    }

    fn schedule(&self) -> Option<Schedule> {
        (**self).schedule()
    }
}

/// Handle to a running save loop.
///
/// The loop runs on a dedicated thread. Ticks come from a channel that holds at most one pending
/// tick, so a tick that fires while a save is still running is dropped rather than queued, and
/// at most one save is in flight at any time. Failures never leave the thread; they are always
/// logged at warn level, and successful saves are logged at info level when
/// [`Schedule::report`] is set.
///
/// Dropping the handle disarms the loop.
#[derive(Debug)]
pub struct Scheduler {
    stop: Option<Sender<()>>,
    worker: Option<thread::JoinHandle<()>>,
}

impl Scheduler {
    /// Starts running `job` every `schedule.interval`.
    ///
    /// `job` copies the state, saves it, and returns the copy it saved. It runs on the worker
    /// thread under the tracing dispatcher that was current when the loop was armed.
    pub fn arm<F>(schedule: Schedule, job: F) -> Result<Self>
    where
        F: Fn() -> Result<Store> + Send + 'static,
    {
        if schedule.interval.is_zero() {
            return Err(Error::InvalidInterval);
        }

        let (stop, stopped) = crossbeam_channel::bounded::<()>(0);
        let ticker = crossbeam_channel::tick(schedule.interval);
        let dispatch = tracing::dispatcher::get_default(|current| current.clone());
        let worker = thread::Builder::new()
            .name("rfc4122-state-saver".to_owned())
            .spawn(move || {
                tracing::dispatcher::with_default(&dispatch, || loop {
                    let ticked = select! {
                        recv(ticker) -> _ => true,
                        recv(stopped) -> _ => false,
                    };
                    if !ticked {
                        break;
                    }

                    match job() {
                        Ok(store) if schedule.report => tracing::info!(
                            timestamp = store.timestamp,
                            sequence = store.sequence,
                            "saved generator state"
                        ),
                        Ok(_) => {}
                        Err(err) => tracing::warn!(error = %err, "scheduled state save failed"),
                    }
                })
            })
            .map_err(Error::Spawn)?;

        tracing::debug!(interval = ?schedule.interval, "armed state saver");
        Ok(Self {
            stop: Some(stop),
            worker: Some(worker),
        })
    }

    /// Stops future ticks and waits for a save in progress to finish.
    pub fn disarm(&mut self) {
        // disconnecting the channel wakes the worker
        drop(self.stop.take());
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                tracing::error!("state saver thread panicked");
            }
            tracing::debug!("disarmed state saver");
        }
    }

    /// Returns true until [`Scheduler::disarm`] is called.
    pub fn is_armed(&self) -> bool {
        self.worker.is_some()
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        self.disarm();
    }
}
