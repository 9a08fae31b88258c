//! Default generators and entry point functions.

use std::sync;

use crate::{Generator, Uuid};
use inner::GlobalGenInner;

/// Returns the lock handle of process-wide global generator, creating one if none exists.
fn lock_global_gen() -> sync::MutexGuard<'static, GlobalGenInner> {
    static G: sync::OnceLock<sync::Mutex<GlobalGenInner>> = sync::OnceLock::new();
    G.get_or_init(Default::default)
        .lock()
        .unwrap_or_else(sync::PoisonError::into_inner)
}

/// Generates a UUIDv1 object.
///
/// This function employs a global generator with a random node id and no persisted state, and
/// guarantees process-wide uniqueness of the UUIDs it returns. On Unix, this function replaces
/// the generator when the process ID changes (i.e., upon process forks) so that parent and child
/// do not share a node id and clock sequence. Use [`Generator`] with a
/// [`Saver`](crate::Saver) for uniqueness across restarts.
///
/// # Examples
///
/// ```rust
/// let uuid = rfc4122::uuid1();
/// println!("{}", uuid); // e.g., "c232ab00-9414-11ec-b3c8-9f6bdeced846"
///
/// let uuid_string: String = rfc4122::uuid1().to_string();
/// ```
pub fn uuid1() -> Uuid {
    lock_global_gen().get_mut().generate()
}

mod inner {
    use crate::Generator;

    /// A thin wrapper to reset the state when the process ID changes (i.e., upon Unix forks).
    #[derive(Debug)]
    pub struct GlobalGenInner {
        #[cfg(unix)]
        pid: u32,
        generator: Generator,
    }

    impl Default for GlobalGenInner {
        fn default() -> Self {
            Self {
                #[cfg(unix)]
                pid: std::process::id(),
                generator: Generator::builder()
                    .build()
                    .expect("rfc4122: could not initialize global generator"),
            }
        }
    }

    impl GlobalGenInner {
        /// Returns a reference to the inner [`Generator`] instance, replacing the generator on
        /// Unix if the process ID has changed.
        pub fn get_mut(&mut self) -> &Generator {
            #[cfg(unix)]
            if self.pid != std::process::id() {
                *self = Default::default();
            }
            &self.generator
        }
    }
}
