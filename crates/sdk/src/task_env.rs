//! Functionality to abstract spawning background tasks.
//!
//! The engine runs on a single thread: tasks are neither `Send` nor
//! expected to run in parallel, only to interleave at await points.

use std::future::Future;

/// Spawn tasks onto the local executor.
pub trait TaskSpawner {
    /// Spawn an async task. It runs to completion in the background.
    fn spawn_async<F>(&self, fut: F)
    where
        F: Future<Output = ()> + 'static;
}

/// An environment to run async tasks on.
pub trait TaskEnvironment {
    /// Task spawner implementation.
    type Spawner: TaskSpawner;

    /// Run the provided async task to completion.
    ///
    /// An async task spawner is provided, to execute
    /// additional work in the background.
    #[allow(async_fn_in_trait)]
    async fn run<M, F, R>(self, main: M) -> R
    where
        M: FnOnce(Self::Spawner) -> F,
        F: Future<Output = R>;
}

#[cfg(not(target_family = "wasm"))]
mod environment {
    use tokio::task::LocalSet;

    use super::*;

    /// Task spawner that uses a [`LocalSet`]. Must be used from within
    /// the [`LocalSet`] it spawns onto.
    #[derive(Debug, Clone, Copy, Default)]
    pub struct LocalSetSpawner;

    impl TaskSpawner for LocalSetSpawner {
        #[inline]
        fn spawn_async<F>(&self, fut: F)
        where
            F: Future<Output = ()> + 'static,
        {
            tokio::task::spawn_local(fut);
        }
    }

    /// A task environment that uses a [`LocalSet`].
    #[derive(Debug, Default)]
    pub struct LocalSetTaskEnvironment;

    impl TaskEnvironment for LocalSetTaskEnvironment {
        type Spawner = LocalSetSpawner;

        async fn run<M, F, R>(self, main: M) -> R
        where
            M: FnOnce(Self::Spawner) -> F,
            F: Future<Output = R>,
        {
            LocalSet::new().run_until(main(LocalSetSpawner)).await
        }
    }
}

#[cfg(not(target_family = "wasm"))]
pub use environment::*;

/// Deterministic spawning for tests
#[cfg(any(test, feature = "testing"))]
pub mod testing {
    use std::cell::RefCell;
    use std::collections::VecDeque;
    use std::fmt;
    use std::rc::Rc;

    use futures::future::{FutureExt, LocalBoxFuture};

    use super::*;

    /// A spawner that only queues tasks. Queued tasks run, in spawn order,
    /// when [`QueuedSpawner::run_pending`] is awaited.
    #[derive(Clone, Default)]
    pub struct QueuedSpawner {
        queue: Rc<RefCell<VecDeque<LocalBoxFuture<'static, ()>>>>,
    }

    impl QueuedSpawner {
        /// Create a spawner with an empty queue
        pub fn new() -> Self {
            Self::default()
        }

        /// The number of queued tasks
        pub fn pending(&self) -> usize {
            self.queue.borrow().len()
        }

        /// Run queued tasks until the queue is empty, including tasks
        /// spawned while running. Returns the number of tasks run.
        pub async fn run_pending(&self) -> usize {
            let mut ran = 0_usize;
            loop {
                let next = self.queue.borrow_mut().pop_front();
                let Some(task) = next else {
                    return ran;
                };
                task.await;
                ran = ran.saturating_add(1);
            }
        }
    }

    impl TaskSpawner for QueuedSpawner {
        fn spawn_async<F>(&self, fut: F)
        where
            F: Future<Output = ()> + 'static,
        {
            self.queue.borrow_mut().push_back(fut.boxed_local());
        }
    }

    impl fmt::Debug for QueuedSpawner {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.debug_struct("QueuedSpawner")
                .field("pending", &self.pending())
                .finish()
        }
    }
}

#[cfg(test)]
mod test {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::testing::QueuedSpawner;
    use super::*;

    #[tokio::test]
    async fn test_queued_spawner_runs_in_order() {
        let spawner = QueuedSpawner::new();
        let log = Rc::new(RefCell::new(vec![]));
        for i in 0..3 {
            let log = Rc::clone(&log);
            let nested = spawner.clone();
            spawner.spawn_async(async move {
                log.borrow_mut().push(i);
                if i == 0 {
                    let log = Rc::clone(&log);
                    nested.spawn_async(async move {
                        log.borrow_mut().push(10);
                    });
                }
            });
        }
        assert_eq!(spawner.pending(), 3);
        assert_eq!(spawner.run_pending().await, 4);
        assert_eq!(*log.borrow(), vec![0, 1, 2, 10]);
        assert_eq!(spawner.pending(), 0);
    }

    #[tokio::test]
    async fn test_local_set_environment() {
        let result = LocalSetTaskEnvironment
            .run(|spawner| async move {
                let (sender, receiver) = futures::channel::oneshot::channel();
                spawner.spawn_async(async move {
                    let _ = sender.send(42);
                });
                receiver.await
            })
            .await;
        assert_eq!(result, Ok(42));
    }
}
