//! # Busway Runtime
//!
//! The Store runtime for the Busway composable booking architecture.
//!
//! The [`Store`] manages:
//! 1. State (behind an async `RwLock` for concurrent access)
//! 2. Reducer (business logic)
//! 3. Environment (injected dependencies)
//! 4. Effect execution (with an action feedback loop)
//!
//! Reducers run serially under the state write lock; effects execute in
//! spawned tasks and may feed actions back into the reducer. This gives the
//! single-logical-thread cooperative model the booking core assumes:
//! suspension happens only inside effects, at network-call boundaries.

use busway_core::effect::Effect;
use busway_core::reducer::Reducer;
use futures::future::BoxFuture;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::{RwLock, broadcast};

/// Errors produced by the store runtime.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// The store is shutting down and rejects new actions.
    #[error("store is shutting down")]
    ShutdownInProgress,

    /// Shutdown timed out with effects still running.
    #[error("shutdown timeout: {0} effects still running")]
    ShutdownTimeout(usize),

    /// Timed out waiting for a matching action.
    #[error("timed out waiting for action")]
    Timeout,

    /// The action broadcast channel closed.
    #[error("action channel closed")]
    ChannelClosed,
}

struct StoreInner<S, A, E, R> {
    state: RwLock<S>,
    reducer: R,
    environment: E,
    shutdown: AtomicBool,
    pending_effects: AtomicUsize,
    /// Actions produced by effects are broadcast to observers. This enables
    /// request-response patterns over the action stream.
    action_broadcast: broadcast::Sender<A>,
}

/// The Store - runtime for reducers.
///
/// # Type Parameters
///
/// - `S`: State type
/// - `A`: Action type
/// - `E`: Environment type
/// - `R`: Reducer implementation
///
/// # Example
///
/// ```ignore
/// let store = Store::new(BookingState::default(), BookingReducer::new(), env);
///
/// let settled = store
///     .send_and_wait_for(
///         BookingAction::Pay,
///         |a| matches!(a, BookingAction::BookingSettled { .. }),
///         Duration::from_secs(10),
///     )
///     .await?;
/// ```
pub struct Store<S, A, E, R>
where
    R: Reducer<State = S, Action = A, Environment = E>,
{
    inner: Arc<StoreInner<S, A, E, R>>,
}

impl<S, A, E, R> Clone for Store<S, A, E, R>
where
    R: Reducer<State = S, Action = A, Environment = E>,
{
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S, A, E, R> Store<S, A, E, R>
where
    R: Reducer<State = S, Action = A, Environment = E> + Send + Sync + 'static,
    S: Send + Sync + 'static,
    A: Clone + Send + Sync + 'static,
    E: Send + Sync + 'static,
{
    /// Default capacity of the action broadcast channel.
    const DEFAULT_BROADCAST_CAPACITY: usize = 16;

    /// Create a new store with initial state, reducer, and environment.
    #[must_use]
    pub fn new(initial_state: S, reducer: R, environment: E) -> Self {
        Self::with_broadcast_capacity(
            initial_state,
            reducer,
            environment,
            Self::DEFAULT_BROADCAST_CAPACITY,
        )
    }

    /// Create a new store with a custom action broadcast capacity.
    ///
    /// Increase the capacity if observers frequently lag behind effect
    /// completion (e.g. many concurrent `send_and_wait_for` callers).
    #[must_use]
    pub fn with_broadcast_capacity(
        initial_state: S,
        reducer: R,
        environment: E,
        capacity: usize,
    ) -> Self {
        let (action_broadcast, _) = broadcast::channel(capacity);

        Self {
            inner: Arc::new(StoreInner {
                state: RwLock::new(initial_state),
                reducer,
                environment,
                shutdown: AtomicBool::new(false),
                pending_effects: AtomicUsize::new(0),
                action_broadcast,
            }),
        }
    }

    /// Send an action to the store.
    ///
    /// 1. Acquires the write lock on state
    /// 2. Calls the reducer with `(state, action, environment)`
    /// 3. Starts executing returned effects asynchronously
    ///
    /// `send` returns after starting effect execution, not completion.
    /// Effects may produce more actions (feedback loop); those actions are
    /// broadcast to observers.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::ShutdownInProgress`] if the store is shutting down.
    pub async fn send(&self, action: A) -> Result<(), StoreError> {
        if self.inner.shutdown.load(Ordering::Acquire) {
            return Err(StoreError::ShutdownInProgress);
        }

        let effects = {
            let mut state = self.inner.state.write().await;
            self.inner
                .reducer
                .reduce(&mut state, action, &self.inner.environment)
        };

        for effect in effects {
            self.spawn_effect(effect);
        }

        Ok(())
    }

    /// Send an action and wait for a matching result action.
    ///
    /// Designed for request-response flows: subscribes to the action
    /// broadcast before sending (avoiding a completion race), sends the
    /// initial action, then returns the first effect-produced action
    /// matching the predicate.
    ///
    /// # Errors
    ///
    /// - [`StoreError::Timeout`]: no matching action arrived in time
    /// - [`StoreError::ChannelClosed`]: the store dropped the action channel
    /// - [`StoreError::ShutdownInProgress`]: the store is shutting down
    pub async fn send_and_wait_for<F>(
        &self,
        action: A,
        predicate: F,
        timeout: Duration,
    ) -> Result<A, StoreError>
    where
        F: Fn(&A) -> bool,
    {
        let mut receiver = self.inner.action_broadcast.subscribe();
        self.send(action).await?;

        let wait = async {
            loop {
                match receiver.recv().await {
                    Ok(candidate) if predicate(&candidate) => return Ok(candidate),
                    Ok(_) | Err(broadcast::error::RecvError::Lagged(_)) => {},
                    Err(broadcast::error::RecvError::Closed) => {
                        return Err(StoreError::ChannelClosed);
                    },
                }
            }
        };

        match tokio::time::timeout(timeout, wait).await {
            Ok(result) => result,
            Err(_) => Err(StoreError::Timeout),
        }
    }

    /// Subscribe to actions produced by effects.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<A> {
        self.inner.action_broadcast.subscribe()
    }

    /// Take a clone of the current state.
    pub async fn state(&self) -> S
    where
        S: Clone,
    {
        self.inner.state.read().await.clone()
    }

    /// Read the current state through a closure without cloning.
    pub async fn with_state<F, T>(&self, f: F) -> T
    where
        F: FnOnce(&S) -> T,
    {
        let state = self.inner.state.read().await;
        f(&state)
    }

    /// Number of effects currently executing.
    #[must_use]
    pub fn pending_effects(&self) -> usize {
        self.inner.pending_effects.load(Ordering::Acquire)
    }

    /// Wait until all in-flight effects (and their feedback actions) settle.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Timeout`] if effects are still running when the
    /// timeout expires.
    pub async fn drain(&self, timeout: Duration) -> Result<(), StoreError> {
        let start = tokio::time::Instant::now();
        let poll_interval = Duration::from_millis(10);

        loop {
            if self.pending_effects() == 0 {
                return Ok(());
            }
            if start.elapsed() >= timeout {
                return Err(StoreError::Timeout);
            }
            tokio::time::sleep(poll_interval).await;
        }
    }

    /// Initiate graceful shutdown of the store.
    ///
    /// Sets the shutdown flag (rejecting new actions), then waits for
    /// pending effects to complete.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::ShutdownTimeout`] if the timeout expires before
    /// all pending effects complete.
    pub async fn shutdown(&self, timeout: Duration) -> Result<(), StoreError> {
        tracing::info!("initiating graceful store shutdown");
        self.inner.shutdown.store(true, Ordering::Release);

        match self.drain(timeout).await {
            Ok(()) => {
                tracing::info!("all effects completed, shutdown successful");
                Ok(())
            },
            Err(_) => {
                let pending = self.pending_effects();
                tracing::error!(pending_effects = pending, "shutdown timeout");
                Err(StoreError::ShutdownTimeout(pending))
            },
        }
    }

    fn spawn_effect(&self, effect: Effect<A>) {
        self.inner.pending_effects.fetch_add(1, Ordering::AcqRel);
        let store = self.clone();
        tokio::spawn(async move {
            store.run_effect(effect).await;
            store.inner.pending_effects.fetch_sub(1, Ordering::AcqRel);
        });
    }

    fn run_effect(&self, effect: Effect<A>) -> BoxFuture<'static, ()> {
        let store = self.clone();
        Box::pin(async move {
            match effect {
                Effect::None => {},
                Effect::Parallel(effects) => {
                    let tasks = effects.into_iter().map(|e| store.run_effect(e));
                    futures::future::join_all(tasks).await;
                },
                Effect::Sequential(effects) => {
                    for e in effects {
                        store.run_effect(e).await;
                    }
                },
                Effect::Delay { duration, action } => {
                    tokio::time::sleep(duration).await;
                    store.dispatch(*action).await;
                },
                Effect::Future(fut) => {
                    if let Some(action) = fut.await {
                        store.dispatch(action).await;
                    }
                },
            }
        })
    }

    /// Feed an effect-produced action back into the reducer and broadcast it.
    async fn dispatch(&self, action: A) {
        // A send error only means no observers are subscribed.
        let _ = self.inner.action_broadcast.send(action.clone());

        let effects = {
            let mut state = self.inner.state.write().await;
            self.inner
                .reducer
                .reduce(&mut state, action, &self.inner.environment)
        };

        for effect in effects {
            self.spawn_effect(effect);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use busway_core::{Effects, smallvec};

    #[derive(Debug, Clone, Default, PartialEq)]
    struct CounterState {
        count: i32,
        echoes: u32,
    }

    #[derive(Debug, Clone, PartialEq)]
    enum CounterAction {
        Increment,
        IncrementLater,
        Echoed,
    }

    #[derive(Clone)]
    struct CounterReducer;

    impl Reducer for CounterReducer {
        type State = CounterState;
        type Action = CounterAction;
        type Environment = ();

        fn reduce(
            &self,
            state: &mut Self::State,
            action: Self::Action,
            _env: &Self::Environment,
        ) -> Effects<Self::Action> {
            match action {
                CounterAction::Increment => {
                    state.count += 1;
                    smallvec![]
                },
                CounterAction::IncrementLater => {
                    state.count += 1;
                    smallvec![Effect::future(async { Some(CounterAction::Echoed) })]
                },
                CounterAction::Echoed => {
                    state.echoes += 1;
                    smallvec![]
                },
            }
        }
    }

    #[tokio::test]
    async fn send_reduces_state() {
        let store = Store::new(CounterState::default(), CounterReducer, ());
        store.send(CounterAction::Increment).await.unwrap();
        assert_eq!(store.state().await.count, 1);
    }

    #[tokio::test]
    async fn effect_feedback_reaches_reducer() {
        let store = Store::new(CounterState::default(), CounterReducer, ());
        let echoed = store
            .send_and_wait_for(
                CounterAction::IncrementLater,
                |a| matches!(a, CounterAction::Echoed),
                Duration::from_secs(1),
            )
            .await
            .unwrap();
        assert_eq!(echoed, CounterAction::Echoed);

        store.drain(Duration::from_secs(1)).await.unwrap();
        let state = store.state().await;
        assert_eq!(state.count, 1);
        assert_eq!(state.echoes, 1);
    }

    #[tokio::test]
    async fn shutdown_rejects_new_actions() {
        let store = Store::new(CounterState::default(), CounterReducer, ());
        store.shutdown(Duration::from_secs(1)).await.unwrap();
        assert_eq!(
            store.send(CounterAction::Increment).await,
            Err(StoreError::ShutdownInProgress)
        );
    }

    #[tokio::test]
    async fn with_state_reads_without_cloning() {
        let store = Store::new(CounterState::default(), CounterReducer, ());
        store.send(CounterAction::Increment).await.unwrap();
        let count = store.with_state(|s| s.count).await;
        assert_eq!(count, 1);
    }
}
