//! Async update-notification primitives.
//!
//! Two primitives serve the "wait for more data" need of cursors:
//!
//! - [`ManualGate`]: a latch holding a single awaitable token. Any waiter
//!   can await it, any setter can open it, and `reset` swaps in a fresh
//!   token once the current one has completed.
//! - [`AutoSignal`]: a FIFO of pending waiters with an auto-reset
//!   `signaled` bit and per-wait timeout.
//!
//! Both are independent of any particular runtime: [`WaitFuture`] is a
//! plain waker-registering future. `AutoSignal` timeouts use the tokio
//! timer, the one concession to a concrete runtime.
//!
//! # Example
//!
//! ```rust,ignore
//! use seriate::gate::ManualGate;
//!
//! let gate = ManualGate::new();
//! let wait = gate.wait();
//! gate.set();                 // wait now completes with `true`
//! gate.reset();               // next wait() blocks again
//! ```

use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll, Waker};
use std::time::Duration;

use tokio::sync::oneshot;
use tracing::debug;

/// Token state: not yet completed.
const TOKEN_PENDING: u8 = 0;
/// Token state: completed with `true` (new data).
const TOKEN_SET: u8 = 1;
/// Token state: completed with `false` (source sealed).
const TOKEN_CLOSED: u8 = 2;

/// A one-shot completion token shared by all waiters of a gate epoch.
#[derive(Debug, Default)]
struct GateToken {
    state: AtomicU8,
    wakers: Mutex<Vec<Waker>>,
}

impl GateToken {
    fn new() -> Self {
        Self::default()
    }

    fn completed(value: bool) -> Self {
        Self {
            state: AtomicU8::new(if value { TOKEN_SET } else { TOKEN_CLOSED }),
            wakers: Mutex::new(Vec::new()),
        }
    }

    fn is_completed(&self) -> bool {
        self.state.load(Ordering::Acquire) != TOKEN_PENDING
    }

    /// Completes the token, waking every registered waiter.
    ///
    /// Returns true if this call performed the completion; a completed
    /// token never changes value again.
    fn complete(&self, value: bool) -> bool {
        let target = if value { TOKEN_SET } else { TOKEN_CLOSED };
        if self
            .state
            .compare_exchange(TOKEN_PENDING, target, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return false;
        }
        let mut wakers = self.wakers.lock().expect("gate waker list poisoned");
        for waker in wakers.drain(..) {
            waker.wake();
        }
        true
    }

    fn poll_value(&self, cx: &mut Context<'_>) -> Poll<bool> {
        match self.state.load(Ordering::Acquire) {
            TOKEN_SET => return Poll::Ready(true),
            TOKEN_CLOSED => return Poll::Ready(false),
            _ => {}
        }
        {
            let mut wakers = self.wakers.lock().expect("gate waker list poisoned");
            if !wakers.iter().any(|w| w.will_wake(cx.waker())) {
                wakers.push(cx.waker().clone());
            }
        }
        // Recheck: a completion may have drained the list before our push.
        match self.state.load(Ordering::Acquire) {
            TOKEN_SET => Poll::Ready(true),
            TOKEN_CLOSED => Poll::Ready(false),
            _ => Poll::Pending,
        }
    }
}

/// Future returned by [`ManualGate::wait`] and the cursor `updated`
/// accessors.
///
/// Completes with `true` when the gate is set (new data) and `false`
/// when it is closed (the source became permanently readonly).
#[derive(Debug)]
pub struct WaitFuture {
    kind: WaitKind,
}

#[derive(Debug)]
enum WaitKind {
    Ready(bool),
    Token(Arc<GateToken>),
    /// Wait on two sources at once: first `true` wins; `false` only when
    /// both sides have completed `false`.
    Either(Box<(Option<WaitFuture>, Option<WaitFuture>)>),
}

impl WaitFuture {
    /// A future that is already complete.
    pub fn ready(value: bool) -> Self {
        Self {
            kind: WaitKind::Ready(value),
        }
    }

    fn token(token: Arc<GateToken>) -> Self {
        Self {
            kind: WaitKind::Token(token),
        }
    }

    /// Combines two waits: completes `true` as soon as either side does,
    /// `false` only once both sides have completed `false`.
    pub fn either(left: WaitFuture, right: WaitFuture) -> Self {
        Self {
            kind: WaitKind::Either(Box::new((Some(left), Some(right)))),
        }
    }
}

impl Future for WaitFuture {
    type Output = bool;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<bool> {
        let this = self.get_mut();
        match &mut this.kind {
            WaitKind::Ready(value) => Poll::Ready(*value),
            WaitKind::Token(token) => token.poll_value(cx),
            WaitKind::Either(sides) => {
                let (left, right) = sides.as_mut();
                for side in [left, right] {
                    if let Some(fut) = side {
                        match Pin::new(fut).poll(cx) {
                            Poll::Ready(true) => return Poll::Ready(true),
                            Poll::Ready(false) => *side = None,
                            Poll::Pending => {}
                        }
                    }
                }
                if sides.0.is_none() && sides.1.is_none() {
                    Poll::Ready(false)
                } else {
                    Poll::Pending
                }
            }
        }
    }
}

/// A latch holding a single awaitable token.
///
/// `wait` hands out the current token's future; `set` completes it with
/// `true`; `reset` swaps in a fresh token once the current one has
/// completed. `close` completes the token with `false` and pins the gate
/// there: a closed gate never reopens.
#[derive(Debug)]
pub struct ManualGate {
    current: Mutex<Arc<GateToken>>,
    closed: AtomicU8,
}

impl Default for ManualGate {
    fn default() -> Self {
        Self::new()
    }
}

impl ManualGate {
    /// Creates a gate in the unset state.
    pub fn new() -> Self {
        Self {
            current: Mutex::new(Arc::new(GateToken::new())),
            closed: AtomicU8::new(0),
        }
    }

    /// Returns a future of the current token.
    pub fn wait(&self) -> WaitFuture {
        let token = self.current.lock().expect("gate token poisoned").clone();
        WaitFuture::token(token)
    }

    /// Completes the current token with `true`. Idempotent.
    pub fn set(&self) {
        if self.closed.load(Ordering::Acquire) != 0 {
            return;
        }
        let token = self.current.lock().expect("gate token poisoned").clone();
        token.complete(true);
    }

    /// Swaps in a fresh token if the current one has completed.
    ///
    /// The swap happens under the token lock, so a `set` racing with a
    /// `reset` either completes the old token (its waiters wake) or the
    /// new one; an uncompleted token is never replaced.
    pub fn reset(&self) {
        if self.closed.load(Ordering::Acquire) != 0 {
            return;
        }
        let mut current = self.current.lock().expect("gate token poisoned");
        if current.is_completed() {
            *current = Arc::new(GateToken::new());
        }
    }

    /// Completes the current token with `false` and pins the gate closed.
    ///
    /// Every later `wait` resolves `false` immediately; `set` and
    /// `reset` become no-ops.
    pub fn close(&self) {
        self.closed.store(1, Ordering::Release);
        let mut current = self.current.lock().expect("gate token poisoned");
        if !current.complete(false) {
            // Token had already completed `true`; replace it so future
            // waiters observe the closed state.
            *current = Arc::new(GateToken::completed(false));
        }
        debug!("manual gate closed");
    }

    /// Returns true once `close` has been called.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire) != 0
    }
}

/// A cancellation token for async cursor waits.
///
/// Cloned handles share the same cancellation state. The default token
/// never fires.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    inner: Option<Arc<GateToken>>,
}

impl CancelToken {
    /// Creates an armed token that fires when [`CancelToken::cancel`] is
    /// called on any clone.
    pub fn new() -> Self {
        Self {
            inner: Some(Arc::new(GateToken::new())),
        }
    }

    /// A token that can never fire.
    pub fn never() -> Self {
        Self { inner: None }
    }

    /// Fires the token, waking every pending wait.
    pub fn cancel(&self) {
        if let Some(token) = &self.inner {
            token.complete(true);
        }
    }

    /// Returns true once the token has fired.
    pub fn is_cancelled(&self) -> bool {
        self.inner.as_ref().is_some_and(|t| t.is_completed())
    }

    pub(crate) fn poll_cancelled(&self, cx: &mut Context<'_>) -> Poll<()> {
        match &self.inner {
            None => Poll::Pending,
            Some(token) => match token.poll_value(cx) {
                Poll::Ready(_) => Poll::Ready(()),
                Poll::Pending => Poll::Pending,
            },
        }
    }
}

/// A queue-based auto-reset signal with per-wait timeout.
///
/// At most one pending signal is remembered; among waiters whose `wait`
/// calls were serialized, FIFO fairness holds. Exactly one of
/// {signal, timeout} wins per waiter.
#[derive(Debug, Default)]
pub struct AutoSignal {
    inner: Mutex<SignalQueue>,
}

#[derive(Debug, Default)]
struct SignalQueue {
    signaled: bool,
    waiters: VecDeque<oneshot::Sender<bool>>,
}

impl AutoSignal {
    /// Creates a signal with no pending state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits for a signal, up to `timeout`.
    ///
    /// Resolves `true` when a signal is consumed and `false` on timeout.
    /// The waiter is enqueued before this function returns, so call
    /// order determines service order.
    pub fn wait(&self, timeout: Duration) -> impl Future<Output = bool> + Send + 'static {
        let (tx, rx) = oneshot::channel();
        {
            let mut inner = self.inner.lock().expect("signal queue poisoned");
            if inner.signaled {
                inner.signaled = false;
                let _ = tx.send(true);
            } else {
                inner.waiters.push_back(tx);
            }
        }
        async move {
            match tokio::time::timeout(timeout, rx).await {
                Ok(Ok(value)) => value,
                // Sender dropped without sending; treat as no signal.
                Ok(Err(_)) => false,
                Err(_elapsed) => false,
            }
        }
    }

    /// Wakes the oldest live waiter, or remembers one pending signal.
    ///
    /// A waiter whose timeout already won is skipped, so the signal is
    /// never consumed by a completed wait.
    pub fn signal(&self) {
        let mut inner = self.inner.lock().expect("signal queue poisoned");
        while let Some(tx) = inner.waiters.pop_front() {
            if tx.send(true).is_ok() {
                return;
            }
        }
        inner.signaled = true;
    }

    /// Number of waiters currently enqueued, including any whose timeout
    /// has fired but not yet been observed.
    pub fn pending_waiters(&self) -> usize {
        self.inner.lock().expect("signal queue poisoned").waiters.len()
    }
}
