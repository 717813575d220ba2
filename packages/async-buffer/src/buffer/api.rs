// exposed API of buffers

use self::future::*;
use super::{
    core::Shared,
    dispatch,
    error::*,
    intake,
    shutdown,
};
use crate::util::AbortOnDrop;
use std::{
    fmt::{self, Debug, Formatter},
    sync::Arc,
};
use tokio::{
    runtime::Handle,
    sync::{mpsc, Mutex as AsyncMutex},
};
use tracing::Instrument;

pub use super::cancel::CancelToken;


// label used in tracing output for buffers built without one.
const DEFAULT_LABEL: &str = "buffer";


// ==== the exposed API ====


/// Create a buffer on the current tokio runtime
///
/// Shorthand for `Builder::new().build()`. Errors if not called from within a tokio runtime.
pub fn buffer<T: Send + 'static>() -> Result<(Buffer<T>, CancelToken), NoRuntimeError> {
    Builder::new().build()
}

/// Configuration for creating a [`Buffer`]
#[derive(Debug, Clone, Default)]
pub struct Builder {
    handle: Option<Handle>,
    label: Option<Arc<str>>,
}

impl Builder {
    /// Construct with default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the runtime to spawn the buffer's worker tasks on
    ///
    /// Defaults to the runtime `build` is called from. The runtime must be multi-threaded, or
    /// otherwise kept running, for the workers to make progress while consumers block.
    pub fn handle(mut self, handle: Handle) -> Self {
        self.handle = Some(handle);
        self
    }

    /// Set the label identifying the buffer in tracing output
    pub fn label(mut self, label: &str) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Create the buffer and its cancel token, and start its worker tasks
    pub fn build<T: Send + 'static>(self) -> Result<(Buffer<T>, CancelToken), NoRuntimeError> {
        let handle = match self.handle {
            Some(handle) => handle,
            None => Handle::try_current().map_err(|_| NoRuntimeError)?,
        };
        let label = self.label.unwrap_or_else(|| DEFAULT_LABEL.into());

        let (shared, intake_recv) = Shared::new();
        let shared = Arc::new(shared);
        let (signal_send, signal_recv) = mpsc::channel(1);
        let (output_send, output_recv) = mpsc::channel(1);
        let cancel = CancelToken::new();

        let span = debug_span!("buffer", label = %label);
        let workers = [
            AbortOnDrop::spawn_on(
                &handle,
                intake::run(Arc::clone(&shared), intake_recv, signal_send)
                    .instrument(debug_span!(parent: &span, "intake")),
            ),
            AbortOnDrop::spawn_on(
                &handle,
                dispatch::run(Arc::clone(&shared), signal_recv, output_send)
                    .instrument(debug_span!(parent: &span, "dispatch")),
            ),
            AbortOnDrop::spawn_on(
                &handle,
                shutdown::run(Arc::clone(&shared), cancel.clone())
                    .instrument(debug_span!(parent: &span, "shutdown")),
            ),
        ];
        debug!(parent: &span, "buffer created");

        let buffer = Buffer(Arc::new(Inner {
            shared,
            output: Arc::new(AsyncMutex::new(output_recv)),
            label,
            workers,
        }));
        Ok((buffer, cancel))
    }
}


/// Handle to an asynchronous decoupling buffer
///
/// An unbounded FIFO queue between any number of producers and consumers. Cloning produces
/// another handle to the same buffer. The buffer's worker tasks are aborted when the last handle
/// is dropped, discarding anything still in it.
///
/// Values put by a single producer are received in the order they were put. No ordering is
/// guaranteed between values put concurrently by different producers.
pub struct Buffer<T>(Arc<Inner<T>>);

struct Inner<T> {
    shared: Arc<Shared<T>>,
    // receiver half of the output channel. consumers take turns receiving from it.
    output: Arc<AsyncMutex<mpsc::Receiver<T>>>,
    label: Arc<str>,
    // intake, dispatch, shutdown.
    workers: [AbortOnDrop; 3],
}

impl<T: Send + 'static> Buffer<T> {
    /// Put a value into the buffer
    ///
    /// Never blocks. Errors, handing the value back, if the buffer has closed.
    pub fn put(&self, value: T) -> Result<(), PutError<T>> {
        self.0.shared.admit(value).map_err(|(cause, value)| {
            trace!(label = %self.0.label, %cause, "put refused");
            PutError { value, cause }
        })
    }

    /// Create a future to get the next value from the buffer
    ///
    /// Resolves to `Ok(None)` once the buffer has closed and every value put into it has been
    /// received. See the API of [`GetFut`], as it is not only a future, but also provides
    /// additional methods for blocking on it or trying to resolve it immediately.
    pub fn get(&self) -> GetFut<T> {
        let output = Arc::clone(&self.0.output);
        let shared = Arc::clone(&self.0.shared);
        GetFut::new(async move {
            let elem = output.lock().await.recv().await;
            match elem {
                Some(elem) => {
                    shared.delivered();
                    Ok(Some(elem))
                }
                // the buffer is marked closed before the intake input is closed, so by the time
                // the output channel closes because of that, this is already true.
                None if shared.is_closed() => Ok(None),
                None => Err(RuntimeShutdownError),
            }
        })
    }

    /// Convert into a stream of the buffer's values, ending once the buffer has closed
    #[cfg(feature = "futures")]
    pub fn into_stream(self) -> impl futures::Stream<Item = Result<T, RuntimeShutdownError>> + Send {
        futures::stream::unfold(Some(self), |buffer| async move {
            let Some(buffer) = buffer else { return None };
            match buffer.get().await {
                Ok(Some(elem)) => Some((Ok(elem), Some(buffer))),
                Ok(None) => None,
                Err(e) => Some((Err(e), None)),
            }
        })
    }
}

impl<T> Buffer<T> {
    /// Whether the buffer has closed
    ///
    /// True only once the buffer was cancelled and every value put into it was received.
    pub fn is_closed(&self) -> bool {
        self.0.shared.is_closed()
    }

    /// Wait until the buffer has closed
    pub async fn closed(&self) {
        let mut closed = self.0.shared.subscribe_closed();
        // the sender cannot be dropped while borrowed by self
        let _ = closed.wait_for(|&c| c).await;
    }

    /// Number of values which were put and not yet received
    pub fn outstanding(&self) -> usize {
        self.0.shared.outstanding()
    }

    /// Label identifying the buffer in tracing output
    pub fn label(&self) -> &str {
        &self.0.label
    }

    // whether all worker tasks have exited.
    #[cfg(test)]
    pub(crate) fn workers_finished(&self) -> bool {
        self.0.workers.iter().all(AbortOnDrop::is_finished)
    }

    #[cfg(test)]
    pub(crate) fn dispatch_iters(&self) -> u64 {
        self.0.shared.dispatch_iters()
    }
}

impl<T> Clone for Buffer<T> {
    fn clone(&self) -> Self {
        Buffer(Arc::clone(&self.0))
    }
}

impl<T> Debug for Buffer<T> {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        f.debug_struct("Buffer")
            .field("label", &self.label())
            .field("outstanding", &self.outstanding())
            .field("stored", &self.0.shared.store.len())
            .field("closed", &self.is_closed())
            .field("workers_running", &self.0.workers.iter().filter(|w| !w.is_finished()).count())
            .finish()
    }
}


// future types for buffers.
pub(crate) mod future {
    use super::*;
    use crate::buffer::polling::{poll, Timeout};
    use std::{
        future::Future,
        pin::Pin,
        task::{ready, Context, Poll},
        time::{Duration, Instant},
    };

    type BoxGet<T> = Pin<Box<dyn Future<Output = Result<Option<T>, RuntimeShutdownError>> + Send>>;

    /// Future for getting a value from a [`Buffer`]
    ///
    /// Resolves to `Ok(None)` to represent the closed state: the buffer was cancelled and every
    /// value put into it has been received. Resolves to an error only if the runtime running the
    /// buffer's workers shut down before the buffer closed.
    ///
    /// A value is not removed from the buffer until this future resolves. Dropping this future
    /// before it resolves abandons the get without losing any value.
    ///
    /// Consumers take turns: while an unresolved get future is waiting for a value, other get
    /// futures for the same buffer wait behind it. Thus, if one polls a get future and then holds
    /// it for an extended period without polling it to completion, it may block other consumers.
    pub struct GetFut<T> {
        // none once resolved.
        fut: Option<BoxGet<T>>,
    }

    impl<T> GetFut<T> {
        pub(super) fn new<F>(fut: F) -> Self
        where
            F: Future<Output = Result<Option<T>, RuntimeShutdownError>> + Send + 'static,
        {
            GetFut { fut: Some(Box::pin(fut)) }
        }

        /// Block until this future resolves
        ///
        /// Calling this method counts as polling this future, and when this method returns, that
        /// counts as this future resolving. This method will panic if this future has already
        /// resolved.
        pub fn block(&mut self) -> Result<Option<T>, RuntimeShutdownError> {
            assert!(!self.is_terminated(), "GetFut.block called after terminated");
            match poll(self, Timeout::Never) {
                Some(result) => result,
                None => unreachable!("poll timed out with Timeout::Never"),
            }
        }

        /// Try to resolve this future immediately without blocking
        ///
        /// Calling this method counts as polling this future, and if this method returns anything
        /// other than [`WouldBlockError`], that counts as this future resolving. This method will
        /// panic if this future has already resolved.
        pub fn try_now(&mut self) -> Result<Option<T>, TryGetError> {
            assert!(!self.is_terminated(), "GetFut.try_now called after terminated");
            map_try_get_result(poll(self, Timeout::NonBlocking))
        }

        /// Block until this future resolves or a timeout elapses
        ///
        /// Calling this method counts as polling this future, and if this method returns anything
        /// other than [`WouldBlockError`], that counts as this future resolving. This method will
        /// panic if this future has already resolved.
        pub fn block_timeout(&mut self, timeout: Duration) -> Result<Option<T>, TryGetError> {
            assert!(!self.is_terminated(), "GetFut.block_timeout called after terminated");
            // a timeout too large to represent never elapses
            let timeout = match Instant::now().checked_add(timeout) {
                Some(deadline) => Timeout::At(deadline),
                None => Timeout::Never,
            };
            map_try_get_result(poll(self, timeout))
        }

        /// Block until this future resolves or the deadline is reached
        ///
        /// Calling this method counts as polling this future, and if this method returns anything
        /// other than [`WouldBlockError`], that counts as this future resolving. This method will
        /// panic if this future has already resolved.
        pub fn block_deadline(&mut self, deadline: Instant) -> Result<Option<T>, TryGetError> {
            assert!(!self.is_terminated(), "GetFut.block_deadline called after terminated");
            map_try_get_result(poll(self, Timeout::At(deadline)))
        }

        /// Whether this future has already resolved
        pub fn is_terminated(&self) -> bool {
            self.fut.is_none()
        }
    }

    fn map_try_get_result<T>(
        result: Option<Result<Option<T>, RuntimeShutdownError>>,
    ) -> Result<Option<T>, TryGetError> {
        match result {
            Some(get_result) => get_result.map_err(TryGetError::from),
            None => Err(WouldBlockError.into()),
        }
    }

    impl<T> Future for GetFut<T> {
        type Output = Result<Option<T>, RuntimeShutdownError>;

        fn poll(self: Pin<&mut Self>, cx: &mut Context) -> Poll<Self::Output> {
            let this = self.get_mut();
            // for implementation of FusedFuture
            let Some(fut) = this.fut.as_mut() else { return Poll::Pending };
            let output = ready!(fut.as_mut().poll(cx));
            this.fut = None;
            Poll::Ready(output)
        }
    }

    #[cfg(feature = "futures")]
    impl<T> futures::future::FusedFuture for GetFut<T> {
        fn is_terminated(&self) -> bool {
            Self::is_terminated(self)
        }
    }

    impl<T> Debug for GetFut<T> {
        fn fmt(&self, f: &mut Formatter) -> fmt::Result {
            f.debug_struct("GetFut")
                .field("terminated", &self.is_terminated())
                .finish()
        }
    }
}


// ==== tests ====
