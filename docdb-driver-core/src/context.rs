//! Immutable request context.
//!
//! A [`Context`] travels with every call to
//! [`Connection::execute`](crate::Connection::execute). It carries an
//! optional deadline and the server-side queue-timeout hints set through
//! [`with_queue_timeout`] and [`with_max_queue_time`]; request construction
//! turns those hints into the queue-time header via
//! [`Context::queue_time_hint`].
//!
//! Deriving a context never touches its parent, so one parent can be shared
//! by any number of derived contexts.
//!
//! # Example
//!
//! ```
//! use docdb_driver_core::{max_queue_time, queue_timeout, with_max_queue_time, with_queue_timeout};
//! use std::time::Duration;
//!
//! let ctx = with_queue_timeout(None, true);
//! let ctx = with_max_queue_time(Some(&ctx), Duration::from_secs(5));
//!
//! assert_eq!(queue_timeout(&ctx), Some(true));
//! assert_eq!(max_queue_time(&ctx), Some(Duration::from_secs(5)));
//! assert_eq!(ctx.queue_time_hint(), Some(Duration::from_secs(5)));
//! ```

use http::Extensions;
use std::sync::Arc;
use std::time::{Duration, Instant};

#[derive(Clone, Copy, Debug)]
struct UseQueueTimeout(bool);

#[derive(Clone, Copy, Debug)]
struct MaxQueueTime(Duration);

/// Immutable, cheaply clonable request context.
#[derive(Clone, Debug, Default)]
pub struct Context {
    inner: Arc<Inner>,
}

#[derive(Clone, Debug, Default)]
struct Inner {
    values: Extensions,
    deadline: Option<Instant>,
}

impl Context {
    /// The empty root context: no values, no deadline.
    pub fn background() -> Self {
        Self::default()
    }

    /// Derive a context that expires at `deadline`.
    ///
    /// An earlier deadline inherited from the parent is kept.
    pub fn with_deadline(parent: Option<&Context>, deadline: Instant) -> Self {
        let mut inner = derive(parent);
        inner.deadline = Some(match inner.deadline {
            Some(existing) if existing < deadline => existing,
            _ => deadline,
        });
        Context {
            inner: Arc::new(inner),
        }
    }

    /// Derive a context that expires `timeout` from now.
    ///
    /// A timeout too large to represent as an instant (such as
    /// [`Duration::MAX`]) adds no deadline; the parent's deadline, if any,
    /// is kept.
    pub fn with_timeout(parent: Option<&Context>, timeout: Duration) -> Self {
        match Instant::now().checked_add(timeout) {
            Some(deadline) => Self::with_deadline(parent, deadline),
            None => Context {
                inner: Arc::new(derive(parent)),
            },
        }
    }

    /// The deadline of this context, if any.
    pub fn deadline(&self) -> Option<Instant> {
        self.inner.deadline
    }

    /// Time left until the deadline, saturating at zero.
    pub fn remaining(&self) -> Option<Duration> {
        self.inner
            .deadline
            .map(|d| d.saturating_duration_since(Instant::now()))
    }

    /// The queue time the server should be asked to honour.
    ///
    /// `None` unless queue timeout was enabled with [`with_queue_timeout`].
    /// An explicit [`with_max_queue_time`] wins over the deadline; without
    /// either, no hint is sent.
    pub fn queue_time_hint(&self) -> Option<Duration> {
        if queue_timeout(self) != Some(true) {
            return None;
        }
        max_queue_time(self).or_else(|| self.remaining())
    }

    fn with_value<T>(parent: Option<&Context>, value: T) -> Self
    where
        T: Clone + Send + Sync + 'static,
    {
        let mut inner = derive(parent);
        inner.values.insert(value);
        Context {
            inner: Arc::new(inner),
        }
    }

    fn value<T: Send + Sync + 'static>(&self) -> Option<&T> {
        self.inner.values.get::<T>()
    }
}

fn derive(parent: Option<&Context>) -> Inner {
    parent
        .map(|p| Inner::clone(&p.inner))
        .unwrap_or_default()
}

/// Enable or disable the server-side queue timeout for calls made with the
/// returned context.
///
/// A missing parent is replaced by [`Context::background`].
pub fn with_queue_timeout(parent: Option<&Context>, enabled: bool) -> Context {
    Context::with_value(parent, UseQueueTimeout(enabled))
}

/// Set the maximum time the server may queue calls made with the returned
/// context.
///
/// When queue timeout is enabled this takes precedence over the context
/// deadline. A missing parent is replaced by [`Context::background`].
pub fn with_max_queue_time(parent: Option<&Context>, duration: Duration) -> Context {
    Context::with_value(parent, MaxQueueTime(duration))
}

/// Read the queue-timeout flag; `None` if it was never set.
pub fn queue_timeout(ctx: &Context) -> Option<bool> {
    ctx.value::<UseQueueTimeout>().map(|v| v.0)
}

/// Read the max queue time; `None` if it was never set.
pub fn max_queue_time(ctx: &Context) -> Option<Duration> {
    ctx.value::<MaxQueueTime>().map(|v| v.0)
}
