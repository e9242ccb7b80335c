//! Synchronous in-process publish/subscribe.
//!
//! The rendering core is single-threaded: every notification is delivered
//! by directly invoking the current subscribers before `publish` returns.
//! There is no queuing and no async dispatch. Subscribers hold a
//! [`Subscription`] handle that unsubscribes exactly once, either through
//! [`Subscription::unsubscribe`] or on drop.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

/// Boxed error returned by a notification handler.
pub type DynError = Box<dyn std::error::Error>;

type Handler<T> = Rc<dyn Fn(&T) -> Result<(), DynError>>;

/// A handler failed while a notification was being delivered.
///
/// Dispatch stops at the first failing handler; the error it returned is
/// carried here together with the stream it was delivered on.
#[derive(Debug)]
pub struct BusError {
    /// Well-known identifier of the stream being published.
    pub stream: &'static str,
    /// The error returned by the failing handler.
    pub source: DynError,
}

impl fmt::Display for BusError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "handler failed on '{}': {}", self.stream, self.source)
    }
}

impl std::error::Error for BusError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(self.source.as_ref())
    }
}

impl BusError {
    /// Consumes the error, returning the handler's error.
    pub fn into_inner(self) -> DynError {
        self.source
    }
}

struct ChannelState<T> {
    next_id: u64,
    handlers: Vec<(u64, Handler<T>)>,
}

/// One typed notification stream.
///
/// Handlers registered while a publish is in flight are not invoked for
/// that publish; handlers removed while a publish is in flight are still
/// invoked for it (dispatch iterates a snapshot, which keeps re-entrant
/// unsubscription safe).
pub struct Channel<T> {
    name: &'static str,
    state: Rc<RefCell<ChannelState<T>>>,
}

impl<T: 'static> Channel<T> {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            state: Rc::new(RefCell::new(ChannelState {
                next_id: 0,
                handlers: Vec::new(),
            })),
        }
    }

    /// Well-known identifier of this stream.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Registers `handler` and returns the handle that removes it.
    pub fn subscribe(
        &self,
        handler: impl Fn(&T) -> Result<(), DynError> + 'static,
    ) -> Subscription {
        let id = {
            let mut state = self.state.borrow_mut();
            let id = state.next_id;
            state.next_id += 1;
            state.handlers.push((id, Rc::new(handler)));
            id
        };

        let weak = Rc::downgrade(&self.state);
        Subscription {
            cancel: Some(Box::new(move || {
                Self::remove(&weak, id);
            })),
        }
    }

    /// Delivers `payload` to every current subscriber, in subscription
    /// order, stopping at the first handler error.
    pub fn publish(&self, payload: &T) -> Result<(), BusError> {
        let snapshot: Vec<Handler<T>> = self
            .state
            .borrow()
            .handlers
            .iter()
            .map(|(_, h)| Rc::clone(h))
            .collect();

        for handler in snapshot {
            handler(payload).map_err(|source| BusError {
                stream: self.name,
                source,
            })?;
        }
        Ok(())
    }

    pub fn subscriber_count(&self) -> usize {
        self.state.borrow().handlers.len()
    }

    fn remove(state: &Weak<RefCell<ChannelState<T>>>, id: u64) {
        if let Some(state) = state.upgrade() {
            state.borrow_mut().handlers.retain(|(hid, _)| *hid != id);
        }
    }
}

/// Handle for a registered notification handler.
///
/// Unsubscribing is idempotent: dropping a subscription that was already
/// cancelled with [`unsubscribe`](Self::unsubscribe) is a no-op, and a
/// subscription outliving its channel cancels nothing.
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce()>>,
}

impl Subscription {
    /// Removes the handler from its channel.
    pub fn unsubscribe(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.release();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.cancel.is_some())
            .finish()
    }
}

/// The batch kind a notification or service applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BatchKind {
    Texture,
    Font,
    Rect,
    Line,
}

impl fmt::Display for BatchKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BatchKind::Texture => write!(f, "texture"),
            BatchKind::Font => write!(f, "font"),
            BatchKind::Rect => write!(f, "rect"),
            BatchKind::Line => write!(f, "line"),
        }
    }
}

/// Payload of the batch-size stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchSizeChange {
    /// The new capacity. A size of zero is malformed and rejected by
    /// subscribers.
    pub size: u32,
    /// Which per-kind batch the new capacity applies to.
    pub kind: BatchKind,
}

/// The three well-known notification streams consumed by the rendering
/// core.
///
/// `gl_init` announces that the rendering context exists (or was
/// recreated); `shutdown` is the sole teardown path and must be tolerated
/// repeatedly by every subscriber.
pub struct EventBus {
    pub batch_size: Channel<BatchSizeChange>,
    pub gl_init: Channel<()>,
    pub shutdown: Channel<()>,
}

impl EventBus {
    pub fn new() -> Self {
        Self {
            batch_size: Channel::new("batch-size-changed"),
            gl_init: Channel::new("gl-context-initialized"),
            shutdown: Channel::new("system-shutting-down"),
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
