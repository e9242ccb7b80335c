//! Fixed-capacity accumulation of batch items.
//!
//! One [`BatchingService`] exists per item kind. It owns an ordered,
//! fixed-length sequence of slots; empty slots hold the item kind's
//! default value. Capacity tracks the batch-size notification stream, a
//! full batch is reported as an edge signal on the overflowing add, and
//! the shutdown notification detaches the service from the bus.

use std::cell::RefCell;
use std::rc::Rc;

use lumen_core::bus::{BatchSizeChange, EventBus, Subscription};

use crate::batch_item::BatchItem;
use crate::error::RenderError;
use crate::render_item::RenderItem;

/// Outcome of [`BatchingService::add`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchAdd {
    /// The item landed in an empty slot.
    Queued,
    /// No empty slot existed: the item overwrote slot 0 and the batch is
    /// due for an immediate flush. This is the ready-for-rendering signal;
    /// it fires exactly once, on the overflowing add itself.
    Overflowed,
}

/// Accumulates items of one kind until the orchestrator flushes them.
pub struct BatchingService<T> {
    items: Vec<T>,
    subs: Vec<Subscription>,
}

impl<T: BatchItem> BatchingService<T> {
    /// Creates a service with `initial_size` slots, subscribed to the
    /// bus's batch-size and shutdown streams. Size notifications for other
    /// kinds are ignored; a size of zero fails the publish as malformed.
    pub fn new(bus: &EventBus, initial_size: u32) -> Rc<RefCell<Self>> {
        let service = Rc::new(RefCell::new(Self {
            items: vec![T::default(); initial_size as usize],
            subs: Vec::new(),
        }));

        let resize_sub = bus.batch_size.subscribe({
            let service = Rc::clone(&service);
            move |change: &BatchSizeChange| {
                if change.kind != T::KIND {
                    return Ok(());
                }
                if change.size == 0 {
                    return Err(RenderError::InvalidNotification {
                        stream: "batch-size-changed",
                        reason: format!("batch size of 0 for {} batch", change.kind),
                    }
                    .into());
                }
                service.borrow_mut().set_batch_size(change.size);
                Ok(())
            }
        });
        let shutdown_sub = bus.shutdown.subscribe({
            let service = Rc::clone(&service);
            move |_: &()| {
                service.borrow_mut().detach();
                Ok(())
            }
        });
        service.borrow_mut().subs.extend([resize_sub, shutdown_sub]);

        service
    }

    /// Inserts `item` into the first empty slot.
    ///
    /// When no empty slot exists the item overwrites slot 0, silently
    /// dropping the previous occupant, and [`BatchAdd::Overflowed`] tells
    /// the caller a flush is due. The batch never grows and never blocks.
    pub fn add(&mut self, item: T) -> BatchAdd {
        match self.items.iter().position(|slot| slot.is_empty()) {
            Some(index) => {
                self.items[index] = item;
                BatchAdd::Queued
            }
            None => {
                tracing::warn!(kind = %T::KIND, "batch overflow, slot 0 overwritten");
                // a zero-capacity batch has no slot 0; the item is dropped
                // and the overflow still signals
                if let Some(slot) = self.items.first_mut() {
                    *slot = item;
                }
                BatchAdd::Overflowed
            }
        }
    }

    /// Resets every occupied slot back to empty. A no-op when nothing is
    /// occupied; slots are reused, not reallocated.
    pub fn empty_batch(&mut self) {
        for slot in &mut self.items {
            if !slot.is_empty() {
                *slot = T::default();
            }
        }
    }

    /// Reallocates the slots to length `size`, discarding prior contents.
    pub fn set_batch_size(&mut self, size: u32) {
        tracing::debug!(kind = %T::KIND, size, "batch size changed");
        self.items = vec![T::default(); size as usize];
    }

    /// Drops the bus subscriptions; later notifications no longer reach
    /// this service. Idempotent.
    fn detach(&mut self) {
        self.subs.clear();
    }

    /// The slot sequence, empty slots included.
    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn batch_size(&self) -> u32 {
        self.items.len() as u32
    }

    /// Number of occupied slots.
    pub fn occupied(&self) -> usize {
        self.items.iter().filter(|slot| !slot.is_empty()).count()
    }

    /// Occupied slots in slot order, paired with their layers for the
    /// flush-time sort.
    pub fn snapshot(&self) -> Vec<RenderItem<T>> {
        self.items
            .iter()
            .filter(|slot| !slot.is_empty())
            .map(|item| RenderItem::new(item.layer(), *item))
            .collect()
    }
}
