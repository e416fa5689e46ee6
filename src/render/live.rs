//! # Live View
//!
//! Keeps a render pass in step with a data store. Any write marks the view
//! stale; the next [`LiveView::current`] re-renders, re-evaluating every
//! visibility condition. The tree is not re-validated.
//!
//! The store listener only holds a weak reference to the view. A view that
//! is dropped without [`LiveView::detach`] is unsubscribed by the next write.

use super::engine::{RenderPass, Renderer};
use crate::binding::{DataStore, ListenerId};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

pub struct LiveView<'a, O> {
    renderer: Renderer<'a, O>,
    stale: Arc<AtomicBool>,
    listener: ListenerId,
    last: Option<RenderPass<O>>,
}

impl<'a, O> LiveView<'a, O> {
    /// Subscribe to the store and start out stale
    pub fn attach(renderer: Renderer<'a, O>, store: &mut DataStore) -> Self {
        let stale = Arc::new(AtomicBool::new(true));
        let flag: Weak<AtomicBool> = Arc::downgrade(&stale);
        let listener = store.subscribe_while(move |_, _| match flag.upgrade() {
            Some(flag) => {
                flag.store(true, Ordering::Release);
                true
            }
            None => false,
        });
        Self {
            renderer,
            stale,
            listener,
            last: None,
        }
    }

    pub fn is_stale(&self) -> bool {
        self.last.is_none() || self.stale.load(Ordering::Acquire)
    }

    /// Latest render pass, re-rendering first if the store changed
    pub fn current(&mut self, store: &DataStore) -> &RenderPass<O> {
        if self.stale.swap(false, Ordering::AcqRel) {
            self.last = None;
        }
        let renderer = &self.renderer;
        self.last.get_or_insert_with(|| renderer.render(store))
    }

    /// Stop listening to the store
    pub fn detach(self, store: &mut DataStore) -> bool {
        store.unsubscribe(self.listener)
    }
}
