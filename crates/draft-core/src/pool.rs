//! Context pooling.
//!
//! Every request needs a [`Context`]. Allocating one per request churns the
//! allocator under load, so the dispatcher borrows them from a
//! [`ContextPool`] instead. Borrowed contexts come back through the
//! [`PooledContext`] guard, including when a handler panics.
//!
//! ```
//! use draft_core::ContextPool;
//!
//! let pool = ContextPool::new();
//! {
//!     let mut ctx = pool.acquire();
//!     assert_eq!(ctx.index(), 0);
//!     ctx.abort();
//! }
//! assert_eq!(pool.idle(), 1);
//!
//! // The recycled context starts clean.
//! let ctx = pool.acquire();
//! assert!(!ctx.is_aborted());
//! assert_eq!(pool.allocated(), 1);
//! ```

use std::ops::{Deref, DerefMut};
use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::Mutex;

use crate::context::Context;

/// Default number of idle contexts a pool keeps.
pub const DEFAULT_POOL_CAPACITY: usize = 1024;

/// Free list of reusable contexts.
#[derive(Debug)]
pub struct ContextPool {
    free: Mutex<Vec<Box<Context>>>,
    capacity: usize,
    allocated: AtomicUsize,
}

impl Default for ContextPool {
    fn default() -> Self {
        Self::new()
    }
}

impl ContextPool {
    /// Creates a pool keeping up to [`DEFAULT_POOL_CAPACITY`] idle contexts.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_POOL_CAPACITY)
    }

    /// Creates a pool keeping up to `capacity` idle contexts.
    ///
    /// Contexts released while the pool is full are dropped.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            free: Mutex::new(Vec::new()),
            capacity,
            allocated: AtomicUsize::new(0),
        }
    }

    /// Borrows a freshly reset context.
    pub fn acquire(&self) -> PooledContext<'_> {
        let recycled = self.free.lock().pop();
        let mut ctx = recycled.unwrap_or_else(|| {
            self.allocated.fetch_add(1, Ordering::Relaxed);
            Box::new(Context::new())
        });
        ctx.reset();
        PooledContext {
            pool: self,
            ctx: Some(ctx),
        }
    }

    fn release(&self, ctx: Box<Context>) {
        let mut free = self.free.lock();
        if free.len() < self.capacity {
            free.push(ctx);
        } else {
            drop(free);
            self.allocated.fetch_sub(1, Ordering::Relaxed);
        }
    }

    /// Returns how many contexts currently exist, borrowed or idle.
    #[must_use]
    pub fn allocated(&self) -> usize {
        self.allocated.load(Ordering::Relaxed)
    }

    /// Returns how many contexts are waiting in the pool.
    #[must_use]
    pub fn idle(&self) -> usize {
        self.free.lock().len()
    }

    /// Returns the maximum number of idle contexts kept.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

/// A context borrowed from a [`ContextPool`], returned on drop.
#[derive(Debug)]
pub struct PooledContext<'p> {
    pool: &'p ContextPool,
    ctx: Option<Box<Context>>,
}

impl Deref for PooledContext<'_> {
    type Target = Context;

    fn deref(&self) -> &Context {
        match &self.ctx {
            Some(ctx) => ctx.as_ref(),
            None => unreachable!("pooled context used after release"),
        }
    }
}

impl DerefMut for PooledContext<'_> {
    fn deref_mut(&mut self) -> &mut Context {
        match &mut self.ctx {
            Some(ctx) => ctx.as_mut(),
            None => unreachable!("pooled context used after release"),
        }
    }
}

impl Drop for PooledContext<'_> {
    fn drop(&mut self) {
        if let Some(ctx) = self.ctx.take() {
            self.pool.release(ctx);
        }
    }
}
