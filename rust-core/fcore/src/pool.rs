//! # Context Pool
//!
//! A bounded free list of [`Ctx`] values. Acquisition hands out a guard that
//! releases the context and returns it to the pool when dropped, so every
//! exit path of a dispatch (including a failing handler) gives it back.

use crate::app::AppInner;
use crate::ctx::Ctx;
use crate::request::Request;
use crate::response::Response;
use std::fmt;
use std::ops::{Deref, DerefMut};
use std::sync::{Mutex, PoisonError, Weak};

/// Concurrency-safe free list of idle contexts
pub struct CtxPool {
    free: Mutex<Vec<Ctx>>,
    capacity: usize,
    app: Weak<AppInner>,
}

impl CtxPool {
    pub(crate) fn new(app: Weak<AppInner>, capacity: usize) -> Self {
        Self {
            free: Mutex::new(Vec::new()),
            capacity,
            app,
        }
    }

    /// Take an idle context (or build one) and bind it to a request
    pub(crate) fn acquire(&self, request: Request, response: Response) -> PooledCtx<'_> {
        let mut ctx = self
            .free
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop()
            .unwrap_or_else(|| Ctx::new(self.app.clone()));
        ctx.reset(request, response);
        PooledCtx { pool: self, ctx }
    }

    fn put(&self, mut ctx: Ctx) {
        ctx.release();
        let mut free = self.free.lock().unwrap_or_else(PoisonError::into_inner);
        if free.len() < self.capacity {
            free.push(ctx);
        }
    }

    /// Number of contexts waiting for reuse
    #[must_use]
    pub fn idle(&self) -> usize {
        self.free.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Maximum number of idle contexts retained
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl fmt::Debug for CtxPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CtxPool")
            .field("idle", &self.idle())
            .field("capacity", &self.capacity)
            .finish_non_exhaustive()
    }
}

/// Exclusive handle on an acquired context
pub struct PooledCtx<'a> {
    pool: &'a CtxPool,
    ctx: Ctx,
}

impl Deref for PooledCtx<'_> {
    type Target = Ctx;

    fn deref(&self) -> &Ctx {
        &self.ctx
    }
}

impl DerefMut for PooledCtx<'_> {
    fn deref_mut(&mut self) -> &mut Ctx {
        &mut self.ctx
    }
}

impl Drop for PooledCtx<'_> {
    fn drop(&mut self) {
        let ctx = std::mem::replace(&mut self.ctx, Ctx::new(Weak::new()));
        self.pool.put(ctx);
    }
}
