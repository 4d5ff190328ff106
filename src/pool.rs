//! Reusable work buffers for the encoder's proxy and the decoder's bitmap.
//! Pooling keeps steady-state hashing allocation-free beyond the final
//! returned `Vec<u8>`/`Vec<u8>` pixel buffer, at the cost of one
//! `parking_lot::Mutex` lock per acquire/release, which is cheap next to a
//! DCT pass.
//!
//! [`Pool`] is a plain value type, not a hidden global: callers that need
//! isolation (tests in particular) construct their own with [`Pool::new`].
//! [`crate::encode::encode`] and [`crate::decode::decode`] reach for
//! [`default_pool`] only as a convenience default.

use alloc::vec;
use alloc::vec::Vec;
use once_cell::sync::Lazy;
use parking_lot::Mutex;

const PROXY_FLOATS: usize = crate::MAX_PROXY_SIDE * crate::MAX_PROXY_SIDE * 4;
const DECODED_FLOATS: usize = crate::MAX_DECODED_SIDE * crate::MAX_DECODED_SIDE * 4;

/// Maximum number of idle buffers a [`Pool`] keeps around; anything released
/// beyond this is simply dropped rather than grown without bound.
const MAX_IDLE: usize = 8;

/// A scratch buffer sized for the worst-case proxy and decoded bitmap.
/// Fields are crate-private: callers only ever see a `Box<WorkBuffer>`
/// borrowed for the duration of one encode or decode.
pub struct WorkBuffer {
    pub(crate) proxy: Vec<f32>,
    pub(crate) decoded: Vec<f32>,
}

impl WorkBuffer {
    fn new() -> Self {
        WorkBuffer {
            proxy: vec![0.0; PROXY_FLOATS],
            decoded: vec![0.0; DECODED_FLOATS],
        }
    }

    /// Zeroes the region the proxy builder is about to write. A reused
    /// buffer from a larger previous image otherwise carries stale samples
    /// past the new image's smaller extent.
    pub(crate) fn clear_proxy(&mut self, len: usize) {
        self.proxy[..len].iter_mut().for_each(|v| *v = 0.0);
    }
}

/// A pool of [`WorkBuffer`]s behind a single mutex-protected stack.
pub struct Pool {
    idle: Mutex<Vec<alloc::boxed::Box<WorkBuffer>>>,
}

impl Pool {
    pub const fn new() -> Self {
        Pool {
            idle: Mutex::new(Vec::new()),
        }
    }

    /// Pops an idle buffer or allocates a fresh one.
    pub fn acquire(&self) -> alloc::boxed::Box<WorkBuffer> {
        if let Some(buf) = self.idle.lock().pop() {
            log::trace!("pool: reused work buffer");
            buf
        } else {
            log::trace!("pool: allocated new work buffer");
            alloc::boxed::Box::new(WorkBuffer::new())
        }
    }

    /// Returns a buffer to the pool, unless it is already at capacity.
    pub fn release(&self, buf: alloc::boxed::Box<WorkBuffer>) {
        let mut idle = self.idle.lock();
        if idle.len() < MAX_IDLE {
            idle.push(buf);
        } else {
            log::trace!("pool: dropping buffer, idle list at capacity");
        }
    }
}

impl Default for Pool {
    fn default() -> Self {
        Pool::new()
    }
}

static DEFAULT_POOL: Lazy<Pool> = Lazy::new(Pool::new);

/// The pool used by the allocation-convenience [`crate::encode::encode`] and
/// [`crate::decode::decode`] entry points.
pub fn default_pool() -> &'static Pool {
    &DEFAULT_POOL
}
