//! The batch processing context: a dedicated worker pool plus reusable
//! scratch buffers.

use std::ops::{Deref, DerefMut};
use std::sync::{Arc, Mutex, PoisonError};

use rayon::{ThreadPool, ThreadPoolBuilder};
use sightline_core::{BatchSettings, Result, SightlineError};

use super::jobs::ProjectionInput;

/// A pool of reusable `Vec` buffers.
///
/// Buffers are handed out as [`ScratchBuffer`] guards and go back to the
/// pool when the guard drops, on every exit path.
#[derive(Debug)]
pub struct ScratchPool<T> {
    free: Arc<Mutex<Vec<Vec<T>>>>,
}

impl<T> Default for ScratchPool<T> {
    fn default() -> Self {
        Self {
            free: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

impl<T> ScratchPool<T> {
    /// Creates an empty pool.
    pub fn new() -> Self {
        Self::default()
    }

    /// Takes an empty buffer from the pool, allocating if none is free.
    pub fn acquire(&self) -> ScratchBuffer<T> {
        let buffer = self
            .free
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop()
            .unwrap_or_default();
        ScratchBuffer {
            buffer,
            home: Arc::clone(&self.free),
        }
    }

    /// Returns the number of buffers waiting in the pool.
    pub fn available(&self) -> usize {
        self.free.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}

/// A pooled buffer; cleared and returned to its pool on drop.
#[derive(Debug)]
pub struct ScratchBuffer<T> {
    buffer: Vec<T>,
    home: Arc<Mutex<Vec<Vec<T>>>>,
}

impl<T> Deref for ScratchBuffer<T> {
    type Target = Vec<T>;

    fn deref(&self) -> &Vec<T> {
        &self.buffer
    }
}

impl<T> DerefMut for ScratchBuffer<T> {
    fn deref_mut(&mut self) -> &mut Vec<T> {
        &mut self.buffer
    }
}

impl<T> Drop for ScratchBuffer<T> {
    fn drop(&mut self) {
        let mut buffer = std::mem::take(&mut self.buffer);
        buffer.clear();
        self.home
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(buffer);
    }
}

/// Worker pool and scratch memory owned by the entity backend.
///
/// Dropping the context joins its worker threads.
#[derive(Debug)]
pub struct BatchContext {
    pool: ThreadPool,
    chunk_size: usize,
    flags: ScratchPool<bool>,
    inputs: ScratchPool<ProjectionInput>,
}

impl BatchContext {
    /// Builds the worker pool.
    pub fn new(settings: &BatchSettings) -> Result<Self> {
        let mut builder =
            ThreadPoolBuilder::new().thread_name(|i| format!("sightline-batch-{i}"));
        if let Some(threads) = settings.worker_threads {
            builder = builder.num_threads(threads);
        }
        let pool = builder
            .build()
            .map_err(|e| SightlineError::BatchContext(e.to_string()))?;
        log::debug!(
            "batch context created: {} workers, chunk size {}",
            pool.current_num_threads(),
            settings.chunk_size
        );
        Ok(Self {
            pool,
            chunk_size: settings.chunk_size.max(1),
            flags: ScratchPool::new(),
            inputs: ScratchPool::new(),
        })
    }

    /// Items per job chunk (at least 1).
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Number of worker threads.
    pub fn worker_threads(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Runs `op` inside the worker pool and waits for it.
    pub fn install<OP, R>(&self, op: OP) -> R
    where
        OP: FnOnce() -> R + Send,
        R: Send,
    {
        self.pool.install(op)
    }

    /// Takes a flag buffer of `len` `false` entries.
    pub fn flags(&self, len: usize) -> ScratchBuffer<bool> {
        let mut buffer = self.flags.acquire();
        buffer.resize(len, false);
        buffer
    }

    /// Takes an empty projection input buffer.
    pub fn inputs(&self) -> ScratchBuffer<ProjectionInput> {
        self.inputs.acquire()
    }

    /// Returns how many flag buffers are idle in the pool.
    pub fn idle_flag_buffers(&self) -> usize {
        self.flags.available()
    }
}
