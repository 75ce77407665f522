/*
 * Lock-free ring buffer for buffered logging.
 *
 * Fixed-size circular buffer, atomic head/tail, single producer/single
 * consumer, overwrite-on-overflow. Safe to call from interrupt context:
 * no heap allocation, no mutex.
 */

use core::sync::atomic::{AtomicUsize, Ordering};

const BUFFER_SIZE: usize = 32 * 1024;

/// Ring buffer for log messages awaiting a flush to the sink.
pub struct RingBuffer {
    buffer: [u8; BUFFER_SIZE],
    head: AtomicUsize,
    tail: AtomicUsize,
}

impl RingBuffer {
    pub const fn new() -> Self {
        Self {
            buffer: [0; BUFFER_SIZE],
            head: AtomicUsize::new(0),
            tail: AtomicUsize::new(0),
        }
    }

    /// Writes `data` into the buffer, overwriting the oldest bytes if there
    /// isn't enough free space. Returns the number of bytes written.
    pub fn write(&mut self, data: &str) -> usize {
        let bytes = data.as_bytes();
        let len = bytes.len();
        if len == 0 {
            return 0;
        }

        let head = self.head.load(Ordering::Relaxed);
        let tail = self.tail.load(Ordering::Relaxed);
        let available = if head >= tail {
            BUFFER_SIZE - (head - tail)
        } else {
            tail - head
        };

        if len > available {
            let new_tail = (head + len - available) % BUFFER_SIZE;
            self.tail.store(new_tail, Ordering::Relaxed);
        }

        let mut written = 0;
        for &byte in bytes {
            let idx = (head + written) % BUFFER_SIZE;
            unsafe {
                let ptr = self.buffer.as_ptr() as *mut u8;
                *ptr.add(idx) = byte;
            }
            written += 1;
        }

        let new_head = (head + written) % BUFFER_SIZE;
        self.head.store(new_head, Ordering::Release);
        written
    }

    /// Reads up to `dest.len()` bytes out of the buffer. Returns the number
    /// of bytes actually read.
    pub fn read(&mut self, dest: &mut [u8]) -> usize {
        let tail = self.tail.load(Ordering::Relaxed);
        let head = self.head.load(Ordering::Acquire);

        let available = if head >= tail {
            head - tail
        } else {
            BUFFER_SIZE - tail + head
        };

        if available == 0 {
            return 0;
        }

        let to_read = available.min(dest.len());
        for (i, slot) in dest.iter_mut().take(to_read).enumerate() {
            let idx = (tail + i) % BUFFER_SIZE;
            *slot = unsafe { *self.buffer.as_ptr().add(idx) };
        }

        let new_tail = (tail + to_read) % BUFFER_SIZE;
        self.tail.store(new_tail, Ordering::Release);
        to_read
    }

    pub fn is_empty(&self) -> bool {
        self.head.load(Ordering::Relaxed) == self.tail.load(Ordering::Relaxed)
    }

    pub fn len(&self) -> usize {
        let head = self.head.load(Ordering::Relaxed);
        let tail = self.tail.load(Ordering::Relaxed);
        if head >= tail {
            head - tail
        } else {
            BUFFER_SIZE - tail + head
        }
    }
}

impl Default for RingBuffer {
    fn default() -> Self {
        Self::new()
    }
}

unsafe impl Sync for RingBuffer {}
