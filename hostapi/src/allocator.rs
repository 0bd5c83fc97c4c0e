//! Host-side allocator backing the guest's `malloc`/`realloc`/`free`/`gc`.
//!
//! The allocator owns a linear byte region on the host. Addresses handed
//! to the guest are offsets into that region. Address `0` is reserved as
//! null, so the first `HEAP_ALIGN` bytes are never handed out.
//!
//! Layout: blocks below `top` are either live or on the free list; the
//! bytes from `top` to the end of the region are untouched capacity.
//! Adjacent free blocks are always merged, and a free block never ends
//! at `top` (it is folded back into the untouched tail instead).

use std::collections::BTreeMap;

use crate::error::HostError;
use crate::types::{HEAP_ALIGN, NULL_ADDRESS};

/// Round `size` up to the block alignment. Zero-size requests get one block.
fn align_up(size: usize) -> Option<usize> {
    size.max(1)
        .checked_add(HEAP_ALIGN - 1)
        .map(|s| s & !(HEAP_ALIGN - 1))
}

/// First-fit free-list allocator over an owned, growable region.
#[derive(Debug)]
pub struct LinearAllocator {
    region: Vec<u8>,
    initial_size: usize,
    max_size: usize,
    /// End of the allocated-or-freed prefix.
    top: usize,
    /// Live blocks: address -> aligned size.
    live: BTreeMap<usize, usize>,
    /// Free blocks below `top`: address -> size.
    free: BTreeMap<usize, usize>,
}

impl LinearAllocator {
    /// Create an allocator with `initial_size` bytes that may grow to `max_size`.
    ///
    /// `max_size` is capped at `i32::MAX` so every address fits the
    /// guest's `i32` return value.
    pub fn new(initial_size: usize, max_size: usize) -> Self {
        let max_size = max_size.min(i32::MAX as usize).max(HEAP_ALIGN);
        let initial_size = initial_size.clamp(HEAP_ALIGN, max_size);
        Self {
            region: vec![0; initial_size],
            initial_size,
            max_size,
            top: HEAP_ALIGN,
            live: BTreeMap::new(),
            free: BTreeMap::new(),
        }
    }

    /// Reserve `size` bytes. The returned block is zeroed.
    pub fn malloc(&mut self, size: usize) -> Result<u32, HostError> {
        let aligned = align_up(size).ok_or(HostError::AllocationFailed { size })?;
        let addr = match self.take_free_block(aligned) {
            Some(addr) => addr,
            None => self
                .bump(aligned)
                .ok_or(HostError::AllocationFailed { size })?,
        };
        self.region[addr..addr + aligned].fill(0);
        self.live.insert(addr, aligned);
        tracing::trace!(addr, size = aligned, "malloc");
        Ok(addr as u32)
    }

    /// Resize a block, preserving its contents up to the smaller size.
    ///
    /// `realloc(0, n)` is `malloc(n)`; `realloc(a, 0)` frees `a` and
    /// returns null. Grows in place when the following space is free,
    /// otherwise relocates.
    pub fn realloc(&mut self, address: u32, new_size: usize) -> Result<u32, HostError> {
        if address == NULL_ADDRESS {
            return self.malloc(new_size);
        }
        if new_size == 0 {
            self.free(address)?;
            return Ok(NULL_ADDRESS);
        }

        let addr = address as usize;
        let old = *self
            .live
            .get(&addr)
            .ok_or_else(|| HostError::unknown_address(address))?;
        let aligned = align_up(new_size).ok_or(HostError::AllocationFailed { size: new_size })?;

        if aligned <= old {
            if aligned < old {
                self.live.insert(addr, aligned);
                self.release_range(addr + aligned, old - aligned);
            }
            return Ok(address);
        }

        if self.grow_in_place(addr, old, aligned) {
            self.region[addr + old..addr + aligned].fill(0);
            self.live.insert(addr, aligned);
            return Ok(address);
        }

        let new_addr = self.malloc(new_size)? as usize;
        self.region.copy_within(addr..addr + old, new_addr);
        self.free(address)?;
        tracing::trace!(from = addr, to = new_addr, size = aligned, "realloc relocated");
        Ok(new_addr as u32)
    }

    /// Release a block. `free(0)` is a no-op.
    ///
    /// Freeing an address that is not live is an error; the block table
    /// is left untouched.
    pub fn free(&mut self, address: u32) -> Result<(), HostError> {
        if address == NULL_ADDRESS {
            return Ok(());
        }
        let addr = address as usize;
        let size = self
            .live
            .remove(&addr)
            .ok_or_else(|| HostError::unknown_address(address))?;
        self.release_range(addr, size);
        tracing::trace!(addr, size, "free");
        Ok(())
    }

    /// Return unused capacity above `top` to the system, never shrinking
    /// below the initial size. Returns the number of bytes released.
    pub fn gc(&mut self) -> usize {
        let target = self.top.max(self.initial_size);
        let reclaimed = self.region.len().saturating_sub(target);
        if reclaimed > 0 {
            self.region.truncate(target);
            self.region.shrink_to_fit();
        }
        reclaimed
    }

    /// Borrow `len` bytes at `address`. The range must lie inside one live block.
    pub fn read(&self, address: u32, len: usize) -> Result<&[u8], HostError> {
        let (start, end) = self.live_range(address, len)?;
        Ok(&self.region[start..end])
    }

    /// Copy `data` to `address`. The range must lie inside one live block.
    pub fn write(&mut self, address: u32, data: &[u8]) -> Result<(), HostError> {
        let (start, end) = self.live_range(address, data.len())?;
        self.region[start..end].copy_from_slice(data);
        Ok(())
    }

    /// Live blocks as `(address, aligned size)`, in address order.
    pub fn live_blocks(&self) -> impl Iterator<Item = (u32, usize)> + '_ {
        self.live.iter().map(|(&addr, &size)| (addr as u32, size))
    }

    /// Number of live blocks.
    pub fn live_count(&self) -> usize {
        self.live.len()
    }

    /// Current size of the owned region in bytes.
    pub fn region_size(&self) -> usize {
        self.region.len()
    }

    fn live_range(&self, address: u32, len: usize) -> Result<(usize, usize), HostError> {
        let addr = address as usize;
        let (&block, &size) = self
            .live
            .range(..=addr)
            .next_back()
            .ok_or_else(|| HostError::unknown_address(address))?;
        let end = addr
            .checked_add(len)
            .ok_or_else(|| HostError::unknown_address(address))?;
        if end > block + size {
            return Err(HostError::unknown_address(address));
        }
        Ok((addr, end))
    }

    fn take_free_block(&mut self, aligned: usize) -> Option<usize> {
        let (addr, size) = self
            .free
            .iter()
            .find(|(_, &size)| size >= aligned)
            .map(|(&addr, &size)| (addr, size))?;
        self.free.remove(&addr);
        if size > aligned {
            self.free.insert(addr + aligned, size - aligned);
        }
        Some(addr)
    }

    fn bump(&mut self, aligned: usize) -> Option<usize> {
        let addr = self.top;
        let new_top = addr.checked_add(aligned)?;
        self.ensure_capacity(new_top)?;
        self.top = new_top;
        Some(addr)
    }

    /// Grow the region so that `end` is addressable, doubling where possible.
    fn ensure_capacity(&mut self, end: usize) -> Option<()> {
        if end > self.max_size {
            return None;
        }
        if end > self.region.len() {
            let new_len = end
                .max(self.region.len().saturating_mul(2))
                .min(self.max_size);
            self.region.resize(new_len, 0);
        }
        Some(())
    }

    fn grow_in_place(&mut self, addr: usize, old: usize, aligned: usize) -> bool {
        let end = addr + old;
        if end == self.top {
            if self.ensure_capacity(addr + aligned).is_none() {
                return false;
            }
            self.top = addr + aligned;
            return true;
        }
        let extra = aligned - old;
        match self.free.get(&end).copied() {
            Some(next) if next >= extra => {
                self.free.remove(&end);
                if next > extra {
                    self.free.insert(end + extra, next - extra);
                }
                true
            }
            _ => false,
        }
    }

    /// Put `[start, start + size)` back on the free list, merging neighbours.
    fn release_range(&mut self, start: usize, size: usize) {
        let mut start = start;
        let mut size = size;
        if let Some(next) = self.free.remove(&(start + size)) {
            size += next;
        }
        let prev = self
            .free
            .range(..start)
            .next_back()
            .map(|(&addr, &len)| (addr, len));
        if let Some((prev_addr, prev_len)) = prev {
            if prev_addr + prev_len == start {
                self.free.remove(&prev_addr);
                start = prev_addr;
                size += prev_len;
            }
        }
        if start + size == self.top {
            self.top = start;
        } else {
            self.free.insert(start, size);
        }
    }
}
