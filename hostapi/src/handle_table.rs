//! Registry mapping opaque integer handles to live host-side resources.
//!
//! Handles are issued from a counter that only moves forward: a released
//! handle is never handed out again for the lifetime of the table, so a
//! stale handle held by the guest can never alias a newer resource.

use std::collections::HashMap;

use crate::error::{HostError, ResourceKind};

/// Handle-keyed resource table owned by one session.
#[derive(Debug)]
pub struct HandleTable<T> {
    kind: ResourceKind,
    next: i32,
    entries: HashMap<i32, T>,
}

impl<T> HandleTable<T> {
    /// Create an empty table whose first handle is `0`.
    pub fn new(kind: ResourceKind) -> Self {
        Self::starting_at(kind, 0)
    }

    /// Create an empty table whose first handle is `first`.
    pub fn starting_at(kind: ResourceKind, first: i32) -> Self {
        Self {
            kind,
            next: first,
            entries: HashMap::new(),
        }
    }

    /// Register `resource` under a fresh handle.
    ///
    /// Fails only when the counter would pass `i32::MAX`; handles are
    /// never recycled to avoid that.
    pub fn allocate(&mut self, resource: T) -> Result<i32, HostError> {
        let handle = self.next;
        self.next = handle
            .checked_add(1)
            .ok_or(HostError::IdSpaceExhausted(self.kind))?;
        self.entries.insert(handle, resource);
        tracing::trace!(kind = %self.kind, handle, "allocated");
        Ok(handle)
    }

    /// Look up a live resource.
    pub fn get(&self, handle: i32) -> Option<&T> {
        self.entries.get(&handle)
    }

    /// Look up a live resource for mutation.
    pub fn get_mut(&mut self, handle: i32) -> Option<&mut T> {
        self.entries.get_mut(&handle)
    }

    /// Look up a live resource, reporting unknown handles as errors.
    pub fn require_mut(&mut self, handle: i32) -> Result<&mut T, HostError> {
        let kind = self.kind;
        self.entries
            .get_mut(&handle)
            .ok_or(HostError::ResourceNotFound {
                kind,
                id: handle.into(),
            })
    }

    /// Release a handle, returning its resource if it was live.
    ///
    /// Releasing an unknown or already-released handle is a no-op.
    pub fn release(&mut self, handle: i32) -> Option<T> {
        let removed = self.entries.remove(&handle);
        if removed.is_some() {
            tracing::trace!(kind = %self.kind, handle, "released");
        }
        removed
    }

    /// Returns true if `handle` names a live resource.
    pub fn contains(&self, handle: i32) -> bool {
        self.entries.contains_key(&handle)
    }

    /// Number of live resources.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if no resource is live.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The handle the next `allocate` call will return.
    pub fn next_handle(&self) -> i32 {
        self.next
    }
}
