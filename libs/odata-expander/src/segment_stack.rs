//! Traversal path bookkeeping for the expansion engine.
//!
//! Every expansion scope pushes one segment (name + target set) on entry and
//! pops it on exit. [`SegmentStack::scoped`] hands out a guard that pops on
//! drop, so error exits leave the stack balanced too.

use std::ops::{Deref, DerefMut};

use crate::error::ExpandError;
use crate::metadata::ResourceSetWrapper;

#[derive(Debug, Default)]
pub struct SegmentStack {
    names: Vec<String>,
    wrappers: Vec<ResourceSetWrapper>,
    pushes: usize,
    pops: usize,
}

impl SegmentStack {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_segment(&mut self, name: impl Into<String>, wrapper: ResourceSetWrapper) {
        self.names.push(name.into());
        self.wrappers.push(wrapper);
        self.pushes += 1;
    }

    /// Pop the innermost segment.
    ///
    /// # Errors
    /// Returns `ExpandError::InvalidOperation` when the stack is empty, i.e.
    /// push and pop calls were not balanced.
    pub fn pop_segment(&mut self) -> Result<(), ExpandError> {
        if self.names.is_empty() {
            return Err(ExpandError::InvalidOperation(
                "found non-balanced call to push_segment and pop_segment".to_owned(),
            ));
        }
        self.pop_unchecked();
        Ok(())
    }

    fn pop_unchecked(&mut self) {
        self.names.pop();
        self.wrappers.pop();
        self.pops += 1;
    }

    /// Push a segment and return a guard that pops it when dropped.
    pub fn scoped(&mut self, name: impl Into<String>, wrapper: ResourceSetWrapper) -> SegmentGuard<'_> {
        self.push_segment(name, wrapper);
        SegmentGuard { stack: self }
    }

    #[must_use]
    pub fn segment_names(&self) -> &[String] {
        &self.names
    }

    #[must_use]
    pub fn segment_wrappers(&self) -> &[ResourceSetWrapper] {
        &self.wrappers
    }

    #[must_use]
    pub fn current_wrapper(&self) -> Option<&ResourceSetWrapper> {
        self.wrappers.last()
    }

    #[must_use]
    pub fn depth(&self) -> usize {
        self.names.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Segment names joined with `/`, e.g. `Customers/Orders`.
    #[must_use]
    pub fn path(&self) -> String {
        self.names.join("/")
    }

    /// Total pushes over the stack's lifetime.
    #[must_use]
    pub fn push_count(&self) -> usize {
        self.pushes
    }

    /// Total pops over the stack's lifetime.
    #[must_use]
    pub fn pop_count(&self) -> usize {
        self.pops
    }
}

/// Scoped segment: derefs to the stack and pops its segment on drop.
#[must_use]
pub struct SegmentGuard<'a> {
    stack: &'a mut SegmentStack,
}

impl Deref for SegmentGuard<'_> {
    type Target = SegmentStack;

    fn deref(&self) -> &Self::Target {
        self.stack
    }
}

impl DerefMut for SegmentGuard<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.stack
    }
}

impl Drop for SegmentGuard<'_> {
    fn drop(&mut self) {
        self.stack.pop_unchecked();
    }
}
