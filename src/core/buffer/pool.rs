//! Buffer pool lifecycle.
//!
//! Tracks a pool of fixed-size pixel buffers through the three states the
//! release protocol allows: free, attached-and-in-use (owned by the
//! compositor until its release event), and detached-pending-free. The
//! release event is the only path that frees detached backing storage.

use crate::core::buffer::buffer::{Buffer, BufferAllocator};
use crate::core::errors::{DecorError, Result};
use crate::core::BufferId;
use crate::prelude::HashMap;
use crate::util::logging;

pub struct BufferPool {
    allocator: Box<dyn BufferAllocator>,
    buffers: HashMap<BufferId, Buffer>,
    next_id: BufferId,
}

impl BufferPool {
    pub fn new(allocator: Box<dyn BufferAllocator>) -> Self {
        Self {
            allocator,
            buffers: HashMap::new(),
            next_id: 1,
        }
    }

    /// Hand out a buffer for the given geometry.
    ///
    /// A free buffer whose backing size matches exactly is reused. Otherwise
    /// new backing is allocated first, and only once it exists are
    /// mismatched free buffers retired, so the frame is never left without a
    /// valid buffer mid-transition. Buffers the compositor still holds are
    /// not touched here; they return through the release path.
    pub fn acquire(&mut self, width: i32, height: i32, scale: i32, opaque: bool) -> Result<BufferId> {
        let needed = Buffer::required_size(width, height, scale);

        if let Some(id) = self
            .buffers
            .values()
            .find(|b| b.is_free() && b.backing_size() == needed)
            .map(|b| b.id)
        {
            let buffer = self.buffers.get_mut(&id).expect("buffer disappeared");
            buffer.width = width;
            buffer.height = height;
            buffer.scale = scale;
            buffer.opaque = opaque;
            tracing::trace!("Reusing buffer {} ({}x{}@{})", id, width, height, scale);
            return Ok(id);
        }

        let backing = self.allocator.allocate(needed)?;
        let id = self.next_id;
        self.next_id += 1;
        self.buffers
            .insert(id, Buffer::new(id, width, height, scale, opaque, backing));

        // New backing is ready; now retire stale free buffers. Buffers the
        // compositor still holds are left to their release path.
        let stale: Vec<BufferId> = self
            .buffers
            .values()
            .filter(|b| b.id != id && b.is_free() && b.backing_size() != needed)
            .map(|b| b.id)
            .collect();
        for stale_id in stale {
            let buffer = self.buffers.remove(&stale_id).expect("buffer disappeared");
            self.allocator.free(buffer.backing);
            tracing::trace!("Buffer {} freed on geometry change", stale_id);
        }

        tracing::debug!(
            "Allocated buffer {} ({}x{}@{}, {} bytes)",
            id, width, height, scale, needed
        );
        Ok(id)
    }

    /// Mark a buffer attached: the compositor owns it from this moment
    /// until its release event.
    pub fn attach(&mut self, id: BufferId) -> Result<()> {
        let buffer = self.get_mut(id)?;
        if buffer.in_use {
            return Err(DecorError::protocol(format!(
                "buffer {} attached twice without an intervening release",
                id
            )));
        }
        buffer.in_use = true;
        Ok(())
    }

    /// Compositor release event. The only path that actually frees the
    /// backing of a detached buffer; otherwise the buffer goes back to the
    /// free list.
    pub fn on_release(&mut self, id: BufferId) -> Result<()> {
        let buffer = self.get_mut(id)?;
        if !buffer.in_use {
            tracing::warn!("Spurious release for buffer {} (not in use), ignoring", id);
            return Ok(());
        }
        buffer.in_use = false;
        if buffer.is_detached {
            let buffer = self.buffers.remove(&id).expect("buffer disappeared");
            self.allocator.free(buffer.backing);
            crate::dlog!(logging::BUFFER, "buffer {} released and freed (was detached)", id);
        } else {
            tracing::trace!("Buffer {} released, back to free list", id);
        }
        Ok(())
    }

    /// The application no longer needs the buffer. While the compositor
    /// still holds it the free is deferred to the release event; otherwise
    /// it is freed immediately.
    pub fn release_early(&mut self, id: BufferId) -> Result<()> {
        let buffer = self.get_mut(id)?;
        if buffer.in_use {
            buffer.is_detached = true;
            tracing::debug!("Buffer {} detached while in use; free deferred", id);
        } else {
            let buffer = self.buffers.remove(&id).expect("buffer disappeared");
            self.allocator.free(buffer.backing);
            tracing::debug!("Buffer {} freed early", id);
        }
        Ok(())
    }

    /// Mutable pixel access, refused while the compositor holds the buffer.
    pub fn canvas_mut(&mut self, id: BufferId) -> Result<&mut [u8]> {
        self.get_mut(id)?.canvas_mut()
    }

    pub fn get(&self, id: BufferId) -> Option<&Buffer> {
        self.buffers.get(&id)
    }

    fn get_mut(&mut self, id: BufferId) -> Result<&mut Buffer> {
        self.buffers
            .get_mut(&id)
            .ok_or(DecorError::UnknownBuffer(id))
    }

    pub fn len(&self) -> usize {
        self.buffers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffers.is_empty()
    }

    pub fn free_count(&self) -> usize {
        self.buffers.values().filter(|b| b.is_free()).count()
    }
}
