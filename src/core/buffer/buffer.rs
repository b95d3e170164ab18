use crate::core::errors::{DecorError, Result};
use crate::core::BufferId;

/// Bytes per pixel for the only format the engine negotiates.
pub const BYTES_PER_PIXEL: usize = 4;

/// Backing storage for one buffer, obtained from the allocator.
///
/// Opaque outside this module: the engine never cares where the bytes live,
/// only that their size matches the negotiated geometry.
#[derive(Debug)]
pub struct BufferBacking {
    pub(crate) bytes: Box<[u8]>,
}

impl BufferBacking {
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Seam to the external shared-memory buffer allocator. The engine only
/// ever asks for backing storage of a given byte size and hands it back on
/// free.
pub trait BufferAllocator {
    fn allocate(&mut self, size: usize) -> Result<BufferBacking>;
    fn free(&mut self, backing: BufferBacking);
}

/// Plain heap-backed allocator for tests and headless runs.
#[derive(Debug, Default)]
pub struct MemoryAllocator {
    allocated: usize,
    /// When set, allocations beyond this many live bytes fail.
    pub limit: Option<usize>,
}

impl MemoryAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_limit(limit: usize) -> Self {
        Self {
            allocated: 0,
            limit: Some(limit),
        }
    }

    pub fn allocated_bytes(&self) -> usize {
        self.allocated
    }
}

impl BufferAllocator for MemoryAllocator {
    fn allocate(&mut self, size: usize) -> Result<BufferBacking> {
        if let Some(limit) = self.limit {
            if self.allocated + size > limit {
                return Err(DecorError::ResourceExhaustion(format!(
                    "allocator limit {} exceeded by request for {} bytes",
                    limit, size
                )));
            }
        }
        self.allocated += size;
        Ok(BufferBacking {
            bytes: vec![0u8; size].into_boxed_slice(),
        })
    }

    fn free(&mut self, backing: BufferBacking) {
        self.allocated = self.allocated.saturating_sub(backing.len());
    }
}

/// A compositor-shared pixel region.
///
/// From attach until the matching release event the compositor may read the
/// backing storage at any time; the pool refuses canvas access in that
/// window. An early release while `in_use` only marks the buffer detached;
/// the actual free happens on the release event.
#[derive(Debug)]
pub struct Buffer {
    pub id: BufferId,
    /// Logical size.
    pub width: i32,
    pub height: i32,
    pub scale: i32,
    pub opaque: bool,
    /// The compositor currently reads/displays this buffer.
    pub in_use: bool,
    /// Released by the application while `in_use`; free on next release.
    pub is_detached: bool,
    pub(crate) backing: BufferBacking,
}

impl Buffer {
    pub(crate) fn new(
        id: BufferId,
        width: i32,
        height: i32,
        scale: i32,
        opaque: bool,
        backing: BufferBacking,
    ) -> Self {
        Self {
            id,
            width,
            height,
            scale,
            opaque,
            in_use: false,
            is_detached: false,
            backing,
        }
    }

    /// Byte size of the backing storage.
    pub fn backing_size(&self) -> usize {
        self.backing.len()
    }

    /// Byte size needed for the given logical geometry.
    pub fn required_size(width: i32, height: i32, scale: i32) -> usize {
        let w = (width.max(0) as usize) * (scale.max(1) as usize);
        let h = (height.max(0) as usize) * (scale.max(1) as usize);
        w * h * BYTES_PER_PIXEL
    }

    /// Available for reuse: not held by the compositor and not pending a
    /// deferred free.
    pub fn is_free(&self) -> bool {
        !self.in_use && !self.is_detached
    }

    /// Mutable pixel access. Refused while the compositor holds the buffer,
    /// since writing then would corrupt memory it is still reading.
    pub fn canvas_mut(&mut self) -> Result<&mut [u8]> {
        if self.in_use {
            return Err(DecorError::protocol(format!(
                "buffer {} is in use by the compositor; acquire another buffer to draw",
                self.id
            )));
        }
        Ok(&mut self.backing.bytes)
    }
}
