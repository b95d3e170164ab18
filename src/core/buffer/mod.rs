pub mod buffer;
pub mod pool;

pub use buffer::{Buffer, BufferAllocator, BufferBacking, MemoryAllocator};
pub use pool::BufferPool;
