mod store;

pub use store::{MEMORY_URL_PREFIX, MemoryBlobStore};
