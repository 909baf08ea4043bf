pub mod cache_padded;

pub use cache_padded::{CachePadded, CACHE_LINE_SIZE};
