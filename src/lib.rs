//! # rchunk - A First-Fit Chunk Allocator
//!
//! This crate provides a small **first-fit heap allocator** that manages a
//! single growable region, carving it into self-describing chunks and
//! recombining them as they are freed.
//!
//! ## Overview
//!
//! The region grows in fixed increments. Each increment is cut into free
//! chunks of the maximum chunk size; allocations split a chunk into a used
//! prefix and a free suffix, and frees merge a chunk with the free chunks
//! that follow it.
//!
//! ```text
//!   Chunk Chain:
//!
//!   ┌──────────────────────────────────────────────────────────────────────┐
//!   │                             HEAP REGION                              │
//!   │                                                                      │
//!   │  ┌────┬──────┬────┬──────────┬────┬──────┬────┬────────────────────┐ │
//!   │  │ hd │ used │ hd │   free   │ hd │ used │ hd │        free        │ │
//!   │  └────┴──────┴────┴──────────┴────┴──────┴────┴────────────────────┘ │
//!   │  ▲                                                                 ▲ │
//!   │  │                                                                 │ │
//!   │ start                                                            end │
//!   └──────────────────────────────────────────────────────────────────────┘
//!
//!   Every chunk begins where the previous one ends; walking the headers
//!   from start lands exactly on end.
//! ```
//!
//! ## Crate Structure
//!
//! ```text
//!   rchunk
//!   ├── align      - Even-size rounding (align_even!)
//!   ├── header     - 16-bit chunk header codec
//!   ├── config     - Growth increment and chunk ceiling
//!   ├── provider   - Memory providers (sbrk, fixed arena)
//!   ├── state      - Heap bounds
//!   ├── heap       - ChunkHeap: search, split, grow, coalesce
//!   └── inspect    - Hex and chunk-table dumps
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use rchunk::{ChunkHeap, FreeOutcome, HeapConfig};
//!
//! let mut heap = ChunkHeap::with_arena(HeapConfig::default(), 1024);
//!
//! let ptr = heap.allocate(6).unwrap();
//! unsafe { ptr.as_ptr().write_bytes(0x2A, 6) };
//!
//! assert_eq!(heap.free(ptr.as_ptr()), FreeOutcome::Released);
//! assert_eq!(heap.free(ptr.as_ptr()), FreeOutcome::AlreadyFree);
//! ```
//!
//! ## Chunk Header
//!
//! ```text
//!   ┌───────────────────────┬────────────────────────────────┐
//!   │   Header (2 bytes)    │           Payload              │
//!   │  ┌─────────────────┐  │                                │
//!   │  │ size | allocated│  │     size - 2 bytes usable      │
//!   │  └─────────────────┘  │                                │
//!   └───────────────────────┴────────────────────────────────┘
//!                           ▲
//!                           └── Pointer returned to user
//! ```
//!
//! ## Limitations
//!
//! - **Single-threaded only**: No synchronization primitives
//! - **Never shrinks**: Memory is not handed back to the provider
//! - **Even alignment only**: Payloads are 2-byte aligned at best
//! - **Bounded requests**: A request plus its header must fit one chunk
//! - **Trusting headers**: Corrupted headers are not detected during use;
//!   [`ChunkHeap::validate`] can check the chain after the fact

pub mod align;
pub mod config;
pub mod error;
pub mod header;
mod heap;
pub mod inspect;
pub mod provider;
pub mod state;

pub use config::HeapConfig;
pub use error::{AllocError, ConfigError, LayoutError, ProviderError};
pub use heap::{Chunk, ChunkHeap, Chunks, FreeOutcome, HeapStats};
pub use provider::{ArenaProvider, MemoryProvider, SbrkProvider};
