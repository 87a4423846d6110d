//! Static client stubs
//!
//! Generates a typed Rust client for a compiled module: one async method per operation, one
//! struct per record type, and the module's schema hash as `SCHEMA_HASH`. The generated code
//! depends on `dws-core`, `dws-proxy`, `chrono` and `uuid`.

pub mod error;
pub mod generate;
pub mod ident;

pub use error::{StubError, StubResult};
pub use generate::{GeneratedStub, SkippedOperation, StubGenerator, StubSource};
pub use ident::{rust_ident, unique_ident};
