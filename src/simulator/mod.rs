//! The simulator: debug session (C9), call-stack tracker (C10), and
//! source-line map (C11) built on top of the `isa` core.

pub mod callstack;
pub mod error;
pub mod session;
pub mod sourcemap;

pub use callstack::CallStack;
pub use error::SimError;
pub use session::{Session, SessionState};
pub use sourcemap::SourceMap;
