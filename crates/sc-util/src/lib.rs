//! Shared foundation for the SC toolchain: source positions, diagnostics,
//! and identifier interning used by every other crate in the workspace.

pub mod diag;
pub mod index_vec;
pub mod span;
pub mod symbol;

pub use diag::{Diagnostic, Handler, Severity};
pub use index_vec::{Idx, IndexVec};
pub use span::{Pos, Span};
pub use symbol::{Interner, Symbol};
