//! Emulated Goldilocks field (p = 2^64 - 2^32 + 1) and its quadratic extension over BN254.

pub mod ext;
pub mod gl_var;
pub mod native;
pub mod range;
pub mod select;

pub use ext::{GlExtAcc, GlExtVar};
pub use gl_var::{GlAcc, GlVar};
pub use select::select_le;
