//! Transfer module; types live in a submodule like the rest of the chain code

pub mod types;

pub use types::*;
