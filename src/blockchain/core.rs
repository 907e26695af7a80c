// core.rs splits responsibilities into submodules: the chain itself and the
// validation applied to candidate chains received from peers.
pub mod chain;
pub mod validation;

pub use chain::*;
pub use validation::*;
