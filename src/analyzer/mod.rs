mod scope;
mod semantics;
mod ty;

pub use scope::*;
pub use semantics::*;
pub use ty::*;
