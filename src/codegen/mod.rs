mod codegen;
mod function;

pub use codegen::*;
pub use function::*;
