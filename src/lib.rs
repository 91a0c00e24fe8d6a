pub mod analyzer;
pub mod codegen;
pub mod error;
pub mod ir;
pub mod lexer;
pub mod parser;
pub mod source;
pub mod symbol;

use std::path::Path;

use codegen::Codegen;
use parser::{Parser, TranslationUnit};

pub use error::{CompileError, Result};
pub use source::{FileProvider, FsProvider, Location, SourceFile};
pub use symbol::{Interner, Symbol};

/// Lexes, parses and analyzes `source`.
pub fn parse(source: &SourceFile, interner: &Interner) -> Result<TranslationUnit> {
    Parser::new(source, interner).parse()
}

pub fn lower(unit: &TranslationUnit, interner: &Interner) -> Result<ir::Module> {
    Codegen::new(unit, interner).generate()
}

/// Runs the whole pipeline on one source buffer.
pub fn compile(source: &SourceFile) -> Result<ir::Module> {
    let interner = Interner::new();
    let unit = parse(source, &interner)?;
    lower(&unit, &interner)
}

/// Loads `path` through `provider` and compiles it.
pub fn compile_path<P: FileProvider + ?Sized>(provider: &P, path: &Path) -> Result<ir::Module> {
    let source = provider.load(path).map_err(|e| CompileError::Io {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;
    compile(&source)
}
