use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};

use mcc::ir::Terminator;
use mcc::{CompileError, FileProvider, FsProvider, SourceFile};

#[derive(Default)]
struct MemoryProvider {
    files: HashMap<PathBuf, String>,
}

impl MemoryProvider {
    fn with(mut self, path: &str, text: &str) -> Self {
        self.files.insert(PathBuf::from(path), text.to_string());
        self
    }
}

impl FileProvider for MemoryProvider {
    fn load(&self, path: &Path) -> io::Result<SourceFile> {
        let Some(text) = self.files.get(path) else {
            return Err(io::Error::new(io::ErrorKind::NotFound, "no such file"));
        };
        Ok(SourceFile::new(path.display().to_string(), text.as_str()))
    }
}

const GCD: &str = "
# Euclid, iteratively.
var calls: int = 0;
let limit: int = 0x10;

def gcd(a: int, b: int) -> int {
    calls = calls + 1;
    while (b != 0) {
        var t: int = b;
        b = a % b;
        a = t;
    }
    return a;
}

def main() -> int {
    var i: int = 1;
    var acc: int = 0;
    while (true) {
        when (i > limit) break;
        acc = acc + gcd(i, 12);
        i = i + 1;
    }
    return acc > 0 ? acc : -1;
}
";

#[test]
fn compiles_a_whole_program() {
    let module = mcc::compile(&SourceFile::new("gcd.mc", GCD)).unwrap();
    assert_eq!(module.name, "gcd.mc");
    assert_eq!(module.globals.len(), 1);
    assert_eq!(
        module
            .functions
            .iter()
            .map(|f| f.name.as_str())
            .collect::<Vec<_>>(),
        ["gcd", "main"]
    );

    for f in &module.functions {
        for block in &f.blocks {
            for target in block.terminator.successors() {
                assert!(target < f.blocks.len(), "{} jumps out of range", block.label);
            }
        }
    }

    let main = module.function("main").unwrap();
    assert!(main.block("cond.end").is_some());
    let text = module.to_string();
    assert!(text.contains("call i32 @gcd(i32 %"));
    assert!(text.contains("store i32 %"));
    assert!(text.contains("@calls = global i32 0"));
}

#[test]
fn every_block_has_exactly_one_terminator() {
    let module = mcc::compile(&SourceFile::new(
        "dead.mc",
        "def f() -> int { return 1; return 2; }",
    ))
    .unwrap();
    let f = module.function("f").unwrap();
    let labels: Vec<&str> = f.blocks.iter().map(|b| b.label.as_str()).collect();
    assert_eq!(labels, ["entry", "unreachable"]);
    let Terminator::Ret { value, .. } = &f.blocks[1].terminator else {
        panic!();
    };
    assert_eq!(value.to_string(), "2");
}

#[test]
fn compile_through_a_provider() {
    let provider = MemoryProvider::default().with("main.mc", "def main() -> int { return 0; }");
    let module = mcc::compile_path(&provider, Path::new("main.mc")).unwrap();
    assert_eq!(module.name, "main.mc");
    assert!(module.function("main").is_some());
}

#[test]
fn missing_file_is_an_io_error() {
    let provider = MemoryProvider::default();
    let err = mcc::compile_path(&provider, Path::new("missing.mc")).unwrap_err();
    assert_eq!(
        err,
        CompileError::Io {
            path: "missing.mc".to_string(),
            message: "no such file".to_string()
        }
    );
    assert_eq!(err.category(), "io");
    assert!(err.location().is_none());
}

#[test]
fn compile_from_disk() {
    let path = std::env::temp_dir().join(format!("mcc-{}-answer.mc", std::process::id()));
    std::fs::write(&path, "def main() -> int { return 42; }").unwrap();
    let result = mcc::compile_path(&FsProvider, &path);
    std::fs::remove_file(&path).unwrap();

    let module = result.unwrap();
    assert!(module.to_string().contains("ret i32 42"));
}

#[test]
fn errors_carry_locations() {
    let err = mcc::compile(&SourceFile::new(
        "bad.mc",
        "def main() -> int {\n    return nope;\n}",
    ))
    .unwrap_err();
    assert_eq!(err.category(), "semantic");
    assert_eq!(
        err.to_string(),
        "bad.mc:2:12: semantic error: use of undeclared name `nope`"
    );

    let err = mcc::compile(&SourceFile::new("bad.mc", "var x: int = 1")).unwrap_err();
    assert_eq!(
        err.to_string(),
        "bad.mc:1:15: syntax error: expected `;`, found end of input"
    );
}
