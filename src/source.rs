use std::fmt;
use std::fs;
use std::io;
use std::path::Path;
use std::sync::Arc;

/// A fully loaded source buffer plus the name used in diagnostics.
#[derive(Clone, Debug)]
pub struct SourceFile {
    name: Arc<str>,
    text: String,
}

impl SourceFile {
    pub fn new(name: impl Into<Arc<str>>, text: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            text: text.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Location of the first character of the buffer.
    pub fn start(&self) -> Location {
        Location {
            file: Some(self.name.clone()),
            line: 1,
            column: 1,
        }
    }
}

/// Position of a token in its source file. Lines and columns start at 1.
///
/// A location without a file is the null location, used for nodes the
/// compiler synthesizes itself.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Location {
    pub file: Option<Arc<str>>,
    pub line: u32,
    pub column: u32,
}

impl Location {
    pub fn null() -> Self {
        Self::default()
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.file {
            Some(file) => write!(f, "{}:{}:{}", file, self.line, self.column),
            None => write!(f, "<unknown>"),
        }
    }
}

/// Supplies source text for a path. The compiler never reads files itself.
pub trait FileProvider {
    fn load(&self, path: &Path) -> io::Result<SourceFile>;
}

/// Reads sources straight from the filesystem.
#[derive(Clone, Copy, Debug, Default)]
pub struct FsProvider;

impl FileProvider for FsProvider {
    fn load(&self, path: &Path) -> io::Result<SourceFile> {
        let text = fs::read_to_string(path)?;
        Ok(SourceFile::new(path.display().to_string(), text))
    }
}
