//! Abstractions shared by Texel engines.
//!
//! Everything here sits at the boundary between the language core and
//! the environment it runs in: the file system, the terminal, and the
//! typesetter that consumes the interpreter's output. The crate also
//! provides mock implementations of the file system and terminal for
//! unit tests.

use std::collections::HashMap;
use texel::prelude as tx;
use texel::traits::*;
use texel::vm;

pub mod typesetter;

pub use vm::FileSystem;
pub use vm::TerminalIn;

/// Reads the file at the provided location into a string, using the VM's
/// file system and working directory.
pub fn read_file_to_string<S: TexelState>(
    vm: &vm::VM<S>,
    file_location: texel::parse::FileLocation,
    default_extension: &str,
) -> tx::Result<(std::path::PathBuf, String)> {
    let working_directory = vm.working_directory.as_deref();
    let file_path = file_location.determine_full_path(working_directory, default_extension);
    let source_code = vm
        .file_system
        .read_to_string(&file_path)
        .map_err(|err| {
            vm.error(IoError {
                title: format!("could not read from `{}`", file_path.display()),
                underlying_error: err,
            })
        })?;
    Ok((file_path, source_code))
}

#[derive(Debug)]
pub struct IoError {
    pub title: String,
    pub underlying_error: std::io::Error,
}

impl texel::error::TexError for IoError {
    fn kind(&self) -> texel::error::Kind {
        texel::error::Kind::FailedPrecondition
    }

    fn title(&self) -> String {
        self.title.clone()
    }

    fn notes(&self) -> Vec<texel::error::display::Note> {
        vec![format!("underlying filesystem error: {}", self.underlying_error).into()]
    }
}

/// In-memory file system for unit tests.
///
/// Tests of primitives that touch the file system, like `\input` and
/// `\openin`, populate one of these with "files" and install it on the
/// VM in place of the real file system.
#[derive(Default)]
pub struct InMemoryFileSystem {
    working_directory: std::path::PathBuf,
    files: HashMap<std::path::PathBuf, String>,
}

impl InMemoryFileSystem {
    /// Create a new in-memory file system.
    ///
    /// Typically the working directory is taken from the VM.
    pub fn new(working_directory: &std::path::Path) -> Self {
        Self {
            working_directory: working_directory.into(),
            files: Default::default(),
        }
    }

    /// Add a file, at a path relative to the working directory.
    pub fn add_file(&mut self, relative_path: &str, content: &str) {
        let path = self.working_directory.join(relative_path);
        self.files.insert(path, content.to_string());
    }
}

impl FileSystem for InMemoryFileSystem {
    fn read_to_string(&self, path: &std::path::Path) -> std::io::Result<String> {
        self.files
            .get(path)
            .cloned()
            .ok_or_else(|| std::io::Error::new(std::io::ErrorKind::NotFound, "not found"))
    }
    fn write_bytes(&self, _: &std::path::Path, _: &[u8]) -> std::io::Result<()> {
        Err(std::io::Error::new(
            std::io::ErrorKind::Unsupported,
            "the in-memory file system is read-only",
        ))
    }
}

/// Scripted implementation of [`TerminalIn`] for unit tests.
///
/// Each call to [`TerminalIn::read_line`] returns the next line of the
/// script; when the script runs out, an IO error of kind
/// [std::io::ErrorKind::UnexpectedEof] is returned.
#[derive(Default)]
pub struct MockTerminalIn {
    next_line: usize,
    lines: Vec<String>,
}

impl MockTerminalIn {
    /// Append a line to the script.
    pub fn add_line<S: Into<String>>(&mut self, line: S) {
        self.lines.push(line.into());
    }
}

impl TerminalIn for MockTerminalIn {
    fn read_line(&mut self, _: Option<&str>, buffer: &mut String) -> std::io::Result<()> {
        match self.lines.get(self.next_line) {
            None => Err(std::io::Error::new(
                std::io::ErrorKind::UnexpectedEof,
                "mock terminal input exhausted",
            )),
            Some(line) => {
                buffer.push_str(line);
                self.next_line += 1;
                Ok(())
            }
        }
    }
}
