//! Local editing buffers
//!
//! Records are written to a scratch file, handed to an external program and
//! read back once it exits. The scratch file is left in place afterwards so a
//! failed submission can be recovered by hand.

use chrono::{DateTime, Utc};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use thiserror::Error;
use tracing::{debug, info};

const BUFFER_EXTENSION: &str = "md";

/// Errors from running the editor or touching the buffer
#[derive(Debug, Error)]
pub enum EditorError {
    #[error("No editor command configured")]
    EmptyCommand,

    #[error("Failed to launch {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("{program} exited with {status}")]
    Exited { program: String, status: String },

    #[error("Cannot name a buffer after {0:?}")]
    InvalidName(String),

    #[error("Buffer I/O error on {path}: {source}")]
    Buffer {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Something that lets a human change a file in place
pub trait Editor {
    /// Block until the file has been edited
    fn edit(&self, path: &Path) -> Result<(), EditorError>;
}

/// Editor backed by an external program such as `vim` or `code --wait`
#[derive(Debug, Clone)]
pub struct ProcessEditor {
    program: String,
    args: Vec<String>,
}

impl ProcessEditor {
    /// Parse a command line; words after the first become leading arguments
    pub fn new(command: &str) -> Result<Self, EditorError> {
        let mut words = command.split_whitespace().map(str::to_string);
        let program = words.next().ok_or(EditorError::EmptyCommand)?;
        Ok(Self {
            program,
            args: words.collect(),
        })
    }

    pub fn program(&self) -> &str {
        &self.program
    }
}

impl Editor for ProcessEditor {
    fn edit(&self, path: &Path) -> Result<(), EditorError> {
        debug!(program = %self.program, path = %path.display(), "ProcessEditor::edit: called");
        let status = Command::new(&self.program)
            .args(&self.args)
            .arg(path)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .map_err(|source| EditorError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        if !status.success() {
            return Err(EditorError::Exited {
                program: self.program.clone(),
                status: status.to_string(),
            });
        }
        Ok(())
    }
}

/// Path of the scratch file `name` inside `dir`, with a `.md` extension
///
/// Characters outside `[A-Za-z0-9._-]` become `_`, so tag names such as
/// `CI/CD` stay a single file directly inside `dir`.
pub fn buffer_path(dir: &Path, name: &str) -> Result<PathBuf, EditorError> {
    let file: String = name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') { c } else { '_' })
        .collect();
    if file.is_empty() || file == "." || file == ".." {
        return Err(EditorError::InvalidName(name.to_string()));
    }

    let path = dir.join(&file);
    if path.extension().is_some_and(|ext| ext == BUFFER_EXTENSION) {
        Ok(path)
    } else {
        Ok(dir.join(format!("{}.{}", file, BUFFER_EXTENSION)))
    }
}

/// Identifier for a fresh buffer: whole seconds since the Unix epoch
pub fn generate_id(at: DateTime<Utc>) -> String {
    at.timestamp().to_string()
}

/// Write `initial` to `path`, let `editor` change it and return the result
pub fn edit_buffer(editor: &dyn Editor, path: &Path, initial: &str) -> Result<String, EditorError> {
    write_buffer(path, initial)?;
    editor.edit(path)?;
    let edited = read_buffer(path)?;
    info!(path = %path.display(), len = edited.len(), "edit_buffer: edited");
    Ok(edited)
}

pub fn write_buffer(path: &Path, contents: &str) -> Result<(), EditorError> {
    fs::write(path, contents).map_err(|source| EditorError::Buffer {
        path: path.to_path_buf(),
        source,
    })
}

pub fn read_buffer(path: &Path) -> Result<String, EditorError> {
    fs::read_to_string(path).map_err(|source| EditorError::Buffer {
        path: path.to_path_buf(),
        source,
    })
}


#[cfg(test)]
mod tests {
    use super::fake::FakeEditor;
    use super::*;
    use chrono::TimeZone;
    use tempfile::TempDir;

    #[test]
    fn test_buffer_path_appends_extension_once() {
        let dir = Path::new("/tmp");
        assert_eq!(buffer_path(dir, "42").unwrap(), PathBuf::from("/tmp/42.md"));
        assert_eq!(buffer_path(dir, "weather.md").unwrap(), PathBuf::from("/tmp/weather.md"));
        assert_eq!(buffer_path(dir, "v1.2").unwrap(), PathBuf::from("/tmp/v1.2.md"));
    }

    #[test]
    fn test_buffer_path_stays_inside_dir() {
        let dir = Path::new("/tmp");
        assert_eq!(buffer_path(dir, "CI/CD").unwrap(), PathBuf::from("/tmp/CI_CD.md"));
        assert_eq!(buffer_path(dir, "../x").unwrap(), PathBuf::from("/tmp/.._x.md"));
        assert_eq!(buffer_path(dir, "Café au lait").unwrap(), PathBuf::from("/tmp/Caf__au_lait.md"));

        for name in ["", ".", ".."] {
            assert!(matches!(buffer_path(dir, name), Err(EditorError::InvalidName(_))));
        }
    }

    #[test]
    fn test_generate_id_is_epoch_seconds() {
        let at = Utc.with_ymd_and_hms(1970, 1, 2, 0, 0, 0).unwrap();
        assert_eq!(generate_id(at), "86400");
    }

    #[test]
    fn test_process_editor_splits_arguments() {
        let editor = ProcessEditor::new("code --wait").unwrap();
        assert_eq!(editor.program(), "code");
        assert_eq!(editor.args, vec!["--wait"]);
        assert!(matches!(ProcessEditor::new("   "), Err(EditorError::EmptyCommand)));
    }

    #[test]
    fn test_edit_buffer_round_trip() {
        let temp = TempDir::new().unwrap();
        let path = buffer_path(temp.path(), "1").unwrap();
        let editor = FakeEditor {
            transform: |s: &str| format!("{}edited", s),
        };

        let edited = edit_buffer(&editor, &path, "Name: A\n\n").unwrap();
        assert_eq!(edited, "Name: A\n\nedited");
        // Buffer stays behind
        assert!(path.exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_process_editor_failure_status() {
        let temp = TempDir::new().unwrap();
        let path = buffer_path(temp.path(), "x").unwrap();
        write_buffer(&path, "").unwrap();

        assert!(ProcessEditor::new("true").unwrap().edit(&path).is_ok());
        let err = ProcessEditor::new("false").unwrap().edit(&path).unwrap_err();
        assert!(matches!(err, EditorError::Exited { .. }));
    }

    #[test]
    fn test_missing_program_is_spawn_error() {
        let temp = TempDir::new().unwrap();
        let path = buffer_path(temp.path(), "x").unwrap();
        let err = ProcessEditor::new("definitely-not-an-editor-xyz")
            .unwrap()
            .edit(&path)
            .unwrap_err();
        assert!(matches!(err, EditorError::Spawn { .. }));
    }
}
