//! Sandboxed file operations: create, read and list inside the workspace.

use std::fmt::Write as _;
use std::fs;
use std::str::FromStr;

use tracing::{debug, instrument};

use crate::core::format::{human_size, timestamp};
use crate::error::{EntryKind, ToolError};
use crate::io::workspace::Workspace;

/// Encodings accepted by [`read_file`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextEncoding {
    #[default]
    Utf8,
    Ascii,
    Latin1,
}

impl TextEncoding {
    pub fn label(self) -> &'static str {
        match self {
            TextEncoding::Utf8 => "utf-8",
            TextEncoding::Ascii => "ascii",
            TextEncoding::Latin1 => "latin-1",
        }
    }

    fn decode(self, bytes: Vec<u8>) -> Option<String> {
        match self {
            TextEncoding::Utf8 => String::from_utf8(bytes).ok(),
            TextEncoding::Ascii => bytes
                .is_ascii()
                .then(|| bytes.iter().map(|&b| char::from(b)).collect()),
            TextEncoding::Latin1 => Some(bytes.iter().map(|&b| char::from(b)).collect()),
        }
    }
}

impl FromStr for TextEncoding {
    type Err = ToolError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "utf-8" | "utf8" => Ok(TextEncoding::Utf8),
            "ascii" | "us-ascii" => Ok(TextEncoding::Ascii),
            "latin-1" | "latin1" | "iso-8859-1" => Ok(TextEncoding::Latin1),
            other => Err(ToolError::InvalidArgument(format!(
                "unsupported encoding '{other}' (expected utf-8, ascii or latin-1)"
            ))),
        }
    }
}

/// Which annotations `list_files` prints next to each file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListingOptions {
    pub show_sizes: bool,
    pub show_modification_times: bool,
}

impl Default for ListingOptions {
    fn default() -> Self {
        Self {
            show_sizes: true,
            show_modification_times: true,
        }
    }
}

/// Write `content` to `path`, creating parent directories and overwriting silently.
#[instrument(skip(workspace, content), fields(bytes = content.len()))]
pub fn create_file(workspace: &Workspace, content: &str, path: &str) -> Result<String, ToolError> {
    let target = workspace.guard(path)?;
    if target.is_dir() {
        return Err(ToolError::WrongType {
            path: path.to_string(),
            expected: EntryKind::File,
            found: EntryKind::Directory,
        });
    }
    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| ToolError::io("create directory", workspace.display(parent), e))?;
    }
    fs::write(&target, content).map_err(|e| ToolError::io("write", path, e))?;
    debug!(path = %target.display(), "file written");
    Ok(format!(
        "File successfully created at: {}",
        workspace.display(&target)
    ))
}

/// Return a metadata header followed by the decoded file content.
#[instrument(skip(workspace))]
pub fn read_file(
    workspace: &Workspace,
    path: &str,
    encoding: TextEncoding,
) -> Result<String, ToolError> {
    let target = workspace.guard(path)?;
    if !target.exists() {
        return Err(ToolError::NotFound {
            what: EntryKind::File,
            path: path.to_string(),
        });
    }
    if target.is_dir() {
        return Err(ToolError::WrongType {
            path: path.to_string(),
            expected: EntryKind::File,
            found: EntryKind::Directory,
        });
    }

    let metadata = fs::metadata(&target).map_err(|e| ToolError::io("stat", path, e))?;
    let bytes = fs::read(&target).map_err(|e| ToolError::io("read", path, e))?;
    let content = encoding
        .decode(bytes)
        .ok_or_else(|| ToolError::DecodeError {
            path: path.to_string(),
            encoding: encoding.label().to_string(),
        })?;

    let modified = metadata
        .modified()
        .map(timestamp)
        .unwrap_or_else(|_| "unknown".to_string());

    let mut out = String::new();
    let _ = writeln!(out, "File: {}", workspace.display(&target));
    let _ = writeln!(out, "Size: {}", human_size(metadata.len()));
    let _ = writeln!(out, "Modified: {modified}");
    out.push_str("---\n");
    out.push_str(&content);
    Ok(out)
}

/// List a directory: subdirectories first, then files, each group alphabetical.
#[instrument(skip(workspace))]
pub fn list_files(
    workspace: &Workspace,
    directory: Option<&str>,
    options: ListingOptions,
) -> Result<String, ToolError> {
    let raw = directory.filter(|d| !d.trim().is_empty()).unwrap_or(".");
    let target = workspace.guard(raw)?;
    if !target.exists() {
        return Err(ToolError::NotFound {
            what: EntryKind::Directory,
            path: raw.to_string(),
        });
    }
    if !target.is_dir() {
        return Err(ToolError::WrongType {
            path: raw.to_string(),
            expected: EntryKind::Directory,
            found: EntryKind::File,
        });
    }

    let shown = workspace.display(&target);
    let mut dirs = Vec::new();
    let mut files = Vec::new();
    let entries = fs::read_dir(&target).map_err(|e| ToolError::io("list", raw, e))?;
    for entry in entries {
        let entry = entry.map_err(|e| ToolError::io("list", raw, e))?;
        let name = entry.file_name().to_string_lossy().into_owned();
        // Follows symlinks so a link to a directory is listed as one.
        let metadata = match entry.path().metadata() {
            Ok(metadata) => metadata,
            Err(err) => {
                debug!(name, err = %err, "skipping unreadable entry");
                continue;
            }
        };
        if metadata.is_dir() {
            dirs.push(name);
        } else {
            files.push((name, metadata));
        }
    }

    if dirs.is_empty() && files.is_empty() {
        return Ok(format!("No files found in {shown}"));
    }

    dirs.sort();
    files.sort_by(|a, b| a.0.cmp(&b.0));

    let mut out = format!("Contents of {shown}:\n");
    if !dirs.is_empty() {
        out.push_str("\nDirectories:\n");
        for name in &dirs {
            let _ = writeln!(out, "  {name}/");
        }
    }
    if !files.is_empty() {
        out.push_str("\nFiles:\n");
        for (name, metadata) in &files {
            let mut notes = Vec::new();
            if options.show_sizes {
                notes.push(human_size(metadata.len()));
            }
            if options.show_modification_times
                && let Ok(modified) = metadata.modified()
            {
                notes.push(format!("modified {}", timestamp(modified)));
            }
            if notes.is_empty() {
                let _ = writeln!(out, "  {name}");
            } else {
                let _ = writeln!(out, "  {name} ({})", notes.join(", "));
            }
        }
    }
    Ok(out)
}
