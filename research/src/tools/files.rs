//! Tool adapters for the sandboxed file operations.

use crate::error::ToolError;
use crate::io::files::{self, ListingOptions, TextEncoding};
use crate::io::workspace::Workspace;

use super::{ParamKind, ResearchTool, ToolArgs, ToolParam};

const CREATE_PARAMS: &[ToolParam] = &[
    ToolParam::required("content", ParamKind::String, "The content to write to the file."),
    ToolParam::required(
        "filename",
        ParamKind::String,
        "Path of the file to create, relative to the working directory. May include \
         subdirectories, e.g. \"data/webpage.md\" or \"output.txt\".",
    ),
];

const READ_PARAMS: &[ToolParam] = &[
    ToolParam::required(
        "path",
        ParamKind::String,
        "Path of the file to read, relative to the working directory.",
    ),
    ToolParam::optional(
        "encoding",
        ParamKind::String,
        "Text encoding of the file: utf-8 (default), ascii or latin-1.",
    ),
];

const LIST_PARAMS: &[ToolParam] = &[ToolParam::optional(
    "directory",
    ParamKind::String,
    "Directory to list, relative to the working directory. Defaults to the working \
     directory itself.",
)];

#[derive(Debug, Clone)]
pub struct CreateFileTool {
    workspace: Workspace,
}

impl CreateFileTool {
    pub fn new(workspace: Workspace) -> Self {
        Self { workspace }
    }
}

impl ResearchTool for CreateFileTool {
    fn name(&self) -> &str {
        "create_file"
    }

    fn description(&self) -> &str {
        "Creates a file with the given content at the specified path, overwriting any existing \
         file. The path must stay within the current working directory."
    }

    fn parameters(&self) -> &[ToolParam] {
        CREATE_PARAMS
    }

    fn call(&self, args: &ToolArgs) -> Result<String, ToolError> {
        files::create_file(
            &self.workspace,
            args.required_str("content")?,
            args.required_str("filename")?,
        )
    }
}

#[derive(Debug, Clone)]
pub struct ReadFileTool {
    workspace: Workspace,
}

impl ReadFileTool {
    pub fn new(workspace: Workspace) -> Self {
        Self { workspace }
    }
}

impl ResearchTool for ReadFileTool {
    fn name(&self) -> &str {
        "read_file"
    }

    fn description(&self) -> &str {
        "Reads a text file inside the current working directory and returns its content after \
         a short header with the file's size and modification time."
    }

    fn parameters(&self) -> &[ToolParam] {
        READ_PARAMS
    }

    fn call(&self, args: &ToolArgs) -> Result<String, ToolError> {
        let encoding = match args.optional_str("encoding") {
            Some(raw) => raw.parse()?,
            None => TextEncoding::default(),
        };
        files::read_file(&self.workspace, args.required_str("path")?, encoding)
    }
}

#[derive(Debug, Clone)]
pub struct ListFilesTool {
    workspace: Workspace,
    options: ListingOptions,
}

impl ListFilesTool {
    pub fn new(workspace: Workspace, options: ListingOptions) -> Self {
        Self { workspace, options }
    }
}

impl ResearchTool for ListFilesTool {
    fn name(&self) -> &str {
        "list_files"
    }

    fn description(&self) -> &str {
        "Lists the subdirectories and files of a directory inside the current working directory."
    }

    fn parameters(&self) -> &[ToolParam] {
        LIST_PARAMS
    }

    fn call(&self, args: &ToolArgs) -> Result<String, ToolError> {
        files::list_files(
            &self.workspace,
            args.optional_str("directory"),
            self.options,
        )
    }
}
