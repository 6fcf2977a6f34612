//! Callable research tools and the registry agents dispatch through.
//!
//! A tool declares its parameters up front; the registry turns them into a JSON
//! Schema that is both advertised to the model and used to validate incoming
//! arguments before [`ResearchTool::call`] runs.

use std::fmt;

use jsonschema::{Draft, Validator};
use serde::Serialize;
use serde_json::{Map, Value, json};
use tracing::{debug, warn};

use crate::error::ToolError;

pub mod document;
pub mod files;
pub mod web;

/// Shape of a single tool parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    String,
    StringList,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToolParam {
    pub name: &'static str,
    pub kind: ParamKind,
    pub description: &'static str,
    pub required: bool,
}

impl ToolParam {
    pub const fn required(name: &'static str, kind: ParamKind, description: &'static str) -> Self {
        Self {
            name,
            kind,
            description,
            required: true,
        }
    }

    pub const fn optional(name: &'static str, kind: ParamKind, description: &'static str) -> Self {
        Self {
            name,
            kind,
            description,
            required: false,
        }
    }
}

/// A single operation an agent can call.
pub trait ResearchTool {
    fn name(&self) -> &str;
    fn description(&self) -> &str;
    fn parameters(&self) -> &[ToolParam];
    /// Run the tool. Arguments have already been validated against [`parameters`].
    ///
    /// [`parameters`]: ResearchTool::parameters
    fn call(&self, args: &ToolArgs) -> Result<String, ToolError>;
}

/// Validated call arguments.
#[derive(Debug, Clone, Default)]
pub struct ToolArgs {
    values: Map<String, Value>,
}

impl ToolArgs {
    pub fn new(values: Map<String, Value>) -> Self {
        Self { values }
    }

    pub fn required_str(&self, name: &str) -> Result<&str, ToolError> {
        self.optional_str(name)
            .ok_or_else(|| ToolError::InvalidArgument(format!("missing required argument '{name}'")))
    }

    /// String argument, `None` when absent or null.
    pub fn optional_str(&self, name: &str) -> Option<&str> {
        self.values.get(name).and_then(Value::as_str)
    }

    pub fn optional_string(&self, name: &str) -> Option<String> {
        self.optional_str(name).map(str::to_string)
    }

    /// List-of-strings argument, empty when absent.
    pub fn str_list(&self, name: &str) -> Vec<String> {
        self.values
            .get(name)
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// Function definition advertised to the model.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

/// JSON Schema for a tool's arguments object.
///
/// Optional parameters also accept `null`, which models commonly send for
/// fields they leave unset.
pub fn parameters_schema(params: &[ToolParam]) -> Value {
    let mut properties = Map::new();
    let mut required = Vec::new();
    for param in params {
        let schema = match (param.kind, param.required) {
            (ParamKind::String, true) => {
                json!({"type": "string", "description": param.description})
            }
            (ParamKind::String, false) => {
                json!({"type": ["string", "null"], "description": param.description})
            }
            (ParamKind::StringList, true) => json!({
                "type": "array",
                "items": {"type": "string"},
                "description": param.description,
            }),
            (ParamKind::StringList, false) => json!({
                "type": ["array", "null"],
                "items": {"type": "string"},
                "description": param.description,
            }),
        };
        properties.insert(param.name.to_string(), schema);
        if param.required {
            required.push(Value::String(param.name.to_string()));
        }
    }
    json!({
        "type": "object",
        "properties": properties,
        "required": required,
        "additionalProperties": false,
    })
}

/// A registered tool with its argument validator, compiled once.
struct Entry {
    tool: Box<dyn ResearchTool>,
    validator: Result<Validator, String>,
}

impl Entry {
    fn new(tool: Box<dyn ResearchTool>) -> Self {
        let validator = jsonschema::options()
            .with_draft(Draft::Draft202012)
            .build(&parameters_schema(tool.parameters()))
            .map_err(|e| e.to_string());
        if let Err(err) = &validator {
            warn!(tool = tool.name(), %err, "tool schema does not compile");
        }
        Self { tool, validator }
    }

    fn validate(&self, args: &Value) -> Result<(), ToolError> {
        let name = self.tool.name();
        let validator = self.validator.as_ref().map_err(|e| {
            ToolError::InvalidArgument(format!("schema for {name} is invalid: {e}"))
        })?;
        let messages: Vec<String> = validator
            .iter_errors(args)
            .map(|err| err.to_string())
            .collect();
        if !messages.is_empty() {
            return Err(ToolError::InvalidArgument(format!(
                "invalid arguments for {name}: {}",
                messages.join("; ")
            )));
        }
        Ok(())
    }
}

/// Ordered set of tools available to one agent.
#[derive(Default)]
pub struct ToolRegistry {
    entries: Vec<Entry>,
}

impl fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("tools", &self.names())
            .finish()
    }
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a tool. A later tool with the same name shadows nothing: names must be unique.
    pub fn register(&mut self, tool: impl ResearchTool + 'static) -> &mut Self {
        self.register_boxed(Box::new(tool))
    }

    pub fn register_boxed(&mut self, tool: Box<dyn ResearchTool>) -> &mut Self {
        debug_assert!(
            self.get(tool.name()).is_none(),
            "duplicate tool name {}",
            tool.name()
        );
        self.entries.push(Entry::new(tool));
        self
    }

    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|entry| entry.tool.name()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&dyn ResearchTool> {
        self.entry(name).map(|entry| entry.tool.as_ref())
    }

    fn entry(&self, name: &str) -> Option<&Entry> {
        self.entries.iter().find(|entry| entry.tool.name() == name)
    }

    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.entries
            .iter()
            .map(|Entry { tool, .. }| ToolDefinition {
                name: tool.name().to_string(),
                description: tool.description().to_string(),
                parameters: parameters_schema(tool.parameters()),
            })
            .collect()
    }

    /// Validate `args` against the tool's schema and run it.
    pub fn invoke(&self, name: &str, args: Value) -> Result<String, ToolError> {
        let entry = self.entry(name).ok_or_else(|| {
            ToolError::InvalidArgument(format!(
                "unknown tool '{name}' (available: {})",
                self.names().join(", ")
            ))
        })?;

        let args = match args {
            Value::Null => Value::Object(Map::new()),
            other => other,
        };
        entry.validate(&args)?;
        let Value::Object(values) = args else {
            return Err(ToolError::InvalidArgument(format!(
                "arguments for {name} must be a JSON object"
            )));
        };
        entry.tool.call(&ToolArgs::new(values))
    }

    /// Run a tool from raw model output and render the outcome as text.
    ///
    /// Errors are returned as their display string so the model can read them and
    /// adjust; nothing here propagates.
    pub fn dispatch(&self, name: &str, raw_args: &str) -> String {
        let args = if raw_args.trim().is_empty() {
            Value::Object(Map::new())
        } else {
            match serde_json::from_str(raw_args) {
                Ok(value) => value,
                Err(err) => {
                    warn!(tool = name, err = %err, "tool arguments are not valid JSON");
                    return ToolError::InvalidArgument(format!(
                        "arguments for {name} are not valid JSON: {err}"
                    ))
                    .to_string();
                }
            }
        };
        match self.invoke(name, args) {
            Ok(output) => {
                debug!(tool = name, bytes = output.len(), "tool succeeded");
                output
            }
            Err(err) => {
                warn!(tool = name, err = %err, "tool failed");
                err.to_string()
            }
        }
    }
}
