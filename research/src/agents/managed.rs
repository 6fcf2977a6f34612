//! Sub-agents exposed to their manager as tools.

use tracing::warn;

use crate::error::ToolError;
use crate::tools::{ParamKind, ResearchTool, ToolArgs, ToolParam};

use super::Agent;

const PARAMS: &[ToolParam] = &[ToolParam::required(
    "task",
    ParamKind::String,
    "Long detailed description of the task. Include every detail the agent needs, since it \
     does not see your conversation.",
)];

/// Wraps an [`Agent`] so a manager can delegate a task to it with one tool call.
#[derive(Debug)]
pub struct ManagedAgentTool {
    agent: Agent,
}

impl ManagedAgentTool {
    pub fn new(agent: Agent) -> Self {
        Self { agent }
    }
}

impl ResearchTool for ManagedAgentTool {
    fn name(&self) -> &str {
        self.agent.name()
    }

    fn description(&self) -> &str {
        self.agent.description()
    }

    fn parameters(&self) -> &[ToolParam] {
        PARAMS
    }

    fn call(&self, args: &ToolArgs) -> Result<String, ToolError> {
        let task = args.required_str("task")?;
        match self.agent.run(task) {
            Ok(answer) => Ok(format!(
                "Here is the final answer from your managed agent '{}':\n{answer}",
                self.agent.name()
            )),
            Err(err) => {
                warn!(agent = self.agent.name(), err = %format!("{err:#}"), "managed agent failed");
                Err(ToolError::AgentFailed {
                    agent: self.agent.name().to_string(),
                    detail: format!("{err:#}"),
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use super::*;
    use crate::agents::AgentProfile;
    use crate::agents::backend::ChatReply;
    use crate::test_support::{ScriptedBackend, tool_call};
    use crate::tools::ToolRegistry;
    use serde_json::json;

    fn sub_agent(backend: Rc<ScriptedBackend>) -> Agent {
        Agent::new(
            AgentProfile {
                name: "helper_agent".to_string(),
                description: "Helps.".to_string(),
                model: "small".to_string(),
                api_key: "k".to_string(),
                system_prompt: "Help.".to_string(),
                max_steps: 3,
            },
            ToolRegistry::new(),
            backend,
        )
    }

    #[test]
    fn delegates_task_and_wraps_answer() {
        let sub_backend = Rc::new(ScriptedBackend::new([ChatReply::text("42")]));
        let mut registry = ToolRegistry::new();
        registry.register(ManagedAgentTool::new(sub_agent(sub_backend.clone())));

        let definitions = registry.definitions();
        assert_eq!(definitions[0].name, "helper_agent");
        assert_eq!(definitions[0].description, "Helps.");
        assert_eq!(definitions[0].parameters["required"], json!(["task"]));

        let call = tool_call("c1", "helper_agent", json!({"task": "compute"}));
        let out = registry.dispatch(&call.name, &call.arguments);
        assert_eq!(
            out,
            "Here is the final answer from your managed agent 'helper_agent':\n42"
        );
        assert_eq!(
            sub_backend.requests()[0].messages[1].content.as_deref(),
            Some("compute")
        );
    }

    #[test]
    fn sub_agent_failure_becomes_tool_error_text() {
        let sub_backend = Rc::new(ScriptedBackend::default());
        let mut registry = ToolRegistry::new();
        registry.register(ManagedAgentTool::new(sub_agent(sub_backend)));

        let out = registry.dispatch("helper_agent", r#"{"task":"x"}"#);
        assert!(out.starts_with("Error: Agent helper_agent failed:"));
        assert!(out.contains("no replies left"));
    }
}
