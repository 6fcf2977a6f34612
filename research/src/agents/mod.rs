//! Tool-calling agents and the research team built from configuration.
//!
//! An [`Agent`] is a chat loop over a [`ChatBackend`]: the model either answers or
//! asks for tool calls, whose outputs are fed back until it answers or runs out of
//! steps. Sub-agents are handed to their manager as ordinary tools
//! ([`managed::ManagedAgentTool`]).

use std::fmt;
use std::rc::Rc;

use anyhow::{Context, Result, anyhow};
use tracing::{info, instrument, warn};

use crate::tools::{ToolDefinition, ToolRegistry};

use backend::{ChatBackend, ChatMessage, ChatReply, ChatRequest};

pub mod backend;
pub mod managed;
pub mod team;

/// Sent once the step budget is spent, with tools withdrawn.
const FINAL_ANSWER_NUDGE: &str = "You have reached the maximum number of steps. \
Do not call any more tools. Give your best final answer to the task now, based on what you \
have gathered so far.";

/// Identity and model settings of one agent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentProfile {
    pub name: String,
    /// Shown to a managing agent when this one is exposed as a tool.
    pub description: String,
    pub model: String,
    pub api_key: String,
    pub system_prompt: String,
    pub max_steps: u32,
}

pub struct Agent {
    profile: AgentProfile,
    tools: ToolRegistry,
    backend: Rc<dyn ChatBackend>,
}

impl fmt::Debug for Agent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Agent")
            .field("name", &self.profile.name)
            .field("model", &self.profile.model)
            .field("tools", &self.tools)
            .field("max_steps", &self.profile.max_steps)
            .finish_non_exhaustive()
    }
}

impl Agent {
    pub fn new(profile: AgentProfile, tools: ToolRegistry, backend: Rc<dyn ChatBackend>) -> Self {
        Self {
            profile,
            tools,
            backend,
        }
    }

    pub fn name(&self) -> &str {
        &self.profile.name
    }

    pub fn description(&self) -> &str {
        &self.profile.description
    }

    pub fn profile(&self) -> &AgentProfile {
        &self.profile
    }

    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    /// Work on `task` until the model gives a plain answer.
    #[instrument(skip_all, fields(agent = %self.profile.name, model = %self.profile.model))]
    pub fn run(&self, task: &str) -> Result<String> {
        let definitions = self.tools.definitions();
        let mut messages = vec![
            ChatMessage::system(self.profile.system_prompt.as_str()),
            ChatMessage::user(task),
        ];

        for step in 1..=self.profile.max_steps {
            let reply = self
                .ask(&messages, &definitions)
                .with_context(|| format!("{} step {step}", self.profile.name))?;

            if reply.tool_calls.is_empty() {
                info!(step, "agent answered");
                return final_text(&self.profile.name, reply);
            }

            let calls = reply.tool_calls.clone();
            messages.push(ChatMessage::assistant(reply.content, reply.tool_calls));
            for call in &calls {
                info!(step, tool = %call.name, "calling tool");
                let output = self.tools.dispatch(&call.name, &call.arguments);
                messages.push(ChatMessage::tool_result(call.id.as_str(), output));
            }
        }

        warn!(
            max_steps = self.profile.max_steps,
            "step budget spent, requesting final answer"
        );
        messages.push(ChatMessage::user(FINAL_ANSWER_NUDGE));
        let reply = self
            .ask(&messages, &[])
            .with_context(|| format!("{} final answer", self.profile.name))?;
        final_text(&self.profile.name, reply)
    }

    fn ask(&self, messages: &[ChatMessage], tools: &[ToolDefinition]) -> Result<ChatReply> {
        self.backend.complete(&ChatRequest {
            model: &self.profile.model,
            api_key: &self.profile.api_key,
            messages,
            tools,
        })
    }
}

fn final_text(agent: &str, reply: ChatReply) -> Result<String> {
    match reply.content {
        Some(text) if !text.trim().is_empty() => Ok(text.trim().to_string()),
        _ => Err(anyhow!("{agent} returned an empty answer")),
    }
}
