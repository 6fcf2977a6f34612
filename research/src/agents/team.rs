//! Wiring of the research team from [`Settings`].
//!
//! The orchestrator manages three sub-agents (web search, web page, writing),
//! each with its own model, API key and tool set.

use std::rc::Rc;

use anyhow::{Result, bail};

use crate::io::config::{AgentSettings, LlmSettings, Settings};
use crate::io::fetch::WebFetcher;
use crate::io::files::ListingOptions;
use crate::io::templates::TemplateStore;
use crate::io::workspace::Workspace;
use crate::tools::ToolRegistry;
use crate::tools::document::{CompileLatexTool, CreateDocumentTool, ListTemplatesTool};
use crate::tools::files::{CreateFileTool, ListFilesTool, ReadFileTool};
use crate::tools::web::{ExtractPdfTextTool, VisitWebpageTool, WebSearchTool};

use super::backend::ChatBackend;
use super::managed::ManagedAgentTool;
use super::{Agent, AgentProfile};

pub const ORCHESTRATOR: &str = "orchestrator";
pub const WEB_SEARCH_AGENT: &str = "web_search_agent";
pub const WEB_PAGE_AGENT: &str = "web_page_agent";
pub const WRITING_AGENT: &str = "writing_agent";

const ORCHESTRATOR_PROMPT: &str = include_str!("prompts/orchestrator.md");
const WEB_SEARCH_PROMPT: &str = include_str!("prompts/web_search.md");
const WEB_PAGE_PROMPT: &str = include_str!("prompts/web_page.md");
const WRITING_PROMPT: &str = include_str!("prompts/writing.md");

/// Non-empty API key from the configured fallback environment variable.
pub fn api_key_from_env(llm: &LlmSettings) -> Option<String> {
    std::env::var(&llm.api_key_env)
        .ok()
        .filter(|key| !key.trim().is_empty())
}

/// Packaged base prompt followed by the user's additions.
pub fn compose_system_prompt(base: &str, additional: &str) -> String {
    let base = base.trim_end();
    let additional = additional.trim();
    if additional.is_empty() {
        base.to_string()
    } else {
        format!("{base}\n\n{additional}")
    }
}

/// Shared inputs for building every agent of the team.
pub struct TeamBuilder<'a> {
    settings: &'a Settings,
    workspace: &'a Workspace,
    templates: &'a TemplateStore,
    fetcher: &'a WebFetcher,
    backend: Rc<dyn ChatBackend>,
    fallback_api_key: Option<String>,
}

impl<'a> TeamBuilder<'a> {
    pub fn new(
        settings: &'a Settings,
        workspace: &'a Workspace,
        templates: &'a TemplateStore,
        fetcher: &'a WebFetcher,
        backend: Rc<dyn ChatBackend>,
    ) -> Self {
        Self {
            settings,
            workspace,
            templates,
            fetcher,
            backend,
            fallback_api_key: None,
        }
    }

    /// Key used by agents whose configured `api_key` is empty.
    pub fn fallback_api_key(mut self, key: Option<String>) -> Self {
        self.fallback_api_key = key;
        self
    }

    /// The orchestrator with all three sub-agents attached.
    pub fn build(&self) -> Result<Agent> {
        let mut tools = self.reading_tools();
        tools
            .register(ManagedAgentTool::new(self.web_search_agent()?))
            .register(ManagedAgentTool::new(self.web_page_agent()?))
            .register(ManagedAgentTool::new(self.writing_agent()?));

        let profile = self.profile(
            ORCHESTRATOR,
            "Coordinates the research team.",
            "orchestrator",
            &self.settings.orchestrator,
            ORCHESTRATOR_PROMPT,
        )?;
        Ok(Agent::new(profile, tools, self.backend.clone()))
    }

    pub fn web_search_agent(&self) -> Result<Agent> {
        let mut tools = ToolRegistry::new();
        tools.register(WebSearchTool::new(self.fetcher.clone()));
        let profile = self.profile(
            WEB_SEARCH_AGENT,
            "Runs web searches for you.",
            "web_search",
            &self.settings.web_search,
            WEB_SEARCH_PROMPT,
        )?;
        Ok(Agent::new(profile, tools, self.backend.clone()))
    }

    pub fn web_page_agent(&self) -> Result<Agent> {
        let mut tools = ToolRegistry::new();
        tools
            .register(VisitWebpageTool::new(self.fetcher.clone()))
            .register(ExtractPdfTextTool::new(self.fetcher.clone()));

        let saving = &self.settings.file_saving;
        let description = if saving.enabled {
            tools.register(CreateFileTool::new(self.workspace.clone()));
            format!(
                "Accesses web pages and PDF documents for you and can save page content to \
                 files, by default under '{}'. Make sure to only ask for one web page at a time.",
                saving.default_directory
            )
        } else {
            "Accesses web pages and PDF documents for you. Make sure to only ask for one web \
             page at a time."
                .to_string()
        };

        let profile = self.profile(
            WEB_PAGE_AGENT,
            &description,
            "web_page",
            &self.settings.web_page,
            WEB_PAGE_PROMPT,
        )?;
        Ok(Agent::new(profile, tools, self.backend.clone()))
    }

    pub fn writing_agent(&self) -> Result<Agent> {
        let mut tools = self.reading_tools();
        tools
            .register(CreateFileTool::new(self.workspace.clone()))
            .register(ListTemplatesTool::new(self.templates.clone()))
            .register(CreateDocumentTool::new(
                self.workspace.clone(),
                self.templates.clone(),
            ))
            .register(CompileLatexTool::new(
                self.workspace.clone(),
                self.settings.latex.clone(),
            ));
        let profile = self.profile(
            WRITING_AGENT,
            "Writes text and LaTeX section files into the working directory, assembles them \
             into documents from templates and compiles them to PDF.",
            "writing",
            &self.settings.writing,
            WRITING_PROMPT,
        )?;
        Ok(Agent::new(profile, tools, self.backend.clone()))
    }

    /// `read_file`, plus `list_files` when listing is enabled.
    fn reading_tools(&self) -> ToolRegistry {
        let mut tools = ToolRegistry::new();
        tools.register(ReadFileTool::new(self.workspace.clone()));
        let listing = &self.settings.file_listing;
        if listing.enabled {
            tools.register(ListFilesTool::new(
                self.workspace.clone(),
                ListingOptions {
                    show_sizes: listing.show_file_sizes,
                    show_modification_times: listing.show_modification_times,
                },
            ));
        }
        tools
    }

    fn profile(
        &self,
        name: &str,
        description: &str,
        section: &str,
        agent: &AgentSettings,
        base_prompt: &str,
    ) -> Result<AgentProfile> {
        if agent.model.trim().is_empty() {
            bail!("no model configured for {name}: set {section}.model in the configuration");
        }
        let api_key = if agent.api_key.trim().is_empty() {
            match &self.fallback_api_key {
                Some(key) => key.clone(),
                None => bail!(
                    "no API key for {name}: set {section}.api_key in the configuration or export {}",
                    self.settings.llm.api_key_env
                ),
            }
        } else {
            agent.api_key.clone()
        };

        Ok(AgentProfile {
            name: name.to_string(),
            description: description.to_string(),
            model: agent.model.clone(),
            api_key,
            system_prompt: compose_system_prompt(base_prompt, &agent.additional_system_prompt),
            max_steps: self.settings.llm.max_steps,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::backend::ChatReply;
    use crate::io::config::WebSettings;
    use crate::test_support::{ScriptedBackend, TestWorkspace, template_store};

    struct Fixture {
        tw: TestWorkspace,
        _cfg: tempfile::TempDir,
        templates: TemplateStore,
        fetcher: WebFetcher,
    }

    fn fixture() -> Fixture {
        let tw = TestWorkspace::new().expect("workspace");
        let (cfg, templates) = template_store().expect("store");
        let fetcher = WebFetcher::new(&WebSettings::default()).expect("fetcher");
        Fixture {
            tw,
            _cfg: cfg,
            templates,
            fetcher,
        }
    }

    fn keyed_settings() -> Settings {
        let mut settings = Settings::default();
        for agent in [
            &mut settings.orchestrator,
            &mut settings.web_search,
            &mut settings.web_page,
            &mut settings.writing,
        ] {
            agent.api_key = "configured".to_string();
        }
        settings
    }

    fn builder<'a>(
        settings: &'a Settings,
        fx: &'a Fixture,
        backend: Rc<dyn ChatBackend>,
    ) -> TeamBuilder<'a> {
        TeamBuilder::new(settings, fx.tw.workspace(), &fx.templates, &fx.fetcher, backend)
    }

    #[test]
    fn default_team_wiring() {
        let fx = fixture();
        let settings = keyed_settings();
        let team = builder(&settings, &fx, Rc::new(ScriptedBackend::default()));

        let orchestrator = team.build().expect("team");
        assert_eq!(
            orchestrator.tools().names(),
            vec![
                "read_file",
                "list_files",
                WEB_SEARCH_AGENT,
                WEB_PAGE_AGENT,
                WRITING_AGENT
            ]
        );
        assert_eq!(
            team.web_search_agent().expect("agent").tools().names(),
            vec!["web_search"]
        );
        assert_eq!(
            team.web_page_agent().expect("agent").tools().names(),
            vec!["visit_webpage", "extract_pdf_text", "create_file"]
        );
        assert_eq!(
            team.writing_agent().expect("agent").tools().names(),
            vec![
                "read_file",
                "list_files",
                "create_file",
                "list_templates",
                "create_document",
                "compile_latex"
            ]
        );
    }

    #[test]
    fn disabled_features_remove_tools() {
        let fx = fixture();
        let mut settings = keyed_settings();
        settings.file_saving.enabled = false;
        settings.file_listing.enabled = false;
        let team = builder(&settings, &fx, Rc::new(ScriptedBackend::default()));

        let web_page = team.web_page_agent().expect("agent");
        assert_eq!(web_page.tools().names(), vec!["visit_webpage", "extract_pdf_text"]);
        assert!(!web_page.description().contains("save"));
        assert!(!team.build().expect("team").tools().names().contains(&"list_files"));
        assert!(!team.writing_agent().expect("agent").tools().names().contains(&"list_files"));
    }

    #[test]
    fn api_key_falls_back_then_fails() {
        let fx = fixture();
        let settings = Settings::default();

        let err = builder(&settings, &fx, Rc::new(ScriptedBackend::default()))
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("no API key for web_search_agent"));
        assert!(err.to_string().contains("OPENROUTER_API_KEY"));

        let team = builder(&settings, &fx, Rc::new(ScriptedBackend::default()))
            .fallback_api_key(Some("from-env".to_string()));
        assert_eq!(team.build().expect("team").profile().api_key, "from-env");
    }

    #[test]
    fn additional_prompt_is_appended() {
        assert_eq!(compose_system_prompt("Base.\n", ""), "Base.");
        assert_eq!(compose_system_prompt("Base.\n", " Extra. "), "Base.\n\nExtra.");

        let fx = fixture();
        let settings = keyed_settings();
        let team = builder(&settings, &fx, Rc::new(ScriptedBackend::default()));
        let orchestrator = team.build().expect("team");
        let prompt = &orchestrator.profile().system_prompt;
        assert!(prompt.starts_with("You are the lead researcher"));
        assert!(prompt.ends_with(settings.orchestrator.additional_system_prompt.trim()));
    }

    #[test]
    fn orchestrator_delegates_to_sub_agents() {
        let fx = fixture();
        let settings = keyed_settings();
        let backend = Rc::new(ScriptedBackend::new([
            ChatReply::calls(vec![crate::test_support::tool_call(
                "c1",
                WEB_SEARCH_AGENT,
                serde_json::json!({"task": "find rust papers"}),
            )]),
            ChatReply::text("three papers"),
            ChatReply::text("Summary: three papers"),
        ]));
        let team = builder(&settings, &fx, backend.clone());

        let answer = team.build().expect("team").run("research rust").expect("run");
        assert_eq!(answer, "Summary: three papers");

        let requests = backend.requests();
        assert_eq!(requests.len(), 3);
        assert_eq!(requests[1].model, settings.web_search.model);
        assert_eq!(requests[1].tool_names, vec!["web_search"]);
        assert!(
            requests[2]
                .messages
                .last()
                .and_then(|m| m.content.as_deref())
                .unwrap_or_default()
                .contains("managed agent 'web_search_agent':\nthree papers")
        );
    }
}
