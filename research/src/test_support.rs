//! Test-only fixtures: scratch workspaces, template stores, a one-shot HTTP server
//! and a scripted chat backend.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::fs;
use std::io::{Read, Write};
use std::net::TcpListener;
use std::path::Path;
use std::thread;

use anyhow::{Context, Result, anyhow};
use tempfile::TempDir;

use crate::agents::backend::{ChatBackend, ChatMessage, ChatReply, ChatRequest, ToolCall};
use crate::io::config::Settings;
use crate::io::templates::TemplateStore;
use crate::io::workspace::Workspace;

/// A workspace rooted in a fresh temporary directory.
pub struct TestWorkspace {
    _dir: TempDir,
    workspace: Workspace,
}

impl TestWorkspace {
    pub fn new() -> Result<Self> {
        let dir = tempfile::tempdir().context("create temp workspace")?;
        let workspace = Workspace::new(dir.path())?;
        Ok(Self {
            _dir: dir,
            workspace,
        })
    }

    pub fn workspace(&self) -> &Workspace {
        &self.workspace
    }

    pub fn path(&self) -> &Path {
        self.workspace.root()
    }

    /// Write a text file at `rel`, creating parent directories. Panics on failure.
    pub fn write(&self, rel: &str, content: &str) {
        self.write_bytes(rel, content.as_bytes());
    }

    pub fn write_bytes(&self, rel: &str, content: &[u8]) {
        let path = self.path().join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create fixture dir");
        }
        fs::write(&path, content).expect("write fixture");
    }

    pub fn read(&self, rel: &str) -> String {
        fs::read_to_string(self.path().join(rel)).expect("read fixture")
    }

    pub fn exists(&self, rel: &str) -> bool {
        self.path().join(rel).exists()
    }
}

/// Template store with the default registry, rooted in its own temporary config dir.
///
/// Keep the returned `TempDir` alive for as long as the store is used.
pub fn template_store() -> Result<(TempDir, TemplateStore)> {
    let dir = tempfile::tempdir().context("create temp config dir")?;
    let store = TemplateStore::new(dir.path(), Settings::default().templates);
    Ok((dir, store))
}

/// Serve exactly one HTTP response on a loopback port and return the base URL.
///
/// The request (headers and any `Content-Length` body) is read fully before the
/// response is written, so both GET and POST clients see a clean exchange.
pub fn serve_once(status_line: &str, content_type: &str, body: Vec<u8>) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind loopback");
    let addr = listener.local_addr().expect("local addr");
    let head = format!(
        "HTTP/1.1 {status_line}\r\nContent-Type: {content_type}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        body.len()
    );

    thread::spawn(move || {
        let Ok((mut stream, _)) = listener.accept() else {
            return;
        };
        if drain_request(&mut stream).is_err() {
            return;
        }
        let _ = stream.write_all(head.as_bytes());
        let _ = stream.write_all(&body);
        let _ = stream.flush();
    });

    format!("http://{addr}/")
}

fn drain_request(stream: &mut impl Read) -> Result<()> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];
    let header_end = loop {
        let n = stream.read(&mut chunk)?;
        if n == 0 {
            return Err(anyhow!("connection closed before headers ended"));
        }
        buf.extend_from_slice(&chunk[..n]);
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
    };

    let headers = String::from_utf8_lossy(&buf[..header_end]).to_ascii_lowercase();
    let content_length = headers
        .lines()
        .find_map(|line| line.strip_prefix("content-length:"))
        .and_then(|value| value.trim().parse::<usize>().ok())
        .unwrap_or(0);

    let mut received = buf.len() - header_end;
    while received < content_length {
        let n = stream.read(&mut chunk)?;
        if n == 0 {
            break;
        }
        received += n;
    }
    Ok(())
}

/// Shorthand for a tool call with JSON arguments.
pub fn tool_call(id: &str, name: &str, arguments: serde_json::Value) -> ToolCall {
    ToolCall {
        id: id.to_string(),
        name: name.to_string(),
        arguments: arguments.to_string(),
    }
}

/// What a [`ScriptedBackend`] saw on one call.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub model: String,
    pub api_key: String,
    pub messages: Vec<ChatMessage>,
    pub tool_names: Vec<String>,
}

/// Backend that replays queued replies in order and records every request.
#[derive(Default)]
pub struct ScriptedBackend {
    replies: RefCell<VecDeque<ChatReply>>,
    requests: RefCell<Vec<RecordedRequest>>,
}

impl ScriptedBackend {
    pub fn new(replies: impl IntoIterator<Item = ChatReply>) -> Self {
        Self {
            replies: RefCell::new(replies.into_iter().collect()),
            requests: RefCell::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.borrow().clone()
    }

    pub fn remaining(&self) -> usize {
        self.replies.borrow().len()
    }
}

impl ChatBackend for ScriptedBackend {
    fn complete(&self, request: &ChatRequest<'_>) -> Result<ChatReply> {
        self.requests.borrow_mut().push(RecordedRequest {
            model: request.model.to_string(),
            api_key: request.api_key.to_string(),
            messages: request.messages.to_vec(),
            tool_names: request.tools.iter().map(|t| t.name.clone()).collect(),
        });
        self.replies
            .borrow_mut()
            .pop_front()
            .ok_or_else(|| anyhow!("scripted backend has no replies left"))
    }
}
