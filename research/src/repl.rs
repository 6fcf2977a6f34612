//! Interactive prompt loop.
//!
//! Reads one research request per line, hands it to a [`ResearchSession`] and
//! prints the answer. Request failures are reported and the loop continues; only
//! an exit keyword or end of input stops it.

use std::io::{BufRead, Write};

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::agents::Agent;

const PROMPT: &str = "What would you like to research? > ";
const EXIT_KEYWORDS: &[&str] = &["exit", "quit", "q", "bye"];

/// Anything that can answer a research request.
pub trait ResearchSession {
    fn research(&mut self, request: &str) -> Result<String>;
}

impl ResearchSession for Agent {
    fn research(&mut self, request: &str) -> Result<String> {
        self.run(request)
    }
}

pub fn is_exit_keyword(input: &str) -> bool {
    let input = input.trim();
    EXIT_KEYWORDS
        .iter()
        .any(|keyword| input.eq_ignore_ascii_case(keyword))
}

/// Startup lines shown before the first prompt.
pub fn write_banner<W: Write>(out: &mut W, save_dir: Option<&str>) -> Result<()> {
    writeln!(out, "Research assistant is ready. Type 'exit' to quit.")?;
    if let Some(dir) = save_dir {
        writeln!(
            out,
            "Webpage content can be saved to files in the '{dir}' directory."
        )?;
    }
    Ok(())
}

/// Run the prompt loop until an exit keyword or end of input.
pub fn run_repl<R, W, S>(mut input: R, out: &mut W, session: &mut S) -> Result<()>
where
    R: BufRead,
    W: Write,
    S: ResearchSession,
{
    let mut line = String::new();
    loop {
        write!(out, "\n{PROMPT}")?;
        out.flush().context("flush prompt")?;

        line.clear();
        if input.read_line(&mut line).context("read request")? == 0 {
            writeln!(out)?;
            break;
        }

        let request = line.trim();
        if is_exit_keyword(request) {
            writeln!(out, "Exiting research assistant. Goodbye!")?;
            break;
        }
        if request.is_empty() {
            continue;
        }

        info!(chars = request.len(), "processing request");
        writeln!(out, "\nProcessing your request...")?;
        match session.research(request) {
            Ok(answer) => {
                writeln!(out, "\n--- Research Results ---")?;
                writeln!(out, "{answer}")?;
                writeln!(out, "----------------------")?;
            }
            Err(err) => {
                warn!(err = %format!("{err:#}"), "request failed");
                writeln!(out, "\nAn error occurred: {err:#}")?;
                writeln!(out, "Please try again with a different query.")?;
            }
        }
    }
    writeln!(out, "Research assistant has been shut down.")?;
    Ok(())
}
