//! Interactive prompt: command parsing and dispatch to the session.

use std::io::{BufRead, Write};

use tracing::warn;

use hawk_chat::{ChatError, ConversationSession, DataLoader, ResponseGenerator};

/// One line typed at the prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Load(String),
    Reset,
    Help,
    Quit,
    Ask(String),
    Empty,
}

impl Command {
    pub fn parse(line: &str) -> Self {
        let line = line.trim();
        let words: Vec<&str> = line.split_whitespace().collect();
        let Some((head, rest)) = words.split_first() else {
            return Command::Empty;
        };
        match (head.to_lowercase().as_str(), rest) {
            ("quit" | "exit", []) => Command::Quit,
            ("reset", []) => Command::Reset,
            ("help", []) => Command::Help,
            // "load project tusd" reads the same as "load tusd"
            ("load", [keyword, name]) if keyword.eq_ignore_ascii_case("project") => {
                Command::Load(name.to_string())
            }
            ("load", [name]) if !name.eq_ignore_ascii_case("project") => {
                Command::Load(name.to_string())
            }
            _ => Command::Ask(line.to_string()),
        }
    }
}

pub const HELP_TEXT: &str = "\
Commands:
  load <project>   Load the mailbox export of a project
  reset            Unload the project and forget the conversation
  help             Show this help
  quit | exit      Leave

Example questions:
  Do you see any communication related to tusd?
  Who is the communication hung on?
  What communications are stuck?
  Show me the project status";

/// Drives a session from line-oriented input.
pub struct Repl<'a> {
    session: ConversationSession,
    loader: &'a dyn DataLoader,
    responder: ResponseGenerator,
    json: bool,
}

impl<'a> Repl<'a> {
    pub fn new(
        session: ConversationSession,
        loader: &'a dyn DataLoader,
        responder: ResponseGenerator,
        json: bool,
    ) -> Self {
        Self {
            session,
            loader,
            responder,
            json,
        }
    }

    pub fn session(&self) -> &ConversationSession {
        &self.session
    }

    /// Execute one command and return the text to print, or `None` to stop.
    pub fn execute(&mut self, command: Command) -> Option<String> {
        let output = match command {
            Command::Quit => return None,
            Command::Empty => String::new(),
            Command::Help => HELP_TEXT.to_string(),
            Command::Reset => {
                self.session.reset();
                "Session reset. No project is loaded.".to_string()
            }
            Command::Load(project) => self.load(&project),
            Command::Ask(query) => self.ask(&query),
        };
        Some(output)
    }

    /// Load `project`, reporting the outcome as printable text.
    pub fn load(&mut self, project: &str) -> String {
        match self.session.load_project(self.loader, project) {
            Ok(count) if self.json => {
                serde_json::json!({ "project": project, "records": count }).to_string()
            }
            Ok(count) => format!("Loaded {} messages for '{}'.", count, project),
            Err(err) => self.render_error(&err),
        }
    }

    fn ask(&mut self, query: &str) -> String {
        match self.session.ask(query) {
            Ok(payload) if self.json => serde_json::to_string_pretty(&payload)
                .unwrap_or_else(|e| format!("{{\"error\": \"{}\"}}", e)),
            Ok(payload) => {
                let response = self.responder.compose(&payload);
                let mut text = response.answer;
                if !response.suggestions.is_empty() {
                    text.push_str("\n\nYou could also ask:");
                    for suggestion in &response.suggestions {
                        text.push_str(&format!("\n  - {}", suggestion));
                    }
                }
                text
            }
            Err(err) => self.render_error(&err),
        }
    }

    fn render_error(&self, err: &ChatError) -> String {
        if self.json {
            return serde_json::json!({ "error": err.to_string() }).to_string();
        }
        match err {
            ChatError::NotLoaded => ResponseGenerator::not_loaded_response().answer,
            ChatError::DataUnavailable { project, reason } => {
                ResponseGenerator::unavailable_response(project, reason).answer
            }
            other => format!("Error: {}", other),
        }
    }

    /// Read commands from `input` until EOF or `quit`.
    pub fn run<R: BufRead, W: Write>(&mut self, input: R, mut output: W) -> std::io::Result<()> {
        if !self.json {
            writeln!(output, "Hawk - ask about communications, status, or who needs to respond.")?;
            writeln!(output, "Type 'help' for commands.")?;
        }
        prompt(&mut output, self.json)?;
        for line in input.lines() {
            let line = match line {
                Ok(line) => line,
                Err(e) => {
                    warn!(error = %e, "Failed to read input");
                    break;
                }
            };
            let Some(text) = self.execute(Command::parse(&line)) else {
                break;
            };
            if !text.is_empty() {
                writeln!(output, "{}", text)?;
            }
            prompt(&mut output, self.json)?;
        }
        Ok(())
    }
}

fn prompt<W: Write>(output: &mut W, json: bool) -> std::io::Result<()> {
    if !json {
        write!(output, "hawk> ")?;
        output.flush()?;
    }
    Ok(())
}
