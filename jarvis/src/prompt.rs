//! Interactive questions on the terminal

use eyre::Result;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;

/// Source of answers to interactive questions
pub trait Prompt {
    /// Ask `question`; `None` when input has ended (Ctrl+D or Ctrl+C)
    fn ask(&mut self, question: &str) -> Result<Option<String>>;
}

/// Line-edited prompt on the controlling terminal
#[derive(Default)]
pub struct ReadlinePrompt {
    rl: Option<DefaultEditor>,
}

impl ReadlinePrompt {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Prompt for ReadlinePrompt {
    fn ask(&mut self, question: &str) -> Result<Option<String>> {
        // Created on first use so commands that never prompt don't touch the terminal
        let rl = match self.rl.take() {
            Some(rl) => rl,
            None => DefaultEditor::new().map_err(|e| eyre::eyre!("Failed to initialize readline: {}", e))?,
        };
        let rl = self.rl.insert(rl);

        match rl.readline(question) {
            Ok(line) => Ok(Some(line.trim().to_string())),
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => Ok(None),
            Err(err) => Err(eyre::eyre!("Readline error: {}", err)),
        }
    }
}
