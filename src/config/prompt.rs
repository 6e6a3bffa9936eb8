use crate::prelude::*;
use std::io::{self, BufRead};

/// Source of the values missing from the configuration file.
pub trait Prompt {
    fn read_line(&mut self, question: &str) -> Result<String>;

    /// Same as [`Self::read_line()`], but without echoing the answer back.
    fn read_password(&mut self, question: &str) -> Result<String>;
}

#[derive(Debug, Default)]
pub struct TerminalPrompt;

impl Prompt for TerminalPrompt {
    fn read_line(&mut self, question: &str) -> Result<String> {
        let mut stdout = io::stdout();

        write!(stdout, "{}", question)?;
        stdout.flush()?;

        let mut line = String::new();

        if io::stdin().lock().read_line(&mut line)? == 0 {
            bail!("Reached end of input");
        }

        Ok(line.trim_end_matches(|c: char| c == '\r' || c == '\n').to_owned())
    }

    fn read_password(&mut self, question: &str) -> Result<String> {
        Ok(rpassword::prompt_password(question)?)
    }
}

/// Answers questions from a fixed list and remembers what was asked.
#[cfg(test)]
#[derive(Debug, Default)]
pub struct ScriptedPrompt {
    answers: std::collections::VecDeque<String>,
    asked: Vec<String>,
}

#[cfg(test)]
impl ScriptedPrompt {
    pub fn new<'a>(answers: impl IntoIterator<Item = &'a str>) -> Self {
        Self {
            answers: answers.into_iter().map(Into::into).collect(),
            asked: Default::default(),
        }
    }

    pub fn asked(&self) -> &[String] {
        &self.asked
    }

    fn answer(&mut self) -> Result<String> {
        self.answers
            .pop_front()
            .ok_or_else(|| anyhow!("Ran out of scripted answers"))
    }
}

#[cfg(test)]
impl Prompt for ScriptedPrompt {
    fn read_line(&mut self, question: &str) -> Result<String> {
        self.asked.push(format!("line: {}", question));
        self.answer()
    }

    fn read_password(&mut self, question: &str) -> Result<String> {
        self.asked.push(format!("password: {}", question));
        self.answer()
    }
}
