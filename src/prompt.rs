//! Interactive questions on the terminal
//!
//! Each question runs a small state machine: it stays in `Prompting` until an answer parses,
//! ending in `Valid`, or until input closes (or the optional attempt limit runs out), ending in
//! `Aborted`. Reader and writer are injected so the same code runs against stdin or a test buffer.

use std::io::{self, BufRead, IsTerminal, Write};

use log::info;

use crate::error::{JobError, Result};

/// attempts allowed when answers are piped in
const PIPED_ATTEMPTS: usize = 3;

enum PromptState<T> {
    Prompting,
    Valid(T),
    Aborted,
}

pub struct Prompter {
    input: Box<dyn BufRead>,
    output: Box<dyn Write>,
    assume_yes: bool,
    max_attempts: Option<usize>,
}

impl Prompter {
    pub fn new(input: impl BufRead + 'static, output: impl Write + 'static) -> Self {
        Prompter {
            input: Box::new(input),
            output: Box::new(output),
            assume_yes: false,
            max_attempts: None,
        }
    }

    /// Prompts on stdin / stderr
    ///
    /// When stdin is not a terminal nobody can correct a bad answer, so a few attempts are allowed.
    pub fn stdio() -> Self {
        let prompter = Self::new(io::BufReader::new(io::stdin()), io::stderr());
        if io::stdin().is_terminal() {
            prompter
        } else {
            prompter.max_attempts(PIPED_ATTEMPTS)
        }
    }

    /// Answer every yes/no question with yes without reading input
    pub fn assume_yes(mut self, yes: bool) -> Self {
        self.assume_yes = yes;
        self
    }

    /// Give up after `attempts` unparseable answers instead of asking forever
    pub fn max_attempts(mut self, attempts: usize) -> Self {
        self.max_attempts = Some(attempts);
        self
    }

    /// Ask a yes/no question
    pub fn confirm(&mut self, question: &str) -> Result<bool> {
        if self.assume_yes {
            info!("Answering yes to: {question}");
            return Ok(true);
        }
        self.ask(&format!("{question} [y/n] "), parse_yes_no)
    }

    /// Ask for a whole number of hours, digits only
    pub fn hours(&mut self, question: &str) -> Result<String> {
        self.ask(&format!("{question} "), |answer| {
            is_digits(answer).then(|| answer.to_string())
        })
    }

    fn ask<T>(&mut self, question: &str, parse: impl Fn(&str) -> Option<T>) -> Result<T> {
        let mut state = PromptState::Prompting;
        let mut attempts = 0;
        loop {
            state = match state {
                PromptState::Valid(value) => return Ok(value),
                PromptState::Aborted => return Err(JobError::PromptAborted),
                PromptState::Prompting => {
                    if self.max_attempts.is_some_and(|max| attempts >= max) {
                        PromptState::Aborted
                    } else {
                        attempts += 1;
                        write!(self.output, "{question}")?;
                        self.output.flush()?;
                        let mut line = String::new();
                        if self.input.read_line(&mut line)? == 0 {
                            PromptState::Aborted
                        } else {
                            match parse(line.trim()) {
                                Some(value) => PromptState::Valid(value),
                                None => PromptState::Prompting,
                            }
                        }
                    }
                }
            }
        }
    }
}

fn parse_yes_no(answer: &str) -> Option<bool> {
    match answer.to_ascii_lowercase().as_str() {
        "y" | "yes" => Some(true),
        "n" | "no" => Some(false),
        _ => None,
    }
}

/// `^[0-9]+$`
pub fn is_digits(value: &str) -> bool {
    !value.is_empty() && value.chars().all(|c| c.is_ascii_digit())
}
