// Interactive input used by the range confirmation and the rate selection

use std::collections::VecDeque;
use std::io::{self, BufRead, Stdin, StdinLock, Stdout, Write};

/// Source of answers to interactive questions.
pub trait Prompt {
    /// Shows `question` and returns the answer without its line terminator,
    /// or `None` once the input is exhausted.
    fn ask(&mut self, question: &str) -> io::Result<Option<String>>;
}

/// Reads answers line by line from a reader, echoing questions to a writer.
pub struct ConsolePrompt<R, W> {
    reader: R,
    writer: W,
}

impl<R: BufRead, W: Write> ConsolePrompt<R, W> {
    pub fn new(reader: R, writer: W) -> Self {
        Self { reader, writer }
    }
}

impl ConsolePrompt<StdinLock<'static>, Stdout> {
    pub fn stdin() -> Self {
        let stdin: Stdin = io::stdin();
        Self::new(stdin.lock(), io::stdout())
    }
}

impl<R: BufRead, W: Write> Prompt for ConsolePrompt<R, W> {
    fn ask(&mut self, question: &str) -> io::Result<Option<String>> {
        write!(self.writer, "{}", question)?;
        self.writer.flush()?;

        let mut line = String::new();
        if self.reader.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(strip_line_terminator(&line).to_string()))
    }
}

fn strip_line_terminator(line: &str) -> &str {
    line.strip_suffix('\n')
        .map(|l| l.strip_suffix('\r').unwrap_or(l))
        .unwrap_or(line)
}

/// Answers questions from a fixed script and remembers what was asked.
#[derive(Debug, Default)]
pub struct ScriptedPrompt {
    answers: VecDeque<String>,
    asked: Vec<String>,
}

impl ScriptedPrompt {
    pub fn new<I, S>(answers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            answers: answers.into_iter().map(Into::into).collect(),
            asked: Vec::new(),
        }
    }

    pub fn asked(&self) -> &[String] {
        &self.asked
    }

    pub fn remaining(&self) -> usize {
        self.answers.len()
    }
}

impl Prompt for ScriptedPrompt {
    fn ask(&mut self, question: &str) -> io::Result<Option<String>> {
        self.asked.push(question.to_string());
        Ok(self.answers.pop_front())
    }
}
