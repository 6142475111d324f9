use std::io::{BufRead, Write};

use super::error::RenderError;

/// Something that decides when a paused view may be left
pub trait Acknowledge {
    /// Block until the current view is acknowledged
    fn wait(&mut self) -> Result<(), RenderError>;
}

/// Blocks on a line of terminal input
#[derive(Debug)]
pub struct TerminalPrompt<R: BufRead, W: Write> {
    input: R,
    output: W,
}

impl TerminalPrompt<std::io::StdinLock<'static>, std::io::Stdout> {
    pub fn stdin() -> Self {
        Self::new(std::io::stdin().lock(), std::io::stdout())
    }
}

impl<R: BufRead, W: Write> TerminalPrompt<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }
}

impl<R: BufRead, W: Write> Acknowledge for TerminalPrompt<R, W> {
    fn wait(&mut self) -> Result<(), RenderError> {
        write!(self.output, "Press [enter] to continue")?;
        self.output.flush()?;
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Err(RenderError::InputClosed);
        }
        Ok(())
    }
}

/// Never blocks; used when views are written out in batch
#[derive(Debug, Default)]
pub struct AutoAcknowledge;

impl Acknowledge for AutoAcknowledge {
    fn wait(&mut self) -> Result<(), RenderError> {
        Ok(())
    }
}

/// Counts acknowledgments and can refuse after a given number
#[cfg(test)]
#[derive(Debug, Default)]
pub(crate) struct CountingAck {
    pub count: usize,
    pub fail_after: Option<usize>,
}

#[cfg(test)]
impl Acknowledge for CountingAck {
    fn wait(&mut self) -> Result<(), RenderError> {
        if self.fail_after.is_some_and(|limit| self.count >= limit) {
            return Err(RenderError::InputClosed);
        }
        self.count += 1;
        Ok(())
    }
}
