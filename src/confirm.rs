use std::io::{self, BufRead, Write};

use anyhow::Result;

/// Asks the operator before anything irreversible happens.
pub trait Confirm {
	fn confirm(&mut self, question: &str) -> Result<bool>;
}

/// Pre-answers every question with yes (`--yes`).
pub struct AssumeYes;

impl Confirm for AssumeYes {
	fn confirm(&mut self, question: &str) -> Result<bool> {
		log::info!("{question} [y/n]: y (--yes)");
		Ok(true)
	}
}

/// Strict y/n prompt: anything other than yes or no asks again, and end
/// of input counts as no.
pub struct LinePrompt<R, W> {
	input: R,
	output: W,
}

impl<R: BufRead, W: Write> LinePrompt<R, W> {
	pub fn new(input: R, output: W) -> Self {
		Self { input, output }
	}
}

impl LinePrompt<io::StdinLock<'static>, io::Stdout> {
	pub fn terminal() -> Self {
		Self::new(io::stdin().lock(), io::stdout())
	}
}

impl<R: BufRead, W: Write> Confirm for LinePrompt<R, W> {
	fn confirm(&mut self, question: &str) -> Result<bool> {
		loop {
			write!(self.output, "{question} [y/n]: ")?;
			self.output.flush()?;

			let mut line = String::new();
			if self.input.read_line(&mut line)? == 0 {
				writeln!(self.output)?;
				return Ok(false);
			}
			match line.trim().to_ascii_lowercase().as_str() {
				"y" | "yes" => return Ok(true),
				"n" | "no" => return Ok(false),
				_ => {}
			}
		}
	}
}
