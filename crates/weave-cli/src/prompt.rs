//! Interactive stdin/stdout `Prompter`.

use crate::colors::{bold, cyan, gray};
use std::io::Write;
use weave_engine::{PromptKind, Prompter};

pub struct TerminalPrompter;

impl Prompter for TerminalPrompter {
    fn prompt(
        &mut self,
        kind: PromptKind,
        id: &str,
        prompt_text: &str,
        help: Option<&str>,
        options: Option<&[String]>,
        default: Option<&str>,
    ) -> Option<String> {
        if let Some(help) = help {
            println!("  {}", gray(help));
        }
        if let (PromptKind::Enum | PromptKind::List, Some(options)) = (kind, options) {
            for (index, option) in options.iter().enumerate() {
                println!("  {}) {option}", index + 1);
            }
        }

        let suffix = match default {
            Some(d) => format!(" [{d}]"),
            None => String::new(),
        };
        print!("{} {id}{suffix}: ", cyan(&bold(prompt_text)));
        std::io::stdout().flush().ok()?;

        let mut line = String::new();
        std::io::stdin().read_line(&mut line).ok()?;
        Some(line.trim().to_string())
    }
}
