//! User input utilities for interactive command-line prompts.

use std::io::{self, BufRead, Write};

use anyhow::{Context, Result};

use agentctl_config::{CredentialPrompt, CredentialSpec};

/// Prompts the user for a string input.
///
/// The input is read from stdin and returned with whitespace trimmed.
pub fn prompt_string(prompt: &str) -> Result<String> {
    print!("{prompt}: ");
    io::stdout().flush().context("Failed to flush stdout")?;

    let mut input = String::new();
    io::stdin()
        .lock()
        .read_line(&mut input)
        .context("Failed to read user input")?;

    Ok(input.trim().to_string())
}

/// Asks on the terminal for credentials that no source could provide.
///
/// An empty answer (or a read error) leaves the credential missing, so
/// the dependent server is skipped.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdinPrompt;

impl CredentialPrompt for StdinPrompt {
    fn ask(&self, server: &str, spec: &CredentialSpec) -> Option<String> {
        let question = format!(
            "{server} needs {} (leave empty to skip)",
            spec.names.join(" or ")
        );
        match prompt_string(&question) {
            Ok(answer) if !answer.is_empty() => Some(answer),
            Ok(_) => None,
            Err(e) => {
                tracing::warn!(server = %server, error = %e, "Could not read credential");
                None
            }
        }
    }
}
