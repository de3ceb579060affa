//! `cloudfs completions <shell>`
//!
//! ```text
//! cloudfs completions bash > ~/.local/share/bash-completion/completions/cloudfs
//! cloudfs completions zsh > "${fpath[1]}/_cloudfs"
//! ```

use std::io::Write;

use anyhow::{Context, Result};
use clap::CommandFactory;
use clap_complete::Shell;

use crate::output::OutputFormat;

/// Binary name the completion scripts are registered for
const BIN_NAME: &str = "cloudfs";

#[derive(Debug, clap::Args)]
pub struct CompletionsCommand {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,
}

impl CompletionsCommand {
    /// Prints the completion script to stdout
    ///
    /// The script is raw shell code, so `--json` has no effect.
    pub async fn execute(&self, _format: OutputFormat) -> Result<()> {
        let script = render(self.shell);
        let mut stdout = std::io::stdout().lock();
        stdout
            .write_all(&script)
            .context("Failed to write completions to stdout")?;
        stdout.flush().context("Failed to flush stdout")?;
        Ok(())
    }
}

fn render(shell: Shell) -> Vec<u8> {
    let mut cmd = crate::Cli::command();
    let mut script = Vec::new();
    clap_complete::generate(shell, &mut cmd, BIN_NAME, &mut script);
    script
}
