//! Interactive input
//!
//! Long text goes through $EDITOR; yes/no questions go through the terminal.

use anyhow::{bail, Context, Result};
use std::env;
use std::fs;
use std::io::{self, Write};
use std::process::Command;

/// Open `initial_content` in the user's editor and return what was saved
pub fn edit_text(initial_content: &str) -> Result<String> {
    let editor = find_editor()?;

    let temp_path = env::temp_dir().join(format!("shelf_edit_{}.txt", std::process::id()));
    fs::write(&temp_path, initial_content)
        .with_context(|| format!("Failed to create temp file: {:?}", temp_path))?;

    let status = Command::new(&editor)
        .arg(&temp_path)
        .status()
        .with_context(|| format!("Failed to run editor: {}", editor));

    let content = match status {
        Ok(status) if status.success() => fs::read_to_string(&temp_path)
            .with_context(|| format!("Failed to read edited file: {:?}", temp_path)),
        Ok(_) => Err(anyhow::anyhow!(
            "Editor '{}' exited with non-zero status. Check that your editor is configured correctly.",
            editor
        )),
        Err(e) => Err(e),
    };

    let _ = fs::remove_file(&temp_path);
    content
}

/// $EDITOR, then $VISUAL, then the first common editor on PATH
fn find_editor() -> Result<String> {
    for var in ["EDITOR", "VISUAL"] {
        if let Ok(editor) = env::var(var) {
            if !editor.is_empty() {
                return Ok(editor);
            }
        }
    }

    for editor in ["nano", "vim", "vi", "emacs", "notepad"] {
        if command_exists(editor) {
            return Ok(editor.to_string());
        }
    }

    bail!(
        "No editor found. Set $EDITOR environment variable.\n\
         Example: export EDITOR=nano"
    )
}

fn command_exists(cmd: &str) -> bool {
    Command::new("which")
        .arg(cmd)
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}

/// Prompt for confirmation
///
/// Returns true if user confirms, false otherwise.
/// In non-interactive mode (no TTY), returns false.
pub fn confirm(prompt: &str) -> Result<bool> {
    if !atty::is(atty::Stream::Stdin) {
        return Ok(false);
    }

    print!("{} [y/N] ", prompt);
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;

    let input = input.trim().to_lowercase();
    Ok(input == "y" || input == "yes")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_exists() {
        #[cfg(unix)]
        assert!(command_exists("ls"));

        assert!(!command_exists("definitely_not_a_real_command_12345"));
    }
}
