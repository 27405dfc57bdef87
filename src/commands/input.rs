use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use clap::Args;

use crate::errors::CliError;
use crate::script::Script;

#[derive(Debug, Args)]
pub struct ScriptArgs {
    /// Script text
    pub script: Option<String>,
    /// Read the script from a file
    #[arg(short = 'f', long = "file", conflicts_with = "stdin")]
    pub file: Option<PathBuf>,
    /// Read the script from stdin
    #[arg(long)]
    pub stdin: bool,
}

/// Collect the script from whichever source was given. Blank text is passed
/// through; the components decide what an empty script means.
pub fn resolve_script(args: &ScriptArgs) -> Result<Script, CliError> {
    if args.stdin {
        let mut input = String::new();
        io::stdin()
            .read_to_string(&mut input)
            .map_err(|e| CliError::Generic(format!("Failed reading stdin: {e}")))?;
        return Ok(Script::new(input));
    }

    if let Some(path) = &args.file {
        return read_script_file(path);
    }

    Ok(Script::new(args.script.as_deref().unwrap_or_default()))
}

pub fn read_script_file(path: &Path) -> Result<Script, CliError> {
    let text = fs::read_to_string(path).map_err(|e| {
        CliError::Usage(format!("Failed reading script {}: {e}", path.display()))
    })?;
    Ok(Script::new(text))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inline_text_becomes_script() {
        let args = ScriptArgs {
            script: Some("  INT. BARN - DAY  ".to_string()),
            file: None,
            stdin: false,
        };
        assert_eq!(resolve_script(&args).unwrap().as_str(), "INT. BARN - DAY");
    }

    #[test]
    fn missing_text_is_blank_not_an_error() {
        let args = ScriptArgs {
            script: None,
            file: None,
            stdin: false,
        };
        assert!(resolve_script(&args).unwrap().is_blank());
    }

    #[test]
    fn unreadable_file_is_usage_error() {
        let args = ScriptArgs {
            script: None,
            file: Some(PathBuf::from("/definitely/not/here.fountain")),
            stdin: false,
        };
        assert!(matches!(resolve_script(&args), Err(CliError::Usage(_))));
    }
}
