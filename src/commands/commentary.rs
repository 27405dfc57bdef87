use clap::Args;
use serde_json::json;

use crate::app::Runtime;
use crate::commands::input::{ScriptArgs, resolve_script};
use crate::commentary::CommentaryRequester;
use crate::errors::CliError;

#[derive(Debug, Args)]
pub struct CommentaryArgs {
    #[command(flatten)]
    pub input: ScriptArgs,
    /// Override the chat model for this request
    #[arg(short = 'm', long = "model")]
    pub model: Option<String>,
}

pub async fn handle(runtime: &Runtime, args: CommentaryArgs) -> Result<(), CliError> {
    let script = resolve_script(&args.input)?;
    let requester = match args.model.as_deref().map(str::trim).filter(|m| !m.is_empty()) {
        Some(model) => CommentaryRequester::new(runtime.api_client()?, model),
        None => runtime.commentary()?,
    };

    if !script.is_blank() {
        runtime
            .output
            .print_busy("Loading commentary, please wait...");
    }
    let completion = requester.request_commentary(&script).await?;

    if runtime.output.json {
        runtime.output.print_json(&json!({
            "commentary": completion.text,
            "model": completion.model,
            "usage": completion.usage,
        }))?;
        return Ok(());
    }

    runtime.output.print_human(&completion.text);
    runtime.output.print_verbose(&format!(
        "model={} {}",
        completion.model.as_deref().unwrap_or(requester.model()),
        completion.usage
    ));
    Ok(())
}
