use std::fs;
use std::path::{Path, PathBuf};

use clap::Args;
use serde_json::json;

use crate::app::Runtime;
use crate::commands::input::{ScriptArgs, resolve_script};
use crate::errors::CliError;
use crate::imaging::GeneratedImage;

#[derive(Debug, Args)]
pub struct ImagesArgs {
    #[command(flatten)]
    pub input: ScriptArgs,
    /// Directory the three stills are written to
    #[arg(short = 'o', long = "out-dir", default_value = "stills")]
    pub out_dir: PathBuf,
    /// Open the first still with the system image viewer
    #[arg(long)]
    pub open: bool,
}

pub async fn handle(runtime: &Runtime, args: ImagesArgs) -> Result<(), CliError> {
    let script = resolve_script(&args.input)?;
    let mut visuals = runtime.visuals()?;

    if !script.is_blank() {
        runtime
            .output
            .print_busy("Generating images, please wait...");
    }
    let sequence = visuals.request_images(&script).await?;

    fs::create_dir_all(&args.out_dir)?;
    let mut saved = Vec::with_capacity(sequence.len());
    for (idx, image) in sequence.images().iter().enumerate() {
        let path = still_path(&args.out_dir, idx, image);
        image.save_png(&path)?;
        saved.push((image, path));
    }

    if runtime.output.json {
        let items = saved
            .iter()
            .map(|(image, path)| {
                json!({
                    "segment": image.segment.as_str(),
                    "path": path,
                    "sourceUrl": image.source_url,
                    "width": image.width(),
                    "height": image.height(),
                })
            })
            .collect::<Vec<_>>();
        runtime.output.print_json(&json!({ "images": items }))?;
    } else {
        for (image, path) in &saved {
            runtime.output.print_human(&format!(
                "{:<9} {}",
                image.segment.title(),
                path.display()
            ));
            runtime
                .output
                .print_verbose(&format!("  source: {}", image.source_url));
        }
    }

    if args.open {
        if let Some((_, first)) = saved.first() {
            open::that(first)
                .map_err(|e| CliError::Generic(format!("Failed opening {}: {e}", first.display())))?;
        }
    }
    Ok(())
}

fn still_path(dir: &Path, idx: usize, image: &GeneratedImage) -> PathBuf {
    dir.join(format!("{:02}-{}.png", idx + 1, image.segment.as_str()))
}
