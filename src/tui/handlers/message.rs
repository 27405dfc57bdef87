// Applies worker results to the TUI state. This is the only place the image
// sequence is replaced while the TUI runs.

use tracing::warn;

use crate::errors::CliError;
use crate::tui::types::{App, READY_STATUS, TuiMsg};

pub fn handle_tui_msg(app: &mut App, msg: TuiMsg) {
    match msg {
        TuiMsg::Commentary(res) => {
            app.commentary_pending = false;
            app.commentary_scroll = 0;
            match res {
                Ok(completion) => {
                    app.commentary = completion.text;
                    app.last_model = completion.model;
                    app.last_usage = Some(completion.usage);
                    app.status = "Commentary ready.".to_string();
                }
                Err(err) => {
                    app.status = failure_status(&err, "Commentary failed.");
                    app.commentary = err.describe_for("generating commentary");
                }
            }
        }
        TuiMsg::Images(res) => {
            app.images_pending = false;
            app.picture = None;
            match app.visuals.install(res).map(|seq| seq.len()) {
                Ok(count) => {
                    app.status = format!("{count} stills ready · Still 1/{count} · F7/F8 to page");
                }
                Err(err) => {
                    app.status = failure_status(&err, "Image generation failed.");
                    app.commentary_scroll = 0;
                    app.commentary = err.describe_for("generating images");
                }
            }
        }
    }
}

fn failure_status(err: &CliError, failed: &str) -> String {
    if matches!(err, CliError::EmptyInput) {
        return READY_STATUS.to_string();
    }
    warn!(error = %err, "{failed}");
    failed.to_string()
}
