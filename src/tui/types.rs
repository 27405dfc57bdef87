// TUI state and the messages worker tasks send back to the UI loop.

use std::time::Instant;

use crate::api::ApiClient;
use crate::commentary::CommentaryRequester;
use crate::errors::CliError;
use crate::sequence::{ImageSequence, VisualSequence};
use crate::services::ChatCompletion;
use crate::tui::editor::ScriptEditor;
use crate::tui::picture::PictureCache;

pub const READY_STATUS: &str =
    "F5 commentary · F6 stills · F7/F8 page · F9 clear · Esc quit";

#[derive(Debug)]
pub struct App {
    pub should_quit: bool,

    pub api_url: String,
    pub profile: String,
    pub key_present: bool,

    pub editor: ScriptEditor,

    pub requester: CommentaryRequester<ApiClient>,
    pub commentary: String,
    pub commentary_scroll: u16,
    pub commentary_pending: bool,
    pub last_model: Option<String>,
    pub last_usage: Option<String>,

    /// Only the UI loop writes to this; workers hand results back as messages.
    pub visuals: VisualSequence<ApiClient>,
    pub images_pending: bool,
    pub picture: Option<PictureCache>,

    pub status: String,
    pub spinner_step: u64,
    pub spinner_last: Instant,
}

impl App {
    pub fn new(
        api_url: String,
        profile: String,
        key_present: bool,
        editor: ScriptEditor,
        requester: CommentaryRequester<ApiClient>,
        visuals: VisualSequence<ApiClient>,
    ) -> Self {
        Self {
            should_quit: false,
            api_url,
            profile,
            key_present,
            editor,
            requester,
            commentary: String::new(),
            commentary_scroll: 0,
            commentary_pending: false,
            last_model: None,
            last_usage: None,
            visuals,
            images_pending: false,
            picture: None,
            status: READY_STATUS.to_string(),
            spinner_step: 0,
            spinner_last: Instant::now(),
        }
    }

    pub fn busy(&self) -> bool {
        self.commentary_pending || self.images_pending
    }
}

#[derive(Debug)]
pub enum TuiMsg {
    Commentary(Result<ChatCompletion, CliError>),
    Images(Result<ImageSequence, CliError>),
}
