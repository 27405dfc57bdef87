// Background requests for the TUI. Each worker owns clones of what it needs
// and reports back through the channel; it never touches `App`.

use tokio::sync::mpsc;

use crate::api::ApiClient;
use crate::commentary::CommentaryRequester;
use crate::script::Script;
use crate::sequence::{ImageSettings, generate_sequence};
use crate::tui::types::TuiMsg;

pub fn spawn_commentary_request(
    requester: CommentaryRequester<ApiClient>,
    tx: mpsc::UnboundedSender<TuiMsg>,
    script: Script,
) {
    tokio::spawn(async move {
        let res = requester.request_commentary(&script).await;
        let _ = tx.send(TuiMsg::Commentary(res));
    });
}

pub fn spawn_images_request(
    api: ApiClient,
    settings: ImageSettings,
    tx: mpsc::UnboundedSender<TuiMsg>,
    script: Script,
) {
    tokio::spawn(async move {
        let res = generate_sequence(&api, &settings, &script).await;
        let _ = tx.send(TuiMsg::Images(res));
    });
}
