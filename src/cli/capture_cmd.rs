//! `voicelog capture ...`: shortcut entry points talking to the capture host

use super::args::CaptureAction;
use super::ipc::{decode_reply, default_socket_path, ControlClient};
use super::presenter::Presenter;

/// Send one capture action to the running host
pub async fn handle_capture_command(
    action: CaptureAction,
    presenter: &Presenter,
) -> Result<(), String> {
    let reply = ControlClient::new(default_socket_path())
        .send(action.command())
        .await
        .map_err(|e| format!("Failed to communicate with capture host: {}", e))?
        .ok_or_else(|| "No capture host running. Start one with: voicelog daemon".to_string())?;

    report(action, &reply, presenter)
}

fn report(action: CaptureAction, reply: &str, presenter: &Presenter) -> Result<(), String> {
    let text = decode_reply(reply)?;
    match action {
        CaptureAction::Status => presenter.output(&text),
        _ => presenter.info(&format!("Capture host accepted '{}'", action.command())),
    }
    Ok(())
}
