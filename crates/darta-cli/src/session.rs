use std::path::Path;

use anyhow::Result;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use cliclack::{input, spinner};
use console::style;

use darta::chat::ChatManager;
use darta::gateway::GeminiImageSynthesizer;
use darta::recorder::Recorder;
use darta::session::ChatSession;

use crate::capture::FileCaptureDevice;
use crate::render;

enum Outcome {
    Continue,
    Exit,
}

pub async fn run() -> Result<()> {
    println!(
        "DARTA {}",
        style("- type \"/?\" for help, \"/exit\" to leave").dim()
    );
    println!();

    let session = ChatSession::new(Box::new(GeminiImageSynthesizer::from_env()));
    let mut manager = ChatManager::new(session);
    let mut recorder = Recorder::new();
    let mut rendered = 0;

    render_new(&manager, &mut rendered);

    loop {
        let prompt = if recorder.is_recording() {
            "Recording... (/stop to finish)"
        } else {
            "Message:"
        };
        let line: String = input(prompt).placeholder("").interact()?;
        let line = line.trim().to_string();

        if let Some(command) = line.strip_prefix('/') {
            match handle_command(command, &mut manager, &mut recorder).await {
                Outcome::Exit => break,
                Outcome::Continue => continue,
            }
        }

        if !line.is_empty() {
            manager.set_text(line);
        }
        if !manager.can_send() {
            continue;
        }

        let spin = spinner();
        spin.start("DARTA is typing...");
        manager.send().await;
        spin.stop("");

        render_new(&manager, &mut rendered);
    }

    Ok(())
}

async fn handle_command(
    command: &str,
    manager: &mut ChatManager,
    recorder: &mut Recorder,
) -> Outcome {
    let (name, argument) = match command.split_once(' ') {
        Some((name, argument)) => (name, argument.trim()),
        None => (command, ""),
    };

    match name {
        "exit" | "quit" => return Outcome::Exit,
        "?" => help(),
        "image" => stage_image(manager, recorder, argument),
        "doc" => stage_document(manager, recorder, argument),
        "record" => start_recording(manager, recorder, argument).await,
        "stop" => stop_recording(manager, recorder).await,
        "clear" => {
            manager.clear_staged();
            notice("Staged attachment cleared.");
        }
        _ => notice(&format!("Unknown command: /{}", name)),
    }

    Outcome::Continue
}

fn help() {
    println!("Commands:");
    println!("/image <path>  - Attach a photo (receipt, stock, shelf)");
    println!("/doc <path>    - Attach a document (PDF, CSV, or text)");
    println!("/record <path> - Start a voice note from an audio file");
    println!("/stop          - Finish the voice note and stage it");
    println!("/clear         - Drop the staged attachment");
    println!("/exit          - Leave the chat");
    println!("/?             - Display this help message");
}

fn stage_image(manager: &mut ChatManager, recorder: &Recorder, path: &str) {
    if recorder.is_recording() {
        notice("Finish the recording first (/stop).");
        return;
    }
    match std::fs::read(path) {
        Ok(bytes) => {
            manager.stage_image(STANDARD.encode(bytes), image_mime_for(Path::new(path)));
            notice("Photo staged. Add a message or press Enter to send.");
        }
        Err(e) => alert(&format!("Could not read {}: {}", path, e)),
    }
}

fn stage_document(manager: &mut ChatManager, recorder: &Recorder, path: &str) {
    if recorder.is_recording() {
        notice("Finish the recording first (/stop).");
        return;
    }
    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) => {
            alert(&format!("Could not read {}: {}", path, e));
            return;
        }
    };
    let name = Path::new(path)
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("Document");

    match manager.stage_document(name, document_mime_for(Path::new(path)), &bytes) {
        Ok(()) => notice("Document staged. Add a message or press Enter to send."),
        Err(e) => alert(&e.to_string()),
    }
}

async fn start_recording(manager: &mut ChatManager, recorder: &mut Recorder, path: &str) {
    if recorder.is_recording() {
        notice("A recording is already in progress (/stop to finish).");
        return;
    }
    match recorder
        .start(Box::new(FileCaptureDevice::new(path)))
        .await
    {
        Ok(()) => {
            // Recording claims the composer, like the original input bar.
            manager.clear_staged();
            manager.set_text("");
            notice("Recording...");
        }
        Err(e) => alert(&e.to_string()),
    }
}

async fn stop_recording(manager: &mut ChatManager, recorder: &mut Recorder) {
    match recorder.stop().await {
        Ok(attachment) => {
            manager.stage_audio(attachment);
            notice("Voice note staged. Add a message or press Enter to send.");
        }
        Err(e) => alert(&e.to_string()),
    }
}

fn notice(message: &str) {
    println!("{}", style(message).dim());
}

fn alert(message: &str) {
    println!("{}", style(message).red());
}

fn render_new(manager: &ChatManager, rendered: &mut usize) {
    for entry in &manager.transcript()[*rendered..] {
        render::render_entry(entry);
    }
    *rendered = manager.transcript().len();
}

fn image_mime_for(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_lowercase)
        .as_deref()
    {
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        _ => "image/jpeg",
    }
}

fn document_mime_for(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_lowercase)
        .as_deref()
    {
        Some("pdf") => "application/pdf",
        Some("csv") => "text/csv",
        Some("txt") => "text/plain",
        _ => "",
    }
}
