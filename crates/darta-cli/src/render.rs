use std::path::PathBuf;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use bat::{PrettyPrinter, WrappingMode};
use console::style;

use darta::attachment::AttachmentKind;
use darta::models::role::Role;
use darta::transcript::{RenderableAttachment, TranscriptEntry};

pub fn render_entry(entry: &TranscriptEntry) {
    match entry.role {
        Role::User => {
            for attachment in &entry.attachments {
                println!("  {}", style(attachment_label(attachment)).dim());
            }
            println!("{} {}", style("You:").green().bold(), entry.text);
        }
        Role::Assistant => {
            println!("{}", style("DARTA:").cyan().bold());
            markdown(&entry.text);
            for (index, attachment) in entry.attachments.iter().enumerate() {
                match save_image(attachment, &entry.id, index) {
                    Some(path) => {
                        println!("  {} {}", style("image saved to").dim(), path.display())
                    }
                    None => println!("  {}", style(attachment_label(attachment)).dim()),
                }
            }
        }
    }
    println!();
}

fn attachment_label(attachment: &RenderableAttachment) -> String {
    match attachment.kind {
        AttachmentKind::Image => "[photo attached]".to_string(),
        AttachmentKind::Audio => "[voice note attached]".to_string(),
        AttachmentKind::Document => format!(
            "[document attached: {}]",
            attachment.name.as_deref().unwrap_or("Document")
        ),
    }
}

fn markdown(content: &str) {
    let printed = PrettyPrinter::new()
        .input_from_bytes(content.as_bytes())
        .language("markdown")
        .wrapping_mode(WrappingMode::Character)
        .print();
    if printed.is_err() {
        println!("{}", content);
    }
}

/// Decode a generated image's data URL and write it next to the other temp
/// files so the user can open it.
fn save_image(attachment: &RenderableAttachment, entry_id: &str, index: usize) -> Option<PathBuf> {
    let (header, data) = attachment.reference.split_once(',')?;
    let mime = header.strip_prefix("data:")?.split(';').next()?;
    let extension = match mime {
        "image/png" => "png",
        "image/jpeg" => "jpg",
        "image/webp" => "webp",
        _ => "img",
    };

    let bytes = STANDARD.decode(data).ok()?;
    let path = std::env::temp_dir().join(format!("darta-{}-{}.{}", entry_id, index, extension));
    std::fs::write(&path, bytes).ok()?;
    Some(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attachment_labels() {
        let doc = RenderableAttachment {
            kind: AttachmentKind::Document,
            reference: String::new(),
            name: Some("sales.csv".to_string()),
        };
        assert_eq!(attachment_label(&doc), "[document attached: sales.csv]");
    }

    #[test]
    fn test_save_image_round_trips_bytes() {
        let attachment = RenderableAttachment {
            kind: AttachmentKind::Image,
            reference: format!("data:image/png;base64,{}", STANDARD.encode(b"fakepng")),
            name: None,
        };
        let path = save_image(&attachment, "test-entry", 0).unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"fakepng");
        std::fs::remove_file(path).ok();
    }

    #[test]
    fn test_save_image_rejects_non_data_url() {
        let attachment = RenderableAttachment {
            kind: AttachmentKind::Image,
            reference: "blob:object-url".to_string(),
            name: None,
        };
        assert!(save_image(&attachment, "test-entry", 0).is_none());
    }
}
