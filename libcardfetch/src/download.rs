use crate::errors::CardFetchError;
use crate::Update::MessageUpdate;
use crate::{notify, Message, Outcome, Update};
use phf::phf_map;
use reqwest::{header, Client};

use std::path::PathBuf;
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tokio::sync::mpsc::Sender;
use url::Url;

/// Sent on asset downloads only. The image host turns away clients that
/// don't look like a browser.
pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/58.0.3029.110 Safari/537.3";

/// User agent for every other request.
pub fn default_user_agent() -> String {
    format!("cardfetch/{}", env!("CARGO_PKG_VERSION"))
}

#[derive(Debug)]
pub struct DownloadItem {
    pub link: Url,
    pub destination_dir: PathBuf,
}

/// Downloads one image asset into `dld_item.destination_dir`, named by the
/// last segment of its url, and returns the saved path. Existing files
/// are overwritten.
/// Only filesystem failures are returned as errors, anything the remote
/// side does wrong skips the item.
#[tracing::instrument(skip(client, update_tx))]
pub async fn download_file(
    session_id: &str,
    mut dld_item: DownloadItem,
    client: &Client,
    update_tx: &Sender<Update>,
) -> Result<Outcome<PathBuf>, CardFetchError> {
    let f_name = match get_file_name(&dld_item.link) {
        Some(name) => name,
        None => {
            tracing::warn!("No usable file name in {}", dld_item.link);
            return Ok(Outcome::Skipped(format!(
                "no usable file name in {}",
                dld_item.link
            )));
        }
    };

    let response = match client
        .get(dld_item.link.clone())
        .header(header::USER_AGENT, BROWSER_USER_AGENT)
        .send()
        .await
    {
        Err(e) => {
            tracing::error!("Error downloading file from {}", dld_item.link);
            tracing::error!("{}", e);
            let content = format!("Failed to download image: {} ({})", dld_item.link, e);
            send_message(session_id, &dld_item.link, &content, true, update_tx).await;
            return Ok(Outcome::Skipped(content));
        }
        Ok(r) => r,
    };

    if !response.status().is_success() {
        tracing::error!(
            "Error status code received : {} |{}|",
            response.status(),
            dld_item.link
        );
        let content = format!(
            "Failed to download image: {} with status code {}",
            dld_item.link,
            response.status().as_u16()
        );
        send_message(session_id, &dld_item.link, &content, true, update_tx).await;
        return Ok(Outcome::Skipped(content));
    }

    let content_type = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|ct| ct.to_str().ok())
        .unwrap_or("")
        .to_string();
    send_message(
        session_id,
        &dld_item.link,
        &format!(
            "Downloading {} with content type {}",
            dld_item.link, content_type
        ),
        false,
        update_tx,
    )
    .await;

    match accepted_extension(&content_type) {
        Some(ext) => tracing::debug!("File extension for {} is {}", dld_item.link, ext),
        None => {
            let content = format!("Not an image: {}", dld_item.link);
            send_message(session_id, &dld_item.link, &content, true, update_tx).await;
            return Ok(Outcome::Skipped(content));
        }
    }

    let body = match response.bytes().await {
        Ok(b) => b,
        Err(e) => {
            tracing::error!("Error reading body from {}", dld_item.link);
            tracing::error!("{}", e);
            let content = format!("Failed to download image: {} ({})", dld_item.link, e);
            send_message(session_id, &dld_item.link, &content, true, update_tx).await;
            return Ok(Outcome::Skipped(content));
        }
    };

    dld_item.destination_dir.push(&f_name);
    let dest_path = dld_item.destination_dir;

    let mut dest_file = match OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(&dest_path)
        .await
    {
        Err(e) => {
            tracing::error!("Error opening/creating file {}", dest_path.display());
            tracing::error!("{} | {}", e, e.kind());
            return Err(CardFetchError::FileOperationError {
                file_name: dest_path.to_string_lossy().to_string(),
                message: format!("{} | {}", e, e.kind()),
            });
        }
        Ok(f) => f,
    };

    if let Err(e) = dest_file.write_all(&body).await {
        tracing::error!("Error writing to destination file {}", dest_path.display());
        tracing::error!("{} | {}", e, e.kind());
        return Err(CardFetchError::FileOperationError {
            file_name: dest_path.to_string_lossy().to_string(),
            message: format!("{} | {}", e, e.kind()),
        });
    }
    if let Err(e) = dest_file.flush().await {
        return Err(CardFetchError::FileOperationError {
            file_name: dest_path.to_string_lossy().to_string(),
            message: format!("{} | {}", e, e.kind()),
        });
    }

    tracing::debug!(
        "Download completed for {}, file @ {} ({} bytes)",
        &dld_item.link,
        dest_path.display(),
        body.len()
    );
    send_message(
        session_id,
        &dld_item.link,
        &format!("Downloaded: {}", dest_path.display()),
        false,
        update_tx,
    )
    .await;

    Ok(Outcome::Done(dest_path))
}

async fn send_message(
    session_id: &str,
    link: &Url,
    content: &str,
    is_error: bool,
    update_tx: &Sender<Update>,
) {
    notify(
        update_tx,
        MessageUpdate(Message {
            session_id: session_id.to_string(),
            content: content.to_string(),
            resource_name: link.to_string(),
            is_error,
        }),
    )
    .await;
}

/// Last path segment of `link`, verbatim. Query and fragment are not part
/// of it. Segments that can't name a file inside the destination directory
/// give `None`.
pub fn get_file_name(link: &Url) -> Option<String> {
    let segment = link.path_segments()?.last()?;
    if segment.is_empty() || segment == "." || segment == ".." || segment.contains('\\') {
        return None;
    }
    Some(segment.to_string())
}

/// Extension of the accepted image type named in `content_type`, if any.
pub fn accepted_extension(content_type: &str) -> Option<&'static str> {
    let val = content_type.to_lowercase();
    ACCEPTED_CONTENT_TYPES
        .entries()
        .find(|(marker, _)| val.contains(*marker))
        .map(|(_, ext)| *ext)
}

pub fn is_accepted_content_type(content_type: &str) -> bool {
    accepted_extension(content_type).is_some()
}

static ACCEPTED_CONTENT_TYPES: phf::Map<&'static str, &str> = phf_map! {
    "image/svg+xml" => ".svg",
    "image/png" => ".png",
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_svg_and_png() {
        assert!(is_accepted_content_type("image/svg+xml"));
        assert!(is_accepted_content_type("image/png"));
        assert!(is_accepted_content_type("image/svg+xml; charset=utf-8"));
        assert!(is_accepted_content_type("IMAGE/PNG"));
        assert_eq!(accepted_extension("image/png"), Some(".png"));
        assert_eq!(accepted_extension("image/svg+xml"), Some(".svg"));
    }

    #[test]
    fn rejects_everything_else() {
        assert!(!is_accepted_content_type("text/html"));
        assert!(!is_accepted_content_type("text/html; charset=UTF-8"));
        assert!(!is_accepted_content_type("image/jpeg"));
        assert!(!is_accepted_content_type("image/svg"));
        assert!(!is_accepted_content_type(""));
    }

    #[test]
    fn file_name_is_last_segment_verbatim() {
        let url = Url::parse(
            "https://upload.wikimedia.org/wikipedia/commons/d/d3/English_pattern_ace_of_clubs.svg",
        )
        .unwrap();
        assert_eq!(
            get_file_name(&url).as_deref(),
            Some("English_pattern_ace_of_clubs.svg")
        );

        let encoded = Url::parse("https://example.org/media/Ace%20of%20hearts.svg?x=1#f").unwrap();
        assert_eq!(
            get_file_name(&encoded).as_deref(),
            Some("Ace%20of%20hearts.svg")
        );
    }

    #[test]
    fn unusable_file_names_are_rejected() {
        assert_eq!(get_file_name(&Url::parse("https://example.org/media/").unwrap()), None);
        assert_eq!(get_file_name(&Url::parse("https://example.org").unwrap()), None);
        assert_eq!(get_file_name(&Url::parse("https://example.org/cards/../").unwrap()), None);
        assert_eq!(get_file_name(&Url::parse("mailto:someone@example.org").unwrap()), None);
    }

    #[test]
    fn default_user_agent_names_the_tool() {
        assert!(default_user_agent().starts_with("cardfetch/"));
        assert_ne!(default_user_agent(), BROWSER_USER_AGENT);
    }
}
