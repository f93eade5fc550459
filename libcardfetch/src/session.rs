use std::path::PathBuf;
use url::Url;

#[derive(Debug, Clone)]
pub struct Session {
    pub session_id: String,
    pub page_url: Url,
    pub destination_dir: PathBuf,
    /// Media description page links found on the listing page
    pub media_links: usize,
    /// Direct asset links the media pages resolved to
    pub resolved_links: usize,
    /// Files written to the destination directory
    pub saved_files: Vec<PathBuf>,
    /// Items dropped at any stage, with the reason
    pub skipped: Vec<(String, String)>,
}

impl Session {
    pub fn new(session_id: &str, page_url: Url, destination_dir: PathBuf) -> Self {
        Self {
            session_id: session_id.to_string(),
            page_url,
            destination_dir,
            media_links: 0,
            resolved_links: 0,
            saved_files: Vec::new(),
            skipped: Vec::new(),
        }
    }
}
