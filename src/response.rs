use serde::Serialize;

/// Body returned after a successful share
#[derive(Debug, Serialize)]
pub struct ShareResponse {
    pub id: String,
    pub url: String,
}

impl ShareResponse {
    pub fn new(id: String, origin: &str) -> Self {
        let url = share_url(origin, &id);
        Self { id, url }
    }
}

#[derive(Debug, Serialize)]
pub struct DocumentResponse {
    pub id: String,
    pub content: String,
}

/// Path prefix of read-only shared documents
pub const SHARE_PATH_PREFIX: &str = "/s/";

pub fn share_url(origin: &str, id: &str) -> String {
    format!("{}{}{}", origin.trim_end_matches('/'), SHARE_PATH_PREFIX, id)
}
