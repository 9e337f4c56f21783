//! Share links and Cloudinary image URLs

use std::fmt;
use std::str::FromStr;

/// Where a garden is shared to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShareTarget {
    X,
    Facebook,
    /// Plain link for copying
    Link,
}

impl ShareTarget {
    /// Link for sharing `url` on this target
    pub fn link(&self, url: &str, text: Option<&str>) -> String {
        match self {
            ShareTarget::X => x_intent_url(url, text),
            ShareTarget::Facebook => facebook_share_url(url, text),
            ShareTarget::Link => url.to_string(),
        }
    }
}

impl fmt::Display for ShareTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ShareTarget::X => "x",
            ShareTarget::Facebook => "facebook",
            ShareTarget::Link => "link",
        };
        write!(f, "{}", name)
    }
}

impl FromStr for ShareTarget {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "x" | "twitter" => Ok(ShareTarget::X),
            "facebook" | "fb" => Ok(ShareTarget::Facebook),
            "link" | "copy" => Ok(ShareTarget::Link),
            other => Err(format!("Unknown share target: {}", other)),
        }
    }
}

/// X (Twitter) post intent
pub fn x_intent_url(url: &str, text: Option<&str>) -> String {
    let mut link = format!(
        "https://twitter.com/intent/tweet?url={}",
        urlencoding::encode(url)
    );
    if let Some(text) = text.filter(|t| !t.is_empty()) {
        link.push_str("&text=");
        link.push_str(&urlencoding::encode(text));
    }
    link
}

/// Facebook sharer dialog
pub fn facebook_share_url(url: &str, text: Option<&str>) -> String {
    let mut link = format!(
        "https://www.facebook.com/sharer/sharer.php?u={}",
        urlencoding::encode(url)
    );
    if let Some(text) = text.filter(|t| !t.is_empty()) {
        link.push_str("&quote=");
        link.push_str(&urlencoding::encode(text));
    }
    link
}

const CLOUDINARY_BASE: &str = "https://res.cloudinary.com";

/// Default file name for downloaded gardens
pub const DEFAULT_DOWNLOAD_NAME: &str = "mood-garden.png";

/// Delivery URL builder for garden images stored on Cloudinary
#[derive(Debug, Clone)]
pub struct Cloudinary {
    cloud_name: String,
}

impl Cloudinary {
    pub fn new(cloud_name: impl Into<String>) -> Self {
        Self {
            cloud_name: cloud_name.into(),
        }
    }

    pub fn cloud_name(&self) -> &str {
        &self.cloud_name
    }

    /// Full-size view, 1600×1600
    pub fn large_url(&self, public_id: &str) -> String {
        self.url(&[&fill(1600, 1600), "f_auto", "q_auto", "dpr_auto"], public_id)
    }

    /// Grid/feed thumbnail, 1024×1024
    pub fn thumb_url(&self, public_id: &str) -> String {
        self.url(&[&fill(1024, 1024), "f_auto", "q_auto", "dpr_auto"], public_id)
    }

    /// Social card size, 1200×630
    pub fn share_url(&self, public_id: &str) -> String {
        self.url(&[&fill(1200, 630), "f_auto", "q_auto"], public_id)
    }

    /// Best-quality PNG served as an attachment named `filename`
    pub fn download_url(&self, public_id: &str, filename: &str) -> String {
        // Cloudinary appends the extension from f_png itself
        let name = filename
            .strip_suffix(".png")
            .unwrap_or(filename)
            .replace(['/', ',', '.'], "_");
        let attachment = format!("fl_attachment:{}", name);
        self.url(&["f_png", "q_auto:best", &attachment], public_id)
    }

    fn url(&self, transforms: &[&str], public_id: &str) -> String {
        format!(
            "{}/{}/image/upload/{}/{}",
            CLOUDINARY_BASE,
            self.cloud_name,
            transforms.join("/"),
            public_id.trim_start_matches('/')
        )
    }
}

fn fill(width: u32, height: u32) -> String {
    format!("c_fill,g_auto,h_{},w_{}", height, width)
}
