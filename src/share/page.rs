//! Share page rendering
//!
//! Link previews on social sites need the Open Graph and Twitter card tags
//! in the HTML itself, so the page is rendered on the server.

use serde::Deserialize;

/// Share metadata served by the API at `/share-meta/{id}`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShareMeta {
    pub title: String,
    pub desc: String,
    #[serde(default)]
    pub img: Option<String>,
    pub view_link: String,
}

/// Escape text for HTML bodies and double- or single-quoted attributes
pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

const PAGE_STYLE: &str = "body{font-family:system-ui,-apple-system,Segoe UI,Roboto,sans-serif;padding:24px;line-height:1.5;}
.card{max-width:680px;margin:0 auto;border:1px solid #e5e7eb;border-radius:12px;overflow:hidden;}
.img{display:block;width:100%;}.content{padding:16px;}
.btn{display:inline-block;border:1px solid #111;padding:8px 12px;border-radius:8px;text-decoration:none;color:#111;}";

/// Render the share page for `meta`
pub fn render_share_page(meta: &ShareMeta, canonical: &str) -> String {
    let title = escape_html(&meta.title);
    let desc = escape_html(&meta.desc);
    let canonical = escape_html(canonical);
    let view_link = escape_html(&meta.view_link);
    let img = meta
        .img
        .as_deref()
        .filter(|i| !i.is_empty())
        .map(escape_html);

    let og_image = img
        .as_ref()
        .map(|i| format!("<meta property=\"og:image\" content=\"{i}\">\n"))
        .unwrap_or_default();
    let twitter_image = img
        .as_ref()
        .map(|i| format!("<meta name=\"twitter:image\" content=\"{i}\">\n"))
        .unwrap_or_default();
    let img_tag = img
        .as_ref()
        .map(|i| format!("<img class=\"img\" src=\"{i}\" alt=\"Mood garden image\">\n"))
        .unwrap_or_default();

    format!(
        "<!doctype html>
<html lang=\"en\"><head>
<meta charset=\"utf-8\">
<title>{title}</title>
<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">
<link rel=\"canonical\" href=\"{canonical}\">
<meta property=\"og:type\" content=\"website\">
<meta property=\"og:site_name\" content=\"Mood Gardens\">
<meta property=\"og:url\" content=\"{canonical}\">
<meta property=\"og:title\" content=\"{title}\">
<meta property=\"og:description\" content=\"{desc}\">
{og_image}<meta name=\"twitter:card\" content=\"summary_large_image\">
<meta name=\"twitter:title\" content=\"{title}\">
<meta name=\"twitter:description\" content=\"{desc}\">
{twitter_image}<style>{PAGE_STYLE}</style>
</head><body>
<div class=\"card\">
{img_tag}<div class=\"content\">
<h1>{title}</h1>
<p>{desc}</p>
<a class=\"btn\" href=\"{view_link}\">Open Mood Gardens</a>
</div></div>
</body></html>"
    )
}
