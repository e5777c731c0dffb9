//! Default report templates
//!
//! Each session gets its own editable copy of the templates in
//! `_templates/`. Existing files are never overwritten.

use std::path::Path;

use crate::error::Result;

pub const MARKDOWN_TEMPLATE: &str = "report.md.j2";
pub const HTML_TEMPLATE: &str = "report.html.j2";

pub const DEFAULT_MARKDOWN: &str = r#"# Snapnote Session

{% for e in entries %}
## {{ e.title }}
Captured: {{ e.timestamp }}
{%- if e.tags %}
Tags: {{ e.tags | join(", ") }}
{%- endif %}

| Screenshot | Notes |
|---|---|
| ![{{ e.title }}]({{ e.image.path }}) | {{ e.notes }} |

{% endfor %}
"#;

pub const DEFAULT_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="UTF-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>{{ session_name }}</title>
<style>
body { font-family: sans-serif; margin: 0; padding: 20px; background: #f5f5f5; color: #222; }
header { margin-bottom: 24px; }
.entry { background: #fff; margin: 20px 0; padding: 20px; border-radius: 8px; box-shadow: 0 1px 3px rgba(0, 0, 0, 0.15); }
.entry.image-left .content { display: flex; gap: 20px; align-items: flex-start; }
.entry.image-left figure { flex: 0 0 55%; }
.entry.image-top .content { display: block; }
figure { margin: 0; }
img { max-width: 100%; height: auto; border: 1px solid #ddd; }
.missing { padding: 40px; text-align: center; background: #eee; color: #888; border: 1px dashed #bbb; }
.meta { color: #666; font-size: 0.9em; }
.tag { display: inline-block; background: #e0ecff; border-radius: 4px; padding: 0 6px; margin-right: 4px; }
.notes { white-space: pre-wrap; }
</style>
</head>
<body>
<header>
<h1>{{ session_name }}</h1>
<p class="meta">Generated: {{ export_date }} &middot; {{ entries | length }} entries</p>
</header>
{% for entry in entries %}
<section class="entry {{ entry.layout }}" id="entry-{{ entry.id }}">
<h2>{{ loop.index }}. {{ entry.title }}</h2>
<p class="meta">{{ entry.timestamp }}{% for tag in entry.tags %} <span class="tag">{{ tag }}</span>{% endfor %}</p>
<div class="content">
<figure>
{%- if entry.image_base64 %}
<img src="data:{{ entry.image_mime|safe }};base64,{{ entry.image_base64|safe }}" alt="{{ entry.title }}" width="{{ entry.image.width }}">
{%- else %}
<div class="missing">Image not found: {{ entry.image.path }}</div>
{%- endif %}
</figure>
<div class="notes">{{ entry.notes }}</div>
</div>
</section>
{% endfor %}
</body>
</html>
"#;

/// Default contents for a template file name
pub fn default_for(name: &str) -> Option<&'static str> {
    match name {
        MARKDOWN_TEMPLATE => Some(DEFAULT_MARKDOWN),
        HTML_TEMPLATE => Some(DEFAULT_HTML),
        _ => None,
    }
}

/// Write any default template missing from `dir`
///
/// Returns the names of the templates that were written.
pub fn ensure_templates(dir: &Path) -> Result<Vec<&'static str>> {
    std::fs::create_dir_all(dir)?;
    let mut written = Vec::new();
    for (name, contents) in [
        (MARKDOWN_TEMPLATE, DEFAULT_MARKDOWN),
        (HTML_TEMPLATE, DEFAULT_HTML),
    ] {
        let path = dir.join(name);
        if path.exists() {
            continue;
        }
        std::fs::write(&path, contents)?;
        log::debug!("Wrote default template {:?}", path);
        written.push(name);
    }
    Ok(written)
}

/// Template source from `dir`, or the built-in default if the file is gone
pub fn load_template(dir: &Path, name: &str) -> Result<String> {
    let path = dir.join(name);
    match std::fs::read_to_string(&path) {
        Ok(source) => Ok(source),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => match default_for(name) {
            Some(source) => {
                log::warn!("Template {:?} missing, using built-in default", path);
                Ok(source.to_string())
            }
            None => Err(err.into()),
        },
        Err(err) => Err(err.into()),
    }
}
