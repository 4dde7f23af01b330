use std::path::Path;

use chrono::{DateTime, Utc};
use html5ever::parse_document;
use html5ever::tendril::TendrilSink;
use markup5ever_rcdom::{Handle, NodeData, RcDom};
use tracing::debug;
use utils_common::Post;

use crate::error::IndexerError;

/// 摘要的最大字符数
const EXCERPT_CHARS: usize = 200;
/// 正文少于该长度的页面不视为文章
const MIN_CONTENT_LEN: usize = 30;
/// 每分钟阅读的中日韩字符数
const CJK_CHARS_PER_MINUTE: f64 = 400.0;
/// 每分钟阅读的单词数
const WORDS_PER_MINUTE: f64 = 200.0;

// 不计入正文的标签
const NON_CONTENT_TAGS: &[&str] = &[
    "script", "style", "head", "meta", "link",
    "header", "footer", "nav", "aside",
    "noscript", "iframe", "svg", "path",
    "button", "input", "form", "select", "option", "textarea",
    "template", "dialog", "canvas",
];

// class或id中出现这些词（完整的类名，或以 - _ 分隔的一段）的区域不计入正文
const NON_CONTENT_MARKERS: &[&str] = &[
    "nav", "menu", "sidebar", "comment", "related", "share", "toc", "directory", "sr-only",
];

/// 从HTML页面提取文章；不是文章页面时返回 `None`
pub fn extract_post(html: &str, relative_path: &Path, index_all: bool) -> Result<Option<Post>, IndexerError> {
    let dom = parse_document(RcDom::default(), Default::default())
        .from_utf8()
        .read_from(&mut html.as_bytes())
        .map_err(IndexerError::Parse)?;

    let mut meta = Vec::new();
    collect_meta(&dom.document, &mut meta);

    let page_type = meta_value(&meta, "og:type").unwrap_or("");
    let should_process = page_type == "article" || (index_all && page_type == "page");
    if !should_process {
        return Ok(None);
    }

    let title = extract_title(&dom.document);
    if title.is_empty() {
        return Ok(None);
    }

    let id = page_id(relative_path);
    let slug = match id.rsplit('/').next() {
        Some(slug) if !slug.is_empty() => slug.to_string(),
        _ => return Ok(None),
    };

    let content = extract_content(&dom.document);
    if content.len() < MIN_CONTENT_LEN {
        debug!(path = %relative_path.display(), "正文太短，跳过");
        return Ok(None);
    }

    let excerpt = meta_value(&meta, "description")
        .or_else(|| meta_value(&meta, "og:description"))
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| {
            let mut excerpt: String = content.chars().take(EXCERPT_CHARS).collect();
            if content.chars().nth(EXCERPT_CHARS).is_some() {
                excerpt.push_str("...");
            }
            excerpt
        });

    let date = meta_value(&meta, "article:published_time")
        .and_then(|s| DateTime::parse_from_rfc3339(s.trim()).ok())
        .map(|dt| dt.with_timezone(&Utc));

    Ok(Some(Post {
        title,
        slug,
        excerpt,
        cover_image: meta_value(&meta, "og:image").map(str::to_string),
        tags: extract_tags(&meta),
        reading_time: reading_time(&content),
        url: format!("/{}", id),
        date,
    }))
}

/// 相对路径去掉扩展名和末尾的 `index`
fn page_id(relative_path: &Path) -> String {
    let id = relative_path
        .with_extension("")
        .to_string_lossy()
        .replace('\\', "/");
    if id == "index" {
        return String::new();
    }
    id.strip_suffix("/index").unwrap_or(&id).trim_end_matches('/').to_string()
}

/// 阅读时间（分钟），至少1分钟
pub fn reading_time(text: &str) -> u32 {
    let cjk = text.chars().filter(|&c| is_cjk(c)).count();
    let words = text
        .split_whitespace()
        .filter(|w| w.chars().any(|c| c.is_alphanumeric() && !is_cjk(c)))
        .count();

    let minutes = cjk as f64 / CJK_CHARS_PER_MINUTE + words as f64 / WORDS_PER_MINUTE;
    (minutes.ceil() as u32).max(1)
}

fn is_cjk(c: char) -> bool {
    matches!(c as u32,
        0x3040..=0x30FF | 0x3400..=0x4DBF | 0x4E00..=0x9FFF | 0xAC00..=0xD7AF | 0xF900..=0xFAFF)
}

fn attr<'a>(attrs: &'a [html5ever::Attribute], name: &str) -> Option<&'a str> {
    attrs
        .iter()
        .find(|a| &*a.name.local == name)
        .map(|a| &*a.value)
}

/// 收集 `<meta name|property content>`，同名标签可出现多次
fn collect_meta(handle: &Handle, meta: &mut Vec<(String, String)>) {
    if let NodeData::Element { ref name, ref attrs, .. } = handle.data {
        if name.local.as_ref() == "meta" {
            let attrs = attrs.borrow();
            let key = attr(&attrs, "name").or_else(|| attr(&attrs, "property"));
            if let (Some(key), Some(content)) = (key, attr(&attrs, "content")) {
                meta.push((key.to_string(), content.to_string()));
            }
        }
    }

    for child in handle.children.borrow().iter() {
        collect_meta(child, meta);
    }
}

fn meta_value<'a>(meta: &'a [(String, String)], key: &str) -> Option<&'a str> {
    meta.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str())
}

/// 标签来自 `article:tag` 和 `keywords`，逗号分隔，去空去重后排序
fn extract_tags(meta: &[(String, String)]) -> Vec<String> {
    let mut tags: Vec<String> = meta
        .iter()
        .filter(|(k, _)| k == "article:tag" || k == "keywords")
        .flat_map(|(_, v)| v.split(','))
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .collect();
    tags.sort();
    tags.dedup();
    tags
}

/// 深度优先查找第一个指定名称的元素
fn find_element(handle: &Handle, tag: &str) -> Option<Handle> {
    if let NodeData::Element { ref name, .. } = handle.data {
        if name.local.as_ref() == tag {
            return Some(handle.clone());
        }
    }
    handle
        .children
        .borrow()
        .iter()
        .find_map(|child| find_element(child, tag))
}

/// 标题：优先 `<title>`，其次第一个 `<h1>`
fn extract_title(document: &Handle) -> String {
    ["title", "h1"]
        .iter()
        .filter_map(|tag| find_element(document, tag))
        .map(|el| {
            let mut text = String::new();
            collect_text(&el, &mut text);
            text.split_whitespace().collect::<Vec<_>>().join(" ")
        })
        .find(|t| !t.is_empty())
        .unwrap_or_default()
}

fn collect_text(handle: &Handle, text: &mut String) {
    if let NodeData::Text { ref contents } = handle.data {
        text.push_str(&contents.borrow());
        text.push(' ');
    }
    for child in handle.children.borrow().iter() {
        collect_text(child, text);
    }
}

/// 正文：依次尝试 `<article>`、`<main>`、`<body>`
fn extract_content(document: &Handle) -> String {
    let mut content = String::new();
    if let Some(root) = ["article", "main", "body"]
        .iter()
        .find_map(|tag| find_element(document, tag))
    {
        collect_content_text(&root, &mut content);
    }
    content.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn is_chrome_marker(value: &str) -> bool {
    value.split_whitespace().any(|token| {
        NON_CONTENT_MARKERS.contains(&token)
            || token.split(['-', '_']).any(|part| NON_CONTENT_MARKERS.contains(&part))
    })
}

fn collect_content_text(handle: &Handle, text: &mut String) {
    match handle.data {
        NodeData::Element { ref name, ref attrs, .. } => {
            let tag: &str = &name.local;
            if NON_CONTENT_TAGS.contains(&tag) {
                return;
            }
            let attrs = attrs.borrow();
            let is_chrome = attrs.iter().any(|a| {
                let key: &str = &a.name.local;
                (key == "class" || key == "id") && is_chrome_marker(&a.value.to_lowercase())
            });
            if is_chrome {
                return;
            }
        }
        NodeData::Text { ref contents } => {
            let contents = contents.borrow();
            if !contents.trim().is_empty() {
                text.push_str(&contents);
                text.push(' ');
            }
        }
        _ => {}
    }

    for child in handle.children.borrow().iter() {
        collect_content_text(child, text);
    }
}
