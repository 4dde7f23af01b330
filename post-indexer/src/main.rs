use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::{value_parser, Arg, ArgAction, Command};
use tag_filter::{PostIndex, PostIndexBuilder};
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;
use utils_common::Post;
use walkdir::WalkDir;

mod error;
mod extract;

use error::IndexerError;

/// 输出的索引文件名
const INDEX_FILE_NAME: &str = "post_index.bin";

// 生成站点中不属于文章的文件
const SYSTEM_FILES: &[&str] = &["404.html", "robots.txt", "sitemap.xml"];

fn main() {
    let matches = Command::new("post-indexer")
        .version(env!("CARGO_PKG_VERSION"))
        .about("扫描生成的站点页面，构建标签筛选用的文章索引")
        .arg(Arg::new("source")
            .short('s')
            .long("source")
            .value_name("SOURCE_DIR")
            .help("站点输出目录路径")
            .value_parser(value_parser!(PathBuf))
            .required(true))
        .arg(Arg::new("output")
            .short('o')
            .long("output")
            .value_name("OUTPUT_DIR")
            .help("索引输出目录路径")
            .value_parser(value_parser!(PathBuf))
            .required(true))
        .arg(Arg::new("verbose")
            .short('v')
            .long("verbose")
            .help("显示详细信息")
            .action(ArgAction::SetTrue))
        .arg(Arg::new("index_all")
            .short('a')
            .long("all")
            .help("同时索引普通页面 (og:type=page)")
            .action(ArgAction::SetTrue))
        .get_matches();

    let source = matches.get_one::<PathBuf>("source").cloned().unwrap_or_default();
    let output = matches.get_one::<PathBuf>("output").cloned().unwrap_or_default();
    let verbose = matches.get_flag("verbose");
    let index_all = matches.get_flag("index_all");

    init_tracing(verbose);

    info!(source = %source.display(), output = %output.display(), "开始生成索引");
    let start = Instant::now();

    match generate_index(&source, &output, index_all) {
        Ok(index) => info!(
            posts = index.metadata.post_count,
            tags = index.metadata.tag_count,
            elapsed_secs = start.elapsed().as_secs_f32(),
            "索引生成成功"
        ),
        Err(e) => {
            error!("索引生成失败: {}", e);
            std::process::exit(1);
        }
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

/// 扫描源目录并写出 `post_index.bin`
fn generate_index(source: &Path, output: &Path, index_all: bool) -> Result<PostIndex, IndexerError> {
    if !source.is_dir() {
        return Err(IndexerError::SourceMissing(source.to_path_buf()));
    }
    fs::create_dir_all(output).map_err(|e| IndexerError::CreateOutput {
        path: output.to_path_buf(),
        source: e,
    })?;

    let (posts, scanned) = scan_html_files(source, index_all)?;
    info!(posts = posts.len(), scanned, "扫描完成");
    if posts.is_empty() {
        return Err(IndexerError::NoPosts);
    }

    let mut builder = PostIndexBuilder::new();
    for post in posts {
        builder.add_post(post);
    }

    Ok(builder.save(&output.join(INDEX_FILE_NAME))?)
}

fn is_system_file(relative: &Path) -> bool {
    let path = relative.to_string_lossy().replace('\\', "/").to_lowercase();
    path.starts_with("search/")
        || path.contains("/search/")
        || SYSTEM_FILES.iter().any(|name| path == *name || path.ends_with(&format!("/{}", name)))
}

/// 遍历目录，返回文章列表和扫描过的HTML文件数
fn scan_html_files(source: &Path, index_all: bool) -> Result<(Vec<Post>, usize), IndexerError> {
    let mut posts = Vec::new();
    let mut scanned = 0;

    for entry in WalkDir::new(source).sort_by_file_name() {
        let entry = entry?;
        let path = entry.path();
        if !entry.file_type().is_file() || path.extension().map_or(true, |ext| ext != "html") {
            continue;
        }

        let relative = path.strip_prefix(source).unwrap_or(path);
        if is_system_file(relative) {
            continue;
        }
        scanned += 1;

        let html = match fs::read_to_string(path) {
            Ok(html) => html,
            Err(e) => {
                let err = IndexerError::Read { path: path.to_path_buf(), source: e };
                warn!(path = %relative.display(), "跳过文件: {}", err);
                continue;
            }
        };

        match extract::extract_post(&html, relative, index_all) {
            Ok(Some(post)) => {
                debug!(path = %relative.display(), tags = ?post.tags, "处理文章");
                posts.push(post);
            }
            Ok(None) => {}
            Err(e) => warn!(path = %path.display(), "解析文件时出错: {}", e),
        }
    }

    Ok((posts, scanned))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(title: &str, tags: &str, date: &str) -> String {
        format!(
            r#"<html><head><title>{title}</title>
<meta property="og:type" content="article">
<meta name="keywords" content="{tags}">
<meta property="article:published_time" content="{date}">
</head><body><article><p>{title} is a post body that is long enough to count.</p></article></body></html>"#
        )
    }

    #[test]
    fn system_files_are_recognised() {
        assert!(is_system_file(Path::new("404.html")));
        assert!(is_system_file(Path::new("search/index.html")));
        assert!(is_system_file(Path::new("en/404.html")));
        assert!(!is_system_file(Path::new("posts/research/index.html")));
        assert!(!is_system_file(Path::new("posts/hello.html")));
    }

    #[test]
    fn builds_index_from_site_directory() {
        let site = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        let posts_dir = site.path().join("posts");
        fs::create_dir_all(posts_dir.join("broker")).unwrap();
        fs::create_dir_all(site.path().join("search")).unwrap();

        fs::write(posts_dir.join("broker/index.html"), page("Broker", "Golang,System Design", "2024-02-01T00:00:00Z")).unwrap();
        fs::write(posts_dir.join("asgi.html"), page("ASGI", "Python", "2024-06-01T00:00:00Z")).unwrap();
        fs::write(site.path().join("search/index.html"), page("Search", "Python", "2024-07-01T00:00:00Z")).unwrap();
        fs::write(site.path().join("404.html"), page("Missing", "", "2024-07-01T00:00:00Z")).unwrap();
        fs::write(site.path().join("notes.txt"), "not html").unwrap();

        let index = generate_index(site.path(), out.path(), false).unwrap();
        let slugs: Vec<&str> = index.posts.iter().map(|p| p.slug.as_str()).collect();
        assert_eq!(slugs, vec!["asgi", "broker"]);
        assert_eq!(index.posts[1].url, "/posts/broker");

        let data = fs::read(out.path().join(INDEX_FILE_NAME)).unwrap();
        let restored = PostIndex::from_compressed(&data).unwrap();
        assert_eq!(
            restored.tag_index.tags().collect::<Vec<_>>(),
            vec!["Golang", "Python", "System Design"]
        );
    }

    #[test]
    fn unreadable_file_is_skipped() {
        let site = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        fs::write(site.path().join("a.html"), page("Alpha", "Rust", "2024-03-01T00:00:00Z")).unwrap();
        fs::write(site.path().join("b.html"), [0x3c, 0x68, 0xff, 0xfe, 0x00]).unwrap();

        let index = generate_index(site.path(), out.path(), false).unwrap();
        assert_eq!(index.posts.len(), 1);
        assert_eq!(index.posts[0].slug, "a");
    }

    #[test]
    fn missing_source_is_an_error() {
        let out = tempfile::tempdir().unwrap();
        let err = generate_index(Path::new("/definitely/not/here"), out.path(), false).unwrap_err();
        assert!(matches!(err, IndexerError::SourceMissing(_)));
    }

    #[test]
    fn empty_site_has_no_posts() {
        let site = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        let err = generate_index(site.path(), out.path(), false).unwrap_err();
        assert!(matches!(err, IndexerError::NoPosts));
    }
}
