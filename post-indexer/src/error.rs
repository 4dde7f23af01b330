use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum IndexerError {
    #[error("源目录不存在或不是有效目录: {0}")]
    SourceMissing(PathBuf),
    #[error("无法创建输出目录 {path}: {source}")]
    CreateOutput {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("遍历目录时出错: {0}")]
    Walk(#[from] walkdir::Error),
    #[error("无法读取文件 {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("解析HTML时出错: {0}")]
    Parse(#[source] std::io::Error),
    #[error("没有找到有效文章")]
    NoPosts,
    #[error(transparent)]
    Index(#[from] tag_filter::Error),
}
