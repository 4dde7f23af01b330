use thiserror::Error;
use utils_common::IndexError;

/// 索引构建、加载和配置解析的错误
#[derive(Debug, Error)]
pub enum Error {
    #[error("无法构建索引: 没有文章数据")]
    NoPosts,
    #[error("索引数据无效: {0}")]
    Index(#[from] IndexError),
    #[error("解析配置失败: {0}")]
    Config(#[source] serde_json::Error),
    #[error("解析文章数据失败: {0}")]
    Posts(#[source] serde_json::Error),
    #[error("写入索引文件失败 {path}: {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },
}
