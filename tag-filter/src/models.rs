use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use utils_common::compression;
use utils_common::{IndexError, IndexMetadata, Post};

/// 当前索引格式版本
pub const INDEX_VERSION: [u8; 2] = [1, 0];

/// 标签索引 - 所有不同标签按字典序排列，并记录使用该标签的文章数
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct TagIndex {
    counts: BTreeMap<String, usize>,
}

impl TagIndex {
    /// 从文章列表构建，同一文章内重复的标签只计一次
    pub fn from_posts(posts: &[Post]) -> Self {
        let mut counts = BTreeMap::new();
        for post in posts {
            let unique: HashSet<&String> = post.tags.iter().collect();
            for tag in unique {
                *counts.entry(tag.clone()).or_insert(0) += 1;
            }
        }
        Self { counts }
    }

    /// 按字典序遍历所有标签
    pub fn tags(&self) -> impl Iterator<Item = &str> {
        self.counts.keys().map(String::as_str)
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.counts.contains_key(tag)
    }

    /// 使用该标签的文章数，未知标签为0
    pub fn count(&self, tag: &str) -> usize {
        self.counts.get(tag).copied().unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }
}

/// 文章索引 - 页面加载时一次性载入，之后只读
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct PostIndex {
    /// 所有文章，保持展示顺序
    pub posts: Vec<Post>,
    /// 标签索引
    pub tag_index: TagIndex,
    /// 索引元数据
    pub metadata: IndexMetadata,
}

impl PostIndex {
    /// 直接由文章列表组装索引（不排序、不去重）
    pub fn from_posts(posts: Vec<Post>) -> Self {
        let tag_index = TagIndex::from_posts(&posts);
        let metadata = IndexMetadata {
            post_count: posts.len(),
            tag_count: tag_index.len(),
            created_at: Utc::now(),
            version: format!("{}.{}", INDEX_VERSION[0], INDEX_VERSION[1]),
        };
        Self { posts, tag_index, metadata }
    }

    /// 从压缩的二进制数据恢复索引
    pub fn from_compressed(data: &[u8]) -> Result<Self, IndexError> {
        compression::from_compressed(data, INDEX_VERSION[0])
    }

    /// 序列化为压缩的二进制数据
    pub fn to_compressed(&self) -> Result<Vec<u8>, IndexError> {
        compression::to_compressed(self, INDEX_VERSION)
    }
}

/// 筛选配置 - 由页面以JSON传入，所有字段可省略
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct FilterConfig {
    /// 热门标签，按配置顺序展示为一键切换按钮
    pub featured_tags: Vec<String>,
    /// 搜索建议数量上限，超过10按10处理
    pub search_limit: usize,
    /// 失焦后隐藏搜索建议的延迟（毫秒）
    pub blur_hide_delay_ms: u32,
    /// URL中保存已选标签的查询参数名
    pub query_param: String,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            featured_tags: Vec::new(),
            search_limit: 10,
            blur_hide_delay_ms: 200,
            query_param: "tags".to_string(),
        }
    }
}

impl FilterConfig {
    pub fn with_featured_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.featured_tags = tags.into_iter().map(Into::into).collect();
        self
    }
}

/// 热门标签按钮
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct FeaturedTagView<'a> {
    pub tag: &'a str,
    pub active: bool,
    pub count: usize,
}

/// 索引页渲染所需的全部状态
#[derive(Serialize, Debug)]
pub struct FilterView<'a> {
    /// 出现在文章中的热门标签
    pub featured: Vec<FeaturedTagView<'a>>,
    pub search_query: &'a str,
    /// 搜索建议
    pub search_results: &'a [String],
    pub results_visible: bool,
    /// 已选标签（可移除的筛选条）
    pub selected_tags: &'a [String],
    /// 是否显示"清除筛选"
    pub show_clear: bool,
    pub posts: Vec<&'a Post>,
    pub total: usize,
    /// 没有匹配的文章
    pub is_empty: bool,
}
