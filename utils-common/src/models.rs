use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 博客文章 - 索引页展示和筛选所需的全部信息
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Post {
    /// 文章标题
    pub title: String,
    /// 文章唯一标识（路径最后一段）
    pub slug: String,
    /// 文章摘要
    #[serde(default)]
    pub excerpt: String,
    /// 封面图片地址
    #[serde(default)]
    pub cover_image: Option<String>,
    /// 文章标签列表
    #[serde(default)]
    pub tags: Vec<String>,
    /// 预计阅读时间（分钟）
    #[serde(default = "default_reading_time")]
    pub reading_time: u32,
    /// 文章URL路径
    #[serde(default)]
    pub url: String,
    /// 发布日期
    #[serde(default)]
    pub date: Option<DateTime<Utc>>,
}

fn default_reading_time() -> u32 {
    1
}

impl Post {
    /// 文章是否同时带有全部给定标签
    pub fn has_all_tags(&self, tags: &[String]) -> bool {
        tags.iter().all(|tag| self.tags.contains(tag))
    }
}

/// 索引元数据
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct IndexMetadata {
    /// 索引包含的文章数量
    pub post_count: usize,
    /// 不同标签的数量
    pub tag_count: usize,
    /// 索引创建时间
    pub created_at: DateTime<Utc>,
    /// 索引格式版本
    pub version: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn post(tags: &[&str]) -> Post {
        Post {
            title: "t".to_string(),
            slug: "s".to_string(),
            excerpt: String::new(),
            cover_image: None,
            tags: tags.iter().map(|t| t.to_string()).collect(),
            reading_time: 1,
            url: "/s".to_string(),
            date: None,
        }
    }

    #[test]
    fn has_all_tags_requires_every_tag() {
        let p = post(&["Python", "DIY"]);
        assert!(p.has_all_tags(&[]));
        assert!(p.has_all_tags(&["DIY".to_string()]));
        assert!(p.has_all_tags(&["Python".to_string(), "DIY".to_string()]));
        assert!(!p.has_all_tags(&["Python".to_string(), "Golang".to_string()]));
    }

    #[test]
    fn missing_optional_fields_use_defaults() {
        let p: Post = serde_json::from_str(r#"{"title":"Hello","slug":"hello"}"#).unwrap();
        assert_eq!(p.reading_time, 1);
        assert!(p.tags.is_empty());
        assert!(p.cover_image.is_none());
    }
}
