use std::collections::HashSet;
use std::fs;
use std::path::Path;

use tracing::{info, warn};
use utils_common::Post;

use crate::error::Error;
use crate::models::PostIndex;

/// 文章索引构建器
#[derive(Default)]
pub struct PostIndexBuilder {
    posts: Vec<Post>,
}

impl PostIndexBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// 添加文章到构建器
    pub fn add_post(&mut self, post: Post) {
        self.posts.push(post);
    }

    pub fn len(&self) -> usize {
        self.posts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.posts.is_empty()
    }

    /// 构建索引：按slug去重，按发布日期从新到旧排序，无日期的排在最后
    pub fn build(&self) -> Result<PostIndex, Error> {
        if self.posts.is_empty() {
            return Err(Error::NoPosts);
        }

        let mut seen = HashSet::new();
        let mut posts = Vec::with_capacity(self.posts.len());
        for post in &self.posts {
            if !seen.insert(post.slug.as_str()) {
                warn!(slug = %post.slug, url = %post.url, "跳过重复的文章");
                continue;
            }
            posts.push(post.clone());
        }

        // 稳定排序，同一天的文章保持添加顺序
        posts.sort_by(|a, b| match (&a.date, &b.date) {
            (Some(a), Some(b)) => b.cmp(a),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => std::cmp::Ordering::Equal,
        });

        let index = PostIndex::from_posts(posts);
        info!(
            posts = index.metadata.post_count,
            tags = index.metadata.tag_count,
            "索引构建完成"
        );
        Ok(index)
    }

    /// 构建并保存索引到文件
    pub fn save(&self, path: &Path) -> Result<PostIndex, Error> {
        let index = self.build()?;
        let data = index.to_compressed()?;

        fs::write(path, &data).map_err(|source| Error::Write {
            path: path.display().to_string(),
            source,
        })?;

        info!(path = %path.display(), bytes = data.len(), "索引已写入文件");
        Ok(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn post(slug: &str, day: Option<u32>, tags: &[&str]) -> Post {
        Post {
            title: slug.to_string(),
            slug: slug.to_string(),
            excerpt: String::new(),
            cover_image: None,
            tags: tags.iter().map(|t| t.to_string()).collect(),
            reading_time: 2,
            url: format!("/posts/{}", slug),
            date: day.map(|d| Utc.with_ymd_and_hms(2024, 5, d, 0, 0, 0).unwrap()),
        }
    }

    #[test]
    fn empty_builder_is_rejected() {
        assert!(matches!(PostIndexBuilder::new().build(), Err(Error::NoPosts)));
    }

    #[test]
    fn posts_are_sorted_newest_first_and_deduplicated() {
        let mut builder = PostIndexBuilder::new();
        builder.add_post(post("old", Some(1), &["DIY"]));
        builder.add_post(post("undated", None, &["Golang"]));
        builder.add_post(post("new", Some(20), &["Python"]));
        builder.add_post(post("old", Some(30), &["Other"]));
        assert_eq!(builder.len(), 4);

        let index = builder.build().unwrap();
        let slugs: Vec<&str> = index.posts.iter().map(|p| p.slug.as_str()).collect();
        assert_eq!(slugs, vec!["new", "old", "undated"]);
        assert!(!index.tag_index.contains("Other"));
        assert_eq!(index.metadata.post_count, 3);
    }

    #[test]
    fn saved_index_loads_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("post_index.bin");

        let mut builder = PostIndexBuilder::new();
        builder.add_post(post("a", Some(2), &["Python", "DIY"]));
        builder.save(&path).unwrap();

        let data = fs::read(&path).unwrap();
        let index = PostIndex::from_compressed(&data).unwrap();
        assert_eq!(index.posts.len(), 1);
        assert_eq!(index.tag_index.tags().collect::<Vec<_>>(), vec!["DIY", "Python"]);
    }
}
