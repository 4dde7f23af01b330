//! 由当前状态派生视图数据的纯函数，每次状态变更后显式调用

use utils_common::Post;

use crate::models::TagIndex;

/// 搜索建议数量的硬上限，配置值只能调低
pub const MAX_SEARCH_RESULTS: usize = 10;

/// 查询是否为空或只含空白
pub fn is_blank(s: &str) -> bool {
    s.trim().is_empty()
}

/// 同时带有全部已选标签的文章下标，保持原始顺序
pub fn filter_post_indices(posts: &[Post], selected: &[String]) -> Vec<usize> {
    posts
        .iter()
        .enumerate()
        .filter(|(_, post)| post.has_all_tags(selected))
        .map(|(i, _)| i)
        .collect()
}

/// 筛选文章：未选标签时返回全部文章
pub fn compute_filtered_posts<'a>(posts: &'a [Post], selected: &[String]) -> Vec<&'a Post> {
    filter_post_indices(posts, selected)
        .into_iter()
        .map(|i| &posts[i])
        .collect()
}

/// 标签搜索：不区分大小写的子串匹配，排除热门标签，
/// 按标签索引顺序取前 `limit` 个（不超过 [`MAX_SEARCH_RESULTS`]）
pub fn compute_search_results(
    tag_index: &TagIndex,
    featured: &[String],
    query: &str,
    limit: usize,
) -> Vec<String> {
    if is_blank(query) {
        return Vec::new();
    }

    let needle = query.to_lowercase();
    tag_index
        .tags()
        .filter(|tag| !featured.iter().any(|f| f.as_str() == *tag))
        .filter(|tag| tag.to_lowercase().contains(&needle))
        .take(limit.min(MAX_SEARCH_RESULTS))
        .map(str::to_string)
        .collect()
}

/// 实际出现在文章中的热门标签，保持配置顺序
pub fn present_featured_tags<'a>(tag_index: &TagIndex, featured: &'a [String]) -> Vec<&'a str> {
    featured
        .iter()
        .map(String::as_str)
        .filter(|tag| tag_index.contains(tag))
        .collect()
}
