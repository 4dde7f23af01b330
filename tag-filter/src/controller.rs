use std::time::Duration;

use tracing::debug;
use utils_common::Post;

use crate::derive::{compute_search_results, filter_post_indices, is_blank, present_featured_tags};
use crate::location::{split_tags, Location};
use crate::models::{FeaturedTagView, FilterConfig, FilterView, PostIndex, TagIndex};

/// 延迟隐藏搜索建议的凭据
///
/// 失焦时生成，宿主在延迟结束后交回 [`TagFilterController::hide_results`]。
/// 只有最近一次且未被取消的凭据会生效。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HideTicket(u64);

/// 标签筛选控制器 - 维护已选标签和搜索状态，并与URL保持同步
pub struct TagFilterController<L: Location> {
    posts: Vec<Post>,
    tag_index: TagIndex,
    config: FilterConfig,
    location: L,
    selected: Vec<String>,
    query: String,
    search_results: Vec<String>,
    results_visible: bool,
    filtered: Vec<usize>,
    hide_generation: u64,
    pending_hide: Option<HideTicket>,
}

impl<L: Location> TagFilterController<L> {
    /// 用文章列表创建控制器，所有状态为空
    pub fn new(posts: Vec<Post>, config: FilterConfig, location: L) -> Self {
        let tag_index = TagIndex::from_posts(&posts);
        Self::from_parts(posts, tag_index, config, location)
    }

    /// 用已加载的索引创建控制器
    pub fn with_index(index: PostIndex, config: FilterConfig, location: L) -> Self {
        Self::from_parts(index.posts, index.tag_index, config, location)
    }

    fn from_parts(posts: Vec<Post>, tag_index: TagIndex, config: FilterConfig, location: L) -> Self {
        let filtered = (0..posts.len()).collect();
        Self {
            posts,
            tag_index,
            config,
            location,
            selected: Vec::new(),
            query: String::new(),
            search_results: Vec::new(),
            results_visible: false,
            filtered,
            hide_generation: 0,
            pending_hide: None,
        }
    }

    /// 页面挂载：创建控制器并从当前URL初始化已选标签
    pub fn mount(index: PostIndex, config: FilterConfig, location: L) -> Self {
        let mut controller = Self::with_index(index, config, location);
        let raw = controller
            .location
            .read()
            .and_then(|params| params.get(&controller.config.query_param).map(str::to_string));
        controller.initialize_from_url(raw.as_deref());
        controller
    }

    /// 从URL参数初始化已选标签，不回写URL
    pub fn initialize_from_url(&mut self, query_param: Option<&str>) {
        let Some(raw) = query_param else {
            return;
        };

        let mut selected: Vec<String> = Vec::new();
        for tag in split_tags(raw) {
            if !selected.contains(&tag) {
                selected.push(tag);
            }
        }

        debug!(tags = ?selected, "从URL初始化已选标签");
        self.selected = selected;
        self.refresh_filtered();
    }

    /// 切换标签：已选则移除，否则追加；空白标签被忽略
    pub fn toggle_tag(&mut self, tag: &str) {
        if is_blank(tag) {
            return;
        }

        match self.selected.iter().position(|t| t == tag) {
            Some(pos) => {
                self.selected.remove(pos);
            }
            None => self.selected.push(tag.to_string()),
        }

        debug!(tag, selected = ?self.selected, "切换标签");
        self.refresh_filtered();
        self.sync_url();
    }

    /// 从搜索建议中选择标签；已选或空白时只清空搜索框
    pub fn select_from_search(&mut self, tag: &str) {
        self.query.clear();
        self.search_results.clear();
        self.results_visible = false;
        self.pending_hide = None;

        if is_blank(tag) || self.selected.iter().any(|t| t == tag) {
            return;
        }

        self.selected.push(tag.to_string());
        debug!(tag, selected = ?self.selected, "从搜索添加标签");
        self.refresh_filtered();
        self.sync_url();
    }

    /// 清除所有筛选
    pub fn clear_filters(&mut self) {
        self.selected.clear();
        debug!("清除所有筛选");
        self.refresh_filtered();
        self.sync_url();
    }

    /// 更新搜索词并重新计算搜索建议
    pub fn update_search_query(&mut self, query: &str) {
        self.query = query.to_string();
        self.search_results = compute_search_results(
            &self.tag_index,
            &self.config.featured_tags,
            &self.query,
            self.config.search_limit,
        );
        self.results_visible = !is_blank(&self.query) && !self.search_results.is_empty();
    }

    /// 搜索框获得焦点：取消待执行的隐藏，有建议时显示
    pub fn on_search_focus(&mut self) {
        self.pending_hide = None;
        if !is_blank(&self.query) && !self.search_results.is_empty() {
            self.results_visible = true;
        }
    }

    /// 搜索框失焦：返回隐藏凭据，由宿主在 [`blur_hide_delay`](Self::blur_hide_delay) 后交回。
    /// 延迟是为了让建议项的点击先于隐藏执行，只是尽力而为。
    pub fn on_search_blur(&mut self) -> HideTicket {
        self.hide_generation += 1;
        let ticket = HideTicket(self.hide_generation);
        self.pending_hide = Some(ticket);
        ticket
    }

    /// 执行延迟隐藏；凭据已过期或被取消时返回 `false`
    pub fn hide_results(&mut self, ticket: HideTicket) -> bool {
        if self.pending_hide != Some(ticket) {
            return false;
        }
        self.pending_hide = None;
        self.results_visible = false;
        true
    }

    pub fn blur_hide_delay(&self) -> Duration {
        Duration::from_millis(u64::from(self.config.blur_hide_delay_ms))
    }

    pub fn selected_tags(&self) -> &[String] {
        &self.selected
    }

    pub fn search_query(&self) -> &str {
        &self.query
    }

    pub fn search_results(&self) -> &[String] {
        &self.search_results
    }

    pub fn results_visible(&self) -> bool {
        self.results_visible
    }

    pub fn posts(&self) -> &[Post] {
        &self.posts
    }

    pub fn tag_index(&self) -> &TagIndex {
        &self.tag_index
    }

    pub fn config(&self) -> &FilterConfig {
        &self.config
    }

    pub fn location(&self) -> &L {
        &self.location
    }

    /// 当前可见的文章，保持原始顺序
    pub fn filtered_posts(&self) -> Vec<&Post> {
        self.filtered.iter().map(|&i| &self.posts[i]).collect()
    }

    /// 出现在文章中的热门标签
    pub fn featured_tags(&self) -> Vec<&str> {
        present_featured_tags(&self.tag_index, &self.config.featured_tags)
    }

    /// 渲染用的完整视图
    pub fn view(&self) -> FilterView<'_> {
        let featured = self
            .featured_tags()
            .into_iter()
            .map(|tag| FeaturedTagView {
                tag,
                active: self.selected.iter().any(|t| t == tag),
                count: self.tag_index.count(tag),
            })
            .collect();
        let posts = self.filtered_posts();
        let total = posts.len();

        FilterView {
            featured,
            search_query: &self.query,
            search_results: &self.search_results,
            results_visible: self.results_visible,
            selected_tags: &self.selected,
            show_clear: !self.selected.is_empty(),
            posts,
            total,
            is_empty: total == 0,
        }
    }

    fn refresh_filtered(&mut self) {
        self.filtered = filter_post_indices(&self.posts, &self.selected);
    }

    /// 把已选标签写回URL；没有URL上下文时跳过
    fn sync_url(&mut self) {
        let Some(mut params) = self.location.read() else {
            return;
        };

        if self.selected.is_empty() {
            params.remove(&self.config.query_param);
        } else {
            params.set(&self.config.query_param, &self.selected.join(","));
        }
        self.location.replace(&params);
    }
}
