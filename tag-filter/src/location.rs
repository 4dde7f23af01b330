//! URL查询参数与"当前地址"能力的抽象
//!
//! 控制器只依赖 [`Location`]，浏览器中由 `BrowserLocation` 实现，
//! 测试和非交互渲染使用 [`MemoryLocation`] / [`NoLocation`]。

use url::form_urlencoded;

/// 有序的查询参数列表
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams {
    pairs: Vec<(String, String)>,
}

impl QueryParams {
    /// 解析查询字符串，允许带前导 `?`
    pub fn parse(query: &str) -> Self {
        let query = query.strip_prefix('?').unwrap_or(query);
        let pairs = form_urlencoded::parse(query.as_bytes())
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        Self { pairs }
    }

    /// 参数的第一个值
    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// 设置参数：原位替换第一个同名参数并移除其余同名参数，不存在时追加
    pub fn set(&mut self, key: &str, value: &str) {
        match self.pairs.iter().position(|(k, _)| k == key) {
            Some(pos) => {
                self.pairs[pos].1 = value.to_string();
                let mut index = 0;
                self.pairs.retain(|(k, _)| {
                    let keep = index <= pos || k != key;
                    index += 1;
                    keep
                });
            }
            None => self.pairs.push((key.to_string(), value.to_string())),
        }
    }

    /// 删除所有同名参数
    pub fn remove(&mut self, key: &str) {
        self.pairs.retain(|(k, _)| k != key);
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// 序列化为不带 `?` 的查询字符串
    pub fn to_query_string(&self) -> String {
        form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.pairs.iter())
            .finish()
    }
}

/// 把逗号分隔的标签参数拆成标签列表，丢弃空白项，其余原样保留
pub fn split_tags(raw: &str) -> Vec<String> {
    raw.split(',')
        .filter(|tag| !tag.trim().is_empty())
        .map(str::to_string)
        .collect()
}

/// 当前页面地址
pub trait Location {
    /// 读取当前查询参数；没有客户端URL上下文时返回 `None`
    fn read(&self) -> Option<QueryParams>;

    /// 以替换方式写回查询参数（不新增历史记录，不滚动）
    fn replace(&mut self, params: &QueryParams);
}

/// 内存中的地址，记录替换次数
#[derive(Debug, Clone, Default)]
pub struct MemoryLocation {
    current: QueryParams,
    replacements: usize,
}

impl MemoryLocation {
    pub fn new(query: &str) -> Self {
        Self {
            current: QueryParams::parse(query),
            replacements: 0,
        }
    }

    pub fn params(&self) -> &QueryParams {
        &self.current
    }

    pub fn query_string(&self) -> String {
        self.current.to_query_string()
    }

    /// 发生过的替换次数
    pub fn replacements(&self) -> usize {
        self.replacements
    }
}

impl Location for MemoryLocation {
    fn read(&self) -> Option<QueryParams> {
        Some(self.current.clone())
    }

    fn replace(&mut self, params: &QueryParams) {
        self.current = params.clone();
        self.replacements += 1;
    }
}

/// 没有URL上下文（例如预渲染阶段），同步被跳过
#[derive(Debug, Clone, Copy, Default)]
pub struct NoLocation;

impl Location for NoLocation {
    fn read(&self) -> Option<QueryParams> {
        None
    }

    fn replace(&mut self, _params: &QueryParams) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_with_or_without_question_mark() {
        let a = QueryParams::parse("?tags=Python%2CDIY&page=2");
        let b = QueryParams::parse("tags=Python,DIY&page=2");
        assert_eq!(a.get("tags"), Some("Python,DIY"));
        assert_eq!(a, b);
        assert_eq!(a.get("page"), Some("2"));
        assert_eq!(a.get("missing"), None);
    }

    #[test]
    fn set_replaces_in_place_and_drops_duplicates() {
        let mut params = QueryParams::parse("a=1&tags=x&b=2&tags=y");
        params.set("tags", "Python");
        assert_eq!(params.to_query_string(), "a=1&tags=Python&b=2");

        params.set("c", "3");
        assert_eq!(params.to_query_string(), "a=1&tags=Python&b=2&c=3");
    }

    #[test]
    fn remove_drops_the_parameter() {
        let mut params = QueryParams::parse("tags=x&page=2");
        params.remove("tags");
        assert_eq!(params.to_query_string(), "page=2");
        params.remove("page");
        assert!(params.is_empty());
        assert_eq!(params.to_query_string(), "");
    }

    #[test]
    fn encoded_values_decode_back() {
        let mut params = QueryParams::default();
        params.set("tags", "System Design,C++");
        let encoded = params.to_query_string();
        assert_eq!(QueryParams::parse(&encoded).get("tags"), Some("System Design,C++"));
    }

    #[test]
    fn split_tags_discards_blank_entries() {
        assert_eq!(split_tags("Python,DIY"), vec!["Python", "DIY"]);
        assert_eq!(split_tags("Python,, ,DIY,"), vec!["Python", "DIY"]);
        assert_eq!(split_tags(" Python"), vec![" Python"]);
        assert!(split_tags("").is_empty());
        assert!(split_tags(" , ").is_empty());
    }

    #[test]
    fn memory_location_counts_replacements() {
        let mut location = MemoryLocation::new("?page=1");
        assert_eq!(location.read().unwrap().get("page"), Some("1"));
        location.replace(&QueryParams::parse("page=2"));
        assert_eq!(location.query_string(), "page=2");
        assert_eq!(location.replacements(), 1);
        assert!(NoLocation.read().is_none());
    }
}
