use wasm_bindgen::JsValue;
use web_sys::{console, Window};

use crate::location::{Location, QueryParams};

/// 浏览器地址：读取 `location.search`，用 `history.replaceState` 写回
pub struct BrowserLocation {
    window: Option<Window>,
}

impl BrowserLocation {
    /// 获取当前窗口；在 worker 或预渲染环境中没有窗口，同步会被跳过
    pub fn detect() -> Self {
        Self {
            window: web_sys::window(),
        }
    }
}

impl Location for BrowserLocation {
    fn read(&self) -> Option<QueryParams> {
        let window = self.window.as_ref()?;
        let search = window.location().search().ok()?;
        Some(QueryParams::parse(&search))
    }

    fn replace(&mut self, params: &QueryParams) {
        let Some(window) = self.window.as_ref() else {
            return;
        };

        let location = window.location();
        let (Ok(path), Ok(hash)) = (location.pathname(), location.hash()) else {
            return;
        };

        let query = params.to_query_string();
        let url = if query.is_empty() {
            format!("{}{}", path, hash)
        } else {
            format!("{}?{}{}", path, query, hash)
        };

        let result = window
            .history()
            .and_then(|history| history.replace_state_with_url(&JsValue::NULL, "", Some(url.as_str())));
        if let Err(e) = result {
            console::log_2(&JsValue::from_str("更新URL失败:"), &e);
        }
    }
}
