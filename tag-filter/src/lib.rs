use std::cell::{Cell, RefCell};
use std::rc::Rc;

use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::console;

// 导出模块
pub mod browser;
pub mod builder;
pub mod controller;
pub mod derive;
pub mod error;
pub mod location;
pub mod models;

pub use builder::PostIndexBuilder;
pub use controller::{HideTicket, TagFilterController};
pub use error::Error;
pub use location::{Location, MemoryLocation, NoLocation, QueryParams};
pub use models::{FilterConfig, FilterView, PostIndex, TagIndex};

use browser::BrowserLocation;
use utils_common::Post;

#[cfg(feature = "wee_alloc")]
#[global_allocator]
static ALLOC: wee_alloc::WeeAlloc = wee_alloc::WeeAlloc::INIT;

/// 初始化函数 - 设置错误处理
#[wasm_bindgen(start)]
pub fn start() {
    console_error_panic_hook::set_once();
}

/// 版本信息
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

fn parse_config(config_json: &str) -> Result<FilterConfig, Error> {
    if config_json.trim().is_empty() {
        return Ok(FilterConfig::default());
    }
    serde_json::from_str(config_json).map_err(Error::Config)
}

fn to_js_error(e: Error) -> JsValue {
    let message = e.to_string();
    console::log_1(&JsValue::from_str(&format!("初始化标签筛选失败: {}", message)));
    JsValue::from_str(&message)
}

/// 标签筛选JS接口 - 索引页的筛选、搜索和URL同步
#[wasm_bindgen]
pub struct TagFilterJs {
    inner: Rc<RefCell<TagFilterController<BrowserLocation>>>,
    hide_timeout: Rc<Cell<Option<i32>>>,
    on_change: Rc<RefCell<Option<js_sys::Function>>>,
}

#[wasm_bindgen]
impl TagFilterJs {
    /// 从压缩的文章索引创建，并按当前URL初始化已选标签
    #[wasm_bindgen(constructor)]
    pub fn new(index_data: &[u8], config_json: &str) -> Result<TagFilterJs, JsValue> {
        let config = parse_config(config_json).map_err(to_js_error)?;
        let index = PostIndex::from_compressed(index_data)
            .map_err(Error::from)
            .map_err(to_js_error)?;
        Ok(Self::mount(index, config))
    }

    /// 从JSON文章列表创建
    pub fn from_posts_json(posts_json: &str, config_json: &str) -> Result<TagFilterJs, JsValue> {
        let config = parse_config(config_json).map_err(to_js_error)?;
        let posts: Vec<Post> = serde_json::from_str(posts_json)
            .map_err(Error::Posts)
            .map_err(to_js_error)?;
        Ok(Self::mount(PostIndex::from_posts(posts), config))
    }

    /// 状态因延迟隐藏而变化时调用的回调
    pub fn set_on_change(&self, callback: Option<js_sys::Function>) {
        *self.on_change.borrow_mut() = callback;
    }

    pub fn toggle_tag(&self, tag: &str) {
        self.inner.borrow_mut().toggle_tag(tag);
    }

    pub fn select_from_search(&self, tag: &str) {
        self.cancel_pending_hide();
        self.inner.borrow_mut().select_from_search(tag);
    }

    pub fn clear_filters(&self) {
        self.inner.borrow_mut().clear_filters();
    }

    pub fn update_search_query(&self, query: &str) {
        self.inner.borrow_mut().update_search_query(query);
    }

    pub fn on_search_focus(&self) {
        self.cancel_pending_hide();
        self.inner.borrow_mut().on_search_focus();
    }

    /// 失焦后延迟隐藏搜索建议
    pub fn on_search_blur(&self) {
        self.cancel_pending_hide();

        let (ticket, delay) = {
            let mut controller = self.inner.borrow_mut();
            let ticket = controller.on_search_blur();
            (ticket, controller.blur_hide_delay())
        };

        let Some(window) = web_sys::window() else {
            self.inner.borrow_mut().hide_results(ticket);
            return;
        };

        let inner = Rc::clone(&self.inner);
        let hide_timeout = Rc::clone(&self.hide_timeout);
        let on_change = Rc::clone(&self.on_change);
        let callback = Closure::once_into_js(move || {
            hide_timeout.set(None);
            let hidden = match inner.try_borrow_mut() {
                Ok(mut controller) => controller.hide_results(ticket),
                Err(_) => false,
            };
            if hidden {
                if let Some(cb) = on_change.borrow().as_ref() {
                    if let Err(e) = cb.call0(&JsValue::NULL) {
                        console::log_2(&JsValue::from_str("回调执行失败:"), &e);
                    }
                }
            }
        });

        let delay_ms = i32::try_from(delay.as_millis()).unwrap_or(i32::MAX);
        match window.set_timeout_with_callback_and_timeout_and_arguments_0(callback.unchecked_ref(), delay_ms) {
            Ok(handle) => self.hide_timeout.set(Some(handle)),
            Err(e) => {
                console::log_2(&JsValue::from_str("设置定时器失败:"), &e);
                self.inner.borrow_mut().hide_results(ticket);
            }
        }
    }

    /// 获取当前视图
    pub fn view(&self) -> Result<JsValue, JsValue> {
        let controller = self.inner.borrow();
        serde_wasm_bindgen::to_value(&controller.view())
            .map_err(|e| JsValue::from_str(&format!("序列化视图失败: {}", e)))
    }

    /// 获取所有标签（字典序）
    pub fn all_tags(&self) -> Result<JsValue, JsValue> {
        let controller = self.inner.borrow();
        let tags: Vec<&str> = controller.tag_index().tags().collect();
        serde_wasm_bindgen::to_value(&tags)
            .map_err(|e| JsValue::from_str(&format!("序列化标签失败: {}", e)))
    }
}

impl TagFilterJs {
    fn mount(index: PostIndex, config: FilterConfig) -> Self {
        let controller = TagFilterController::mount(index, config, BrowserLocation::detect());
        Self {
            inner: Rc::new(RefCell::new(controller)),
            hide_timeout: Rc::new(Cell::new(None)),
            on_change: Rc::new(RefCell::new(None)),
        }
    }

    fn cancel_pending_hide(&self) {
        if let Some(handle) = self.hide_timeout.take() {
            if let Some(window) = web_sys::window() {
                window.clear_timeout_with_handle(handle);
            }
        }
    }
}
