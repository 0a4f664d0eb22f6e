//! 页面驱动接口 - 基础设施层
//!
//! 流程层只通过这个 trait 操作页面：定位、点击、输入、截图。
//! 所有等待与重试都在上层实现，这里的每个方法只做一次操作，立即返回。

use std::path::Path;

use async_trait::async_trait;

use crate::error::DriverResult;
use crate::models::layout::Locator;

/// 单个浏览器标签页的能力
#[async_trait]
pub trait PortalPage: Send + Sync {
    /// 元素句柄
    type Element: Send + Sync;

    /// 导航到指定 URL
    async fn goto(&self, url: &str) -> DriverResult<()>;

    /// 查找第一个匹配的元素，不存在时返回 None（不等待）
    async fn find(&self, locator: &Locator) -> DriverResult<Option<Self::Element>>;

    /// 元素是否可见
    async fn is_displayed(&self, element: &Self::Element) -> DriverResult<bool>;

    /// 元素是否可用（未被 disabled）
    async fn is_enabled(&self, element: &Self::Element) -> DriverResult<bool>;

    /// 给文件选择框设置本地文件
    async fn attach_file(&self, element: &Self::Element, path: &Path) -> DriverResult<()>;

    /// 在输入框中输入文字
    async fn type_text(&self, element: &Self::Element, text: &str) -> DriverResult<()>;

    /// 原生鼠标点击
    ///
    /// 目标被遮挡时返回 `DriverError::ClickIntercepted`。
    async fn native_click(&self, element: &Self::Element) -> DriverResult<()>;

    /// 通过脚本调用 `element.click()`
    async fn scripted_click(&self, element: &Self::Element) -> DriverResult<()>;

    async fn scroll_into_view(&self, element: &Self::Element) -> DriverResult<()>;

    /// 元素的可见文字
    async fn text(&self, element: &Self::Element) -> DriverResult<String>;

    /// 整个页面正文的文字
    async fn body_text(&self) -> DriverResult<String>;

    /// 保存整页截图（PNG）
    async fn save_screenshot(&self, path: &Path) -> DriverResult<()>;

    /// 允许下载到指定目录
    async fn allow_downloads(&self, dir: &Path) -> DriverResult<()>;
}
