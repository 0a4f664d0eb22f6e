//! Chromium 页面 - 基础设施层
//!
//! 持有唯一的 Page 资源，用 chromiumoxide 实现 [`PortalPage`]

use std::path::Path;

use async_trait::async_trait;
use chromiumoxide::cdp::browser_protocol::browser::{
    SetDownloadBehaviorBehavior, SetDownloadBehaviorParams,
};
use chromiumoxide::cdp::browser_protocol::dom::SetFileInputFilesParams;
use chromiumoxide::cdp::browser_protocol::page::CaptureScreenshotFormat;
use chromiumoxide::page::ScreenshotParams;
use chromiumoxide::{Element, Page};
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;
use tracing::debug;

use crate::error::{DriverError, DriverResult};
use crate::infrastructure::page_driver::PortalPage;
use crate::models::layout::Locator;

/// 判断元素中心点是否就是它自己（没有被遮罩挡住）
const HIT_TEST_JS: &str = r#"
function() {
    this.scrollIntoView({ block: 'center', inline: 'center' });
    const r = this.getBoundingClientRect();
    const hit = document.elementFromPoint(r.left + r.width / 2, r.top + r.height / 2);
    return hit === null || hit === this || this.contains(hit);
}
"#;

const IS_DISPLAYED_JS: &str = r#"
function() {
    const r = this.getBoundingClientRect();
    const s = window.getComputedStyle(this);
    return r.width > 0 && r.height > 0 && s.visibility !== 'hidden' && s.display !== 'none';
}
"#;

/// Chromium 标签页
///
/// 职责：
/// - 持有唯一的 Page 资源
/// - 每个方法只做一次 CDP 操作，不等待、不重试
/// - 不认识订单和登录流程
pub struct ChromiumPage {
    page: Page,
}

impl ChromiumPage {
    pub fn new(page: Page) -> Self {
        Self { page }
    }

    /// 执行 JS 代码并返回 JSON 结果
    pub async fn eval(&self, js_code: impl Into<String>) -> DriverResult<JsonValue> {
        let result = self.page.evaluate(js_code.into()).await?;
        let json_value = result.into_value()?;
        Ok(json_value)
    }

    /// 执行 JS 代码并反序列化为指定类型
    pub async fn eval_as<T: DeserializeOwned>(&self, js_code: impl Into<String>) -> DriverResult<T> {
        let json_value = self.eval(js_code).await?;
        let typed_value = serde_json::from_value(json_value)?;
        Ok(typed_value)
    }

    /// 在元素上调用返回布尔值的函数
    async fn call_bool(&self, element: &Element, function: &str) -> DriverResult<bool> {
        let returns = element.call_js_fn(function, false).await?;
        Ok(returns
            .result
            .value
            .and_then(|v| v.as_bool())
            .unwrap_or(false))
    }
}

#[async_trait]
impl PortalPage for ChromiumPage {
    type Element = Element;

    async fn goto(&self, url: &str) -> DriverResult<()> {
        debug!("导航到: {}", url);
        self.page.goto(url).await?;
        Ok(())
    }

    async fn find(&self, locator: &Locator) -> DriverResult<Option<Element>> {
        match locator {
            Locator::Css(selector) => {
                let mut elements = self.page.find_elements(selector.as_str()).await?;
                if elements.is_empty() {
                    Ok(None)
                } else {
                    Ok(Some(elements.swap_remove(0)))
                }
            }
            Locator::XPath(xpath) => {
                // 先数一下，避免 DOM.performSearch 在没有结果时报错
                let js_code = format!(
                    "document.evaluate({}, document, null, XPathResult.ORDERED_NODE_SNAPSHOT_TYPE, null).snapshotLength",
                    serde_json::to_string(xpath)?
                );
                let count: u64 = self.eval_as(js_code).await?;
                if count == 0 {
                    return Ok(None);
                }
                Ok(Some(self.page.find_xpath(xpath.as_str()).await?))
            }
        }
    }

    async fn is_displayed(&self, element: &Element) -> DriverResult<bool> {
        self.call_bool(element, IS_DISPLAYED_JS).await
    }

    async fn is_enabled(&self, element: &Element) -> DriverResult<bool> {
        self.call_bool(element, "function() { return !this.disabled; }")
            .await
    }

    async fn attach_file(&self, element: &Element, path: &Path) -> DriverResult<()> {
        let params = SetFileInputFilesParams::builder()
            .file(path.to_string_lossy().to_string())
            .backend_node_id(element.backend_node_id)
            .build()
            .map_err(DriverError::Script)?;
        self.page.execute(params).await?;
        Ok(())
    }

    async fn type_text(&self, element: &Element, text: &str) -> DriverResult<()> {
        element.focus().await?.type_str(text).await?;
        Ok(())
    }

    async fn native_click(&self, element: &Element) -> DriverResult<()> {
        if !self.call_bool(element, HIT_TEST_JS).await? {
            return Err(DriverError::ClickIntercepted(
                "元素中心点被其他元素覆盖".to_string(),
            ));
        }
        element.click().await?;
        Ok(())
    }

    async fn scripted_click(&self, element: &Element) -> DriverResult<()> {
        element
            .call_js_fn("function() { this.click(); }", false)
            .await?;
        Ok(())
    }

    async fn scroll_into_view(&self, element: &Element) -> DriverResult<()> {
        element
            .call_js_fn("function() { this.scrollIntoView(true); }", false)
            .await?;
        Ok(())
    }

    async fn text(&self, element: &Element) -> DriverResult<String> {
        Ok(element.inner_text().await?.unwrap_or_default())
    }

    async fn body_text(&self) -> DriverResult<String> {
        self.eval_as("document.body ? document.body.innerText : ''")
            .await
    }

    async fn save_screenshot(&self, path: &Path) -> DriverResult<()> {
        let params = ScreenshotParams::builder()
            .format(CaptureScreenshotFormat::Png)
            .full_page(true)
            .build();
        self.page.save_screenshot(params, path).await?;
        Ok(())
    }

    async fn allow_downloads(&self, dir: &Path) -> DriverResult<()> {
        let params = SetDownloadBehaviorParams::builder()
            .behavior(SetDownloadBehaviorBehavior::Allow)
            .download_path(dir.to_string_lossy().to_string())
            .build()
            .map_err(DriverError::Script)?;
        self.page.execute(params).await?;
        Ok(())
    }
}
