//! 运行上下文
//!
//! 一次运行内所有流程共享的只读参数：门户地址、页面布局、等待时长和重试策略。

use std::path::PathBuf;

use crate::config::Config;
use crate::models::layout::PortalLayout;
use crate::services::interaction::WaitBudget;
use crate::workflow::retry::RetryPolicy;

#[derive(Debug, Clone)]
pub struct RunCtx {
    pub login_url: String,
    pub upload_url: String,
    pub welcome_marker: String,
    pub layout: PortalLayout,
    pub waits: WaitBudget,
    pub retry: RetryPolicy,
    /// 缺货和失败截图的保存目录
    pub screenshot_dir: PathBuf,
}

impl RunCtx {
    pub fn new(config: &Config, layout: PortalLayout) -> Self {
        Self {
            login_url: config.login_url.clone(),
            upload_url: config.upload_url.clone(),
            welcome_marker: config.welcome_marker.clone(),
            layout,
            waits: WaitBudget::from_config(config),
            retry: RetryPolicy::from_config(config),
            screenshot_dir: config.screenshot_dir.clone(),
        }
    }
}

#[cfg(test)]
impl RunCtx {
    /// 测试用上下文，截图写到 `screenshot_dir`
    pub(crate) fn for_tests(screenshot_dir: &std::path::Path) -> Self {
        Self {
            login_url: "https://portal.test/login".to_string(),
            upload_url: "https://portal.test/upload".to_string(),
            welcome_marker: "Welcome,".to_string(),
            layout: PortalLayout::default(),
            waits: WaitBudget::default(),
            retry: RetryPolicy::default(),
            screenshot_dir: screenshot_dir.to_path_buf(),
        }
    }
}
