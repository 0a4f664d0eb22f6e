use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::models::layout::Locator;

/// 浏览器驱动层错误
#[derive(Debug, Error)]
pub enum DriverError {
    /// 浏览器协议错误
    #[error("浏览器协议错误: {0}")]
    Cdp(#[from] chromiumoxide::error::CdpError),

    /// 点击目标被其他元素遮挡
    #[error("点击被遮挡: {0}")]
    ClickIntercepted(String),

    /// 页面脚本返回了意外结果
    #[error("执行脚本失败: {0}")]
    Script(String),

    #[error("JSON解析失败: {0}")]
    Json(#[from] serde_json::Error),

    #[error("文件操作失败: {0}")]
    Io(#[from] std::io::Error),
}

/// 门户交互错误
#[derive(Debug, Error)]
pub enum PortalError {
    /// 必需的控件在等待时间内没有就绪
    #[error("元素未就绪: {locator} (已等待 {waited:?})")]
    ElementNotReady { locator: Locator, waited: Duration },

    /// 页面正文中没有出现指定文字
    #[error("页面未出现文字 '{text}' (已等待 {waited:?})")]
    TextNotFound { text: String, waited: Duration },

    /// 订单已提交，但确认信息没有出现
    #[error("等待下单确认信息超时 (已等待 {waited:?})")]
    ConfirmationTimeout { waited: Duration },

    /// 订单文件不是普通文件
    #[error("订单文件不存在或不是普通文件: {}", path.display())]
    MissingPrecondition { path: PathBuf },

    #[error(transparent)]
    Driver(#[from] DriverError),
}

impl PortalError {
    /// 是否值得从头重试整个流程
    ///
    /// 确认超时不重试：订单可能已经下了，重试会重复下单。
    pub fn is_retryable(&self) -> bool {
        !matches!(
            self,
            PortalError::ConfirmationTimeout { .. } | PortalError::MissingPrecondition { .. }
        )
    }
}

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 必需的环境变量未设置
    #[error("环境变量 {var_name} 不存在")]
    Missing { var_name: String },

    /// 环境变量解析失败
    #[error("环境变量 {var_name} 解析失败: 值 '{value}' 无法转换为 {expected_type}")]
    Invalid {
        var_name: String,
        value: String,
        expected_type: String,
    },
}

pub type DriverResult<T> = Result<T, DriverError>;

pub type PortalResult<T> = Result<T, PortalError>;
