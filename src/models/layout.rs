//! 门户页面结构
//!
//! 供应商门户的所有元素定位都集中在这里，页面改版时只需要覆盖对应字段
//! （见 `loaders::toml_loader`），不需要改流程代码。

use serde::{Deserialize, Serialize};
use std::fmt;

/// 元素定位方式
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locator {
    /// CSS 选择器
    Css(String),
    /// XPath 表达式
    #[serde(rename = "xpath")]
    XPath(String),
}

impl Locator {
    /// 按 id 定位
    pub fn id(id: &str) -> Self {
        Locator::Css(format!("#{}", id))
    }

    /// 按 name 属性定位
    pub fn name(name: &str) -> Self {
        Locator::Css(format!("[name='{}']", name))
    }

    /// 按 class 定位
    pub fn class(class: &str) -> Self {
        Locator::Css(format!(".{}", class))
    }

    pub fn css(selector: impl Into<String>) -> Self {
        Locator::Css(selector.into())
    }

    /// 按按钮文字精确定位
    pub fn button_text(text: &str) -> Self {
        Locator::XPath(format!("//button[text()='{}']", text))
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Locator::Css(s) => write!(f, "css={}", s),
            Locator::XPath(s) => write!(f, "xpath={}", s),
        }
    }
}

/// 门户页面元素表
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PortalLayout {
    // --- 登录页 ---
    /// 会话过期提示框的"OK"按钮（不一定出现）
    pub session_expired_ok: Locator,
    pub username_field: Locator,
    pub password_field: Locator,
    pub login_button: Locator,

    // --- 订单上传页 ---
    /// 页面初始加载遮罩
    pub loader_overlay: Locator,
    pub file_input: Locator,
    pub upload_button: Locator,
    /// 地址校验提示里的"Proceed"按钮（不一定出现）
    pub address_override: Locator,
    /// 缺货警告（不一定出现）
    pub out_of_stock_alert: Locator,
    /// 缺货警告下继续结算的按钮
    pub checkout_button: Locator,
    /// "支付全部余额"选项（不一定出现）
    pub pay_balance_option: Locator,
    pub submit_order_button: Locator,
    /// 提交后的 SweetAlert 加载框
    pub submission_loader: Locator,
    /// 下单成功提示
    pub confirmation: Locator,

    // --- 订单列表页（物流导出） ---
    pub tracking_csv_button: Locator,
    pub tracking_confirm_button: Locator,
}

impl Default for PortalLayout {
    fn default() -> Self {
        Self {
            session_expired_ok: Locator::class("swal2-confirm"),
            username_field: Locator::name("user"),
            password_field: Locator::name("pw"),
            login_button: Locator::id("submitBtn"),

            loader_overlay: Locator::class("loaderDiv"),
            file_input: Locator::id("formFile"),
            upload_button: Locator::id("uploadBtn"),
            address_override: Locator::button_text("Proceed"),
            out_of_stock_alert: Locator::css("div.alert.alert-warning"),
            checkout_button: Locator::XPath(
                "//button[contains(normalize-space(.), 'Checkout')]".to_string(),
            ),
            pay_balance_option: Locator::id("pay0"),
            submit_order_button: Locator::id("submitBtn"),
            submission_loader: Locator::class("swal2-container"),
            confirmation: Locator::css("div.alert.alert-success.mt-3"),

            tracking_csv_button: Locator::id("csvBtn"),
            tracking_confirm_button: Locator::css(
                "button.swal2-confirm.swal2-styled.swal2-default-outline",
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_locator_helpers() {
        assert_eq!(Locator::id("formFile"), Locator::Css("#formFile".into()));
        assert_eq!(Locator::name("pw"), Locator::Css("[name='pw']".into()));
        assert_eq!(
            Locator::button_text("Proceed"),
            Locator::XPath("//button[text()='Proceed']".into())
        );
        assert_eq!(Locator::id("uploadBtn").to_string(), "css=#uploadBtn");
    }

    #[test]
    fn test_partial_layout_override() {
        let layout: PortalLayout = toml::from_str(
            r#"
            confirmation = { css = "div.alert-success" }
            checkout_button = { xpath = "//button[@id='goCheckout']" }
            "#,
        )
        .unwrap();

        assert_eq!(layout.confirmation, Locator::css("div.alert-success"));
        assert_eq!(
            layout.checkout_button,
            Locator::XPath("//button[@id='goCheckout']".into())
        );
        // 未覆盖的字段保持默认
        assert_eq!(layout.file_input, Locator::id("formFile"));
    }
}
