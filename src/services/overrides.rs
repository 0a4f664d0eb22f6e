//! 可选弹窗检测 - 业务能力层
//!
//! 上传文件后，门户可能弹出地址校验提示或缺货警告，也可能什么都不弹。
//! 每个检查都只用短时探测，没出现就直接继续。

use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use tracing::{info, warn};

use crate::error::PortalResult;
use crate::infrastructure::PortalPage;
use crate::models::layout::PortalLayout;
use crate::models::order::{AttemptRecord, OutOfStockCapture};
use crate::services::interaction::{PageActions, Probe};

/// 生成带时间戳的文件名，避免多次截图互相覆盖
pub fn timestamped_file_name(prefix: &str, now: DateTime<Local>) -> String {
    format!("{}_{}.png", prefix, now.format("%Y%m%d_%H%M%S_%3f"))
}

/// 保存诊断截图，失败只记日志
pub async fn capture_diagnostic<P: PortalPage>(
    page: &P,
    dir: &Path,
    prefix: &str,
) -> Option<PathBuf> {
    let path = dir.join(timestamped_file_name(prefix, Local::now()));
    match page.save_screenshot(&path).await {
        Ok(()) => {
            info!("📸 截图已保存: {}", path.display());
            Some(path)
        }
        Err(e) => {
            warn!("⚠️ 截图失败 ({}): {}", path.display(), e);
            None
        }
    }
}

/// 弹窗检测器
pub struct OverrideDetector<'a> {
    layout: &'a PortalLayout,
    screenshot_dir: &'a Path,
}

impl<'a> OverrideDetector<'a> {
    pub fn new(layout: &'a PortalLayout, screenshot_dir: &'a Path) -> Self {
        Self {
            layout,
            screenshot_dir,
        }
    }

    /// 依次处理地址校验、缺货警告和余额支付选项
    ///
    /// 缺货标记在点击结算按钮之前就写入 `record`，后续步骤失败也不会丢失。
    pub async fn run<P: PortalPage>(
        &self,
        actions: &PageActions<'_, P>,
        record: &mut AttemptRecord,
        prefix: &str,
    ) -> PortalResult<()> {
        self.handle_address_override(actions, prefix).await?;
        self.handle_out_of_stock(actions, record, prefix).await?;
        self.select_pay_balance(actions, prefix).await?;
        Ok(())
    }

    async fn handle_address_override<P: PortalPage>(
        &self,
        actions: &PageActions<'_, P>,
        prefix: &str,
    ) -> PortalResult<()> {
        let short = actions.waits().short;
        match actions.probe(&self.layout.address_override, short).await? {
            Probe::Present(button) => {
                info!("{} 检测到地址校验提示，点击 Proceed", prefix);
                actions.click(&button, "地址校验 Proceed").await?;
            }
            Probe::Absent => {
                info!("{} 未出现地址校验提示，继续", prefix);
            }
        }
        Ok(())
    }

    async fn handle_out_of_stock<P: PortalPage>(
        &self,
        actions: &PageActions<'_, P>,
        record: &mut AttemptRecord,
        prefix: &str,
    ) -> PortalResult<()> {
        let short = actions.waits().short;
        if let Probe::Absent = actions.probe(&self.layout.out_of_stock_alert, short).await? {
            info!("{} 未出现缺货警告", prefix);
            return Ok(());
        }

        warn!("{} ⚠️ 检测到缺货警告，保存截图", prefix);
        let screenshot = capture_diagnostic(actions.page(), self.screenshot_dir, "oos_items").await;
        record.out_of_stock = Some(OutOfStockCapture { screenshot });

        // 结算按钮可能在屏幕外
        let checkout = actions
            .await_present(&self.layout.checkout_button, actions.waits().long)
            .await?;
        actions.page().scroll_into_view(&checkout).await?;
        actions.click(&checkout, "缺货结算按钮").await?;
        info!("{} 已跳过缺货警告继续结算", prefix);
        Ok(())
    }

    async fn select_pay_balance<P: PortalPage>(
        &self,
        actions: &PageActions<'_, P>,
        prefix: &str,
    ) -> PortalResult<()> {
        let short = actions.waits().short;
        if let Probe::Present(option) = actions.probe(&self.layout.pay_balance_option, short).await? {
            info!("{} 选择支付全部余额", prefix);
            actions.click(&option, "支付全部余额").await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::interaction::WaitBudget;
    use crate::testing::{Action, FakePage};
    use chrono::TimeZone;

    #[test]
    fn test_timestamped_file_name() {
        let now = Local.with_ymd_and_hms(2026, 3, 1, 9, 5, 7).unwrap();
        assert_eq!(
            timestamped_file_name("oos_items", now),
            "oos_items_20260301_090507_000.png"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_nothing_present_is_silent() {
        let dir = tempfile::tempdir().unwrap();
        let layout = PortalLayout::default();
        let page = FakePage::new();
        let actions = PageActions::new(&page, WaitBudget::default());
        let mut record = AttemptRecord::new(1);

        OverrideDetector::new(&layout, dir.path())
            .run(&actions, &mut record, "[测试]")
            .await
            .unwrap();

        assert!(record.out_of_stock.is_none());
        assert!(page.actions().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_out_of_stock_captures_and_proceeds() {
        let dir = tempfile::tempdir().unwrap();
        let layout = PortalLayout::default();
        let page = FakePage::new()
            .with_element(layout.address_override.clone(), "Proceed")
            .with_element(layout.out_of_stock_alert.clone(), "Item 123 is out of stock")
            .with_element(layout.checkout_button.clone(), "Checkout");
        let actions = PageActions::new(&page, WaitBudget::default());
        let mut record = AttemptRecord::new(1);

        OverrideDetector::new(&layout, dir.path())
            .run(&actions, &mut record, "[测试]")
            .await
            .unwrap();

        let capture = record.out_of_stock.expect("缺货标记应被设置");
        let shot = capture.screenshot.expect("截图应保存成功");
        assert!(shot.exists());
        assert!(shot
            .file_name()
            .unwrap()
            .to_string_lossy()
            .starts_with("oos_items_"));

        let log = page.actions();
        assert_eq!(log.iter().filter(|a| matches!(a, Action::Screenshot(_))).count(), 1);
        assert!(log.contains(&Action::NativeClick(layout.address_override.clone())));
        let scroll = log
            .iter()
            .position(|a| *a == Action::Scroll(layout.checkout_button.clone()))
            .unwrap();
        let click = log
            .iter()
            .position(|a| *a == Action::NativeClick(layout.checkout_button.clone()))
            .unwrap();
        assert!(scroll < click, "结算按钮应先滚动到可见区域再点击");
    }

    #[tokio::test(start_paused = true)]
    async fn test_flag_kept_when_screenshot_fails() {
        let dir = tempfile::tempdir().unwrap();
        let layout = PortalLayout::default();
        let page = FakePage::new()
            .with_element(layout.out_of_stock_alert.clone(), "out of stock")
            .with_element(layout.checkout_button.clone(), "Checkout")
            .failing_screenshots();
        let actions = PageActions::new(&page, WaitBudget::default());
        let mut record = AttemptRecord::new(1);

        OverrideDetector::new(&layout, dir.path())
            .run(&actions, &mut record, "[测试]")
            .await
            .unwrap();

        assert_eq!(
            record.out_of_stock,
            Some(OutOfStockCapture { screenshot: None })
        );
    }
}
