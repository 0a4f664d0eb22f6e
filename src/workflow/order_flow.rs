//! 订单提交流程 - 流程层
//!
//! 核心职责：定义"一个订单文件"的完整提交流程
//!
//! 流程顺序：
//! 1. 打开上传页 → 选择文件 → 点击上传
//! 2. 处理可选弹窗（地址校验 / 缺货 / 余额支付）
//! 3. 提交订单 → 等待确认信息 → 提取批次号
//!
//! 整个流程最多尝试 `RetryPolicy::max_attempts` 次，每次都从第 1 步开始。

use tracing::{debug, error, info, warn};

use crate::error::{PortalError, PortalResult};
use crate::infrastructure::PortalPage;
use crate::models::order::{
    AttemptRecord, AttemptState, BatchId, FailureReason, OrderFile, SubmissionReport,
    SubmissionResult,
};
use crate::services::batch_extractor::extract_batch_id;
use crate::services::interaction::{PageActions, Probe};
use crate::services::notifier::{Notification, Notifier};
use crate::services::overrides::{capture_diagnostic, OverrideDetector};
use crate::utils::truncate_text;
use crate::workflow::order_ctx::OrderCtx;
use crate::workflow::retry::{Attempted, RetryError};
use crate::workflow::run_ctx::RunCtx;

/// 订单提交流程
///
/// - 编排单个订单的状态流转
/// - 不持有浏览器，只借用页面
/// - 缺货通知在每次尝试结束后发送，与尝试成败无关
pub struct OrderFlow<'a, P: PortalPage> {
    actions: PageActions<'a, P>,
    ctx: &'a RunCtx,
    notifier: &'a dyn Notifier,
}

impl<'a, P: PortalPage> OrderFlow<'a, P> {
    pub fn new(page: &'a P, ctx: &'a RunCtx, notifier: &'a dyn Notifier) -> Self {
        Self {
            actions: PageActions::new(page, ctx.waits),
            ctx,
            notifier,
        }
    }

    /// 提交一个订单文件，返回最终结果和尝试次数
    pub async fn submit(&self, order: &OrderFile, order_ctx: &OrderCtx) -> SubmissionReport {
        let prefix = order_ctx.to_string();
        let label = prefix.as_str();
        info!("{} 📤 开始上传订单", label);

        let outcome = self
            .ctx
            .retry
            .run(label, move |index| self.attempt(order, label, index))
            .await;

        match outcome {
            Ok(Attempted { value, attempts }) => {
                match &value {
                    Some(batch_id) => info!("{} ✅ 下单成功，批次号 #{}", label, batch_id),
                    None => warn!("{} ✅ 下单成功，但确认信息中没有批次号", label),
                }
                SubmissionReport {
                    result: SubmissionResult::Succeeded { batch_id: value },
                    attempts,
                }
            }
            Err(RetryError { attempts, error }) => {
                let reason = failure_reason(error);
                error!("{} ❌ 下单失败 (共尝试 {} 次): {}", label, attempts, reason);
                SubmissionReport {
                    result: SubmissionResult::Failed { reason },
                    attempts,
                }
            }
        }
    }

    /// 单次尝试：驱动状态机，结束后补发缺货通知
    async fn attempt(
        &self,
        order: &OrderFile,
        prefix: &str,
        index: u32,
    ) -> PortalResult<Option<BatchId>> {
        let mut record = AttemptRecord::new(index);
        let result = self.drive(order, prefix, &mut record).await;

        if let Err(e) = &result {
            warn!("{} 第 {} 次尝试停在阶段「{}」: {}", prefix, index, record.reached, e);
            record.reached = AttemptState::Failed;
        }

        if let Some(capture) = record.out_of_stock.take() {
            let mut notification = Notification::new(
                "门户订单机器人: 缺货提醒",
                format!(
                    "订单 {} 第 {} 次尝试时门户提示部分商品缺货，已跳过继续结算。",
                    order.file_name(),
                    index
                ),
            );
            if let Some(path) = capture.screenshot {
                notification = notification.with_attachment(path);
            }
            self.notifier.notify(notification).await;
        }

        result
    }

    async fn drive(
        &self,
        order: &OrderFile,
        prefix: &str,
        record: &mut AttemptRecord,
    ) -> PortalResult<Option<BatchId>> {
        let layout = &self.ctx.layout;
        let long = self.ctx.waits.long;
        let page = self.actions.page();

        let mut state = AttemptState::NavigatingToUploadPage;
        let mut batch_id = None;

        while !state.is_terminal() {
            record.reached = state;
            debug!("{} 阶段: {}", prefix, state);

            state = match state {
                AttemptState::NavigatingToUploadPage => {
                    page.goto(&self.ctx.upload_url).await?;
                    self.actions.await_gone(&layout.loader_overlay, long).await?;
                    AttemptState::AwaitingUploadWidget
                }
                AttemptState::AwaitingUploadWidget => {
                    let input = self.actions.await_present(&layout.file_input, long).await?;
                    page.attach_file(&input, &order.absolute_path()).await?;
                    info!("{} 已选择文件", prefix);
                    AttemptState::FileSelected
                }
                AttemptState::FileSelected => {
                    self.actions
                        .click_when_ready(&layout.upload_button, long, "上传按钮")
                        .await?;
                    info!("{} 已点击上传", prefix);
                    AttemptState::UploadSubmitted
                }
                AttemptState::UploadSubmitted => {
                    OverrideDetector::new(layout, &self.ctx.screenshot_dir)
                        .run(&self.actions, record, prefix)
                        .await?;
                    AttemptState::OverridesChecked
                }
                AttemptState::OverridesChecked => {
                    self.submit_order(prefix).await?;
                    AttemptState::OrderSubmitted
                }
                AttemptState::OrderSubmitted => {
                    self.wait_submission_loader(prefix).await;
                    AttemptState::AwaitingConfirmation
                }
                AttemptState::AwaitingConfirmation => {
                    let text = self.await_confirmation(prefix).await?;
                    batch_id = extract_batch_id(&text);
                    AttemptState::Succeeded
                }
                AttemptState::Succeeded | AttemptState::Failed => state,
            };
        }

        record.reached = state;
        Ok(batch_id)
    }

    /// 提交按钮可能在屏幕外，并且在表单校验完成前处于禁用状态
    async fn submit_order(&self, prefix: &str) -> PortalResult<()> {
        let locator = &self.ctx.layout.submit_order_button;
        let long = self.ctx.waits.long;
        let page = self.actions.page();

        let button = self.actions.await_present(locator, long).await?;
        page.scroll_into_view(&button).await?;
        if !page.is_enabled(&button).await? {
            info!("{} 提交按钮尚不可用，等待...", prefix);
            self.actions.await_enabled(&button, locator, long).await?;
        }
        self.actions.click(&button, "提交订单按钮").await?;
        info!("{} 已提交订单", prefix);
        Ok(())
    }

    /// 提交后的加载框，出现与否都不影响结果
    async fn wait_submission_loader(&self, prefix: &str) {
        let locator = &self.ctx.layout.submission_loader;
        let waits = self.ctx.waits;

        match self.actions.probe(locator, waits.short).await {
            Ok(Probe::Present(_)) => {
                debug!("{} 等待提交加载框消失", prefix);
                if let Err(e) = self.actions.await_gone(locator, waits.long).await {
                    warn!("{} ⚠️ 提交加载框未消失: {}", prefix, e);
                }
            }
            Ok(Probe::Absent) => debug!("{} 未出现提交加载框", prefix),
            Err(e) => warn!("{} ⚠️ 检查提交加载框失败: {}", prefix, e),
        }
    }

    /// 等待确认信息，超时记为 ConfirmationTimeout 并截图
    async fn await_confirmation(&self, prefix: &str) -> PortalResult<String> {
        let long = self.ctx.waits.long;
        let page = self.actions.page();

        match self
            .actions
            .await_visible(&self.ctx.layout.confirmation, long)
            .await
        {
            Ok(alert) => {
                let text = page.text(&alert).await?;
                info!("{} 确认信息: {}", prefix, truncate_text(text.trim(), 120));
                Ok(text)
            }
            Err(PortalError::ElementNotReady { waited, .. }) => {
                error!("{} ❌ 订单已提交但未出现确认信息，保存截图", prefix);
                capture_diagnostic(page, &self.ctx.screenshot_dir, "order_submission_failed").await;
                Err(PortalError::ConfirmationTimeout { waited })
            }
            Err(e) => Err(e),
        }
    }
}

fn failure_reason(error: PortalError) -> FailureReason {
    match error {
        PortalError::ConfirmationTimeout { .. } => FailureReason::ConfirmationTimeout,
        e if e.is_retryable() => FailureReason::AttemptsExhausted {
            last_error: e.to_string(),
        },
        e => FailureReason::Unrecoverable {
            error: e.to_string(),
        },
    }
}
