//! 订单批量上传 - 编排层
//!
//! ## 职责
//!
//! 1. **遍历订单**：按顺序处理本次运行的所有订单文件
//! 2. **流程调度**：复用同一个 `OrderFlow`
//! 3. **文件整理**：成功的移到 processed 目录，失败的留在原地
//! 4. **通知**：每个失败订单一封，已下单但文件没移走的也发一封，
//!    全部结束后只要有订单上传过（无论成败）再发一封汇总
//!
//! 单个订单的任何错误都不会中断后续订单。

use std::path::{Path, PathBuf};

use tracing::{error, info, warn};

use crate::infrastructure::PortalPage;
use crate::models::order::{BatchId, OrderFile, SubmissionResult};
use crate::services::local_files::move_to_processed;
use crate::services::notifier::{Notification, Notifier};
use crate::workflow::{OrderCtx, OrderFlow, RunCtx};

/// 本次运行的上传统计
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub batch_ids: Vec<BatchId>,
    pub uploaded: usize,
    pub failed: usize,
    pub skipped: usize,
}

impl RunSummary {
    pub fn total(&self) -> usize {
        self.uploaded + self.failed + self.skipped
    }

    fn notification(&self) -> Notification {
        let ids = if self.batch_ids.is_empty() {
            "没有批次号".to_string()
        } else {
            self.batch_ids
                .iter()
                .map(|id| format!("#{}", id))
                .collect::<Vec<_>>()
                .join(", ")
        };
        Notification::new(
            "门户订单机器人: 订单上传完成",
            format!(
                "成功上传 {} 个订单，失败 {} 个。\n批次号: {}",
                self.uploaded, self.failed, ids
            ),
        )
    }
}

pub struct OrderRunner<'a, P: PortalPage> {
    page: &'a P,
    ctx: &'a RunCtx,
    notifier: &'a dyn Notifier,
    processed_dir: &'a Path,
}

impl<'a, P: PortalPage> OrderRunner<'a, P> {
    pub fn new(
        page: &'a P,
        ctx: &'a RunCtx,
        notifier: &'a dyn Notifier,
        processed_dir: &'a Path,
    ) -> Self {
        Self {
            page,
            ctx,
            notifier,
            processed_dir,
        }
    }

    /// 依次上传 `pending` 中的订单文件
    pub async fn run(&self, pending: &[PathBuf]) -> RunSummary {
        let total = pending.len();
        let flow = OrderFlow::new(self.page, self.ctx, self.notifier);
        let mut summary = RunSummary::default();

        for (index, path) in pending.iter().enumerate() {
            let file_name = path
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_else(|| path.display().to_string());
            let order_ctx = OrderCtx::new(index + 1, total, file_name);
            log_order_start(&order_ctx);

            let order = match OrderFile::locate(path) {
                Ok(order) => order,
                Err(e) => {
                    warn!("{} ⚠️ 跳过: {}", order_ctx, e);
                    summary.skipped += 1;
                    continue;
                }
            };

            let report = flow.submit(&order, &order_ctx).await;
            match report.result {
                SubmissionResult::Succeeded { batch_id } => {
                    summary.uploaded += 1;
                    if let Err(e) = move_to_processed(&order, self.processed_dir).await {
                        error!("{} ❌ 订单已上传，但移动文件失败: {:#}", order_ctx, e);
                        self.notify_stranded(&order, batch_id.as_ref(), &e).await;
                    }
                    if let Some(id) = batch_id {
                        summary.batch_ids.push(id);
                    }
                }
                SubmissionResult::Failed { reason } => {
                    summary.failed += 1;
                    self.notifier
                        .notify(Notification::new(
                            "门户订单机器人: 订单上传失败",
                            format!("订单文件 {} 上传失败: {}", order.file_name(), reason),
                        ))
                        .await;
                }
            }

            self.return_to_upload_page(&order_ctx).await;
        }

        if summary.uploaded + summary.failed > 0 {
            self.notifier.notify(summary.notification()).await;
        }
        log_run_complete(&summary);
        summary
    }

    /// 已下单但文件仍在订单目录，下次运行会重复下单，必须人工处理
    async fn notify_stranded(
        &self,
        order: &OrderFile,
        batch_id: Option<&BatchId>,
        error: &anyhow::Error,
    ) {
        let batch = batch_id
            .map(|id| format!("#{}", id))
            .unwrap_or_else(|| "没有批次号".to_string());
        self.notifier
            .notify(Notification::new(
                "门户订单机器人: 订单已上传但文件未移走",
                format!(
                    "订单文件 {} 已成功下单 (批次号: {})，但无法移到 {}: {:#}\n\
                     请手动移走该文件，不要重新上传，否则会重复下单。",
                    order.file_name(),
                    batch,
                    self.processed_dir.display(),
                    error
                ),
            ))
            .await;
    }

    /// 不论成败都回到上传页，给下一个订单一个干净的起点
    async fn return_to_upload_page(&self, order_ctx: &OrderCtx) {
        if let Err(e) = self.page.goto(&self.ctx.upload_url).await {
            warn!("{} ⚠️ 返回上传页失败: {}", order_ctx, e);
        }
    }
}

// ========== 日志辅助函数 ==========

fn log_order_start(order_ctx: &OrderCtx) {
    info!("\n{}", "─".repeat(60));
    info!("{} 开始处理", order_ctx);
}

fn log_run_complete(summary: &RunSummary) {
    info!("\n{}", "=".repeat(60));
    info!("📊 订单上传统计");
    info!("✅ 成功: {}/{}", summary.uploaded, summary.total());
    info!("❌ 失败: {}", summary.failed);
    info!("⏭️ 跳过: {}", summary.skipped);
    if !summary.batch_ids.is_empty() {
        info!(
            "🧾 批次号: {}",
            summary
                .batch_ids
                .iter()
                .map(BatchId::as_str)
                .collect::<Vec<_>>()
                .join(", ")
        );
    }
    info!("{}", "=".repeat(60));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{attached_except, clicked, FakePage, RecordingNotifier};

    #[tokio::test(start_paused = true)]
    async fn test_one_success_one_failure_end_to_end() {
        let dir = tempfile::tempdir().unwrap();
        let pending_dir = dir.path().join("orders");
        let processed_dir = dir.path().join("processed");
        std::fs::create_dir_all(&pending_dir).unwrap();
        let a = pending_dir.join("A.csv");
        let b = pending_dir.join("B.csv");
        std::fs::write(&a, "sku,qty\nX,1\n").unwrap();
        std::fs::write(&b, "sku,qty\nY,2\n").unwrap();

        let ctx = RunCtx::for_tests(dir.path());
        let layout = &ctx.layout;
        // B 选中后上传按钮永远不可点击
        let page = FakePage::new()
            .with_element(layout.file_input.clone(), "")
            .with_element_when(layout.upload_button.clone(), "Upload", attached_except("B.csv"))
            .with_element_when(
                layout.submit_order_button.clone(),
                "Submit",
                clicked(&layout.upload_button),
            )
            .with_element_when(
                layout.confirmation.clone(),
                "Order placed, Batch #1001",
                clicked(&layout.submit_order_button),
            );
        let notifier = RecordingNotifier::default();

        let summary = OrderRunner::new(&page, &ctx, &notifier, &processed_dir)
            .run(&[a.clone(), b.clone()])
            .await;

        assert_eq!(
            summary,
            RunSummary {
                batch_ids: vec![BatchId::new("1001")],
                uploaded: 1,
                failed: 1,
                skipped: 0,
            }
        );
        assert!(!a.exists());
        assert!(processed_dir.join("A.csv").is_file());
        assert!(b.is_file());

        let sent = notifier.sent();
        assert_eq!(sent.len(), 2);
        assert!(sent[0].body.contains("B.csv"));
        assert!(!sent[0].body.contains("A.csv"));
        assert!(sent[1].body.contains("1001"));

        // A: 1 次尝试 + 返回；B: 3 次尝试 + 返回
        assert_eq!(page.goto_count(), 6);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unmovable_upload_is_reported_with_batch_id() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("A.csv");
        std::fs::write(&a, "sku,qty\nX,1\n").unwrap();
        // processed 是普通文件，无法作为目录
        let processed_dir = dir.path().join("processed");
        std::fs::write(&processed_dir, "").unwrap();

        let ctx = RunCtx::for_tests(dir.path());
        let page = FakePage::order_portal(&ctx.layout, "Order placed, Batch #2002");
        let notifier = RecordingNotifier::default();

        let summary = OrderRunner::new(&page, &ctx, &notifier, &processed_dir)
            .run(&[a.clone()])
            .await;

        assert_eq!(summary.uploaded, 1);
        assert!(a.is_file());

        let sent = notifier.sent();
        assert_eq!(sent.len(), 2);
        assert!(sent[0].body.contains("A.csv"));
        assert!(sent[0].body.contains("#2002"));
        assert!(sent[0].body.contains("不要重新上传"));
        assert_eq!(sent[1].subject, "门户订单机器人: 订单上传完成");
    }

    #[tokio::test(start_paused = true)]
    async fn test_all_failed_run_still_sends_summary() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("A.csv");
        std::fs::write(&a, "sku,qty\nX,1\n").unwrap();

        let ctx = RunCtx::for_tests(dir.path());
        let page = FakePage::new().with_element(ctx.layout.file_input.clone(), "");
        let notifier = RecordingNotifier::default();

        let summary = OrderRunner::new(&page, &ctx, &notifier, &dir.path().join("processed"))
            .run(&[a.clone()])
            .await;

        assert_eq!(summary.failed, 1);
        let sent = notifier.sent();
        assert_eq!(sent.len(), 2);
        assert!(sent[0].body.contains("A.csv"));
        assert!(sent[1].body.contains("失败 1 个"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_missing_file_is_skipped_without_summary() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = RunCtx::for_tests(dir.path());
        let page = FakePage::new();
        let notifier = RecordingNotifier::default();

        let summary = OrderRunner::new(&page, &ctx, &notifier, &dir.path().join("processed"))
            .run(&[dir.path().join("gone.csv")])
            .await;

        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.total(), 1);
        assert!(notifier.sent().is_empty());
        assert_eq!(page.goto_count(), 0);
    }

    #[test]
    fn test_summary_without_batch_ids() {
        let summary = RunSummary {
            uploaded: 2,
            ..RunSummary::default()
        };
        assert!(summary.notification().body.contains("没有批次号"));
    }
}
