//! 整体运行流程 - 编排层
//!
//! ## 职责
//!
//! 本模块是整个应用的入口，负责一次完整运行的调度和资源管理。
//!
//! ## 运行顺序
//!
//! 1. **拉取订单**：从 FTP 下载待上传的订单（未配置 FTP 时扫描本地订单目录）
//! 2. **浏览器阶段**：启动浏览器 → 登录 → 上传订单 → 导出物流文件 → 关闭浏览器
//! 3. **库存同步**：与浏览器无关，登录失败时也会执行
//!
//! ## 设计特点
//!
//! - **资源所有者**：唯一启动和关闭浏览器的模块，浏览器阶段的所有退出路径都会关闭浏览器
//! - **错误隔离**：任何阶段的失败只记录日志和发通知，不中断后续阶段
//! - **向下委托**：单个订单交给 `OrderRunner`，报表交给 `reports`

use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::{error, info, warn};

use crate::browser;
use crate::infrastructure::PortalPage;
use crate::config::Config;
use crate::models::layout::PortalLayout;
use crate::models::loaders::{list_order_files, load_layout};
use crate::orchestrator::order_runner::{OrderRunner, RunSummary};
use crate::orchestrator::reports;
use crate::services::file_server::{FileServer, FtpFileServer};
use crate::services::notifier::{notifier_from_config, Notification, Notifier};
use crate::utils::logging::{log_phase, log_startup, print_finish};
use crate::workflow::{Credentials, LoginFlow, RunCtx};

/// 应用主结构
pub struct App {
    config: Config,
    ctx: RunCtx,
    notifier: Box<dyn Notifier>,
    file_server: Option<Box<dyn FileServer>>,
}

impl App {
    /// 初始化应用：校验配置、加载页面布局、选择通知和文件服务器
    pub async fn initialize(config: Config) -> Result<Self> {
        config.validate()?;
        log_startup(&config.upload_url, config.ftp_enabled(), config.email_enabled());

        let layout = match &config.portal_layout_file {
            Some(path) => {
                info!("📐 加载页面布局: {}", path.display());
                load_layout(path).await?
            }
            None => PortalLayout::default(),
        };

        tokio::fs::create_dir_all(&config.screenshot_dir)
            .await
            .with_context(|| format!("无法创建截图目录: {}", config.screenshot_dir.display()))?;

        let file_server: Option<Box<dyn FileServer>> = if config.ftp_enabled() {
            Some(Box::new(FtpFileServer::new(&config)))
        } else {
            warn!("⚠️ 未配置 FTP，只处理本地订单目录，报表不会上传");
            None
        };

        Ok(Self {
            ctx: RunCtx::new(&config, layout),
            notifier: notifier_from_config(&config),
            file_server,
            config,
        })
    }

    /// 运行应用主逻辑
    pub async fn run(&self) -> Result<()> {
        let pending = self.collect_pending_orders().await;
        let tracking = self.config.tracking_enabled() && self.file_server.is_some();

        let summary = if pending.is_empty() && !tracking {
            info!("没有待上传的订单，跳过浏览器阶段");
            RunSummary::default()
        } else {
            self.browser_phase(&pending, tracking).await
        };

        self.inventory_phase().await;

        print_finish(summary.uploaded, summary.failed);
        Ok(())
    }

    /// 拉取待上传的订单文件路径
    async fn collect_pending_orders(&self) -> Vec<PathBuf> {
        log_phase("📥 拉取订单");
        let orders_dir = &self.config.local_orders_dir;

        let Some(server) = &self.file_server else {
            return match list_order_files(orders_dir).await {
                Ok(orders) => orders,
                Err(e) => {
                    error!("❌ 扫描本地订单目录失败: {:#}", e);
                    Vec::new()
                }
            };
        };

        let names = match server.fetch_orders(orders_dir).await {
            Ok(names) => names,
            Err(e) => {
                error!("❌ 从 FTP 拉取订单失败: {:#}", e);
                self.notifier
                    .notify(Notification::new(
                        "门户订单机器人: FTP 拉取订单失败",
                        format!("{:#}", e),
                    ))
                    .await;
                return Vec::new();
            }
        };
        info!("✓ 从 FTP 下载了 {} 个订单", names.len());

        // 已经下载到本地的订单照常上传，归档失败只通知
        if !names.is_empty() {
            if let Err(e) = server.archive_orders(&names).await {
                error!("❌ 远程订单归档失败: {:#}", e);
                self.notifier
                    .notify(Notification::new(
                        "门户订单机器人: FTP 归档订单失败",
                        format!(
                            "本次下载的订单会照常上传，但远程归档失败: {:#}\n\
                             请手动把这些文件移出远程订单目录，否则下次运行会重复下单。",
                            e
                        ),
                    ))
                    .await;
            }
        }

        names.iter().map(|name| orders_dir.join(name)).collect()
    }

    /// 浏览器阶段：无论结果如何都会关闭浏览器
    async fn browser_phase(&self, pending: &[PathBuf], tracking: bool) -> RunSummary {
        log_phase("🌐 浏览器阶段");

        let session = match browser::launch_headless_browser(&self.config).await {
            Ok(session) => session,
            Err(e) => {
                error!("❌ 启动浏览器失败: {:#}", e);
                self.notify_orders_left("启动浏览器失败", pending).await;
                return RunSummary::default();
            }
        };

        let summary = self.drive_portal(session.page(), pending, tracking).await;
        session.close().await;
        summary
    }

    async fn drive_portal<P: PortalPage>(
        &self,
        page: &P,
        pending: &[PathBuf],
        tracking: bool,
    ) -> RunSummary {
        let credentials = Credentials {
            username: self.config.login_username.clone(),
            password: self.config.login_password.clone(),
        };

        if !LoginFlow::new(page, &self.ctx).login(&credentials).await {
            error!("❌ 登录失败，结束浏览器阶段");
            self.notify_orders_left("登录门户失败", pending).await;
            return RunSummary::default();
        }

        let summary = if pending.is_empty() {
            info!("没有待上传的订单");
            RunSummary::default()
        } else {
            log_phase(&format!("📤 上传订单 (共 {} 个)", pending.len()));
            OrderRunner::new(
                page,
                &self.ctx,
                self.notifier.as_ref(),
                &self.config.local_processed_dir,
            )
            .run(pending)
            .await
        };

        if let (true, Some(server)) = (tracking, &self.file_server) {
            log_phase("🚚 物流导出");
            reports::export_tracking(
                page,
                &self.ctx,
                &self.config,
                &**server,
                self.notifier.as_ref(),
            )
            .await;
        }

        summary
    }

    /// 浏览器阶段提前结束，列出留在订单目录里的文件
    async fn notify_orders_left(&self, cause: &str, pending: &[PathBuf]) {
        let files = if pending.is_empty() {
            "没有待上传的订单".to_string()
        } else {
            pending
                .iter()
                .map(|path| path.display().to_string())
                .collect::<Vec<_>>()
                .join("\n")
        };
        self.notifier
            .notify(Notification::new(
                format!("门户订单机器人: {}", cause),
                format!(
                    "{}，本次没有上传任何订单，物流文件也未导出。\n\
                     以下订单未上传，仍留在本地订单目录:\n{}",
                    cause, files
                ),
            ))
            .await;
    }

    async fn inventory_phase(&self) {
        if !self.config.inventory_enabled() {
            info!("未配置库存站点，跳过库存同步");
            return;
        }
        let Some(server) = &self.file_server else {
            warn!("⚠️ 未配置 FTP，跳过库存同步");
            return;
        };

        log_phase("📦 库存同步");
        reports::refresh_inventory(&self.config, &**server, self.notifier.as_ref()).await;
    }
}
