//! 报表同步 - 编排层
//!
//! 两条独立的管道，任何一步失败都会发通知并结束本管道，不影响其他流程：
//! - 库存：HTTP 登录库存站点 → 下载 csv → 上传到 FTP
//! - 物流：在已登录的浏览器里导出最近一周的物流 csv → 上传到 FTP → 删除本地文件

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use chrono::{Local, NaiveDate};
use tokio::fs;
use tokio::time::{sleep, Instant};
use tracing::{error, info, warn};

use crate::config::Config;
use crate::infrastructure::PortalPage;
use crate::services::file_server::FileServer;
use crate::services::interaction::PageActions;
use crate::services::local_files::remove_if_present;
use crate::services::notifier::{Notification, Notifier};
use crate::workflow::run_ctx::RunCtx;

const FILE_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// 物流导出地址：已发货（status=2）、最近 7 天、每页 150 条
pub fn tracking_url(orders_page_url: &str, today: NaiveDate) -> String {
    let week_before = today - chrono::Duration::days(7);
    format!(
        "{}?status=2&date={}_{}&view=150",
        orders_page_url,
        week_before.format("%Y-%m-%d"),
        today.format("%Y-%m-%d")
    )
}

// ========== 库存 ==========

/// 下载库存文件并上传到 FTP，返回是否全部成功
pub async fn refresh_inventory(
    config: &Config,
    server: &dyn FileServer,
    notifier: &dyn Notifier,
) -> bool {
    info!("📦 开始同步库存文件");

    let client = match reqwest::Client::builder().cookie_store(true).build() {
        Ok(client) => client,
        Err(e) => {
            return report_failure(notifier, "库存同步失败", &anyhow::Error::new(e)).await;
        }
    };

    if let Err(e) = login_inventory_site(&client, config).await {
        return report_failure(notifier, "库存站点登录失败", &e).await;
    }

    let content = match fetch_inventory(&client, config).await {
        Ok(content) => content,
        Err(e) => return report_failure(notifier, "库存文件下载失败", &e).await,
    };

    let output = &config.inventory_output_file;
    if let Err(e) = fs::write(output, &content)
        .await
        .with_context(|| format!("无法写入库存文件: {}", output.display()))
    {
        return report_failure(notifier, "库存文件保存失败", &e).await;
    }
    info!("✓ 库存文件已保存: {} ({} 字节)", output.display(), content.len());

    if let Err(e) = server.store(output, &config.remote_inventory_dir).await {
        return report_failure(notifier, "库存文件上传失败", &e).await;
    }

    info!("✅ 库存同步完成");
    true
}

async fn login_inventory_site(client: &reqwest::Client, config: &Config) -> Result<()> {
    let response = client
        .post(&config.inventory_login_url)
        .form(&[
            ("login_email", config.login_username.as_str()),
            ("login_pass", config.login_password.as_str()),
        ])
        .send()
        .await
        .with_context(|| format!("登录请求失败: {}", config.inventory_login_url))?;

    if !response.status().is_success() {
        bail!("库存站点登录返回 HTTP {}", response.status());
    }
    info!("✓ 已登录库存站点");
    Ok(())
}

async fn fetch_inventory(client: &reqwest::Client, config: &Config) -> Result<Vec<u8>> {
    let response = client
        .get(&config.inventory_file_url)
        .send()
        .await
        .with_context(|| format!("下载请求失败: {}", config.inventory_file_url))?;

    if !response.status().is_success() {
        bail!("库存文件下载返回 HTTP {}", response.status());
    }
    let bytes = response.bytes().await.context("读取库存文件内容失败")?;
    Ok(bytes.to_vec())
}

// ========== 物流 ==========

/// 导出物流文件并上传到 FTP，返回是否全部成功
///
/// 需要浏览器已经登录门户。
pub async fn export_tracking<P: PortalPage>(
    page: &P,
    ctx: &RunCtx,
    config: &Config,
    server: &dyn FileServer,
    notifier: &dyn Notifier,
) -> bool {
    info!("🚚 开始导出物流文件");

    let file = match download_tracking(page, ctx, config).await {
        Ok(file) => file,
        Err(e) => return report_failure(notifier, "物流文件下载失败", &e).await,
    };

    if let Err(e) = server.store(&file, &config.remote_tracking_dir).await {
        return report_failure(notifier, "物流文件上传失败", &e).await;
    }

    if let Err(e) = remove_if_present(&file).await {
        warn!("⚠️ 删除本地物流文件失败: {:#}", e);
    }

    info!("✅ 物流文件同步完成");
    true
}

async fn download_tracking<P: PortalPage>(
    page: &P,
    ctx: &RunCtx,
    config: &Config,
) -> Result<PathBuf> {
    let layout = &ctx.layout;
    let long = ctx.waits.long;
    let actions = PageActions::new(page, ctx.waits);

    fs::create_dir_all(&config.download_dir)
        .await
        .with_context(|| format!("无法创建下载目录: {}", config.download_dir.display()))?;
    let target = config.download_dir.join(&config.tracking_file_name);
    // 旧文件还在时浏览器会把新文件改名保存
    if fs::try_exists(&target).await.unwrap_or(false) {
        remove_if_present(&target).await?;
    }

    page.allow_downloads(&config.download_dir).await?;

    let url = tracking_url(&config.orders_page_url, Local::now().date_naive());
    info!("打开订单列表: {}", url);
    page.goto(&url).await?;

    actions
        .click_when_ready(&layout.tracking_csv_button, long, "导出 csv 按钮")
        .await?;
    actions
        .click_when_ready(&layout.tracking_confirm_button, long, "导出确认按钮")
        .await?;
    info!("已确认导出，等待下载完成...");

    wait_for_file(&target, long).await?;
    info!("✓ 物流文件已下载: {}", target.display());
    Ok(target)
}

async fn wait_for_file(path: &Path, wait: Duration) -> Result<()> {
    let deadline = Instant::now() + wait;
    loop {
        if fs::try_exists(path).await.unwrap_or(false) {
            return Ok(());
        }
        if Instant::now() >= deadline {
            bail!("等待 {:?} 后仍未找到下载文件: {}", wait, path.display());
        }
        sleep(FILE_POLL_INTERVAL).await;
    }
}

async fn report_failure(notifier: &dyn Notifier, subject: &str, error: &anyhow::Error) -> bool {
    error!("❌ {}: {:#}", subject, error);
    notifier
        .notify(Notification::new(
            format!("门户订单机器人: {}", subject),
            format!("{:#}", error),
        ))
        .await;
    false
}
