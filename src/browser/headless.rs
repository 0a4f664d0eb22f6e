use anyhow::Result;
use chromiumoxide::{Browser, BrowserConfig};
use futures::StreamExt;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::infrastructure::ChromiumPage;

/// 一次运行期间的浏览器会话
///
/// 整个运行只启动一次浏览器，所有退出路径都必须调用 [`BrowserSession::close`]。
pub struct BrowserSession {
    browser: Browser,
    handler: JoinHandle<()>,
    page: ChromiumPage,
}

impl BrowserSession {
    pub fn page(&self) -> &ChromiumPage {
        &self.page
    }

    /// 关闭浏览器并等待进程退出
    pub async fn close(mut self) {
        info!("正在关闭浏览器...");
        if let Err(e) = self.browser.close().await {
            warn!("⚠️ 关闭浏览器失败: {}", e);
        }
        if let Err(e) = self.browser.wait().await {
            warn!("⚠️ 等待浏览器进程退出失败: {}", e);
        }
        self.handler.abort();
        info!("浏览器已关闭");
    }
}

/// 启动无头浏览器并打开空白页
pub async fn launch_headless_browser(config: &Config) -> Result<BrowserSession> {
    info!("🚀 启动无头浏览器...");

    let mut builder = BrowserConfig::builder().new_headless_mode().args(vec![
        "--no-sandbox",            // 禁用沙盒，防止权限问题导致的崩溃
        "--disable-gpu",           // 无头模式下禁用 GPU
        "--disable-dev-shm-usage", // 防止共享内存不足
    ]);
    if let Some(executable) = &config.chrome_executable {
        debug!("使用自定义浏览器: {}", executable.display());
        builder = builder.chrome_executable(executable);
    }

    let browser_config = builder.build().map_err(|e| {
        error!("配置无头浏览器失败: {}", e);
        anyhow::anyhow!("配置无头浏览器失败: {}", e)
    })?;

    // 启动浏览器
    let (browser, mut handler) = Browser::launch(browser_config).await.map_err(|e| {
        error!("启动无头浏览器失败: {}", e);
        anyhow::anyhow!("启动无头浏览器失败: {}", e)
    })?;
    debug!("无头浏览器启动成功");

    // 在后台处理浏览器事件
    let handler = tokio::spawn(async move {
        while let Some(h) = handler.next().await {
            if h.is_err() {
                break;
            }
        }
    });

    // 添加短暂延迟以等待浏览器状态同步
    sleep(tokio::time::Duration::from_millis(300)).await;

    let page = match browser.new_page("about:blank").await {
        Ok(page) => page,
        Err(e) => {
            error!("创建页面失败: {}", e);
            let mut browser = browser;
            let _ = browser.close().await;
            handler.abort();
            return Err(anyhow::anyhow!("创建页面失败: {}", e));
        }
    };

    info!("✅ 无头浏览器已就绪");

    Ok(BrowserSession {
        browser,
        handler,
        page: ChromiumPage::new(page),
    })
}
