//! 日志工具模块
//!
//! 提供日志初始化和格式化输出的辅助函数

use tracing::info;
use tracing_subscriber::EnvFilter;

/// 初始化日志
///
/// `RUST_LOG` 优先；未设置时默认 `info`，`verbose` 为 true 时默认 `debug`。
pub fn init(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        // chromiumoxide 的协议日志太吵
        EnvFilter::new(format!("{},chromiumoxide=warn", default_level))
    });

    // 测试或重复初始化时忽略错误
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

/// 记录程序启动信息
pub fn log_startup(upload_url: &str, ftp_enabled: bool, email_enabled: bool) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - 门户订单上传");
    info!("🌐 上传页: {}", upload_url);
    info!(
        "📂 FTP: {} | 📧 邮件: {}",
        if ftp_enabled { "已配置" } else { "未配置" },
        if email_enabled { "已配置" } else { "未配置" }
    );
    info!("{}", "=".repeat(60));
}

/// 记录阶段开始
pub fn log_phase(title: &str) {
    info!("\n{}", "=".repeat(60));
    info!("{}", title);
    info!("{}", "=".repeat(60));
}

/// 打印运行结束信息
pub fn print_finish(uploaded: usize, failed: usize) {
    info!("\n{}", "=".repeat(60));
    info!("🏁 运行结束");
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("✅ 上传成功: {} | ❌ 上传失败: {}", uploaded, failed);
    info!("{}", "=".repeat(60));
}

/// 截断长文本用于日志显示
///
/// # 参数
/// - `text`: 原始文本
/// - `max_len`: 最大长度（按字符计）
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_text_counts_chars() {
        assert_eq!(truncate_text("订单已提交成功", 3), "订单已...");
        assert_eq!(truncate_text("short", 10), "short");
    }
}
