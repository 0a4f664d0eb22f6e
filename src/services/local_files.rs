//! 本地文件整理
//!
//! 上传成功的订单移到 processed 目录；失败的留在原地等人工重跑。

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tokio::fs;
use tracing::{info, warn};

use crate::models::order::OrderFile;

/// 把订单文件移动到已处理目录，目录不存在时自动创建
///
/// 返回移动后的路径
pub async fn move_to_processed(order: &OrderFile, processed_dir: &Path) -> Result<PathBuf> {
    if !fs::try_exists(processed_dir).await.unwrap_or(false) {
        fs::create_dir_all(processed_dir)
            .await
            .with_context(|| format!("无法创建目录: {}", processed_dir.display()))?;
        info!("已创建 processed 目录: {}", processed_dir.display());
    }

    let destination = processed_dir.join(order.file_name());
    if fs::rename(order.path(), &destination).await.is_err() {
        // 跨文件系统时 rename 会失败，改为复制后删除
        fs::copy(order.path(), &destination).await.with_context(|| {
            format!(
                "无法移动文件 {} 到 {}",
                order.path().display(),
                destination.display()
            )
        })?;
        fs::remove_file(order.path())
            .await
            .with_context(|| format!("无法删除原文件: {}", order.path().display()))?;
    }

    info!("✓ 已移动 '{}' 到 '{}'", order.file_name(), destination.display());
    Ok(destination)
}

/// 删除本地文件，文件不存在时返回 false
pub async fn remove_if_present(path: &Path) -> Result<bool> {
    if !fs::try_exists(path).await.unwrap_or(false) {
        warn!("⚠️ 要删除的文件不存在: {}", path.display());
        return Ok(false);
    }
    fs::remove_file(path)
        .await
        .with_context(|| format!("无法删除文件: {}", path.display()))?;
    info!("✓ 已删除文件: {}", path.display());
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_move_creates_processed_dir() {
        let dir = tempfile::tempdir().unwrap();
        let pending = dir.path().join("PO-1.csv");
        std::fs::write(&pending, "sku,qty\n").unwrap();
        let processed = dir.path().join("processed/nested");

        let order = OrderFile::locate(&pending).unwrap();
        let moved = move_to_processed(&order, &processed).await.unwrap();

        assert_eq!(moved, processed.join("PO-1.csv"));
        assert!(moved.is_file());
        assert!(!pending.exists());
    }

    #[tokio::test]
    async fn test_remove_if_present() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("tracking.csv");
        std::fs::write(&file, "x").unwrap();

        assert!(remove_if_present(&file).await.unwrap());
        assert!(!remove_if_present(&file).await.unwrap());
    }
}
