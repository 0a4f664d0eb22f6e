use crate::models::layout::PortalLayout;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tokio::fs;

/// 从 TOML 文件加载页面布局，文件中未出现的字段使用默认值
pub async fn load_layout(layout_file_path: &Path) -> Result<PortalLayout> {
    let content = fs::read_to_string(layout_file_path)
        .await
        .with_context(|| format!("无法读取布局文件: {}", layout_file_path.display()))?;

    let layout: PortalLayout = toml::from_str(&content)
        .with_context(|| format!("无法解析布局文件: {}", layout_file_path.display()))?;

    Ok(layout)
}

/// 列出文件夹中所有 csv 订单文件，按文件名排序
pub async fn list_order_files(folder: &Path) -> Result<Vec<PathBuf>> {
    if !fs::try_exists(folder).await.unwrap_or(false) {
        tracing::warn!("订单文件夹不存在: {}", folder.display());
        return Ok(Vec::new());
    }

    let mut orders = Vec::new();
    let mut entries = fs::read_dir(folder)
        .await
        .with_context(|| format!("无法读取文件夹: {}", folder.display()))?;

    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        let is_csv = path
            .extension()
            .and_then(|s| s.to_str())
            .map(|ext| ext.eq_ignore_ascii_case("csv"))
            .unwrap_or(false);
        if is_csv && path.is_file() {
            tracing::info!(
                "找到订单: {}",
                path.file_name().unwrap_or_default().to_string_lossy()
            );
            orders.push(path);
        }
    }

    orders.sort();
    Ok(orders)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::layout::Locator;

    #[tokio::test]
    async fn test_partial_layout_override() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("layout.toml");
        std::fs::write(
            &file,
            r#"
upload_button = { css = "button#doUpload" }
checkout_button = { xpath = "//a[text()='Continue']" }
"#,
        )
        .unwrap();

        let layout = load_layout(&file).await.unwrap();
        assert_eq!(layout.upload_button, Locator::css("button#doUpload"));
        assert_eq!(
            layout.checkout_button,
            Locator::XPath("//a[text()='Continue']".to_string())
        );
        assert_eq!(layout.file_input, PortalLayout::default().file_input);
    }

    #[tokio::test]
    async fn test_invalid_layout_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("layout.toml");
        std::fs::write(&file, "upload_button = 42").unwrap();

        assert!(load_layout(&file).await.is_err());
        assert!(load_layout(&dir.path().join("missing.toml")).await.is_err());
    }

    #[tokio::test]
    async fn test_list_order_files_keeps_csv_only() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("B.csv"), "").unwrap();
        std::fs::write(dir.path().join("A.CSV"), "").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "").unwrap();
        std::fs::create_dir(dir.path().join("dir.csv")).unwrap();

        let orders = list_order_files(dir.path()).await.unwrap();
        assert_eq!(
            orders,
            vec![dir.path().join("A.CSV"), dir.path().join("B.csv")]
        );

        assert!(list_order_files(&dir.path().join("none"))
            .await
            .unwrap()
            .is_empty());
    }
}
