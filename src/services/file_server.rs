//! 远程文件服务器 - 业务能力层
//!
//! 每个操作单独建立一次 FTP 连接，做完一批传输后立即断开。
//! 下载和归档分开进行，归档失败时已下载的订单仍然会被上传。

use std::fs::File;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use suppaftp::types::FileType;
use suppaftp::FtpStream;
use tracing::{debug, info, warn};

use crate::config::Config;

/// 远程文件服务器能力
#[async_trait]
pub trait FileServer: Send + Sync {
    /// 下载远程订单目录中的所有 csv 到 `local_dir`，返回下载成功的文件名
    async fn fetch_orders(&self, local_dir: &Path) -> Result<Vec<String>>;

    /// 把已下载的订单移到远程归档目录
    ///
    /// 单个文件归档失败不影响其余文件，错误中列出所有失败的文件名
    async fn archive_orders(&self, names: &[String]) -> Result<()>;

    /// 上传本地文件到远程目录，文件名不变
    async fn store(&self, local_path: &Path, remote_dir: &str) -> Result<()>;
}

/// 只保留订单 csv
pub fn order_file_names(listing: Vec<String>) -> Vec<String> {
    listing
        .into_iter()
        .map(|entry| {
            // 部分服务器的 NLST 会返回带目录的路径
            entry.rsplit('/').next().unwrap_or_default().to_string()
        })
        .filter(|name| name.to_lowercase().ends_with(".csv"))
        .collect()
}

/// FTP 文件服务器
#[derive(Debug, Clone)]
pub struct FtpFileServer {
    host: String,
    user: String,
    password: String,
    remote_orders_dir: String,
    remote_archive_dir: String,
}

impl FtpFileServer {
    pub fn new(config: &Config) -> Self {
        Self {
            host: config.ftp_host.clone(),
            user: config.ftp_user.clone(),
            password: config.ftp_password.clone(),
            remote_orders_dir: config.remote_orders_dir.clone(),
            remote_archive_dir: config.remote_archive_dir.clone(),
        }
    }

    fn address(&self) -> String {
        if self.host.contains(':') {
            self.host.clone()
        } else {
            format!("{}:21", self.host)
        }
    }

    fn connect(&self) -> Result<FtpStream> {
        let mut ftp = FtpStream::connect(self.address())
            .with_context(|| format!("无法连接 FTP 服务器: {}", self.host))?;
        ftp.login(&self.user, &self.password)
            .with_context(|| format!("FTP 登录失败: {}", self.user))?;
        ftp.transfer_type(FileType::Binary)
            .context("无法切换到二进制传输模式")?;
        info!("✓ 已连接 FTP 服务器: {}", self.host);
        Ok(ftp)
    }

    /// 连接、执行、断开；无论成功与否都会断开连接
    fn with_session<T>(&self, op: impl FnOnce(&mut FtpStream) -> Result<T>) -> Result<T> {
        let mut ftp = self.connect()?;
        let result = op(&mut ftp);
        if let Err(e) = ftp.quit() {
            warn!("⚠️ 关闭 FTP 连接失败: {}", e);
        } else {
            info!("FTP 连接已关闭");
        }
        result
    }

    fn fetch_orders_blocking(&self, local_dir: &Path) -> Result<Vec<String>> {
        std::fs::create_dir_all(local_dir)
            .with_context(|| format!("无法创建本地订单目录: {}", local_dir.display()))?;

        self.with_session(|ftp| {
            ftp.cwd(&self.remote_orders_dir)
                .with_context(|| format!("无法进入远程目录: {}", self.remote_orders_dir))?;
            let listing = ftp.nlst(None).context("无法列出远程订单目录")?;
            debug!("远程目录文件: {:?}", listing);

            let mut downloaded = Vec::new();
            for name in order_file_names(listing) {
                let buffer = ftp
                    .retr_as_buffer(&name)
                    .with_context(|| format!("下载失败: {}", name))?;
                let local_path = local_dir.join(&name);
                std::fs::write(&local_path, buffer.into_inner())
                    .with_context(|| format!("无法写入本地文件: {}", local_path.display()))?;
                info!("✓ 已下载: {}", name);
                downloaded.push(name);
            }
            Ok(downloaded)
        })
    }

    fn archive_orders_blocking(&self, names: &[String]) -> Result<()> {
        self.with_session(|ftp| {
            // 目录已存在时 MKD 会报错，忽略
            if let Err(e) = ftp.mkdir(&self.remote_archive_dir) {
                debug!("创建归档目录: {}", e);
            }

            let mut failed = Vec::new();
            for name in names {
                let from = format!("{}/{}", self.remote_orders_dir.trim_end_matches('/'), name);
                let to = format!("{}/{}", self.remote_archive_dir.trim_end_matches('/'), name);
                match ftp.rename(&from, &to) {
                    Ok(()) => info!("✓ 已归档远程文件: {}", name),
                    Err(e) => {
                        warn!("⚠️ 归档失败: {} -> {}: {}", from, to, e);
                        failed.push(name.as_str());
                    }
                }
            }

            if failed.is_empty() {
                Ok(())
            } else {
                bail!("{} 个订单归档失败: {}", failed.len(), failed.join(", "))
            }
        })
    }

    fn store_blocking(&self, local_path: &Path, remote_dir: &str) -> Result<()> {
        let file_name = local_path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .with_context(|| format!("无效的本地文件路径: {}", local_path.display()))?;
        let mut file = File::open(local_path)
            .with_context(|| format!("无法打开本地文件: {}", local_path.display()))?;

        self.with_session(|ftp| {
            ftp.cwd(remote_dir)
                .with_context(|| format!("无法进入远程目录: {}", remote_dir))?;
            let bytes = ftp
                .put_file(&file_name, &mut file)
                .with_context(|| format!("上传失败: {}", file_name))?;
            info!("✓ 已上传 {} ({} 字节) 到 {}", file_name, bytes, remote_dir);
            Ok(())
        })
    }
}

#[async_trait]
impl FileServer for FtpFileServer {
    async fn fetch_orders(&self, local_dir: &Path) -> Result<Vec<String>> {
        let server = self.clone();
        let local_dir: PathBuf = local_dir.to_path_buf();
        tokio::task::spawn_blocking(move || server.fetch_orders_blocking(&local_dir))
            .await
            .context("FTP 下载任务异常退出")?
    }

    async fn archive_orders(&self, names: &[String]) -> Result<()> {
        let server = self.clone();
        let names = names.to_vec();
        tokio::task::spawn_blocking(move || server.archive_orders_blocking(&names))
            .await
            .context("FTP 归档任务异常退出")?
    }

    async fn store(&self, local_path: &Path, remote_dir: &str) -> Result<()> {
        let server = self.clone();
        let local_path = local_path.to_path_buf();
        let remote_dir = remote_dir.to_string();
        tokio::task::spawn_blocking(move || server.store_blocking(&local_path, &remote_dir))
            .await
            .context("FTP 上传任务异常退出")?
    }
}
