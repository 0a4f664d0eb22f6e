//! 通知服务 - 业务能力层
//!
//! 给运维人员发送纯文本通知，可附带一个文件。发送失败只记录日志，不向调用方报错。

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::{Attachment, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::{debug, error, info};

use crate::config::Config;

/// 一条通知
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub subject: String,
    pub body: String,
    pub attachment: Option<PathBuf>,
}

impl Notification {
    pub fn new(subject: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            body: body.into(),
            attachment: None,
        }
    }

    pub fn with_attachment(mut self, path: impl Into<PathBuf>) -> Self {
        self.attachment = Some(path.into());
        self
    }
}

/// 通知渠道
#[async_trait]
pub trait Notifier: Send + Sync {
    /// 发送通知；失败只记录日志
    async fn notify(&self, notification: Notification);
}

/// 按配置选择通知渠道：配置了邮箱就发邮件，否则只写日志
pub fn notifier_from_config(config: &Config) -> Box<dyn Notifier> {
    if config.email_enabled() {
        Box::new(EmailNotifier::new(config))
    } else {
        info!("未配置邮件账号，通知只写入日志");
        Box::new(LogNotifier)
    }
}

/// SMTP 邮件通知
pub struct EmailNotifier {
    smtp_host: String,
    smtp_port: u16,
    sender: String,
    password: String,
    receiver: String,
}

impl EmailNotifier {
    pub fn new(config: &Config) -> Self {
        Self {
            smtp_host: config.smtp_host.clone(),
            smtp_port: config.smtp_port,
            sender: config.sender_email.clone(),
            password: config.email_password.clone(),
            receiver: config.receiver_email.clone(),
        }
    }

    /// 构建邮件
    pub(crate) async fn build_message(&self, notification: &Notification) -> Result<Message> {
        let mut body = MultiPart::mixed().singlepart(SinglePart::plain(notification.body.clone()));

        if let Some(path) = &notification.attachment {
            body = body.singlepart(attachment_part(path).await?);
        }

        let message = Message::builder()
            .from(self.sender.parse().context("发件人地址无效")?)
            .to(self.receiver.parse().context("收件人地址无效")?)
            .subject(notification.subject.as_str())
            .multipart(body)
            .context("构建邮件失败")?;

        Ok(message)
    }

    async fn send(&self, notification: &Notification) -> Result<()> {
        let message = self.build_message(notification).await?;

        let mailer = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&self.smtp_host)
            .with_context(|| format!("无法连接邮件服务器: {}", self.smtp_host))?
            .port(self.smtp_port)
            .credentials(Credentials::new(
                self.sender.clone(),
                self.password.clone(),
            ))
            .build();

        mailer.send(message).await.context("发送邮件失败")?;
        Ok(())
    }
}

#[async_trait]
impl Notifier for EmailNotifier {
    async fn notify(&self, notification: Notification) {
        debug!("发送邮件: {}", notification.subject);
        match self.send(&notification).await {
            Ok(()) => info!("📧 邮件已发送: {}", notification.subject),
            Err(e) => error!("❌ 邮件发送失败 ({}): {:#}", notification.subject, e),
        }
    }
}

async fn attachment_part(path: &Path) -> Result<SinglePart> {
    let content = tokio::fs::read(path)
        .await
        .with_context(|| format!("无法读取附件: {}", path.display()))?;
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "attachment".to_string());
    let content_type = ContentType::parse(content_type_for(path))
        .map_err(|e| anyhow::anyhow!("附件类型无效: {:?}", e))?;
    Ok(Attachment::new(file_name).body(content, content_type))
}

fn content_type_for(path: &Path) -> &'static str {
    match path.extension().and_then(|e| e.to_str()) {
        Some("png") => "image/png",
        Some("csv") => "text/csv",
        _ => "application/octet-stream",
    }
}

/// 只写日志的通知渠道
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, notification: Notification) {
        info!(
            "📢 通知: {} | {}{}",
            notification.subject,
            notification.body,
            notification
                .attachment
                .as_ref()
                .map(|p| format!(" | 附件: {}", p.display()))
                .unwrap_or_default()
        );
    }
}
