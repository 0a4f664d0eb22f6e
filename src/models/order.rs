//! 订单相关数据结构

use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::PortalError;

/// 待上传的订单文件
///
/// 只能通过 [`OrderFile::locate`] 创建，保证路径在使用前确认过是普通文件。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderFile {
    path: PathBuf,
    file_name: String,
}

impl OrderFile {
    /// 校验路径并创建订单文件
    pub fn locate(path: impl AsRef<Path>) -> Result<Self, PortalError> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(PortalError::MissingPrecondition {
                path: path.to_path_buf(),
            });
        }

        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.display().to_string());

        Ok(Self {
            path: path.to_path_buf(),
            file_name,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// 绝对路径（文件选择框需要）
    pub fn absolute_path(&self) -> PathBuf {
        std::fs::canonicalize(&self.path).unwrap_or_else(|_| self.path.clone())
    }
}

/// 门户返回的批次号
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BatchId(String);

impl BatchId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// 单次提交尝试所处的阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptState {
    NavigatingToUploadPage,
    AwaitingUploadWidget,
    FileSelected,
    UploadSubmitted,
    OverridesChecked,
    OrderSubmitted,
    AwaitingConfirmation,
    Succeeded,
    Failed,
}

impl AttemptState {
    /// 终态之后不再有操作
    pub fn is_terminal(&self) -> bool {
        matches!(self, AttemptState::Succeeded | AttemptState::Failed)
    }
}

impl fmt::Display for AttemptState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AttemptState::NavigatingToUploadPage => "打开上传页",
            AttemptState::AwaitingUploadWidget => "等待上传控件",
            AttemptState::FileSelected => "已选择文件",
            AttemptState::UploadSubmitted => "已提交上传",
            AttemptState::OverridesChecked => "已检查弹窗",
            AttemptState::OrderSubmitted => "已提交订单",
            AttemptState::AwaitingConfirmation => "等待确认信息",
            AttemptState::Succeeded => "成功",
            AttemptState::Failed => "失败",
        };
        f.write_str(name)
    }
}

/// 缺货截图
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutOfStockCapture {
    /// 截图失败时为 None，缺货标记仍然有效
    pub screenshot: Option<PathBuf>,
}

/// 一次提交尝试的记录
#[derive(Debug, Clone)]
pub struct AttemptRecord {
    /// 第几次尝试（从 1 开始）
    pub index: u32,
    /// 最后到达的阶段
    pub reached: AttemptState,
    pub out_of_stock: Option<OutOfStockCapture>,
}

impl AttemptRecord {
    pub fn new(index: u32) -> Self {
        Self {
            index,
            reached: AttemptState::NavigatingToUploadPage,
            out_of_stock: None,
        }
    }
}

/// 提交失败原因
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureReason {
    /// 已提交但确认信息没有出现（订单可能已经下了）
    ConfirmationTimeout,
    /// 所有尝试都失败
    AttemptsExhausted { last_error: String },
    /// 不可重试的错误
    Unrecoverable { error: String },
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureReason::ConfirmationTimeout => {
                write!(f, "订单已提交但未出现确认信息，请人工核对门户是否已下单")
            }
            FailureReason::AttemptsExhausted { last_error } => {
                write!(f, "所有尝试均失败，最后一次错误: {}", last_error)
            }
            FailureReason::Unrecoverable { error } => write!(f, "不可恢复的错误: {}", error),
        }
    }
}

/// 单个订单文件的最终结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionResult {
    /// 已读取到确认信息；批次号可能解析不到
    Succeeded { batch_id: Option<BatchId> },
    Failed { reason: FailureReason },
}

impl SubmissionResult {
    pub fn is_success(&self) -> bool {
        matches!(self, SubmissionResult::Succeeded { .. })
    }
}

/// 提交结果及尝试次数
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionReport {
    pub result: SubmissionResult,
    pub attempts: u32,
}
