//! 订单处理上下文
//!
//! 封装"我正在处理本次运行的第几个订单"这一信息

use std::fmt::Display;

/// 订单处理上下文
#[derive(Debug, Clone)]
pub struct OrderCtx {
    /// 订单在本次运行中的序号（从1开始）
    pub index: usize,

    /// 本次运行的订单总数
    pub total: usize,

    /// 订单文件名
    pub file_name: String,
}

impl OrderCtx {
    pub fn new(index: usize, total: usize, file_name: impl Into<String>) -> Self {
        Self {
            index,
            total,
            file_name: file_name.into(),
        }
    }
}

impl Display for OrderCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[订单 {}/{} {}]", self.index, self.total, self.file_name)
    }
}
