//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 本层负责一次运行的整体调度，是整个系统的"指挥中心"。
//!
//! ## 模块划分
//!
//! ### `batch_processor` - 整体运行
//! - 管理应用生命周期（初始化、运行）
//! - 拉取订单、管理浏览器资源、调度报表管道
//!
//! ### `order_runner` - 订单批量上传
//! - 遍历本次运行的所有订单文件
//! - 复用 `OrderFlow`，整理文件，发送失败和汇总通知
//!
//! ### `reports` - 报表管道
//! - 库存文件（HTTP）和物流文件（浏览器）同步到 FTP
//!
//! ## 层次关系
//!
//! ```text
//! batch_processor (一次运行)
//!     ↓
//! order_runner (处理 Vec<订单文件>)
//!     ↓
//! workflow::OrderFlow (处理单个订单)
//!     ↓
//! services (能力层：交互 / 弹窗 / 批次号 / 通知 / FTP)
//!     ↓
//! infrastructure (基础设施：PortalPage)
//! ```
//!
//! ## 设计原则
//!
//! 1. **单一职责**：batch_processor 管整体，order_runner 管订单列表
//! 2. **资源隔离**：只有编排层持有浏览器
//! 3. **向下依赖**：编排层 → workflow → services → infrastructure

pub mod batch_processor;
pub mod order_runner;
pub mod reports;

// 重新导出主要类型
pub use batch_processor::App;
pub use order_runner::{OrderRunner, RunSummary};
