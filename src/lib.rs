//! # Portal Order Bot
//!
//! 把采购订单逐个上传到没有 API 的供应商门户，并同步库存和物流文件
//!
//! ## 架构设计
//!
//! 本系统采用严格的四层架构：
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 持有稀缺资源（Page），只暴露能力
//! - `PortalPage` - 页面操作接口，`ChromiumPage` 是浏览器实现
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 描述"我能做什么"
//! - `PageActions` - 有时限的等待、可选弹窗探测、被遮挡时改用脚本点击
//! - `OverrideDetector` - 地址校验 / 缺货 / 余额支付弹窗
//! - `extract_batch_id` - 从确认信息中提取批次号
//! - `Notifier` / `FileServer` - 邮件通知与 FTP
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 定义"一个订单"的完整提交流程和登录流程
//! - `OrderCtx` - 上下文封装（订单序号 + 文件名）
//! - `OrderFlow` - 状态机（上传 → 弹窗 → 提交 → 确认），整体重试
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/batch_processor` - 整体运行，管理浏览器
//! - `orchestrator/order_runner` - 订单列表，整理文件和通知
//! - `orchestrator/reports` - 库存和物流文件同步
//!
//! ## 模块结构

pub mod browser;
pub mod config;
pub mod error;
pub mod infrastructure;

pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

#[cfg(test)]
pub(crate) mod testing;

// 重新导出常用类型
pub use browser::{launch_headless_browser, BrowserSession};
pub use config::Config;
pub use error::{ConfigError, DriverError, PortalError, PortalResult};
pub use infrastructure::{ChromiumPage, PortalPage};
pub use models::{BatchId, OrderFile, PortalLayout, SubmissionResult};
pub use orchestrator::{App, OrderRunner, RunSummary};
pub use services::extract_batch_id;
pub use workflow::{Credentials, LoginFlow, OrderCtx, OrderFlow, RunCtx};
