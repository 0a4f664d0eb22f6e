//! 基础设施层：持有浏览器页面，只暴露页面操作能力

pub mod chromium_page;
pub mod page_driver;

pub use chromium_page::ChromiumPage;
pub use page_driver::PortalPage;
