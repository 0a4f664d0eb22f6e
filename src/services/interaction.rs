//! 页面交互原语 - 业务能力层
//!
//! 在 [`PortalPage`] 的单次操作之上提供有时限的等待、可选弹窗探测，
//! 以及被遮挡时自动改用脚本点击的点击操作。

use std::future::Future;
use std::time::Duration;

use tokio::time::{sleep, timeout, Instant};
use tracing::{debug, warn};

use crate::config::Config;
use crate::error::{DriverError, DriverResult, PortalError, PortalResult};
use crate::infrastructure::PortalPage;
use crate::models::layout::Locator;

/// 等待时长配置
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitBudget {
    /// 可选弹窗的探测时长
    pub short: Duration,
    /// 必需控件与确认信息的等待时长
    pub long: Duration,
    /// 轮询间隔
    pub poll_interval: Duration,
    /// 单次原生点击的最长时间
    pub click_timeout: Duration,
}

impl WaitBudget {
    pub fn from_config(config: &Config) -> Self {
        Self {
            short: config.short_wait(),
            long: config.long_wait(),
            ..Self::default()
        }
    }
}

impl Default for WaitBudget {
    fn default() -> Self {
        Self {
            short: Duration::from_secs(5),
            long: Duration::from_secs(30),
            poll_interval: Duration::from_millis(250),
            click_timeout: Duration::from_secs(10),
        }
    }
}

/// 可选元素的探测结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Probe<E> {
    Present(E),
    Absent,
}

/// 点击方式，按顺序尝试
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickStrategy {
    /// 原生鼠标点击
    Native,
    /// 脚本 `element.click()`
    Scripted,
}

pub const CLICK_STRATEGIES: [ClickStrategy; 2] = [ClickStrategy::Native, ClickStrategy::Scripted];

/// 页面交互能力
///
/// 职责：
/// - 把"等到某个元素就绪"变成有上限的轮询
/// - 不认识订单，不关心流程顺序
pub struct PageActions<'a, P: PortalPage> {
    page: &'a P,
    waits: WaitBudget,
}

impl<'a, P: PortalPage> PageActions<'a, P> {
    pub fn new(page: &'a P, waits: WaitBudget) -> Self {
        Self { page, waits }
    }

    pub fn page(&self) -> &'a P {
        self.page
    }

    pub fn waits(&self) -> &WaitBudget {
        &self.waits
    }

    /// 等待元素出现在 DOM 中（不要求可见）
    pub async fn await_present(
        &self,
        locator: &Locator,
        wait: Duration,
    ) -> PortalResult<P::Element> {
        let page = self.page;
        self.poll(wait, || find_present(page, locator))
            .await?
            .ok_or_else(|| not_ready(locator, wait))
    }

    /// 等待元素可见
    pub async fn await_visible(
        &self,
        locator: &Locator,
        wait: Duration,
    ) -> PortalResult<P::Element> {
        let page = self.page;
        self.poll(wait, || find_visible(page, locator))
            .await?
            .ok_or_else(|| not_ready(locator, wait))
    }

    /// 等待元素可见且可点击
    pub async fn await_clickable(
        &self,
        locator: &Locator,
        wait: Duration,
    ) -> PortalResult<P::Element> {
        let page = self.page;
        self.poll(wait, || find_clickable(page, locator))
            .await?
            .ok_or_else(|| not_ready(locator, wait))
    }

    /// 等待已找到的元素变为可用
    pub async fn await_enabled(
        &self,
        element: &P::Element,
        locator: &Locator,
        wait: Duration,
    ) -> PortalResult<()> {
        let page = self.page;
        self.poll(wait, || check_enabled(page, element))
            .await?
            .ok_or_else(|| not_ready(locator, wait))
    }

    /// 等待元素消失（不存在或不可见都算）
    pub async fn await_gone(&self, locator: &Locator, wait: Duration) -> PortalResult<()> {
        let page = self.page;
        self.poll(wait, || check_gone(page, locator))
            .await?
            .ok_or_else(|| not_ready(locator, wait))
    }

    /// 在时限内探测可选元素，没出现不算错误
    pub async fn probe(&self, locator: &Locator, wait: Duration) -> DriverResult<Probe<P::Element>> {
        let page = self.page;
        let found = self.poll(wait, || find_visible(page, locator)).await?;
        Ok(match found {
            Some(element) => Probe::Present(element),
            None => Probe::Absent,
        })
    }

    /// 等待页面正文出现指定文字
    pub async fn await_text_in_body(&self, text: &str, wait: Duration) -> PortalResult<()> {
        let page = self.page;
        self.poll(wait, || check_body_contains(page, text))
            .await?
            .ok_or_else(|| PortalError::TextNotFound {
                text: text.to_string(),
                waited: wait,
            })
    }

    /// 点击元素
    ///
    /// 依次尝试 [`CLICK_STRATEGIES`]；只有点击被遮挡或原生点击超时才换下一种方式，
    /// 其他错误直接返回。
    pub async fn click(&self, element: &P::Element, label: &str) -> PortalResult<()> {
        let mut last_error = None;

        for strategy in CLICK_STRATEGIES {
            let outcome = match strategy {
                ClickStrategy::Native => {
                    match timeout(self.waits.click_timeout, self.page.native_click(element)).await {
                        Ok(result) => result,
                        Err(_) => Err(DriverError::ClickIntercepted(format!(
                            "原生点击超过 {:?} 未完成",
                            self.waits.click_timeout
                        ))),
                    }
                }
                ClickStrategy::Scripted => self.page.scripted_click(element).await,
            };

            match outcome {
                Ok(()) => {
                    if strategy == ClickStrategy::Native {
                        debug!("已点击: {}", label);
                    } else {
                        warn!("⚠️ 已通过脚本点击: {}", label);
                    }
                    return Ok(());
                }
                Err(DriverError::ClickIntercepted(reason)) => {
                    warn!("⚠️ 无法正常点击 {}: {}，尝试下一种点击方式", label, reason);
                    last_error = Some(DriverError::ClickIntercepted(reason));
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(last_error
            .unwrap_or_else(|| DriverError::Script(format!("没有可用的点击方式: {}", label)))
            .into())
    }

    /// 等待元素可点击后点击
    pub async fn click_when_ready(
        &self,
        locator: &Locator,
        wait: Duration,
        label: &str,
    ) -> PortalResult<()> {
        let element = self.await_clickable(locator, wait).await?;
        self.click(&element, label).await
    }

    /// 按固定间隔检查，直到有结果或超时
    async fn poll<T, F, Fut>(&self, wait: Duration, mut check: F) -> DriverResult<Option<T>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = DriverResult<Option<T>>>,
    {
        let deadline = Instant::now() + wait;
        loop {
            if let Some(found) = check().await? {
                return Ok(Some(found));
            }
            let now = Instant::now();
            if now >= deadline {
                return Ok(None);
            }
            sleep(self.waits.poll_interval.min(deadline - now)).await;
        }
    }
}

fn not_ready(locator: &Locator, waited: Duration) -> PortalError {
    PortalError::ElementNotReady {
        locator: locator.clone(),
        waited,
    }
}

async fn find_present<P: PortalPage>(page: &P, locator: &Locator) -> DriverResult<Option<P::Element>> {
    page.find(locator).await
}

async fn find_visible<P: PortalPage>(page: &P, locator: &Locator) -> DriverResult<Option<P::Element>> {
    let Some(element) = page.find(locator).await? else {
        return Ok(None);
    };
    if page.is_displayed(&element).await? {
        Ok(Some(element))
    } else {
        Ok(None)
    }
}

async fn find_clickable<P: PortalPage>(
    page: &P,
    locator: &Locator,
) -> DriverResult<Option<P::Element>> {
    let Some(element) = find_visible(page, locator).await? else {
        return Ok(None);
    };
    if page.is_enabled(&element).await? {
        Ok(Some(element))
    } else {
        Ok(None)
    }
}

async fn check_enabled<P: PortalPage>(page: &P, element: &P::Element) -> DriverResult<Option<()>> {
    Ok(page.is_enabled(element).await?.then_some(()))
}

async fn check_gone<P: PortalPage>(page: &P, locator: &Locator) -> DriverResult<Option<()>> {
    Ok(find_visible(page, locator).await?.is_none().then_some(()))
}

async fn check_body_contains<P: PortalPage>(page: &P, text: &str) -> DriverResult<Option<()>> {
    Ok(page.body_text().await?.contains(text).then_some(()))
}
