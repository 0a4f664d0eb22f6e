//! 测试用的假页面和通知渠道
//!
//! `FakePage` 按规则决定元素是否存在，并记录所有操作，
//! 用来验证流程顺序、重试次数和弹窗处理。

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::error::{DriverError, DriverResult};
use crate::infrastructure::PortalPage;
use crate::models::layout::{Locator, PortalLayout};
use crate::services::file_server::FileServer;
use crate::services::notifier::{Notification, Notifier};

/// 规则判断时看到的页面状态（每次导航后重置）
pub(crate) struct PageView<'a> {
    pub attached: Option<&'a Path>,
    pub clicked: &'a [Locator],
}

pub(crate) type Rule = Box<dyn Fn(&PageView<'_>) -> bool + Send + Sync>;

pub(crate) fn always() -> Rule {
    Box::new(|_| true)
}

/// 已点击过某个元素
pub(crate) fn clicked(locator: &Locator) -> Rule {
    let locator = locator.clone();
    Box::new(move |view| view.clicked.contains(&locator))
}

/// 已选择文件
pub(crate) fn attached() -> Rule {
    Box::new(|view| view.attached.is_some())
}

/// 已选择文件，且文件名不是 `name`
pub(crate) fn attached_except(name: &str) -> Rule {
    let name = name.to_string();
    Box::new(move |view| {
        view.attached
            .and_then(|p| p.file_name())
            .map(|n| n.to_string_lossy() != name.as_str())
            .unwrap_or(false)
    })
}

/// 页面操作记录
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Action {
    Goto(String),
    Attach(Locator, PathBuf),
    Type(Locator, String),
    NativeClick(Locator),
    ScriptedClick(Locator),
    Scroll(Locator),
    Screenshot(PathBuf),
    AllowDownloads(PathBuf),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct FakeElement(pub Locator);

struct ElementSpec {
    locator: Locator,
    text: String,
    rule: Rule,
}

#[derive(Default)]
struct FakeState {
    attached: Option<PathBuf>,
    clicked: Vec<Locator>,
    actions: Vec<Action>,
}

pub(crate) struct FakePage {
    elements: Vec<ElementSpec>,
    obstructed: HashSet<Locator>,
    body: Option<(String, Rule)>,
    screenshot_fails: bool,
    state: Mutex<FakeState>,
}

impl FakePage {
    pub fn new() -> Self {
        Self {
            elements: Vec::new(),
            obstructed: HashSet::new(),
            body: None,
            screenshot_fails: false,
            state: Mutex::new(FakeState::default()),
        }
    }

    /// 一直存在的元素
    pub fn with_element(self, locator: Locator, text: &str) -> Self {
        self.with_element_when(locator, text, always())
    }

    /// 满足规则时才存在的元素
    pub fn with_element_when(mut self, locator: Locator, text: &str, rule: Rule) -> Self {
        self.elements.push(ElementSpec {
            locator,
            text: text.to_string(),
            rule,
        });
        self
    }

    /// 原生点击会被遮挡的元素
    pub fn obstructed(mut self, locator: Locator) -> Self {
        self.obstructed.insert(locator);
        self
    }

    pub fn with_body(self, text: &str) -> Self {
        self.with_body_when(text, always())
    }

    pub fn with_body_when(mut self, text: &str, rule: Rule) -> Self {
        self.body = Some((text.to_string(), rule));
        self
    }

    pub fn failing_screenshots(mut self) -> Self {
        self.screenshot_fails = true;
        self
    }

    /// 正常下单的门户：选文件 → 上传 → 提交 → 出现确认信息
    pub fn order_portal(layout: &PortalLayout, confirmation: &str) -> Self {
        Self::new()
            .with_element(layout.file_input.clone(), "")
            .with_element_when(layout.upload_button.clone(), "Upload", attached())
            .with_element_when(
                layout.submit_order_button.clone(),
                "Submit Order",
                clicked(&layout.upload_button),
            )
            .with_element_when(
                layout.confirmation.clone(),
                confirmation,
                clicked(&layout.submit_order_button),
            )
    }

    pub fn actions(&self) -> Vec<Action> {
        self.lock().actions.clone()
    }

    pub fn goto_count(&self) -> usize {
        self.lock()
            .actions
            .iter()
            .filter(|a| matches!(a, Action::Goto(_)))
            .count()
    }

    pub fn screenshots(&self) -> Vec<PathBuf> {
        self.lock()
            .actions
            .iter()
            .filter_map(|a| match a {
                Action::Screenshot(p) => Some(p.clone()),
                _ => None,
            })
            .collect()
    }

    /// 某个元素被点击（任意方式）的位置
    pub fn click_position(&self, locator: &Locator) -> Option<usize> {
        self.lock().actions.iter().position(|a| match a {
            Action::NativeClick(l) | Action::ScriptedClick(l) => l == locator,
            _ => false,
        })
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, FakeState> {
        self.state.lock().unwrap()
    }

    fn record(&self, action: Action) {
        self.lock().actions.push(action);
    }

    fn spec_for(&self, locator: &Locator) -> Option<&ElementSpec> {
        let state = self.lock();
        let view = PageView {
            attached: state.attached.as_deref(),
            clicked: &state.clicked,
        };
        self.elements
            .iter()
            .find(|spec| spec.locator == *locator && (spec.rule)(&view))
    }

    fn mark_clicked(&self, locator: &Locator) {
        self.lock().clicked.push(locator.clone());
    }
}

#[async_trait]
impl PortalPage for FakePage {
    type Element = FakeElement;

    async fn goto(&self, url: &str) -> DriverResult<()> {
        let mut state = self.lock();
        state.attached = None;
        state.clicked.clear();
        state.actions.push(Action::Goto(url.to_string()));
        Ok(())
    }

    async fn find(&self, locator: &Locator) -> DriverResult<Option<FakeElement>> {
        Ok(self
            .spec_for(locator)
            .map(|spec| FakeElement(spec.locator.clone())))
    }

    async fn is_displayed(&self, element: &FakeElement) -> DriverResult<bool> {
        Ok(self.spec_for(&element.0).is_some())
    }

    async fn is_enabled(&self, _element: &FakeElement) -> DriverResult<bool> {
        Ok(true)
    }

    async fn attach_file(&self, element: &FakeElement, path: &Path) -> DriverResult<()> {
        let mut state = self.lock();
        state.attached = Some(path.to_path_buf());
        state
            .actions
            .push(Action::Attach(element.0.clone(), path.to_path_buf()));
        Ok(())
    }

    async fn type_text(&self, element: &FakeElement, text: &str) -> DriverResult<()> {
        self.record(Action::Type(element.0.clone(), text.to_string()));
        Ok(())
    }

    async fn native_click(&self, element: &FakeElement) -> DriverResult<()> {
        self.record(Action::NativeClick(element.0.clone()));
        if self.obstructed.contains(&element.0) {
            return Err(DriverError::ClickIntercepted(format!("{} 被遮罩覆盖", element.0)));
        }
        self.mark_clicked(&element.0);
        Ok(())
    }

    async fn scripted_click(&self, element: &FakeElement) -> DriverResult<()> {
        self.record(Action::ScriptedClick(element.0.clone()));
        self.mark_clicked(&element.0);
        Ok(())
    }

    async fn scroll_into_view(&self, element: &FakeElement) -> DriverResult<()> {
        self.record(Action::Scroll(element.0.clone()));
        Ok(())
    }

    async fn text(&self, element: &FakeElement) -> DriverResult<String> {
        Ok(self
            .spec_for(&element.0)
            .map(|spec| spec.text.clone())
            .unwrap_or_default())
    }

    async fn body_text(&self) -> DriverResult<String> {
        let state = self.lock();
        let view = PageView {
            attached: state.attached.as_deref(),
            clicked: &state.clicked,
        };
        Ok(match &self.body {
            Some((text, rule)) if rule(&view) => text.clone(),
            _ => String::new(),
        })
    }

    async fn save_screenshot(&self, path: &Path) -> DriverResult<()> {
        if self.screenshot_fails {
            return Err(DriverError::Script("截图失败".to_string()));
        }
        std::fs::write(path, b"\x89PNG")?;
        self.record(Action::Screenshot(path.to_path_buf()));
        Ok(())
    }

    async fn allow_downloads(&self, dir: &Path) -> DriverResult<()> {
        self.record(Action::AllowDownloads(dir.to_path_buf()));
        Ok(())
    }
}

/// 记录所有通知的通知渠道，克隆后共享同一份记录
#[derive(Default, Clone)]
pub(crate) struct RecordingNotifier {
    sent: Arc<Mutex<Vec<Notification>>>,
}

impl RecordingNotifier {
    pub fn sent(&self) -> Vec<Notification> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, notification: Notification) {
        self.sent.lock().unwrap().push(notification);
    }
}

#[derive(Default)]
struct ServerLog {
    archived: Vec<String>,
    stored: Vec<(PathBuf, String)>,
}

/// 记录归档和上传请求的文件服务器，`fetch_orders` 返回预设文件名
#[derive(Default, Clone)]
pub(crate) struct RecordingFileServer {
    orders: Vec<String>,
    archive_fails: bool,
    log: Arc<Mutex<ServerLog>>,
}

impl RecordingFileServer {
    pub fn with_orders(orders: &[&str]) -> Self {
        Self {
            orders: orders.iter().map(|s| s.to_string()).collect(),
            ..Self::default()
        }
    }

    pub fn failing_archive(mut self) -> Self {
        self.archive_fails = true;
        self
    }

    pub fn archived(&self) -> Vec<String> {
        self.log.lock().unwrap().archived.clone()
    }

    pub fn stored(&self) -> Vec<(PathBuf, String)> {
        self.log.lock().unwrap().stored.clone()
    }
}

#[async_trait]
impl FileServer for RecordingFileServer {
    async fn fetch_orders(&self, local_dir: &Path) -> anyhow::Result<Vec<String>> {
        std::fs::create_dir_all(local_dir)?;
        for name in &self.orders {
            std::fs::write(local_dir.join(name), "sku,qty\n")?;
        }
        Ok(self.orders.clone())
    }

    async fn archive_orders(&self, names: &[String]) -> anyhow::Result<()> {
        if self.archive_fails {
            anyhow::bail!("归档失败: {}", names.join(", "));
        }
        self.log.lock().unwrap().archived.extend_from_slice(names);
        Ok(())
    }

    async fn store(&self, local_path: &Path, remote_dir: &str) -> anyhow::Result<()> {
        self.log
            .lock()
            .unwrap()
            .stored
            .push((local_path.to_path_buf(), remote_dir.to_string()));
        Ok(())
    }
}
