//! 登录流程 - 流程层
//!
//! 打开登录页 → 关闭会话过期提示（如果有）→ 输入账号密码 → 等待欢迎语

use tracing::{error, info};

use crate::error::PortalResult;
use crate::infrastructure::PortalPage;
use crate::services::interaction::{PageActions, Probe};
use crate::workflow::run_ctx::RunCtx;

/// 门户账号
#[derive(Debug, Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

pub struct LoginFlow<'a, P: PortalPage> {
    actions: PageActions<'a, P>,
    ctx: &'a RunCtx,
}

impl<'a, P: PortalPage> LoginFlow<'a, P> {
    pub fn new(page: &'a P, ctx: &'a RunCtx) -> Self {
        Self {
            actions: PageActions::new(page, ctx.waits),
            ctx,
        }
    }

    /// 登录门户，失败时返回 false，调用方应停止所有浏览器操作
    pub async fn login(&self, credentials: &Credentials) -> bool {
        info!("🔐 正在登录门户: {}", self.ctx.login_url);

        match self
            .ctx
            .retry
            .run("[登录]", move |_| self.attempt(credentials))
            .await
        {
            Ok(done) => {
                info!("✅ 登录成功 (第 {} 次尝试)", done.attempts);
                true
            }
            Err(e) => {
                error!("❌ 登录失败 (共尝试 {} 次): {}", e.attempts, e.error);
                false
            }
        }
    }

    async fn attempt(&self, credentials: &Credentials) -> PortalResult<()> {
        let layout = &self.ctx.layout;
        let waits = self.ctx.waits;
        let page = self.actions.page();

        page.goto(&self.ctx.login_url).await?;

        match self.actions.probe(&layout.session_expired_ok, waits.short).await? {
            Probe::Present(ok) => {
                info!("检测到会话过期提示，点击确认");
                self.actions.click(&ok, "会话过期确认").await?;
            }
            Probe::Absent => info!("未出现会话过期提示"),
        }

        let username = self
            .actions
            .await_present(&layout.username_field, waits.long)
            .await?;
        let password = self
            .actions
            .await_present(&layout.password_field, waits.long)
            .await?;
        page.type_text(&username, &credentials.username).await?;
        page.type_text(&password, &credentials.password).await?;

        self.actions
            .click_when_ready(&layout.login_button, waits.short, "登录按钮")
            .await?;

        self.actions
            .await_text_in_body(&self.ctx.welcome_marker, waits.long)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::layout::PortalLayout;
    use crate::testing::{clicked, Action, FakePage};

    fn credentials() -> Credentials {
        Credentials {
            username: "buyer@example.com".to_string(),
            password: "hunter2".to_string(),
        }
    }

    fn login_page(layout: &PortalLayout) -> FakePage {
        FakePage::new()
            .with_element(layout.username_field.clone(), "")
            .with_element(layout.password_field.clone(), "")
            .with_element(layout.login_button.clone(), "Login")
            .with_body_when("Welcome, Gabrielle", clicked(&layout.login_button))
    }

    #[tokio::test(start_paused = true)]
    async fn test_login_success_types_credentials() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = RunCtx::for_tests(dir.path());
        let page = login_page(&ctx.layout);

        assert!(LoginFlow::new(&page, &ctx).login(&credentials()).await);

        let actions = page.actions();
        assert_eq!(actions[0], Action::Goto(ctx.login_url.clone()));
        assert!(actions.contains(&Action::Type(
            ctx.layout.username_field.clone(),
            "buyer@example.com".to_string()
        )));
        assert!(actions.contains(&Action::Type(
            ctx.layout.password_field.clone(),
            "hunter2".to_string()
        )));
        assert_eq!(page.goto_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_session_prompt_is_dismissed() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = RunCtx::for_tests(dir.path());
        let page = login_page(&ctx.layout).with_element(ctx.layout.session_expired_ok.clone(), "OK");

        assert!(LoginFlow::new(&page, &ctx).login(&credentials()).await);
        assert!(page
            .actions()
            .contains(&Action::NativeClick(ctx.layout.session_expired_ok.clone())));
    }

    #[tokio::test(start_paused = true)]
    async fn test_missing_welcome_marker_fails_after_retries() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = RunCtx::for_tests(dir.path());
        let page = login_page(&ctx.layout).with_body("Invalid username or password");

        assert!(!LoginFlow::new(&page, &ctx).login(&credentials()).await);
        assert_eq!(page.goto_count(), 3);
    }
}
