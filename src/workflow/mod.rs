pub mod login_flow;
pub mod order_ctx;
pub mod order_flow;
pub mod retry;
pub mod run_ctx;

pub use login_flow::{Credentials, LoginFlow};
pub use order_ctx::OrderCtx;
pub use order_flow::OrderFlow;
pub use retry::RetryPolicy;
pub use run_ctx::RunCtx;
