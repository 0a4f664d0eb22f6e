//! 批次号提取
//!
//! 从下单成功提示中取出 `#` 后面的数字，例如 "Order placed, Batch #4521" → "4521"。

use std::sync::OnceLock;

use regex::Regex;

use crate::models::order::BatchId;

fn batch_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"#(\d+)").expect("批次号正则无效"))
}

/// 提取第一个批次号，没有时返回 None
pub fn extract_batch_id(confirmation_text: &str) -> Option<BatchId> {
    batch_pattern()
        .captures(confirmation_text)
        .and_then(|caps| caps.get(1))
        .map(|m| BatchId::new(m.as_str()))
}
