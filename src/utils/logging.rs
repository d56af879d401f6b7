//! 日志工具模块
//!
//! 提供日志初始化、格式化和输出的辅助函数

use std::io::IsTerminal;

use tracing::info;
use tracing_subscriber::EnvFilter;

/// 初始化 tracing 订阅器
///
/// 默认级别 `info`，可通过 `RUST_LOG` 覆盖。只有 stdout 是终端时才输出颜色，
/// 这样批量运行时捕获到报告里的子进程输出不含转义序列。
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(std::io::stdout().is_terminal())
        .with_target(false)
        .try_init();
}

/// 当前本地时间，用于日志和报告
pub fn timestamp() -> String {
    chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string()
}

/// 输出分隔线包围的标题
pub fn log_banner(title: &str) {
    info!("{}", "=".repeat(60));
    info!("{}", title);
    info!("{}", "=".repeat(60));
}

/// 截断长文本用于日志显示
///
/// 超过 `max_len` 个字符时保留前 `max_len - 3` 个字符并追加 `...`，
/// 结果总长不超过 `max_len`。
pub fn preview(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len.saturating_sub(3)).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}

/// 把换行符显示为 `\n`，保证一条日志只占一行
pub fn escape_newlines(text: &str) -> String {
    text.replace('\n', "\\n")
}
