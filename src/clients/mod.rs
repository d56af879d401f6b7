//! 外部服务客户端
//!
//! - `compiler_client`：远程编译/测试服务
//! - `llm_client`：OpenAI 兼容的对话服务
//!
//! 上层只依赖 `CodeRunner` / `ChatBackend` 两个 trait，测试中可以替换成假实现。

pub mod compiler_client;
pub mod llm_client;

pub use compiler_client::{CaseResult, CodeRunner, CompileOutcome, CompilerClient};
pub use llm_client::{ChatBackend, LlmClient};
