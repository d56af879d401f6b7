//! # Question Repair
//!
//! 一个用于校验和修复 C 语言编程题库的 Rust 应用程序
//!
//! ## 架构设计
//!
//! 本系统采用分层架构：
//!
//! ### ① 客户端层（Clients）
//! - `clients/` - 封装外部服务，只暴露能力
//! - `CompilerClient` - 远程编译服务，实现 `CodeRunner`
//! - `LlmClient` - OpenAI 兼容对话服务，实现 `ChatBackend`
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 描述"我能做什么"，只处理单个 Question
//! - `missing_fields` - 结构检查
//! - `QuestionValidator` - 编译校验并整理失败项
//! - `RepairService` - 结构补全和正确性修复两种 AI 调用
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 定义"一道题"的完整处理流程
//! - `QuestionCtx` - 上下文封装（单元名 + 题号 + ID）
//! - `QuestionFlow` - 流程编排（结构检查 → 补全 → 编译校验 → 修复）
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/document_processor` - 单个文件处理器，遍历单元树
//! - `orchestrator/batch_processor` - 批量处理器，每个文件一个子进程
//!
//! ## 模块结构

pub mod cli;
pub mod clients;
pub mod config;
pub mod error;

pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use config::Config;
pub use error::{AppError, AppResult};
pub use models::{Document, Question, Unit};
pub use orchestrator::{process_document, process_file, BatchProcessor, DocumentStats};
pub use workflow::{ProcessResult, QuestionCtx, QuestionFlow};
