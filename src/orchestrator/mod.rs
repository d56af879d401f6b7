//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 本层负责文件级别和批量级别的调度，是整个系统的"指挥中心"。
//!
//! ## 模块划分
//!
//! ### `batch_processor` - 批量文件处理器
//! - 按配置顺序为每个文件启动一个 `validate` 子进程
//! - 收集子进程输出和退出码
//! - 写出 markdown 报告
//!
//! ### `document_processor` - 单个文件处理器
//! - 读取 JSON 单元树
//! - 深度优先遍历所有题目，复用同一个 QuestionFlow
//! - 写回修复后的文档
//! - 输出单个文件的统计信息
//!
//! ## 层次关系
//!
//! ```text
//! batch_processor (每个文件一个子进程)
//!     ↓
//! document_processor (处理单元树中的 Vec<Question>)
//!     ↓
//! workflow::QuestionFlow (处理单个 Question)
//!     ↓
//! services (能力层：structure / validator / repair)
//!     ↓
//! clients (编译服务、LLM 服务)
//! ```

pub mod batch_processor;
pub mod document_processor;

// 重新导出主要类型
pub use batch_processor::{BatchProcessor, BatchReport, ChildRun};
pub use document_processor::{process_document, process_file, DocumentStats};
