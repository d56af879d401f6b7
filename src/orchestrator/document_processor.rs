//! 单个文件处理器 - 编排层
//!
//! ## 职责
//!
//! 本模块负责处理一个题目文件中的所有题目，是文件级别的编排器。
//!
//! ## 核心功能
//!
//! 1. **加载文档**：读取并解析 JSON（失败即终止）
//! 2. **遍历题目**：按深度优先顺序访问单元树，先本单元题目，再子单元
//! 3. **流程调度**：对每道题调用 `QuestionFlow`
//! 4. **写回文件**：以 4 空格缩进输出修改后的文档
//! 5. **统计输出**：记录总题数和修复次数

use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

use crate::models::question::Question;
use crate::models::unit::{Document, Visit};
use crate::models::{load_document, save_document};
use crate::utils::logging::log_banner;
use crate::workflow::{QuestionCtx, QuestionFlow, StageResult};

/// 文件处理统计
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DocumentStats {
    /// 题目总数
    pub total: usize,
    /// 成功应用的修复次数（一道题最多两次）
    pub fixed: usize,
    pub structure_fixed: usize,
    pub correctness_fixed: usize,
    /// 至少有一个阶段修复失败的题目数
    pub unresolved: usize,
}

/// 处理一个题目文件
///
/// # 参数
/// - `flow`: 题目处理流程
/// - `input`: 输入 JSON 文件
/// - `output`: 输出 JSON 文件
///
/// # 返回
/// 读取、解析或写回失败时返回错误；单题修复失败不影响返回值
pub async fn process_file(flow: &QuestionFlow, input: &Path, output: &Path) -> Result<DocumentStats> {
    info!("📁 正在读取题目文件: {}", input.display());
    let mut document = load_document(input)
        .await
        .with_context(|| format!("无法读取输入文件: {}", input.display()))?;

    let stats = process_document(flow, &mut document).await;

    info!("💾 正在保存修复结果到: {}", output.display());
    save_document(output, &document)
        .await
        .with_context(|| format!("无法写入输出文件: {}", output.display()))?;

    log_file_complete(&stats);

    Ok(stats)
}

/// 按深度优先顺序处理文档中的全部题目，修改直接写回文档
pub async fn process_document(flow: &QuestionFlow, document: &mut Document) -> DocumentStats {
    let mut stats = DocumentStats::default();

    for visit in document.visits() {
        match visit {
            Visit::Unit(path) => {
                if let Some(unit) = document.unit(&path) {
                    info!("📦 正在处理 {}...", unit.display_name());
                }
            }
            Visit::Question(path) => {
                let unit_name = document
                    .unit(&path.unit)
                    .map(|unit| unit.display_name())
                    .unwrap_or_default();

                let Some(slot) = document.question_fields_mut(&path) else {
                    continue;
                };

                stats.total += 1;
                let mut question = Question::new(std::mem::take(slot));
                let ctx = QuestionCtx::new(unit_name, stats.total, question.id_label());
                let result = flow.run(&mut question, &ctx).await;
                *slot = question.into_fields();

                stats.fixed += result.fixes();
                if result.structure == StageResult::Fixed {
                    stats.structure_fixed += 1;
                }
                if result.correctness == StageResult::Fixed {
                    stats.correctness_fixed += 1;
                }
                if result.is_unresolved() {
                    stats.unresolved += 1;
                }
            }
        }
    }

    stats
}

// ========== 日志辅助函数 ==========

fn log_file_complete(stats: &DocumentStats) {
    log_banner("📊 处理完成统计");
    info!("总题数: {}, 修复次数: {}", stats.total, stats.fixed);
    info!(
        "结构补全: {}, 正确性修复: {}, 未解决: {}",
        stats.structure_fixed, stats.correctness_fixed, stats.unresolved
    );
}
