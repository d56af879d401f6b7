//! 题目处理流程 - 流程层
//!
//! 核心职责：定义"一道题"的完整处理流程
//!
//! 流程顺序：
//! 1. 结构检查 → 缺字段时 AI 补全
//! 2. 编译校验（使用可能已补全的记录）→ 未通过时 AI 修复
//!
//! 每一步失败都只记录日志，记录保持原样，继续下一步。

use std::sync::Arc;

use tracing::{error, info, warn};

use crate::clients::{ChatBackend, CodeRunner, CompilerClient, LlmClient};
use crate::config::Config;
use crate::error::AppResult;
use crate::models::question::Question;
use crate::services::{missing_fields, QuestionValidator, RepairService, Validation};
use crate::workflow::question_ctx::QuestionCtx;

/// 单个阶段的处理结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageResult {
    /// 检查通过，无需修复
    Clean,
    /// 检查未通过，AI 修复已应用
    Fixed,
    /// 检查未通过，AI 修复失败，记录保持原样
    FailedToFix,
}

/// 一道题目的处理结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcessResult {
    pub structure: StageResult,
    pub correctness: StageResult,
}

impl ProcessResult {
    /// 本题成功应用的修复次数（0-2）
    pub fn fixes(&self) -> usize {
        [self.structure, self.correctness]
            .iter()
            .filter(|stage| **stage == StageResult::Fixed)
            .count()
    }

    /// 是否仍有未能修复的问题
    pub fn is_unresolved(&self) -> bool {
        self.structure == StageResult::FailedToFix || self.correctness == StageResult::FailedToFix
    }
}

/// 题目处理流程
///
/// - 编排结构检查、编译校验和两种 AI 修复
/// - 只依赖业务能力（services）
/// - 不关心单元树和文件
pub struct QuestionFlow {
    validator: QuestionValidator,
    repair: RepairService,
    required_fields: Vec<String>,
}

impl QuestionFlow {
    /// 使用真实的编译服务和 LLM 服务创建流程
    pub fn new(config: &Config) -> AppResult<Self> {
        let runner = Arc::new(CompilerClient::new(config)?);
        let chat = Arc::new(LlmClient::new(config)?);
        Ok(Self::with_backends(config, runner, chat))
    }

    /// 使用指定的后端创建流程
    pub fn with_backends(
        config: &Config,
        runner: Arc<dyn CodeRunner>,
        chat: Arc<dyn ChatBackend>,
    ) -> Self {
        Self {
            validator: QuestionValidator::new(runner, config.compiler_timeout_ms),
            repair: RepairService::new(chat, config),
            required_fields: config.required_fields.clone(),
        }
    }

    /// 处理一道题目，修复结果直接写回 `question`
    pub async fn run(&self, question: &mut Question, ctx: &QuestionCtx) -> ProcessResult {
        info!("  {} 开始校验...", ctx);

        let structure = self.check_structure(question, ctx).await;
        let correctness = self.check_correctness(question, ctx).await;

        ProcessResult {
            structure,
            correctness,
        }
    }

    async fn check_structure(&self, question: &mut Question, ctx: &QuestionCtx) -> StageResult {
        let missing = missing_fields(question, &self.required_fields);
        if missing.is_empty() {
            return StageResult::Clean;
        }

        warn!(
            "    {} [MISSING FIELDS] 缺少字段: {}，调用 AI 补全...",
            ctx,
            missing.join(", ")
        );

        match self.repair.repair_structure(question, &missing).await {
            Ok(patch) => {
                question.apply(patch);
                info!("    {} [STRUCTURE UPDATED] ✓ 缺失字段已补全", ctx);
                StageResult::Fixed
            }
            Err(e) => {
                error!("    {} [ERROR] ❌ 缺失字段补全失败: {}", ctx, e);
                StageResult::FailedToFix
            }
        }
    }

    async fn check_correctness(&self, question: &mut Question, ctx: &QuestionCtx) -> StageResult {
        let failures = match self.validator.check(question).await {
            Validation::Passed => {
                info!("    {} [PASSED] ✓ 校验通过", ctx);
                return StageResult::Clean;
            }
            Validation::Failed(failures) => failures,
        };

        warn!(
            "    {} [FAILED] {} 个失败项，调用 AI 修复...",
            ctx,
            failures.len()
        );

        match self.repair.repair_correctness(question, &failures).await {
            Ok(patch) => {
                question.apply(patch);
                info!("    {} [FIXED] ✓ 题目已更新", ctx);
                StageResult::Fixed
            }
            Err(e) => {
                error!("    {} [ERROR] ❌ 题目修复失败: {}", ctx, e);
                StageResult::FailedToFix
            }
        }
    }
}
