//! 题目校验 - 业务能力层
//!
//! 用题目的 `answer` 跑一遍 `test_cases`，判断参考答案是否正确

use std::sync::Arc;

use tracing::{info, warn};

use crate::clients::{CaseResult, CodeRunner, CompileOutcome};
use crate::models::question::Question;
use crate::utils::logging::{escape_newlines, preview};

/// 失败用例描述
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FailureDetail {
    pub input: Option<String>,
    pub expected: Option<String>,
    pub actual: Option<String>,
    pub error: Option<String>,
}

impl FailureDetail {
    /// 只有错误信息的合成失败项
    pub fn synthetic(error: impl Into<String>) -> Self {
        Self {
            error: Some(error.into()),
            ..Default::default()
        }
    }
}

/// 校验结果
#[derive(Debug, Clone, PartialEq)]
pub enum Validation {
    Passed,
    Failed(Vec<FailureDetail>),
}

impl Validation {
    pub fn is_passed(&self) -> bool {
        matches!(self, Validation::Passed)
    }
}

/// 题目校验服务
pub struct QuestionValidator {
    runner: Arc<dyn CodeRunner>,
    timeout_ms: u64,
}

impl QuestionValidator {
    pub fn new(runner: Arc<dyn CodeRunner>, timeout_ms: u64) -> Self {
        Self { runner, timeout_ms }
    }

    /// 校验一道题目
    pub async fn check(&self, question: &Question) -> Validation {
        let outcome = self
            .runner
            .run_tests(question.answer(), question.test_cases(), self.timeout_ms)
            .await;

        classify(question, outcome)
    }
}

/// 根据编译服务结果判断通过与否
pub fn classify(question: &Question, outcome: CompileOutcome) -> Validation {
    let results = match outcome {
        CompileOutcome::Results(results) => results,
        CompileOutcome::CompilerError(message) => {
            info!("      编译错误: {}", message);
            return Validation::Failed(vec![FailureDetail::synthetic(format!(
                "Compiler Error: {}",
                message
            ))]);
        }
        CompileOutcome::BadFormat => {
            info!("      编译服务响应格式异常");
            return Validation::Failed(vec![FailureDetail::synthetic(
                "Unexpected API response format",
            )]);
        }
        CompileOutcome::RequestFailed(message) => {
            return Validation::Failed(vec![FailureDetail::synthetic(message)]);
        }
    };

    let sent = question.test_cases().len();
    if results.len() != sent {
        warn!(
            "      [WARNING] 测试用例数量不一致! 发送: {}, 返回: {}",
            sent,
            results.len()
        );
    }

    for (index, result) in results.iter().enumerate() {
        log_case_result(question, index, result);
    }

    let failures: Vec<FailureDetail> = results
        .iter()
        .enumerate()
        .filter(|(_, result)| !result.passed)
        .map(|(index, result)| FailureDetail {
            input: Some(result.input.clone()),
            expected: Some(expected_for(question, index, result)),
            actual: Some(result.output.clone()),
            error: result.error.clone(),
        })
        .collect();

    if failures.is_empty() {
        info!("      ✓ 全部 {} 个测试用例通过", results.len());
        Validation::Passed
    } else {
        Validation::Failed(failures)
    }
}

/// 期望输出：优先取服务返回值，其次取原用例（空字符串原样保留），最后为 `N/A`
fn expected_for(question: &Question, index: usize, result: &CaseResult) -> String {
    result
        .expected_output
        .clone()
        .or_else(|| question.expected_output_at(index))
        .unwrap_or_else(|| "N/A".to_string())
}

fn log_case_result(question: &Question, index: usize, result: &CaseResult) {
    let status = if result.passed { "✓ PASSED" } else { "✗ FAILED" };
    info!(
        "      [用例 {}] {} | 输入: {}",
        index + 1,
        status,
        escape_newlines(&preview(&result.input, 20))
    );

    if !result.passed {
        info!("        输入:     {}", escape_newlines(&result.input));
        info!(
            "        期望输出: {}",
            escape_newlines(&expected_for(question, index, result))
        );
        info!("        实际输出: {}", escape_newlines(&result.output));
        if let Some(error) = &result.error {
            info!("        错误:     {}", error);
        }
    }
}
