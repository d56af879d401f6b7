//! 题目处理上下文
//!
//! 封装"我正在处理哪个单元的第几题"这一信息

use std::fmt::Display;

/// 题目处理上下文
#[derive(Debug, Clone)]
pub struct QuestionCtx {
    /// 所在单元名称（仅用于日志显示）
    pub unit_name: String,

    /// 题目在文档中的序号（从1开始，按遍历顺序）
    pub question_number: usize,

    /// 题目ID
    pub question_id: String,
}

impl QuestionCtx {
    /// 创建新的题目上下文
    pub fn new(unit_name: impl Into<String>, question_number: usize, question_id: String) -> Self {
        Self {
            unit_name: unit_name.into(),
            question_number,
            question_id,
        }
    }
}

impl Display for QuestionCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[{} 题目#{} ID#{}]",
            self.unit_name, self.question_number, self.question_id
        )
    }
}
