//! 结构检查 - 业务能力层
//!
//! 找出题目记录中缺失的必需字段，纯函数，不调用任何外部服务

use crate::models::question::{is_blank, Question};

/// 返回 `required_fields` 中缺失、为 null 或为空字符串的字段，保持原有顺序
pub fn missing_fields(question: &Question, required_fields: &[String]) -> Vec<String> {
    required_fields
        .iter()
        .filter(|field| is_blank(question.get(field)))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use serde_json::json;

    fn question(value: serde_json::Value) -> Question {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_complete_record_has_no_missing_fields() {
        let config = Config::default();
        let q = question(json!({
            "id": "w4-q1",
            "question_text": "Sum",
            "question_description": "Add two numbers",
            "input_format": "Two integers",
            "output_format": "One integer",
            "constraints": "0 <= a, b <= 100",
            "hints": "Use scanf",
            "question_type": "CODING",
            "difficulty": "EASY",
            "answer": "int main(){}",
            "test_cases": [],
            "solution_explanation": "Reads and adds",
            "language": "C"
        }));
        assert!(missing_fields(&q, &config.required_fields).is_empty());
    }

    #[test]
    fn test_missing_null_and_empty_reported_in_order() {
        let config = Config::default();
        let q = question(json!({
            "id": "w4-q2",
            "question_text": "Sum",
            "question_description": "Add two numbers",
            "input_format": null,
            "output_format": "One integer",
            "hints": "",
            "question_type": "CODING",
            "difficulty": 0,
            "answer": "int main(){}",
            "test_cases": [],
            "solution_explanation": "Reads and adds",
            "language": "C"
        }));
        assert_eq!(
            missing_fields(&q, &config.required_fields),
            vec!["input_format", "constraints", "hints"]
        );
    }

    #[test]
    fn test_custom_required_list() {
        let required = vec!["answer".to_string(), "id".to_string()];
        let q = question(json!({ "id": "x" }));
        assert_eq!(missing_fields(&q, &required), vec!["answer"]);
    }
}
