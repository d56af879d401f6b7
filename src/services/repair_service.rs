//! AI 修复服务 - 业务能力层
//!
//! 只负责"让 LLM 产出补丁"能力，不关心流程
//!
//! - 结构补全：只生成缺失字段
//! - 正确性修复：根据失败用例判断是答案错还是用例错，返回完整记录
//!
//! 返回的补丁经过字段校验后才交给调用方合并。

use std::sync::Arc;

use regex::Regex;
use serde_json::Value;
use tracing::debug;

use crate::clients::ChatBackend;
use crate::config::Config;
use crate::error::{AppResult, LlmError};
use crate::models::question::{Question, QuestionPatch};
use crate::services::question_validator::FailureDetail;

const SYSTEM_MESSAGE: &str = "You are a helpful assistant that outputs only valid JSON.";

/// AI 修复服务
pub struct RepairService {
    chat: Arc<dyn ChatBackend>,
    required_fields: Vec<String>,
    question_type: String,
    language: String,
    require_complete_patch: bool,
}

impl RepairService {
    pub fn new(chat: Arc<dyn ChatBackend>, config: &Config) -> Self {
        Self {
            chat,
            required_fields: config.required_fields.clone(),
            question_type: config.question_type.clone(),
            language: config.language.clone(),
            require_complete_patch: config.require_complete_patch,
        }
    }

    /// 生成缺失字段
    ///
    /// 回复必须是 JSON 对象；开启 `require_complete_patch` 时，
    /// 每个请求的字段都必须给出非空值，否则视为失败。
    pub async fn repair_structure(
        &self,
        question: &Question,
        missing: &[String],
    ) -> AppResult<QuestionPatch> {
        let prompt = build_structure_prompt(question, missing);
        debug!("结构补全提示词长度: {} 字符", prompt.len());

        let reply = self.chat.complete_json(SYSTEM_MESSAGE, &prompt).await?;
        let patch = parse_reply(&reply)?.retain_known(&self.required_fields, question);

        if patch.is_empty() {
            return Err(LlmError::EmptyPatch.into());
        }

        if self.require_complete_patch {
            let uncovered = patch.uncovered(missing);
            if !uncovered.is_empty() {
                return Err(LlmError::IncompletePatch {
                    missing: uncovered.into_iter().cloned().collect(),
                }
                .into());
            }
        }

        Ok(patch)
    }

    /// 修复答案或测试用例
    ///
    /// `question_type` 和 `language` 总是被改写为配置值。
    pub async fn repair_correctness(
        &self,
        question: &Question,
        failures: &[FailureDetail],
    ) -> AppResult<QuestionPatch> {
        let prompt =
            build_correctness_prompt(question, failures, &self.question_type, &self.language);
        debug!("正确性修复提示词长度: {} 字符", prompt.len());

        let reply = self.chat.complete_json(SYSTEM_MESSAGE, &prompt).await?;
        let mut patch = parse_reply(&reply)?.retain_known(&self.required_fields, question);

        if patch.is_empty() {
            return Err(LlmError::EmptyPatch.into());
        }

        patch.set("question_type", Value::String(self.question_type.clone()));
        patch.set("language", Value::String(self.language.clone()));

        Ok(patch)
    }
}

/// 解析 LLM 回复为补丁
///
/// 回复被 Markdown 代码块包裹时先去掉代码块标记。
pub fn parse_reply(reply: &str) -> Result<QuestionPatch, LlmError> {
    let body = strip_code_fence(reply);

    match serde_json::from_str::<Value>(body.trim()) {
        Ok(Value::Object(map)) => Ok(QuestionPatch::new(map)),
        Ok(other) => Err(LlmError::ReplyNotObject {
            found: crate::utils::logging::preview(&other.to_string(), 80),
        }),
        Err(source) => Err(LlmError::ReplyNotJson { source }),
    }
}

fn strip_code_fence(reply: &str) -> &str {
    if let Ok(re) = Regex::new(r"(?s)^\s*```[A-Za-z0-9_-]*\s*\n(.*?)\n?\s*```\s*$") {
        if let Some(body) = re.captures(reply).and_then(|caps| caps.get(1)) {
            return body.as_str();
        }
    }
    reply
}

/// 把失败用例格式化为提示词中的文本块
pub fn format_failures(failures: &[FailureDetail]) -> String {
    failures
        .iter()
        .map(|f| {
            format!(
                "Input: {}\nExpected: {}\nActual: {}\nError: {}",
                f.input.as_deref().unwrap_or("N/A"),
                f.expected.as_deref().unwrap_or("N/A"),
                f.actual.as_deref().unwrap_or("N/A"),
                f.error.as_deref().unwrap_or("None")
            )
        })
        .collect::<Vec<_>>()
        .join("\n---\n")
}

fn pretty(value: &impl serde::Serialize) -> String {
    serde_json::to_string_pretty(value).unwrap_or_default()
}

fn field_text(question: &Question, key: &str) -> String {
    question
        .get(key)
        .map(crate::models::question::value_to_text)
        .unwrap_or_default()
}

/// 构建结构补全提示词
pub fn build_structure_prompt(question: &Question, missing: &[String]) -> String {
    format!(
        r#"You are an experienced author of programming exercises.
The coding question below is stored as JSON, but some required fields are missing or empty.
Write accurate content for those fields, using the fields that are present (title, description, answer code, test cases) as your source of truth.

CURRENT QUESTION JSON:
{question_json}

FIELDS TO GENERATE:
{missing_json}

GUIDELINES:
- "hints": one or two short hints that point toward the approach used by the answer.
- "constraints": value ranges that fit the data types and the problem, for example "1 <= N <= 1000".
- "solution_explanation": explain how the existing "answer" code solves the problem, step by step.
- "input_format" / "output_format": describe exactly what the answer reads and prints, based on its input and output calls.
- Any other field: infer it from the rest of the record.

Respond with a JSON object whose keys are exactly the fields listed above. Do not repeat fields that already have values.

RESPONSE SHAPE:
{{
    "<missing_field>": "<generated content>"
}}
"#,
        question_json = pretty(question),
        missing_json = pretty(&missing),
    )
}

/// 构建正确性修复提示词
pub fn build_correctness_prompt(
    question: &Question,
    failures: &[FailureDetail],
    question_type: &str,
    language: &str,
) -> String {
    let test_cases = question
        .get("test_cases")
        .cloned()
        .unwrap_or(Value::Array(Vec::new()));

    format!(
        r#"You are an expert {language} programmer who repairs exam questions.
The question below ships a reference answer and test cases, and running the answer against its test cases through a compiler failed.

QUESTION:
Title: {title}
Description: {description}
Input Format: {input_format}
Output Format: {output_format}
Constraints: {constraints}

Current Answer Code:
```{fence}
{answer}
```

Test Cases:
{test_cases}

FAILED TEST CASES:
{failures}

WHAT TO DO:
1. Decide whether the answer code is wrong or the test cases do not match the problem statement (wrong values, stray whitespace, wrong types).
2. If the answer is wrong, rewrite "answer" so it is correct and follows the input and output formats exactly.
3. If the test cases are wrong, correct "test_cases", keeping the {{"input", "expectedOutput"}} shape.
4. Keep every other field unless it has to change to stay consistent with your fix.
5. Reply with the complete question as one JSON object with the same keys as the original, and nothing else.

RESPONSE SHAPE:
{{
    "id": "...",
    "question_text": "...",
    "question_description": "...",
    "input_format": "...",
    "output_format": "...",
    "constraints": "...",
    "hints": "...",
    "question_type": "{question_type}",
    "difficulty": "...",
    "answer": "...",
    "test_cases": [...],
    "solution_explanation": "...",
    "language": "{language}"
}}
"#,
        language = language,
        title = field_text(question, "question_text"),
        description = field_text(question, "question_description"),
        input_format = field_text(question, "input_format"),
        output_format = field_text(question, "output_format"),
        constraints = field_text(question, "constraints"),
        fence = language.to_lowercase(),
        answer = question.answer(),
        test_cases = pretty(&test_cases),
        failures = format_failures(failures),
        question_type = question_type,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Mutex;

    /// 返回固定回复并记录提示词
    struct ScriptedChat {
        reply: AppResult<String>,
        prompts: Mutex<Vec<String>>,
    }

    impl ScriptedChat {
        fn replying(reply: &str) -> Arc<Self> {
            Arc::new(Self {
                reply: Ok(reply.to_string()),
                prompts: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl ChatBackend for ScriptedChat {
        async fn complete_json(&self, _system: &str, user: &str) -> AppResult<String> {
            self.prompts.lock().unwrap().push(user.to_string());
            match &self.reply {
                Ok(reply) => Ok(reply.clone()),
                Err(_) => Err(LlmError::EmptyContent {
                    model: "scripted".to_string(),
                }
                .into()),
            }
        }
    }

    fn question() -> Question {
        serde_json::from_value(json!({
            "id": "w5-q3",
            "question_text": "Reverse",
            "question_description": "Reverse an integer",
            "input_format": "An integer N",
            "output_format": "N reversed",
            "constraints": "",
            "answer": "#include <stdio.h>\nint main(){int n;scanf(\"%d\",&n);printf(\"%d\",n);}",
            "test_cases": [
                { "input": "123\n", "expectedOutput": "321" },
                { "input": "40\n", "expectedOutput": "4" }
            ],
            "topic": "loops"
        }))
        .unwrap()
    }

    #[test]
    fn test_parse_reply_plain_and_fenced() {
        let patch = parse_reply(r#"{"hints": "h"}"#).unwrap();
        assert_eq!(patch.get("hints"), Some(&json!("h")));

        let patch = parse_reply("```json\n{\"hints\": \"fenced\"}\n```").unwrap();
        assert_eq!(patch.get("hints"), Some(&json!("fenced")));
    }

    #[test]
    fn test_parse_reply_rejects_non_objects() {
        assert!(matches!(
            parse_reply("[1, 2]"),
            Err(LlmError::ReplyNotObject { .. })
        ));
        assert!(matches!(
            parse_reply("Sure! Here is the JSON"),
            Err(LlmError::ReplyNotJson { .. })
        ));
    }

    #[test]
    fn test_format_failures() {
        let failures = vec![
            FailureDetail {
                input: Some("123\n".to_string()),
                expected: Some("321".to_string()),
                actual: Some("123".to_string()),
                error: None,
            },
            FailureDetail::synthetic("Compiler Error: boom"),
        ];
        assert_eq!(
            format_failures(&failures),
            "Input: 123\n\nExpected: 321\nActual: 123\nError: None\n---\n\
             Input: N/A\nExpected: N/A\nActual: N/A\nError: Compiler Error: boom"
        );
    }

    #[test]
    fn test_structure_prompt_lists_exact_missing_fields() {
        let prompt = build_structure_prompt(
            &question(),
            &["constraints".to_string(), "hints".to_string()],
        );
        assert!(prompt.contains("\"constraints\",\n  \"hints\""));
        assert!(prompt.contains("\"id\": \"w5-q3\""));
    }

    #[test]
    fn test_correctness_prompt_embeds_code_and_failures() {
        let failures = vec![FailureDetail {
            input: Some("123\n".to_string()),
            expected: Some("321".to_string()),
            actual: Some("123".to_string()),
            error: None,
        }];
        let prompt = build_correctness_prompt(&question(), &failures, "CODING", "C");
        assert!(prompt.contains("```c\n#include <stdio.h>"));
        assert!(prompt.contains("Expected: 321"));
        assert!(prompt.contains("\"question_type\": \"CODING\""));
        assert!(prompt.contains("\"language\": \"C\""));
        assert!(prompt.contains("Title: Reverse"));
    }

    #[tokio::test]
    async fn test_repair_structure_requires_all_fields() {
        let config = Config::default();
        let missing = vec!["constraints".to_string(), "hints".to_string()];

        let chat = ScriptedChat::replying(r#"{"hints": "Use % 10"}"#);
        let service = RepairService::new(chat.clone(), &config);
        let err = service
            .repair_structure(&question(), &missing)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("constraints"));
        assert_eq!(chat.prompts.lock().unwrap().len(), 1);

        let lenient = Config {
            require_complete_patch: false,
            ..Config::default()
        };
        let service = RepairService::new(chat, &lenient);
        let patch = service.repair_structure(&question(), &missing).await.unwrap();
        assert_eq!(patch.get("hints"), Some(&json!("Use % 10")));
    }

    #[tokio::test]
    async fn test_repair_correctness_forces_type_and_language() {
        let config = Config::default();
        let chat = ScriptedChat::replying(
            r#"{"answer": "fixed", "question_type": "MCQ", "language": "Python", "score": 3}"#,
        );
        let service = RepairService::new(chat, &config);

        let patch = service
            .repair_correctness(&question(), &[FailureDetail::synthetic("x")])
            .await
            .unwrap();

        assert_eq!(patch.get("answer"), Some(&json!("fixed")));
        assert_eq!(patch.get("question_type"), Some(&json!("CODING")));
        assert_eq!(patch.get("language"), Some(&json!("C")));
        assert_eq!(patch.get("score"), None);
    }

    #[tokio::test]
    async fn test_repair_correctness_rejects_empty_object() {
        let service = RepairService::new(ScriptedChat::replying("{}"), &Config::default());
        let result = service
            .repair_correctness(&question(), &[FailureDetail::synthetic("x")])
            .await;
        tokio_test::assert_err!(result);
    }
}
