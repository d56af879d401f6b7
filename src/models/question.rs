use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::warn;

/// 题目记录
///
/// 底层保存原始 JSON 对象，保证未知字段和字段顺序在写回时不变。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Question(Map<String, Value>);

impl Question {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self(fields)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn set(&mut self, key: impl Into<String>, value: Value) {
        self.0.insert(key.into(), value);
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    /// 取出底层 JSON 对象，用于写回文档
    pub fn into_fields(self) -> Map<String, Value> {
        self.0
    }

    /// 用于日志显示的题目 ID
    pub fn id_label(&self) -> String {
        match self.0.get("id") {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Null) | None => "<无ID>".to_string(),
            Some(other) => other.to_string(),
        }
    }

    /// 参考答案源码，缺失时为空字符串
    pub fn answer(&self) -> &str {
        self.str_field("answer").unwrap_or("")
    }

    /// 原始测试用例数组，缺失或类型不对时为空
    pub fn test_cases(&self) -> &[Value] {
        self.0
            .get("test_cases")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// 第 `index` 个测试用例的期望输出
    pub fn expected_output_at(&self, index: usize) -> Option<String> {
        self.test_cases()
            .get(index)
            .and_then(|case| case.get("expectedOutput"))
            .map(value_to_text)
    }

    pub fn str_field(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    /// 应用补丁：只覆盖补丁中出现的字段
    pub fn apply(&mut self, patch: QuestionPatch) {
        for (key, value) in patch.0 {
            self.0.insert(key, value);
        }
    }
}

/// AI 返回的部分题目记录
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QuestionPatch(Map<String, Value>);

impl QuestionPatch {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self(fields)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn set(&mut self, key: impl Into<String>, value: Value) {
        self.0.insert(key.into(), value);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.0.keys()
    }

    /// 按字段表校验补丁
    ///
    /// 保留必需字段和原记录已有的字段，其余字段丢弃并记录警告。
    pub fn retain_known(mut self, required_fields: &[String], original: &Question) -> Self {
        let unknown: Vec<String> = self
            .0
            .keys()
            .filter(|key| {
                !required_fields.iter().any(|f| f == *key) && !original.contains_key(key)
            })
            .cloned()
            .collect();

        if !unknown.is_empty() {
            warn!(
                "[题目 {}] ⚠️ 丢弃 AI 返回的未知字段: {}",
                original.id_label(),
                unknown.join(", ")
            );
            for key in &unknown {
                self.0.remove(key);
            }
        }
        self
    }

    /// 列出 `requested` 中补丁没有给出有效值的字段
    pub fn uncovered<'a>(&self, requested: &'a [String]) -> Vec<&'a String> {
        requested
            .iter()
            .filter(|field| is_blank(self.0.get(field.as_str())))
            .collect()
    }
}

/// 缺失、null 或空字符串
pub fn is_blank(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.is_empty(),
        Some(_) => false,
    }
}

/// 把任意 JSON 值转换成适合展示的文本
pub fn value_to_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
