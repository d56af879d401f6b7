//! 单元树
//!
//! 输入文件的根可以是单个单元，也可以是单元数组。单元可以嵌套任意层。
//!
//! 文档按原始 JSON 保存，只在遍历时读取 `name`、`questions`、`children`，
//! 写回时键顺序、`null` 值和未知字段都保持不变。

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// 单元节点的只读视图
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Unit<'a> {
    fields: &'a Map<String, Value>,
}

impl<'a> Unit<'a> {
    /// 只有 JSON 对象才是单元
    fn from_value(value: &'a Value) -> Option<Self> {
        value.as_object().map(|fields| Self { fields })
    }

    pub fn fields(&self) -> &'a Map<String, Value> {
        self.fields
    }

    /// 用于日志显示的单元名；缺失、`null`、空字符串、`0`、`false` 时为 `Unnamed Unit`
    pub fn display_name(&self) -> String {
        match self.fields.get("name") {
            Some(Value::String(s)) if !s.is_empty() => s.clone(),
            Some(Value::Number(n)) if n.as_f64() != Some(0.0) => n.to_string(),
            Some(Value::Bool(true)) => "true".to_string(),
            Some(value @ (Value::Array(_) | Value::Object(_))) => value.to_string(),
            _ => "Unnamed Unit".to_string(),
        }
    }

    /// `questions` 不是数组时视为没有题目
    fn questions(&self) -> &'a [Value] {
        array_field(self.fields, "questions")
    }

    /// `children` 不是数组时视为没有子单元
    fn children(&self) -> &'a [Value] {
        array_field(self.fields, "children")
    }
}

fn array_field<'a>(fields: &'a Map<String, Value>, key: &str) -> &'a [Value] {
    fields
        .get(key)
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

/// 文档根节点
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Document(Value);

/// 单元在树中的位置：第一个下标是根单元，其余是逐层的子单元下标
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitPath(Vec<usize>);

impl UnitPath {
    fn child(&self, index: usize) -> Self {
        let mut path = self.0.clone();
        path.push(index);
        Self(path)
    }

    pub fn depth(&self) -> usize {
        self.0.len()
    }
}

/// 题目在树中的位置
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionPath {
    pub unit: UnitPath,
    pub index: usize,
}

/// 深度优先遍历产生的访问事件
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Visit {
    /// 进入一个单元
    Unit(UnitPath),
    /// 单元内的一道题目
    Question(QuestionPath),
}

impl Document {
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    /// 根是数组时每个元素是一个根单元，否则根本身是唯一的根单元
    fn roots(&self) -> &[Value] {
        match &self.0 {
            Value::Array(units) => units,
            single => std::slice::from_ref(single),
        }
    }

    fn roots_mut(&mut self) -> &mut [Value] {
        match &mut self.0 {
            Value::Array(units) => units,
            single => std::slice::from_mut(single),
        }
    }

    pub fn unit(&self, path: &UnitPath) -> Option<Unit<'_>> {
        let (first, rest) = path.0.split_first()?;
        let mut unit = Unit::from_value(self.roots().get(*first)?)?;
        for &index in rest {
            unit = Unit::from_value(unit.children().get(index)?)?;
        }
        Some(unit)
    }

    fn unit_fields_mut(&mut self, path: &UnitPath) -> Option<&mut Map<String, Value>> {
        let (first, rest) = path.0.split_first()?;
        let mut fields = self.roots_mut().get_mut(*first)?.as_object_mut()?;
        for &index in rest {
            fields = fields
                .get_mut("children")?
                .as_array_mut()?
                .get_mut(index)?
                .as_object_mut()?;
        }
        Some(fields)
    }

    /// 题目对应的原始 JSON 对象
    pub fn question_fields(&self, path: &QuestionPath) -> Option<&Map<String, Value>> {
        self.unit(&path.unit)?.questions().get(path.index)?.as_object()
    }

    /// 题目对应的原始 JSON 对象（可修改）
    pub fn question_fields_mut(&mut self, path: &QuestionPath) -> Option<&mut Map<String, Value>> {
        self.unit_fields_mut(&path.unit)?
            .get_mut("questions")?
            .as_array_mut()?
            .get_mut(path.index)?
            .as_object_mut()
    }

    /// 按深度优先顺序列出所有访问事件
    ///
    /// 每个单元先访问自己的题目（按顺序），再依次进入子单元。
    /// 不是 JSON 对象的单元和题目会被跳过。使用显式栈，嵌套深度不受调用栈限制。
    pub fn visits(&self) -> Vec<Visit> {
        let mut visits = Vec::new();
        let mut stack: Vec<UnitPath> = (0..self.roots().len())
            .rev()
            .map(|i| UnitPath(vec![i]))
            .collect();

        while let Some(path) = stack.pop() {
            let Some(unit) = self.unit(&path) else {
                continue;
            };

            visits.push(Visit::Unit(path.clone()));
            for (index, question) in unit.questions().iter().enumerate() {
                if question.is_object() {
                    visits.push(Visit::Question(QuestionPath {
                        unit: path.clone(),
                        index,
                    }));
                }
            }
            for child in (0..unit.children().len()).rev() {
                stack.push(path.child(child));
            }
        }

        visits
    }

    /// 按遍历顺序列出所有题目位置
    pub fn question_paths(&self) -> Vec<QuestionPath> {
        self.visits()
            .into_iter()
            .filter_map(|visit| match visit {
                Visit::Question(path) => Some(path),
                Visit::Unit(_) => None,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ids(doc: &Document) -> Vec<String> {
        doc.question_paths()
            .iter()
            .map(|p| doc.question_fields(p).unwrap()["id"].as_str().unwrap().to_string())
            .collect()
    }

    #[test]
    fn test_own_questions_before_children() {
        let doc: Document = serde_json::from_value(json!({
            "name": "root",
            "children": [
                { "name": "c1", "questions": [{ "id": "c1q" }] },
                { "name": "c2", "questions": [{ "id": "c2q" }] }
            ],
            "questions": [{ "id": "own0" }, { "id": "own1" }]
        }))
        .unwrap();

        assert_eq!(ids(&doc), vec!["own0", "own1", "c1q", "c2q"]);
    }

    #[test]
    fn test_depth_first_not_breadth_first() {
        let doc: Document = serde_json::from_value(json!([
            {
                "name": "a",
                "children": [
                    { "name": "a1", "children": [{ "questions": [{ "id": "a1x" }] }] },
                    { "name": "a2", "questions": [{ "id": "a2" }] }
                ]
            },
            { "name": "b", "questions": [{ "id": "b" }] }
        ]))
        .unwrap();

        assert_eq!(ids(&doc), vec!["a1x", "a2", "b"]);
    }

    #[test]
    fn test_unit_visits_precede_their_questions() {
        let doc: Document = serde_json::from_value(json!({
            "questions": [{ "id": "q" }],
            "children": [{ "name": "child" }]
        }))
        .unwrap();

        let visits = doc.visits();
        assert_eq!(visits.len(), 3);
        assert!(matches!(&visits[0], Visit::Unit(p) if p.depth() == 1));
        assert!(matches!(&visits[1], Visit::Question(_)));
        assert!(matches!(&visits[2], Visit::Unit(p) if p.depth() == 2));
        if let Visit::Unit(path) = &visits[2] {
            assert_eq!(doc.unit(path).unwrap().display_name(), "child");
        }
        if let Visit::Unit(path) = &visits[0] {
            assert_eq!(doc.unit(path).unwrap().display_name(), "Unnamed Unit");
        }
    }

    #[test]
    fn test_display_name_of_non_string_names() {
        let doc: Document = serde_json::from_value(json!([
            { "name": 4 },
            { "name": null },
            { "name": "" },
            { "name": 0 }
        ]))
        .unwrap();

        let names: Vec<String> = (0..4)
            .map(|i| doc.unit(&UnitPath(vec![i])).unwrap().display_name())
            .collect();
        assert_eq!(names, vec!["4", "Unnamed Unit", "Unnamed Unit", "Unnamed Unit"]);
    }

    #[test]
    fn test_non_array_questions_and_children_are_skipped() {
        let doc: Document = serde_json::from_value(json!({
            "name": "root",
            "questions": null,
            "children": { "questions": [{ "id": "hidden" }] }
        }))
        .unwrap();

        assert_eq!(doc.visits().len(), 1);
        assert!(doc.question_paths().is_empty());
    }

    #[test]
    fn test_non_object_entries_are_skipped() {
        let doc: Document = serde_json::from_value(json!({
            "questions": [null, { "id": "real" }, 3],
            "children": ["not a unit", { "questions": [{ "id": "child" }] }]
        }))
        .unwrap();

        assert_eq!(ids(&doc), vec!["real", "child"]);
    }

    #[test]
    fn test_question_fields_mut_edits_in_place() {
        let mut doc: Document = serde_json::from_value(json!({
            "children": [{ "questions": [{ "id": "x" }] }]
        }))
        .unwrap();
        let path = doc.question_paths().remove(0);
        doc.question_fields_mut(&path)
            .unwrap()
            .insert("hints".to_string(), json!("added"));

        assert_eq!(
            serde_json::to_value(&doc).unwrap(),
            json!({ "children": [{ "questions": [{ "id": "x", "hints": "added" }] }] })
        );
    }

    #[test]
    fn test_unit_keys_keep_order_and_nulls() {
        let text = r#"{"week":4,"questions":[],"name":null,"children":[{"id":"u2","name":7}]}"#;
        let doc: Document = serde_json::from_str(text).unwrap();
        assert_eq!(serde_json::to_string(&doc).unwrap(), text);
    }

    #[test]
    fn test_empty_array_root() {
        let doc: Document = serde_json::from_value(json!([])).unwrap();
        assert!(doc.visits().is_empty());
    }
}
