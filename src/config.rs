use std::path::Path;

use serde::Deserialize;

use crate::error::{AppResult, ConfigError, FileError};

/// 凭据所在的环境变量（按优先级）
pub const API_KEY_ENV_VARS: [&str; 2] = ["LLM_API_KEY", "SAMBANOVA_API_KEY"];

/// 程序配置
///
/// 在入口处构建一次，再传给各个组件；组件自身不读取环境变量。
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    // --- 编译服务配置 ---
    pub compiler_api_url: String,
    /// 随请求发送给编译服务的单个用例超时（毫秒）
    pub compiler_timeout_ms: u64,
    /// HTTP 请求本身的超时（秒）
    pub compiler_request_timeout_secs: u64,
    // --- LLM 配置 ---
    pub llm_api_base_url: String,
    pub llm_model_name: String,
    pub llm_api_key: Option<String>,
    // --- 题目结构 ---
    /// 必需字段，顺序即报告缺失字段的顺序
    pub required_fields: Vec<String>,
    /// 修复后强制写入的题目类型
    pub question_type: String,
    /// 修复后强制写入的语言标记
    pub language: String,
    /// 结构补全必须覆盖所有缺失字段，否则视为失败
    pub require_complete_patch: bool,
    // --- 批量运行 ---
    pub batch_files: Vec<String>,
    pub report_file: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            compiler_api_url: "https://c-compiler-fzqcxyx4ma-el.a.run.app/test".to_string(),
            compiler_timeout_ms: 5000,
            compiler_request_timeout_secs: 60,
            llm_api_base_url: "https://api.sambanova.ai/v1".to_string(),
            llm_model_name: "Meta-Llama-3.1-405B".to_string(),
            llm_api_key: None,
            required_fields: [
                "id",
                "question_text",
                "question_description",
                "input_format",
                "output_format",
                "constraints",
                "hints",
                "question_type",
                "difficulty",
                "answer",
                "test_cases",
                "solution_explanation",
                "language",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            question_type: "CODING".to_string(),
            language: "C".to_string(),
            require_complete_patch: true,
            batch_files: [4, 5, 6, 7, 9, 10, 11, 12, 13]
                .iter()
                .map(|week| format!("questionbygroup/week-{}-cse.json", week))
                .collect(),
            report_file: "validation_logs.md".to_string(),
        }
    }
}

impl Config {
    /// 加载配置：默认值 → TOML 文件（可选）→ 环境变量
    pub fn load(config_file: Option<&Path>) -> AppResult<Self> {
        let config = match config_file {
            Some(path) => Self::from_toml_file(path)?,
            None => Self::default(),
        };
        config.apply_env(|name| std::env::var(name).ok())
    }

    /// 从 TOML 文件读取配置，未出现的键使用默认值
    pub fn from_toml_file(path: &Path) -> AppResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| FileError::read_failed(path.display().to_string(), e))?;
        Self::from_toml_str(&content, &path.display().to_string())
    }

    fn from_toml_str(content: &str, path: &str) -> AppResult<Self> {
        let config = toml::from_str(content).map_err(|source| ConfigError::TomlParseFailed {
            path: path.to_string(),
            source,
        })?;
        Ok(config)
    }

    /// 用环境变量覆盖配置
    ///
    /// `lookup` 通常是 `std::env::var`，测试中可以替换。
    pub fn apply_env<F>(mut self, lookup: F) -> AppResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("COMPILER_API_URL") {
            self.compiler_api_url = v;
        }
        if let Some(v) = lookup("COMPILER_TIMEOUT_MS") {
            self.compiler_timeout_ms = parse_env("COMPILER_TIMEOUT_MS", &v)?;
        }
        if let Some(v) = lookup("COMPILER_REQUEST_TIMEOUT_SECS") {
            self.compiler_request_timeout_secs = parse_env("COMPILER_REQUEST_TIMEOUT_SECS", &v)?;
        }
        if let Some(v) = lookup("LLM_API_BASE_URL") {
            self.llm_api_base_url = v;
        }
        if let Some(v) = lookup("LLM_MODEL_NAME") {
            self.llm_model_name = v;
        }
        if let Some(key) = API_KEY_ENV_VARS
            .iter()
            .find_map(|name| lookup(name).filter(|v| !v.trim().is_empty()))
        {
            self.llm_api_key = Some(key);
        }
        if let Some(v) = lookup("REPORT_FILE") {
            self.report_file = v;
        }
        Ok(self)
    }

    /// 取出 LLM 凭据，不存在时返回致命错误
    pub fn require_api_key(&self) -> Result<&str, ConfigError> {
        self.llm_api_key
            .as_deref()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingApiKey {
                var_name: API_KEY_ENV_VARS[0].to_string(),
            })
    }
}

fn parse_env(var_name: &str, value: &str) -> Result<u64, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::EnvVarParseFailed {
            var_name: var_name.to_string(),
            value: value.to_string(),
            expected_type: "u64".to_string(),
        })
}
