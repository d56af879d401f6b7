/// 编译服务客户端
///
/// 把源码和测试用例发给远程编译服务，返回每个用例的运行结果。
/// 网络层面的任何失败都会转换成 `CompileOutcome::RequestFailed`，不会向上抛出。
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::Config;
use crate::error::ApiError;

/// 单个测试用例的运行结果
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct CaseResult {
    #[serde(deserialize_with = "lenient_text")]
    pub input: String,
    #[serde(rename = "expectedOutput", deserialize_with = "lenient_opt_text")]
    pub expected_output: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub output: String,
    pub passed: bool,
    #[serde(deserialize_with = "lenient_opt_text")]
    pub error: Option<String>,
}

/// 编译服务的调用结果
#[derive(Debug, Clone, PartialEq)]
pub enum CompileOutcome {
    /// 逐用例结果
    Results(Vec<CaseResult>),
    /// 服务返回了顶层 `error`
    CompilerError(String),
    /// 响应中没有可用的 `results` 数组
    BadFormat,
    /// 请求本身失败（超时、连接错误、状态码错误、响应不是 JSON）
    RequestFailed(String),
}

/// 运行测试用例的能力
#[async_trait]
pub trait CodeRunner: Send + Sync {
    async fn run_tests(&self, code: &str, test_cases: &[Value], timeout_ms: u64) -> CompileOutcome;
}

#[derive(Serialize)]
struct CompileRequest<'a> {
    code: &'a str,
    #[serde(rename = "testCases")]
    test_cases: &'a [Value],
    timeout: u64,
}

/// 编译服务 HTTP 客户端
pub struct CompilerClient {
    client: reqwest::Client,
    endpoint: String,
}

impl CompilerClient {
    /// 创建新的编译服务客户端
    pub fn new(config: &Config) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.compiler_request_timeout_secs))
            .build()
            .map_err(|source| ApiError::RequestFailed {
                endpoint: config.compiler_api_url.clone(),
                source,
            })?;

        Ok(Self {
            client,
            endpoint: config.compiler_api_url.clone(),
        })
    }

    async fn post(&self, request: &CompileRequest<'_>) -> Result<Value, ApiError> {
        let request_failed = |source| ApiError::RequestFailed {
            endpoint: self.endpoint.clone(),
            source,
        };

        let body = self
            .client
            .post(&self.endpoint)
            .json(request)
            .send()
            .await
            .map_err(request_failed)?
            .error_for_status()
            .map_err(request_failed)?
            .text()
            .await
            .map_err(request_failed)?;

        serde_json::from_str(&body).map_err(|source| ApiError::JsonParseFailed {
            endpoint: self.endpoint.clone(),
            source,
        })
    }
}

#[async_trait]
impl CodeRunner for CompilerClient {
    async fn run_tests(&self, code: &str, test_cases: &[Value], timeout_ms: u64) -> CompileOutcome {
        debug!(
            "调用编译服务: {}，源码 {} 字符，用例 {} 个",
            self.endpoint,
            code.len(),
            test_cases.len()
        );

        let request = CompileRequest {
            code,
            test_cases,
            timeout: timeout_ms,
        };

        match self.post(&request).await {
            Ok(body) => parse_response(body),
            Err(e) => {
                warn!("编译服务请求失败: {}", e);
                CompileOutcome::RequestFailed(e.to_string())
            }
        }
    }
}

/// 解析编译服务的响应体
pub fn parse_response(body: Value) -> CompileOutcome {
    if let Some(error) = body.get("error").filter(|e| !is_falsy(e)) {
        let message = match error {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        return CompileOutcome::CompilerError(message);
    }

    let Some(results) = body.get("results").and_then(Value::as_array) else {
        return CompileOutcome::BadFormat;
    };

    let parsed: Result<Vec<CaseResult>, _> = results
        .iter()
        .cloned()
        .map(serde_json::from_value)
        .collect();

    match parsed {
        Ok(results) => CompileOutcome::Results(results),
        Err(e) => {
            warn!("编译服务返回的用例结果无法解析: {}", e);
            CompileOutcome::BadFormat
        }
    }
}

/// 与 JS 的真值判断一致：null、false、空字符串都不算错误
fn is_falsy(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}

fn lenient_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(crate::models::question::value_to_text(&value))
}

fn lenient_opt_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Null => None,
        Value::String(s) if s.is_empty() => None,
        other => Some(crate::models::question::value_to_text(&other)),
    })
}
