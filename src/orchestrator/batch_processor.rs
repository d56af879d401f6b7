//! 批量文件处理器 - 编排层
//!
//! ## 职责
//!
//! 按配置的文件列表依次启动子进程（当前可执行文件的 `validate` 子命令），
//! 收集每个子进程的输出，最后写成一份 markdown 报告。
//!
//! ## 核心功能
//!
//! 1. **顺序执行**：一个子进程结束后才启动下一个，中途不终止
//! 2. **凭据传递**：把 API key 放进子进程环境变量
//! 3. **输出收集**：stdout、stderr、启动错误和退出码都写入对应章节
//! 4. **报告写入**：全部文件处理完后一次性写入报告文件

use std::path::{Path, PathBuf};
use std::process::Output;

use anyhow::{Context, Result};
use tokio::process::Command;
use tracing::{error, info};

use crate::config::{Config, API_KEY_ENV_VARS};
use crate::models::derive_output_path;
use crate::utils::logging::{log_banner, timestamp};

/// 一个子进程的运行结果
#[derive(Debug, Default, Clone)]
pub struct ChildRun {
    pub stdout: String,
    pub stderr: String,
    /// 子进程无法启动时的错误信息
    pub spawn_error: Option<String>,
    /// 退出码；被信号终止时为 `None`
    pub exit_code: Option<i32>,
}

impl ChildRun {
    fn from_output(output: Output) -> Self {
        Self {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            spawn_error: None,
            exit_code: output.status.code(),
        }
    }

    fn spawn_failed(e: std::io::Error) -> Self {
        Self {
            spawn_error: Some(e.to_string()),
            ..Default::default()
        }
    }

    /// 子进程是否正常启动并以 0 退出
    pub fn succeeded(&self) -> bool {
        self.spawn_error.is_none() && self.exit_code == Some(0)
    }
}

/// 批量运行报告（markdown）
#[derive(Debug, Clone)]
pub struct BatchReport {
    content: String,
    runs: usize,
    failed_runs: usize,
}

impl BatchReport {
    pub fn new() -> Self {
        Self {
            content: format!("# Validation Results\n\n_Generated at {}_\n", timestamp()),
            runs: 0,
            failed_runs: 0,
        }
    }

    /// 追加一个文件的章节
    pub fn push_section(&mut self, file: &str, run: &ChildRun) {
        let spawn_error = run.spawn_error.as_deref().unwrap_or("");
        self.content.push_str(&format!(
            "\n## Validation for {}\n\n```text\n{}{}{}\n```\n",
            file, run.stdout, run.stderr, spawn_error
        ));

        let status = match (&run.spawn_error, run.exit_code) {
            (Some(_), _) => "not started".to_string(),
            (None, Some(code)) => code.to_string(),
            (None, None) => "terminated by signal".to_string(),
        };
        self.content.push_str(&format!("\nExit status: {}\n", status));

        self.runs += 1;
        if !run.succeeded() {
            self.failed_runs += 1;
        }
    }

    pub fn as_str(&self) -> &str {
        &self.content
    }

    pub fn runs(&self) -> usize {
        self.runs
    }

    pub fn failed_runs(&self) -> usize {
        self.failed_runs
    }
}

impl Default for BatchReport {
    fn default() -> Self {
        Self::new()
    }
}

/// 批量处理器
pub struct BatchProcessor {
    program: PathBuf,
    files: Vec<String>,
    report_file: PathBuf,
    api_key: Option<String>,
    config_file: Option<PathBuf>,
}

impl BatchProcessor {
    /// 创建批量处理器
    ///
    /// `program` 为子进程要执行的程序，通常是 `std::env::current_exe()`
    pub fn new(config: &Config, program: PathBuf) -> Self {
        Self {
            program,
            files: config.batch_files.clone(),
            report_file: PathBuf::from(&config.report_file),
            api_key: config.llm_api_key.clone(),
            config_file: None,
        }
    }

    /// 让子进程使用同一个配置文件
    pub fn with_config_file(mut self, config_file: Option<PathBuf>) -> Self {
        self.config_file = config_file;
        self
    }

    /// 依次处理所有文件，并写入报告
    ///
    /// 只有报告写入失败才返回错误
    pub async fn run(&self) -> Result<BatchReport> {
        log_banner(&format!("🚀 批量校验开始 - 共 {} 个文件", self.files.len()));

        let mut report = BatchReport::new();

        for (idx, file) in self.files.iter().enumerate() {
            info!("[{}/{}] Running validation for {}...", idx + 1, self.files.len(), file);

            let run = self.run_one(file).await;
            match (&run.spawn_error, run.exit_code) {
                (Some(e), _) => error!("❌ {} 无法启动子进程: {}", file, e),
                (None, Some(0)) => info!("✓ {} 处理完成", file),
                (None, code) => error!("❌ {} 子进程异常退出: {:?}", file, code),
            }

            report.push_section(file, &run);
        }

        write_report(&self.report_file, &report).await?;
        log_batch_complete(&report, &self.report_file);

        Ok(report)
    }

    async fn run_one(&self, file: &str) -> ChildRun {
        let output_path = derive_output_path(Path::new(file));

        let mut command = Command::new(&self.program);
        if let Some(config_file) = &self.config_file {
            command.arg("--config").arg(config_file);
        }
        command.arg("validate").arg(file).arg(&output_path);
        if let Some(key) = &self.api_key {
            command.env(API_KEY_ENV_VARS[0], key);
        }

        match command.output().await {
            Ok(output) => ChildRun::from_output(output),
            Err(e) => ChildRun::spawn_failed(e),
        }
    }
}

async fn write_report(path: &Path, report: &BatchReport) -> Result<()> {
    tokio::fs::write(path, report.as_str())
        .await
        .with_context(|| format!("无法写入报告文件: {}", path.display()))
}

// ========== 日志辅助函数 ==========

fn log_batch_complete(report: &BatchReport, report_file: &Path) {
    log_banner("📊 批量校验完成");
    info!("完成时间: {}", timestamp());
    info!(
        "✅ 正常退出: {}/{}",
        report.runs() - report.failed_runs(),
        report.runs()
    );
    info!("📝 Validation completed. Logs written to {}", report_file.display());
}
