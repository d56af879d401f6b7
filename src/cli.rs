//! 命令行入口
//!
//! - `validate <input> [output]`：处理单个文件
//! - `batch`：对配置中的文件列表逐个启动 `validate` 子进程，并写出报告

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::info;

use crate::config::Config;
use crate::models::derive_output_path;
use crate::orchestrator::{process_file, BatchProcessor};
use crate::utils::logging::{log_banner, timestamp};
use crate::workflow::QuestionFlow;

#[derive(Parser, Debug)]
#[command(
    name = "question-repair",
    version,
    about = "校验并修复 C 语言编程题库（结构补全 + 编译校验 + AI 修复）"
)]
pub struct Cli {
    /// TOML 配置文件路径
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// 校验并修复一个题目文件
    Validate(ValidateArgs),
    /// 依次校验配置中的全部文件，并生成 markdown 报告
    Batch(BatchArgs),
}

#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// 输入 JSON 文件
    pub input: PathBuf,
    /// 输出 JSON 文件，默认 `<输入名>-fixed.json`
    pub output: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct BatchArgs {
    /// 报告文件，覆盖配置中的 `report_file`
    #[arg(long)]
    pub report: Option<PathBuf>,
    /// 要处理的文件，覆盖配置中的 `batch_files`
    pub files: Vec<String>,
}

impl Cli {
    /// 加载配置并执行子命令
    pub async fn run(self) -> Result<()> {
        let config = Config::load(self.config.as_deref()).context("加载配置失败")?;

        match self.command {
            Command::Validate(args) => run_validate(&config, args).await,
            Command::Batch(args) => run_batch(config, args, self.config).await,
        }
    }
}

async fn run_validate(config: &Config, args: ValidateArgs) -> Result<()> {
    let output = args
        .output
        .unwrap_or_else(|| derive_output_path(&args.input));

    log_banner(&format!("🚀 开始校验 {} - {}", args.input.display(), timestamp()));

    let flow = QuestionFlow::new(config).context("无法初始化处理流程")?;
    let stats = process_file(&flow, &args.input, &output).await?;

    info!(
        "✓ {} 已处理 {} 道题，结果写入 {}",
        args.input.display(),
        stats.total,
        output.display()
    );
    Ok(())
}

async fn run_batch(mut config: Config, args: BatchArgs, config_file: Option<PathBuf>) -> Result<()> {
    if !args.files.is_empty() {
        config.batch_files = args.files;
    }
    if let Some(report) = args.report {
        config.report_file = report.to_string_lossy().into_owned();
    }

    let program = std::env::current_exe().context("无法定位当前可执行文件")?;
    BatchProcessor::new(&config, program)
        .with_config_file(config_file)
        .run()
        .await?;
    Ok(())
}
