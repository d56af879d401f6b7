use anyhow::Result;
use clap::Parser;

use question_repair::cli::Cli;
use question_repair::utils::logging;

#[tokio::main]
async fn main() -> Result<()> {
    // 初始化日志
    logging::init();

    // 解析参数并运行
    Cli::parse().run().await
}
