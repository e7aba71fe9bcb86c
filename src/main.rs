use clap::Parser;

use bmp_lsb_hide::{
    cli::{Cli, Commands},
    handler::{handle_decode, handle_encode},
    interactive::run_interactive,
};

/// 程序的主入口点
///
/// 负责初始化日志、解析命令行参数，并根据指定的子命令（`encode` 或 `decode`）
/// 将执行分派到相应的处理函数；没有子命令时进入交互模式
fn main() -> anyhow::Result<()> {
    // 日志级别由 RUST_LOG 控制，默认只输出警告
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    // 解析命令行参数
    let cli = Cli::parse();

    // 根据子命令调用相应的处理函数
    match cli.command {
        Some(Commands::Encode(args)) => handle_encode(args).map(drop),
        Some(Commands::Decode(args)) => handle_decode(args).map(drop),
        None => run_interactive(),
    }
}
