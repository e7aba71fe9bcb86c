//! # 命令行接口模块
//!
//! 使用 `clap` 定义了程序的命令行结构，包括子命令和参数。
//! 不带子命令运行时进入交互模式。

use clap::Parser;
use std::path::PathBuf;

/// 一款基于 LSB (最低有效位) 隐写术的命令行工具，用于在 24 位 BMP 图像中隐藏或恢复整个文件。
#[derive(Parser, Debug)]
#[command(
    version,
    about,
    long_about = "一款基于 LSB (最低有效位) 隐写术的命令行工具，用于在 24 位 BMP 图像中隐藏或恢复整个文件。\n不带子命令运行时进入交互模式。"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// 可用的子命令：encode (隐藏) 和 decode (恢复)。
#[derive(Parser, Debug)]
pub enum Commands {
    /// 将秘密文件 (.txt, .c, .csv, .sh) 隐藏到 BMP 图像中。
    Encode(EncodeArgs),

    /// 从经过隐写的 BMP 图像中恢复秘密文件。
    Decode(DecodeArgs),
}

/// 'encode' 命令所需的参数。
#[derive(Parser, Debug, Clone)]
pub struct EncodeArgs {
    /// 用作载体的 BMP 图像路径。
    #[arg(short, long)]
    pub image: PathBuf,

    /// 要隐藏的秘密文件路径。
    #[arg(short, long)]
    pub secret: PathBuf,

    /// 隐写图像的输出路径 (必须以 .bmp 结尾)，默认为载体所在目录下的 default.bmp。
    #[arg(short = 'o', long)]
    pub dest: Option<PathBuf>,

    /// 覆盖已存在的输出文件。
    #[arg(short, long)]
    pub force: bool,
}

/// 'decode' 命令所需的参数。
#[derive(Parser, Debug, Clone)]
pub struct DecodeArgs {
    /// 已隐藏文件的 BMP 图像路径。
    #[arg(short, long)]
    pub image: PathBuf,

    /// 输出文件名，扩展名会被替换为隐藏文件原来的扩展名。
    #[arg(short, long)]
    pub output: PathBuf,

    /// 覆盖已存在的输出文件。
    #[arg(short, long)]
    pub force: bool,
}
