//! # 交互模式
//!
//! 不带子命令运行时，逐项询问操作模式和文件路径。
//! 文件名校验失败时重新询问，最多 [`MAX_PROMPT_ATTEMPTS`] 次。

use crate::cli::{DecodeArgs, EncodeArgs};
use crate::constants::MAX_PROMPT_ATTEMPTS;
use crate::error::StegoError;
use crate::handler::{handle_decode, handle_encode};
use crate::validation::{read_and_validate_decode, read_and_validate_encode};
use anyhow::{Result, bail};
use colored::Colorize;
use dialoguer::{Input, Select};
use std::path::PathBuf;

/// 用户在交互模式中填写完毕的一次操作。
#[derive(Debug, Clone)]
pub enum Request {
    Encode(EncodeArgs),
    Decode(DecodeArgs),
}

impl Request {
    /// 只检查文件名，不做任何 I/O。
    pub fn validate(&self) -> std::result::Result<(), StegoError> {
        match self {
            Self::Encode(args) => {
                read_and_validate_encode(&args.image, &args.secret, args.dest.as_deref())
                    .map(drop)
            }
            Self::Decode(args) => read_and_validate_decode(&args.image, &args.output).map(drop),
        }
    }

    pub fn run(self) -> Result<()> {
        match self {
            Self::Encode(args) => handle_encode(args).map(drop),
            Self::Decode(args) => handle_decode(args).map(drop),
        }
    }
}

/// 运行交互模式：反复询问直到文件名有效或用尽尝试次数，然后执行一次操作。
///
/// 操作本身的失败 (包括隐写图像损坏) 不会触发重新询问。
pub fn run_interactive() -> Result<()> {
    let request = with_retries(MAX_PROMPT_ATTEMPTS, |attempt| {
        if attempt > 1 {
            println!("Please re-enter the details:");
        }
        let request = prompt_request()?;
        request.validate()?;
        Ok(request)
    })?;
    request.run()
}

/// 反复执行 `attempt`，仅当错误是输入无效 (文件名不在允许列表中) 时才重试。
pub fn with_retries<T>(
    max_attempts: usize,
    mut attempt: impl FnMut(usize) -> Result<T>,
) -> Result<T> {
    for n in 1..=max_attempts {
        match attempt(n) {
            Ok(value) => return Ok(value),
            Err(err) if is_invalid_input(&err) => {
                eprintln!("{} {err:#}", "Invalid input:".yellow().bold());
            }
            Err(err) => return Err(err),
        }
    }
    bail!("Giving up after {max_attempts} invalid attempts.")
}

fn is_invalid_input(err: &anyhow::Error) -> bool {
    matches!(
        err.downcast_ref::<StegoError>(),
        Some(StegoError::InvalidExtension { .. })
    )
}

fn prompt_request() -> Result<Request> {
    let mode = Select::new()
        .with_prompt("Mode")
        .items(&["encode", "decode"])
        .default(0)
        .interact()?;

    let image: String = Input::new()
        .with_prompt("Source image file name (.bmp)")
        .interact_text()?;

    if mode == 0 {
        let secret: String = Input::new()
            .with_prompt("Secret file name (.txt, .c, .csv, .sh)")
            .interact_text()?;
        let dest: String = Input::new()
            .with_prompt("Output image file name (empty for default.bmp)")
            .allow_empty(true)
            .interact_text()?;

        Ok(Request::Encode(EncodeArgs {
            image: PathBuf::from(image),
            secret: PathBuf::from(secret),
            dest: (!dest.trim().is_empty()).then(|| PathBuf::from(dest.trim())),
            force: false,
        }))
    } else {
        let output: String = Input::new()
            .with_prompt("Output file name")
            .interact_text()?;

        Ok(Request::Decode(DecodeArgs {
            image: PathBuf::from(image),
            output: PathBuf::from(output),
            force: false,
        }))
    }
}
