//! # 命令处理逻辑模块
//!
//! 包含处理 `encode` 和 `decode` 子命令的高级业务逻辑。
//! 本模块负责协调文件 I/O、调用隐藏/恢复流水线以及向用户报告结果。

use crate::cli::{DecodeArgs, EncodeArgs};
use crate::embed::Embedder;
use crate::extract::Extractor;
use crate::validation::{
    CarrierHeader, check_capacity, read_and_validate_decode, read_and_validate_encode,
};
use anyhow::{Context, Result};
use colored::Colorize;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

/// 处理 'Encode' 命令的执行逻辑。
///
/// 先校验所有文件名，再读取载体头部和秘密文件并检查容量，
/// 最后才创建输出文件并以流的方式写入隐写图像。
///
/// # Arguments
///
/// * `args` - 包含输入/输出路径的 `EncodeArgs` 结构体。
///
/// # Errors
///
/// 如果发生以下任一情况，将返回错误：
/// * 文件扩展名不在允许列表中。
/// * 输出路径与载体是同一个文件 (无论是否指定 `--force`)。
/// * 输出文件已存在且未指定 `--force`。
/// * 无法读取载体图像或秘密文件。
/// * 载体图像没有足够的空间来隐藏秘密文件。
/// * 写入隐写图像失败 (此时不完整的输出文件会被删除)。
pub fn handle_encode(args: EncodeArgs) -> Result<PathBuf> {
    let paths = read_and_validate_encode(&args.image, &args.secret, args.dest.as_deref())?;
    anyhow::ensure!(
        !is_same_file(&paths.carrier, &paths.stego),
        "Output image is the same file as the carrier: {}. \nChoose a different output path.",
        paths.stego.to_string_lossy().red().bold()
    );
    ensure_writable(&paths.stego, args.force)?;

    let carrier = File::open(&paths.carrier).with_context(|| {
        format!(
            "Unable to read image file: {}",
            paths.carrier.to_string_lossy().red().bold()
        )
    })?;
    let mut carrier = BufReader::new(carrier);

    let secret = fs::read(&paths.secret).with_context(|| {
        format!(
            "Unable to read secret file: {}",
            paths.secret.to_string_lossy().red().bold()
        )
    })?;

    let header = CarrierHeader::read_from(&mut carrier).with_context(|| {
        format!(
            "Unable to read bitmap header of: {}",
            paths.carrier.to_string_lossy().red().bold()
        )
    })?;
    check_capacity(&header, &paths.extension, secret.len())?;

    let output = File::create(&paths.stego).with_context(|| {
        format!(
            "Unable to create target image file: {}",
            paths.stego.to_string_lossy().red().bold()
        )
    })?;

    let embedded = Embedder::from_parts(header, carrier, BufWriter::new(output))
        .embed(&paths.extension, &secret);
    if let Err(err) = embedded {
        discard_partial(&paths.stego);
        return Err(err).with_context(|| {
            format!(
                "Failed to hide {} in {}. \nThe image file may be truncated or write-protected.",
                paths.secret.to_string_lossy().red().bold(),
                paths.carrier.to_string_lossy().red().bold()
            )
        });
    }

    log::info!(
        "hid {} bytes ({}) in {}",
        secret.len(),
        paths.extension,
        paths.stego.display()
    );
    println!(
        "The secret file has been successfully hidden and saved: {}",
        paths.stego.to_string_lossy().green().bold()
    );

    Ok(paths.stego)
}

/// 处理 'Decode' 命令的执行逻辑。
///
/// 先恢复元数据，用其中的扩展名确定输出文件名，然后再创建输出文件并写入恢复的数据。
///
/// # Arguments
///
/// * `args` - 包含隐写图像路径和输出名提示的 `DecodeArgs` 结构体。
///
/// # Errors
///
/// 如果发生以下任一情况，将返回错误：
/// * 文件扩展名不在允许列表中。
/// * 无法读取隐写图像。
/// * 图像中没有隐藏数据，或者数据已损坏。
/// * 输出文件已存在且未指定 `--force`。
/// * 无法写入输出文件 (此时不完整的输出文件会被删除)。
pub fn handle_decode(args: DecodeArgs) -> Result<PathBuf> {
    let paths = read_and_validate_decode(&args.image, &args.output)?;

    let stego = File::open(&paths.stego).with_context(|| {
        format!(
            "Unable to read image file: {}",
            paths.stego.to_string_lossy().red().bold()
        )
    })?;

    let (metadata, payload) = Extractor::new(BufReader::new(stego))
        .read_metadata()
        .with_context(|| {
            format!(
                "Failed to recover hidden data from '{}'. \nThe image may not contain a hidden file or is corrupted.",
                paths.stego.to_string_lossy().red().bold()
            )
        })?;

    let output_path = metadata.output_path(&paths.output_hint);
    ensure_writable(&output_path, args.force)?;

    let output = File::create(&output_path).with_context(|| {
        format!(
            "Unable to write to target file: {}",
            output_path.to_string_lossy().red().bold()
        )
    })?;
    let mut output = BufWriter::new(output);

    let copied = payload.copy_to(&mut output);
    drop(output);
    let written = match copied {
        Ok(written) => written,
        Err(err) => {
            discard_partial(&output_path);
            return Err(err).with_context(|| {
                format!(
                    "Failed to recover {} bytes of hidden data. \nThe image appears to be truncated.",
                    metadata.payload_len.to_string().red().bold()
                )
            });
        }
    };

    log::info!("recovered {written} bytes into {}", output_path.display());
    println!(
        "The secret file has been successfully recovered and saved: {}",
        output_path.to_string_lossy().green().bold()
    );

    Ok(output_path)
}

/// 输出文件已存在时，除非指定了 `--force`，否则拒绝覆盖。
fn ensure_writable(path: &Path, force: bool) -> Result<()> {
    anyhow::ensure!(
        force || !path.exists(),
        "Output file already exists: {}. \nUse --force to overwrite it.",
        path.to_string_lossy().red().bold()
    );
    Ok(())
}

/// 两个路径是否指向同一个已存在的文件。创建输出文件会截断载体，因此必须在此之前检查。
fn is_same_file(a: &Path, b: &Path) -> bool {
    match (fs::canonicalize(a), fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

/// 删除失败操作留下的不完整输出，避免被误用为恢复的输入。
fn discard_partial(path: &Path) {
    match fs::remove_file(path) {
        Ok(()) => log::warn!("discarded partial output {}", path.display()),
        Err(err) => log::warn!(
            "could not remove partial output {}: {err}",
            path.display()
        ),
    }
}
