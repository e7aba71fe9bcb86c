//! # 错误类型模块
//!
//! [`StegoError`] 同时用于隐藏与恢复两条流水线。

use std::io;
use thiserror::Error;

/// 隐写库统一使用的 `Result` 类型。
pub type Result<T> = std::result::Result<T, StegoError>;

#[derive(Error, Debug)]
pub enum StegoError {
    /// 文件名不在允许列表中。在打开任何文件之前检查。
    #[error("Invalid file extension: '{name}'")]
    InvalidExtension { name: String },

    /// 载体图像容量不足以容纳元数据和秘密数据。
    #[error("Not enough space in the image. Required: {required} bytes, Available: {available} bytes")]
    InsufficientCapacity { required: u64, available: u64 },

    /// 秘密数据超过 32 位长度字段所能表示的范围。
    #[error("Secret payload of {len} bytes does not fit a 32-bit length field")]
    PayloadTooLarge { len: usize },

    /// 载体比 BMP 头部还短。
    #[error("Carrier holds only {len} bytes, shorter than the bitmap header")]
    TruncatedHeader { len: usize },

    /// 魔数不匹配，输入不是本工具生成的隐写图像。
    #[error("No hidden data found: magic marker mismatch")]
    NotAStegoImage,

    /// 扩展名声明长度与实际解码出的字符串不一致。
    #[error("Extension length mismatch: declared {declared}, decoded {actual}")]
    ExtensionLengthMismatch { declared: u32, actual: usize },

    /// 扩展名声明长度超出上限。
    #[error("Declared extension length {declared} exceeds the limit of {max}")]
    ExtensionTooLong { declared: u32, max: usize },

    /// 隐写图像在读取某个字段时提前结束。
    #[error("Stego image ended early while reading {stage}")]
    TruncatedStegoImage { stage: &'static str },

    #[error(transparent)]
    Io(#[from] io::Error),
}
