//! # bmp_lsb_hide 库
//!
//! 本库包含 BMP LSB 隐写工具的核心逻辑：位打包、容量校验、隐藏与恢复流水线。

// 声明库包含的所有模块。

pub mod cli;
pub mod constants;
pub mod embed;
pub mod error;
pub mod extract;
pub mod handler;
pub mod interactive;
pub mod steganography;
pub mod validation;

pub use embed::encode;
pub use error::{Result, StegoError};
pub use extract::decode;
