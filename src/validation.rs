//! # 校验与容量模块
//!
//! 在任何文件被打开或写入之前，检查文件扩展名是否在允许列表中，
//! 并根据 BMP 头部中的尺寸计算载体容量。

use crate::constants::{
    ALLOWED_SECRET_EXTENSIONS, BITS_PER_BYTE, BMP_HEADER_SIZE, BMP_HEIGHT_OFFSET,
    BMP_WIDTH_OFFSET, BYTES_PER_PIXEL, CARRIER_EXTENSION, DEFAULT_STEGO_NAME, MAGIC_MARKER,
    MAX_EXTENSION_LEN,
};
use crate::error::{Result, StegoError};
use std::fmt;
use std::io::Read;
use std::path::{Path, PathBuf};

/// 经过允许列表校验的秘密文件扩展名，包含前导 '.'，统一为小写。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecretExtension(String);

impl SecretExtension {
    /// 校验形如 `.txt` 的扩展名。
    ///
    /// # Errors
    ///
    /// 扩展名过长或不在 [`ALLOWED_SECRET_EXTENSIONS`] 中时返回 [`StegoError::InvalidExtension`]。
    pub fn parse(extension: &str) -> Result<Self> {
        let invalid = || StegoError::InvalidExtension {
            name: extension.to_owned(),
        };

        if extension.len() > MAX_EXTENSION_LEN {
            return Err(invalid());
        }

        let lowered = extension.to_ascii_lowercase();
        if ALLOWED_SECRET_EXTENSIONS.contains(&lowered.as_str()) {
            Ok(Self(lowered))
        } else {
            Err(invalid())
        }
    }

    /// 从文件路径中取出扩展名并校验。没有扩展名同样视为无效。
    pub fn from_path(path: &Path) -> Result<Self> {
        let extension = dotted_extension(path).ok_or_else(|| StegoError::InvalidExtension {
            name: path.to_string_lossy().into_owned(),
        })?;
        Self::parse(&extension)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// 去掉前导 '.' 的形式，供 [`Path::with_extension`] 使用。
    pub fn without_dot(&self) -> &str {
        self.0.trim_start_matches('.')
    }
}

impl fmt::Display for SecretExtension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn dotted_extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| format!(".{ext}"))
}

/// 检查载体或隐写图像的文件名是否以 `.bmp` 结尾 (不区分大小写)。
pub fn validate_carrier_path(path: &Path) -> Result<()> {
    match dotted_extension(path) {
        Some(ext) if ext.eq_ignore_ascii_case(CARRIER_EXTENSION) => Ok(()),
        _ => Err(StegoError::InvalidExtension {
            name: path.to_string_lossy().into_owned(),
        }),
    }
}

/// 'encode' 操作校验通过后的路径集合。
#[derive(Debug, Clone)]
pub struct EncodePaths {
    pub carrier: PathBuf,
    pub secret: PathBuf,
    pub extension: SecretExtension,
    pub stego: PathBuf,
}

/// 校验 'encode' 操作涉及的所有文件名。此函数不做任何 I/O。
///
/// 未提供输出路径时，使用载体所在目录下的 [`DEFAULT_STEGO_NAME`]。
pub fn read_and_validate_encode(
    carrier: &Path,
    secret: &Path,
    dest: Option<&Path>,
) -> Result<EncodePaths> {
    validate_carrier_path(carrier)?;
    let extension = SecretExtension::from_path(secret)?;

    let stego = match dest {
        Some(dest) => {
            validate_carrier_path(dest)?;
            dest.to_path_buf()
        }
        None => carrier.with_file_name(DEFAULT_STEGO_NAME),
    };

    Ok(EncodePaths {
        carrier: carrier.to_path_buf(),
        secret: secret.to_path_buf(),
        extension,
        stego,
    })
}

/// 'decode' 操作校验通过后的路径集合。
#[derive(Debug, Clone)]
pub struct DecodePaths {
    pub stego: PathBuf,
    pub output_hint: PathBuf,
}

/// 校验 'decode' 操作涉及的文件名。
///
/// 输出名只是一个提示，其扩展名会被恢复出的扩展名替换。
/// 不带扩展名的提示被接受；带扩展名时必须在同一个允许列表中。
pub fn read_and_validate_decode(stego: &Path, output_hint: &Path) -> Result<DecodePaths> {
    validate_carrier_path(stego)?;
    if output_hint.extension().is_some() {
        SecretExtension::from_path(output_hint)?;
    }

    Ok(DecodePaths {
        stego: stego.to_path_buf(),
        output_hint: output_hint.to_path_buf(),
    })
}

/// 原样保存的 54 字节 BMP 头部。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CarrierHeader {
    raw: [u8; BMP_HEADER_SIZE],
}

impl CarrierHeader {
    /// # Errors
    ///
    /// `bytes` 不足 54 字节时返回 [`StegoError::TruncatedHeader`]。
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        let raw: [u8; BMP_HEADER_SIZE] = bytes
            .get(..BMP_HEADER_SIZE)
            .and_then(|head| head.try_into().ok())
            .ok_or(StegoError::TruncatedHeader { len: bytes.len() })?;
        Ok(Self { raw })
    }

    /// 从流中读取头部，最多消耗 54 字节。
    pub fn read_from<R: Read>(reader: &mut R) -> Result<Self> {
        let mut head = Vec::with_capacity(BMP_HEADER_SIZE);
        reader
            .take(BMP_HEADER_SIZE as u64)
            .read_to_end(&mut head)?;
        Self::parse(&head)
    }

    pub fn as_bytes(&self) -> &[u8; BMP_HEADER_SIZE] {
        &self.raw
    }

    pub fn width(&self) -> u32 {
        self.le_u32(BMP_WIDTH_OFFSET)
    }

    /// 高度的绝对值。负高度表示自上而下存储的位图，像素数量不变。
    pub fn height(&self) -> u32 {
        (self.le_u32(BMP_HEIGHT_OFFSET) as i32).unsigned_abs()
    }

    /// 像素数据区的字节数：`width * height * 3`，不考虑行对齐。
    pub fn pixel_capacity(&self) -> u64 {
        u64::from(self.width()) * u64::from(self.height()) * BYTES_PER_PIXEL
    }

    fn le_u32(&self, offset: usize) -> u32 {
        let mut field = [0u8; 4];
        field.copy_from_slice(&self.raw[offset..offset + 4]);
        u32::from_le_bytes(field)
    }
}

/// 隐藏指定长度的扩展名和秘密数据所需的载体字节数 (含头部)。
///
/// 每个嵌入字节占用 8 个载体字节，每个 32 位字段占用 32 个。
pub fn required_bytes(extension_len: usize, payload_len: usize) -> u64 {
    let embedded = (MAGIC_MARKER.len() + 4 + extension_len + 4) as u64 + payload_len as u64;
    BMP_HEADER_SIZE as u64 + BITS_PER_BYTE as u64 * embedded
}

/// 一次容量检查的结果。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capacity {
    pub required: u64,
    pub available: u64,
}

/// 在写入任何数据之前检查载体是否足够大。等于边界时视为足够。
pub fn check_capacity(
    header: &CarrierHeader,
    extension: &SecretExtension,
    payload_len: usize,
) -> Result<Capacity> {
    if u32::try_from(payload_len).is_err() {
        return Err(StegoError::PayloadTooLarge { len: payload_len });
    }

    let capacity = Capacity {
        required: required_bytes(extension.len(), payload_len),
        available: header.pixel_capacity(),
    };
    log::info!(
        "carrier {}x{}: {} bytes required, {} available",
        header.width(),
        header.height(),
        capacity.required,
        capacity.available
    );

    if capacity.available < capacity.required {
        return Err(StegoError::InsufficientCapacity {
            required: capacity.required,
            available: capacity.available,
        });
    }
    Ok(capacity)
}
