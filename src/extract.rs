//! # 恢复流水线
//!
//! 与隐藏流水线对称：跳过头部 → 校验魔数 → 扩展名长度 → 扩展名 → 数据长度 → 数据。
//! 魔数不匹配时立即失败，不再解析后续字段。

use crate::constants::{BITS_PER_BYTE, INT_FIELD_BYTES, MAGIC_MARKER, MAX_EXTENSION_LEN};
use crate::error::{Result, StegoError};
use crate::steganography::{unpack_byte, unpack_u32};
use crate::validation::{CarrierHeader, SecretExtension};
use std::fmt;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

/// 解码出的数据按块写入输出，块大小与格式无关。
const OUTPUT_CHUNK_SIZE: usize = 1024;

/// 恢复流水线的阶段，只能向前推进。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractStage {
    Init,
    HeaderSkipped,
    MagicVerified,
    ExtnSizeRead,
    ExtnRead,
    PayloadSizeRead,
    PayloadRead,
    Done,
}

impl fmt::Display for ExtractStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Init => "init",
            Self::HeaderSkipped => "header skipped",
            Self::MagicVerified => "magic marker verified",
            Self::ExtnSizeRead => "extension length read",
            Self::ExtnRead => "extension read",
            Self::PayloadSizeRead => "payload length read",
            Self::PayloadRead => "payload read",
            Self::Done => "done",
        };
        f.write_str(name)
    }
}

/// 隐写图像中记录的元数据。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Metadata {
    pub extension: SecretExtension,
    pub payload_len: u32,
}

impl Metadata {
    /// 用恢复出的扩展名替换输出名提示中的扩展名，例如 `out` → `out.txt`。
    pub fn output_path(&self, hint: &Path) -> PathBuf {
        output_path(hint, &self.extension)
    }
}

pub fn output_path(hint: &Path, extension: &SecretExtension) -> PathBuf {
    hint.with_extension(extension.without_dot())
}

/// 从隐写流中读取元数据和秘密数据。
pub struct Extractor<R> {
    stego: R,
    stage: ExtractStage,
}

impl<R: Read> Extractor<R> {
    pub fn new(stego: R) -> Self {
        Self {
            stego,
            stage: ExtractStage::Init,
        }
    }

    pub fn stage(&self) -> ExtractStage {
        self.stage
    }

    /// 读取数据之前的所有字段。
    ///
    /// 返回的 [`PayloadReader`] 用于在确定输出文件名之后再读取数据本身。
    ///
    /// # Errors
    ///
    /// * [`StegoError::NotAStegoImage`]：魔数不匹配 (或图像短到放不下头部和魔数)。
    /// * [`StegoError::ExtensionTooLong`] / [`StegoError::ExtensionLengthMismatch`] /
    ///   [`StegoError::InvalidExtension`]：扩展名字段损坏。
    /// * [`StegoError::TruncatedStegoImage`]：某个字段读到一半流就结束了。
    pub fn read_metadata(mut self) -> Result<(Metadata, PayloadReader<R>)> {
        CarrierHeader::read_from(&mut self.stego).map_err(|err| match err {
            StegoError::TruncatedHeader { .. } => StegoError::NotAStegoImage,
            other => other,
        })?;
        self.advance(ExtractStage::HeaderSkipped);

        self.verify_magic()?;
        self.advance(ExtractStage::MagicVerified);

        let declared = self.read_u32("extension length")?;
        self.advance(ExtractStage::ExtnSizeRead);

        let extension = self.read_extension(declared)?;
        log::info!("hidden file extension: {extension}");
        self.advance(ExtractStage::ExtnRead);

        let payload_len = self.read_u32("payload length")?;
        log::info!("hidden payload length: {payload_len} bytes");
        self.advance(ExtractStage::PayloadSizeRead);

        let metadata = Metadata {
            extension,
            payload_len,
        };
        let reader = PayloadReader {
            extractor: self,
            remaining: payload_len,
        };
        Ok((metadata, reader))
    }

    fn verify_magic(&mut self) -> Result<()> {
        let marker = (0..MAGIC_MARKER.len())
            .map(|_| self.read_byte("magic marker"))
            .collect::<Result<Vec<u8>>>()
            .map_err(|err| match err {
                StegoError::TruncatedStegoImage { .. } => StegoError::NotAStegoImage,
                other => other,
            })?;

        if marker.as_slice() == MAGIC_MARKER.as_slice() {
            Ok(())
        } else {
            Err(StegoError::NotAStegoImage)
        }
    }

    fn read_extension(&mut self, declared: u32) -> Result<SecretExtension> {
        let len = declared as usize;
        if len > MAX_EXTENSION_LEN {
            return Err(StegoError::ExtensionTooLong {
                declared,
                max: MAX_EXTENSION_LEN,
            });
        }

        let bytes = (0..len)
            .map(|_| self.read_byte("extension"))
            .collect::<Result<Vec<u8>>>()?;

        if let Some(actual) = bytes.iter().position(|&b| b == 0) {
            return Err(StegoError::ExtensionLengthMismatch { declared, actual });
        }

        let text = String::from_utf8(bytes).map_err(|err| StegoError::InvalidExtension {
            name: String::from_utf8_lossy(err.as_bytes()).into_owned(),
        })?;
        SecretExtension::parse(&text)
    }

    fn read_byte(&mut self, field: &'static str) -> Result<u8> {
        let mut chunk = [0u8; BITS_PER_BYTE];
        self.fill(&mut chunk, field)?;
        Ok(unpack_byte(&chunk))
    }

    fn read_u32(&mut self, field: &'static str) -> Result<u32> {
        let mut chunk = [0u8; INT_FIELD_BYTES];
        self.fill(&mut chunk, field)?;
        Ok(unpack_u32(&chunk))
    }

    fn fill(&mut self, buf: &mut [u8], field: &'static str) -> Result<()> {
        self.stego.read_exact(buf).map_err(|err| match err.kind() {
            io::ErrorKind::UnexpectedEof => StegoError::TruncatedStegoImage { stage: field },
            _ => StegoError::Io(err),
        })
    }

    fn advance(&mut self, next: ExtractStage) {
        log::debug!("extract: {} -> {}", self.stage, next);
        self.stage = next;
    }
}

/// 元数据读取完毕后，负责读取恰好 `payload_len` 个数据字节。
pub struct PayloadReader<R> {
    extractor: Extractor<R>,
    remaining: u32,
}

impl<R: Read> PayloadReader<R> {
    /// 把解码出的数据原样写入 `out`，返回写入的字节数。
    ///
    /// # Errors
    ///
    /// 隐写图像在读满声明长度之前结束时返回 [`StegoError::TruncatedStegoImage`]。
    pub fn copy_to<W: Write>(mut self, out: &mut W) -> Result<u64> {
        let total = u64::from(self.remaining);
        let mut decoded = Vec::with_capacity(OUTPUT_CHUNK_SIZE);

        while self.remaining > 0 {
            decoded.push(self.extractor.read_byte("payload")?);
            self.remaining -= 1;
            if decoded.len() == OUTPUT_CHUNK_SIZE {
                out.write_all(&decoded)?;
                decoded.clear();
            }
        }
        out.write_all(&decoded)?;
        out.flush()?;
        self.extractor.advance(ExtractStage::PayloadRead);
        self.extractor.advance(ExtractStage::Done);
        Ok(total)
    }
}

/// 恢复结果：扩展名、按扩展名确定的输出路径和原始数据。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recovered {
    pub extension: SecretExtension,
    pub path: PathBuf,
    pub payload: Vec<u8>,
}

/// 在内存中完成一次恢复。
///
/// `output_hint` 的扩展名被替换为恢复出的扩展名，结果放在 [`Recovered::path`] 中；
/// 本函数不创建任何文件。
pub fn decode(stego: &[u8], output_hint: &Path) -> Result<Recovered> {
    let (metadata, reader) = Extractor::new(stego).read_metadata()?;
    let path = metadata.output_path(output_hint);
    let mut payload = Vec::new();
    reader.copy_to(&mut payload)?;
    Ok(Recovered {
        extension: metadata.extension,
        path,
        payload,
    })
}
