//! # 隐藏流水线
//!
//! 严格按顺序执行：复制头部 → 魔数 → 扩展名长度 → 扩展名 → 数据长度 → 数据 → 剩余像素。
//! 每一步都从载体流中消耗对应数量的字节，打包后写入输出流。任意一步失败都会终止整个操作，
//! 此时输出流中的内容不完整，不能作为恢复的输入。

use crate::constants::{BITS_PER_BYTE, INT_FIELD_BYTES, MAGIC_MARKER};
use crate::error::{Result, StegoError};
use crate::steganography::{pack_byte, pack_u32};
use crate::validation::{CarrierHeader, SecretExtension, check_capacity};
use std::fmt;
use std::io::{self, Read, Write};

/// 隐藏流水线的阶段，只能向前推进。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmbedStage {
    Init,
    HeaderCopied,
    MagicWritten,
    ExtnSizeWritten,
    ExtnWritten,
    PayloadSizeWritten,
    PayloadWritten,
    TailCopied,
    Done,
}

impl fmt::Display for EmbedStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Init => "init",
            Self::HeaderCopied => "header copied",
            Self::MagicWritten => "magic marker written",
            Self::ExtnSizeWritten => "extension length written",
            Self::ExtnWritten => "extension written",
            Self::PayloadSizeWritten => "payload length written",
            Self::PayloadWritten => "payload written",
            Self::TailCopied => "remaining pixels copied",
            Self::Done => "done",
        };
        f.write_str(name)
    }
}

/// 把秘密数据隐藏进载体流，结果写入隐写流。
///
/// 创建时只读取载体头部，不写任何数据；[`Embedder::embed`] 先检查容量，再开始写入。
pub struct Embedder<R, W> {
    carrier: R,
    stego: W,
    header: CarrierHeader,
    stage: EmbedStage,
}

impl<R: Read, W: Write> Embedder<R, W> {
    pub fn new(mut carrier: R, stego: W) -> Result<Self> {
        let header = CarrierHeader::read_from(&mut carrier)?;
        Ok(Self::from_parts(header, carrier, stego))
    }

    /// 头部已由调用方读出时使用，`carrier` 必须正好位于像素数据的起始位置。
    pub fn from_parts(header: CarrierHeader, carrier: R, stego: W) -> Self {
        Self {
            carrier,
            stego,
            header,
            stage: EmbedStage::Init,
        }
    }

    pub fn header(&self) -> &CarrierHeader {
        &self.header
    }

    pub fn stage(&self) -> EmbedStage {
        self.stage
    }

    /// 执行完整的隐藏流程，成功后返回输出流。
    ///
    /// # Errors
    ///
    /// * [`StegoError::InsufficientCapacity`] / [`StegoError::PayloadTooLarge`]：在写入任何数据之前返回。
    /// * [`StegoError::Io`]：读取载体或写入输出失败，包括载体实际长度小于头部声明的尺寸。
    pub fn embed(mut self, extension: &SecretExtension, payload: &[u8]) -> Result<W> {
        check_capacity(&self.header, extension, payload.len())?;
        let payload_len = u32::try_from(payload.len())
            .map_err(|_| StegoError::PayloadTooLarge { len: payload.len() })?;
        let extension_len = u32::try_from(extension.len()).map_err(|_| {
            StegoError::InvalidExtension {
                name: extension.to_string(),
            }
        })?;

        self.stego.write_all(self.header.as_bytes())?;
        self.advance(EmbedStage::HeaderCopied);

        self.embed_bytes(MAGIC_MARKER)?;
        self.advance(EmbedStage::MagicWritten);

        self.embed_u32(extension_len)?;
        self.advance(EmbedStage::ExtnSizeWritten);

        self.embed_bytes(extension.as_bytes())?;
        self.advance(EmbedStage::ExtnWritten);

        self.embed_u32(payload_len)?;
        self.advance(EmbedStage::PayloadSizeWritten);

        self.embed_bytes(payload)?;
        self.advance(EmbedStage::PayloadWritten);

        let tail = io::copy(&mut self.carrier, &mut self.stego)?;
        log::debug!("copied {tail} untouched carrier bytes");
        self.advance(EmbedStage::TailCopied);

        self.stego.flush()?;
        self.advance(EmbedStage::Done);
        Ok(self.stego)
    }

    fn embed_bytes(&mut self, values: &[u8]) -> Result<()> {
        let mut chunk = [0u8; BITS_PER_BYTE];
        for &value in values {
            self.carrier.read_exact(&mut chunk)?;
            pack_byte(value, &mut chunk);
            self.stego.write_all(&chunk)?;
        }
        Ok(())
    }

    fn embed_u32(&mut self, value: u32) -> Result<()> {
        let mut chunk = [0u8; INT_FIELD_BYTES];
        self.carrier.read_exact(&mut chunk)?;
        pack_u32(value, &mut chunk);
        self.stego.write_all(&chunk)?;
        Ok(())
    }

    fn advance(&mut self, next: EmbedStage) {
        log::debug!("embed: {} -> {}", self.stage, next);
        self.stage = next;
    }
}

/// 在内存中完成一次隐藏，返回完整的隐写图像字节。
pub fn encode(carrier: &[u8], payload: &[u8], extension: &SecretExtension) -> Result<Vec<u8>> {
    let stego = Vec::with_capacity(carrier.len());
    Embedder::new(carrier, stego)?.embed(extension, payload)
}
