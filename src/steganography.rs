//! # LSB 打包/解包
//!
//! 将一个字节 (或一个 32 位整数) 按最高位优先的顺序写入连续 8 (或 32) 个
//! 载体字节的最低有效位，以及对应的逆操作。载体字节的其余 7 位从不读写。

use crate::constants::{BITS_PER_BYTE, INT_FIELD_BYTES};

/// 把 `value` 的 8 个 bit 写入 `carrier` 各字节的最低位，`value` 的第 7 位写入 `carrier[0]`。
pub fn pack_byte(value: u8, carrier: &mut [u8; BITS_PER_BYTE]) {
    pack_bits(u32::from(value), carrier);
}

/// 把 `value` 的 32 个 bit 按最高位优先写入 `carrier` 各字节的最低位。
pub fn pack_u32(value: u32, carrier: &mut [u8; INT_FIELD_BYTES]) {
    pack_bits(value, carrier);
}

/// [`pack_byte`] 的逆操作。
pub fn unpack_byte(carrier: &[u8; BITS_PER_BYTE]) -> u8 {
    unpack_bits(carrier) as u8
}

/// [`pack_u32`] 的逆操作。
pub fn unpack_u32(carrier: &[u8; INT_FIELD_BYTES]) -> u32 {
    unpack_bits(carrier)
}

fn pack_bits(value: u32, carrier: &mut [u8]) {
    let width = carrier.len();
    for (i, byte) in carrier.iter_mut().enumerate() {
        let bit = ((value >> (width - 1 - i)) & 1) as u8;
        *byte = (*byte & 0xFE) | bit;
    }
}

fn unpack_bits(carrier: &[u8]) -> u32 {
    carrier
        .iter()
        .fold(0u32, |acc, &byte| (acc << 1) | u32::from(byte & 1))
}
