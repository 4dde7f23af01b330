use std::io::{Read, Write};
use flate2::{Compression, write::GzEncoder, read::GzDecoder};
use thiserror::Error;

/// 魔数 - 标识文章索引文件
pub const MAGIC_BYTES: &[u8] = b"TGIDX";

/// 头部长度：魔数 + 版本号(2字节) + 原始大小(4字节)
pub const HEADER_LEN: usize = MAGIC_BYTES.len() + 2 + 4;

/// 解压前预分配容量相对压缩数据长度的最大倍数
const MAX_PREALLOC_RATIO: usize = 16;

/// 索引编解码错误
#[derive(Debug, Error)]
pub enum IndexError {
    #[error("数据太短，无法解析: {0} 字节")]
    Truncated(usize),
    #[error("无效的文件格式：魔数不匹配")]
    BadMagic,
    #[error("不支持的版本: {major}.{minor}")]
    UnsupportedVersion { major: u8, minor: u8 },
    #[error("解压后数据大小不匹配: 期望 {expected} 字节, 实际 {actual} 字节")]
    SizeMismatch { expected: usize, actual: usize },
    #[error("数据过大，无法写入头部: {0} 字节")]
    TooLarge(usize),
    #[error("压缩或解压失败: {0}")]
    Io(#[from] std::io::Error),
    #[error("序列化失败: {0}")]
    Encode(#[from] bincode::error::EncodeError),
    #[error("反序列化失败: {0}")]
    Decode(#[from] bincode::error::DecodeError),
}

/// 索引文件头
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    pub version: [u8; 2],
    pub original_size: u32,
}

/// 将对象序列化为二进制格式
pub fn to_binary<T: serde::Serialize>(obj: &T) -> Result<Vec<u8>, IndexError> {
    Ok(bincode::serde::encode_to_vec(obj, bincode::config::standard())?)
}

/// 从二进制格式反序列化对象
pub fn from_binary<T: serde::de::DeserializeOwned>(data: &[u8]) -> Result<T, IndexError> {
    let (value, _) = bincode::serde::decode_from_slice(data, bincode::config::standard())?;
    Ok(value)
}

/// 序列化并压缩，写入魔数、版本号和原始大小
pub fn to_compressed<T: serde::Serialize>(obj: &T, version: [u8; 2]) -> Result<Vec<u8>, IndexError> {
    let binary = to_binary(obj)?;
    let original_size = u32::try_from(binary.len()).map_err(|_| IndexError::TooLarge(binary.len()))?;

    let mut output = Vec::with_capacity(HEADER_LEN + binary.len() / 2);
    output.extend_from_slice(MAGIC_BYTES);
    output.extend_from_slice(&version);
    output.extend_from_slice(&original_size.to_le_bytes());

    let mut encoder = GzEncoder::new(output, Compression::best());
    encoder.write_all(&binary)?;
    Ok(encoder.finish()?)
}

/// 解析并校验文件头，主版本号不得超过 `max_major`
pub fn read_header(data: &[u8], max_major: u8) -> Result<Header, IndexError> {
    if data.len() < HEADER_LEN {
        return Err(IndexError::Truncated(data.len()));
    }
    if &data[..MAGIC_BYTES.len()] != MAGIC_BYTES {
        return Err(IndexError::BadMagic);
    }

    let version_offset = MAGIC_BYTES.len();
    let version = [data[version_offset], data[version_offset + 1]];
    if version[0] > max_major {
        return Err(IndexError::UnsupportedVersion { major: version[0], minor: version[1] });
    }

    let size_offset = version_offset + 2;
    let mut size_bytes = [0u8; 4];
    size_bytes.copy_from_slice(&data[size_offset..HEADER_LEN]);

    Ok(Header {
        version,
        original_size: u32::from_le_bytes(size_bytes),
    })
}

/// 解压并反序列化，允许指定支持的最大主版本号
pub fn from_compressed<T: serde::de::DeserializeOwned>(data: &[u8], max_major: u8) -> Result<T, IndexError> {
    let header = read_header(data, max_major)?;
    let expected = header.original_size as usize;

    // 头部大小不可信，预分配按压缩数据长度封顶，解压最多多读1字节用于判断超长
    let payload = &data[HEADER_LEN..];
    let mut decompressed = Vec::with_capacity(expected.min(payload.len().saturating_mul(MAX_PREALLOC_RATIO)));
    GzDecoder::new(payload)
        .take(expected as u64 + 1)
        .read_to_end(&mut decompressed)?;

    if decompressed.len() != expected {
        return Err(IndexError::SizeMismatch { expected, actual: decompressed.len() });
    }

    from_binary(&decompressed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compressed_payload_decodes_back() {
        let tags = vec!["Python".to_string(), "System Design".to_string()];
        let data = to_compressed(&tags, [1, 0]).unwrap();
        assert_eq!(&data[..MAGIC_BYTES.len()], MAGIC_BYTES);

        let decoded: Vec<String> = from_compressed(&data, 1).unwrap();
        assert_eq!(decoded, tags);
    }

    #[test]
    fn rejects_short_input() {
        let err = from_compressed::<Vec<String>>(b"TGI", 1).unwrap_err();
        assert!(matches!(err, IndexError::Truncated(3)));
    }

    #[test]
    fn rejects_foreign_magic() {
        let mut data = to_compressed(&1u32, [1, 0]).unwrap();
        data[0] = b'X';
        assert!(matches!(read_header(&data, 1), Err(IndexError::BadMagic)));
    }

    #[test]
    fn rejects_newer_major_version() {
        let data = to_compressed(&1u32, [2, 3]).unwrap();
        let err = read_header(&data, 1).unwrap_err();
        assert!(matches!(err, IndexError::UnsupportedVersion { major: 2, minor: 3 }));
        assert_eq!(read_header(&data, 2).unwrap().version, [2, 3]);
    }

    #[test]
    fn oversized_header_length_is_an_error() {
        let mut data = to_compressed(&"hello".to_string(), [1, 0]).unwrap();
        let size_offset = MAGIC_BYTES.len() + 2;
        data[size_offset..HEADER_LEN].copy_from_slice(&u32::MAX.to_le_bytes());
        let err = from_compressed::<String>(&data, 1).unwrap_err();
        assert!(matches!(err, IndexError::SizeMismatch { expected, .. } if expected == u32::MAX as usize));
    }

    #[test]
    fn payload_longer_than_header_is_an_error() {
        let mut data = to_compressed(&"hello world".to_string(), [1, 0]).unwrap();
        let size_offset = MAGIC_BYTES.len() + 2;
        data[size_offset..HEADER_LEN].copy_from_slice(&2u32.to_le_bytes());
        let err = from_compressed::<String>(&data, 1).unwrap_err();
        assert!(matches!(err, IndexError::SizeMismatch { expected: 2, actual: 3 }));
    }

    #[test]
    fn detects_size_mismatch() {
        let mut data = to_compressed(&"hello".to_string(), [1, 0]).unwrap();
        let size_offset = MAGIC_BYTES.len() + 2;
        data[size_offset] = data[size_offset].wrapping_add(1);
        let err = from_compressed::<String>(&data, 1).unwrap_err();
        assert!(matches!(err, IndexError::SizeMismatch { .. }));
    }
}
