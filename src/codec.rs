use std::io::{self, Write};

use byteorder::{LittleEndian, WriteBytesExt};
use flate2::Compression;
use flate2::write::GzEncoder;
use serde::Deserialize;

/// chunk 数据的传输编码
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChunkEncoding {
    /// 原始 u32 小端字节
    #[default]
    Raw,
    /// 小端字节再经 gzip 压缩
    Gzip,
}

/// 将逃逸时间序列化为 u32 小端字节
pub fn encode_values(values: &[u32]) -> io::Result<Vec<u8>> {
    let mut bytes = Vec::with_capacity(values.len() * std::mem::size_of::<u32>());
    for &value in values {
        bytes.write_u32::<LittleEndian>(value)?;
    }
    Ok(bytes)
}

/// 按指定编码生成 chunk 负载
pub fn encode_chunk(values: &[u32], encoding: ChunkEncoding) -> io::Result<Vec<u8>> {
    let bytes = encode_values(values)?;
    match encoding {
        ChunkEncoding::Raw => Ok(bytes),
        ChunkEncoding::Gzip => {
            let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
            encoder.write_all(&bytes)?;
            encoder.finish()
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Read;

    use byteorder::ReadBytesExt;
    use flate2::read::GzDecoder;

    use super::*;

    #[test]
    fn raw_payload_is_little_endian() {
        let bytes = encode_chunk(&[1, 0x0102_0304], ChunkEncoding::Raw).unwrap();
        assert_eq!(bytes, vec![1, 0, 0, 0, 4, 3, 2, 1]);
    }

    #[test]
    fn gzip_payload_decompresses_to_raw() {
        let values: Vec<u32> = (0..500).map(|v| v % 16).collect();
        let compressed = encode_chunk(&values, ChunkEncoding::Gzip).unwrap();
        assert!(compressed.len() < values.len() * 4);

        let mut raw = Vec::new();
        GzDecoder::new(compressed.as_slice())
            .read_to_end(&mut raw)
            .unwrap();
        let mut cursor = raw.as_slice();
        let decoded: Vec<u32> = (0..values.len())
            .map(|_| cursor.read_u32::<LittleEndian>().unwrap())
            .collect();
        assert_eq!(decoded, values);
    }

    #[test]
    fn encoding_parses_from_query_value() {
        let encoding: ChunkEncoding = serde_json::from_str("\"gzip\"").unwrap();
        assert_eq!(encoding, ChunkEncoding::Gzip);
    }
}
