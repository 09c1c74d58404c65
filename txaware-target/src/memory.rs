//! メモリアクセス機能

use crate::Result;

/// メモリから読み取り可能な型
pub trait MemoryReadable: Sized {
    /// リトルエンディアンのバイト配列から値を構築
    fn from_le_bytes(bytes: &[u8]) -> Result<Self>;

    /// 型のサイズ（バイト数）
    fn size() -> usize;
}

impl MemoryReadable for u32 {
    fn from_le_bytes(bytes: &[u8]) -> Result<Self> {
        let array: [u8; 4] = bytes.try_into()
            .map_err(|_| anyhow::anyhow!("Failed to convert {} bytes to u32 array (expected 4 bytes)", bytes.len()))?;
        Ok(u32::from_le_bytes(array))
    }

    fn size() -> usize { 4 }
}

impl MemoryReadable for u8 {
    fn from_le_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.is_empty() {
            return Err(anyhow::anyhow!("Cannot read u8 from empty bytes"));
        }
        Ok(bytes[0])
    }

    fn size() -> usize { 1 }
}

/// 停止中ターゲットのメモリ読み取り
///
/// 実装は `read` だけを提供すればよく、型付き読み取りはその上に組み立てられます。
/// 読み取り失敗は [`crate::AccessError`] を含むエラーとして返してください。
/// ターゲットは32bitリトルエンディアン（Cortex-M）を前提とします。
pub trait TargetMemory {
    /// メモリからデータを読み取る
    fn read(&self, addr: u64, size: usize) -> Result<Vec<u8>>;

    /// u32値を読み取る（リトルエンディアン）
    fn read_u32(&self, addr: u64) -> Result<u32> {
        read_typed(self, addr)
    }

    /// u8値を読み取る
    fn read_u8(&self, addr: u64) -> Result<u8> {
        read_typed(self, addr)
    }

    /// 1ワード（32bit）を読み取る
    fn read_word(&self, addr: u64) -> Result<u32> {
        self.read_u32(addr)
    }

    /// ポインタ値を読み取る
    ///
    /// ターゲットのポインタは32bitなので、ホスト側ではu64に拡張して扱います。
    fn read_pointer(&self, addr: u64) -> Result<u64> {
        Ok(u64::from(self.read_u32(addr)?))
    }

    /// NUL終端文字列を読み取る
    ///
    /// `max_len` バイトに達した場合はそこで打ち切ります。
    /// UTF-8として不正なバイトは置換文字になります。
    fn read_c_string(&self, addr: u64, max_len: usize) -> Result<String> {
        let mut bytes = Vec::new();
        for offset in 0..max_len as u64 {
            let byte = self.read_u8(addr + offset)?;
            if byte == 0 {
                break;
            }
            bytes.push(byte);
        }
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}

/// 型付き値を読み取る
///
/// `dyn TargetMemory` からも呼べるよう、トレイトの外に置いています。
fn read_typed<M, T>(memory: &M, addr: u64) -> Result<T>
where
    M: TargetMemory + ?Sized,
    T: MemoryReadable,
{
    let bytes = memory.read(addr, T::size())?;
    T::from_le_bytes(&bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemoryImage;

    #[test]
    fn test_read_typed_little_endian() {
        let mut image = MemoryImage::new();
        image.add_region(0x1000, vec![0x78, 0x56, 0x34, 0x12]).unwrap();

        assert_eq!(image.read_u32(0x1000).unwrap(), 0x1234_5678);
        assert_eq!(image.read_u8(0x1003).unwrap(), 0x12);
        assert_eq!(image.read_pointer(0x1000).unwrap(), 0x1234_5678);
        // 領域の終端をまたぐ読み取り
        assert!(image.read_u32(0x1002).is_err());
    }

    #[test]
    fn test_read_c_string() {
        let mut image = MemoryImage::new();
        image.add_region(0x1000, b"main thread\0garbage".to_vec()).unwrap();

        assert_eq!(image.read_c_string(0x1000, 64).unwrap(), "main thread");
        assert_eq!(image.read_c_string(0x1000, 4).unwrap(), "main");
    }

    #[test]
    fn test_read_c_string_unterminated_at_region_end() {
        let mut image = MemoryImage::new();
        image.add_region(0x1000, b"abc".to_vec()).unwrap();

        assert!(image.read_c_string(0x1000, 64).is_err());
    }
}
