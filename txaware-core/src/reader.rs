//! 制御ブロックの読み取り

use crate::{KernelLayout, Result};
use txaware_target::TargetMemory;

/// ターゲットメモリとレイアウトを束ね、制御ブロックのフィールドを読む
#[derive(Clone, Copy)]
pub struct ObjectReader<'a> {
    pub memory: &'a dyn TargetMemory,
    pub layout: &'a KernelLayout,
    /// オブジェクト名として読む最大バイト数
    pub max_name_len: usize,
}

impl<'a> ObjectReader<'a> {
    pub fn new(memory: &'a dyn TargetMemory, layout: &'a KernelLayout, max_name_len: usize) -> Self {
        Self {
            memory,
            layout,
            max_name_len,
        }
    }

    /// `base + offset` の32bitフィールドを読む
    pub fn field_u32(&self, base: u64, offset: u64) -> Result<u32> {
        self.memory.read_u32(base + offset)
    }

    /// `base + offset` のポインタフィールドを読む
    pub fn field_ptr(&self, base: u64, offset: u64) -> Result<u64> {
        self.memory.read_pointer(base + offset)
    }

    /// `CHAR *` フィールドが指す名前を読む（NULLなら空文字列）
    pub fn name_field(&self, base: u64, offset: u64) -> Result<String> {
        let ptr = self.field_ptr(base, offset)?;
        if ptr == 0 {
            return Ok(String::new());
        }
        self.memory.read_c_string(ptr, self.max_name_len)
    }

    /// スレッド制御ブロックの名前を読む
    pub fn thread_name(&self, thread: u64) -> Result<String> {
        self.name_field(thread, self.layout.thread.name)
    }

    /// 弱参照（所有者・待ち先頭）のスレッド名を読む
    ///
    /// NULLの場合は空文字列を返します。
    pub fn linked_thread_name(&self, thread: u64) -> Result<String> {
        if thread == 0 {
            return Ok(String::new());
        }
        self.thread_name(thread)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use txaware_target::MemoryImage;

    #[test]
    fn test_name_field_null_and_string() {
        let layout = KernelLayout::default();
        let mut image = MemoryImage::new();
        image.add_region(0x2000_0000, vec![0; 0x200]).unwrap();
        image.put_c_string(0x2000_0100, "idle").unwrap();
        image.put_u32(0x2000_0000 + layout.thread.name, 0x2000_0100).unwrap();

        let reader = ObjectReader::new(&image, &layout, 32);
        assert_eq!(reader.thread_name(0x2000_0000).unwrap(), "idle");
        assert_eq!(reader.linked_thread_name(0).unwrap(), "");
        // 名前ポインタがNULLのスレッド
        assert_eq!(reader.thread_name(0x2000_0080).unwrap(), "");
    }
}
