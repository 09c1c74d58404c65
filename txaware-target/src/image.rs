//! メモリダンプによる停止中ターゲットのスナップショット

use crate::{AccessError, Result, TargetMemory};
use std::fs;
use std::path::Path;
use tracing::debug;

/// 連続したメモリ領域
#[derive(Debug, Clone)]
struct MemoryRegion {
    base: u64,
    data: Vec<u8>,
}

impl MemoryRegion {
    /// 領域の終端アドレス（この値は含まない）
    fn end(&self) -> u64 {
        self.base + self.data.len() as u64
    }

    /// `[addr, addr + size)` が領域内に収まっているか
    fn contains(&self, addr: u64, size: usize) -> bool {
        addr >= self.base
            && addr
                .checked_add(size as u64)
                .map(|end| end <= self.end())
                .unwrap_or(false)
    }
}

/// 停止中ターゲットのメモリイメージ
///
/// RAMダンプなどの領域を保持し、[`TargetMemory`] として読み取りを提供します。
/// 読み取りが複数の領域にまたがる場合は未マップとして扱います。
#[derive(Debug, Clone)]
pub struct MemoryImage {
    regions: Vec<MemoryRegion>,
    halted: bool,
}

impl MemoryImage {
    /// 空のメモリイメージを作成する
    pub fn new() -> Self {
        Self {
            regions: Vec::new(),
            halted: true,
        }
    }

    /// 領域を追加する
    ///
    /// 既存の領域と重なる場合はエラーになります。
    pub fn add_region(&mut self, base: u64, data: Vec<u8>) -> Result<()> {
        let region = MemoryRegion { base, data };
        if let Some(existing) = self
            .regions
            .iter()
            .find(|r| region.base < r.end() && r.base < region.end())
        {
            return Err(anyhow::anyhow!(
                "Region 0x{:08x}..0x{:08x} overlaps 0x{:08x}..0x{:08x}",
                region.base,
                region.end(),
                existing.base,
                existing.end()
            ));
        }

        self.regions.push(region);
        self.regions.sort_by_key(|r| r.base);
        Ok(())
    }

    /// ファイルの内容を指定アドレスの領域として読み込む
    pub fn load_region<P: AsRef<Path>>(&mut self, path: P, base: u64) -> Result<()> {
        let path = path.as_ref();
        let data = fs::read(path)
            .map_err(|e| anyhow::anyhow!("Failed to read memory dump {:?}: {}", path, e))?;

        debug!("Loaded {} bytes from {:?} at 0x{:08x}", data.len(), path, base);
        self.add_region(base, data)
    }

    /// 停止状態を設定する
    ///
    /// 停止していないイメージへの読み取りは [`AccessError::NotHalted`] になります。
    pub fn set_halted(&mut self, halted: bool) {
        self.halted = halted;
    }

    /// スナップショットにバイト列を書き込む
    ///
    /// イメージを組み立てるためのもので、書き込み先は既存の領域内である必要があります。
    pub fn put_bytes(&mut self, addr: u64, bytes: &[u8]) -> Result<()> {
        let region = self
            .regions
            .iter_mut()
            .find(|r| r.contains(addr, bytes.len()))
            .ok_or(AccessError::Unmapped { address: addr, size: bytes.len() })?;

        let start = (addr - region.base) as usize;
        region.data[start..start + bytes.len()].copy_from_slice(bytes);
        Ok(())
    }

    /// スナップショットにu32値を書き込む（リトルエンディアン）
    pub fn put_u32(&mut self, addr: u64, value: u32) -> Result<()> {
        self.put_bytes(addr, &value.to_le_bytes())
    }

    /// スナップショットにNUL終端文字列を書き込む
    pub fn put_c_string(&mut self, addr: u64, s: &str) -> Result<()> {
        let mut bytes = s.as_bytes().to_vec();
        bytes.push(0);
        self.put_bytes(addr, &bytes)
    }
}

impl Default for MemoryImage {
    fn default() -> Self {
        Self::new()
    }
}

impl TargetMemory for MemoryImage {
    fn read(&self, addr: u64, size: usize) -> Result<Vec<u8>> {
        if !self.halted {
            return Err(AccessError::NotHalted.into());
        }

        let region = self
            .regions
            .iter()
            .find(|r| r.contains(addr, size))
            .ok_or(AccessError::Unmapped { address: addr, size })?;

        let start = (addr - region.base) as usize;
        Ok(region.data[start..start + size].to_vec())
    }
}
