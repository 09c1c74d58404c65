//! スレッドの保存レジスタセット

use std::fmt;

/// レジスタ数（R0-R12, SP, LR, PC, PSR）
pub const REGISTER_COUNT: usize = 17;

/// 表示用のレジスタ名
pub const REGISTER_NAMES: [&str; REGISTER_COUNT] = [
    "R0", "R1", "R2", "R3", "R4", "R5", "R6", "R7", "R8", "R9", "R10", "R11", "R12",
    "SP", "LR", "PC", "PSR",
];

/// 実行中でないスレッドの再構築されたレジスタセット
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RegisterFrame {
    regs: [u32; REGISTER_COUNT],
}

impl RegisterFrame {
    /// スタックポインタ（R13）のインデックス
    pub const SP: usize = 13;
    /// リンクレジスタ（R14）のインデックス
    pub const LR: usize = 14;
    /// プログラムカウンタ（R15）のインデックス
    pub const PC: usize = 15;
    /// プログラムステータスレジスタのインデックス
    pub const PSR: usize = 16;

    /// すべて0のレジスタセットを作成する
    pub fn new() -> Self {
        Self::default()
    }

    /// レジスタ値を取得する
    pub fn get(&self, index: usize) -> Option<u32> {
        self.regs.get(index).copied()
    }

    /// レジスタ値を設定する
    ///
    /// # Panics
    /// `index` が `REGISTER_COUNT` 以上の場合
    pub fn set(&mut self, index: usize, value: u32) {
        self.regs[index] = value;
    }

    pub fn sp(&self) -> u32 {
        self.regs[Self::SP]
    }

    pub fn lr(&self) -> u32 {
        self.regs[Self::LR]
    }

    pub fn pc(&self) -> u32 {
        self.regs[Self::PC]
    }

    pub fn psr(&self) -> u32 {
        self.regs[Self::PSR]
    }

    /// (レジスタ名, 値) の組を順に返す
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, u32)> + '_ {
        REGISTER_NAMES.iter().copied().zip(self.regs.iter().copied())
    }
}

impl fmt::Display for RegisterFrame {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for (i, (name, value)) in self.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{:<4}= 0x{:08x}", name, value)?;
        }
        Ok(())
    }
}
