//! 実行中でないスレッドの保存コンテキストの再構築
//!
//! コンテキストスイッチで退避されたレジスタはスレッドのスタック上にあり、
//! その並びはCPUとカーネルのポートに依存します。アーキテクチャごとに
//! [`ContextDecoder`] を実装し、[`Architecture`] から選びます。

use crate::errors::ERR_UNKNOWN_ARCHITECTURE;
use crate::Result;
use std::fmt;
use std::str::FromStr;
use txaware_dwarf::DwarfLoader;
use txaware_target::{RegisterFrame, TargetMemory};

/// ターゲットのワードサイズ
const WORD: u64 = 4;

/// 再構築されたコンテキスト
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedContext {
    /// 復帰時に復元されるレジスタ
    pub registers: RegisterFrame,
    /// フレームをすべて読み終えた位置（フレーム復元後のスタックポインタ）
    pub frame_end: u64,
    /// FPUの拡張フレームがあったか
    pub extended_frame: bool,
}

/// 保存コンテキストのデコーダ
pub trait ContextDecoder {
    /// 対応するアーキテクチャ
    fn architecture(&self) -> Architecture;

    /// 保存されたスタックポインタからコンテキストを再構築する
    fn decode(&self, memory: &dyn TargetMemory, stack_ptr: u64) -> Result<SavedContext>;
}

/// ターゲットのアーキテクチャ
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Architecture {
    /// ARM Cortex-M（FPUの有無は問わない）
    CortexM,
}

impl Architecture {
    /// ELFからアーキテクチャを判定する
    pub fn detect(loader: &DwarfLoader) -> Option<Self> {
        if loader.is_arm32() {
            Some(Architecture::CortexM)
        } else {
            None
        }
    }

    /// このアーキテクチャのデコーダを作る
    pub fn decoder(&self) -> Box<dyn ContextDecoder> {
        match self {
            Architecture::CortexM => Box::new(CortexMDecoder),
        }
    }
}

impl fmt::Display for Architecture {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Architecture::CortexM => f.write_str("cortex-m"),
        }
    }
}

impl FromStr for Architecture {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "cortex-m" | "cortexm" | "armv6m" | "armv7m" | "armv7em" | "armv8m" => {
                Ok(Architecture::CortexM)
            }
            _ => Err(anyhow::anyhow!("{}: {}", ERR_UNKNOWN_ARCHITECTURE, s)),
        }
    }
}

/// スタック上を読み進めるカーソル
struct StackCursor<'a> {
    memory: &'a dyn TargetMemory,
    addr: u64,
}

impl<'a> StackCursor<'a> {
    fn new(memory: &'a dyn TargetMemory, addr: u64) -> Self {
        Self { memory, addr }
    }

    /// 1ワード読んで進む
    fn pop(&mut self) -> Result<u32> {
        let value = self.memory.read_word(self.addr)?;
        self.addr += WORD;
        Ok(value)
    }

    /// 読まずに `words` ワード進む
    fn skip(&mut self, words: u64) {
        self.addr += words * WORD;
    }
}

/// Cortex-M用デコーダ
///
/// ThreadXのCortex-Mポートが退避するフレーム（下位アドレスから）:
///
/// ```text
/// EXC_RETURN
/// [S16-S31]            EXC_RETURN bit4 == 0 のときのみ
/// R4-R11               カーネルが手動で退避
/// R0-R3, R12, LR, PC, xPSR   ハードウェアが退避
/// [S0-S15, FPSCR, 予約] EXC_RETURN bit4 == 0 のときのみ
/// [アライメント用パディング] xPSR bit9 == 1 のときのみ
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct CortexMDecoder;

impl CortexMDecoder {
    /// EXC_RETURNのビット4（1: 標準フレーム、0: FPU拡張フレーム）
    pub const EXC_RETURN_STANDARD_FRAME: u32 = 1 << 4;
    /// xPSRのビット9（スタックを8バイト境界に揃えるパディングあり）
    pub const PSR_STACK_ALIGN: u32 = 1 << 9;
    /// カーネルが退避するS16-S31のワード数
    pub const FP_CALLEE_SAVED_WORDS: u64 = 16;
    /// ハードウェアが退避するS0-S15、FPSCR、予約ワードのワード数
    pub const FP_CALLER_SAVED_WORDS: u64 = 18;
}

impl ContextDecoder for CortexMDecoder {
    fn architecture(&self) -> Architecture {
        Architecture::CortexM
    }

    fn decode(&self, memory: &dyn TargetMemory, stack_ptr: u64) -> Result<SavedContext> {
        let mut regs = RegisterFrame::new();
        let mut cursor = StackCursor::new(memory, stack_ptr);

        let exc_return = cursor.pop()?;
        let extended_frame = exc_return & Self::EXC_RETURN_STANDARD_FRAME == 0;

        if extended_frame {
            cursor.skip(Self::FP_CALLEE_SAVED_WORDS);
        }

        // R4-R11
        for i in 4..12 {
            regs.set(i, cursor.pop()?);
        }

        // R0-R3
        for i in 0..4 {
            regs.set(i, cursor.pop()?);
        }

        regs.set(12, cursor.pop()?);
        regs.set(RegisterFrame::LR, cursor.pop()?);
        regs.set(RegisterFrame::PC, cursor.pop()?);
        regs.set(RegisterFrame::PSR, cursor.pop()?);

        if extended_frame {
            cursor.skip(Self::FP_CALLER_SAVED_WORDS);
        }

        // パディングは常に最後に積まれるので、FPU領域を飛ばした後で判定する
        if regs.psr() & Self::PSR_STACK_ALIGN != 0 {
            cursor.skip(1);
        }

        // SPは読み進めた位置ではなく、保存されていた値そのもの
        regs.set(RegisterFrame::SP, stack_ptr as u32);

        Ok(SavedContext {
            registers: regs,
            frame_end: cursor.addr,
            extended_frame,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use txaware_target::MemoryImage;

    const SP: u64 = 0x2000_1000;

    /// `words` をSPから並べたイメージ（余白なし）
    fn stack_image(words: &[u32]) -> MemoryImage {
        let bytes = words.iter().flat_map(|w| w.to_le_bytes()).collect();
        let mut image = MemoryImage::new();
        image.add_region(SP, bytes).unwrap();
        image
    }

    /// R4-R11, R0-R3, R12, LR, PC の値として 0x100+n を並べる
    fn integer_frame(psr: u32) -> Vec<u32> {
        let mut words: Vec<u32> = (4..12).map(|n| 0x100 + n).collect();
        words.extend((0..4).map(|n| 0x100 + n));
        words.extend([0x10c, 0x0800_0123, 0x0800_0456, psr]);
        words
    }

    fn assert_integer_registers(regs: &RegisterFrame) {
        for n in 0..13 {
            assert_eq!(regs.get(n as usize), Some(0x100 + n), "R{}", n);
        }
        assert_eq!(regs.lr(), 0x0800_0123);
        assert_eq!(regs.pc(), 0x0800_0456);
    }

    #[test]
    fn test_standard_frame_without_padding() {
        let mut words = vec![0xffff_fffd];
        words.extend(integer_frame(0x0100_0000));
        // EXC_RETURN + 16ワードちょうどの領域で読み切れること
        assert_eq!(words.len(), 17);
        let image = stack_image(&words);

        let ctx = CortexMDecoder.decode(&image, SP).unwrap();
        assert_integer_registers(&ctx.registers);
        assert_eq!(ctx.registers.psr(), 0x0100_0000);
        assert_eq!(ctx.registers.sp(), SP as u32);
        assert!(!ctx.extended_frame);
        assert_eq!(ctx.frame_end, SP + 17 * 4);
    }

    #[test]
    fn test_extended_fpu_frame() {
        let mut words = vec![0xffff_ffed];
        words.extend(std::iter::repeat(0xaaaa_aaaa).take(16));
        words.extend(integer_frame(0x0100_0000));
        words.extend(std::iter::repeat(0xbbbb_bbbb).take(18));
        let image = stack_image(&words);

        let ctx = CortexMDecoder.decode(&image, SP).unwrap();
        assert_integer_registers(&ctx.registers);
        assert!(ctx.extended_frame);
        assert_eq!(ctx.frame_end, SP + (1 + 16 + 16 + 18) * 4);
        assert_eq!(ctx.registers.sp(), SP as u32);
    }

    #[test]
    fn test_alignment_padding_after_fpu_area() {
        let psr = 0x0100_0000 | CortexMDecoder::PSR_STACK_ALIGN;
        let mut words = vec![0xffff_ffed];
        words.extend(std::iter::repeat(0).take(16));
        words.extend(integer_frame(psr));
        words.extend(std::iter::repeat(0).take(18));
        let image = stack_image(&words);

        let ctx = CortexMDecoder.decode(&image, SP).unwrap();
        assert_eq!(ctx.registers.psr(), psr);
        assert_eq!(ctx.frame_end, SP + (1 + 16 + 16 + 18 + 1) * 4);
    }

    #[test]
    fn test_alignment_padding_standard_frame() {
        let psr = 0x0100_0000 | CortexMDecoder::PSR_STACK_ALIGN;
        let mut words = vec![0xffff_fffd];
        words.extend(integer_frame(psr));
        let image = stack_image(&words);

        let ctx = CortexMDecoder.decode(&image, SP).unwrap();
        assert_eq!(ctx.frame_end, SP + 18 * 4);
        assert_eq!(ctx.registers.sp(), SP as u32);
    }

    #[test]
    fn test_truncated_stack_is_error() {
        let image = stack_image(&[0xffff_fffd, 1, 2, 3]);

        assert!(CortexMDecoder.decode(&image, SP).is_err());
    }

    #[test]
    fn test_architecture_from_str() {
        assert_eq!("cortex-m".parse::<Architecture>().unwrap(), Architecture::CortexM);
        assert_eq!("ARMv7EM".parse::<Architecture>().unwrap(), Architecture::CortexM);
        assert!("riscv32".parse::<Architecture>().is_err());
        assert_eq!(Architecture::CortexM.decoder().architecture(), Architecture::CortexM);
    }
}
