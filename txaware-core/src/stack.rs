//! スタック使用量の計算

use std::fmt;

/// `_tx_build_options` のスタックチェックビット（TX_ENABLE_STACK_CHECKING）
pub const STACK_CHECKING_BIT: u32 = 1 << 20;

/// スタックサイズ表示に加える固定値
pub const STACK_SIZE_ADJUSTMENT: u32 = 4;

/// 最大スタック使用量表示に加える固定値
pub const STACK_USAGE_ADJUSTMENT: u32 = 1;

/// カーネルのビルドオプションワード
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuildOptions(pub u32);

impl BuildOptions {
    /// スタックチェック機能が組み込まれているか
    pub fn stack_checking(&self) -> bool {
        self.0 & STACK_CHECKING_BIT != 0
    }
}

/// 最大スタック使用量
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StackUsage {
    Bytes(u32),
    /// カーネルが高水位マークを記録していない
    Unavailable,
}

impl fmt::Display for StackUsage {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            StackUsage::Bytes(n) => write!(f, "{}", n),
            StackUsage::Unavailable => f.write_str("N/A"),
        }
    }
}

/// スタック領域の表示サイズ
pub fn stack_size(stack_start: u32, stack_end: u32) -> u32 {
    stack_end
        .wrapping_sub(stack_start)
        .wrapping_add(STACK_SIZE_ADJUSTMENT)
}

/// スタック使用量計算器
///
/// ビルドオプションはカーネル全体の性質なので、リフレッシュごとに一度だけ読んで作成します。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StackUsageCalculator {
    enabled: bool,
}

impl StackUsageCalculator {
    /// ビルドオプションから計算器を作成する（不明ならスタックチェック無効扱い）
    pub fn new(options: Option<BuildOptions>) -> Self {
        Self {
            enabled: options.map(|o| o.stack_checking()).unwrap_or(false),
        }
    }

    /// 高水位マークが有効かどうか
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// 最大スタック使用量を計算する
    ///
    /// スタックは下位アドレスに向かって伸びるため、スタック終端から高水位ポインタまでの距離が
    /// 使用量になります。高水位ポインタが終端より上にある場合は値を作らずUnavailableを返します。
    pub fn usage(&self, stack_end: u32, stack_highest_ptr: Option<u32>) -> StackUsage {
        if !self.enabled {
            return StackUsage::Unavailable;
        }

        stack_highest_ptr
            .and_then(|highest| stack_end.checked_sub(highest))
            .and_then(|used| used.checked_add(STACK_USAGE_ADJUSTMENT))
            .map(StackUsage::Bytes)
            .unwrap_or(StackUsage::Unavailable)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stack_checking_bit_20() {
        assert!(BuildOptions(0x0010_0000).stack_checking());
        assert!(BuildOptions(0xffff_ffff).stack_checking());
        assert!(!BuildOptions(0x000f_ffff).stack_checking());
        assert!(!BuildOptions(0xffef_ffff).stack_checking());
    }

    #[test]
    fn test_usage_unavailable_without_stack_checking() {
        let calc = StackUsageCalculator::new(Some(BuildOptions(0)));
        assert_eq!(calc.usage(0x2000_0fff, Some(0x2000_0e00)), StackUsage::Unavailable);

        let calc = StackUsageCalculator::new(None);
        assert_eq!(calc.usage(0x2000_0fff, Some(0x2000_0e00)), StackUsage::Unavailable);
        assert_eq!(calc.usage(0x2000_0fff, Some(0x2000_0e00)).to_string(), "N/A");
    }

    #[test]
    fn test_usage_literal_plus_one() {
        // 終端 - 高水位ポインタ に固定値 +1 を加える
        let calc = StackUsageCalculator::new(Some(BuildOptions(STACK_CHECKING_BIT)));
        assert_eq!(calc.usage(0x2000_0fff, Some(0x2000_0e00)), StackUsage::Bytes(0x200));
        assert_eq!(calc.usage(0x2000_0fff, Some(0x2000_0fff)), StackUsage::Bytes(1));
    }

    #[test]
    fn test_usage_highest_above_end_is_unavailable() {
        let calc = StackUsageCalculator::new(Some(BuildOptions(STACK_CHECKING_BIT)));
        assert_eq!(calc.usage(0x2000_0fff, Some(0x2000_1000)), StackUsage::Unavailable);
        assert_eq!(calc.usage(0x2000_0fff, None), StackUsage::Unavailable);
    }

    #[test]
    fn test_stack_size_literal_plus_four() {
        assert_eq!(stack_size(0x2000_0000, 0x2000_03ff), 0x403);
        assert_eq!(stack_size(0x2000_0000, 0x2000_0400), 0x404);
    }
}
