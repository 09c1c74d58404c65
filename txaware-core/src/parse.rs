//! パース関連のユーティリティ関数

use anyhow::Result;
use std::path::PathBuf;

/// アドレス文字列をu64にパース
///
/// 16進数（0xプレフィックス付き）または10進数をサポート
///
/// # Examples
/// ```
/// use txaware_core::parse::parse_address;
///
/// assert_eq!(parse_address("0x1234").unwrap(), 0x1234);
/// assert_eq!(parse_address("1234").unwrap(), 1234);
/// ```
pub fn parse_address(s: &str) -> Result<u64> {
    let s = s.trim();

    if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        u64::from_str_radix(hex, 16)
            .map_err(|e| anyhow::anyhow!("Invalid hexadecimal address '{}': {}", s, e))
    } else {
        s.parse::<u64>()
            .map_err(|e| anyhow::anyhow!("Invalid address '{}': {}", s, e))
    }
}

/// `FILE@ADDRESS` 形式のメモリダンプ指定をパース
///
/// ファイル名に `@` が含まれていてもよいように、最後の `@` で分割します。
///
/// # Examples
/// ```
/// use txaware_core::parse::parse_region;
///
/// let (path, base) = parse_region("ram.bin@0x20000000").unwrap();
/// assert_eq!(path.to_str(), Some("ram.bin"));
/// assert_eq!(base, 0x2000_0000);
/// ```
pub fn parse_region(s: &str) -> Result<(PathBuf, u64)> {
    let (path, addr) = s
        .rsplit_once('@')
        .ok_or_else(|| anyhow::anyhow!("Expected FILE@ADDRESS, got '{}'", s))?;

    if path.is_empty() {
        return Err(anyhow::anyhow!("Missing file name in '{}'", s));
    }

    Ok((PathBuf::from(path), parse_address(addr)?))
}
