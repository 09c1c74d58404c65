//! ソース行情報

use crate::{DwarfLoader, DwarfReader, Result};
use std::fmt;

/// ソース行情報
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineInfo {
    pub file: String,
    pub line: u32,
    pub column: Option<u32>,
}

impl fmt::Display for LineInfo {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}:{}", self.file, self.line)
    }
}

/// ソース行情報の取得
pub struct LineInfoProvider {
    context: addr2line::Context<DwarfReader>,
}

impl LineInfoProvider {
    /// ソース行情報プロバイダを作成する
    pub fn new(loader: &DwarfLoader) -> Result<Self> {
        let dwarf = loader.load_dwarf()?;
        let context = addr2line::Context::from_dwarf(dwarf)
            .map_err(|e| anyhow::anyhow!("Failed to build line table context: {}", e))?;
        Ok(Self { context })
    }

    /// アドレスからソース行情報を取得する
    ///
    /// Thumbのビット0が立ったアドレス（LRなど）もそのまま渡せます。
    pub fn lookup(&self, addr: u64) -> Result<Option<LineInfo>> {
        let location = self.context.find_location(addr & !1)?;

        Ok(location.and_then(|loc| {
            Some(LineInfo {
                file: loc.file?.to_string(),
                line: loc.line?,
                column: loc.column,
            })
        }))
    }
}
