//! シンボル解決機能

use crate::{DwarfLoader, Result};
use object::{Object, ObjectSymbol, SymbolKind};
use std::collections::HashMap;

/// シンボル情報
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Symbol {
    pub name: String,
    pub address: u64,
    pub size: u64,
    /// コード（関数）シンボルかどうか
    pub is_code: bool,
}

impl Symbol {
    /// シンボルを作成する
    pub fn new(name: String, address: u64, size: u64, is_code: bool) -> Self {
        Self {
            name,
            address,
            size,
            is_code,
        }
    }

    /// 命令の実アドレスを取得する
    ///
    /// Thumb関数のシンボル値は最下位ビットが立っているため、それを落とした値を返します。
    pub fn code_address(&self) -> u64 {
        if self.is_code {
            self.address & !1
        } else {
            self.address
        }
    }
}

/// シンボル解決
pub struct SymbolResolver {
    /// シンボル名 -> シンボル情報のマップ
    symbols_by_name: HashMap<String, Symbol>,
    /// アドレス -> シンボル情報のマップ（ソート済み）
    symbols_by_address: Vec<Symbol>,
}

impl SymbolResolver {
    /// DWARFローダーからシンボル解決を作成する
    pub fn new(loader: &DwarfLoader) -> Result<Self> {
        let mut symbols = Vec::new();

        // objectファイルからシンボルテーブルを読み取る
        for symbol in loader.object_file().symbols() {
            let Ok(name) = symbol.name() else {
                continue;
            };

            // ARMのマッピングシンボル（$t, $d など）は除外
            if name.is_empty() || name.starts_with('$') || symbol.is_undefined() {
                continue;
            }

            let is_code = symbol.kind() == SymbolKind::Text;
            symbols.push(Symbol::new(name.to_string(), symbol.address(), symbol.size(), is_code));
        }

        Ok(Self::from_symbols(symbols))
    }

    /// シンボルのリストからシンボル解決を作成する
    pub fn from_symbols(symbols: Vec<Symbol>) -> Self {
        let mut symbols_by_name = HashMap::new();
        for sym in &symbols {
            symbols_by_name.insert(sym.name.clone(), sym.clone());
        }

        // アドレスでソート
        let mut symbols_by_address = symbols;
        symbols_by_address.sort_by_key(|s| s.code_address());

        Self {
            symbols_by_name,
            symbols_by_address,
        }
    }

    /// シンボル名からアドレスを解決する
    pub fn resolve(&self, name: &str) -> Option<u64> {
        self.symbols_by_name.get(name).map(|s| s.address)
    }

    /// 関数シンボル名から命令アドレスを解決する（Thumbビットを除去）
    pub fn resolve_code(&self, name: &str) -> Option<u64> {
        self.symbols_by_name.get(name).map(|s| s.code_address())
    }

    /// アドレスからシンボル名を解決する（最も近いシンボルを返す）
    pub fn reverse_resolve(&self, addr: u64) -> Option<Symbol> {
        // バイナリサーチで最も近いシンボルを見つける
        match self.symbols_by_address.binary_search_by_key(&addr, |s| s.code_address()) {
            Ok(idx) => Some(self.symbols_by_address[idx].clone()),
            Err(0) => None,
            Err(idx) => {
                let sym = &self.symbols_by_address[idx - 1];
                // サイズ情報があれば範囲内かチェックする
                if sym.size == 0 || addr < sym.code_address() + sym.size {
                    Some(sym.clone())
                } else {
                    None
                }
            }
        }
    }

    /// すべてのシンボルを取得する
    pub fn all_symbols(&self) -> impl Iterator<Item = &Symbol> {
        self.symbols_by_address.iter()
    }
}
