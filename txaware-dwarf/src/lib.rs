//! txaware ELF/DWARF デバッグ情報解析
//!
//! このクレートは、ファームウェアのELFファイルとDWARFデバッグ情報の解析機能を提供します。
//! カーネルシンボルの解決、制御ブロック構造体のフィールドオフセットの取得、
//! アドレスからソース行への変換を行います。

pub mod loader;
pub mod symbols;
pub mod layout;
pub mod lines;

pub use loader::DwarfLoader;
pub use symbols::{Symbol, SymbolResolver};
pub use layout::{FieldLayout, StructLayout, StructLayoutExtractor};
pub use lines::{LineInfo, LineInfoProvider};

/// DWARF解析の結果型
pub type Result<T> = anyhow::Result<T>;

/// このクレートで扱うDWARFリーダー
pub type DwarfReader = gimli::EndianSlice<'static, gimli::RunTimeEndian>;
