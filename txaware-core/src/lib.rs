//! txaware のコア機能
//!
//! 停止中のターゲットのメモリだけを読み、ThreadXカーネルの状態（スレッド、セマフォ、
//! ミューテックス）と、実行中でないスレッドの保存レジスタを再構築します。
//! 結果は表示側の [`RowSink`] に行として渡されます。

pub mod command;
pub mod config;
pub mod context;
pub mod errors;
pub mod kernel;
pub mod layout;
pub mod parse;
pub mod reader;
pub mod stack;
pub mod state;
pub mod symbols;
pub mod sync;
pub mod table;
pub mod thread;
pub mod walker;

pub use command::Command;
pub use config::DisplayConfig;
pub use context::{Architecture, ContextDecoder, CortexMDecoder, SavedContext};
pub use kernel::KernelView;
pub use layout::{KernelLayout, MutexLayout, SemaphoreLayout, ThreadLayout};
pub use reader::ObjectReader;
pub use stack::{BuildOptions, StackUsage, StackUsageCalculator};
pub use state::{DisplayState, ThreadState};
pub use symbols::KernelSymbols;
pub use sync::{MutexControlBlock, MutexRow, SemaphoreControlBlock, SemaphoreRow};
pub use table::{RowSink, Table, TableSet};
pub use thread::{ThreadControlBlock, ThreadRow};
pub use walker::CreatedListWalker;

// 他のクレートから使用するために再エクスポート
pub use txaware_dwarf::{DwarfLoader, LineInfo, LineInfoProvider, Symbol, SymbolResolver};
pub use txaware_target::{AccessError, MemoryImage, RegisterFrame, TargetMemory};

/// コア機能の結果型
pub type Result<T> = anyhow::Result<T>;
