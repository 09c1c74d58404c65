//! カーネルシンボルの解決

use crate::errors::ERR_SYMBOL_NOT_FOUND;
use crate::Result;
use tracing::debug;
use txaware_dwarf::SymbolResolver;

/// 実行中スレッドへのポインタ
pub const THREAD_CURRENT_PTR: &str = "_tx_thread_current_ptr";
/// 作成済みスレッドリストの先頭
pub const THREAD_CREATED_PTR: &str = "_tx_thread_created_ptr";
/// 作成済みセマフォリストの先頭
pub const SEMAPHORE_CREATED_PTR: &str = "_tx_semaphore_created_ptr";
/// 作成済みミューテックスリストの先頭
pub const MUTEX_CREATED_PTR: &str = "_tx_mutex_created_ptr";
/// カーネルのビルドオプションワード
pub const BUILD_OPTIONS: &str = "_tx_build_options";
/// コンテキストスイッチ中とみなすカーネル関数
pub const THREAD_SYSTEM_SUSPEND: &str = "_tx_thread_system_suspend";

/// カーネル変数・関数のアドレス
///
/// スレッド関連のシンボルは必須です。セマフォ・ミューテックスを使わないアプリケーションでは
/// それらのシンボルがリンクされないことがあるため、Optionで持ちます。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KernelSymbols {
    /// `_tx_thread_current_ptr` 変数のアドレス
    pub thread_current_ptr: u64,
    /// `_tx_thread_created_ptr` 変数のアドレス
    pub thread_created_ptr: u64,
    /// `_tx_semaphore_created_ptr` 変数のアドレス
    pub semaphore_created_ptr: Option<u64>,
    /// `_tx_mutex_created_ptr` 変数のアドレス
    pub mutex_created_ptr: Option<u64>,
    /// `_tx_build_options` 変数のアドレス
    pub build_options: Option<u64>,
    /// `_tx_thread_system_suspend` の命令アドレス
    pub system_suspend: Option<u64>,
}

impl KernelSymbols {
    /// シンボルテーブルからカーネルシンボルを解決する
    pub fn resolve(resolver: &SymbolResolver) -> Result<Self> {
        let required = |name: &str| {
            resolver
                .resolve(name)
                .ok_or_else(|| anyhow::anyhow!("{}: {}", ERR_SYMBOL_NOT_FOUND, name))
        };
        let optional = |name: &str| {
            let addr = resolver.resolve(name);
            if addr.is_none() {
                debug!("Optional kernel symbol '{}' is not linked", name);
            }
            addr
        };

        Ok(Self {
            thread_current_ptr: required(THREAD_CURRENT_PTR)?,
            thread_created_ptr: required(THREAD_CREATED_PTR)?,
            semaphore_created_ptr: optional(SEMAPHORE_CREATED_PTR),
            mutex_created_ptr: optional(MUTEX_CREATED_PTR),
            build_options: optional(BUILD_OPTIONS),
            system_suspend: resolver.resolve_code(THREAD_SYSTEM_SUSPEND),
        })
    }
}
