//! カーネル制御ブロックのフィールドレイアウト
//!
//! 制御ブロックのフィールドを名前で参照する代わりに、フィールドオフセットの表を持ちます。
//! 既定値は拡張マクロを使わない32bit ThreadX（Cortex-Mポート）の配置です。
//! ELFにDWARFがあれば、そちらから実際のオフセットを取得します。

use crate::errors::{ERR_FIELD_NOT_FOUND, ERR_STRUCT_NOT_FOUND};
use crate::Result;
use tracing::{debug, warn};
use txaware_dwarf::{DwarfLoader, StructLayout, StructLayoutExtractor};

/// TX_THREAD のフィールドオフセット
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThreadLayout {
    pub run_count: u64,
    pub stack_ptr: u64,
    pub stack_start: u64,
    pub stack_end: u64,
    pub name: u64,
    pub priority: u64,
    pub state: u64,
    pub created_next: u64,
    /// スタックチェック無効のビルドではメンバ自体が存在しないことがある
    pub stack_highest_ptr: Option<u64>,
}

impl Default for ThreadLayout {
    fn default() -> Self {
        Self {
            run_count: 4,
            stack_ptr: 8,
            stack_start: 12,
            stack_end: 16,
            name: 40,
            priority: 44,
            state: 48,
            created_next: 136,
            stack_highest_ptr: Some(168),
        }
    }
}

/// TX_SEMAPHORE のフィールドオフセット
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SemaphoreLayout {
    pub name: u64,
    pub count: u64,
    pub suspension_list: u64,
    pub created_next: u64,
}

impl Default for SemaphoreLayout {
    fn default() -> Self {
        Self {
            name: 4,
            count: 8,
            suspension_list: 12,
            created_next: 20,
        }
    }
}

/// TX_MUTEX のフィールドオフセット
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MutexLayout {
    pub name: u64,
    pub owner: u64,
    pub suspension_list: u64,
    pub created_next: u64,
}

impl Default for MutexLayout {
    fn default() -> Self {
        Self {
            name: 4,
            owner: 12,
            suspension_list: 24,
            created_next: 32,
        }
    }
}

/// カーネル全体のレイアウト
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KernelLayout {
    pub thread: ThreadLayout,
    pub semaphore: SemaphoreLayout,
    pub mutex: MutexLayout,
}

impl KernelLayout {
    /// DWARFから制御ブロックのレイアウトを取得する
    ///
    /// TX_THREADは必須です。セマフォ・ミューテックスの型はアプリケーションが使わなければ
    /// DWARFに現れないため、見つからない場合は既定のレイアウトを使います。
    pub fn from_dwarf(loader: &DwarfLoader) -> Result<Self> {
        let extractor = StructLayoutExtractor::new(loader.dwarf());

        let thread = find_struct(&extractor, &["TX_THREAD_STRUCT", "TX_THREAD"])?
            .ok_or_else(|| anyhow::anyhow!("{}: TX_THREAD", ERR_STRUCT_NOT_FOUND))?;
        let thread = ThreadLayout::from_struct(&thread)?;

        let semaphore = match find_struct(&extractor, &["TX_SEMAPHORE_STRUCT", "TX_SEMAPHORE"])? {
            Some(s) => SemaphoreLayout::from_struct(&s)?,
            None => {
                debug!("TX_SEMAPHORE not in DWARF, using default layout");
                SemaphoreLayout::default()
            }
        };

        let mutex = match find_struct(&extractor, &["TX_MUTEX_STRUCT", "TX_MUTEX"])? {
            Some(s) => MutexLayout::from_struct(&s)?,
            None => {
                debug!("TX_MUTEX not in DWARF, using default layout");
                MutexLayout::default()
            }
        };

        Ok(Self {
            thread,
            semaphore,
            mutex,
        })
    }

    /// DWARFから取得できればそれを、できなければ既定のレイアウトを返す
    pub fn from_dwarf_or_default(loader: &DwarfLoader) -> Self {
        if !loader.has_debug_info() {
            warn!("ELF has no debug info; using default ThreadX control block layout");
            return Self::default();
        }

        match Self::from_dwarf(loader) {
            Ok(layout) => layout,
            Err(e) => {
                warn!("Falling back to default ThreadX control block layout: {}", e);
                Self::default()
            }
        }
    }
}

impl ThreadLayout {
    fn from_struct(layout: &StructLayout) -> Result<Self> {
        let stack_highest_ptr = layout.field_offset("tx_thread_stack_highest_ptr");
        if stack_highest_ptr.is_none() {
            debug!("tx_thread_stack_highest_ptr not present; stack usage will be unavailable");
        }

        Ok(Self {
            run_count: required(layout, "tx_thread_run_count")?,
            stack_ptr: required(layout, "tx_thread_stack_ptr")?,
            stack_start: required(layout, "tx_thread_stack_start")?,
            stack_end: required(layout, "tx_thread_stack_end")?,
            name: required(layout, "tx_thread_name")?,
            priority: required(layout, "tx_thread_priority")?,
            state: required(layout, "tx_thread_state")?,
            created_next: required(layout, "tx_thread_created_next")?,
            stack_highest_ptr,
        })
    }
}

impl SemaphoreLayout {
    fn from_struct(layout: &StructLayout) -> Result<Self> {
        Ok(Self {
            name: required(layout, "tx_semaphore_name")?,
            count: required(layout, "tx_semaphore_count")?,
            suspension_list: required(layout, "tx_semaphore_suspension_list")?,
            created_next: required(layout, "tx_semaphore_created_next")?,
        })
    }
}

impl MutexLayout {
    fn from_struct(layout: &StructLayout) -> Result<Self> {
        Ok(Self {
            name: required(layout, "tx_mutex_name")?,
            owner: required(layout, "tx_mutex_owner")?,
            suspension_list: required(layout, "tx_mutex_suspension_list")?,
            created_next: required(layout, "tx_mutex_created_next")?,
        })
    }
}

/// 候補名を順に検索する
fn find_struct(extractor: &StructLayoutExtractor, names: &[&str]) -> Result<Option<StructLayout>> {
    for name in names {
        if let Some(layout) = extractor.find(name)? {
            return Ok(Some(layout));
        }
    }
    Ok(None)
}

fn required(layout: &StructLayout, field: &str) -> Result<u64> {
    layout
        .field_offset(field)
        .ok_or_else(|| anyhow::anyhow!("{}: {}.{}", ERR_FIELD_NOT_FOUND, layout.name, field))
}
