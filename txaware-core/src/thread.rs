//! スレッド制御ブロックとスレッド一覧の行

use crate::reader::ObjectReader;
use crate::stack::{stack_size, StackUsage, StackUsageCalculator};
use crate::state::DisplayState;
use crate::Result;

/// TX_THREAD のスナップショット
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThreadControlBlock {
    pub address: u64,
    pub name: String,
    pub priority: u32,
    pub state_code: u32,
    pub run_count: u32,
    /// 保存されたスタックポインタ（実行中でないときのみ有効）
    pub stack_ptr: u32,
    pub stack_start: u32,
    pub stack_end: u32,
    /// スタックチェック有効時のみ読む
    pub stack_highest_ptr: Option<u32>,
    pub created_next: u64,
}

impl ThreadControlBlock {
    /// 制御ブロックを読む
    ///
    /// `with_high_water` が偽、またはレイアウトに高水位ポインタがない場合、
    /// `stack_highest_ptr` は読まずにNoneになります。
    pub fn read(reader: &ObjectReader, address: u64, with_high_water: bool) -> Result<Self> {
        let layout = &reader.layout.thread;

        let stack_highest_ptr = match layout.stack_highest_ptr {
            Some(offset) if with_high_water => Some(reader.field_u32(address, offset)?),
            _ => None,
        };

        Ok(Self {
            address,
            name: reader.thread_name(address)?,
            priority: reader.field_u32(address, layout.priority)?,
            state_code: reader.field_u32(address, layout.state)?,
            run_count: reader.field_u32(address, layout.run_count)?,
            stack_ptr: reader.field_u32(address, layout.stack_ptr)?,
            stack_start: reader.field_u32(address, layout.stack_start)?,
            stack_end: reader.field_u32(address, layout.stack_end)?,
            stack_highest_ptr,
            created_next: reader.field_ptr(address, layout.created_next)?,
        })
    }

    /// 表示用のスタックサイズ
    pub fn stack_size(&self) -> u32 {
        stack_size(self.stack_start, self.stack_end)
    }
}

/// スレッド一覧の1行
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThreadRow {
    /// 制御ブロックのアドレス（レジスタ表示などで使う）
    pub address: u64,
    pub name: String,
    pub priority: u32,
    pub state: DisplayState,
    pub run_count: u32,
    pub stack_size: u32,
    pub max_stack_usage: StackUsage,
    pub stack_start: String,
}

impl ThreadRow {
    /// 制御ブロックから行を作る
    pub fn from_tcb(
        tcb: &ThreadControlBlock,
        current_thread: u64,
        calculator: &StackUsageCalculator,
    ) -> Self {
        Self {
            address: tcb.address,
            name: tcb.name.clone(),
            priority: tcb.priority,
            state: DisplayState::resolve(tcb.address, current_thread, tcb.state_code),
            run_count: tcb.run_count,
            stack_size: tcb.stack_size(),
            max_stack_usage: calculator.usage(tcb.stack_end, tcb.stack_highest_ptr),
            stack_start: format_address(tcb.stack_start),
        }
    }

    /// 表の列順（Thread, Priority, State, Runs, Stack Size, Max Stack Usage, Stack Start）
    pub fn cells(&self) -> Vec<String> {
        vec![
            self.name.clone(),
            self.priority.to_string(),
            self.state.to_string(),
            self.run_count.to_string(),
            self.stack_size.to_string(),
            self.max_stack_usage.to_string(),
            self.stack_start.clone(),
        ]
    }
}

/// アドレスを `0x` + 大文字16進で表す（ゼロ埋めなし）
pub fn format_address(addr: u32) -> String {
    format!("0x{:X}", addr)
}
