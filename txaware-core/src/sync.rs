//! セマフォとミューテックス

use crate::reader::ObjectReader;
use crate::Result;

/// TX_SEMAPHORE のスナップショット
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SemaphoreControlBlock {
    pub address: u64,
    pub name: String,
    pub count: u32,
    /// 最初に待っているスレッド（いなければ0）
    pub suspension_list: u64,
    pub created_next: u64,
}

impl SemaphoreControlBlock {
    pub fn read(reader: &ObjectReader, address: u64) -> Result<Self> {
        let layout = &reader.layout.semaphore;
        Ok(Self {
            address,
            name: reader.name_field(address, layout.name)?,
            count: reader.field_u32(address, layout.count)?,
            suspension_list: reader.field_ptr(address, layout.suspension_list)?,
            created_next: reader.field_ptr(address, layout.created_next)?,
        })
    }
}

/// TX_MUTEX のスナップショット
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MutexControlBlock {
    pub address: u64,
    pub name: String,
    /// 所有スレッド（ロックされていなければ0）
    pub owner: u64,
    pub suspension_list: u64,
    pub created_next: u64,
}

impl MutexControlBlock {
    pub fn read(reader: &ObjectReader, address: u64) -> Result<Self> {
        let layout = &reader.layout.mutex;
        Ok(Self {
            address,
            name: reader.name_field(address, layout.name)?,
            owner: reader.field_ptr(address, layout.owner)?,
            suspension_list: reader.field_ptr(address, layout.suspension_list)?,
            created_next: reader.field_ptr(address, layout.created_next)?,
        })
    }
}

/// セマフォ一覧の1行
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SemaphoreRow {
    pub address: u64,
    pub name: String,
    pub count: u32,
    /// 最初に待っているスレッドの名前（いなければ空）
    pub suspended: String,
}

impl SemaphoreRow {
    /// 制御ブロックを読み、待ちスレッドの名前を解決して行を作る
    pub fn read(reader: &ObjectReader, address: u64) -> Result<Self> {
        let scb = SemaphoreControlBlock::read(reader, address)?;
        Ok(Self {
            address,
            suspended: reader.linked_thread_name(scb.suspension_list)?,
            name: scb.name,
            count: scb.count,
        })
    }

    /// 表の列順（Semaphore, Count, Suspended）
    pub fn cells(&self) -> Vec<String> {
        vec![self.name.clone(), self.count.to_string(), self.suspended.clone()]
    }
}

/// ミューテックス一覧の1行
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MutexRow {
    pub address: u64,
    pub name: String,
    /// 所有スレッドの名前（なければ空）
    pub owner: String,
    pub suspended: String,
}

impl MutexRow {
    pub fn read(reader: &ObjectReader, address: u64) -> Result<Self> {
        let mcb = MutexControlBlock::read(reader, address)?;
        Ok(Self {
            address,
            owner: reader.linked_thread_name(mcb.owner)?,
            suspended: reader.linked_thread_name(mcb.suspension_list)?,
            name: mcb.name,
        })
    }

    /// 表の列順（Mutex, Owner, Suspended）
    pub fn cells(&self) -> Vec<String> {
        vec![self.name.clone(), self.owner.clone(), self.suspended.clone()]
    }
}
