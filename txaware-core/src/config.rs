//! 表示設定
//!
//! 列見出し、並べ替え、強調表示などはプロセス起動時に一度だけ決める設定で、
//! リフレッシュごとのデコード処理とは独立しています。

use crate::table::Table;

/// 表示設定
#[derive(Debug, Clone)]
pub struct DisplayConfig {
    /// スレッド表の列見出し
    pub thread_columns: Vec<String>,
    /// セマフォ表の列見出し
    pub semaphore_columns: Vec<String>,
    /// ミューテックス表の列見出し
    pub mutex_columns: Vec<String>,
    /// スレッド表を優先度（数値）で並べ替えて表示する
    pub sort_by_priority: bool,
    /// 強調表示する状態ラベル（前方一致）
    pub highlight_states: Vec<String>,
    /// ANSIカラーで強調表示する
    pub color: bool,
    /// セマフォ表を表示する
    pub show_semaphores: bool,
    /// ミューテックス表を表示する
    pub show_mutexes: bool,
    /// 1つのリストで巡回するオブジェクト数の上限
    pub max_objects: usize,
    /// オブジェクト名の最大バイト数
    pub max_name_len: usize,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            thread_columns: columns(&[
                "Thread",
                "Priority",
                "State",
                "Runs",
                "Stack Size",
                "Max Stack Usage",
                "Stack Start",
            ]),
            semaphore_columns: columns(&["Semaphore", "Count", "Suspended"]),
            mutex_columns: columns(&["Mutex", "Owner", "Suspended"]),
            sort_by_priority: true,
            highlight_states: columns(&["Ready", "Executing", "Waiting"]),
            color: false,
            show_semaphores: true,
            show_mutexes: true,
            max_objects: 1024,
            max_name_len: 64,
        }
    }
}

impl DisplayConfig {
    /// 表の列見出し
    pub fn columns(&self, table: Table) -> &[String] {
        match table {
            Table::Threads => &self.thread_columns,
            Table::Semaphores => &self.semaphore_columns,
            Table::Mutexes => &self.mutex_columns,
        }
    }

    /// 表を表示するかどうか（スレッド表は常に表示）
    pub fn is_shown(&self, table: Table) -> bool {
        match table {
            Table::Threads => true,
            Table::Semaphores => self.show_semaphores,
            Table::Mutexes => self.show_mutexes,
        }
    }

    /// 状態ラベルを強調表示するかどうか
    pub fn is_highlighted(&self, state: &str) -> bool {
        self.highlight_states.iter().any(|h| state.starts_with(h.as_str()))
    }
}

fn columns(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}
