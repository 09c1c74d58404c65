//! 表示側への行の受け渡し

use crate::config::DisplayConfig;
use crate::sync::{MutexRow, SemaphoreRow};
use crate::thread::ThreadRow;
use std::fmt;

/// 表の種類
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Table {
    Threads,
    Semaphores,
    Mutexes,
}

impl Table {
    /// 表のタイトル
    pub fn title(&self) -> &'static str {
        match self {
            Table::Threads => "Threads",
            Table::Semaphores => "Semaphores",
            Table::Mutexes => "Mutexes",
        }
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.title())
    }
}

/// デコードされた行の受け取り先
pub trait RowSink {
    /// 前回のリフレッシュの行を消す
    fn clear(&mut self);

    /// 表が表示されているか（非表示の表は巡回しない）
    fn is_shown(&self, _table: Table) -> bool {
        true
    }

    fn add_thread(&mut self, row: ThreadRow);

    fn add_semaphore(&mut self, row: SemaphoreRow);

    fn add_mutex(&mut self, row: MutexRow);
}

/// 行を溜めておく表の集まり
#[derive(Debug, Clone)]
pub struct TableSet {
    config: DisplayConfig,
    pub threads: Vec<ThreadRow>,
    pub semaphores: Vec<SemaphoreRow>,
    pub mutexes: Vec<MutexRow>,
}

impl TableSet {
    pub fn new(config: DisplayConfig) -> Self {
        Self {
            config,
            threads: Vec::new(),
            semaphores: Vec::new(),
            mutexes: Vec::new(),
        }
    }

    /// 表をテキストで描画する
    pub fn render(&self, table: Table) -> String {
        let headers = self.config.columns(table);
        let (rows, highlight): (Vec<Vec<String>>, Vec<bool>) = match table {
            Table::Threads => {
                let mut threads: Vec<&ThreadRow> = self.threads.iter().collect();
                if self.config.sort_by_priority {
                    threads.sort_by_key(|t| t.priority);
                }
                threads
                    .iter()
                    .map(|t| (t.cells(), self.config.is_highlighted(t.state.label())))
                    .unzip()
            }
            Table::Semaphores => self.semaphores.iter().map(|s| (s.cells(), false)).unzip(),
            Table::Mutexes => self.mutexes.iter().map(|m| (m.cells(), false)).unzip(),
        };

        render_text_table(table.title(), headers, &rows, &highlight, self.config.color)
    }

    /// 表示対象の表をすべて描画する
    pub fn render_all(&self) -> String {
        [Table::Threads, Table::Semaphores, Table::Mutexes]
            .into_iter()
            .filter(|t| self.config.is_shown(*t))
            .map(|t| self.render(t))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl RowSink for TableSet {
    fn clear(&mut self) {
        self.threads.clear();
        self.semaphores.clear();
        self.mutexes.clear();
    }

    fn is_shown(&self, table: Table) -> bool {
        self.config.is_shown(table)
    }

    fn add_thread(&mut self, row: ThreadRow) {
        self.threads.push(row);
    }

    fn add_semaphore(&mut self, row: SemaphoreRow) {
        self.semaphores.push(row);
    }

    fn add_mutex(&mut self, row: MutexRow) {
        self.mutexes.push(row);
    }
}

/// 列幅を揃えたテキストの表を作る
fn render_text_table(
    title: &str,
    headers: &[String],
    rows: &[Vec<String>],
    highlight: &[bool],
    color: bool,
) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            if i < widths.len() {
                widths[i] = widths[i].max(cell.chars().count());
            }
        }
    }

    let format_row = |cells: &[String]| -> String {
        cells
            .iter()
            .zip(&widths)
            .map(|(cell, width)| format!("{:<width$}", cell, width = *width))
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_string()
    };

    let mut out = format!("{} ({})\n", title, rows.len());
    out.push_str(&format_row(headers));
    out.push('\n');
    for (row, &hl) in rows.iter().zip(highlight) {
        let line = format_row(row);
        if hl && color {
            out.push_str(&format!("\x1b[1m{}\x1b[0m", line));
        } else {
            out.push_str(&line);
        }
        out.push('\n');
    }
    out
}
