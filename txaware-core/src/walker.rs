//! 作成済みオブジェクトの循環リストの巡回
//!
//! ThreadXは同じ種類の作成済みオブジェクトを `*_created_next` で循環リストにつないでいます。
//! リストはターゲットのメモリ上にあるため、ノードはアドレスとして扱い、
//! 次のノードは [`TargetMemory`] 経由で読みます。

use crate::Result;
use std::collections::HashSet;
use tracing::{debug, warn};
use txaware_target::{is_fatal, TargetMemory};

/// 循環リストの巡回器
pub struct CreatedListWalker<'a> {
    memory: &'a dyn TargetMemory,
    /// 制御ブロック内の `created_next` のオフセット
    next_offset: u64,
    /// 1回の巡回で訪れるノード数の上限
    limit: usize,
}

impl<'a> CreatedListWalker<'a> {
    pub fn new(memory: &'a dyn TargetMemory, next_offset: u64, limit: usize) -> Self {
        Self {
            memory,
            next_offset,
            limit,
        }
    }

    /// 先頭から順にノードをデコードし、行を集める
    ///
    /// 先頭がNULLなら何も読まずに空を返します。巡回は先頭に戻ったところで終わるので、
    /// 自己参照する1ノードのリストは1行になります。
    ///
    /// 一過性の読み取りエラーはそのノードの行だけを諦めます。次ノードへのリンクが
    /// 読めなかった場合はそこで巡回を打ち切り、それまでの行を返します。
    /// 致命的なエラー（ターゲット非停止など）は呼び出し元へ返します。
    ///
    /// 先頭以外のノードに戻る壊れたリストは、同じノードを2度出さずにそこで打ち切ります。
    pub fn walk<R, F>(&self, head: u64, mut decode: F) -> Result<Vec<R>>
    where
        F: FnMut(u64) -> Result<R>,
    {
        let mut rows = Vec::new();
        if head == 0 {
            return Ok(rows);
        }

        let mut current = head;
        let mut visited = HashSet::new();
        loop {
            if visited.len() == self.limit {
                warn!("Stopped walking list at 0x{:08x} after {} objects; list may be corrupt",
                    head, visited.len());
                break;
            }
            visited.insert(current);

            // 行のデコードに失敗しても巡回を続けられるよう、リンクを先に読む
            let next = match self.memory.read_pointer(current + self.next_offset) {
                Ok(next) => next,
                Err(e) if is_fatal(&e) => return Err(e),
                Err(e) => {
                    warn!("Cannot read created_next of object at 0x{:08x}: {}", current, e);
                    break;
                }
            };

            match decode(current) {
                Ok(row) => rows.push(row),
                Err(e) if is_fatal(&e) => return Err(e),
                Err(e) => warn!("Skipping object at 0x{:08x}: {}", current, e),
            }

            if next == head {
                break;
            }
            if next == 0 {
                warn!("Object at 0x{:08x} has a null created_next; list is not circular", current);
                break;
            }
            // 先頭を通らない循環
            if visited.contains(&next) {
                warn!("Object at 0x{:08x} links back to 0x{:08x}, not to the list head 0x{:08x}",
                    current, next, head);
                break;
            }
            current = next;
        }

        debug!("Walked list at 0x{:08x}: {} objects, {} rows", head, visited.len(), rows.len());
        Ok(rows)
    }
}
