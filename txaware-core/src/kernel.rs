//! カーネル状態のビュー

use crate::config::DisplayConfig;
use crate::context::{Architecture, ContextDecoder, SavedContext};
use crate::errors::{ERR_THREAD_EXECUTING, ERR_THREAD_NOT_FOUND, ERR_UNKNOWN_ARCHITECTURE};
use crate::layout::KernelLayout;
use crate::reader::ObjectReader;
use crate::stack::{BuildOptions, StackUsageCalculator};
use crate::symbols::KernelSymbols;
use crate::sync::{MutexRow, SemaphoreRow};
use crate::table::{RowSink, Table};
use crate::thread::{ThreadControlBlock, ThreadRow};
use crate::walker::CreatedListWalker;
use crate::Result;
use tracing::{debug, warn};
use txaware_dwarf::{DwarfLoader, SymbolResolver};
use txaware_target::{is_fatal, RegisterFrame, TargetMemory};

/// OS名
pub const OS_NAME: &str = "ThreadX";

/// 停止中ターゲットのThreadXカーネルのビュー
///
/// 状態は保持せず、問い合わせのたびにターゲットのメモリから読み直します。
pub struct KernelView {
    /// ターゲットメモリ
    memory: Box<dyn TargetMemory>,
    /// カーネルシンボル
    symbols: KernelSymbols,
    /// 制御ブロックのレイアウト
    layout: KernelLayout,
    /// 表示設定
    config: DisplayConfig,
    /// 保存コンテキストのデコーダ
    decoder: Box<dyn ContextDecoder>,
}

impl KernelView {
    /// 新しいビューを作成する
    pub fn new(
        memory: Box<dyn TargetMemory>,
        symbols: KernelSymbols,
        layout: KernelLayout,
        config: DisplayConfig,
        architecture: Architecture,
    ) -> Self {
        Self {
            memory,
            symbols,
            layout,
            config,
            decoder: architecture.decoder(),
        }
    }

    /// ELFのシンボルとDWARFからビューを作成する
    ///
    /// `architecture` がNoneの場合はELFのマシン種別から判定します。
    pub fn from_elf(
        memory: Box<dyn TargetMemory>,
        loader: &DwarfLoader,
        resolver: &SymbolResolver,
        config: DisplayConfig,
        architecture: Option<Architecture>,
    ) -> Result<Self> {
        let architecture = match architecture.or_else(|| Architecture::detect(loader)) {
            Some(arch) => arch,
            None => {
                return Err(anyhow::anyhow!(
                    "{}: {:?}",
                    ERR_UNKNOWN_ARCHITECTURE,
                    loader.architecture()
                ))
            }
        };
        let symbols = KernelSymbols::resolve(resolver)?;
        let layout = KernelLayout::from_dwarf_or_default(loader);
        debug!("Kernel view: arch={}, symbols={:?}", architecture, symbols);

        Ok(Self::new(memory, symbols, layout, config, architecture))
    }

    /// OS名を取得する
    pub fn os_name(&self) -> &'static str {
        OS_NAME
    }

    /// 表示設定を取得する
    pub fn config(&self) -> &DisplayConfig {
        &self.config
    }

    /// ターゲットのアーキテクチャ
    pub fn architecture(&self) -> Architecture {
        self.decoder.architecture()
    }

    fn reader(&self) -> ObjectReader<'_> {
        ObjectReader::new(self.memory.as_ref(), &self.layout, self.config.max_name_len)
    }

    fn walker(&self, next_offset: u64) -> CreatedListWalker<'_> {
        CreatedListWalker::new(self.memory.as_ref(), next_offset, self.config.max_objects)
    }

    /// 実行中スレッドの制御ブロックのアドレス（なければ0）
    pub fn current_thread(&self) -> Result<u64> {
        self.memory.read_pointer(self.symbols.thread_current_ptr)
    }

    /// ビルドオプションワードを読む
    ///
    /// シンボルがない、または一過性のエラーで読めない場合はNoneを返します。
    pub fn build_options(&self) -> Result<Option<BuildOptions>> {
        let Some(addr) = self.symbols.build_options else {
            return Ok(None);
        };

        match self.memory.read_u32(addr) {
            Ok(word) => Ok(Some(BuildOptions(word))),
            Err(e) if is_fatal(&e) => Err(e),
            Err(e) => {
                warn!("Cannot read build options: {}", e);
                Ok(None)
            }
        }
    }

    /// スレッド一覧を作成する
    pub fn threads(&self) -> Result<Vec<ThreadRow>> {
        let current = self.current_thread()?;
        let head = self.memory.read_pointer(self.symbols.thread_created_ptr)?;

        // ビルドオプションはパスごとに一度だけ読む
        let calculator = StackUsageCalculator::new(self.build_options()?);
        let reader = self.reader();

        self.walker(self.layout.thread.created_next).walk(head, |addr| {
            let tcb = ThreadControlBlock::read(&reader, addr, calculator.is_enabled())?;
            Ok(ThreadRow::from_tcb(&tcb, current, &calculator))
        })
    }

    /// セマフォ一覧を作成する
    pub fn semaphores(&self) -> Result<Vec<SemaphoreRow>> {
        let Some(head_ptr) = self.symbols.semaphore_created_ptr else {
            return Ok(Vec::new());
        };
        let head = self.memory.read_pointer(head_ptr)?;
        let reader = self.reader();

        self.walker(self.layout.semaphore.created_next)
            .walk(head, |addr| SemaphoreRow::read(&reader, addr))
    }

    /// ミューテックス一覧を作成する
    pub fn mutexes(&self) -> Result<Vec<MutexRow>> {
        let Some(head_ptr) = self.symbols.mutex_created_ptr else {
            return Ok(Vec::new());
        };
        let head = self.memory.read_pointer(head_ptr)?;
        let reader = self.reader();

        self.walker(self.layout.mutex.created_next)
            .walk(head, |addr| MutexRow::read(&reader, addr))
    }

    /// すべての表を読み直して表示側に渡す
    ///
    /// 全行を読み終えてから `clear` するため、失敗した場合は前回の表示がそのまま残ります。
    pub fn refresh(&self, sink: &mut dyn RowSink) -> Result<()> {
        let threads = self.threads()?;
        let semaphores = if sink.is_shown(Table::Semaphores) {
            self.semaphores()?
        } else {
            Vec::new()
        };
        let mutexes = if sink.is_shown(Table::Mutexes) {
            self.mutexes()?
        } else {
            Vec::new()
        };

        debug!("Refreshed: {} threads, {} semaphores, {} mutexes",
            threads.len(), semaphores.len(), mutexes.len());

        sink.clear();
        threads.into_iter().for_each(|row| sink.add_thread(row));
        semaphores.into_iter().for_each(|row| sink.add_semaphore(row));
        mutexes.into_iter().for_each(|row| sink.add_mutex(row));
        Ok(())
    }

    /// スレッドの名前を取得する
    pub fn thread_name(&self, thread: u64) -> Result<String> {
        self.reader().thread_name(thread)
    }

    /// 名前でスレッドを探す
    pub fn find_thread(&self, name: &str) -> Result<u64> {
        self.threads()?
            .into_iter()
            .find(|row| row.name == name)
            .map(|row| row.address)
            .ok_or_else(|| anyhow::anyhow!("{}: {}", ERR_THREAD_NOT_FOUND, name))
    }

    /// 実行中でないスレッドの保存コンテキストを再構築する
    ///
    /// 実行中のスレッドのレジスタはスタックではなくCPUにあるため、エラーになります。
    pub fn thread_context(&self, thread: u64) -> Result<SavedContext> {
        if thread == self.current_thread()? {
            return Err(anyhow::anyhow!("{}: 0x{:08x}", ERR_THREAD_EXECUTING, thread));
        }

        let stack_ptr = self.reader().field_ptr(thread, self.layout.thread.stack_ptr)?;
        self.decoder.decode(self.memory.as_ref(), stack_ptr)
    }

    /// 実行中でないスレッドのレジスタ（R0-R12, SP, LR, PC, PSR）を取得する
    pub fn thread_registers(&self, thread: u64) -> Result<RegisterFrame> {
        Ok(self.thread_context(thread)?.registers)
    }

    /// コンテキストスイッチ中とみなすべきカーネル関数のアドレス
    ///
    /// ここで停止している間はカーネルがスレッド状態を書き換えている途中です。
    pub fn context_switch_addresses(&self) -> Vec<u64> {
        self.symbols.system_suspend.into_iter().collect()
    }
}
