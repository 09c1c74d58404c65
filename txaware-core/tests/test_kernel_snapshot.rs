//! メモリスナップショット上でのカーネルビューのテスト

use txaware_core::stack::STACK_CHECKING_BIT;
use txaware_core::{
    Architecture, DisplayConfig, DisplayState, KernelLayout, KernelSymbols, KernelView,
    MemoryImage, RowSink, StackUsage, Table, TableSet, ThreadState,
};

const RAM: u64 = 0x2000_0000;

// カーネル変数
const CURRENT_PTR: u64 = RAM;
const THREAD_CREATED: u64 = RAM + 0x04;
const SEMAPHORE_CREATED: u64 = RAM + 0x08;
const MUTEX_CREATED: u64 = RAM + 0x0c;
const BUILD_OPTIONS: u64 = RAM + 0x10;
const SYSTEM_SUSPEND: u64 = 0x0800_0400;

// 制御ブロック
const THREAD_A: u64 = RAM + 0x100;
const THREAD_B: u64 = RAM + 0x200;
const THREAD_C: u64 = RAM + 0x300;
const SEMAPHORE: u64 = RAM + 0x400;
const MUTEX: u64 = RAM + 0x440;

const NAMES: u64 = RAM + 0x500;
const STACK_C: u64 = RAM + 0x800;

fn symbols() -> KernelSymbols {
    KernelSymbols {
        thread_current_ptr: CURRENT_PTR,
        thread_created_ptr: THREAD_CREATED,
        semaphore_created_ptr: Some(SEMAPHORE_CREATED),
        mutex_created_ptr: Some(MUTEX_CREATED),
        build_options: Some(BUILD_OPTIONS),
        system_suspend: Some(SYSTEM_SUSPEND),
    }
}

/// 3スレッド（A -> B -> C -> A）、セマフォ1つ、ミューテックス1つのスナップショット
///
/// Bが実行中、Cはセマフォ待ちでミューテックスはAが所有しています。
fn snapshot(build_options: u32) -> MemoryImage {
    let layout = KernelLayout::default();
    let t = &layout.thread;
    let mut image = MemoryImage::new();
    image.add_region(RAM, vec![0; 0x1000]).unwrap();

    let threads = [
        (THREAD_A, "thread_a", 1, 0, THREAD_B),
        (THREAD_B, "thread_b", 5, 0, THREAD_C),
        (THREAD_C, "thread_c", 3, 6, THREAD_A),
    ];
    for (i, (tcb, name, priority, state, next)) in threads.into_iter().enumerate() {
        let name_addr = NAMES + i as u64 * 0x10;
        let stack_start = 0x2001_0000 + i as u32 * 0x1000;
        image.put_c_string(name_addr, name).unwrap();
        image.put_u32(tcb + t.name, name_addr as u32).unwrap();
        image.put_u32(tcb + t.priority, priority).unwrap();
        image.put_u32(tcb + t.state, state).unwrap();
        image.put_u32(tcb + t.run_count, 10 + i as u32).unwrap();
        image.put_u32(tcb + t.stack_start, stack_start).unwrap();
        image.put_u32(tcb + t.stack_end, stack_start + 0x3ff).unwrap();
        image
            .put_u32(tcb + t.stack_highest_ptr.unwrap(), stack_start + 0x300)
            .unwrap();
        image.put_u32(tcb + t.created_next, next as u32).unwrap();
    }
    image.put_u32(THREAD_C + t.stack_ptr, STACK_C as u32).unwrap();

    // Cの保存フレーム（標準フレーム、パディングなし）
    let mut frame = vec![0xffff_fffd];
    frame.extend((4..12).map(|n| 0xc0 + n));
    frame.extend((0..4).map(|n| 0xc0 + n));
    frame.extend([0xcc, 0x0800_0123, 0x0800_0456, 0x0100_0000]);
    for (i, word) in frame.into_iter().enumerate() {
        image.put_u32(STACK_C + i as u64 * 4, word).unwrap();
    }

    image.put_c_string(NAMES + 0x40, "rx_sem").unwrap();
    image.put_u32(SEMAPHORE + layout.semaphore.name, (NAMES + 0x40) as u32).unwrap();
    image.put_u32(SEMAPHORE + layout.semaphore.count, 0).unwrap();
    image
        .put_u32(SEMAPHORE + layout.semaphore.suspension_list, THREAD_C as u32)
        .unwrap();
    image
        .put_u32(SEMAPHORE + layout.semaphore.created_next, SEMAPHORE as u32)
        .unwrap();

    image.put_c_string(NAMES + 0x50, "bus_lock").unwrap();
    image.put_u32(MUTEX + layout.mutex.name, (NAMES + 0x50) as u32).unwrap();
    image.put_u32(MUTEX + layout.mutex.owner, THREAD_A as u32).unwrap();
    image.put_u32(MUTEX + layout.mutex.created_next, MUTEX as u32).unwrap();

    image.put_u32(CURRENT_PTR, THREAD_B as u32).unwrap();
    image.put_u32(THREAD_CREATED, THREAD_A as u32).unwrap();
    image.put_u32(SEMAPHORE_CREATED, SEMAPHORE as u32).unwrap();
    image.put_u32(MUTEX_CREATED, MUTEX as u32).unwrap();
    image.put_u32(BUILD_OPTIONS, build_options).unwrap();
    image
}

fn view(image: MemoryImage, config: DisplayConfig) -> KernelView {
    KernelView::new(
        Box::new(image),
        symbols(),
        KernelLayout::default(),
        config,
        Architecture::CortexM,
    )
}

#[test]
fn test_threads_in_list_order() {
    let kernel = view(snapshot(STACK_CHECKING_BIT), DisplayConfig::default());

    let rows = kernel.threads().unwrap();
    let names: Vec<&str> = rows.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, ["thread_a", "thread_b", "thread_c"]);

    assert_eq!(rows[0].state, DisplayState::State(ThreadState::Ready));
    assert_eq!(rows[1].state, DisplayState::Executing);
    assert_eq!(rows[2].state.label(), "Waiting - Semaphore");
    assert_eq!(rows[0].stack_size, 0x3ff + 4);
    assert_eq!(rows[0].max_stack_usage, StackUsage::Bytes(0xff + 1));
    assert_eq!(rows[2].stack_start, "0x20012000");
}

#[test]
fn test_stack_usage_without_stack_checking() {
    let kernel = view(snapshot(0), DisplayConfig::default());

    let rows = kernel.threads().unwrap();
    assert!(rows.iter().all(|r| r.max_stack_usage == StackUsage::Unavailable));
    assert!(rows.iter().all(|r| r.cells()[5] == "N/A"));
}

#[test]
fn test_refresh_fills_all_tables() {
    let kernel = view(snapshot(STACK_CHECKING_BIT), DisplayConfig::default());
    let mut tables = TableSet::new(kernel.config().clone());

    kernel.refresh(&mut tables).unwrap();
    assert_eq!(tables.threads.len(), 3);
    assert_eq!(tables.semaphores[0].cells(), vec!["rx_sem", "0", "thread_c"]);
    assert_eq!(tables.mutexes[0].cells(), vec!["bus_lock", "thread_a", ""]);

    // 優先度順に描画される
    let text = tables.render(Table::Threads);
    let body: Vec<&str> = text.lines().skip(2).collect();
    assert!(body[0].starts_with("thread_a"));
    assert!(body[1].starts_with("thread_c"));
    assert!(body[2].starts_with("thread_b"));

    // 2回目のリフレッシュで行が重複しない
    kernel.refresh(&mut tables).unwrap();
    assert_eq!(tables.threads.len(), 3);
}

#[test]
fn test_hidden_tables_are_not_walked() {
    let config = DisplayConfig {
        show_semaphores: false,
        show_mutexes: false,
        ..DisplayConfig::default()
    };
    // 読まれればエラーになるリスト先頭変数
    let symbols = KernelSymbols {
        semaphore_created_ptr: Some(0x6000_0000),
        mutex_created_ptr: Some(0x6000_0004),
        ..symbols()
    };
    let kernel = KernelView::new(
        Box::new(snapshot(STACK_CHECKING_BIT)),
        symbols,
        KernelLayout::default(),
        config.clone(),
        Architecture::CortexM,
    );
    assert!(kernel.semaphores().is_err());
    let mut tables = TableSet::new(config);

    kernel.refresh(&mut tables).unwrap();
    assert_eq!(tables.threads.len(), 3);
    assert!(tables.semaphores.is_empty());
    assert!(tables.mutexes.is_empty());
}

#[test]
fn test_empty_lists() {
    let mut image = snapshot(0);
    image.put_u32(CURRENT_PTR, 0).unwrap();
    image.put_u32(THREAD_CREATED, 0).unwrap();
    image.put_u32(SEMAPHORE_CREATED, 0).unwrap();
    image.put_u32(MUTEX_CREATED, 0).unwrap();
    let kernel = view(image, DisplayConfig::default());

    assert!(kernel.threads().unwrap().is_empty());
    assert!(kernel.semaphores().unwrap().is_empty());
    assert!(kernel.mutexes().unwrap().is_empty());
}

#[test]
fn test_missing_optional_symbols() {
    let symbols = KernelSymbols {
        semaphore_created_ptr: None,
        mutex_created_ptr: None,
        build_options: None,
        system_suspend: None,
        ..symbols()
    };
    let kernel = KernelView::new(
        Box::new(snapshot(STACK_CHECKING_BIT)),
        symbols,
        KernelLayout::default(),
        DisplayConfig::default(),
        Architecture::CortexM,
    );

    assert!(kernel.semaphores().unwrap().is_empty());
    assert!(kernel.mutexes().unwrap().is_empty());
    assert_eq!(kernel.build_options().unwrap(), None);
    // ビルドオプションが読めなければ使用量は表示しない
    assert_eq!(kernel.threads().unwrap()[0].max_stack_usage, StackUsage::Unavailable);
    assert!(kernel.context_switch_addresses().is_empty());
}

#[test]
fn test_unreadable_thread_is_skipped() {
    let layout = KernelLayout::default();
    let mut image = snapshot(STACK_CHECKING_BIT);
    // Bの名前ポインタを未マップ領域へ向ける（リンクは読める）
    image.put_u32(THREAD_B + layout.thread.name, 0x6000_0000).unwrap();
    let kernel = view(image, DisplayConfig::default());

    let names: Vec<String> = kernel.threads().unwrap().into_iter().map(|r| r.name).collect();
    assert_eq!(names, ["thread_a", "thread_c"]);
}

#[test]
fn test_fatal_error_keeps_previous_rows() {
    let mut image = snapshot(STACK_CHECKING_BIT);
    let kernel = view(image.clone(), DisplayConfig::default());
    let mut tables = TableSet::new(DisplayConfig::default());
    kernel.refresh(&mut tables).unwrap();

    image.set_halted(false);
    let running = view(image, DisplayConfig::default());
    assert!(running.refresh(&mut tables).is_err());
    assert_eq!(tables.threads.len(), 3);
    assert_eq!(tables.mutexes.len(), 1);
}

#[test]
fn test_thread_registers() {
    let kernel = view(snapshot(0), DisplayConfig::default());

    let regs = kernel.thread_registers(THREAD_C).unwrap();
    assert_eq!(regs.get(0), Some(0xc0));
    assert_eq!(regs.get(11), Some(0xcb));
    assert_eq!(regs.get(12), Some(0xcc));
    assert_eq!(regs.sp(), STACK_C as u32);
    assert_eq!(regs.lr(), 0x0800_0123);
    assert_eq!(regs.pc(), 0x0800_0456);
    assert_eq!(regs.psr(), 0x0100_0000);
}

#[test]
fn test_executing_thread_registers_are_refused() {
    let kernel = view(snapshot(0), DisplayConfig::default());

    let err = kernel.thread_registers(THREAD_B).unwrap_err();
    assert!(err.to_string().contains("executing"));
}

#[test]
fn test_names_and_triggers() {
    let kernel = view(snapshot(0), DisplayConfig::default());

    assert_eq!(kernel.os_name(), "ThreadX");
    assert_eq!(kernel.thread_name(THREAD_C).unwrap(), "thread_c");
    assert_eq!(kernel.find_thread("thread_b").unwrap(), THREAD_B);
    assert!(kernel.find_thread("nope").is_err());
    assert_eq!(kernel.context_switch_addresses(), vec![SYSTEM_SUSPEND]);
}

/// 最後のリフレッシュの呼び出しを記録するだけの受け取り先
#[derive(Default)]
struct CountingSink {
    clears: usize,
    rows: usize,
}

impl RowSink for CountingSink {
    fn clear(&mut self) {
        self.clears += 1;
        self.rows = 0;
    }

    fn add_thread(&mut self, _row: txaware_core::ThreadRow) {
        self.rows += 1;
    }

    fn add_semaphore(&mut self, _row: txaware_core::SemaphoreRow) {
        self.rows += 1;
    }

    fn add_mutex(&mut self, _row: txaware_core::MutexRow) {
        self.rows += 1;
    }
}

#[test]
fn test_custom_sink() {
    let kernel = view(snapshot(0), DisplayConfig::default());
    let mut sink = CountingSink::default();

    kernel.refresh(&mut sink).unwrap();
    assert_eq!(sink.clears, 1);
    assert_eq!(sink.rows, 5);
}
