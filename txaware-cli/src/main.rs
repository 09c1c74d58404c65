//! txaware CLI - コマンドラインインターフェース
//!
//! 停止中のThreadXターゲット（ELF + メモリダンプ）のスレッド・セマフォ・ミューテックスを表示します。

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use tracing::debug;
use tracing_subscriber::EnvFilter;
use txaware_core::parse::{parse_address, parse_region};
use txaware_core::{Architecture, Command, DisplayConfig, KernelView, MemoryImage, Table, TableSet};
use txaware_dwarf::{DwarfLoader, LineInfoProvider, SymbolResolver};

/// txaware - ThreadX kernel awareness
#[derive(Parser)]
#[command(name = "txaware")]
#[command(version = "0.1.0")]
#[command(about = "ThreadX kernel awareness for halted Cortex-M targets", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: AwareCommand,
}

#[derive(Subcommand)]
enum AwareCommand {
    /// Print the thread, semaphore and mutex tables once
    Show(TargetArgs),

    /// Open an interactive shell on the snapshot
    Shell(TargetArgs),
}

#[derive(Args)]
struct TargetArgs {
    /// Path to the firmware ELF (symbols and DWARF)
    #[arg(short, long)]
    elf: String,

    /// Memory dump loaded at an address, as FILE@ADDRESS (repeatable)
    #[arg(short, long = "dump", value_name = "FILE@ADDRESS", required = true)]
    dumps: Vec<String>,

    /// Target architecture (detected from the ELF when omitted)
    #[arg(long)]
    arch: Option<Architecture>,

    /// Do not walk or show the semaphore table
    #[arg(long)]
    no_semaphores: bool,

    /// Do not walk or show the mutex table
    #[arg(long)]
    no_mutexes: bool,

    /// Highlight ready, executing and waiting threads with ANSI bold
    #[arg(long)]
    color: bool,

    /// Enable debug logging (overridden by RUST_LOG)
    #[arg(short, long)]
    verbose: bool,
}

/// ELFとダンプから組み立てたセッション
struct Session {
    kernel: KernelView,
    tables: TableSet,
    resolver: SymbolResolver,
    lines: Option<LineInfoProvider>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        AwareCommand::Show(args) => {
            init_logging(args.verbose);
            let mut session = init_session(&args)?;
            session.kernel.refresh(&mut session.tables)?;
            print!("{}", session.tables.render_all());
        }
        AwareCommand::Shell(args) => {
            init_logging(args.verbose);
            println!("txaware - ThreadX kernel awareness");
            println!("Version 0.1.0");
            println!();

            let mut session = init_session(&args)?;
            println!("{} kernel, {} target", session.kernel.os_name(), session.kernel.architecture());
            run_repl(&mut session)?;
        }
    }

    Ok(())
}

/// ログ出力を初期化する（RUST_LOGが優先）
fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// ELFとメモリダンプを読み込んでセッションを作成する
fn init_session(args: &TargetArgs) -> Result<Session> {
    let loader = DwarfLoader::load(&args.elf)?;
    let resolver = SymbolResolver::new(&loader)?;
    debug!("Loaded {} symbols from {}", resolver.all_symbols().count(), args.elf);

    let mut image = MemoryImage::new();
    for dump in &args.dumps {
        let (path, base) = parse_region(dump)?;
        image.load_region(&path, base)?;
    }

    let config = DisplayConfig {
        show_semaphores: !args.no_semaphores,
        show_mutexes: !args.no_mutexes,
        color: args.color,
        ..DisplayConfig::default()
    };

    let kernel = KernelView::from_elf(Box::new(image), &loader, &resolver, config.clone(), args.arch)?;

    // 行情報はレジスタ表示の補助なので、なくても続行する
    let lines = if loader.has_debug_info() {
        LineInfoProvider::new(&loader)
            .map_err(|e| debug!("No line information: {}", e))
            .ok()
    } else {
        None
    };

    Ok(Session {
        kernel,
        tables: TableSet::new(config),
        resolver,
        lines,
    })
}

/// REPLループを実行する
fn run_repl(session: &mut Session) -> Result<()> {
    println!("Type 'help' for available commands, 'quit' to exit.");
    println!();

    let mut rl = DefaultEditor::new()?;

    loop {
        let readline = rl.readline("(txaware) ");
        match readline {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }

                rl.add_history_entry(line)?;

                match handle_command(session, line) {
                    Ok(true) => {}
                    Ok(false) => break,
                    Err(e) => eprintln!("Error: {}", e),
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("CTRL-C");
                break;
            }
            Err(ReadlineError::Eof) => {
                println!("CTRL-D");
                break;
            }
            Err(err) => {
                eprintln!("Error: {:?}", err);
                break;
            }
        }
    }

    Ok(())
}

/// コマンドを処理する（falseならREPLを終了）
fn handle_command(session: &mut Session, line: &str) -> Result<bool> {
    match Command::parse(line) {
        Some(Command::Help) => print_help(),
        Some(Command::Quit) => {
            println!("Goodbye!");
            return Ok(false);
        }
        Some(Command::Threads) => handle_table(session, Table::Threads)?,
        Some(Command::Semaphores) => handle_table(session, Table::Semaphores)?,
        Some(Command::Mutexes) => handle_table(session, Table::Mutexes)?,
        Some(Command::Show) => {
            session.kernel.refresh(&mut session.tables)?;
            print!("{}", session.tables.render_all());
        }
        Some(Command::Registers(target)) => handle_registers(session, &target)?,
        Some(Command::Name(addr)) => {
            let thread = parse_address(&addr)?;
            println!("{}", session.kernel.thread_name(thread)?);
        }
        Some(Command::Triggers) => handle_triggers(session),
        Some(Command::Find(name)) => {
            let thread = session.kernel.find_thread(&name)?;
            println!("{} @ 0x{:08x}", name, thread);
        }
        None => {
            println!("Unknown command: {}", line);
            println!("Type 'help' for available commands.");
        }
    }

    Ok(true)
}

/// 表を1つ読み直して表示する
fn handle_table(session: &mut Session, table: Table) -> Result<()> {
    if !session.kernel.config().is_shown(table) {
        println!("{} table is disabled", table);
        return Ok(());
    }

    session.kernel.refresh(&mut session.tables)?;
    print!("{}", session.tables.render(table));
    Ok(())
}

/// Registersコマンドを処理する
fn handle_registers(session: &Session, target: &str) -> Result<()> {
    let thread = match parse_address(target) {
        Ok(addr) => addr,
        Err(_) => session.kernel.find_thread(target)?,
    };

    let regs = session.kernel.thread_registers(thread)?;
    println!("Thread '{}' @ 0x{:08x}", session.kernel.thread_name(thread)?, thread);
    print!("{}", regs);
    println!();
    print_location(session, "PC", regs.pc());
    print_location(session, "LR", regs.lr());
    Ok(())
}

/// アドレスのシンボルとソース行を表示する
fn print_location(session: &Session, label: &str, value: u32) {
    let addr = value as u64 & !1;

    let symbol = match session.resolver.reverse_resolve(addr) {
        Some(sym) => format!("{}+0x{:x}", sym.name, addr - sym.code_address()),
        None => "??".to_string(),
    };

    let line = session
        .lines
        .as_ref()
        .and_then(|lines| lines.lookup(addr).ok().flatten())
        .map(|info| format!(" at {}", info))
        .unwrap_or_default();

    println!("{} 0x{:08x} in {}{}", label, value, symbol, line);
}

/// Triggersコマンドを処理する
fn handle_triggers(session: &Session) {
    let addresses = session.kernel.context_switch_addresses();
    if addresses.is_empty() {
        println!("No context switch addresses found");
        return;
    }

    println!("{} context switch addresses:", session.kernel.os_name());
    for addr in addresses {
        match session.resolver.reverse_resolve(addr) {
            Some(sym) => println!("  0x{:08x} ({})", addr, sym.name),
            None => println!("  0x{:08x}", addr),
        }
    }
}

fn print_help() {
    println!("Available commands:");
    println!();
    println!("  help           - Show this help message");
    println!("  quit/exit/q    - Exit the shell");
    println!();
    println!("Kernel objects:");
    println!("  threads (t)    - Show the thread table");
    println!("  semaphores     - Show the semaphore table");
    println!("  mutexes        - Show the mutex table");
    println!("  show           - Show all enabled tables");
    println!();
    println!("Threads:");
    println!("  regs <thread>  - Show saved registers of a thread (name or TCB address)");
    println!("  name <addr>    - Show the name of the thread at a TCB address");
    println!("  find <name>    - Find the TCB address of a thread");
    println!("  triggers       - Show addresses where thread state is in flux");
    println!();
    println!("Examples:");
    println!("  regs rx_thread");
    println!("  regs 0x20000a40");
    println!("  name 0x20000a40");
}
