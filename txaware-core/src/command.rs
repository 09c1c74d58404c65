//! 対話シェルのコマンド

/// 対話シェルのコマンド
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// スレッド一覧表示
    Threads,
    /// セマフォ一覧表示
    Semaphores,
    /// ミューテックス一覧表示
    Mutexes,
    /// 表示対象の表をすべて表示
    Show,
    /// スレッドの保存レジスタ表示（名前またはTCBアドレス）
    Registers(String),
    /// TCBアドレスからスレッド名を表示
    Name(String),
    /// コンテキストスイッチ中とみなすアドレス表示
    Triggers,
    /// 名前でスレッドのTCBを探す
    Find(String),
    /// ヘルプ表示
    Help,
    /// 終了
    Quit,
}

impl Command {
    /// コマンド文字列をパースする
    pub fn parse(input: &str) -> Option<Self> {
        let parts: Vec<&str> = input.split_whitespace().collect();
        if parts.is_empty() {
            return None;
        }

        let arg = || {
            if parts.len() > 1 {
                Some(parts[1..].join(" "))
            } else {
                None
            }
        };

        match parts[0] {
            "threads" | "t" => Some(Command::Threads),
            "semaphores" | "sem" => Some(Command::Semaphores),
            "mutexes" | "mtx" => Some(Command::Mutexes),
            "show" | "all" => Some(Command::Show),
            "regs" | "registers" | "r" => arg().map(Command::Registers),
            "name" => arg().map(Command::Name),
            "triggers" => Some(Command::Triggers),
            "find" => arg().map(Command::Find),
            "help" | "h" | "?" => Some(Command::Help),
            "quit" | "q" | "exit" => Some(Command::Quit),
            _ => None,
        }
    }
}
