//! エラーメッセージ定数

/// カーネルシンボルが見つからない場合のエラーメッセージ
pub const ERR_SYMBOL_NOT_FOUND: &str = "Kernel symbol not found";

/// 制御ブロック構造体がDWARFに見つからない場合のエラーメッセージ
pub const ERR_STRUCT_NOT_FOUND: &str = "Control block type not found in DWARF";

/// 制御ブロック構造体に必要なフィールドがない場合のエラーメッセージ
pub const ERR_FIELD_NOT_FOUND: &str = "Control block field not found in DWARF";

/// 実行中スレッドのコンテキストを要求された場合のエラーメッセージ
pub const ERR_THREAD_EXECUTING: &str =
    "Thread is executing; its registers are live on the CPU, not saved on its stack";

/// アーキテクチャを判定できない場合のエラーメッセージ
pub const ERR_UNKNOWN_ARCHITECTURE: &str = "Unsupported or unknown target architecture";

/// スレッドが見つからない場合のエラーメッセージ
pub const ERR_THREAD_NOT_FOUND: &str = "Thread not found";
