//! txaware ターゲットアクセス
//!
//! このクレートは、停止中のターゲットのメモリを読み取るための低レベル機能を提供します。
//! メモリ読み取りインターフェース、アクセスエラーの分類、メモリダンプのスナップショット、
//! スレッドの保存レジスタセットを扱います。

pub mod error;
pub mod memory;
pub mod image;
pub mod registers;

pub use error::{is_fatal, AccessError};
pub use memory::{MemoryReadable, TargetMemory};
pub use image::MemoryImage;
pub use registers::{RegisterFrame, REGISTER_COUNT, REGISTER_NAMES};

/// ターゲットアクセスの結果型
pub type Result<T> = anyhow::Result<T>;
