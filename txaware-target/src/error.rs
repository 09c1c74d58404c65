//! ターゲットアクセスのエラー分類

use thiserror::Error;

/// メモリアクセスエラー
///
/// 1オブジェクトの読み取りだけを諦めればよい一過性のエラーと、
/// リフレッシュ全体を中断すべき致命的なエラーを区別します。
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AccessError {
    /// マップされていない、または読み取れないアドレス
    #[error("memory at 0x{address:08x} ({size} bytes) is not readable")]
    Unmapped { address: u64, size: usize },
    /// ターゲットが停止していない
    #[error("target is not halted")]
    NotHalted,
    /// ターゲットとの接続が切れている
    #[error("target is disconnected")]
    Disconnected,
}

impl AccessError {
    /// リフレッシュ全体を中断すべきエラーかどうか
    pub fn is_fatal(&self) -> bool {
        matches!(self, AccessError::NotHalted | AccessError::Disconnected)
    }
}

/// anyhowエラーが致命的なアクセスエラーを含むかどうか
///
/// AccessError以外のエラー（文字列デコード失敗など）は一過性として扱います。
pub fn is_fatal(err: &anyhow::Error) -> bool {
    err.downcast_ref::<AccessError>()
        .map(AccessError::is_fatal)
        .unwrap_or(false)
}
