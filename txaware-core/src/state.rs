//! スレッド状態のデコード

use std::fmt;

/// `tx_thread_state` の値
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ThreadState {
    Ready,
    Completed,
    Terminated,
    Suspended,
    Sleeping,
    WaitingQueue,
    WaitingSemaphore,
    WaitingEventFlag,
    WaitingBlockPool,
    WaitingBytePool,
    WaitingFilesystemIo,
    WaitingFilesystem,
    WaitingNetwork,
    WaitingMutex,
    /// 未知の状態コード
    Other(u32),
}

impl ThreadState {
    /// 状態コードから状態を得る
    pub fn from_code(code: u32) -> Self {
        match code {
            0 => ThreadState::Ready,
            1 => ThreadState::Completed,
            2 => ThreadState::Terminated,
            3 => ThreadState::Suspended,
            4 => ThreadState::Sleeping,
            5 => ThreadState::WaitingQueue,
            6 => ThreadState::WaitingSemaphore,
            7 => ThreadState::WaitingEventFlag,
            8 => ThreadState::WaitingBlockPool,
            9 => ThreadState::WaitingBytePool,
            10 => ThreadState::WaitingFilesystemIo,
            11 => ThreadState::WaitingFilesystem,
            12 => ThreadState::WaitingNetwork,
            13 => ThreadState::WaitingMutex,
            other => ThreadState::Other(other),
        }
    }

    /// 表示ラベル
    pub fn label(&self) -> &'static str {
        match self {
            ThreadState::Ready => "Ready",
            ThreadState::Completed => "Completed",
            ThreadState::Terminated => "Terminated",
            ThreadState::Suspended => "Suspended",
            ThreadState::Sleeping => "Sleeping",
            ThreadState::WaitingQueue => "Waiting - Queue",
            ThreadState::WaitingSemaphore => "Waiting - Semaphore",
            ThreadState::WaitingEventFlag => "Waiting - Event flag",
            ThreadState::WaitingBlockPool => "Waiting - Block pool",
            ThreadState::WaitingBytePool => "Waiting - Byte pool",
            ThreadState::WaitingFilesystemIo => "Waiting - Filesystem I/O",
            ThreadState::WaitingFilesystem => "Waiting - Filesystem",
            ThreadState::WaitingNetwork => "Waiting - Network",
            ThreadState::WaitingMutex => "Waiting - Mutex",
            ThreadState::Other(_) => "Other",
        }
    }
}

impl fmt::Display for ThreadState {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// スレッド一覧に表示する状態
///
/// 実行中のスレッドは保存された状態コードに関わらず `Executing` と表示します。
/// 表示上の上書きであり、状態コード自体を補正するものではありません。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DisplayState {
    Executing,
    State(ThreadState),
}

impl DisplayState {
    /// 制御ブロックのアドレスと実行中スレッドのポインタから表示状態を決める
    pub fn resolve(address: u64, current_thread: u64, state_code: u32) -> Self {
        if address == current_thread {
            DisplayState::Executing
        } else {
            DisplayState::State(ThreadState::from_code(state_code))
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            DisplayState::Executing => "Executing",
            DisplayState::State(state) => state.label(),
        }
    }
}

impl fmt::Display for DisplayState {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_defined_codes() {
        let expected = [
            "Ready",
            "Completed",
            "Terminated",
            "Suspended",
            "Sleeping",
            "Waiting - Queue",
            "Waiting - Semaphore",
            "Waiting - Event flag",
            "Waiting - Block pool",
            "Waiting - Byte pool",
            "Waiting - Filesystem I/O",
            "Waiting - Filesystem",
            "Waiting - Network",
            "Waiting - Mutex",
        ];

        for (code, label) in expected.iter().enumerate() {
            assert_eq!(ThreadState::from_code(code as u32).label(), *label);
        }
    }

    #[test]
    fn test_unknown_codes_are_other() {
        assert_eq!(ThreadState::from_code(14), ThreadState::Other(14));
        assert_eq!(ThreadState::from_code(14).label(), "Other");
        assert_eq!(ThreadState::from_code(u32::MAX).label(), "Other");
    }

    #[test]
    fn test_executing_overrides_state_code() {
        for code in [0, 3, 13, 99] {
            assert_eq!(DisplayState::resolve(0x2000_0100, 0x2000_0100, code), DisplayState::Executing);
        }
        assert_eq!(
            DisplayState::resolve(0x2000_0100, 0x2000_0200, 4).label(),
            "Sleeping"
        );
    }
}
