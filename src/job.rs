//! 子プロセスの待機と、バックグラウンド PID の記録。
//!
//! フォアグラウンドは [`wait_for`] で 1 プロセスずつ `waitpid` する。
//! バックグラウンドで起動したプロセスは [`BackgroundTable`] に PID を記録するだけで、
//! 待機も reap もしない（終了後はゾンビとして残る。ジョブ制御は持たない）。

use libc::pid_t;

/// `waitpid` の raw status を終了ステータスに変換する。
///
/// - 正常終了 → 終了コード
/// - シグナル終了 → 128 + シグナル番号
/// - それ以外 → 1
pub fn exit_code(status: i32) -> i32 {
    if libc::WIFEXITED(status) {
        libc::WEXITSTATUS(status)
    } else if libc::WIFSIGNALED(status) {
        128 + libc::WTERMSIG(status)
    } else {
        1
    }
}

/// 子プロセスの終了を待ち、終了ステータスを返す。EINTR ならリトライする。
pub fn wait_for(pid: pid_t) -> i32 {
    let mut status = 0i32;
    loop {
        let ret = unsafe { libc::waitpid(pid, &mut status, 0) };
        if ret == pid {
            let code = exit_code(status);
            log::debug!("pid {} exited with {}", pid, code);
            return code;
        }
        let err = std::io::Error::last_os_error();
        if err.raw_os_error() == Some(libc::EINTR) {
            continue;
        }
        log::warn!("waitpid({}): {}", pid, err);
        return 1;
    }
}

/// 全プロセスの終了を待つ。個々のステータスは返さない。
pub fn wait_all(pids: &[pid_t]) {
    for &pid in pids {
        wait_for(pid);
    }
}

// ── バックグラウンド記録 ───────────────────────────────────────────────

/// バックグラウンドで起動した PID の記録。観測用で、reap はしない。
#[derive(Debug, Default)]
pub struct BackgroundTable {
    pids: Vec<pid_t>,
}

impl BackgroundTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, pid: pid_t) {
        log::info!("background pid {}", pid);
        self.pids.push(pid);
    }

    pub fn pids(&self) -> &[pid_t] {
        &self.pids
    }

    pub fn last(&self) -> Option<pid_t> {
        self.pids.last().copied()
    }
}
