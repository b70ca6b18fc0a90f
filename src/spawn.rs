//! `fork()` + `execvp()` による子プロセス起動。
//!
//! 子プロセス側の処理（リダイレクト先ファイルのオープン、fd の付け替え、パイプ fd のクローズ、
//! プログラムイメージの置き換え）はすべて fork 後の子で行う。親に戻るのは PID だけ。
//! 子が exec に失敗した場合はエラーを stderr に書いて `_exit` し、シェルのループには決して戻らない。
//! fork 後の子ではメモリを確保しない。表示用の文字列はすべて fork 前に用意しておく。
//!
//! ## 構成
//!
//! | 型 | 役割 |
//! |-----|------|
//! | [`CStringVec`] | argv 用の NULL 終端ポインタ配列 |
//! | [`OpenTarget`] | リダイレクト先（パス・open フラグ・付け替え先 fd） |
//! | [`Pipe`] | `pipe()` の RAII ラッパー。Drop で両端を close |
//! | [`ChildSpec`] | 子プロセスで行う fd 操作の一覧 |
//! | [`spawn`] | 上記を使って fork + exec し、子 PID を返す |

use std::convert::Infallible;
use std::ffi::{CStr, CString};
use std::io;
use std::os::unix::io::RawFd;

use crate::error::{ChildError, ExecError};
use crate::parser::{Redirection, Stage};

/// `>` / `>>` で作成するファイルのパーミッション（rw-r--r--）。
const CREATE_MODE: libc::c_uint = 0o644;

// ── CStringVec ────────────────────────────────────────────────────

/// argv 用の CString ベクタ。NULL 終端のポインタ配列を構築する。
pub struct CStringVec {
    /// エラー表示用のプログラム名。
    name: String,
    strings: Vec<CString>,
    ptrs: Vec<*const libc::c_char>,
}

impl CStringVec {
    /// ステージの argv から構築する。NUL バイトを含む引数があれば [`ExecError::Nul`]。
    pub fn from_stage(stage: &Stage) -> Result<Self, ExecError> {
        let strings = stage
            .argv()
            .iter()
            .map(|s| CString::new(s.as_bytes()).map_err(|_| ExecError::Nul(s.clone())))
            .collect::<Result<Vec<_>, _>>()?;
        let mut ptrs: Vec<*const libc::c_char> = strings.iter().map(|s| s.as_ptr()).collect();
        ptrs.push(std::ptr::null()); // NULL 終端
        Ok(Self {
            name: stage.program().to_string(),
            strings,
            ptrs,
        })
    }

    /// `argv[0]`。[`Stage`] は空にならないので常に存在する。
    fn program(&self) -> &CString {
        &self.strings[0]
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn as_ptr(&self) -> *const *const libc::c_char {
        self.ptrs.as_ptr()
    }
}

// ── OpenTarget ────────────────────────────────────────────────────

/// 子プロセスで開くリダイレクト先。パスの C 文字列化は fork 前に済ませておく。
pub struct OpenTarget {
    path: CString,
    display: String,
    flags: libc::c_int,
    /// 付け替え先（stdin or stdout）。
    target_fd: RawFd,
}

impl OpenTarget {
    pub fn prepare(redirection: &Redirection) -> Result<Self, ExecError> {
        let display = redirection.path().to_string();
        let path = CString::new(display.as_bytes()).map_err(|_| ExecError::Nul(display.clone()))?;
        let (flags, target_fd) = match redirection {
            Redirection::Input(_) => (libc::O_RDONLY, libc::STDIN_FILENO),
            Redirection::Output { append: true, .. } => (
                libc::O_WRONLY | libc::O_CREAT | libc::O_APPEND,
                libc::STDOUT_FILENO,
            ),
            Redirection::Output { append: false, .. } => (
                libc::O_WRONLY | libc::O_CREAT | libc::O_TRUNC,
                libc::STDOUT_FILENO,
            ),
        };
        Ok(Self {
            path,
            display,
            flags,
            target_fd,
        })
    }

    pub fn is_input(&self) -> bool {
        self.target_fd == libc::STDIN_FILENO
    }

    /// （子プロセス内）ファイルを開いて stdin/stdout に付け替え、元の fd を閉じる。
    fn attach(&self) -> Result<(), ChildError<'_>> {
        let fd = unsafe { libc::open(self.path.as_ptr(), self.flags, CREATE_MODE) };
        if fd < 0 {
            return Err(ChildError::Redirect {
                path: &self.display,
                source: io::Error::last_os_error(),
            });
        }
        if fd != self.target_fd {
            let moved = move_fd(fd, self.target_fd);
            unsafe { libc::close(fd) };
            moved?;
        }
        Ok(())
    }
}

// ── Pipe ──────────────────────────────────────────────────────────

/// 無名パイプ。親側では Drop で両端が close される。
///
/// 両端とも close-on-exec。`dup2` で stdin/stdout に付け替えた fd には引き継がれない。
pub struct Pipe {
    read: RawFd,
    write: RawFd,
}

impl Pipe {
    pub fn new() -> io::Result<Self> {
        let mut fds: [libc::c_int; 2] = [-1; 2];

        #[cfg(any(target_os = "linux", target_os = "android"))]
        let ret = unsafe { libc::pipe2(fds.as_mut_ptr(), libc::O_CLOEXEC) };
        #[cfg(not(any(target_os = "linux", target_os = "android")))]
        let ret = unsafe { libc::pipe(fds.as_mut_ptr()) };

        if ret != 0 {
            return Err(io::Error::last_os_error());
        }

        #[cfg(not(any(target_os = "linux", target_os = "android")))]
        for fd in fds {
            unsafe {
                libc::fcntl(fd, libc::F_SETFD, libc::FD_CLOEXEC);
            }
        }

        Ok(Self {
            read: fds[0],
            write: fds[1],
        })
    }

    pub fn read_fd(&self) -> RawFd {
        self.read
    }

    pub fn write_fd(&self) -> RawFd {
        self.write
    }
}

impl Drop for Pipe {
    fn drop(&mut self) {
        unsafe {
            libc::close(self.read);
            libc::close(self.write);
        }
    }
}

// ── spawn ─────────────────────────────────────────────────────────

/// 子プロセスで行う操作。適用順はフィールド順と同じ。
pub struct ChildSpec<'a> {
    pub argv: &'a CStringVec,
    /// 1. リダイレクト（先頭ステージの入力 / 末尾ステージの出力）
    pub redirect: Option<&'a OpenTarget>,
    /// 2. stdin に付け替えるパイプの読み込み端
    pub stdin: Option<RawFd>,
    /// 3. stdout に付け替えるパイプの書き込み端
    pub stdout: Option<RawFd>,
    /// 4. exec 前に閉じる fd（パイプライン中の全パイプの両端）
    pub close_fds: &'a [RawFd],
    /// バックグラウンド起動なら SIGINT を無視したままにする。
    pub background: bool,
}

/// fork して子プロセスで `ChildSpec` の fd 操作を行い、argv を exec する。成功時は子 PID を返す。
///
/// 返るのは親プロセスだけ。子プロセスは exec するか `_exit` する。
pub fn spawn(spec: &ChildSpec<'_>) -> Result<libc::pid_t, ExecError> {
    match unsafe { libc::fork() } {
        -1 => Err(ExecError::Fork(io::Error::last_os_error())),
        0 => exec_child(spec),
        pid => Ok(pid),
    }
}

/// 子プロセス側。戻らない。
fn exec_child(spec: &ChildSpec<'_>) -> ! {
    reset_signals(spec.background);
    let err = match setup_and_exec(spec) {
        Ok(never) => match never {},
        Err(e) => e,
    };
    report_child_error(&err);
    unsafe { libc::_exit(err.exit_status()) }
}

fn setup_and_exec<'a>(spec: &ChildSpec<'a>) -> Result<Infallible, ChildError<'a>> {
    if let Some(target) = spec.redirect {
        target.attach()?;
    }
    if let Some(fd) = spec.stdin {
        move_fd(fd, libc::STDIN_FILENO)?;
    }
    if let Some(fd) = spec.stdout {
        move_fd(fd, libc::STDOUT_FILENO)?;
    }
    unsafe {
        for &fd in spec.close_fds {
            libc::close(fd);
        }
        libc::execvp(spec.argv.program().as_ptr(), spec.argv.as_ptr());
    }
    // execvp から戻った = 失敗
    let err = io::Error::last_os_error();
    Err(ChildError::from_exec(spec.argv.name(), err))
}

/// `from` を `to` に複製する（子プロセス内）。
fn move_fd<'a>(from: RawFd, to: RawFd) -> Result<(), ChildError<'a>> {
    if unsafe { libc::dup2(from, to) } < 0 {
        return Err(ChildError::Dup(io::Error::last_os_error()));
    }
    Ok(())
}

/// `tinysh: <subject>: <reason>` を stderr に書く。`format!` を使わず部分ごとに write する。
fn report_child_error(err: &ChildError<'_>) {
    let reason: &[u8] = match err {
        ChildError::NotFound(_) => b"command not found",
        ChildError::PermissionDenied(_) => b"permission denied",
        _ => err.errno().map_or(&b"error"[..], strerror),
    };
    let parts: [&[u8]; 5] = [b"tinysh: ", err.subject().as_bytes(), b": ", reason, b"\n"];
    for part in parts {
        unsafe {
            libc::write(libc::STDERR_FILENO, part.as_ptr().cast(), part.len());
        }
    }
}

fn strerror(errno: i32) -> &'static [u8] {
    let msg = unsafe { libc::strerror(errno) };
    if msg.is_null() {
        return b"error";
    }
    unsafe { CStr::from_ptr(msg) }.to_bytes()
}

/// シェルが無視している SIGINT/SIGTERM と、Rust ランタイムが無視している SIGPIPE を
/// デフォルトに戻す（無視設定は exec 後も残る）。バックグラウンドの子は SIGINT を無視したまま。
fn reset_signals(background: bool) {
    unsafe {
        if !background {
            libc::signal(libc::SIGINT, libc::SIG_DFL);
        }
        libc::signal(libc::SIGTERM, libc::SIG_DFL);
        libc::signal(libc::SIGPIPE, libc::SIG_DFL);
    }
}
