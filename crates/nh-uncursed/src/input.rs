//! Input wait multiplexing
//!
//! The input backend blocks in one place for whichever comes first: its own
//! device, a watched descriptor, or a wakeup from a [`SignalWaker`]. The
//! waker is a flag plus a self-pipe, so `wake` is safe to call from a
//! signal handler or another thread.

use std::collections::VecDeque;
use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use crate::key::Key;

#[cfg(unix)]
pub use std::os::fd::RawFd;
#[cfg(not(unix))]
pub type RawFd = i32;

struct WakerInner {
    pending: AtomicBool,
    /// (read end, write end); absent if the pipe could not be made.
    pipe: Option<(RawFd, RawFd)>,
}

impl Drop for WakerInner {
    fn drop(&mut self) {
        if let Some((r, w)) = self.pipe {
            close_pipe(r, w);
        }
    }
}

/// Makes a blocked input wait return [`Key::Signal`]
#[derive(Clone)]
pub struct SignalWaker {
    inner: Arc<WakerInner>,
}

impl Default for SignalWaker {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for SignalWaker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignalWaker")
            .field("pending", &self.is_pending())
            .finish()
    }
}

#[cfg(unix)]
fn open_pipe() -> Option<(RawFd, RawFd)> {
    let mut fds = [0 as RawFd; 2];
    // SAFETY: `fds` has room for the two descriptors pipe(2) writes.
    if unsafe { libc::pipe(fds.as_mut_ptr()) } != 0 {
        tracing::warn!(error = %io::Error::last_os_error(), "signal wake pipe unavailable");
        return None;
    }
    for fd in fds {
        // SAFETY: fd was just returned by pipe(2).
        unsafe {
            let flags = libc::fcntl(fd, libc::F_GETFL);
            libc::fcntl(fd, libc::F_SETFL, flags | libc::O_NONBLOCK);
            libc::fcntl(fd, libc::F_SETFD, libc::FD_CLOEXEC);
        }
    }
    Some((fds[0], fds[1]))
}

#[cfg(unix)]
fn close_pipe(r: RawFd, w: RawFd) {
    // SAFETY: both descriptors were opened by `open_pipe` and are closed
    // exactly once, when the waker goes away.
    unsafe {
        libc::close(r);
        libc::close(w);
    }
}

#[cfg(unix)]
fn write_byte(fd: RawFd) {
    let byte = 1u8;
    // SAFETY: writing one byte from a valid buffer to our own pipe. A full
    // pipe already guarantees a wakeup, so the result is moot.
    unsafe {
        libc::write(fd, (&byte as *const u8).cast(), 1);
    }
}

#[cfg(unix)]
fn drain_pipe(fd: RawFd) {
    let mut buf = [0u8; 64];
    // SAFETY: reading into a local buffer of the stated size from a
    // non-blocking descriptor we own.
    while unsafe { libc::read(fd, buf.as_mut_ptr().cast(), buf.len()) } > 0 {}
}

#[cfg(not(unix))]
fn open_pipe() -> Option<(RawFd, RawFd)> {
    None
}

#[cfg(not(unix))]
fn close_pipe(_r: RawFd, _w: RawFd) {}

#[cfg(not(unix))]
fn write_byte(_fd: RawFd) {}

#[cfg(not(unix))]
fn drain_pipe(_fd: RawFd) {}

impl SignalWaker {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(WakerInner {
                pending: AtomicBool::new(false),
                pipe: open_pipe(),
            }),
        }
    }

    /// Request a wakeup. Only performs an atomic store and a one-byte
    /// write, so it may be called from a signal handler.
    pub fn wake(&self) {
        self.inner.pending.store(true, Ordering::SeqCst);
        if let Some((_, w)) = self.inner.pipe {
            write_byte(w);
        }
    }

    pub fn is_pending(&self) -> bool {
        self.inner.pending.load(Ordering::SeqCst)
    }

    /// Consume a pending wakeup.
    pub fn take(&self) -> bool {
        let was = self.inner.pending.swap(false, Ordering::SeqCst);
        self.drain();
        was
    }

    /// Descriptor that becomes readable on `wake`.
    pub fn read_fd(&self) -> Option<RawFd> {
        self.inner.pipe.map(|(r, _)| r)
    }

    fn drain(&self) {
        if let Some((r, _)) = self.inner.pipe {
            drain_pipe(r);
        }
    }
}

/// What the input backend may wait on besides its own device
#[derive(Debug, Clone, Copy)]
pub struct InputSources<'a> {
    pub watched: &'a [RawFd],
    pub waker: &'a SignalWaker,
}

/// Which source ended a wait
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Readiness {
    /// The backend's own device has input.
    Primary,
    Signal,
    OtherFd,
    Timeout,
}

impl Readiness {
    /// The key reported for anything but primary input.
    pub fn as_key(self) -> Option<Key> {
        match self {
            Readiness::Primary => None,
            Readiness::Signal => Some(Key::Signal),
            Readiness::OtherFd => Some(Key::OtherFd),
            Readiness::Timeout => Some(Key::Timeout),
        }
    }
}

/// Block until one of the sources is ready or the timeout expires.
///
/// A pending wakeup wins over everything else and is consumed.
#[cfg(unix)]
pub fn wait_readable(
    primary: Option<RawFd>,
    sources: &InputSources<'_>,
    timeout: Option<Duration>,
) -> io::Result<Readiness> {
    if sources.waker.take() {
        return Ok(Readiness::Signal);
    }

    let mut fds: Vec<libc::pollfd> = Vec::with_capacity(sources.watched.len() + 2);
    let poll_for = |fd| libc::pollfd {
        fd,
        events: libc::POLLIN,
        revents: 0,
    };
    if let Some(fd) = sources.waker.read_fd() {
        fds.push(poll_for(fd));
    }
    let primary_at = primary.map(|fd| {
        fds.push(poll_for(fd));
        fds.len() - 1
    });
    let watched_from = fds.len();
    fds.extend(sources.watched.iter().map(|&fd| poll_for(fd)));

    let timeout_ms = timeout.map_or(-1, |t| t.as_millis().min(i32::MAX as u128) as i32);
    loop {
        // SAFETY: `fds` is a valid, initialized slice of pollfd for its
        // whole length.
        let n = unsafe { libc::poll(fds.as_mut_ptr(), fds.len() as libc::nfds_t, timeout_ms) };
        if n < 0 {
            let err = io::Error::last_os_error();
            if err.kind() == io::ErrorKind::Interrupted {
                if sources.waker.take() {
                    return Ok(Readiness::Signal);
                }
                continue;
            }
            return Err(err);
        }
        if n == 0 {
            return Ok(Readiness::Timeout);
        }
        break;
    }

    let ready = |p: &libc::pollfd| p.revents & (libc::POLLIN | libc::POLLHUP | libc::POLLERR) != 0;
    if sources.waker.take() {
        return Ok(Readiness::Signal);
    }
    if primary_at.is_some_and(|i| ready(&fds[i])) {
        return Ok(Readiness::Primary);
    }
    if fds[watched_from..].iter().any(ready) {
        return Ok(Readiness::OtherFd);
    }
    Ok(Readiness::Timeout)
}

#[cfg(not(unix))]
pub fn wait_readable(
    primary: Option<RawFd>,
    sources: &InputSources<'_>,
    timeout: Option<Duration>,
) -> io::Result<Readiness> {
    if sources.waker.take() {
        return Ok(Readiness::Signal);
    }
    if primary.is_some() {
        return Ok(Readiness::Primary);
    }
    std::thread::sleep(timeout.unwrap_or(Duration::from_millis(50)));
    Ok(if sources.waker.take() {
        Readiness::Signal
    } else {
        Readiness::Timeout
    })
}

/// Core-side input bookkeeping
#[derive(Debug, Default)]
pub struct InputState {
    hangup: bool,
    pending: VecDeque<Key>,
    watched: Vec<RawFd>,
    waker: SignalWaker,
}

impl InputState {
    pub fn is_hung_up(&self) -> bool {
        self.hangup
    }

    /// Irreversible for the life of the process.
    pub(crate) fn hang_up(&mut self) {
        if !self.hangup {
            tracing::warn!("terminal hung up");
        }
        self.hangup = true;
    }

    pub(crate) fn push(&mut self, key: Key) {
        self.pending.push_back(key);
    }

    pub(crate) fn pop(&mut self) -> Option<Key> {
        self.pending.pop_front()
    }

    /// Returns false if the descriptor was already in the requested state.
    pub(crate) fn watch(&mut self, fd: RawFd, watch: bool) -> bool {
        let present = self.watched.contains(&fd);
        match (watch, present) {
            (true, false) => self.watched.push(fd),
            (false, true) => self.watched.retain(|&w| w != fd),
            _ => return false,
        }
        true
    }

    pub fn waker(&self) -> &SignalWaker {
        &self.waker
    }

    pub(crate) fn sources(&self) -> InputSources<'_> {
        InputSources {
            watched: &self.watched,
            waker: &self.waker,
        }
    }
}
