//! Terminal Echo Control
//!
//! Password entry turns terminal echo off for the duration of one read.
//! [`EchoGuard`] owns the saved terminal mode and restores it when dropped,
//! on both success and error paths. The saved mode is also published to the
//! Ctrl-C handler so an interrupt during a password prompt does not leave
//! the terminal silent.
//!
//! ## Platform Support
//!
//! - **Unix**: `termios` via `libc`
//! - **Other**: delegated to `rpassword`

use std::io;
use zeroize::Zeroizing;

#[cfg(unix)]
use std::io::{BufRead, Write};
#[cfg(unix)]
use std::sync::Mutex;

/// Terminal mode saved by the active guard, if any
#[cfg(unix)]
static SAVED_MODE: Mutex<Option<(libc::c_int, libc::termios)>> = Mutex::new(None);

/// Exit status used after an interrupt (128 + SIGINT)
const INTERRUPTED_EXIT_CODE: i32 = 130;

/// Disables echo on a terminal until dropped.
///
/// On a descriptor that is not a terminal (piped input) the guard is a
/// no-op.
#[cfg(unix)]
pub struct EchoGuard {
    fd: libc::c_int,
    saved: Option<libc::termios>,
}

#[cfg(unix)]
impl EchoGuard {
    pub fn new(fd: libc::c_int) -> io::Result<Self> {
        // SAFETY: termios is plain old data; tcgetattr fully initialises it on success.
        let mut mode: libc::termios = unsafe { std::mem::zeroed() };
        if unsafe { libc::tcgetattr(fd, &mut mode) } != 0 {
            let err = io::Error::last_os_error();
            if err.raw_os_error() == Some(libc::ENOTTY) {
                return Ok(Self { fd, saved: None });
            }
            return Err(err);
        }

        let mut silent = mode;
        silent.c_lflag &= !(libc::ECHO | libc::ECHONL);
        silent.c_lflag |= libc::ICANON;
        if unsafe { libc::tcsetattr(fd, libc::TCSANOW, &silent) } != 0 {
            return Err(io::Error::last_os_error());
        }

        if let Ok(mut slot) = SAVED_MODE.lock() {
            *slot = Some((fd, mode));
        }

        Ok(Self {
            fd,
            saved: Some(mode),
        })
    }

    /// Whether echo was actually turned off
    pub fn is_active(&self) -> bool {
        self.saved.is_some()
    }
}

#[cfg(unix)]
impl Drop for EchoGuard {
    fn drop(&mut self) {
        if let Some(mode) = self.saved.take() {
            unsafe {
                libc::tcsetattr(self.fd, libc::TCSANOW, &mode);
            }
            if let Ok(mut slot) = SAVED_MODE.lock() {
                *slot = None;
            }
        }
    }
}

#[cfg(unix)]
fn restore_saved_mode() {
    if let Ok(mut slot) = SAVED_MODE.lock() {
        if let Some((fd, mode)) = slot.take() {
            unsafe {
                libc::tcsetattr(fd, libc::TCSANOW, &mode);
            }
        }
    }
}

#[cfg(not(unix))]
fn restore_saved_mode() {}

/// Restore the terminal and exit when Ctrl-C is pressed.
pub fn install_interrupt_handler() -> Result<(), ctrlc::Error> {
    ctrlc::set_handler(|| {
        restore_saved_mode();
        println!();
        std::process::exit(INTERRUPTED_EXIT_CODE);
    })
}

/// Read a line from stdin without echoing it
#[cfg(unix)]
pub fn read_password(prompt: &str) -> io::Result<Zeroizing<String>> {
    print!("{}", prompt);
    io::stdout().flush()?;

    let mut line = Zeroizing::new(String::new());
    let read = {
        let guard = EchoGuard::new(libc::STDIN_FILENO)?;
        let read = io::stdin().lock().read_line(&mut line);
        if guard.is_active() {
            println!();
        }
        read
    }?;

    if read == 0 {
        return Err(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            "end of input while reading password",
        ));
    }

    let trimmed_len = line.trim_end_matches(['\r', '\n']).len();
    line.truncate(trimmed_len);
    Ok(line)
}

/// Read a line from stdin without echoing it
#[cfg(not(unix))]
pub fn read_password(prompt: &str) -> io::Result<Zeroizing<String>> {
    rpassword::prompt_password(prompt).map(Zeroizing::new)
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[test]
    fn test_guard_on_non_terminal_is_noop() {
        let file = tempfile::tempfile().unwrap();
        let fd = std::os::unix::io::AsRawFd::as_raw_fd(&file);

        let guard = EchoGuard::new(fd).unwrap();
        assert!(!guard.is_active());
        drop(guard);

        assert!(SAVED_MODE.lock().unwrap().is_none());
    }
}
