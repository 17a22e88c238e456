//! Real-time scheduling helpers (Linux SCHED_FIFO / mlockall; macOS mlockall).
//!
//! A preempted transfer can hold the clock high past 60 µs and power the
//! chip down mid-read; these reduce that jitter for the poll loop.

use crate::cli::RtLock;
use std::sync::OnceLock;

static RT_ONCE: OnceLock<()> = OnceLock::new();

#[cfg(any(target_os = "linux", target_os = "macos"))]
fn is_retryable_memlock_error(err: &std::io::Error) -> bool {
    matches!(err.raw_os_error(), Some(code) if code == libc::EPERM || code == libc::ENOMEM)
}

#[cfg(any(target_os = "linux", target_os = "macos"))]
fn mlockall(flags: libc::c_int) -> std::io::Result<()> {
    let rc = unsafe { libc::mlockall(flags) };
    if rc != 0 {
        Err(std::io::Error::last_os_error())
    } else {
        Ok(())
    }
}

/// Lock process memory according to `lock`. `All` falls back to `Current`
/// when the memlock limit is too small for future pages.
#[cfg(any(target_os = "linux", target_os = "macos"))]
fn try_apply_mem_lock(lock: RtLock) -> eyre::Result<()> {
    use libc::{MCL_CURRENT, MCL_FUTURE};

    let result = match lock {
        RtLock::None => return Ok(()),
        RtLock::Current => mlockall(MCL_CURRENT),
        RtLock::All => mlockall(MCL_CURRENT | MCL_FUTURE),
    };
    let Err(err) = result else {
        return Ok(());
    };
    if matches!(lock, RtLock::All) && is_retryable_memlock_error(&err) {
        match mlockall(MCL_CURRENT) {
            Ok(()) => {
                tracing::warn!(error = %err, "mlockall(current|future) failed; locked current pages only");
                return Ok(());
            }
            Err(e2) => eyre::bail!("mlockall failed: {err}; fallback to current also failed: {e2}"),
        }
    }
    if is_retryable_memlock_error(&err) {
        eyre::bail!("mlockall failed: {err}; hint: needs CAP_IPC_LOCK (or root) and sufficient 'ulimit -l'");
    }
    eyre::bail!("mlockall failed: {err}")
}

/// SCHED_FIFO at `prio`, clamped to the system range (max if unset).
#[cfg(target_os = "linux")]
fn try_apply_fifo_priority(prio: Option<i32>) -> eyre::Result<i32> {
    use libc::{SCHED_FIFO, sched_get_priority_max, sched_get_priority_min, sched_param};

    let (min, max) = unsafe {
        let min = sched_get_priority_min(SCHED_FIFO);
        let max = sched_get_priority_max(SCHED_FIFO);
        if min < 0 || max < 0 {
            (1, 99)
        } else {
            (min, max)
        }
    };
    let prio_val = prio.unwrap_or(max).clamp(min, max);
    let param = sched_param {
        sched_priority: prio_val,
    };
    let rc = unsafe { libc::sched_setscheduler(0, SCHED_FIFO, &param) };
    if rc != 0 {
        let err = std::io::Error::last_os_error();
        if err.raw_os_error() == Some(libc::EPERM) {
            eyre::bail!("{err}; hint: run as root or grant CAP_SYS_NICE: 'sudo setcap cap_sys_nice=ep /path/to/hx711'");
        }
        return Err(eyre::eyre!(err));
    }
    Ok(prio_val)
}

/// Apply real-time settings once per process. Failures are logged and the
/// run continues without them.
#[cfg(target_os = "linux")]
pub fn setup_rt_once(prio: Option<i32>, lock: RtLock) {
    RT_ONCE.get_or_init(|| {
        match try_apply_mem_lock(lock) {
            Ok(()) => tracing::info!(?lock, "rt memory lock applied"),
            Err(err) => tracing::warn!(error = %err, "rt memory lock not applied"),
        }
        match try_apply_fifo_priority(prio) {
            Ok(p) => tracing::info!(priority = p, "rt SCHED_FIFO applied"),
            Err(err) => tracing::warn!(error = %err, "rt SCHED_FIFO not applied"),
        }
    });
}

#[cfg(target_os = "macos")]
pub fn setup_rt_once(_prio: Option<i32>, lock: RtLock) {
    RT_ONCE.get_or_init(|| {
        match try_apply_mem_lock(lock) {
            Ok(()) => tracing::info!(?lock, "rt memory lock applied"),
            Err(err) => tracing::warn!(error = %err, "rt memory lock not applied"),
        }
        tracing::warn!("macOS does not support SCHED_FIFO; only mlockall applied");
    });
}

#[cfg(not(any(target_os = "linux", target_os = "macos")))]
pub fn setup_rt_once(_prio: Option<i32>, _lock: RtLock) {
    RT_ONCE.get_or_init(|| tracing::warn!("real-time mode is not supported on this OS"));
}
