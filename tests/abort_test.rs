//! A panic escaping a coroutine has no handle to land in and must take the
//! process down. Runs the panicking side in a child copy of this binary.
#![cfg(feature = "async")]

use skein::prelude::*;
use std::process::Command;
use std::thread;
use std::time::Duration;

const CHILD_ENV: &str = "SKEIN_COROUTINE_PANIC_CHILD";

#[test]
fn coroutine_panic_child() {
    if std::env::var_os(CHILD_ENV).is_none() {
        return;
    }

    let pool = SharedPool::with_threads(1).unwrap();
    spawn_on(&pool, async {
        panic!("escaped a coroutine");
    })
    .unwrap();

    // only reached if the worker survived the panic
    thread::sleep(Duration::from_secs(5));
    std::process::exit(0);
}

#[test]
fn test_coroutine_panic_aborts_process() {
    let output = Command::new(std::env::current_exe().unwrap())
        .args(["coroutine_panic_child", "--exact", "--nocapture", "--test-threads=1"])
        .env(CHILD_ENV, "1")
        .output()
        .unwrap();

    #[cfg(target_os = "linux")]
    {
        use std::os::unix::process::ExitStatusExt;
        assert_eq!(
            output.status.signal(),
            Some(libc::SIGABRT),
            "child exited with {:?}\n{}",
            output.status,
            String::from_utf8_lossy(&output.stderr)
        );
    }

    #[cfg(not(target_os = "linux"))]
    assert!(!output.status.success());
}
