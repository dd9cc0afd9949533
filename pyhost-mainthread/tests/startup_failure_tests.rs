//! A failing startup hook aborts initialization and leaves no broker behind.

use pyhost_core::InterpreterConfig;
use pyhost_mainthread::{initialize_with, is_running, MainThreadError, StartupHook};

#[test]
fn failing_hook_aborts_startup() {
    let hook: StartupHook = Box::new(|_| Err("registry unavailable".to_string()));
    let err = initialize_with(&InterpreterConfig::default(), Some(hook)).unwrap_err();
    assert_eq!(
        err,
        MainThreadError::InitFailed("registry unavailable".to_string())
    );
    assert!(!is_running());
}
