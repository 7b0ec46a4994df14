//! This module provides ways to tweak mocked stores, so that they can return errors on some tests
//!
//! A [`Cache`](crate::cache::Cache) given a `MockBehaviour` can stand for a flaky backend, e.g. as the remote end of a [`Provider`](crate::Provider).

use crate::error::NetworkError;

/// This stores some behaviour tweaks, that describe how a mocked instance will behave during a given test
///
/// So that a functions fails _n_ times after _m_ initial successes, set `(m, n)` for the suited parameter
#[derive(Default, Clone, Debug)]
pub struct MockBehaviour {
    /// If this is true, every action will be allowed
    pub is_suspended: bool,

    // From the DietLogSource trait
    pub query_behaviour: (u32, u32),
    pub add_behaviour: (u32, u32),
    pub remove_behaviour: (u32, u32),
}

impl MockBehaviour {
    pub fn new() -> Self {
        Self::default()
    }

    /// All actions will fail at once, for `n_fails` times
    pub fn fail_now(n_fails: u32) -> Self {
        Self {
            is_suspended: false,
            query_behaviour: (0, n_fails),
            add_behaviour: (0, n_fails),
            remove_behaviour: (0, n_fails),
        }
    }

    /// Suspend this mock behaviour until you call `resume`
    pub fn suspend(&mut self) {
        self.is_suspended = true;
    }
    /// Make this behaviour active again
    pub fn resume(&mut self) {
        self.is_suspended = false;
    }

    pub fn can_query(&mut self) -> Result<(), NetworkError> {
        if self.is_suspended { return Ok(()) }
        decrement(&mut self.query_behaviour, "query")
    }
    pub fn can_add(&mut self) -> Result<(), NetworkError> {
        if self.is_suspended { return Ok(()) }
        decrement(&mut self.add_behaviour, "add")
    }
    pub fn can_remove(&mut self) -> Result<(), NetworkError> {
        if self.is_suspended { return Ok(()) }
        decrement(&mut self.remove_behaviour, "remove")
    }
}


/// Return Ok(()) in case the value is `(1+, _)` or `(_, 0)`, or return Err and decrement otherwise
fn decrement(value: &mut (u32, u32), descr: &str) -> Result<(), NetworkError> {
    let remaining_successes = value.0;
    let remaining_failures = value.1;

    if remaining_successes > 0 {
        value.0 = value.0 - 1;
        log::debug!("Mock behaviour: allowing a {} ({:?})", descr, value);
        Ok(())
    } else {
        if remaining_failures > 0 {
            value.1 = value.1 - 1;
            log::debug!("Mock behaviour: failing a {} ({:?})", descr, value);
            Err(NetworkError::Mocked(format!("Mocked behaviour requires this {} to fail this time. ({:?})", descr, value)))
        } else {
            log::debug!("Mock behaviour: allowing a {} ({:?})", descr, value);
            Ok(())
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_mock_behaviour() {
        let mut ok = MockBehaviour::new();
        assert!(ok.can_query().is_ok());
        assert!(ok.can_add().is_ok());
        assert!(ok.can_remove().is_ok());

        let mut now = MockBehaviour::fail_now(2);
        assert!(now.can_query().is_err());
        assert!(now.can_add().is_err());
        assert!(now.can_add().is_err());
        assert!(now.can_query().is_err());
        assert!(now.can_query().is_ok());
        assert!(now.can_add().is_ok());
        assert!(now.can_remove().is_err());

        let mut custom = MockBehaviour{
            add_behaviour: (1,2),
            ..MockBehaviour::default()
        };
        assert!(custom.can_add().is_ok());
        assert!(custom.can_add().is_err());
        custom.suspend();
        assert!(custom.can_add().is_ok());
        custom.resume();
        assert!(custom.can_add().is_err());
        assert!(custom.can_add().is_ok());
        assert!(custom.can_query().is_ok());
    }
}
