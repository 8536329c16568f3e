/// Shared test utilities for dbhandle integration tests
use async_trait::async_trait;
use dbhandle::config::DatabaseConfig;
use dbhandle::driver::{Driver, DriverConnection};
use dbhandle::error::{BoxError, DriverError};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// A scripted driver call
#[derive(Debug, Clone)]
enum Expectation {
    Ping(Option<String>),
    Close(Option<String>),
}

#[derive(Default)]
struct MockState {
    expectations: Mutex<VecDeque<Expectation>>,
    opened: Mutex<Vec<String>>,
    open_error: Mutex<Option<String>>,
    pings: AtomicUsize,
    closes: AtomicUsize,
}

/// Driver whose connections answer from a script of expectations.
///
/// Calls are matched in order. A call with no matching expectation fails,
/// so an unscripted `close` or `ping` surfaces as an error.
#[derive(Clone, Default)]
pub struct MockDriver {
    state: Arc<MockState>,
}

#[allow(dead_code)]
impl MockDriver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `open` fail with `message`
    pub fn expect_open_error(&self, message: &str) -> &Self {
        *self.state.open_error.lock().unwrap() = Some(message.to_string());
        self
    }

    pub fn expect_ping(&self) -> &Self {
        self.push(Expectation::Ping(None))
    }

    pub fn expect_ping_error(&self, message: &str) -> &Self {
        self.push(Expectation::Ping(Some(message.to_string())))
    }

    pub fn expect_close(&self) -> &Self {
        self.push(Expectation::Close(None))
    }

    pub fn expect_close_error(&self, message: &str) -> &Self {
        self.push(Expectation::Close(Some(message.to_string())))
    }

    /// Number of ping round-trips that reached the driver
    pub fn pings(&self) -> usize {
        self.state.pings.load(Ordering::SeqCst)
    }

    /// Number of close calls that reached the driver
    pub fn closes(&self) -> usize {
        self.state.closes.load(Ordering::SeqCst)
    }

    /// Connection strings passed to `open`
    pub fn opened(&self) -> Vec<String> {
        self.state.opened.lock().unwrap().clone()
    }

    pub fn all_expectations_met(&self) -> bool {
        self.state.expectations.lock().unwrap().is_empty()
    }

    fn push(&self, expectation: Expectation) -> &Self {
        self.state
            .expectations
            .lock()
            .unwrap()
            .push_back(expectation);
        self
    }
}

#[async_trait]
impl Driver for MockDriver {
    async fn open(&self, conninfo: &str) -> Result<Box<dyn DriverConnection>, DriverError> {
        self.state.opened.lock().unwrap().push(conninfo.to_string());
        if let Some(message) = self.state.open_error.lock().unwrap().take() {
            return Err(DriverError::Open(message.into()));
        }
        Ok(Box::new(MockConnection {
            state: Arc::clone(&self.state),
        }))
    }
}

struct MockConnection {
    state: Arc<MockState>,
}

impl MockConnection {
    fn next(&self) -> Option<Expectation> {
        self.state.expectations.lock().unwrap().pop_front()
    }
}

#[async_trait]
impl DriverConnection for MockConnection {
    async fn ping(&self) -> Result<(), BoxError> {
        self.state.pings.fetch_add(1, Ordering::SeqCst);
        match self.next() {
            Some(Expectation::Ping(None)) => Ok(()),
            Some(Expectation::Ping(Some(message))) => Err(message.into()),
            other => Err(format!("unexpected ping, next expectation was {other:?}").into()),
        }
    }

    async fn close(&mut self) -> Result<(), BoxError> {
        self.state.closes.fetch_add(1, Ordering::SeqCst);
        match self.next() {
            Some(Expectation::Close(None)) => Ok(()),
            Some(Expectation::Close(Some(message))) => Err(message.into()),
            other => Err(format!("unexpected close, next expectation was {other:?}").into()),
        }
    }
}

/// Configuration pointing at the given driver
#[allow(dead_code)]
pub fn test_config(driver: &str) -> DatabaseConfig {
    DatabaseConfig {
        driver: driver.to_string(),
        host: "localhost".to_string(),
        port: 5432,
        user: "u".to_string(),
        password: "p".to_string(),
        password_env: None,
        name: "db".to_string(),
        schema: "public".to_string(),
    }
}
