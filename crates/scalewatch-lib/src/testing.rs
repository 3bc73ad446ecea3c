//! Shared test doubles

use crate::cluster::CommandRunner;
use crate::error::CollectorError;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

/// Command runner that replays canned responses keyed by the joined argument list
#[derive(Default)]
pub struct MockRunner {
    responses: Mutex<HashMap<String, Result<String, CollectorError>>>,
    calls: Mutex<Vec<String>>,
}

impl MockRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(self, args: &str, output: &str) -> Self {
        self.responses
            .lock()
            .unwrap()
            .insert(args.to_string(), Ok(output.to_string()));
        self
    }

    pub fn fail(self, args: &str) -> Self {
        self.responses.lock().unwrap().insert(
            args.to_string(),
            Err(CollectorError::Unavailable {
                command: format!("kubectl {}", args),
                reason: "connection refused".to_string(),
            }),
        );
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl CommandRunner for MockRunner {
    async fn run(&self, args: &[String]) -> Result<String, CollectorError> {
        let key = args.join(" ");
        self.calls.lock().unwrap().push(key.clone());
        self.responses
            .lock()
            .unwrap()
            .get(&key)
            .cloned()
            .unwrap_or_else(|| {
                Err(CollectorError::Unavailable {
                    command: format!("kubectl {}", key),
                    reason: "no canned response".to_string(),
                })
            })
    }
}
