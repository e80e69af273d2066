//! Sleeping behind a trait so the rate-limit throttle and the queue poll loop
//! can be driven deterministically in tests.

use std::time::Duration;

use async_trait::async_trait;

/// How the session waits between service calls and completion polls.
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// Production sleeper backed by the tokio timer.
#[derive(Debug, Default)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct Recording(Mutex<Vec<Duration>>);

    #[async_trait]
    impl Sleeper for Recording {
        async fn sleep(&self, duration: Duration) {
            self.0.lock().unwrap().push(duration);
        }
    }

    #[tokio::test]
    async fn test_fake_sleeper_records_instead_of_waiting() {
        let sleeper = Recording(Mutex::new(Vec::new()));
        sleeper.sleep(Duration::from_secs(3600)).await;
        assert_eq!(*sleeper.0.lock().unwrap(), vec![Duration::from_secs(3600)]);
    }
}
