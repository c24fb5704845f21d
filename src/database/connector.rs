use std::fmt::Display;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::OnceCell;
use tokio::task::JoinHandle;
use tracing::{error, info};

/// 建立一次数据库连接
#[async_trait]
pub trait Connector: Send + Sync + 'static {
    type Handle: Send + Sync + 'static;
    type Error: Display + Send;

    async fn connect(&self) -> Result<Self::Handle, Self::Error>;
}

/// 重连策略：固定间隔，无限重试
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub delay: Duration,
}

impl RetryPolicy {
    pub fn fixed(delay: Duration) -> Self {
        Self { delay }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::fixed(Duration::from_millis(5000))
    }
}

/// 连接成功后才会被填充的共享句柄
#[derive(Debug)]
pub struct DbSlot<T> {
    inner: Arc<OnceCell<T>>,
}

impl<T> Clone for DbSlot<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> Default for DbSlot<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> DbSlot<T> {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(OnceCell::new()),
        }
    }

    /// 已连接的 slot
    pub fn ready(handle: T) -> Self {
        Self {
            inner: Arc::new(OnceCell::new_with(Some(handle))),
        }
    }

    pub fn get(&self) -> Option<&T> {
        self.inner.get()
    }

    pub fn is_ready(&self) -> bool {
        self.inner.initialized()
    }

    /// 已被填充时返回 false
    pub fn publish(&self, handle: T) -> bool {
        self.inner.set(handle).is_ok()
    }
}

/// 反复尝试连接直到成功，每次失败后等待 `policy.delay`
pub async fn connect_with_retry<C: Connector>(connector: &C, policy: &RetryPolicy) -> C::Handle {
    let mut attempt: u64 = 0;
    loop {
        attempt += 1;
        match connector.connect().await {
            Ok(handle) => {
                info!(attempt, "Successfully connected to DB");
                return handle;
            }
            Err(e) => {
                error!(
                    attempt,
                    "Failed to connect to DB: {}, retrying in {}ms",
                    e,
                    policy.delay.as_millis()
                );
                tokio::time::sleep(policy.delay).await;
            }
        }
    }
}

/// 后台重连任务，不阻塞服务启动
pub fn spawn_reconnect<C: Connector>(
    connector: C,
    policy: RetryPolicy,
    slot: DbSlot<C::Handle>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let handle = connect_with_retry(&connector, &policy).await;
        if !slot.publish(handle) {
            tracing::warn!("Database slot already populated, dropping new connection");
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use tokio::time::Instant;

    /// 前 `failures` 次连接失败
    struct FlakyConnector {
        failures: u32,
        attempts: Arc<AtomicU32>,
    }

    impl FlakyConnector {
        fn new(failures: u32) -> (Self, Arc<AtomicU32>) {
            let attempts = Arc::new(AtomicU32::new(0));
            (
                Self {
                    failures,
                    attempts: Arc::clone(&attempts),
                },
                attempts,
            )
        }
    }

    #[async_trait]
    impl Connector for FlakyConnector {
        type Handle = u32;
        type Error = String;

        async fn connect(&self) -> Result<u32, String> {
            let attempt = self.attempts.fetch_add(1, Ordering::SeqCst) + 1;
            if attempt <= self.failures {
                Err(format!("connection refused ({attempt})"))
            } else {
                Ok(attempt)
            }
        }
    }

    #[tokio::test(start_paused = true)]
    async fn waits_the_fixed_delay_between_attempts() {
        let (connector, attempts) = FlakyConnector::new(3);
        let start = Instant::now();

        let handle = connect_with_retry(&connector, &RetryPolicy::default()).await;

        let elapsed = start.elapsed();
        assert_eq!(handle, 4);
        assert_eq!(attempts.load(Ordering::SeqCst), 4);
        assert!(elapsed >= Duration::from_millis(15_000));
        assert!(elapsed < Duration::from_millis(15_010));
    }

    #[tokio::test(start_paused = true)]
    async fn first_success_does_not_sleep() {
        let (connector, _) = FlakyConnector::new(0);
        let start = Instant::now();

        connect_with_retry(&connector, &RetryPolicy::default()).await;

        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn background_task_keeps_retrying_without_a_limit() {
        let (connector, attempts) = FlakyConnector::new(u32::MAX);
        let slot = DbSlot::new();

        let task = spawn_reconnect(connector, RetryPolicy::default(), slot.clone());
        tokio::time::sleep(Duration::from_millis(12_500)).await;

        // 0s, 5s, 10s
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
        assert!(!slot.is_ready());
        assert!(!task.is_finished());
        task.abort();
    }

    #[tokio::test(start_paused = true)]
    async fn background_task_publishes_the_handle() {
        let (connector, _) = FlakyConnector::new(2);
        let slot = DbSlot::new();

        let task = spawn_reconnect(connector, RetryPolicy::default(), slot.clone());
        tokio::time::sleep(Duration::from_millis(9_000)).await;
        assert!(!slot.is_ready());

        task.await.unwrap();
        assert_eq!(slot.get(), Some(&3));
    }

    #[test]
    fn publish_only_fills_once() {
        let slot = DbSlot::new();
        assert!(slot.publish(1));
        assert!(!slot.publish(2));
        assert_eq!(slot.get(), Some(&1));
        assert!(DbSlot::ready(7).is_ready());
    }
}
