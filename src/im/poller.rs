//! 定时轮询任务
//!
//! 每个轮询器是一个可取消的 tokio 任务：idle → running → idle。
//! 第一次触发在启动后一个完整周期，取消或 drop 时立即中止任务。

use std::future::Future;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::debug;

/// 轮询器状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollerState {
    Idle,
    Running,
}

/// 每次触发后的决定
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickControl {
    Continue,
    Stop,
}

/// 正在运行的轮询任务
#[derive(Debug)]
pub struct PollTask {
    name: &'static str,
    handle: JoinHandle<()>,
}

impl PollTask {
    /// 启动轮询任务，每个周期调用一次 `tick`，返回 `Stop` 时任务结束
    pub fn spawn<F, Fut>(name: &'static str, period: Duration, mut tick: F) -> Self
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = TickControl> + Send + 'static,
    {
        let handle = tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                if tick().await == TickControl::Stop {
                    debug!("[Poller] {} 轮询结束", name);
                    break;
                }
            }
        });
        debug!("[Poller] {} 轮询启动，周期 {:?}", name, period);
        Self { name, handle }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn state(&self) -> PollerState {
        if self.handle.is_finished() {
            PollerState::Idle
        } else {
            PollerState::Running
        }
    }

    /// 取消任务（正在进行的请求不会被中断，结果由调用方自行校验）
    pub fn cancel(self) {
        drop(self);
    }
}

impl Drop for PollTask {
    fn drop(&mut self) {
        if !self.handle.is_finished() {
            debug!("[Poller] {} 轮询取消", self.name);
        }
        self.handle.abort();
    }
}

/// 消息轮询器（绑定到某个会话）和会话列表轮询器
#[derive(Debug, Default)]
pub(crate) struct Pollers {
    pub message: Option<(String, PollTask)>,
    pub conversation: Option<PollTask>,
}

impl Pollers {
    pub fn message_state(&self) -> PollerState {
        self.message
            .as_ref()
            .map(|(_, task)| task.state())
            .unwrap_or(PollerState::Idle)
    }

    pub fn message_target(&self) -> Option<&str> {
        self.message.as_ref().map(|(id, _)| id.as_str())
    }

    pub fn conversation_state(&self) -> PollerState {
        self.conversation
            .as_ref()
            .map(PollTask::state)
            .unwrap_or(PollerState::Idle)
    }

    pub fn stop_all(&mut self) {
        self.message = None;
        self.conversation = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[tokio::test(start_paused = true)]
    async fn ticks_once_per_period_after_start() {
        let count = Arc::new(AtomicUsize::new(0));
        let counter = count.clone();
        let task = PollTask::spawn("test", Duration::from_millis(3000), move || {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                TickControl::Continue
            }
        });
        assert_eq!(task.state(), PollerState::Running);

        tokio::time::sleep(Duration::from_millis(2999)).await;
        assert_eq!(count.load(Ordering::SeqCst), 0);

        tokio::time::sleep(Duration::from_millis(2)).await;
        assert_eq!(count.load(Ordering::SeqCst), 1);

        tokio::time::sleep(Duration::from_millis(6000)).await;
        assert_eq!(count.load(Ordering::SeqCst), 3);

        task.cancel();
        tokio::time::sleep(Duration::from_millis(9000)).await;
        assert_eq!(count.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn stop_control_ends_task() {
        let task = PollTask::spawn("once", Duration::from_millis(100), || async {
            TickControl::Stop
        });
        tokio::time::sleep(Duration::from_millis(150)).await;
        tokio::task::yield_now().await;
        assert_eq!(task.state(), PollerState::Idle);
    }
}
