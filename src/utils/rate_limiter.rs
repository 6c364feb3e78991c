use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;

/// 令牌桶限流器，每个外部协作方（模型服务、搜索服务）各持有一个
///
/// 上游服务普遍有速率限制，这里用可配置的令牌桶做节流，
/// 而不是在每次调用前固定休眠。`interval_ms`为0时限流完全关闭。
pub struct RateLimiter {
    capacity: u32,
    /// 铸造一个令牌所需的时间
    refill_interval: Duration,
    state: Mutex<BucketState>,
}

struct BucketState {
    tokens: u32,
    last_refill: Instant,
}

impl RateLimiter {
    /// 创建限流器：`capacity`为桶容量，`interval_ms`为铸造一个令牌的间隔
    pub fn new(capacity: u32, interval_ms: u64) -> Self {
        Self {
            capacity: capacity.max(1),
            refill_interval: Duration::from_millis(interval_ms),
            state: Mutex::new(BucketState {
                tokens: capacity.max(1),
                last_refill: Instant::now(),
            }),
        }
    }

    /// 创建不做任何节流的限流器
    pub fn unlimited() -> Self {
        Self::new(1, 0)
    }

    /// 获取一个令牌，必要时挂起等待（不阻塞其他在途任务）
    pub async fn acquire(&self) {
        if self.refill_interval.is_zero() {
            return;
        }

        loop {
            let wait = {
                let mut state = self.state.lock().await;
                self.refill(&mut state);
                if state.tokens > 0 {
                    state.tokens -= 1;
                    return;
                }
                // 桶空，等到下一个令牌铸造完成
                self.refill_interval
                    .saturating_sub(state.last_refill.elapsed())
            };
            tokio::time::sleep(wait).await;
        }
    }

    fn refill(&self, state: &mut BucketState) {
        let elapsed = state.last_refill.elapsed();
        let minted = (elapsed.as_millis() / self.refill_interval.as_millis().max(1)) as u32;
        if minted > 0 {
            state.tokens = (state.tokens + minted).min(self.capacity);
            state.last_refill += self.refill_interval * minted;
        }
    }
}
