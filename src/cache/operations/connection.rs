use std::sync::Arc;

use redis::Client as RedisClient;
use tracing::{error, info};

/// 启动时探测一次 Redis 连接并记录结果，不做重试
pub async fn report_connection(redis: Arc<RedisClient>) -> bool {
    match ping(&redis).await {
        Ok(()) => {
            info!("Connected to redis successfully");
            true
        }
        Err(e) => {
            error!("Could not establish a connection with redis. {}", e);
            false
        }
    }
}

async fn ping(redis: &RedisClient) -> redis::RedisResult<()> {
    let mut conn = redis.get_multiplexed_async_connection().await?;
    let _: String = redis::cmd("PING").query_async(&mut conn).await?;
    Ok(())
}
