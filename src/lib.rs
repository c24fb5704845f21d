use config::Config;
use database::DbSlot;

pub mod cache;
pub mod config;
pub mod database;
pub mod error;
pub mod middleware;
pub mod routes;
pub mod session;
pub mod utils;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    /// 重连任务成功后才会被填充
    pub db: DbSlot<mongodb::Client>,
}
