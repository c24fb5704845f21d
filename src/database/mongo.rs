use async_trait::async_trait;
use mongodb::{Client, bson::doc, options::ClientOptions};

use super::connector::Connector;

const APP_NAME: &str = "blog_backend";

/// 通过连接串连接 MongoDB，以 `ping` 成功作为连接建立的标志
pub struct MongoConnector {
    url: String,
}

impl MongoConnector {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

#[async_trait]
impl Connector for MongoConnector {
    type Handle = Client;
    type Error = mongodb::error::Error;

    async fn connect(&self) -> Result<Client, Self::Error> {
        let mut options = ClientOptions::parse(self.url.as_str()).await?;
        options.app_name = Some(APP_NAME.to_string());

        // 客户端是惰性连接的，ping 一次确认服务端可达且认证通过
        let client = Client::with_options(options)?;
        client
            .database("admin")
            .run_command(doc! { "ping": 1 })
            .await?;

        Ok(client)
    }
}
