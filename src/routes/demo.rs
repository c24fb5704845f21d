use axum::response::Html;

use crate::{error::AppError, session::Session};

pub async fn root() -> Html<&'static str> {
    Html("<h2>Hi there..</h2>")
}

/// 往会话里写一个固定值，用来验证会话存储是否接通
pub async fn test(session: Session) -> Result<&'static str, AppError> {
    session.insert("something", "this is something")?;
    Ok("Successssss")
}
