use crate::error::AppError;

pub async fn not_mounted() -> AppError {
    AppError::NotImplemented("post router")
}
