use tracing::info;

use crate::client::ApiClient;
use crate::endpoints::sessions::Rating;
use crate::error::ApiError;
use super::RatingCreate;

pub async fn submit(client: &ApiClient, request: &RatingCreate) -> Result<Rating, ApiError> {
    let rating: Rating = client.post_json("/ratings", request).await?;
    info!(
        row_id = %request.data_row_id,
        session_id = %request.session_id,
        "rating saved"
    );
    Ok(rating)
}
