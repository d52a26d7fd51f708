// service/rating.rs
use uuid::Uuid;

use crate::{db::MarketStore, service::error::ServiceError};

/// Mean of the ratings rounded to one decimal place, `None` when there are none.
pub fn average_rating(ratings: &[i32]) -> Option<f64> {
    if ratings.is_empty() {
        return None;
    }
    let sum: i64 = ratings.iter().map(|r| i64::from(*r)).sum();
    let mean = sum as f64 / ratings.len() as f64;
    Some((mean * 10.0).round() / 10.0)
}

pub async fn average_rating_for_user(
    store: &dyn MarketStore,
    user_id: Uuid,
) -> Result<Option<f64>, ServiceError> {
    let ratings: Vec<i32> = store
        .reviews_for_user(user_id)
        .await?
        .iter()
        .map(|review| review.rating)
        .collect();
    Ok(average_rating(&ratings))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mean_is_rounded_to_one_decimal() {
        assert_eq!(average_rating(&[5, 4, 3]), Some(4.0));
        assert_eq!(average_rating(&[5, 4]), Some(4.5));
        assert_eq!(average_rating(&[5, 5, 4]), Some(4.7));
        assert_eq!(average_rating(&[1, 2, 2]), Some(1.7));
    }

    #[test]
    fn no_ratings_no_average() {
        assert_eq!(average_rating(&[]), None);
    }
}
