use crate::error::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct CartQuery {
    /// Comma separated cart ids, e.g. `1,2,3`
    pub cart_id: Option<String>,
}

impl CartQuery {
    pub fn ids(&self) -> AppResult<Option<Vec<i64>>> {
        let Some(raw) = self.cart_id.as_deref() else {
            return Ok(None);
        };
        raw.split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| {
                s.parse::<i64>()
                    .map_err(|_| AppError::ValidationError(format!("Invalid cart id: {s}")))
            })
            .collect::<AppResult<Vec<_>>>()
            .map(Some)
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AddCartRequest {
    pub product_id: i64,
    #[schema(example = 1)]
    pub amount: i64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UpdateCartRequest {
    pub amount: i64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DeleteCartRequest {
    pub cart_ids: Vec<i64>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CartItemResponse {
    pub id: i64,
    pub product_id: i64,
    pub product_name: String,
    pub price: i64,
    pub amount: i64,
    pub total_price: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cart_query_ids() {
        let q = CartQuery {
            cart_id: Some("1, 2,3,".to_string()),
        };
        assert_eq!(q.ids().unwrap(), Some(vec![1, 2, 3]));
        assert_eq!(CartQuery::default().ids().unwrap(), None);
        let bad = CartQuery {
            cart_id: Some("1,x".to_string()),
        };
        assert!(bad.ids().is_err());
    }
}
