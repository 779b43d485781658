use crate::config::IamportConfig;
use crate::error::{AppError, AppResult};
use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// 网关响应：`code == 0` 表示成功
#[derive(Debug, Deserialize)]
pub struct IamportEnvelope<T> {
    pub code: i32,
    pub message: Option<String>,
    pub response: Option<T>,
}

#[derive(Debug, Deserialize)]
struct TokenData {
    access_token: String,
}

/// 网关返回的交易信息
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewayTransaction {
    pub imp_uid: String,
    pub merchant_uid: String,
    pub amount: i64,
    pub status: String,
    pub pay_method: Option<String>,
    pub receipt_url: Option<String>,
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// 客户端支付前向网关登记 `merchant_uid` 的应付金额
    async fn prepare(&self, merchant_uid: &str, amount: i64) -> AppResult<()>;
    async fn find_transaction(&self, merchant_uid: &str) -> AppResult<GatewayTransaction>;
}

#[derive(Clone)]
pub struct IamportClient {
    client: Client,
    config: IamportConfig,
}

impl IamportClient {
    pub fn new(config: IamportConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    fn unwrap_envelope<T>(envelope: IamportEnvelope<T>, what: &str) -> AppResult<T> {
        if envelope.code != 0 {
            return Err(AppError::ExternalApiError(format!(
                "iamport {what} failed: {}",
                envelope.message.unwrap_or_default()
            )));
        }
        envelope
            .response
            .ok_or_else(|| AppError::ExternalApiError(format!("iamport {what}: empty response")))
    }

    async fn read<T: DeserializeOwned>(response: reqwest::Response, what: &str) -> AppResult<T> {
        let envelope: IamportEnvelope<T> = response.json().await?;
        Self::unwrap_envelope(envelope, what)
    }

    pub async fn get_access_token(&self) -> AppResult<String> {
        let url = format!("{}/users/getToken", self.config.base_url);
        let body = serde_json::json!({
            "imp_key": self.config.api_key,
            "imp_secret": self.config.api_secret,
        });

        let response = self.client.post(&url).json(&body).send().await?;
        let data: TokenData = Self::read(response, "getToken").await?;
        Ok(data.access_token)
    }
}

#[async_trait]
impl PaymentGateway for IamportClient {
    async fn prepare(&self, merchant_uid: &str, amount: i64) -> AppResult<()> {
        let token = self.get_access_token().await?;
        let url = format!("{}/payments/prepare", self.config.base_url);
        let body = serde_json::json!({
            "merchant_uid": merchant_uid,
            "amount": amount,
        });

        let response = self
            .client
            .post(&url)
            .header("Authorization", token)
            .json(&body)
            .send()
            .await?;
        let _: serde_json::Value = Self::read(response, "prepare").await?;

        log::info!("iamport prepared {merchant_uid} amount={amount}");
        Ok(())
    }

    async fn find_transaction(&self, merchant_uid: &str) -> AppResult<GatewayTransaction> {
        let token = self.get_access_token().await?;
        let url = format!("{}/payments/find/{merchant_uid}", self.config.base_url);

        let response = self
            .client
            .get(&url)
            .header("Authorization", token)
            .send()
            .await?;
        Self::read(response, "find").await
    }
}
