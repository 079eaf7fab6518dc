use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use tracing::debug;

use crate::errors::{GatewayError, GatewayResult};
use crate::types::{AuditSnapshot, BalanceEntry, CreditReceipt, HealthInfo};
use crate::LedgerGateway;

/// Per-request timeout for every gateway call.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// HTTP implementation of [`LedgerGateway`] over one shared connection pool.
pub struct HttpLedgerGateway {
    http: reqwest::Client,
    base_url: String,
    operator_token: String,
}

#[derive(Serialize)]
struct CreditRequest<'a> {
    asset: String,
    account: &'a str,
    amount_wei: String,
    memo: &'a str,
    operator_token: &'a str,
}

impl HttpLedgerGateway {
    pub fn new(base_url: &str, operator_token: &str) -> GatewayResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| GatewayError::Transport(e.to_string()))?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            operator_token: operator_token.to_string(),
        })
    }

    async fn status_error(response: reqwest::Response) -> GatewayError {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        GatewayError::Status { status, body }
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        url: String,
        query: &[(&str, &str)],
    ) -> GatewayResult<T> {
        let response = self
            .http
            .get(&url)
            .query(query)
            .send()
            .await
            .map_err(|e| GatewayError::Transport(e.to_string()))?;
        if !response.status().is_success() {
            return Err(Self::status_error(response).await);
        }
        response
            .json()
            .await
            .map_err(|e| GatewayError::InvalidResponse(e.to_string()))
    }
}

#[async_trait]
impl LedgerGateway for HttpLedgerGateway {
    async fn list_balances(&self, account: &str) -> GatewayResult<Vec<BalanceEntry>> {
        self.get_json(format!("{}/balances", self.base_url), &[("account", account)])
            .await
    }

    async fn get_balance(&self, asset: &str, account: &str) -> GatewayResult<u128> {
        let balances = self.list_balances(account).await?;
        Ok(balances
            .iter()
            .find(|entry| entry.asset.eq_ignore_ascii_case(asset))
            .map(|entry| entry.balance_wei)
            .unwrap_or(0))
    }

    async fn credit_account(
        &self,
        asset: &str,
        account: &str,
        amount_wei: u128,
        memo: &str,
    ) -> GatewayResult<CreditReceipt> {
        let url = format!("{}/admin/credit", self.base_url);
        let request = CreditRequest {
            asset: asset.to_uppercase(),
            account,
            amount_wei: amount_wei.to_string(),
            memo,
            operator_token: &self.operator_token,
        };
        let response = self
            .http
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| GatewayError::Transport(e.to_string()))?;
        if !response.status().is_success() {
            return Err(Self::status_error(response).await);
        }
        let receipt: CreditReceipt = response
            .json()
            .await
            .map_err(|e| GatewayError::InvalidResponse(e.to_string()))?;
        if !receipt.success {
            return Err(GatewayError::CreditRejected(format!(
                "{} credit for {}",
                asset, account
            )));
        }
        debug!("gateway accepted credit of {} {} to {}", amount_wei, asset, account);
        Ok(receipt)
    }

    async fn get_state_root(&self) -> GatewayResult<AuditSnapshot> {
        self.get_json(format!("{}/audit", self.base_url), &[]).await
    }

    async fn health(&self) -> GatewayResult<HealthInfo> {
        self.get_json(format!("{}/health", self.base_url), &[]).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn gateway_for(server: &MockServer) -> HttpLedgerGateway {
        HttpLedgerGateway::new(&server.uri(), "INSECURE_DEV_TOKEN").unwrap()
    }

    #[tokio::test]
    async fn test_get_balance_matches_case_insensitively() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/balances"))
            .and(query_param("account", "acct:user:alice"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"asset": "XLM", "balance_wei": "5000000000000000000"},
                {"asset": "XRP", "balance_wei": "1000000000000000000"}
            ])))
            .mount(&server)
            .await;

        let gateway = gateway_for(&server).await;
        let balance = gateway.get_balance("xlm", "acct:user:alice").await.unwrap();
        assert_eq!(balance, 5_000_000_000_000_000_000);
    }

    #[tokio::test]
    async fn test_get_balance_unknown_asset_is_zero() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/balances"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .mount(&server)
            .await;

        let gateway = gateway_for(&server).await;
        assert_eq!(gateway.get_balance("XLM", "acct:user:bob").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_credit_sends_uppercased_asset_and_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/admin/credit"))
            .and(body_partial_json(json!({
                "asset": "XLM",
                "account": "acct:treasury:X",
                "amount_wei": "5000000000000000000",
                "memo": "xlm:tx123",
                "operator_token": "INSECURE_DEV_TOKEN"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "new_balance_wei": "75000000000000000000",
                "state_root": "ab12cd34ef56ab12cd34"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let gateway = gateway_for(&server).await;
        let receipt = gateway
            .credit_account("xlm", "acct:treasury:X", 5_000_000_000_000_000_000, "xlm:tx123")
            .await
            .unwrap();
        assert!(receipt.success);
        assert_eq!(receipt.new_balance_wei, 75_000_000_000_000_000_000);
        assert_eq!(receipt.state_root, "ab12cd34ef56ab12cd34");
    }

    #[tokio::test]
    async fn test_credit_non_2xx_is_status_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/admin/credit"))
            .respond_with(ResponseTemplate::new(403).set_body_string("bad operator token"))
            .mount(&server)
            .await;

        let gateway = gateway_for(&server).await;
        let result = gateway.credit_account("XLM", "acct:treasury:X", 1, "xlm:tx1").await;
        match result {
            Err(GatewayError::Status { status, body }) => {
                assert_eq!(status, 403);
                assert_eq!(body, "bad operator token");
            }
            other => panic!("expected status error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_credit_success_false_is_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/admin/credit"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": false,
                "new_balance_wei": "0"
            })))
            .mount(&server)
            .await;

        let gateway = gateway_for(&server).await;
        let result = gateway.credit_account("XLM", "acct:treasury:X", 1, "xlm:tx1").await;
        assert!(matches!(result, Err(GatewayError::CreditRejected(_))));
    }

    #[tokio::test]
    async fn test_audit_and_health_parse() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/audit"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "state_root": "ff00ff00",
                "height": 128
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/health"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "service": "rust-l1-gateway",
                "version": "0.4.2",
                "status": "ok"
            })))
            .mount(&server)
            .await;

        let gateway = gateway_for(&server).await;
        let snapshot = gateway.get_state_root().await.unwrap();
        assert_eq!(snapshot.state_root, "ff00ff00");
        assert_eq!(snapshot.height, 128);

        let health = gateway.health().await.unwrap();
        assert_eq!(health.service, "rust-l1-gateway");
        assert_eq!(health.status, "ok");
    }

    #[tokio::test]
    async fn test_unreachable_gateway_is_transport_error() {
        // Port 9 is discard; nothing listens there in tests.
        let gateway = HttpLedgerGateway::new("http://127.0.0.1:9", "token").unwrap();
        let result = gateway.health().await;
        assert!(matches!(result, Err(GatewayError::Transport(_))));
    }
}
