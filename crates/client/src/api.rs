use std::sync::Arc;
use std::time::Duration;

use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use storage::dto::ranking::{MemberStats, PointsTableResponse, RankingEntry};

use crate::error::{ClientError, Result};
use crate::refresh::{HttpTokenRefresher, RefreshCoordinator, TokenRefresher};
use crate::session::SessionContext;

pub const DEFAULT_REFRESH_PATH: &str = "/api/auth/refresh";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Typed client for the ranking API.
pub struct ApiClient {
    base_url: String,
    http: Client,
    coordinator: Arc<RefreshCoordinator>,
}

impl ApiClient {
    /// Client refreshing tokens at the auth service's default endpoint.
    pub fn new(base_url: impl Into<String>, session: SessionContext) -> Result<Self> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        let http = build_http_client()?;
        let refresher = HttpTokenRefresher::new(
            http.clone(),
            format!("{}{}", base_url, DEFAULT_REFRESH_PATH),
        );

        Ok(Self::with_refresher(
            base_url,
            http,
            session,
            Arc::new(refresher),
        ))
    }

    pub fn with_refresher(
        base_url: impl Into<String>,
        http: Client,
        session: SessionContext,
        refresher: Arc<dyn TokenRefresher>,
    ) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http,
            coordinator: Arc::new(RefreshCoordinator::new(session, refresher)),
        }
    }

    pub fn session(&self) -> &SessionContext {
        self.coordinator.session()
    }

    pub async fn get_ranking(&self, year: Option<i32>) -> Result<Vec<RankingEntry>> {
        self.get_authorized("/api/rankings", year).await
    }

    pub async fn get_my_stats(&self, year: Option<i32>) -> Result<MemberStats> {
        self.get_authorized("/api/rankings/me", year).await
    }

    pub async fn get_points_table(&self) -> Result<PointsTableResponse> {
        let response = self
            .http
            .get(format!("{}/api/rankings/points-table", self.base_url))
            .send()
            .await?;

        parse_response(response).await
    }

    async fn get_authorized<T: DeserializeOwned>(&self, path: &str, year: Option<i32>) -> Result<T> {
        let url = format!("{}{}", self.base_url, path);

        self.coordinator
            .execute(|access_token| {
                tracing::debug!("GET {}", url);
                let mut request = self.http.get(&url).bearer_auth(access_token);
                if let Some(year) = year {
                    request = request.query(&[("year", year)]);
                }

                async move { parse_response(request.send().await?).await }
            })
            .await
    }
}

fn build_http_client() -> Result<Client> {
    Ok(Client::builder().timeout(REQUEST_TIMEOUT).build()?)
}

async fn parse_response<T: DeserializeOwned>(response: Response) -> Result<T> {
    match response.status() {
        status if status.is_success() => Ok(response.json::<T>().await?),
        StatusCode::UNAUTHORIZED => Err(ClientError::Unauthorized),
        status => {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<serde_json::Value>(&body)
                .ok()
                .and_then(|v| v.get("error").and_then(|e| e.as_str()).map(String::from))
                .unwrap_or(body);

            Err(ClientError::Api {
                status: status.as_u16(),
                message,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::TokenPair;
    use serde_json::json;
    use wiremock::{
        Mock, MockServer, ResponseTemplate,
        matchers::{body_json, header, method, path, query_param},
    };

    fn session(access: &str) -> SessionContext {
        SessionContext::with_tokens(TokenPair {
            access_token: access.to_string(),
            refresh_token: "refresh-old".to_string(),
        })
    }

    fn ranking_body() -> serde_json::Value {
        json!([{
            "posicion": 1,
            "userId": uuid::Uuid::nil(),
            "nombre": "Ana",
            "email": "ana@example.com",
            "totalEventos": 2,
            "totalPuntos": 6,
            "totalKilometros": 380,
            "medalla": "Bronce",
            "colorMedalla": "#CD7F32",
            "eventos": [{
                "eventId": uuid::Uuid::nil(),
                "nombre": "Rally Nacional",
                "tipo": "RALLY_NACIONAL",
                "fecha": "2024-06-15",
                "kilometros": 300,
                "puntos": 5
            }]
        }])
    }

    async fn mount_refresh(server: &MockServer, expected_calls: u64) {
        Mock::given(method("POST"))
            .and(path(DEFAULT_REFRESH_PATH))
            .and(body_json(json!({ "refreshToken": "refresh-old" })))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({
                        "accessToken": "access-new",
                        "refreshToken": "refresh-new"
                    }))
                    .set_delay(Duration::from_millis(100)),
            )
            .expect(expected_calls)
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_get_ranking_sends_year_and_token() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/rankings"))
            .and(query_param("year", "2024"))
            .and(header("authorization", "Bearer access-old"))
            .respond_with(ResponseTemplate::new(200).set_body_json(ranking_body()))
            .expect(1)
            .mount(&server)
            .await;

        let client = ApiClient::new(server.uri(), session("access-old")).unwrap();
        let ranking = client.get_ranking(Some(2024)).await.unwrap();

        assert_eq!(ranking.len(), 1);
        assert_eq!(ranking[0].total_points, 6);
        assert_eq!(ranking[0].medal.as_deref(), Some("Bronce"));
        assert_eq!(
            ranking[0].events[0].date,
            chrono::NaiveDate::from_ymd_opt(2024, 6, 15).unwrap()
        );
    }

    #[tokio::test]
    async fn test_unauthorized_triggers_refresh_and_single_retry() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/rankings"))
            .and(header("authorization", "Bearer access-old"))
            .respond_with(ResponseTemplate::new(401))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/rankings"))
            .and(header("authorization", "Bearer access-new"))
            .respond_with(ResponseTemplate::new(200).set_body_json(ranking_body()))
            .expect(1)
            .mount(&server)
            .await;
        mount_refresh(&server, 1).await;

        let client = ApiClient::new(server.uri(), session("access-old")).unwrap();
        let ranking = client.get_ranking(None).await.unwrap();

        assert_eq!(ranking.len(), 1);
        assert_eq!(client.session().access_token().as_deref(), Some("access-new"));
        assert_eq!(client.session().refresh_token().as_deref(), Some("refresh-new"));
    }

    #[tokio::test]
    async fn test_concurrent_unauthorized_requests_refresh_once() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/rankings"))
            .and(header("authorization", "Bearer access-old"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/rankings"))
            .and(header("authorization", "Bearer access-new"))
            .respond_with(ResponseTemplate::new(200).set_body_json(ranking_body()))
            .mount(&server)
            .await;
        mount_refresh(&server, 1).await;

        let client = Arc::new(ApiClient::new(server.uri(), session("access-old")).unwrap());

        let mut tasks = tokio::task::JoinSet::new();
        for _ in 0..8 {
            let client = client.clone();
            tasks.spawn(async move { client.get_ranking(Some(2024)).await });
        }

        while let Some(result) = tasks.join_next().await {
            assert_eq!(result.unwrap().unwrap().len(), 1);
        }
    }

    #[tokio::test]
    async fn test_persistent_unauthorized_is_returned_after_one_retry() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/rankings/me"))
            .respond_with(ResponseTemplate::new(401))
            .expect(2)
            .mount(&server)
            .await;
        mount_refresh(&server, 1).await;

        let client = ApiClient::new(server.uri(), session("access-old")).unwrap();
        let result = client.get_my_stats(Some(2024)).await;

        assert!(matches!(result, Err(ClientError::Unauthorized)));
    }

    #[tokio::test]
    async fn test_rejected_refresh_expires_session() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/rankings/me"))
            .respond_with(ResponseTemplate::new(401))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path(DEFAULT_REFRESH_PATH))
            .respond_with(ResponseTemplate::new(401))
            .expect(1)
            .mount(&server)
            .await;

        let client = ApiClient::new(server.uri(), session("access-old")).unwrap();
        let result = client.get_my_stats(None).await;

        assert!(matches!(result, Err(ClientError::SessionExpired)));
        assert!(!client.session().is_authenticated());
    }

    #[tokio::test]
    async fn test_api_error_message_is_extracted() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/rankings"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "error": "Validation failed",
                "details": ["year: year must be between 2000 and 2100"]
            })))
            .mount(&server)
            .await;

        let client = ApiClient::new(server.uri(), session("access-old")).unwrap();
        let result = client.get_ranking(Some(1800)).await;

        match result {
            Err(ClientError::Api { status, message }) => {
                assert_eq!(status, 400);
                assert_eq!(message, "Validation failed");
            }
            other => panic!("unexpected result: {:?}", other.map(|r| r.len())),
        }
    }

    #[tokio::test]
    async fn test_points_table_needs_no_session() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/rankings/points-table"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "version": "2024",
                "puntos": [{ "tipo": "RODADA", "puntos": 1 }],
                "medallas": [{ "medalla": "Bronce", "color": "#CD7F32", "puntosMinimos": 5 }]
            })))
            .mount(&server)
            .await;

        let client = ApiClient::new(server.uri(), SessionContext::new()).unwrap();
        let table = client.get_points_table().await.unwrap();

        assert_eq!(table.version, "2024");
        assert_eq!(table.medals[0].min_points, 5);
    }
}
