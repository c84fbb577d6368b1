use super::KrigingApi;
use crate::error::{FieldIssue, ServiceError};
use crate::model::{
    ClientConfig, GeoGrid, GeoKrigingJob, GeoPointFeatureCollection, KrigingMethod, Variogram,
};
use anyhow::{Context, Result};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use uuid::Uuid;

const SAVE_POINTS: &str = "/api/v0/points/coordinate/save";
const GET_POINTS: &str = "/api/v0/points/coordinate";
const PROCESS: &str = "/api/v0/kriging/geospatial/process";

#[derive(Debug, Deserialize)]
struct IdResponse {
    id: Uuid,
}

#[derive(Debug, Deserialize)]
struct StatusResponse {
    status: String,
}

#[derive(Debug, Deserialize)]
struct ValidationBody {
    detail: Vec<FieldIssue>,
}

#[derive(Debug, Serialize)]
struct CreateProcessBody<'a> {
    points_id: Uuid,
    grid: &'a GeoGrid,
    vario: Variogram,
    kriging: KrigingMethod,
}

/// HTTP client for the kriging service.
pub(crate) struct KrigingClient {
    http: reqwest::Client,
    base_url: String,
}

impl KrigingClient {
    pub fn new(cfg: &ClientConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(cfg.user_agent.clone())
            .timeout(cfg.timeout)
            .build()
            .context("build http client")?;
        Ok(Self {
            http,
            base_url: cfg.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ServiceError> {
        let url = self.url(path);
        debug!(url = %url, "GET");
        let response = self.http.get(&url).send().await.map_err(transport_error)?;
        handle_response(response).await
    }

    async fn post_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ServiceError> {
        let url = self.url(path);
        debug!(url = %url, "POST");
        let response = self
            .http
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(transport_error)?;
        handle_response(response).await
    }
}

fn transport_error(e: reqwest::Error) -> ServiceError {
    warn!(error = %e, "request failed");
    ServiceError::Internal(e.to_string())
}

/// Map a response onto the typed error set, decoding the body on success.
async fn handle_response<T: DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T, ServiceError> {
    let status = response.status();
    let text = response.text().await.map_err(transport_error)?;

    if status.is_success() {
        return serde_json::from_str(&text).map_err(|e| {
            warn!(error = %e, body = %text, "failed to parse response");
            ServiceError::Internal(format!("invalid response body: {e}"))
        });
    }

    debug!(status = status.as_u16(), body = %text, "request rejected");
    match status {
        StatusCode::UNPROCESSABLE_ENTITY => match serde_json::from_str::<ValidationBody>(&text) {
            Ok(body) => Err(ServiceError::IncorrectData(body.detail)),
            Err(e) => Err(ServiceError::Internal(format!(
                "invalid validation error body: {e}"
            ))),
        },
        StatusCode::NOT_FOUND => Err(ServiceError::NotFound),
        other => Err(ServiceError::Internal(format!("unexpected status {other}"))),
    }
}

impl KrigingApi for KrigingClient {
    async fn save_points(&self, points: &GeoPointFeatureCollection) -> Result<Uuid, ServiceError> {
        let r: IdResponse = self.post_json(SAVE_POINTS, points).await?;
        Ok(r.id)
    }

    async fn get_points(&self, points_id: Uuid) -> Result<GeoPointFeatureCollection, ServiceError> {
        self.get_json(&format!("{GET_POINTS}/{points_id}")).await
    }

    async fn create_process(
        &self,
        points_id: Uuid,
        grid: &GeoGrid,
        variogram: Variogram,
        method: KrigingMethod,
    ) -> Result<Uuid, ServiceError> {
        let body = CreateProcessBody {
            points_id,
            grid,
            vario: variogram,
            kriging: method,
        };
        let r: IdResponse = self.post_json(PROCESS, &body).await?;
        Ok(r.id)
    }

    async fn get_process_status(&self, process_id: Uuid) -> Result<String, ServiceError> {
        let r: StatusResponse = self
            .get_json(&format!("{PROCESS}/{process_id}/status"))
            .await?;
        Ok(r.status)
    }

    async fn get_process_result(
        &self,
        process_id: Uuid,
    ) -> Result<GeoPointFeatureCollection, ServiceError> {
        self.get_json(&format!("{PROCESS}/{process_id}/result"))
            .await
    }

    async fn get_process_data(&self, process_id: Uuid) -> Result<GeoKrigingJob, ServiceError> {
        self.get_json(&format!("{PROCESS}/{process_id}/data")).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{GeoPoint, GridAxis};
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::time::Duration;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(base_url: &str) -> KrigingClient {
        KrigingClient::new(&ClientConfig {
            base_url: base_url.to_string(),
            timeout: Duration::from_secs(2),
            user_agent: "kriging-tui-test".into(),
        })
        .unwrap()
    }

    fn grid() -> GeoGrid {
        GeoGrid {
            lat: GridAxis::new(47.0, 48.0, 0.5),
            lon: GridAxis::new(5.0, 6.0, 0.5),
        }
    }

    #[tokio::test]
    async fn save_points_posts_collection_and_returns_id() {
        let server = MockServer::start().await;
        let id = Uuid::new_v4();
        let points = GeoPointFeatureCollection::from_points([GeoPoint::new(5.0, 47.0, 1.2).unwrap()]);
        Mock::given(method("POST"))
            .and(path(SAVE_POINTS))
            .and(body_json(serde_json::to_value(&points).unwrap()))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "id": id })))
            .expect(1)
            .mount(&server)
            .await;

        let got = client_for(&server.uri()).save_points(&points).await.unwrap();
        assert_eq!(got, id);
    }

    #[tokio::test]
    async fn create_process_sends_job_fields() {
        let server = MockServer::start().await;
        let points_id = Uuid::new_v4();
        let process_id = Uuid::new_v4();
        Mock::given(method("POST"))
            .and(path(PROCESS))
            .and(body_json(json!({
                "points_id": points_id,
                "grid": {"lat": [47.0, 48.0, 0.5], "lon": [5.0, 6.0, 0.5]},
                "vario": "gaussian",
                "kriging": "ordinary"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": process_id })))
            .mount(&server)
            .await;

        let got = client_for(&format!("{}/", server.uri()))
            .create_process(points_id, &grid(), Variogram::Gaussian, KrigingMethod::Ordinary)
            .await
            .unwrap();
        assert_eq!(got, process_id);
    }

    #[tokio::test]
    async fn status_and_data_endpoints() {
        let server = MockServer::start().await;
        let id = Uuid::new_v4();
        let points_id = Uuid::new_v4();
        Mock::given(method("GET"))
            .and(path(format!("{PROCESS}/{id}/status")))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "status": "pending" })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path(format!("{PROCESS}/{id}/data")))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "points_id": points_id,
                "grid": {"lat": [47.0, 48.0, 0.5], "lon": [5.0, 6.0, 0.5]},
                "vario": "spherical",
                "kriging": "universal"
            })))
            .mount(&server)
            .await;

        let client = client_for(&server.uri());
        assert_eq!(client.get_process_status(id).await.unwrap(), "pending");
        let job = client.get_process_data(id).await.unwrap();
        assert_eq!(
            job,
            GeoKrigingJob {
                points_id,
                grid: grid(),
                vario: Variogram::Spherical,
                kriging: KrigingMethod::Universal,
            }
        );
    }

    #[tokio::test]
    async fn result_and_points_decode_collections() {
        let server = MockServer::start().await;
        let id = Uuid::new_v4();
        let body = json!({
            "type": "FeatureCollection",
            "features": [{
                "type": "Feature",
                "geometry": {"type": "Point", "coordinates": [5.0, 47.0], "properties": {"value": 2.5}}
            }]
        });
        Mock::given(method("GET"))
            .and(path(format!("{PROCESS}/{id}/result")))
            .respond_with(ResponseTemplate::new(200).set_body_json(body.clone()))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path(format!("{GET_POINTS}/{id}")))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(&server)
            .await;

        let client = client_for(&server.uri());
        let result = client.get_process_result(id).await.unwrap();
        assert_eq!(result.values(), vec![2.5]);
        let points = client.get_points(id).await.unwrap();
        assert_eq!(points, result);
    }

    #[tokio::test]
    async fn unprocessable_maps_to_field_messages() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(SAVE_POINTS))
            .respond_with(ResponseTemplate::new(422).set_body_json(json!({
                "detail": [
                    {"loc": ["body", "features"], "msg": "field required", "type": "missing"},
                    {"loc": ["body", "type"], "msg": "unexpected value"}
                ]
            })))
            .mount(&server)
            .await;

        let err = client_for(&server.uri())
            .save_points(&GeoPointFeatureCollection::default())
            .await
            .unwrap_err();
        match err {
            ServiceError::IncorrectData(issues) => {
                let msgs: Vec<_> = issues.iter().map(|i| i.msg.as_str()).collect();
                assert_eq!(msgs, vec!["field required", "unexpected value"]);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[tokio::test]
    async fn not_found_and_server_errors() {
        let server = MockServer::start().await;
        let missing = Uuid::new_v4();
        let broken = Uuid::new_v4();
        Mock::given(method("GET"))
            .and(path(format!("{PROCESS}/{missing}/status")))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({"detail": "Not Found"})))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path(format!("{PROCESS}/{broken}/status")))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let client = client_for(&server.uri());
        assert_eq!(
            client.get_process_status(missing).await.unwrap_err(),
            ServiceError::NotFound
        );
        assert!(matches!(
            client.get_process_status(broken).await.unwrap_err(),
            ServiceError::Internal(_)
        ));
    }

    #[tokio::test]
    async fn non_json_success_body_is_internal() {
        let server = MockServer::start().await;
        let id = Uuid::new_v4();
        Mock::given(method("GET"))
            .and(path(format!("{PROCESS}/{id}/status")))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
            .mount(&server)
            .await;

        let err = client_for(&server.uri())
            .get_process_status(id)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Internal(_)));
    }

    #[tokio::test]
    async fn connection_failure_is_internal() {
        // Nothing listens on port 1.
        let err = client_for("http://127.0.0.1:1")
            .get_process_status(Uuid::new_v4())
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Internal(_)));
    }

    #[tokio::test]
    async fn slow_response_times_out_as_internal() {
        let server = MockServer::start().await;
        let id = Uuid::new_v4();
        Mock::given(method("GET"))
            .and(path(format!("{PROCESS}/{id}/status")))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"status": "success"}))
                    .set_delay(Duration::from_secs(5)),
            )
            .mount(&server)
            .await;

        let client = KrigingClient::new(&ClientConfig {
            base_url: server.uri(),
            timeout: Duration::from_millis(200),
            user_agent: "kriging-tui-test".into(),
        })
        .unwrap();
        let err = client.get_process_status(id).await.unwrap_err();
        assert!(matches!(err, ServiceError::Internal(_)));
    }
}
