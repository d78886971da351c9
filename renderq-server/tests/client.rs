use std::net::SocketAddr;
use std::sync::Arc;

use renderq_client::QueueClient;
use renderq_core::domain::state::{JobState, RenderStage};
use renderq_server::{
    api,
    repository::BackingProvider,
    tenant::{TenantConfig, TenantDirectory},
};
use serde_json::json;

struct TestServer {
    base_url: String,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn(configs: Vec<TenantConfig>) -> Self {
        // Same router as prod, bound to an ephemeral port.
        let directory = TenantDirectory::from_configs(configs, &BackingProvider::Memory)
            .expect("valid tenant configs");
        let app = api::create_router(Arc::new(directory));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let handle = tokio::spawn(async move {
            axum::serve(
                listener,
                app.into_make_service_with_connect_info::<SocketAddr>(),
            )
            .await
            .unwrap();
        });

        Self { base_url, handle }
    }

    fn client(&self) -> QueueClient {
        QueueClient::new(&self.base_url)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

#[tokio::test]
async fn worker_lifecycle_through_client() {
    let srv = TestServer::spawn(vec![]).await;
    let client = srv.client();

    let job = client
        .create_job(&json!({ "template": { "src": "file:///a.aep", "composition": "main" } }))
        .await
        .unwrap();
    assert_eq!(job.state(), Some(JobState::Queued));
    assert_eq!(job.creator(), Some("127.0.0.1"));

    let picked = client.pickup().await.unwrap().expect("queued job picked up");
    assert_eq!(picked.uid(), job.uid());
    assert_eq!(picked.state(), Some(JobState::Picked));
    assert_eq!(picked.executor(), Some("127.0.0.1"));
    assert!(client.pickup().await.unwrap().is_none());

    let rendering = client
        .update_job(job.uid(), &json!({ "state": "render:dorender", "renderProgress": 50 }))
        .await
        .unwrap();
    assert_eq!(rendering.state(), Some(JobState::Render(RenderStage::Dorender)));

    let status = client.job_status(job.uid()).await.unwrap();
    assert_eq!(status.render_progress, json!(50));
    assert_eq!(status.job_executor, json!("127.0.0.1"));

    client
        .update_job(job.uid(), &json!({ "state": "finished" }))
        .await
        .unwrap();
    let statuses = client.list_statuses().await.unwrap();
    assert_eq!(statuses.len(), 1);
    assert_eq!(statuses[0].state(), Some(JobState::Finished));

    assert!(client.delete_job(job.uid()).await.unwrap());
    assert!(!client.delete_job(job.uid()).await.unwrap());
    assert!(client.list_jobs().await.unwrap().is_empty());
}

#[tokio::test]
async fn client_reports_api_errors() {
    let mut secured = TenantConfig::open("studio-a");
    secured.secret = Some("s3cret".to_string());
    let srv = TestServer::spawn(vec![secured]).await;

    let missing = srv.client().get_job("nope").await.unwrap_err();
    assert!(missing.is_not_found());

    let rejected = srv
        .client()
        .with_tenant("studio-a")
        .list_jobs()
        .await
        .unwrap_err();
    assert!(rejected.is_unauthorized());

    let unknown = srv.client().with_tenant("ghost").list_jobs().await.unwrap_err();
    assert!(unknown.is_not_found());

    let admitted = srv
        .client()
        .with_tenant("studio-a")
        .with_secret("s3cret")
        .list_jobs()
        .await
        .unwrap();
    assert!(admitted.is_empty());
}

#[tokio::test]
async fn tagged_pickup_through_client() {
    let srv = TestServer::spawn(vec![]).await;
    let client = srv.client();

    client.create_job(&json!({ "tags": "cpu" })).await.unwrap();
    let gpu = client.create_job(&json!({ "tags": "gpu, 4k" })).await.unwrap();

    let picked = client.pickup_tagged(&["4k", "gpu"]).await.unwrap().unwrap();
    assert_eq!(picked.uid(), gpu.uid());
    assert!(client.pickup_tagged(&["gpu"]).await.unwrap().is_none());
}

#[tokio::test]
async fn client_encodes_uids_in_paths() {
    let srv = TestServer::spawn(vec![]).await;
    let client = srv.client();

    let err = client.get_job("a/b?x").await.unwrap_err();
    assert!(err.is_not_found());
    assert!(err.to_string().contains("Job a/b?x not found"));

    let err = client
        .update_job("a/b#c", &json!({ "state": "finished" }))
        .await
        .unwrap_err();
    assert!(err.is_not_found());
    assert!(!client.delete_job("x/y").await.unwrap());

    client.create_job(&json!({})).await.unwrap();
    assert_eq!(client.list_jobs().await.unwrap().len(), 1);
}
