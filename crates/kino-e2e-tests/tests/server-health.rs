use kino_e2e_tests::{launch_server, test_config};
use tracing_test::traced_test;

#[tokio::test]
#[traced_test]
async fn test_health() {
    let (args, _config_guard) = test_config("server-health").unwrap();

    let (client, base_url, _server_guard) = launch_server(args).await.unwrap();

    let url = base_url.join("health").unwrap();
    let response = client.get(url).send().await.unwrap();
    assert!(response.status().is_success());
}
