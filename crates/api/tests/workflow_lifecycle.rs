use anyhow::Result;
use indexmap::IndexMap;
use mockito::{Matcher, Server};
use n8n_api::types::{Connections, Node, ParameterValue, Settings, WorkflowDraft};
use n8n_api::{ClientConfig, ErrorKind, N8nClient};

const CREATED: &str = r#"{
    "id": "3LODqkaWPmYOi0FA",
    "name": "Test Workflow",
    "active": false,
    "versionId": "1f1c2b0e-1111-4a4a-9c9c-000000000001",
    "createdAt": "2025-03-04T10:00:00.000Z",
    "updatedAt": "2025-03-04T10:00:00.000Z",
    "nodes": [
        {"id": "1", "name": "Start", "type": "n8n-nodes-base.start", "typeVersion": 1, "position": [250, 300], "parameters": {}}
    ],
    "connections": {},
    "settings": {"executionOrder": "v1"},
    "tags": []
}"#;

fn start_draft() -> WorkflowDraft {
    WorkflowDraft::new(
        "Test Workflow",
        vec![Node::new("1", "Start", "n8n-nodes-base.start", 1.0, [250, 300])],
        Connections::empty(),
        Settings::default().with_execution_order("v1"),
    )
}

fn with_active(body: &str, active: bool) -> String {
    body.replace(r#""active": false"#, &format!(r#""active": {active}"#))
}

#[tokio::test]
async fn create_then_get_returns_same_workflow() -> Result<()> {
    let mut server = Server::new_async().await;
    let create = server
        .mock("POST", "/api/v1/workflows")
        .match_header("X-N8N-API-KEY", "test-token")
        .match_body(Matcher::PartialJsonString(r#"{"name": "Test Workflow"}"#.into()))
        .with_status(200)
        .with_body(CREATED)
        .expect(1)
        .create_async()
        .await;
    let get = server
        .mock("GET", "/api/v1/workflows/3LODqkaWPmYOi0FA")
        .match_header("X-N8N-API-KEY", "test-token")
        .with_status(200)
        .with_body(CREATED)
        .expect(1)
        .create_async()
        .await;

    let client = N8nClient::new(ClientConfig::new(server.url(), "test-token"))?;
    let created = client.create_workflow(&start_draft()).await?;
    assert!(!created.id.is_empty());

    let fetched = client.get_workflow(&created.id).await?;
    assert_eq!(fetched.name, "Test Workflow");
    assert!(!fetched.id.is_empty());
    assert_eq!(fetched.nodes.len(), 1);

    create.assert_async().await;
    get.assert_async().await;
    Ok(())
}

#[tokio::test]
async fn activate_then_deactivate_keeps_identity() -> Result<()> {
    let mut server = Server::new_async().await;
    server
        .mock("POST", "/api/v1/workflows/3LODqkaWPmYOi0FA/activate")
        .with_status(200)
        .with_body(with_active(CREATED, true))
        .create_async()
        .await;
    server
        .mock("POST", "/api/v1/workflows/3LODqkaWPmYOi0FA/deactivate")
        .with_status(200)
        .with_body(with_active(CREATED, false))
        .create_async()
        .await;

    let client = N8nClient::new(ClientConfig::new(server.url(), "test-token"))?;
    let activated = client.activate_workflow("3LODqkaWPmYOi0FA").await?;
    assert!(activated.active);

    let deactivated = client.deactivate_workflow(&activated.id).await?;
    assert!(!deactivated.active);
    assert_eq!(deactivated.id, activated.id);
    Ok(())
}

#[tokio::test]
async fn read_modify_replace_round_trip() -> Result<()> {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/api/v1/workflows/3LODqkaWPmYOi0FA")
        .with_status(200)
        .with_body(CREATED)
        .create_async()
        .await;
    let update = server
        .mock("PUT", "/api/v1/workflows/3LODqkaWPmYOi0FA")
        .match_body(Matcher::AllOf(vec![
            Matcher::PartialJsonString(r#"{"name": "Renamed"}"#.into()),
            Matcher::Regex(r#""parameters":\{"retries":3\}"#.into()),
        ]))
        .with_status(200)
        .with_body(CREATED.replace("Test Workflow", "Renamed"))
        .expect(1)
        .create_async()
        .await;

    let client = N8nClient::new(ClientConfig::new(server.url(), "test-token"))?;
    let current = client.get_workflow("3LODqkaWPmYOi0FA").await?;

    let mut draft = WorkflowDraft::from(&current);
    draft.name = "Renamed".into();
    let mut parameters = IndexMap::new();
    parameters.insert("retries".to_string(), ParameterValue::Integer(3));
    draft.nodes[0].parameters = parameters.into();

    let updated = client.update_workflow(&current.id, &draft).await?;
    assert_eq!(updated.name, "Renamed");
    update.assert_async().await;
    Ok(())
}

#[tokio::test]
async fn delete_returns_final_state_then_get_is_not_found() -> Result<()> {
    let mut server = Server::new_async().await;
    server
        .mock("DELETE", "/api/v1/workflows/3LODqkaWPmYOi0FA")
        .with_status(200)
        .with_body(CREATED)
        .create_async()
        .await;
    server
        .mock("GET", "/api/v1/workflows/3LODqkaWPmYOi0FA")
        .with_status(404)
        .with_body(r#"{"message":"Not Found"}"#)
        .create_async()
        .await;

    let client = N8nClient::new(ClientConfig::new(server.url(), "test-token"))?;
    let deleted = client.delete_workflow("3LODqkaWPmYOi0FA").await?;
    assert_eq!(deleted.name, "Test Workflow");

    let err = client.get_workflow("3LODqkaWPmYOi0FA").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Status);
    assert!(err.is_not_found());
    Ok(())
}

#[tokio::test]
async fn missing_credential_fails_before_any_request() -> Result<()> {
    let mut server = Server::new_async().await;
    let untouched = server.mock("GET", Matcher::Any).expect(0).create_async().await;

    let err = ClientConfig::from_parts(Some(server.url()), None).unwrap_err();
    assert_eq!(err.to_string(), "token is required");

    let err = N8nClient::new(ClientConfig::new(server.url(), "")).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Construction);

    untouched.assert_async().await;
    Ok(())
}

#[tokio::test]
async fn second_principal_shares_pool_but_not_credential() -> Result<()> {
    let mut server = Server::new_async().await;
    let admin = server
        .mock("GET", "/api/v1/workflows")
        .match_header("X-N8N-API-KEY", "admin-key")
        .with_status(200)
        .with_body(r#"{"data": [{"id": "a"}, {"id": "b"}], "nextCursor": null}"#)
        .create_async()
        .await;
    let member = server
        .mock("GET", "/api/v1/workflows")
        .match_header("X-N8N-API-KEY", "member-key")
        .with_status(200)
        .with_body(r#"{"data": [{"id": "b"}], "nextCursor": null}"#)
        .create_async()
        .await;

    let client = N8nClient::new(ClientConfig::new(server.url(), "admin-key"))?;
    assert_eq!(client.list_workflows().await?.len(), 2);
    assert_eq!(client.with_api_key("member-key").list_workflows().await?.len(), 1);

    admin.assert_async().await;
    member.assert_async().await;
    Ok(())
}
