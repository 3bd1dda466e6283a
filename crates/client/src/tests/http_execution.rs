//! End-to-end execution over HTTP and SSE, served by mockito.

use crate::client::TemplateApi;
use crate::execution::ExecutionHandler;
use crate::http::HttpTemplateApi;
use mockito::{Matcher, Mock, Server, ServerGuard};
use promptify_core::AppError;
use promptify_template::FieldValues;
use serde_json::json;
use std::sync::Arc;

const TOKEN: &str = "test-token";

fn api(server: &ServerGuard) -> HttpTemplateApi {
    HttpTemplateApi::new(server.url(), TOKEN).unwrap()
}

async fn mock_template(server: &mut ServerGuard) -> Mock {
    server
        .mock("GET", "/meta/templates/12")
        .match_header("authorization", "Token test-token")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "id": 12,
                "title": "Topic explainer",
                "slug": "topic-explainer",
                "description": "Explains a topic",
                "prompts": [
                    {"id": 120, "order": 1, "title": "Explain", "content": "Explain {{topic}} as JSON"}
                ]
            })
            .to_string(),
        )
        .create_async()
        .await
}

async fn mock_stream(server: &mut ServerGuard, status: usize, body: &str) -> Mock {
    server
        .mock("POST", "/meta/templates/12/execute")
        .match_header("authorization", "Token test-token")
        .match_body(Matcher::Json(json!([
            {"prompt": 120, "contextual_overrides": [], "prompt_params": {"topic": "tides"}}
        ])))
        .with_status(status)
        .with_header("content-type", "text/event-stream")
        .with_body(body)
        .create_async()
        .await
}

fn topic() -> FieldValues {
    let mut values = FieldValues::new();
    values.insert("topic".to_string(), json!("tides"));
    values
}

async fn execute(server: &ServerGuard) -> Result<crate::GeneratedContent, AppError> {
    let api = Arc::new(api(server));
    let schema = api.get_template(12).await?.fields();
    ExecutionHandler::new(api).execute(12, &schema, &topic()).await
}

#[tokio::test]
async fn test_stream_to_artifact() {
    let mut server = Server::new_async().await;
    let _template = mock_template(&mut server).await;
    let stream = mock_stream(
        &mut server,
        200,
        concat!(
            "event: message\n",
            "data: {'message': '[INITIALIZING]'}\n\n",
            "event: infer\n",
            "data: {\"template_execution_id\": 42}\n\n",
            "event: infer\n",
            "data: {'message': 'Tides follow the moon'}\n\n",
            ": keep-alive\n\n",
            "event: infer\n",
            "data: {\"template_execution_id\": 43}\n\n",
        ),
    )
    .await;
    let lookup = server
        .mock("GET", "/meta/template-executions/42")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "id": 42,
                "errors": null,
                "prompt_executions": [{"id": 1, "prompt": 120, "output": "  \n{\"k\":1}"}]
            })
            .to_string(),
        )
        .expect(1)
        .create_async()
        .await;

    let generated = execute(&server).await.unwrap();
    assert_eq!(generated.content, "{\"k\":1}");
    assert_eq!(generated.template.slug, "topic-explainer");
    assert_eq!(
        serde_json::to_value(&generated).unwrap(),
        json!({
            "template": {
                "slug": "topic-explainer",
                "title": "Topic explainer",
                "description": "Explains a topic"
            },
            "content": "{\"k\":1}"
        })
    );

    stream.assert_async().await;
    lookup.assert_async().await;
}

#[tokio::test]
async fn test_record_errors_surface_generically() {
    let mut server = Server::new_async().await;
    let _template = mock_template(&mut server).await;
    let _stream = mock_stream(
        &mut server,
        200,
        "event: infer\ndata: {\"template_execution_id\": 7}\n\n",
    )
    .await;
    let _lookup = server
        .mock("GET", "/meta/template-executions/7")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(json!({"id": 7, "errors": "Upstream model timeout"}).to_string())
        .create_async()
        .await;

    let err = execute(&server).await.unwrap_err();
    assert!(matches!(err, AppError::ExecutionFailed));
    assert_eq!(err.to_string(), "Something wrong happened");
}

#[tokio::test]
async fn test_narration_only_stream_skips_lookup() {
    let mut server = Server::new_async().await;
    let _template = mock_template(&mut server).await;
    let _stream = mock_stream(
        &mut server,
        200,
        "data: {'message': '[INITIALIZING]'}\n\ndata: {'message': '[COMPLETED]'}\n\n",
    )
    .await;
    let lookup = server
        .mock("GET", Matcher::Regex(r"^/meta/template-executions/".to_string()))
        .expect(0)
        .create_async()
        .await;

    let err = execute(&server).await.unwrap_err();
    assert!(matches!(err, AppError::ExecutionFailed));
    lookup.assert_async().await;
}

#[tokio::test]
async fn test_client_error_on_open_is_rejected() {
    let mut server = Server::new_async().await;
    let _template = mock_template(&mut server).await;
    let _stream = mock_stream(&mut server, 403, "").await;

    match execute(&server).await {
        Err(AppError::Rejected { status, reason }) => {
            assert_eq!(status, 403);
            assert_eq!(reason, "Forbidden");
        }
        other => panic!("Expected Rejected, got {:?}", other),
    }
}

#[tokio::test]
async fn test_missing_value_sends_nothing() {
    let mut server = Server::new_async().await;
    let any = server
        .mock("POST", Matcher::Any)
        .expect(0)
        .create_async()
        .await;

    let api = Arc::new(api(&server));
    let schema = promptify_template::extract_fields(["{{topic}} for {{audienceType}}"]);
    let result = ExecutionHandler::new(api)
        .execute(12, &schema, &topic())
        .await;

    match result {
        Err(AppError::MissingFields(names)) => assert_eq!(names, vec!["Audience type".to_string()]),
        other => panic!("Expected MissingFields, got {:?}", other),
    }
    any.assert_async().await;
}

#[tokio::test]
async fn test_catalog_follows_pages() {
    let mut server = Server::new_async().await;
    let next = format!("{}/meta/templates/page/2", server.url());
    let first = server
        .mock("GET", Matcher::Regex(r"^/meta/templates(\?.*)?$".to_string()))
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("status".into(), "published".into()),
            Matcher::UrlEncoded("is_internal".into(), "false".into()),
        ]))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "count": 2,
                "next": next,
                "previous": null,
                "results": [{"id": 1, "title": "First", "slug": "first", "description": "one"}]
            })
            .to_string(),
        )
        .create_async()
        .await;
    let second = server
        .mock("GET", "/meta/templates/page/2")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "count": 2,
                "next": null,
                "previous": null,
                "results": [{"id": 2, "title": "Second", "slug": "second", "description": null}]
            })
            .to_string(),
        )
        .create_async()
        .await;

    let templates = api(&server).list_templates().await.unwrap();
    let titles: Vec<&str> = templates.iter().map(|t| t.title.as_str()).collect();
    assert_eq!(titles, vec!["First", "Second"]);

    first.assert_async().await;
    second.assert_async().await;
}

#[tokio::test]
async fn test_template_not_found() {
    let mut server = Server::new_async().await;
    let _missing = server
        .mock("GET", "/meta/templates/99")
        .with_status(404)
        .with_body("{\"detail\": \"Not found.\"}")
        .create_async()
        .await;

    match api(&server).get_template(99).await {
        Err(AppError::Http(msg)) => assert!(msg.contains("404")),
        other => panic!("Expected Http error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_current_user() {
    let mut server = Server::new_async().await;
    let _me = server
        .mock("GET", "/me")
        .match_header("authorization", "Token test-token")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(json!({"id": 5, "username": "writer"}).to_string())
        .create_async()
        .await;

    let user = api(&server).current_user().await.unwrap();
    assert_eq!(user["username"], "writer");
}
