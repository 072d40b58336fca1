use super::*;
use axum::{extract::State, http::HeaderMap, routing::post, Json, Router};
use chrono::TimeZone;
use kondate_core::message::Headers;
use kondate_core::prompt::PromptTemplate;
use kondate_core::recipe::Recipe;
use serde_json::Value;
use std::sync::{Arc, Mutex};

const SECRET: &str = "slack-signing-secret";

fn channel() -> SlackChannel {
    SlackChannel::new(SlackConfig {
        enabled: true,
        bot_token: "xoxb-test".into(),
        signing_secret: SECRET.into(),
        freshness_window_secs: 300,
    })
}

fn now() -> DateTime<Utc> {
    Utc.timestamp_opt(1_700_000_000, 0).unwrap()
}

fn raw(endpoint: Endpoint, body: &str, headers: Headers) -> RawRequest {
    RawRequest {
        platform: Platform::Slack,
        endpoint,
        headers,
        body: body.as_bytes().to_vec(),
        received_at: now(),
    }
}

fn signed(endpoint: Endpoint, body: &str, ts: i64) -> RawRequest {
    let ts = ts.to_string();
    let sig = signature::sign_slack(SECRET, &ts, body.as_bytes());
    let headers: Headers = [
        ("X-Slack-Signature", sig),
        ("X-Slack-Request-Timestamp", ts),
    ]
    .into_iter()
    .collect();
    raw(endpoint, body, headers)
}

const SLASH_BODY: &str = "token=t&team_id=T1&channel_id=C1&user_id=U42&command=%2Fdinner\
&text=%E3%82%AD%E3%83%A3%E3%83%99%E3%83%84%E3%81%A8%E9%B6%8F%E3%82%80%E3%81%AD%E8%82%89\
&response_url=https%3A%2F%2Fhooks.slack.com%2Fcommands%2FT1%2F1%2Fabc";

// --- verify ---

#[test]
fn test_verify_accepts_signed_request() {
    let req = signed(Endpoint::SlashCommand, SLASH_BODY, now().timestamp() - 10);
    assert!(channel().verify(&req, now()).is_ok());
}

#[test]
fn test_verify_missing_headers() {
    let req = raw(Endpoint::SlashCommand, SLASH_BODY, Headers::new());
    assert_eq!(
        channel().verify(&req, now()).unwrap_err(),
        VerifyError::MissingHeader(SLACK_SIGNATURE_HEADER)
    );

    let mut headers = Headers::new();
    headers.insert("X-Slack-Signature", "v0=00");
    let req = raw(Endpoint::SlashCommand, SLASH_BODY, headers);
    assert_eq!(
        channel().verify(&req, now()).unwrap_err(),
        VerifyError::MissingHeader(SLACK_TIMESTAMP_HEADER)
    );
}

#[test]
fn test_verify_rejects_ten_minute_old_request() {
    let req = signed(Endpoint::SlashCommand, SLASH_BODY, now().timestamp() - 600);
    assert!(matches!(
        channel().verify(&req, now()).unwrap_err(),
        VerifyError::StaleTimestamp { .. }
    ));
}

#[test]
fn test_verify_rejects_tampered_body() {
    let mut req = signed(Endpoint::SlashCommand, SLASH_BODY, now().timestamp());
    req.body = SLASH_BODY.replace("U42", "U43").into_bytes();
    assert_eq!(
        channel().verify(&req, now()).unwrap_err(),
        VerifyError::SignatureMismatch
    );
}

// --- parse_inbound ---

#[test]
fn test_parse_slash_command() {
    let req = signed(Endpoint::SlashCommand, SLASH_BODY, now().timestamp());
    let InboundPayload::Requests(reqs) = channel().parse_inbound(&req).unwrap() else {
        panic!("expected requests");
    };
    assert_eq!(reqs.len(), 1);
    assert_eq!(reqs[0].user_id, "U42");
    assert_eq!(reqs[0].text, "キャベツと鶏むね肉");
    assert_eq!(reqs[0].reply_via, ReplyVia::HttpBody);
    assert_eq!(
        reqs[0].reply_target,
        ReplyTarget::ResponseUrl("https://hooks.slack.com/commands/T1/1/abc".into())
    );
}

#[test]
fn test_parse_slash_command_plus_is_space() {
    let body = "user_id=U1&response_url=https%3A%2F%2Fx&text=add+tomato%2C+egg";
    let req = raw(Endpoint::SlashCommand, body, Headers::new());
    let InboundPayload::Requests(reqs) = channel().parse_inbound(&req).unwrap() else {
        panic!("expected requests");
    };
    assert_eq!(reqs[0].text, "add tomato, egg");
}

#[test]
fn test_parse_slash_command_empty_text_allowed() {
    let body = "user_id=U1&response_url=https%3A%2F%2Fx&text=";
    let req = raw(Endpoint::SlashCommand, body, Headers::new());
    let InboundPayload::Requests(reqs) = channel().parse_inbound(&req).unwrap() else {
        panic!("expected requests");
    };
    assert_eq!(reqs[0].text, "");
}

#[test]
fn test_parse_slash_command_missing_user_is_malformed() {
    let req = raw(Endpoint::SlashCommand, "text=hi&response_url=x", Headers::new());
    assert!(matches!(
        channel().parse_inbound(&req),
        Err(KondateError::Malformed(_))
    ));
}

#[test]
fn test_parse_url_verification() {
    let body = r#"{"token":"t","challenge":"3eZbrw1aBm2rZgRNFdxV2595E9CY3gmdALWMmHkvFXO7tYXAYM8P","type":"url_verification"}"#;
    let req = raw(Endpoint::Events, body, Headers::new());
    match channel().parse_inbound(&req).unwrap() {
        InboundPayload::Challenge(c) => {
            assert_eq!(c, "3eZbrw1aBm2rZgRNFdxV2595E9CY3gmdALWMmHkvFXO7tYXAYM8P")
        }
        other => panic!("expected challenge, got {other:?}"),
    }
}

#[test]
fn test_parse_app_mention_strips_tag() {
    let body = r#"{"type":"event_callback","team_id":"T1","event":{"type":"app_mention","user":"U7","text":"<@UBOT>  さっぱりしたものが食べたい","channel":"C9","ts":"1.2"}}"#;
    let req = raw(Endpoint::Events, body, Headers::new());
    let InboundPayload::Requests(reqs) = channel().parse_inbound(&req).unwrap() else {
        panic!("expected requests");
    };
    assert_eq!(reqs[0].text, "さっぱりしたものが食べたい");
    assert_eq!(reqs[0].reply_target, ReplyTarget::Conversation("C9".into()));
    assert_eq!(reqs[0].reply_via, ReplyVia::Push);
}

#[test]
fn test_parse_ignores_bot_and_channel_messages() {
    let channel = channel();
    for body in [
        r#"{"type":"event_callback","event":{"type":"message","bot_id":"B1","text":"hi","channel":"D1","channel_type":"im"}}"#,
        r#"{"type":"event_callback","event":{"type":"message","subtype":"message_changed","channel":"D1","channel_type":"im"}}"#,
        r#"{"type":"event_callback","event":{"type":"message","user":"U1","text":"hi","channel":"C1","channel_type":"channel"}}"#,
        r#"{"type":"event_callback","event":{"type":"reaction_added","user":"U1"}}"#,
        r#"{"type":"app_rate_limited"}"#,
    ] {
        let req = raw(Endpoint::Events, body, Headers::new());
        match channel.parse_inbound(&req).unwrap() {
            InboundPayload::Requests(reqs) => assert!(reqs.is_empty(), "{body}"),
            other => panic!("unexpected {other:?}"),
        }
    }
}

#[test]
fn test_parse_direct_message() {
    let body = r#"{"type":"event_callback","event":{"type":"message","user":"U1","text":"list","channel":"D1","channel_type":"im"}}"#;
    let req = raw(Endpoint::Events, body, Headers::new());
    let InboundPayload::Requests(reqs) = channel().parse_inbound(&req).unwrap() else {
        panic!("expected requests");
    };
    assert_eq!(reqs[0].text, "list");
    assert_eq!(reqs[0].user_id, "U1");
}

#[test]
fn test_parse_invalid_json_is_malformed() {
    let req = raw(Endpoint::Events, "{not json", Headers::new());
    assert!(matches!(
        channel().parse_inbound(&req),
        Err(KondateError::Malformed(_))
    ));
}

#[test]
fn test_is_retry_only_for_events() {
    let mut headers = Headers::new();
    headers.insert("X-Slack-Retry-Num", "1");
    assert!(channel().is_retry(&raw(Endpoint::Events, "{}", headers.clone())));
    assert!(!channel().is_retry(&raw(Endpoint::SlashCommand, "", headers)));
    assert!(!channel().is_retry(&raw(Endpoint::Events, "{}", Headers::new())));
}

// --- formatting ---

#[test]
fn test_strip_mentions() {
    assert_eq!(format::strip_mentions("<@U1> hello <@U2|bob> there"), "hello there");
    assert_eq!(format::strip_mentions("no tags"), "no tags");
    assert_eq!(format::strip_mentions("broken <@U1"), "broken <@U1");
}

#[test]
fn test_escape_mrkdwn() {
    assert_eq!(format::escape_mrkdwn("a & <b>"), "a &amp; &lt;b&gt;");
}

#[test]
fn test_http_reply_for_slash_command() {
    let ch = channel();
    let reply = AcknowledgedReply {
        kind: ReplyKind::Ack,
        text: "生成中".into(),
        reply_via: ReplyVia::HttpBody,
        reply_target: ReplyTarget::ResponseUrl("u".into()),
    };
    let body = ch.http_reply(Endpoint::SlashCommand, Some(&reply));
    assert_eq!(body["response_type"], "in_channel");
    assert_eq!(body["text"], "生成中");

    let inline = AcknowledgedReply {
        kind: ReplyKind::Inline,
        ..reply
    };
    assert_eq!(
        ch.http_reply(Endpoint::SlashCommand, Some(&inline))["response_type"],
        "ephemeral"
    );
    assert_eq!(ch.http_reply(Endpoint::Events, None)["ok"], true);
}

fn sample_recipes() -> OutboundContent {
    OutboundContent::Recipes {
        template: PromptTemplate::Ingredients,
        input: "キャベツと鶏むね肉".into(),
        recipes: vec![Recipe {
            number: 1,
            name: "味噌炒め".into(),
            description: "ご飯が進む".into(),
            missing_items: vec!["味噌".into()],
        }],
    }
}

#[test]
fn test_recipe_payload_for_response_url() {
    let payload =
        channel().format_outbound(&ReplyTarget::ResponseUrl("u".into()), &sample_recipes());
    assert_eq!(payload["replace_original"], true);
    assert_eq!(payload["response_type"], "in_channel");
    let blocks = payload["blocks"].as_array().unwrap();
    assert_eq!(blocks[0]["type"], "header");
    assert_eq!(blocks[1]["type"], "context");
    assert!(blocks[2]["text"]["text"]
        .as_str()
        .unwrap()
        .contains("*1. 味噌炒め*"));
    assert!(blocks[2]["text"]["text"].as_str().unwrap().contains("味噌"));
    assert_eq!(blocks.last().unwrap()["type"], "divider");
    assert!(payload["text"].as_str().unwrap().contains("味噌炒め"));
}

#[test]
fn test_error_payload_for_conversation() {
    let payload = channel().format_outbound(
        &ReplyTarget::Conversation("C1".into()),
        &OutboundContent::Error("失敗".into()),
    );
    assert_eq!(payload["channel"], "C1");
    assert_eq!(payload["text"], "❌ 失敗");
    assert!(payload.get("blocks").is_none());
}

// --- delivery ---

type Captured = Arc<Mutex<Vec<(String, Option<String>, Value)>>>;

async fn capture_server() -> (String, Captured) {
    async fn record(
        State(captured): State<Captured>,
        uri: axum::http::Uri,
        headers: HeaderMap,
        Json(body): Json<Value>,
    ) -> Json<Value> {
        let auth = headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .map(String::from);
        captured
            .lock()
            .unwrap()
            .push((uri.path().to_string(), auth, body));
        Json(json!({ "ok": true }))
    }

    let captured: Captured = Arc::default();
    let app = Router::new()
        .route("/chat.postMessage", post(record))
        .route("/respond", post(record))
        .with_state(captured.clone());
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (format!("http://{addr}"), captured)
}

#[tokio::test]
async fn test_deliver_to_conversation_uses_bot_token() {
    let (base, captured) = capture_server().await;
    let ch = channel().with_api_base(&base);
    ch.deliver(
        &ReplyTarget::Conversation("C1".into()),
        &OutboundContent::Text("hello".into()),
    )
    .await
    .unwrap();

    let calls = captured.lock().unwrap();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].0, "/chat.postMessage");
    assert_eq!(calls[0].1.as_deref(), Some("Bearer xoxb-test"));
    assert_eq!(calls[0].2["channel"], "C1");
}

#[tokio::test]
async fn test_deliver_to_response_url() {
    let (base, captured) = capture_server().await;
    let ch = channel();
    ch.deliver(
        &ReplyTarget::ResponseUrl(format!("{base}/respond")),
        &sample_recipes(),
    )
    .await
    .unwrap();

    let calls = captured.lock().unwrap();
    assert_eq!(calls[0].0, "/respond");
    assert!(calls[0].1.is_none());
    assert_eq!(calls[0].2["replace_original"], true);
}

#[tokio::test]
async fn test_deliver_to_reply_token_fails() {
    let err = channel()
        .deliver(
            &ReplyTarget::ReplyToken("r".into()),
            &OutboundContent::Text("x".into()),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, KondateError::Channel(_)));
}
