mod common;

use common::{
    DESCRIPTION_URL, MemoryFetcher, RecordingSink, ScriptedTransport, broker, envelope, location,
    users_wsdl_with_one_way,
};
use dws_bridge::{DYNAMIC_URL_PROPERTY, ErrorKind, SchemaOptions, ServiceBroker};
use dws_core::{Credential, MethodKind, PropertyValues, SchemaObject, Value};
use std::sync::Arc;
use std::time::Duration;

const TIMEOUT: Duration = Duration::from_secs(5);

fn users_response(operation: &str, content: &str) -> String {
    envelope(&format!(
        r#"<{operation}Response xmlns="http://example.com/users">{content}</{operation}Response>"#
    ))
}

fn values(pairs: &[(&str, Value)]) -> PropertyValues {
    pairs
        .iter()
        .map(|(name, value)| (name.to_string(), value.clone()))
        .collect()
}

async fn described(
    transport: Arc<ScriptedTransport>,
    options: SchemaOptions,
) -> (ServiceBroker, Arc<RecordingSink>, SchemaObject) {
    let (broker, sink) = broker(MemoryFetcher::users(), transport);
    let schema = broker.describe_schema(&location(), options).await.unwrap();
    (broker, sink, schema)
}

#[tokio::test]
async fn test_get_user_yields_one_row() {
    let _ = tracing_subscriber::fmt::try_init();

    let transport = Arc::new(ScriptedTransport::default().respond(
        "GetUser",
        200,
        &users_response(
            "GetUser",
            "<GetUserResult><name>Ana</name><age>30</age></GetUserResult>",
        ),
    ));
    let (broker, sink, schema) = described(transport.clone(), SchemaOptions::default()).await;

    let rows = broker
        .execute(
            &schema,
            "GetUser",
            &values(&[("id", Value::Integer(7))]),
            Credential::basic("ana", "secret"),
            TIMEOUT,
        )
        .await
        .unwrap();

    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].len(), 2);
    assert_eq!(rows[0].get("name"), Some(&Value::Text("Ana".to_string())));
    assert_eq!(rows[0].get("age"), Some(&Value::Integer(30)));

    assert!(transport.sent_bodies()[0].contains("<id>7</id>"));
    assert_eq!(
        transport.sent.lock().unwrap()[0].credential,
        Credential::basic("ana", "secret")
    );
    assert!(sink.messages().is_empty());
}

#[tokio::test]
async fn test_text_inputs_are_parsed() {
    let _ = tracing_subscriber::fmt::try_init();

    let transport = Arc::new(ScriptedTransport::default().respond(
        "GetUser",
        200,
        &users_response("GetUser", ""),
    ));
    let (broker, _, schema) = described(transport.clone(), SchemaOptions::default()).await;

    let rows = broker
        .execute(
            &schema,
            "GetUser",
            &values(&[("id", Value::Text(" 12 ".to_string()))]),
            Credential::Default,
            TIMEOUT,
        )
        .await
        .unwrap();

    assert!(rows.is_empty());
    assert!(transport.sent_bodies()[0].contains("<id>12</id>"));
}

#[tokio::test]
async fn test_list_rows() {
    let _ = tracing_subscriber::fmt::try_init();

    let transport = Arc::new(
        ScriptedTransport::default()
            .respond(
                "ListUsers",
                200,
                &users_response(
                    "ListUsers",
                    r#"<ListUsersResult><User><name>Ana</name><age>30</age></User><User xsi:nil="true"/><User><age>41</age></User></ListUsersResult>"#,
                ),
            )
            .respond(
                "GetUserIds",
                200,
                &users_response(
                    "GetUserIds",
                    "<GetUserIdsResult><int>3</int><int>5</int></GetUserIdsResult>",
                ),
            ),
    );
    let (broker, _, schema) = described(transport, SchemaOptions::default()).await;

    let users = broker
        .execute(&schema, "ListUsers", &PropertyValues::new(), Credential::Default, TIMEOUT)
        .await
        .unwrap();
    assert_eq!(users.len(), 2);
    assert_eq!(users[1].get("name"), Some(&Value::Null));
    assert_eq!(users[1].get("age"), Some(&Value::Integer(41)));

    let ids = broker
        .execute(&schema, "GetUserIds", &PropertyValues::new(), Credential::Default, TIMEOUT)
        .await
        .unwrap();
    let ids: Vec<_> = ids.iter().map(|row| row.get("int").cloned()).collect();
    assert_eq!(ids, vec![Some(Value::Integer(3)), Some(Value::Integer(5))]);
}

#[tokio::test]
async fn test_empty_list_and_void_yield_no_rows() {
    let _ = tracing_subscriber::fmt::try_init();

    let transport = Arc::new(
        ScriptedTransport::default()
            .respond(
                "ListUsers",
                200,
                &users_response("ListUsers", "<ListUsersResult/>"),
            )
            .respond("Ping", 200, &users_response("Ping", "")),
    );
    let (broker, sink, schema) = described(transport, SchemaOptions::default()).await;

    let users = broker
        .execute(&schema, "ListUsers", &PropertyValues::new(), Credential::Default, TIMEOUT)
        .await
        .unwrap();
    assert!(users.is_empty());

    let pong = broker
        .execute(&schema, "Ping", &PropertyValues::new(), Credential::Default, TIMEOUT)
        .await
        .unwrap();
    assert!(pong.is_empty());
    assert!(sink.messages().is_empty());
}

#[tokio::test]
async fn test_one_way_call_accepted_without_body_yields_no_rows() {
    let _ = tracing_subscriber::fmt::try_init();

    let fetcher =
        MemoryFetcher::default().with(DESCRIPTION_URL, &users_wsdl_with_one_way(&["Ping"]));
    let transport = Arc::new(ScriptedTransport::default().respond("Ping", 202, ""));
    let (broker, sink) = broker(fetcher, transport.clone());
    let schema = broker
        .describe_schema(&location(), SchemaOptions::default())
        .await
        .unwrap();
    let ping = schema.method("Ping").unwrap();
    assert_eq!(ping.kind, MethodKind::Execute);
    assert!(ping.outputs.is_empty());

    let rows = broker
        .execute(&schema, "Ping", &PropertyValues::new(), Credential::Default, TIMEOUT)
        .await
        .unwrap();
    assert!(rows.is_empty());
    assert_eq!(transport.sent.lock().unwrap().len(), 1);
    assert!(sink.messages().is_empty());
}

#[tokio::test]
async fn test_request_object_and_scalar_result() {
    let _ = tracing_subscriber::fmt::try_init();

    let transport = Arc::new(
        ScriptedTransport::default()
            .respond(
                "UpdateUser",
                200,
                &users_response("UpdateUser", "<UpdateUserResult>true</UpdateUserResult>"),
            )
            .respond(
                "CountUsers",
                200,
                &users_response("CountUsers", "<CountUsersResult>42</CountUsersResult>"),
            ),
    );
    let (broker, _, schema) = described(transport.clone(), SchemaOptions::default()).await;

    let updated = broker
        .execute(
            &schema,
            "UpdateUser",
            &values(&[
                ("name", Value::Text("Ana".to_string())),
                ("age", Value::Integer(31)),
            ]),
            Credential::Default,
            TIMEOUT,
        )
        .await
        .unwrap();
    assert_eq!(updated.len(), 1);
    assert_eq!(updated[0].get("boolean"), Some(&Value::Boolean(true)));
    assert!(transport.sent_bodies()[0].contains("<user><name>Ana</name><age>31</age></user>"));

    let count = broker
        .execute(
            &schema,
            "CountUsers",
            &values(&[("filter", Value::Text("A*".to_string()))]),
            Credential::Default,
            TIMEOUT,
        )
        .await
        .unwrap();
    assert_eq!(count[0].get("int"), Some(&Value::Integer(42)));
}

#[tokio::test]
async fn test_dynamic_url_redirects_the_call() {
    let _ = tracing_subscriber::fmt::try_init();

    let transport = Arc::new(ScriptedTransport::default().respond(
        "Ping",
        200,
        &users_response("Ping", ""),
    ));
    let options = SchemaOptions {
        skip_unsupported: true,
        dynamic_url: true,
    };
    let (broker, _, schema) = described(transport.clone(), options).await;

    broker
        .execute(
            &schema,
            "Ping",
            &values(&[(
                DYNAMIC_URL_PROPERTY,
                Value::Text("http://staging.example.com/users.asmx".to_string()),
            )]),
            Credential::Default,
            TIMEOUT,
        )
        .await
        .unwrap();
    broker
        .execute(&schema, "Ping", &PropertyValues::new(), Credential::Default, TIMEOUT)
        .await
        .unwrap();

    let sent = transport.sent.lock().unwrap();
    assert_eq!(sent[0].endpoint.as_str(), "http://staging.example.com/users.asmx");
    assert_eq!(sent[1].endpoint.as_str(), "http://example.com/users.asmx");
}

#[tokio::test]
async fn test_evicted_module_is_not_recompiled() {
    let _ = tracing_subscriber::fmt::try_init();

    let transport = Arc::new(ScriptedTransport::default().respond(
        "Ping",
        200,
        &users_response("Ping", ""),
    ));
    let (broker, sink, schema) = described(transport.clone(), SchemaOptions::default()).await;
    assert!(broker.cache().invalidate(&location()));

    let err = broker
        .execute(&schema, "Ping", &PropertyValues::new(), Credential::Default, TIMEOUT)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ProxyResolution);
    assert!(broker.cache().is_empty());
    assert!(transport.sent.lock().unwrap().is_empty());
    assert!(sink.messages()[0].1.starts_with("Exception.Message: No client module"));
}

#[tokio::test]
async fn test_schema_of_another_module_is_rejected() {
    let _ = tracing_subscriber::fmt::try_init();

    let transport = Arc::new(ScriptedTransport::default());
    let (_, _, schema) = described(transport.clone(), SchemaOptions::default()).await;

    // Same location, but the service has since gained a parameter
    let changed = common::users_wsdl().replace(
        r#"<s:element name="filter" type="s:string" minOccurs="0"/>"#,
        r#"<s:element name="filter" type="s:string" minOccurs="0"/><s:element name="limit" type="s:int"/>"#,
    );
    let fetcher = MemoryFetcher::default().with(common::DESCRIPTION_URL, &changed);
    let (other, _) = broker(fetcher, transport);
    other
        .describe_schema(&location(), SchemaOptions::default())
        .await
        .unwrap();

    let err = other
        .execute(&schema, "Ping", &PropertyValues::new(), Credential::Default, TIMEOUT)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ProxyResolution);
}

#[tokio::test]
async fn test_call_failures_are_reported() {
    let _ = tracing_subscriber::fmt::try_init();

    let transport = Arc::new(ScriptedTransport::default().respond(
        "CountUsers",
        500,
        &envelope(
            "<soap:Fault><faultcode>soap:Server</faultcode><faultstring>Database offline</faultstring></soap:Fault>",
        ),
    ));
    let (broker, sink, schema) = described(transport.clone(), SchemaOptions::default()).await;

    let err = broker
        .execute(&schema, "CountUsers", &PropertyValues::new(), Credential::Default, TIMEOUT)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::RemoteFault);

    let err = broker
        .execute(&schema, "Ping", &PropertyValues::new(), Credential::Default, TIMEOUT)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Transport);

    let err = broker
        .execute(
            &schema,
            "GetUser",
            &values(&[("id", Value::Text("seven".to_string()))]),
            Credential::Default,
            TIMEOUT,
        )
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ValueConversion);
    assert!(err.to_string().contains("'id'"));

    let err = broker
        .execute(&schema, "Inspect", &PropertyValues::new(), Credential::Default, TIMEOUT)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnknownMethod);

    // Conversion and lookup failures never reach the service
    assert_eq!(transport.sent.lock().unwrap().len(), 2);

    let messages = sink.messages();
    assert_eq!(messages.len(), 4);
    assert!(messages[0].1.starts_with("Exception.Message: "));
    assert!(messages[0].1.contains("Database offline"));
}

#[tokio::test]
async fn test_call_timeout() {
    let _ = tracing_subscriber::fmt::try_init();

    let transport = Arc::new(
        ScriptedTransport::default()
            .respond("Ping", 200, &users_response("Ping", ""))
            .with_delay(Duration::from_millis(200)),
    );
    let (broker, _, schema) = described(transport, SchemaOptions::default()).await;

    let err = broker
        .execute(
            &schema,
            "Ping",
            &PropertyValues::new(),
            Credential::Default,
            Duration::from_millis(20),
        )
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::RemoteCallTimeout);
}
