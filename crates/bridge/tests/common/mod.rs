#![allow(dead_code)]

use async_trait::async_trait;
use dws_core::{Credential, ServiceLocation};
use dws_bridge::{MessageSink, ServiceBroker, Severity};
use dws_proxy::{
    LinkingBuilder, ProxyCache, SoapRequest, SoapResponse, SoapTransport, TransportError,
    WsdlCompiler,
};
use dws_wsdl::{DescriptionFetcher, FetchError};
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::Mutex;
use std::time::Duration;
use url::Url;

pub const LOCATION: &str = "http://example.com/users.asmx";
pub const DESCRIPTION_URL: &str = "http://example.com/users.asmx?wsdl";

/// Operations of the user directory: name, request children, response children
const OPERATIONS: &[(&str, &str, &str)] = &[
    (
        "GetUser",
        r#"<s:element name="id" type="s:int"/>"#,
        r#"<s:element name="GetUserResult" type="tns:User" minOccurs="0"/>"#,
    ),
    (
        "ListUsers",
        "",
        r#"<s:element name="ListUsersResult" type="tns:ArrayOfUser" minOccurs="0"/>"#,
    ),
    (
        "CountUsers",
        r#"<s:element name="filter" type="s:string" minOccurs="0"/>"#,
        r#"<s:element name="CountUsersResult" type="s:int"/>"#,
    ),
    ("Ping", "", ""),
    (
        "UpdateUser",
        r#"<s:element name="user" type="tns:User" minOccurs="0"/>"#,
        r#"<s:element name="UpdateUserResult" type="s:boolean"/>"#,
    ),
    (
        "GetUserIds",
        "",
        r#"<s:element name="GetUserIdsResult" type="tns:ArrayOfInt" minOccurs="0"/>"#,
    ),
    (
        "Inspect",
        r#"<s:element name="payload" type="s:anyType" minOccurs="0"/>"#,
        r#"<s:element name="InspectResult" type="s:string" minOccurs="0"/>"#,
    ),
];

/// A document/literal description of a small user directory
pub fn users_wsdl() -> String {
    users_wsdl_with_one_way(&[])
}

/// The user directory with the named operations declared without an output message
pub fn users_wsdl_with_one_way(one_way: &[&str]) -> String {
    let mut elements = String::new();
    let mut messages = String::new();
    let mut port_type = String::new();
    let mut binding = String::new();

    for (name, request, response) in OPERATIONS {
        let (output, bound_output) = if one_way.contains(name) {
            (String::new(), "")
        } else {
            (
                format!("\n      <wsdl:output message=\"tns:{name}SoapOut\"/>"),
                "\n      <wsdl:output><soap:body use=\"literal\"/></wsdl:output>",
            )
        };
        elements.push_str(&format!(
            r#"
      <s:element name="{name}"><s:complexType><s:sequence>{request}</s:sequence></s:complexType></s:element>
      <s:element name="{name}Response"><s:complexType><s:sequence>{response}</s:sequence></s:complexType></s:element>"#
        ));
        messages.push_str(&format!(
            r#"
  <wsdl:message name="{name}SoapIn"><wsdl:part name="parameters" element="tns:{name}"/></wsdl:message>
  <wsdl:message name="{name}SoapOut"><wsdl:part name="parameters" element="tns:{name}Response"/></wsdl:message>"#
        ));
        port_type.push_str(&format!(
            r#"
    <wsdl:operation name="{name}">
      <wsdl:input message="tns:{name}SoapIn"/>{output}
    </wsdl:operation>"#
        ));
        binding.push_str(&format!(
            r#"
    <wsdl:operation name="{name}">
      <soap:operation soapAction="http://example.com/users/{name}" style="document"/>
      <wsdl:input><soap:body use="literal"/></wsdl:input>{bound_output}
    </wsdl:operation>"#
        ));
    }

    format!(
        r#"<?xml version="1.0" encoding="utf-8"?>
<wsdl:definitions targetNamespace="http://example.com/users"
    xmlns:wsdl="http://schemas.xmlsoap.org/wsdl/"
    xmlns:soap="http://schemas.xmlsoap.org/wsdl/soap/"
    xmlns:s="http://www.w3.org/2001/XMLSchema"
    xmlns:tns="http://example.com/users">
  <wsdl:types>
    <s:schema targetNamespace="http://example.com/users" elementFormDefault="qualified">
      <s:complexType name="User">
        <s:sequence>
          <s:element name="name" type="s:string" minOccurs="0"/>
          <s:element name="age" type="s:int"/>
        </s:sequence>
      </s:complexType>
      <s:complexType name="ArrayOfUser">
        <s:sequence><s:element name="User" type="tns:User" minOccurs="0" maxOccurs="unbounded" nillable="true"/></s:sequence>
      </s:complexType>
      <s:complexType name="ArrayOfInt">
        <s:sequence><s:element name="int" type="s:int" minOccurs="0" maxOccurs="unbounded"/></s:sequence>
      </s:complexType>{elements}
    </s:schema>
  </wsdl:types>{messages}
  <wsdl:portType name="UserServiceSoap">{port_type}
  </wsdl:portType>
  <wsdl:binding name="UserServiceSoap" type="tns:UserServiceSoap">
    <soap:binding transport="http://schemas.xmlsoap.org/soap/http"/>{binding}
  </wsdl:binding>
  <wsdl:service name="UserService">
    <wsdl:documentation>Directory of users</wsdl:documentation>
    <wsdl:port name="UserServiceSoap" binding="tns:UserServiceSoap">
      <soap:address location="{LOCATION}"/>
    </wsdl:port>
  </wsdl:service>
</wsdl:definitions>"#
    )
}

/// Wrap body content in a SOAP 1.1 envelope
pub fn envelope(body: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="utf-8"?><soap:Envelope xmlns:soap="http://schemas.xmlsoap.org/soap/envelope/" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance"><soap:Body>{body}</soap:Body></soap:Envelope>"#
    )
}

pub fn location() -> ServiceLocation {
    LOCATION.parse().unwrap()
}

/// Serves documents from memory
#[derive(Default)]
pub struct MemoryFetcher {
    documents: HashMap<String, String>,
}

impl MemoryFetcher {
    pub fn users() -> Self {
        Self::default().with(DESCRIPTION_URL, &users_wsdl())
    }

    pub fn with(mut self, url: &str, body: &str) -> Self {
        self.documents.insert(url.to_string(), body.to_string());
        self
    }
}

#[async_trait]
impl DescriptionFetcher for MemoryFetcher {
    async fn fetch(&self, url: &Url, _credential: &Credential) -> Result<Vec<u8>, FetchError> {
        self.documents
            .get(url.as_str())
            .map(|body| body.as_bytes().to_vec())
            .ok_or_else(|| FetchError::Status {
                url: url.to_string(),
                status: 404,
            })
    }
}

/// Answers requests by SOAP action and records what was sent
#[derive(Default)]
pub struct ScriptedTransport {
    responses: HashMap<String, (u16, String)>,
    delay: Option<Duration>,
    pub sent: Mutex<Vec<SoapRequest>>,
}

impl ScriptedTransport {
    pub fn respond(mut self, operation: &str, status: u16, body: &str) -> Self {
        self.responses.insert(
            format!("http://example.com/users/{}", operation),
            (status, body.to_string()),
        );
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn sent_bodies(&self) -> Vec<String> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .map(|request| String::from_utf8(request.body.clone()).unwrap())
            .collect()
    }
}

#[async_trait]
impl SoapTransport for ScriptedTransport {
    async fn send(&self, request: SoapRequest) -> Result<SoapResponse, TransportError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let action = request.action.clone().unwrap_or_default();
        let endpoint = request.endpoint.clone();
        self.sent.lock().unwrap().push(request);

        match self.responses.get(&action) {
            Some((status, body)) => Ok(SoapResponse {
                status: *status,
                body: body.as_bytes().to_vec(),
            }),
            None => Err(TransportError::new(&endpoint, "connection refused")),
        }
    }
}

pub fn wsdl_compiler(fetcher: MemoryFetcher, transport: Arc<ScriptedTransport>) -> WsdlCompiler {
    WsdlCompiler::new(
        Arc::new(fetcher),
        Arc::new(LinkingBuilder::new(transport)),
        Arc::new(Credential::Default),
    )
}

/// Keeps every report for later inspection
#[derive(Default)]
pub struct RecordingSink {
    pub messages: Mutex<Vec<(Severity, String)>>,
}

impl RecordingSink {
    pub fn messages(&self) -> Vec<(Severity, String)> {
        self.messages.lock().unwrap().clone()
    }
}

impl MessageSink for RecordingSink {
    fn report(&self, severity: Severity, message: &str) {
        self.messages
            .lock()
            .unwrap()
            .push((severity, message.to_string()));
    }
}

pub fn cache(fetcher: MemoryFetcher, transport: Arc<ScriptedTransport>) -> Arc<ProxyCache> {
    Arc::new(ProxyCache::new(Arc::new(wsdl_compiler(fetcher, transport))))
}

pub fn broker(
    fetcher: MemoryFetcher,
    transport: Arc<ScriptedTransport>,
) -> (ServiceBroker, Arc<RecordingSink>) {
    let sink = Arc::new(RecordingSink::default());
    (ServiceBroker::new(cache(fetcher, transport), sink.clone()), sink)
}
