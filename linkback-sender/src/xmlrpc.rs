//! Minimal XML-RPC codec.
//!
//! Covers what a pingback client needs: rendering a `methodCall` with
//! arbitrary parameters and decoding a `methodResponse`, including faults.
//! Documents are parsed into a small element tree first and then
//! interpreted, which keeps the value grammar in one place.

use crate::error::{LinkbackError, Result};
use quick_xml::Reader;
use quick_xml::escape::escape;
use quick_xml::events::Event;

/// An XML-RPC value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Int(i32),
    Boolean(bool),
    String(String),
    Double(f64),
    DateTime(String),
    Base64(String),
    Struct(Vec<(String, Value)>),
    Array(Vec<Value>),
    Nil,
}

impl Value {
    /// Loose truthiness: zero, empty and `nil` values are false.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Int(i) => *i != 0,
            Value::Boolean(b) => *b,
            Value::String(s) => !s.is_empty() && s != "0",
            Value::Double(d) => *d != 0.0,
            Value::DateTime(s) | Value::Base64(s) => !s.is_empty(),
            Value::Struct(members) => !members.is_empty(),
            Value::Array(items) => !items.is_empty(),
            Value::Nil => false,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i32(&self) -> Option<i32> {
        match self {
            Value::Int(i) => Some(*i),
            // Some servers send numeric fault codes as strings
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Look up a struct member by name.
    pub fn member(&self, name: &str) -> Option<&Value> {
        match self {
            Value::Struct(members) => members.iter().find(|(k, _)| k == name).map(|(_, v)| v),
            _ => None,
        }
    }

    fn write_xml(&self, out: &mut String) {
        out.push_str("<value>");
        match self {
            Value::Int(i) => out.push_str(&format!("<int>{}</int>", i)),
            Value::Boolean(b) => out.push_str(&format!("<boolean>{}</boolean>", u8::from(*b))),
            Value::String(s) => out.push_str(&format!("<string>{}</string>", escape(s.as_str()))),
            Value::Double(d) => out.push_str(&format!("<double>{}</double>", d)),
            Value::DateTime(s) => out.push_str(&format!(
                "<dateTime.iso8601>{}</dateTime.iso8601>",
                escape(s.as_str())
            )),
            Value::Base64(s) => out.push_str(&format!("<base64>{}</base64>", escape(s.as_str()))),
            Value::Struct(members) => {
                out.push_str("<struct>");
                for (name, value) in members {
                    out.push_str("<member><name>");
                    out.push_str(&escape(name.as_str()));
                    out.push_str("</name>");
                    value.write_xml(out);
                    out.push_str("</member>");
                }
                out.push_str("</struct>");
            }
            Value::Array(items) => {
                out.push_str("<array><data>");
                for item in items {
                    item.write_xml(out);
                }
                out.push_str("</data></array>");
            }
            Value::Nil => out.push_str("<nil/>"),
        }
        out.push_str("</value>");
    }

    fn from_node(node: &Node) -> Result<Value> {
        // Untyped <value>text</value> is a string
        let Some(typed) = node.children.first() else {
            return Ok(Value::String(node.text.clone()));
        };

        let text = typed.text.as_str();
        match typed.name.as_str() {
            "i4" | "int" => text
                .trim()
                .parse()
                .map(Value::Int)
                .map_err(|e| LinkbackError::Parse(format!("invalid int '{}': {}", text, e))),
            "boolean" => match text.trim() {
                "1" | "true" => Ok(Value::Boolean(true)),
                "0" | "false" => Ok(Value::Boolean(false)),
                other => Err(LinkbackError::Parse(format!("invalid boolean '{}'", other))),
            },
            "string" => Ok(Value::String(typed.text.clone())),
            "double" => text
                .trim()
                .parse()
                .map(Value::Double)
                .map_err(|e| LinkbackError::Parse(format!("invalid double '{}': {}", text, e))),
            "dateTime.iso8601" => Ok(Value::DateTime(typed.text.clone())),
            "base64" => Ok(Value::Base64(typed.text.clone())),
            "struct" => {
                let mut members = Vec::new();
                for member in typed.children_named("member") {
                    let name = member
                        .child("name")
                        .ok_or_else(|| LinkbackError::Parse("struct member without <name>".into()))?;
                    let value = member
                        .child("value")
                        .ok_or_else(|| LinkbackError::Parse("struct member without <value>".into()))?;
                    members.push((name.text.clone(), Value::from_node(value)?));
                }
                Ok(Value::Struct(members))
            }
            "array" => {
                let items = match typed.child("data") {
                    Some(data) => data
                        .children_named("value")
                        .map(Value::from_node)
                        .collect::<Result<Vec<_>>>()?,
                    None => Vec::new(),
                };
                Ok(Value::Array(items))
            }
            "nil" => Ok(Value::Nil),
            other => Err(LinkbackError::Parse(format!("unsupported value type <{}>", other))),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

/// An outgoing remote procedure call.
#[derive(Debug, Clone, PartialEq)]
pub struct MethodCall {
    pub method: String,
    pub params: Vec<Value>,
}

impl MethodCall {
    pub fn new(method: impl Into<String>, params: Vec<Value>) -> Self {
        Self {
            method: method.into(),
            params,
        }
    }

    pub fn to_xml(&self) -> String {
        let mut xml = String::from("<?xml version=\"1.0\"?>\n<methodCall><methodName>");
        xml.push_str(&escape(self.method.as_str()));
        xml.push_str("</methodName><params>");
        for param in &self.params {
            xml.push_str("<param>");
            param.write_xml(&mut xml);
            xml.push_str("</param>");
        }
        xml.push_str("</params></methodCall>\n");
        xml
    }
}

/// A decoded `methodResponse` document.
#[derive(Debug, Clone, PartialEq)]
pub enum MethodResponse {
    Success(Value),
    Fault { code: i32, description: String },
}

impl MethodResponse {
    pub fn from_xml(xml: &str) -> Result<Self> {
        let root = parse_document(xml)?;
        if root.name != "methodResponse" {
            return Err(LinkbackError::Parse(format!(
                "expected <methodResponse>, found <{}>",
                root.name
            )));
        }

        if let Some(fault) = root.child("fault") {
            let value = fault
                .child("value")
                .ok_or_else(|| LinkbackError::Parse("<fault> without <value>".into()))?;
            let value = Value::from_node(value)?;
            let code = value.member("faultCode").and_then(Value::as_i32).unwrap_or(0);
            let description = value
                .member("faultString")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string();
            return Ok(MethodResponse::Fault { code, description });
        }

        let value = root
            .child("params")
            .and_then(|params| params.child("param"))
            .and_then(|param| param.child("value"))
            .ok_or_else(|| LinkbackError::Parse("response has neither <params> nor <fault>".into()))?;
        Ok(MethodResponse::Success(Value::from_node(value)?))
    }

    /// Convert a fault into [`LinkbackError::Fault`].
    pub fn into_result(self) -> Result<Value> {
        match self {
            MethodResponse::Success(value) => Ok(value),
            MethodResponse::Fault { code, description } => {
                Err(LinkbackError::Fault { code, description })
            }
        }
    }
}

#[derive(Debug, Default)]
struct Node {
    name: String,
    text: String,
    children: Vec<Node>,
}

impl Node {
    fn named(raw: &[u8]) -> Self {
        Self {
            name: String::from_utf8_lossy(raw).into_owned(),
            ..Default::default()
        }
    }

    fn child(&self, name: &str) -> Option<&Node> {
        self.children.iter().find(|c| c.name == name)
    }

    fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Node> + 'a {
        self.children.iter().filter(move |c| c.name == name)
    }
}

fn attach(stack: &mut [Node], root: &mut Option<Node>, node: Node) -> Result<()> {
    if let Some(parent) = stack.last_mut() {
        parent.children.push(node);
        return Ok(());
    }
    if root.is_some() {
        return Err(LinkbackError::Parse("multiple root elements".into()));
    }
    *root = Some(node);
    Ok(())
}

fn parse_document(xml: &str) -> Result<Node> {
    // Whitespace is significant inside <string>; numeric branches trim
    let mut reader = Reader::from_str(xml);

    let mut buf = Vec::new();
    let mut stack: Vec<Node> = Vec::new();
    let mut root: Option<Node> = None;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => stack.push(Node::named(e.local_name().as_ref())),
            Ok(Event::Empty(e)) => attach(&mut stack, &mut root, Node::named(e.local_name().as_ref()))?,
            Ok(Event::End(_)) => {
                let node = stack
                    .pop()
                    .ok_or_else(|| LinkbackError::Parse("unbalanced closing tag".into()))?;
                attach(&mut stack, &mut root, node)?;
            }
            Ok(Event::Text(e)) => {
                let text = e.unescape().map_err(|e| LinkbackError::Parse(e.to_string()))?;
                if let Some(top) = stack.last_mut() {
                    top.text.push_str(&text);
                }
            }
            Ok(Event::CData(e)) => {
                if let Some(top) = stack.last_mut() {
                    top.text.push_str(&String::from_utf8_lossy(&e.into_inner()));
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(LinkbackError::Parse(format!(
                    "XML parse error at position {}: {}",
                    reader.buffer_position(),
                    e
                )));
            }
            _ => {}
        }
        buf.clear();
    }

    if !stack.is_empty() {
        return Err(LinkbackError::Parse("unexpected end of document".into()));
    }
    root.ok_or_else(|| LinkbackError::Parse("empty document".into()))
}
