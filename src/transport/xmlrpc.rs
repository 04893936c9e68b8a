//! XML-RPC wire format
//!
//! Encodes `<methodCall>` documents and decodes `<methodResponse>` documents.
//! The decoder builds a small element tree first and interprets it second,
//! which keeps the event handling independent of the XML-RPC grammar.

use super::TransportError;
use crate::fault::Fault;
use crate::value::Value;
use base64::{engine::general_purpose, Engine};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};
use std::collections::BTreeMap;

type CodecResult<T> = std::result::Result<T, TransportError>;

fn codec_error<E: std::fmt::Display>(err: E) -> TransportError {
    TransportError::Codec(err.to_string())
}

/// Encode a method call document
pub fn encode_call(method: &str, args: &[Value]) -> CodecResult<String> {
    let mut out = XmlWriter::new()?;
    out.start("methodCall")?;
    out.leaf("methodName", method)?;
    out.start("params")?;
    for arg in args {
        out.start("param")?;
        out.value(arg)?;
        out.end("param")?;
    }
    out.end("params")?;
    out.end("methodCall")?;
    out.finish()
}

/// Encode a method response document, successful or faulted
pub fn encode_response(result: &Result<Value, Fault>) -> CodecResult<String> {
    let mut out = XmlWriter::new()?;
    out.start("methodResponse")?;
    match result {
        Ok(value) => {
            out.start("params")?;
            out.start("param")?;
            out.value(value)?;
            out.end("param")?;
            out.end("params")?;
        }
        Err(fault) => {
            let mut members = BTreeMap::new();
            members.insert("faultCode".to_string(), Value::Int(i64::from(fault.code)));
            members.insert("faultString".to_string(), Value::String(fault.message.clone()));
            out.start("fault")?;
            out.value(&Value::Struct(members))?;
            out.end("fault")?;
        }
    }
    out.end("methodResponse")?;
    out.finish()
}

/// Decode a method response; a `<fault>` becomes [`TransportError::Fault`]
pub fn decode_response(body: &str) -> CodecResult<Value> {
    let root = parse_tree(body)?;
    expect_name(&root, "methodResponse")?;

    let child = root
        .elements()
        .next()
        .ok_or_else(|| codec_error("empty methodResponse"))?;

    match child.name.as_str() {
        "params" => match child.elements().next() {
            // A response without a param carries no value
            None => Ok(Value::Nil),
            Some(param) => {
                expect_name(param, "param")?;
                decode_value(single_element(param, "value")?)
            }
        },
        "fault" => {
            let value = decode_value(single_element(child, "value")?)?;
            Err(TransportError::Fault(fault_from_value(&value)?))
        }
        other => Err(codec_error(format!("unexpected element <{other}> in methodResponse"))),
    }
}

/// Decode a method call document into its name and arguments
pub fn decode_call(body: &str) -> CodecResult<(String, Vec<Value>)> {
    let root = parse_tree(body)?;
    expect_name(&root, "methodCall")?;

    let mut method = None;
    let mut args = Vec::new();
    for child in root.elements() {
        match child.name.as_str() {
            "methodName" => method = Some(child.text.trim().to_string()),
            "params" => {
                for param in child.elements() {
                    expect_name(param, "param")?;
                    args.push(decode_value(single_element(param, "value")?)?);
                }
            }
            other => return Err(codec_error(format!("unexpected element <{other}> in methodCall"))),
        }
    }

    let method = method.ok_or_else(|| codec_error("methodCall without methodName"))?;
    Ok((method, args))
}

fn fault_from_value(value: &Value) -> CodecResult<Fault> {
    let code = value
        .get("faultCode")
        .and_then(Value::as_int)
        .ok_or_else(|| codec_error("fault without integer faultCode"))?;
    let message = value
        .get("faultString")
        .and_then(Value::as_str)
        .unwrap_or_default();
    let code = i32::try_from(code).map_err(codec_error)?;
    Ok(Fault::new(code, message))
}

struct XmlWriter {
    writer: Writer<Vec<u8>>,
}

impl XmlWriter {
    fn new() -> CodecResult<Self> {
        let mut writer = Writer::new(Vec::new());
        writer
            .write_event(Event::Decl(BytesDecl::new("1.0", None, None)))
            .map_err(codec_error)?;
        Ok(Self { writer })
    }

    fn start(&mut self, tag: &str) -> CodecResult<()> {
        self.writer
            .write_event(Event::Start(BytesStart::new(tag)))
            .map_err(codec_error)
    }

    fn end(&mut self, tag: &str) -> CodecResult<()> {
        self.writer
            .write_event(Event::End(BytesEnd::new(tag)))
            .map_err(codec_error)
    }

    fn empty(&mut self, tag: &str) -> CodecResult<()> {
        self.writer
            .write_event(Event::Empty(BytesStart::new(tag)))
            .map_err(codec_error)
    }

    fn leaf(&mut self, tag: &str, text: &str) -> CodecResult<()> {
        self.start(tag)?;
        self.writer
            .write_event(Event::Text(BytesText::new(text)))
            .map_err(codec_error)?;
        self.end(tag)
    }

    fn value(&mut self, value: &Value) -> CodecResult<()> {
        self.start("value")?;
        match value {
            Value::Nil => self.empty("nil")?,
            Value::Bool(b) => self.leaf("boolean", if *b { "1" } else { "0" })?,
            Value::Int(i) => {
                let i = i32::try_from(*i)
                    .map_err(|_| codec_error(format!("integer {i} does not fit in <int>")))?;
                self.leaf("int", &i.to_string())?
            }
            Value::Double(d) => {
                if !d.is_finite() {
                    return Err(codec_error(format!("cannot encode non-finite double {d}")));
                }
                self.leaf("double", &d.to_string())?
            }
            Value::String(s) => self.leaf("string", s)?,
            Value::DateTime(s) => self.leaf("dateTime.iso8601", s)?,
            Value::Base64(data) => self.leaf("base64", &general_purpose::STANDARD.encode(data))?,
            Value::Array(items) => {
                self.start("array")?;
                self.start("data")?;
                for item in items {
                    self.value(item)?;
                }
                self.end("data")?;
                self.end("array")?;
            }
            Value::Struct(members) => {
                self.start("struct")?;
                for (name, member) in members {
                    self.start("member")?;
                    self.leaf("name", name)?;
                    self.value(member)?;
                    self.end("member")?;
                }
                self.end("struct")?;
            }
        }
        self.end("value")
    }

    fn finish(self) -> CodecResult<String> {
        String::from_utf8(self.writer.into_inner()).map_err(codec_error)
    }
}

/// Element with its child elements and concatenated text content
#[derive(Debug, Default)]
struct Node {
    name: String,
    children: Vec<Node>,
    text: String,
}

impl Node {
    fn new(name: &[u8]) -> Self {
        Self {
            name: String::from_utf8_lossy(name).into_owned(),
            ..Self::default()
        }
    }

    fn elements(&self) -> std::slice::Iter<'_, Node> {
        self.children.iter()
    }
}

fn parse_tree(body: &str) -> CodecResult<Node> {
    let mut reader = Reader::from_str(body);
    let mut stack: Vec<Node> = Vec::new();
    let mut root: Option<Node> = None;

    loop {
        let event = reader.read_event().map_err(|e| {
            codec_error(format!("XML error at position {}: {e}", reader.buffer_position()))
        })?;

        match event {
            Event::Start(e) => stack.push(Node::new(e.name().as_ref())),
            Event::Empty(e) => attach(&mut stack, &mut root, Node::new(e.name().as_ref()))?,
            Event::End(_) => {
                let node = stack
                    .pop()
                    .ok_or_else(|| codec_error("unbalanced closing tag"))?;
                attach(&mut stack, &mut root, node)?;
            }
            Event::Text(t) => {
                let text = t.unescape().map_err(codec_error)?;
                match stack.last_mut() {
                    Some(node) => node.text.push_str(&text),
                    None if text.trim().is_empty() => {}
                    None => return Err(codec_error("text outside of the document element")),
                }
            }
            Event::CData(c) => {
                if let Some(node) = stack.last_mut() {
                    node.text.push_str(&String::from_utf8_lossy(&c));
                }
            }
            Event::Eof => break,
            // declarations, comments, processing instructions, doctype
            _ => {}
        }
    }

    if !stack.is_empty() {
        return Err(codec_error("unexpected end of document"));
    }
    root.ok_or_else(|| codec_error("empty document"))
}

fn attach(stack: &mut [Node], root: &mut Option<Node>, node: Node) -> CodecResult<()> {
    match stack.last_mut() {
        Some(parent) => parent.children.push(node),
        None if root.is_none() => *root = Some(node),
        None => return Err(codec_error("multiple document elements")),
    }
    Ok(())
}

fn expect_name(node: &Node, name: &str) -> CodecResult<()> {
    if node.name == name {
        Ok(())
    } else {
        Err(codec_error(format!("expected <{name}>, found <{}>", node.name)))
    }
}

fn single_element<'a>(node: &'a Node, name: &str) -> CodecResult<&'a Node> {
    let child = node
        .elements()
        .next()
        .ok_or_else(|| codec_error(format!("<{}> is missing <{name}>", node.name)))?;
    expect_name(child, name)?;
    Ok(child)
}

fn decode_value(node: &Node) -> CodecResult<Value> {
    let Some(typed) = node.elements().next() else {
        // untyped <value>text</value> is a string
        return Ok(Value::String(node.text.clone()));
    };
    let text = typed.text.trim();

    match typed.name.as_str() {
        "i4" | "int" | "i8" => text
            .parse::<i64>()
            .map(Value::Int)
            .map_err(|e| codec_error(format!("invalid integer '{text}': {e}"))),
        "boolean" => match text {
            "1" | "true" => Ok(Value::Bool(true)),
            "0" | "false" => Ok(Value::Bool(false)),
            other => Err(codec_error(format!("invalid boolean '{other}'"))),
        },
        "double" => text
            .parse::<f64>()
            .map(Value::Double)
            .map_err(|e| codec_error(format!("invalid double '{text}': {e}"))),
        "string" => Ok(Value::String(typed.text.clone())),
        "dateTime.iso8601" => Ok(Value::DateTime(text.to_string())),
        "base64" => {
            let compact: String = text.chars().filter(|c| !c.is_whitespace()).collect();
            general_purpose::STANDARD
                .decode(compact)
                .map(Value::Base64)
                .map_err(codec_error)
        }
        "nil" => Ok(Value::Nil),
        "array" => {
            let data = single_element(typed, "data")?;
            data.elements()
                .map(|item| {
                    expect_name(item, "value")?;
                    decode_value(item)
                })
                .collect::<CodecResult<Vec<_>>>()
                .map(Value::Array)
        }
        "struct" => {
            let mut members = BTreeMap::new();
            for member in typed.elements() {
                expect_name(member, "member")?;
                let mut name = None;
                let mut value = None;
                for part in member.elements() {
                    match part.name.as_str() {
                        "name" => name = Some(part.text.clone()),
                        "value" => value = Some(decode_value(part)?),
                        other => {
                            return Err(codec_error(format!("unexpected <{other}> in member")))
                        }
                    }
                }
                let name = name.ok_or_else(|| codec_error("struct member without name"))?;
                members.insert(name, value.unwrap_or(Value::Nil));
            }
            Ok(Value::Struct(members))
        }
        other => Err(codec_error(format!("unknown value type <{other}>"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_call() {
        let xml = encode_call(
            "UserPropProfileMultiGet",
            &[Value::from(vec!["alice"]), Value::Nil],
        )
        .unwrap();

        assert!(xml.starts_with("<?xml version=\"1.0\"?>"));
        assert!(xml.contains("<methodName>UserPropProfileMultiGet</methodName>"));
        assert!(xml.contains(
            "<param><value><array><data><value><string>alice</string></value></data></array></value></param>"
        ));
        assert!(xml.contains("<param><value><nil/></value></param>"));
    }

    #[test]
    fn test_encode_escapes_text() {
        let xml = encode_call("M", &[Value::from("a<b & c")]).unwrap();
        assert!(xml.contains("<string>a&lt;b &amp; c</string>"));
    }

    #[test]
    fn test_encode_rejects_wide_integer() {
        let err = encode_call("M", &[Value::Int(i64::from(i32::MAX) + 1)]).unwrap_err();
        assert!(matches!(err, TransportError::Codec(_)));
    }

    #[test]
    fn test_call_survives_decoding() {
        let mut props = BTreeMap::new();
        props.insert("type".to_string(), Value::from("user_connect"));
        props.insert("prop_autologin".to_string(), Value::from(true));
        let args = vec![
            Value::from("alice"),
            Value::Struct(props),
            Value::from(2.5),
            Value::Base64(vec![0, 1, 2, 255]),
        ];

        let xml = encode_call("UserPropPut", &args).unwrap();
        let (method, decoded) = decode_call(&xml).unwrap();
        assert_eq!(method, "UserPropPut");
        assert_eq!(decoded, args);
    }

    #[test]
    fn test_decode_response() {
        let body = r#"<?xml version="1.0"?>
<methodResponse>
  <params>
    <param>
      <value><struct>
        <member><name>n_clients</name><value><int>3</int></value></member>
        <member><name>version</name><value>2.12.1</value></member>
        <member><name>when</name><value><dateTime.iso8601>20240101T10:00:00</dateTime.iso8601></value></member>
      </struct></value>
    </param>
  </params>
</methodResponse>"#;

        let value = decode_response(body).unwrap();
        assert_eq!(value.get("n_clients"), Some(&Value::Int(3)));
        assert_eq!(value.get("version"), Some(&Value::from("2.12.1")));
        assert_eq!(
            value.get("when"),
            Some(&Value::DateTime("20240101T10:00:00".to_string()))
        );
    }

    #[test]
    fn test_decode_keeps_string_whitespace() {
        let body = "<methodResponse><params><param><value><string>  padded </string></value></param></params></methodResponse>";
        assert_eq!(decode_response(body).unwrap(), Value::from("  padded "));
    }

    #[test]
    fn test_decode_fault() {
        let body = r#"<?xml version="1.0"?>
<methodResponse>
  <fault>
    <value><struct>
      <member><name>faultCode</name><value><int>9007</int></value></member>
      <member><name>faultString</name><value><string>XMLRPCRelay: denied</string></value></member>
    </struct></value>
  </fault>
</methodResponse>"#;

        let err = decode_response(body).unwrap_err();
        assert_eq!(err, TransportError::Fault(Fault::new(9007, "XMLRPCRelay: denied")));
    }

    #[test]
    fn test_fault_response_encoding() {
        let xml = encode_response(&Err(Fault::new(8002, "bad count"))).unwrap();
        assert_eq!(
            decode_response(&xml).unwrap_err(),
            TransportError::Fault(Fault::new(8002, "bad count"))
        );
    }

    #[test]
    fn test_decode_malformed() {
        for body in [
            "",
            "<methodResponse>",
            "<methodCall></methodCall>",
            "<methodResponse><params><param><value><int>x</int></value></param></params></methodResponse>",
            "<methodResponse><params><param><value><widget/></value></param></params></methodResponse>",
        ] {
            assert!(
                matches!(decode_response(body), Err(TransportError::Codec(_))),
                "accepted {body:?}"
            );
        }
    }
}
