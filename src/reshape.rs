//! Optional flattening of scan responses into a warehouse-friendly shape.
//!
//! The scanner serializes response headers as a `{name: [values]}` map and TLS
//! state with numeric protocol codes. Column-oriented stores want a repeated
//! `{Name, Value}` record and readable names instead.

use crate::models::ScanRecord;
use serde_json::{json, Map, Value};

const RESPONSE_FIELDS: [&str; 2] = ["HTTPResponses", "HTTPSResponses"];

const UNKNOWN: &str = "unknown";

const TLS_VERSIONS: &[(u64, &str)] = &[
    (0x0300, "SSL 3.0"),
    (0x0301, "TLS 1.0"),
    (0x0302, "TLS 1.1"),
    (0x0303, "TLS 1.2"),
    (0x0304, "TLS 1.3"),
];

const CIPHER_SUITES: &[(u64, &str)] = &[
    (0x0005, "TLS_RSA_WITH_RC4_128_SHA"),
    (0x000a, "TLS_RSA_WITH_3DES_EDE_CBC_SHA"),
    (0x002f, "TLS_RSA_WITH_AES_128_CBC_SHA"),
    (0x0035, "TLS_RSA_WITH_AES_256_CBC_SHA"),
    (0x003c, "TLS_RSA_WITH_AES_128_CBC_SHA256"),
    (0x009c, "TLS_RSA_WITH_AES_128_GCM_SHA256"),
    (0x009d, "TLS_RSA_WITH_AES_256_GCM_SHA384"),
    (0xc007, "TLS_ECDHE_ECDSA_WITH_RC4_128_SHA"),
    (0xc009, "TLS_ECDHE_ECDSA_WITH_AES_128_CBC_SHA"),
    (0xc00a, "TLS_ECDHE_ECDSA_WITH_AES_256_CBC_SHA"),
    (0xc011, "TLS_ECDHE_RSA_WITH_RC4_128_SHA"),
    (0xc012, "TLS_ECDHE_RSA_WITH_3DES_EDE_CBC_SHA"),
    (0xc013, "TLS_ECDHE_RSA_WITH_AES_128_CBC_SHA"),
    (0xc014, "TLS_ECDHE_RSA_WITH_AES_256_CBC_SHA"),
    (0xc023, "TLS_ECDHE_ECDSA_WITH_AES_128_CBC_SHA256"),
    (0xc027, "TLS_ECDHE_RSA_WITH_AES_128_CBC_SHA256"),
    (0xc02f, "TLS_ECDHE_RSA_WITH_AES_128_GCM_SHA256"),
    (0xc02b, "TLS_ECDHE_ECDSA_WITH_AES_128_GCM_SHA256"),
    (0xc030, "TLS_ECDHE_RSA_WITH_AES_256_GCM_SHA384"),
    (0xc02c, "TLS_ECDHE_ECDSA_WITH_AES_256_GCM_SHA384"),
    (0xcca8, "TLS_ECDHE_RSA_WITH_CHACHA20_POLY1305"),
    (0xcca9, "TLS_ECDHE_ECDSA_WITH_CHACHA20_POLY1305"),
];

/// Rewrites headers and TLS state of every HTTP and HTTPS response in place.
///
/// Responses that are not objects, and fields with an unexpected type, are
/// left untouched.
pub fn flatten_responses(record: &mut ScanRecord) {
    for field in RESPONSE_FIELDS {
        if let Some(Value::Array(responses)) = record.get_mut(field) {
            for response in responses.iter_mut() {
                if let Value::Object(response) = response {
                    flatten_headers(response);
                    flatten_tls(response);
                }
            }
        }
    }
}

fn flatten_headers(response: &mut Map<String, Value>) {
    let Some(Value::Object(headers)) = response.get_mut("Headers") else {
        return;
    };
    let flat: Vec<Value> = std::mem::take(headers)
        .into_iter()
        .map(|(name, values)| json!({ "Name": name, "Value": values }))
        .collect();
    response.insert("Headers".to_string(), Value::Array(flat));
}

fn flatten_tls(response: &mut Map<String, Value>) {
    let Some(Value::Object(state)) = response.get("TLS") else {
        return;
    };

    let field = |name: &str| state.get(name).cloned().unwrap_or(Value::Null);
    let flat = json!({
        "HandshakeComplete": field("HandshakeComplete"),
        "NegotiatedProtocol": field("NegotiatedProtocol"),
        "ServerName": field("ServerName"),
        "Version": lookup(TLS_VERSIONS, state.get("Version")),
        "CipherSuite": lookup(CIPHER_SUITES, state.get("CipherSuite")),
    });
    response.insert("TLS".to_string(), flat);
}

fn lookup(table: &[(u64, &'static str)], code: Option<&Value>) -> &'static str {
    code.and_then(Value::as_u64)
        .and_then(|code| table.iter().find(|(c, _)| *c == code))
        .map(|(_, name)| *name)
        .unwrap_or(UNKNOWN)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(value: Value) -> ScanRecord {
        match value {
            Value::Object(map) => map,
            _ => panic!("fixture must be an object"),
        }
    }

    #[test]
    fn headers_become_name_value_list() {
        let mut scan = record(json!({
            "Host": "example.com",
            "HTTPResponses": [{
                "Status": 200,
                "Headers": { "Server": ["nginx"], "Set-Cookie": ["a=1", "b=2"] },
                "TLS": null
            }]
        }));
        flatten_responses(&mut scan);

        assert_eq!(
            scan["HTTPResponses"][0]["Headers"],
            json!([
                { "Name": "Server", "Value": ["nginx"] },
                { "Name": "Set-Cookie", "Value": ["a=1", "b=2"] }
            ])
        );
        assert_eq!(scan["HTTPResponses"][0]["TLS"], Value::Null);
        assert_eq!(scan["HTTPResponses"][0]["Status"], json!(200));
    }

    #[test]
    fn tls_codes_mapped_to_names() {
        let mut scan = record(json!({
            "Host": "example.com",
            "HTTPSResponses": [{
                "Headers": {},
                "TLS": {
                    "Version": 0x0303,
                    "HandshakeComplete": true,
                    "DidResume": false,
                    "CipherSuite": 0xc02f,
                    "NegotiatedProtocol": "h2",
                    "ServerName": "example.com",
                    "PeerCertificates": null
                }
            }]
        }));
        flatten_responses(&mut scan);

        assert_eq!(
            scan["HTTPSResponses"][0]["TLS"],
            json!({
                "HandshakeComplete": true,
                "NegotiatedProtocol": "h2",
                "ServerName": "example.com",
                "Version": "TLS 1.2",
                "CipherSuite": "TLS_ECDHE_RSA_WITH_AES_128_GCM_SHA256"
            })
        );
        assert_eq!(scan["HTTPSResponses"][0]["Headers"], json!([]));
    }

    #[test]
    fn unknown_codes_become_unknown() {
        let mut scan = record(json!({
            "Host": "example.com",
            "HTTPSResponses": [{ "TLS": { "Version": 1, "CipherSuite": "weird" } }]
        }));
        flatten_responses(&mut scan);

        let tls = &scan["HTTPSResponses"][0]["TLS"];
        assert_eq!(tls["Version"], json!("unknown"));
        assert_eq!(tls["CipherSuite"], json!("unknown"));
        assert_eq!(tls["ServerName"], Value::Null);
    }

    #[test]
    fn null_response_lists_untouched() {
        let original = record(json!({
            "Host": "example.com",
            "HTTPResponses": null,
            "HTTPSResponses": null,
            "Error": "dial tcp: timeout"
        }));
        let mut scan = original.clone();
        flatten_responses(&mut scan);
        assert_eq!(scan, original);
    }
}
