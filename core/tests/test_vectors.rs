//! Replay the JSON test vectors in `test-vectors/` through a recording stub
//! transport.
//!
//! Each vector describes the input, the request the client must emit, a
//! simulated response, and either the expected result or the expected error
//! kind. Bodies are compared as parsed JSON so field order does not matter.

use std::sync::Mutex;

use serde_json::Value;
use uptime_core::{
    ApiError, CheckTag, ClientConfig, HttpMethod, HttpRequest, HttpResponse, Transport, UptimeClient,
};

const BASE_URL: &str = "https://uptime.com/api/v1";

/// Answers with one canned response and keeps the requests it saw.
struct Replay {
    response: HttpResponse,
    seen: Mutex<Vec<HttpRequest>>,
}

impl Replay {
    fn new(sim: &Value) -> Self {
        Self {
            response: HttpResponse::new(
                sim["status"].as_u64().unwrap() as u16,
                sim["body"].as_str().unwrap(),
            ),
            seen: Mutex::new(Vec::new()),
        }
    }

    fn only_request(&self) -> HttpRequest {
        let seen = self.seen.lock().unwrap();
        assert_eq!(seen.len(), 1, "expected exactly one request");
        seen[0].clone()
    }
}

impl Transport for Replay {
    fn execute(&self, request: &HttpRequest) -> uptime_core::Result<HttpResponse> {
        self.seen.lock().unwrap().push(request.clone());
        Ok(self.response.clone())
    }
}

fn client(transport: &Replay) -> UptimeClient<&Replay> {
    let config = ClientConfig::with_token("vector-token").base_url(BASE_URL);
    UptimeClient::with_transport(config, transport).unwrap()
}

fn parse_method(s: &str) -> HttpMethod {
    match s {
        "GET" => HttpMethod::Get,
        "POST" => HttpMethod::Post,
        "PUT" => HttpMethod::Put,
        "DELETE" => HttpMethod::Delete,
        other => panic!("unknown method: {other}"),
    }
}

/// Check method, URL, listed headers and (when present) the JSON body.
fn assert_request(name: &str, req: &HttpRequest, expected: &Value) {
    assert_eq!(req.method, parse_method(expected["method"].as_str().unwrap()), "{name}: method");
    assert_eq!(req.url, format!("{BASE_URL}{}", expected["path"].as_str().unwrap()), "{name}: url");

    if let Some(headers) = expected["headers"].as_array() {
        for pair in headers {
            let key = pair[0].as_str().unwrap();
            assert_eq!(req.header(key), pair[1].as_str(), "{name}: header {key}");
        }
    }

    match expected.get("body") {
        Some(body) => {
            let sent: Value = serde_json::from_slice(req.body.as_deref().unwrap()).unwrap();
            assert_eq!(&sent, body, "{name}: body");
        }
        None => assert!(req.body.is_none(), "{name}: body should be None"),
    }
}

/// Match an error against `"Kind"` or `"RequestFailed:<status>"`.
fn assert_error(name: &str, err: &ApiError, expected: &str) {
    let ok = match expected.split_once(':') {
        Some(("RequestFailed", status)) => err.status() == status.parse::<u16>().ok(),
        _ => match expected {
            "AuthenticationFailed" => matches!(err, ApiError::AuthenticationFailed),
            "EmptyResponse" => matches!(err, ApiError::EmptyResponse),
            "Decode" => matches!(err, ApiError::Decode(_)),
            other => panic!("{name}: unknown expected_error: {other}"),
        },
    };
    assert!(ok, "{name}: expected {expected}, got {err:?}");
}

fn cases(raw: &str) -> Vec<Value> {
    let vectors: Value = serde_json::from_str(raw).unwrap();
    vectors["cases"].as_array().unwrap().clone()
}

// ---------------------------------------------------------------------------
// Create
// ---------------------------------------------------------------------------

#[test]
fn create_test_vectors() {
    for case in cases(include_str!("../../test-vectors/create.json")) {
        let name = case["name"].as_str().unwrap();
        let input: CheckTag = serde_json::from_value(case["input"].clone()).unwrap();
        let replay = Replay::new(&case["simulated_response"]);

        let result = client(&replay).check_tags().create(&input);
        assert_request(name, &replay.only_request(), &case["expected_request"]);

        match case.get("expected_error") {
            Some(expected) => assert_error(name, &result.unwrap_err(), expected.as_str().unwrap()),
            None => assert_eq!(result.unwrap(), case["expected_result"].as_u64().unwrap(), "{name}"),
        }
    }
}

// ---------------------------------------------------------------------------
// List
// ---------------------------------------------------------------------------

#[test]
fn list_test_vectors() {
    for case in cases(include_str!("../../test-vectors/list.json")) {
        let name = case["name"].as_str().unwrap();
        let replay = Replay::new(&case["simulated_response"]);

        let result = client(&replay).check_tags().list();
        assert_request(name, &replay.only_request(), &case["expected_request"]);

        match case.get("expected_error") {
            Some(expected) => assert_error(name, &result.unwrap_err(), expected.as_str().unwrap()),
            None => {
                let expected: Vec<CheckTag> =
                    serde_json::from_value(case["expected_result"].clone()).unwrap();
                assert_eq!(result.unwrap(), expected, "{name}: parsed result");
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Get
// ---------------------------------------------------------------------------

#[test]
fn get_test_vectors() {
    for case in cases(include_str!("../../test-vectors/get.json")) {
        let name = case["name"].as_str().unwrap();
        let pk = case["input_pk"].as_u64().unwrap();
        let replay = Replay::new(&case["simulated_response"]);

        let result = client(&replay).check_tags().get(pk);
        assert_request(name, &replay.only_request(), &case["expected_request"]);

        match case.get("expected_error") {
            Some(expected) => assert_error(name, &result.unwrap_err(), expected.as_str().unwrap()),
            None => {
                let expected: CheckTag = serde_json::from_value(case["expected_result"].clone()).unwrap();
                assert_eq!(result.unwrap(), expected, "{name}: parsed result");
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Update
// ---------------------------------------------------------------------------

#[test]
fn update_test_vectors() {
    for case in cases(include_str!("../../test-vectors/update.json")) {
        let name = case["name"].as_str().unwrap();
        let input: CheckTag = serde_json::from_value(case["input"].clone()).unwrap();
        let replay = Replay::new(&case["simulated_response"]);

        let result = client(&replay).check_tags().update(&input);
        assert_request(name, &replay.only_request(), &case["expected_request"]);

        match case.get("expected_error") {
            Some(expected) => assert_error(name, &result.unwrap_err(), expected.as_str().unwrap()),
            None => assert!(result.is_ok(), "{name}: expected success, got {result:?}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Delete
// ---------------------------------------------------------------------------

#[test]
fn delete_test_vectors() {
    for case in cases(include_str!("../../test-vectors/delete.json")) {
        let name = case["name"].as_str().unwrap();
        let pk = case["input_pk"].as_u64().unwrap();
        let replay = Replay::new(&case["simulated_response"]);

        let result = client(&replay).check_tags().delete(pk);
        assert_request(name, &replay.only_request(), &case["expected_request"]);

        match case.get("expected_error") {
            Some(expected) => assert_error(name, &result.unwrap_err(), expected.as_str().unwrap()),
            None => assert!(result.is_ok(), "{name}: expected success, got {result:?}"),
        }
    }
}
