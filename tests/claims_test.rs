mod common;

use eks_holmes::{decode, extract_issuer_info, extract_subject_info, DecodedClaims, Error, Segment};
use serde_json::json;

use common::{create_test_jwt, raw_token, segment, TestClaims, CLUSTER_ID, ISSUER, REGION};

fn payload(value: serde_json::Value) -> eks_holmes::ClaimSet {
    match value {
        serde_json::Value::Object(map) => map,
        other => panic!("not an object: {other}"),
    }
}

#[test]
fn decode_signed_token_returns_exact_payload() {
    let claims = TestClaims::eks();
    let token = create_test_jwt(&claims);

    let decoded = decode(&token).unwrap();

    assert_eq!(decoded.payload["iss"], json!(ISSUER));
    assert_eq!(decoded.payload["sub"], json!("system:serviceaccount:default:test-sa"));
    assert_eq!(decoded.payload["exp"], json!(claims.exp));
    assert_eq!(decoded.payload.len(), 5);
    assert_eq!(decoded.header["alg"], json!("HS256"));
    assert_eq!(decoded.header["kid"], json!("test-key-1"));
    assert_eq!(decoded.raw, token);
}

#[test]
fn decode_accepts_two_segments_without_signature() {
    let token = raw_token(r#"{"alg":"none"}"#, r#"{"sub":"x","nested":{"a":[1,true,null]}}"#);

    let decoded = decode(&token).unwrap();

    assert_eq!(decoded.payload["nested"], json!({"a": [1, true, null]}));
}

#[test]
fn decode_ignores_signature_content() {
    let token = format!("{}.!!not-base64!!", raw_token("{}", r#"{"a":1}"#));

    assert!(decode(&token).is_ok());
}

#[test]
fn decode_expired_token_succeeds() {
    let token = create_test_jwt(&TestClaims::expired());

    assert!(decode(&token).is_ok());
}

#[test]
fn decode_single_segment_is_malformed() {
    for token in ["", "abc", "!!!"] {
        assert!(
            matches!(decode(token), Err(Error::MalformedToken)),
            "token {token:?}"
        );
    }
}

#[test]
fn decode_bad_base64_names_segment() {
    let good = segment(b"{}");

    let err = decode(&format!("%%%.{good}")).unwrap_err();
    assert!(matches!(err, Error::Encoding { segment: Segment::Header, .. }));

    let err = decode(&format!("{good}.%%%")).unwrap_err();
    assert!(matches!(err, Error::Encoding { segment: Segment::Payload, .. }));
}

#[test]
fn decode_padded_segment_is_rejected() {
    // "{}" encodes to "e30" and padding is not allowed in compact tokens
    let err = decode("e30=.e30").unwrap_err();

    assert!(matches!(err, Error::Encoding { segment: Segment::Header, .. }));
}

#[test]
fn decode_non_object_json_is_schema_error() {
    let err = decode(&raw_token(r#"["alg"]"#, "{}")).unwrap_err();
    assert!(matches!(err, Error::Schema { segment: Segment::Header, .. }));

    let err = decode(&raw_token("{}", "not json")).unwrap_err();
    assert!(matches!(err, Error::Schema { segment: Segment::Payload, .. }));
    assert!(err.to_string().contains("payload"));
}

#[test]
fn decode_is_idempotent() {
    let token = create_test_jwt(&TestClaims::eks());

    assert_eq!(DecodedClaims::decode(&token).unwrap(), DecodedClaims::decode(&token).unwrap());
}

#[test]
fn issuer_info_from_eks_issuer() {
    let location = extract_issuer_info(&payload(json!({ "iss": ISSUER }))).unwrap();

    assert_eq!(location.cluster_id.as_ref(), CLUSTER_ID);
    assert_eq!(location.region.as_ref(), REGION);
}

#[test]
fn issuer_info_rejects_other_issuers() {
    for iss in [
        "https://accounts.google.com",
        "https://kubernetes.default.svc.cluster.local",
        "https://oidc.eks.us-west-2.amazonaws.com/id/abcdef",
        "https://oidc.eks.us.west.2.amazonaws.com/id/ABCDEF",
        "https://oidc.eks.us-west-2.amazonaws.com/id/ABCDEF/extra",
        "xhttps://oidc.eks.us-west-2.amazonaws.com/id/ABCDEF",
    ] {
        let err = extract_issuer_info(&payload(json!({ "iss": iss }))).unwrap_err();
        assert!(matches!(err, Error::InvalidIssuerFormat(ref raw) if raw == iss), "{iss}");
    }
}

#[test]
fn issuer_info_requires_string_iss() {
    for claims in [json!({}), json!({ "iss": 42 }), json!({ "iss": null })] {
        let err = extract_issuer_info(&payload(claims)).unwrap_err();
        assert!(matches!(err, Error::ClaimMissing("iss")));
    }
}

#[test]
fn subject_info_from_service_account_subject() {
    let identity = extract_subject_info(&payload(
        json!({ "sub": "system:serviceaccount:kube-system:default" }),
    ))
    .unwrap();

    assert_eq!(identity.namespace.as_ref(), "kube-system");
    assert_eq!(identity.service_account.as_ref(), "default");
}

#[test]
fn subject_info_rejects_other_subjects() {
    for sub in [
        "user:alice",
        "system:serviceaccount:default",
        "system:serviceaccount:default:sa:extra",
        "system:node:default:sa",
        "system:serviceaccount::sa",
        "system:serviceaccount:default:",
    ] {
        let err = extract_subject_info(&payload(json!({ "sub": sub }))).unwrap_err();
        assert!(matches!(err, Error::InvalidSubjectFormat(ref raw) if raw == sub), "{sub}");
    }
}

#[test]
fn subject_info_rejects_names_that_are_not_a_single_path_component() {
    for sub in [
        "system:serviceaccount:ns:/etc/cron.d/evil",
        "system:serviceaccount:ns:a/b",
        "system:serviceaccount:ns:a\\b",
        "system:serviceaccount:ns:..",
        "system:serviceaccount:../..:sa",
        "system:serviceaccount:/var/lib:sa",
    ] {
        let err = extract_subject_info(&payload(json!({ "sub": sub }))).unwrap_err();
        assert!(matches!(err, Error::InvalidSubjectFormat(ref raw) if raw == sub), "{sub}");
    }
}

#[test]
fn subject_info_requires_string_sub() {
    let err = extract_subject_info(&payload(json!({ "sub": ["a"] }))).unwrap_err();

    assert!(matches!(err, Error::ClaimMissing("sub")));
}

#[test]
fn extractions_are_independent() {
    let claims = payload(json!({
        "iss": "https://kubernetes.default.svc",
        "sub": "system:serviceaccount:apps:web",
    }));

    assert!(extract_issuer_info(&claims).is_err());
    assert_eq!(extract_subject_info(&claims).unwrap().service_account.as_ref(), "web");
}
