#![allow(clippy::unwrap_used, clippy::expect_used)]

//! Href parsing properties: form independence, totality, round trips.

use resource_access::{CompressedIdDecoder, ResourceLocator};
use resource_access_sdk::{IdDecoder, ResourceAddress};

fn locator() -> ResourceLocator {
    ResourceLocator::with_default_decoder("/api")
}

#[test]
fn collection_and_id_do_not_depend_on_href_form() {
    let loc = locator();
    for (collection, id) in [
        ("vms", "10"),
        ("hosts", "1000000000023"),
        ("service_templates", "7"),
    ] {
        for href in [
            format!("https://manageiq.example.com/api/{collection}/{id}"),
            format!("http://localhost:3000/api/v2.1/{collection}/{id}/"),
            format!("/api/{collection}/{id}"),
            format!("api/{collection}/{id}"),
            format!("{collection}/{id}"),
        ] {
            let addr = loc.parse(&href);
            assert_eq!(addr.collection.as_deref(), Some(collection), "{href}");
            assert_eq!(addr.collection_id.as_deref(), Some(id), "{href}");
        }
    }
}

#[test]
fn parse_is_total() {
    let loc = locator();
    let inputs = [
        "",
        "/",
        "//",
        "api",
        "/api/v/vms",
        "http://",
        "mailto:someone",
        "/api/vms/1/tags/2/extra/segments",
        "?expand=1",
        "#frag",
        "\u{0}\u{7f}",
    ];
    for raw in inputs {
        let addr = loc.parse(raw);
        assert!(addr.subcollection.is_some() || addr.subcollection_id.is_none(), "{raw:?}");
        assert!(addr.collection.is_some() || addr.collection_id.is_none(), "{raw:?}");
    }
}

#[test]
fn canonical_href_round_trips() {
    let loc = locator();
    let addresses = [
        ResourceAddress::default(),
        ResourceAddress::collection("vms"),
        ResourceAddress::resource("vms", "10"),
        ResourceAddress::resource("vms", "10").with_subcollection("tags", None),
        ResourceAddress::resource("vms", "10")
            .with_subcollection("tags", Some("3".into()))
            .with_version("v1"),
    ];
    for addr in addresses {
        let href = loc.href(&addr);
        assert_eq!(loc.parse(&href), addr, "{href}");
    }
}

#[test]
fn parsed_hrefs_re_parse_to_the_same_address() {
    let loc = locator();
    for raw in ["http://host/api/vms/1r5/tags/2", "vms/7", "/api/v2.1/hosts"] {
        let first = loc.parse(raw);
        assert_eq!(loc.parse(&loc.href(&first)), first, "{raw}");
    }
}

#[test]
fn compressed_ids_round_trip_through_the_decoder() {
    let decoder = CompressedIdDecoder::new();
    for id in [0_u64, 7, 1_000_000_000_023, 99_000_000_000_001] {
        let compressed = CompressedIdDecoder::compress(id);
        assert!(decoder.is_encoded(&compressed));
        assert_eq!(decoder.decode(&compressed), id.to_string());
    }
    assert!(!decoder.is_encoded("123"));
    assert!(!decoder.is_encoded("r12"));
}

#[test]
fn overflowing_compressed_ids_are_left_alone() {
    let decoder = CompressedIdDecoder::new();
    let token = "99999999999999999999r1";
    assert_eq!(decoder.decode(token), token);
}
