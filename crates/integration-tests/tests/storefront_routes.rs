//! The storefront service over real HTTP.
//!
//! Each test serves the app on an ephemeral port over the in-memory
//! backend; a cookie-keeping client plays one browser.

use lumiere_integration_tests::{LAVENDER, TestServer, VANILLA, catalog};
use reqwest::{StatusCode, header};
use serde_json::{Value, json};

async fn body(response: reqwest::Response) -> Value {
    response.json().await.expect("JSON body")
}

#[tokio::test]
async fn test_health() {
    let server = TestServer::spawn(catalog()).await;
    let resp = server
        .browser()
        .get(server.url("/health"))
        .send()
        .await
        .expect("request");

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.text().await.expect("text"), "ok");
}

#[tokio::test]
async fn test_catalog_browsing() {
    let server = TestServer::spawn(catalog()).await;
    let client = server.browser();

    let page = body(
        client
            .get(server.url("/products?first=2"))
            .send()
            .await
            .expect("request"),
    )
    .await;
    assert_eq!(page["products"].as_array().expect("products").len(), 2);
    assert_eq!(page["page_info"]["has_next_page"], true);

    let resp = client
        .get(server.url("/products/vanilla-bean"))
        .send()
        .await
        .expect("request");
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body(resp).await["title"], "Vanilla Bean");

    let resp = client
        .get(server.url("/products/no-such-candle"))
        .send()
        .await
        .expect("request");
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let collection = body(
        client
            .get(server.url("/collections/best-sellers"))
            .send()
            .await
            .expect("request"),
    )
    .await;
    let handles: Vec<&str> = collection["products"]
        .as_array()
        .expect("products")
        .iter()
        .filter_map(|p| p["handle"].as_str())
        .collect();
    assert_eq!(handles, ["vanilla-bean", "cedar-smoke"]);
}

#[tokio::test]
async fn test_search_threshold() {
    let server = TestServer::spawn(catalog()).await;
    let client = server.browser();

    let short = body(
        client
            .get(server.url("/api/search?q=%20v%20"))
            .send()
            .await
            .expect("request"),
    )
    .await;
    assert_eq!(short["products"], json!([]));
    assert!(server.api.suggest_calls().is_empty());

    let results = body(
        client
            .get(server.url("/search?q=lavender"))
            .send()
            .await
            .expect("request"),
    )
    .await;
    assert_eq!(results["query"], "lavender");
    assert_eq!(results["products"][0]["handle"], "lavender-fields");
}

#[tokio::test]
async fn test_cart_follows_the_session() {
    let server = TestServer::spawn(catalog()).await;
    let browser = server.browser();

    let empty = body(
        browser
            .get(server.url("/api/cart"))
            .send()
            .await
            .expect("request"),
    )
    .await;
    assert_eq!(empty["is_empty"], true);
    assert_eq!(server.api.carts_created(), 0);

    let added = body(
        browser
            .post(server.url("/api/cart/add"))
            .json(&json!({"variant_id": VANILLA, "quantity": 2}))
            .send()
            .await
            .expect("request"),
    )
    .await;
    assert_eq!(added["total_quantity"], 2);
    assert_eq!(added["is_open"], true);
    let line_id = added["lines"][0]["id"].as_str().expect("line id").to_string();

    let updated = body(
        browser
            .post(server.url("/api/cart/update"))
            .json(&json!({"line_id": line_id, "quantity": 5}))
            .send()
            .await
            .expect("request"),
    )
    .await;
    assert_eq!(updated["lines"][0]["quantity"], 5);
    assert_eq!(updated["subtotal"], "$160.00");
    assert_eq!(updated["free_shipping"]["qualified"], true);

    // A second browser gets its own cart
    let other = server.browser();
    let other_cart = body(
        other
            .get(server.url("/api/cart"))
            .send()
            .await
            .expect("request"),
    )
    .await;
    assert_eq!(other_cart["is_empty"], true);

    let removed = body(
        browser
            .post(server.url("/api/cart/remove"))
            .json(&json!({"line_id": line_id}))
            .send()
            .await
            .expect("request"),
    )
    .await;
    assert_eq!(removed["is_empty"], true);
    assert_eq!(removed["total_quantity"], 0);
    assert_eq!(server.api.carts_created(), 1);
}

#[tokio::test]
async fn test_concurrent_requests_share_the_session_cart() {
    let server = TestServer::spawn(catalog()).await;
    let browser = server.browser();

    let first = body(
        browser
            .post(server.url("/api/cart/add"))
            .json(&json!({"variant_id": VANILLA}))
            .send()
            .await
            .expect("request"),
    )
    .await;

    let add = |variant: &str, quantity: i64| {
        browser
            .post(server.url("/api/cart/add"))
            .json(&json!({"variant_id": variant, "quantity": quantity}))
            .send()
    };
    let (a, b) = tokio::join!(add(VANILLA, 1), add(LAVENDER, 2));
    assert_eq!(a.expect("request").status(), StatusCode::OK);
    assert_eq!(b.expect("request").status(), StatusCode::OK);

    // Each request had its own store; the backend cart holds both
    let cart = body(
        browser
            .get(server.url("/api/cart"))
            .send()
            .await
            .expect("request"),
    )
    .await;
    assert_eq!(cart["cart_id"], first["cart_id"]);
    assert_eq!(cart["total_quantity"], 4);
    assert_eq!(cart["is_open"], false);
    assert_eq!(server.api.carts_created(), 1);
}

#[tokio::test]
async fn test_discount_codes() {
    let server = TestServer::spawn(catalog()).await;
    let browser = server.browser();

    browser
        .post(server.url("/api/cart/add"))
        .json(&json!({"variant_id": LAVENDER}))
        .send()
        .await
        .expect("request");

    let cart = body(
        browser
            .post(server.url("/api/cart/discount-codes"))
            .json(&json!({"codes": ["welcome10"]}))
            .send()
            .await
            .expect("request"),
    )
    .await;
    assert_eq!(cart["discount_codes"][0]["applicable"], true);
    assert_eq!(cart["subtotal"], "$28.00");
    assert_eq!(cart["total"], "$25.20");
}

#[tokio::test]
async fn test_invalid_quantity_is_bad_request() {
    let server = TestServer::spawn(catalog()).await;
    let resp = server
        .browser()
        .post(server.url("/api/cart/add"))
        .json(&json!({"variant_id": VANILLA, "quantity": 0}))
        .send()
        .await
        .expect("request");

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert!(body(resp).await["error"].is_string());
}

#[tokio::test]
async fn test_backend_failure_keeps_cart() {
    let server = TestServer::spawn(catalog()).await;
    let browser = server.browser();

    let added = body(
        browser
            .post(server.url("/api/cart/add"))
            .json(&json!({"variant_id": VANILLA}))
            .send()
            .await
            .expect("request"),
    )
    .await;
    let line_id = added["lines"][0]["id"].as_str().expect("line id").to_string();

    server.api.fail_next("Service unavailable");
    let resp = browser
        .post(server.url("/api/cart/update"))
        .json(&json!({"line_id": line_id, "quantity": 4}))
        .send()
        .await
        .expect("request");
    assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);

    let cart = body(
        browser
            .get(server.url("/api/cart"))
            .send()
            .await
            .expect("request"),
    )
    .await;
    assert_eq!(cart["lines"][0]["quantity"], 1);
}

#[tokio::test]
async fn test_checkout_redirect() {
    let server = TestServer::spawn(catalog()).await;
    let browser = server.browser();

    let resp = browser
        .get(server.url("/checkout"))
        .send()
        .await
        .expect("request");
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert!(resp.headers().get(header::LOCATION).is_none());

    let added = body(
        browser
            .post(server.url("/api/cart/add"))
            .json(&json!({"variant_id": VANILLA}))
            .send()
            .await
            .expect("request"),
    )
    .await;

    let resp = browser
        .get(server.url("/checkout"))
        .send()
        .await
        .expect("request");
    assert!(resp.status().is_redirection());
    let location = resp.headers()[header::LOCATION]
        .to_str()
        .expect("location");
    assert!(location.starts_with("https://checkout.example.com/cart/c/"));

    // Emptied carts have nothing to check out
    let line_id = added["lines"][0]["id"].as_str().expect("line id").to_string();
    browser
        .post(server.url("/api/cart/remove"))
        .json(&json!({"line_id": line_id}))
        .send()
        .await
        .expect("request");
    let resp = browser
        .get(server.url("/checkout"))
        .send()
        .await
        .expect("request");
    assert_eq!(resp.status(), StatusCode::CONFLICT);
    assert_eq!(body(resp).await["error"], "Cart is empty");
}

#[tokio::test]
async fn test_subscription_widget_event() {
    let server = TestServer::spawn(catalog()).await;
    let browser = server.browser();

    let cart = body(
        browser
            .post(server.url("/api/subscription/add-to-cart"))
            .json(&json!({
                "lines": [
                    {"merchandiseId": VANILLA, "quantity": 1,
                     "sellingPlanId": "gid://shopify/SellingPlan/30"}
                ],
                "discountCodes": ["WELCOME10"]
            }))
            .send()
            .await
            .expect("request"),
    )
    .await;
    assert_eq!(cart["total_quantity"], 1);
    assert_eq!(cart["is_open"], true);
    assert_eq!(cart["total"], "$28.80");

    // Same session, same cart
    let shown = body(
        browser
            .get(server.url("/api/cart"))
            .send()
            .await
            .expect("request"),
    )
    .await;
    assert_eq!(shown["cart_id"], cart["cart_id"]);
}
