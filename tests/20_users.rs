mod common;

use anyhow::Result;
use reqwest::{Method, StatusCode};
use serde_json::{json, Value};

use common::TestServer;

#[tokio::test]
async fn admin_lists_profiles_newest_first() -> Result<()> {
    let server = TestServer::start().await?;

    let res = server.as_user(Method::GET, "/api/users", "u1").send().await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body = res.json::<Value>().await?;
    let uids: Vec<&str> = body["data"]
        .as_array()
        .map(|a| a.iter().filter_map(|p| p["uid"].as_str()).collect())
        .unwrap_or_default();
    assert_eq!(uids, ["u6", "u5", "u4", "u3", "u2", "u1"]);

    let res = server.as_user(Method::GET, "/api/users", "u2").send().await?;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    Ok(())
}

#[tokio::test]
async fn profiles_are_visible_to_self_and_admin_only() -> Result<()> {
    let server = TestServer::start().await?;

    let res = server.as_user(Method::GET, "/api/users/u2", "u2").send().await?;
    assert_eq!(res.status(), StatusCode::OK);

    let res = server.as_user(Method::GET, "/api/users/u2", "u1").send().await?;
    assert_eq!(res.status(), StatusCode::OK);

    let res = server.as_user(Method::GET, "/api/users/u2", "u3").send().await?;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = server.as_user(Method::GET, "/api/users/missing", "u1").send().await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn self_update_changes_name_only() -> Result<()> {
    let server = TestServer::start().await?;

    let res = server
        .as_user(Method::PUT, "/api/users/u2", "u2")
        .json(&json!({ "fullName": "  Wanjiru M.  " }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body = res.json::<Value>().await?;
    assert_eq!(body["data"]["fullName"], "Wanjiru M.");
    assert!(body["data"]["updatedAt"].is_string());

    let res = server
        .as_user(Method::PUT, "/api/users/u2", "u2")
        .json(&json!({ "role": "admin" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = server
        .as_user(Method::PUT, "/api/users/u2", "u2")
        .json(&json!({ "fullName": "W" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = server
        .as_user(Method::PUT, "/api/users/u2", "u2")
        .json(&json!({}))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn admin_promotes_vendor_and_status_becomes_active() -> Result<()> {
    let server = TestServer::start().await?;

    let res = server
        .as_user(Method::PUT, "/api/users/u5", "u1")
        .json(&json!({ "role": "vendor" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body = res.json::<Value>().await?;
    assert_eq!(body["data"]["role"], "vendor");
    assert_eq!(body["data"]["status"], "active");

    // the new role applies on the next request
    let res = server.as_user(Method::GET, "/api/vendor/notifications", "u5").send().await?;
    assert_eq!(res.status(), StatusCode::OK);

    let res = server
        .as_user(Method::PUT, "/api/users/u2", "u1")
        .json(&json!({ "role": "overlord" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = server
        .as_user(Method::PUT, "/api/users/missing", "u1")
        .json(&json!({ "status": "suspended" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let res = server
        .as_user(Method::PUT, "/api/users/u2", "u3")
        .json(&json!({ "fullName": "Hijacked" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    Ok(())
}

#[tokio::test]
async fn admin_delete_rules() -> Result<()> {
    let server = TestServer::start().await?;

    let res = server.as_user(Method::DELETE, "/api/users/u1", "u1").send().await?;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = server.as_user(Method::DELETE, "/api/users/u4", "u1").send().await?;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = server.as_user(Method::DELETE, "/api/users/u2", "u3").send().await?;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = server.as_user(Method::DELETE, "/api/users/u2", "u1").send().await?;
    assert_eq!(res.status(), StatusCode::OK);

    let res = server.as_user(Method::DELETE, "/api/users/u2", "u1").send().await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    // a deleted caller no longer has a profile
    let res = server.as_user(Method::GET, "/api/protected", "u2").send().await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn admin_creates_profiles() -> Result<()> {
    let server = TestServer::start().await?;
    let payload = json!({
        "email": "achieng@shop.test",
        "fullName": "Achieng Vendor",
        "role": "vendor",
        "status": "active"
    });

    let res = server
        .as_user(Method::POST, "/api/admin/users", "u1")
        .json(&payload)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::CREATED);
    let body = res.json::<Value>().await?;
    let uid = body["data"]["uid"].as_str().unwrap_or_default().to_string();
    assert!(!uid.is_empty());
    assert_eq!(body["data"]["role"], "vendor");

    let res = server.as_user(Method::GET, &format!("/api/users/{}", uid), "u1").send().await?;
    assert_eq!(res.status(), StatusCode::OK);

    let res = server
        .as_user(Method::POST, "/api/admin/users", "u1")
        .json(&payload)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::CONFLICT);

    let res = server
        .as_user(Method::POST, "/api/admin/users", "u1")
        .json(&json!({ "email": "bad", "fullName": "X", "role": "root", "status": "active" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body = res.json::<Value>().await?;
    assert_eq!(body["code"], "VALIDATION_ERROR");
    assert!(body["field_errors"]["email"].is_string());

    let res = server
        .as_user(Method::POST, "/api/admin/users", "u2")
        .json(&payload)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    Ok(())
}

#[tokio::test]
async fn vendor_status_request_flow() -> Result<()> {
    let server = TestServer::start().await?;
    let path = "/api/users/me/request-vendor-status";

    let res = server.as_user(Method::POST, path, "u2").send().await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body = res.json::<Value>().await?;
    assert_eq!(body["data"]["status"], "pending_approval");

    let res = server.as_user(Method::POST, path, "u2").send().await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = server.as_user(Method::POST, path, "u3").send().await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = server.as_user(Method::POST, path, "u5").send().await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = server.as_user(Method::POST, path, "nobody").send().await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn concurrent_vendor_requests_succeed_once() -> Result<()> {
    let server = TestServer::start().await?;
    let path = "/api/users/me/request-vendor-status";

    let (first, second) = tokio::join!(
        server.as_user(Method::POST, path, "u2").send(),
        server.as_user(Method::POST, path, "u2").send(),
    );
    let mut statuses = [first?.status(), second?.status()];
    statuses.sort();
    assert_eq!(statuses, [StatusCode::OK, StatusCode::BAD_REQUEST]);
    Ok(())
}
