use chrono::{Duration as ChronoDuration, Utc};
use edugest_api::app::{router, services::in_memory_services};
use edugest_auth::{JwtClaims, PrincipalId, Role};
use edugest_infra::ServiceSettings;
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use reqwest::StatusCode;
use serde_json::{json, Value};

const SECRET: &str = "black-box-secret";

struct TestServer {
    base_url: String,
    client: reqwest::Client,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn() -> Self {
        // Same router as prod, in-memory store, ephemeral port.
        let app = router(
            SECRET.to_string(),
            in_memory_services(ServiceSettings::default()),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url: format!("http://{addr}"),
            client: reqwest::Client::new(),
            handle,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn post(&self, token: &str, path: &str, body: Value) -> reqwest::Response {
        self.client
            .post(self.url(path))
            .bearer_auth(token)
            .json(&body)
            .send()
            .await
            .unwrap()
    }

    async fn get(&self, token: &str, path: &str) -> reqwest::Response {
        self.client
            .get(self.url(path))
            .bearer_auth(token)
            .send()
            .await
            .unwrap()
    }

    async fn delete(&self, token: &str, path: &str) -> reqwest::Response {
        self.client
            .delete(self.url(path))
            .bearer_auth(token)
            .send()
            .await
            .unwrap()
    }

    /// POST that must succeed with 201; returns the created id.
    async fn create(&self, token: &str, path: &str, body: Value) -> String {
        let res = self.post(token, path, body).await;
        let status = res.status();
        let body: Value = res.json().await.unwrap();
        assert_eq!(status, StatusCode::CREATED, "POST {path}: {body}");
        body["id"].as_str().unwrap().to_string()
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn mint_jwt(roles: &[&'static str]) -> String {
    let now = Utc::now();
    let claims = JwtClaims {
        sub: PrincipalId::new(),
        roles: roles.iter().map(|r| Role::new(*r)).collect(),
        issued_at: now,
        expires_at: now + ChronoDuration::minutes(10),
    };

    jsonwebtoken::encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(SECRET.as_bytes()),
    )
    .expect("failed to encode jwt")
}

struct Setup {
    year: String,
    group: String,
}

/// Year, course, class level, room and period, plus one group of `capacity`.
async fn school(server: &TestServer, token: &str, capacity: u32) -> Setup {
    let year = server
        .create(
            token,
            "/school-years",
            json!({
                "designation": "2025/2026",
                "start_date": "2025-09-01",
                "end_date": "2026-07-31",
                "is_current": true
            }),
        )
        .await;
    let course = server
        .create(token, "/courses", json!({"name": "Ciências", "code": "CFB"}))
        .await;
    let level = server
        .create(token, "/classes", json!({"name": "10ª Classe", "grade": 10}))
        .await;
    let room = server
        .create(token, "/rooms", json!({"designation": "Sala 1", "capacity": 40}))
        .await;
    let period = server
        .create(
            token,
            "/periods",
            json!({"designation": "Manhã", "start_time": "07:30", "end_time": "12:30"}),
        )
        .await;
    let group = server
        .create(
            token,
            "/class-groups",
            json!({
                "designation": "10A",
                "school_year_id": year,
                "course_id": course,
                "class_level_id": level,
                "room_id": room,
                "period_id": period,
                "capacity": capacity
            }),
        )
        .await;
    Setup { year, group }
}

async fn student(server: &TestServer, token: &str, document: &str) -> String {
    server
        .create(
            token,
            "/students",
            json!({
                "full_name": format!("Aluno {document}"),
                "document_number": document,
                "birth_date": "2010-03-15",
                "guardian_name": "Encarregado"
            }),
        )
        .await
}

#[tokio::test]
async fn auth_required_for_protected_endpoints() {
    let server = TestServer::spawn().await;

    let res = server.client.get(server.url("/health")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = server.client.get(server.url("/courses")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = server.get("not-a-jwt", "/courses").await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn whoami_reports_roles_and_permissions() {
    let server = TestServer::spawn().await;
    let token = mint_jwt(&["finance"]);

    let res = server.get(&token, "/whoami").await;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["roles"], json!(["finance"]));
    let permissions: Vec<&str> = body["permissions"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(Value::as_str)
        .collect();
    assert!(permissions.contains(&"saft.export"));
}

#[tokio::test]
async fn enrollment_fills_a_group_until_capacity() {
    let server = TestServer::spawn().await;
    let token = mint_jwt(&["secretary"]);
    let setup = school(&server, &token, 1).await;

    let first = student(&server, &token, "001").await;
    let second = student(&server, &token, "002").await;

    server
        .create(
            &token,
            "/enrollments",
            json!({"student_id": first, "class_group_id": setup.group}),
        )
        .await;

    let res = server
        .post(
            &token,
            "/enrollments",
            json!({"student_id": second, "class_group_id": setup.group}),
        )
        .await;
    assert_eq!(res.status(), StatusCode::CONFLICT);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "conflict");

    let res = server
        .get(&token, &format!("/class-groups/{}/students", setup.group))
        .await;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
    assert_eq!(body["data"][0]["id"], first);
}

#[tokio::test]
async fn list_endpoints_paginate_and_filter() {
    let server = TestServer::spawn().await;
    let token = mint_jwt(&["secretary"]);

    for (name, code) in [("Ciências", "CFB"), ("Economia", "CEJ"), ("Humanidades", "CH")] {
        server
            .create(&token, "/courses", json!({"name": name, "code": code}))
            .await;
    }

    let res = server.get(&token, "/courses?page=1&limit=2").await;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["data"].as_array().unwrap().len(), 2);
    assert_eq!(body["pagination"]["total"], 3);
    assert_eq!(body["pagination"]["page"], 1);
    assert_eq!(body["pagination"]["limit"], 2);

    let res = server.get(&token, "/courses?search=econ").await;
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["pagination"]["total"], 1);
    assert_eq!(body["data"][0]["code"], "CEJ");

    let res = server.get(&token, "/courses?school_year_id=not-a-uuid").await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn deleting_a_school_year_reports_the_cascade() {
    let server = TestServer::spawn().await;
    let token = mint_jwt(&["secretary"]);
    let setup = school(&server, &token, 30).await;
    let pupil = student(&server, &token, "010").await;
    server
        .create(
            &token,
            "/enrollments",
            json!({"student_id": pupil, "class_group_id": setup.group}),
        )
        .await;

    let res = server
        .delete(&token, &format!("/school-years/{}", setup.year))
        .await;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["entity"], "school year");
    assert_eq!(body["deleted"]["class_groups"], 1);
    assert_eq!(body["deleted"]["enrollments"], 1);

    let res = server
        .get(&token, &format!("/class-groups/{}", setup.group))
        .await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    // The student survives; only their enrollment went away.
    let res = server.get(&token, &format!("/students/{pupil}")).await;
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn secretary_cannot_issue_invoices_or_export() {
    let server = TestServer::spawn().await;
    let token = mint_jwt(&["secretary"]);
    let pupil = student(&server, &token, "020").await;

    let res = server
        .post(
            &token,
            "/invoices",
            json!({"student_id": pupil, "lines": []}),
        )
        .await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = server
        .get(&token, "/saft/export?start_date=2025-01-01&end_date=2025-12-31")
        .await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    // Reads stay open to any authenticated principal.
    let res = server.get(&token, "/invoices").await;
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn invoices_are_numbered_and_exported_as_saft_xml() {
    let server = TestServer::spawn().await;
    let admin = mint_jwt(&["admin"]);
    let pupil = student(&server, &admin, "030").await;
    let fee = server
        .create(
            &admin,
            "/fee-items",
            json!({
                "code": "PROP",
                "description": "Propina mensal",
                "unit_price": 1_500_000,
                "tax_rate_bp": 0,
                "tax_exemption_code": "M10",
                "tax_exemption_reason": "Isento nos termos da alínea l) do nº1 do artigo 12.º do CIVA"
            }),
        )
        .await;

    let res = server
        .post(
            &admin,
            "/invoices",
            json!({
                "student_id": pupil,
                "issue_date": "2025-10-01",
                "lines": [{"fee_item_id": fee, "quantity": 1}]
            }),
        )
        .await;
    assert_eq!(res.status(), StatusCode::CREATED);
    let invoice: Value = res.json().await.unwrap();
    assert_eq!(invoice["number"], "FT EDU2025/1");
    assert_eq!(invoice["gross_total"], 1_500_000);

    let finance = mint_jwt(&["finance"]);
    let res = server
        .get(&finance, "/saft/export?start_date=2025-01-01&end_date=2025-12-31")
        .await;
    assert_eq!(res.status(), StatusCode::OK);
    let content_type = res.headers()["content-type"].to_str().unwrap().to_string();
    assert!(content_type.starts_with("application/xml"));
    let disposition = res.headers()["content-disposition"]
        .to_str()
        .unwrap()
        .to_string();
    assert!(disposition.starts_with("attachment; filename="));
    let xml = res.text().await.unwrap();
    assert!(xml.contains("<InvoiceNo>FT EDU2025/1</InvoiceNo>"));

    // A fee item on an issued invoice can no longer be deleted.
    let res = server.delete(&admin, &format!("/fee-items/{fee}")).await;
    assert_eq!(res.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn malformed_requests_are_rejected_with_json_errors() {
    let server = TestServer::spawn().await;
    let token = mint_jwt(&["admin"]);

    let res = server.get(&token, "/courses/not-a-uuid").await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "invalid_id");

    let res = server
        .get(&token, &format!("/courses/{}", uuid::Uuid::now_v7()))
        .await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "not_found");

    let res = server
        .post(&token, "/rooms", json!({"designation": "Sala 9"}))
        .await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "validation_error");

    let res = server
        .get(&token, "/saft/export?start_date=2025-01-01")
        .await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}
