//! HTTP API router.
//!
//! Returns a composable `Router` that can be mounted on any axum server.
//! Routes are nested under `/api/`. Registration and login are open; every
//! other route sits behind the bearer token middleware.

use std::path::PathBuf;

use axum::routing::{get, post, put};
use axum::Router;
use tower_http::cors::CorsLayer;

use crate::api::endpoints;
use crate::api::middleware;
use crate::api::types::ApiContext;

/// Build the API router for the given database path.
pub fn api_router(db_path: PathBuf) -> Router {
    build_router(ApiContext::new(db_path))
}

/// Build router from a pre-constructed `ApiContext`. Used by integration
/// tests that need to share the session store across requests.
pub fn api_router_with_ctx(ctx: ApiContext) -> Router {
    build_router(ctx)
}

fn build_router(ctx: ApiContext) -> Router {
    // Protected routes — bearer token required.
    //
    // Extension must be outermost so the auth middleware can extract
    // ApiContext before handlers run.
    let protected = Router::new()
        .route(
            "/patients/profile",
            get(endpoints::patients::get_profile).put(endpoints::patients::update_profile),
        )
        .route(
            "/patients/consultations",
            get(endpoints::patients::consultations),
        )
        .route(
            "/doctors/profile",
            get(endpoints::doctors::get_profile).put(endpoints::doctors::update_profile),
        )
        .route(
            "/doctors/search-patient/:patient_id",
            get(endpoints::doctors::search_patient),
        )
        .route(
            "/doctors/consultations",
            post(endpoints::consultations::create)
                .get(endpoints::consultations::list_for_doctor),
        )
        .route(
            "/appointments/patient/create",
            post(endpoints::appointments::create_by_patient),
        )
        .route(
            "/appointments/patient/list",
            get(endpoints::appointments::list_for_patient),
        )
        .route(
            "/appointments/doctor/create",
            post(endpoints::appointments::create_by_doctor),
        )
        .route(
            "/appointments/doctor/list",
            get(endpoints::appointments::list_for_doctor),
        )
        .route(
            "/appointments/:id",
            get(endpoints::appointments::get_by_id).delete(endpoints::appointments::cancel),
        )
        .route(
            "/appointments/:id/status",
            put(endpoints::appointments::update_status),
        )
        .layer(axum::middleware::from_fn(middleware::auth::require_auth))
        .layer(axum::Extension(ctx.clone()));

    // Open routes — these issue the tokens the protected routes require.
    let unprotected = Router::new()
        .route("/patients/register", post(endpoints::patients::register))
        .route("/patients/login", post(endpoints::patients::login))
        .route("/doctors/register", post(endpoints::doctors::register))
        .route("/doctors/login", post(endpoints::doctors::login))
        .layer(axum::Extension(ctx));

    Router::new()
        .nest("/api", protected)
        .nest("/api", unprotected)
        .layer(CorsLayer::permissive())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    fn test_ctx() -> (ApiContext, tempfile::TempDir) {
        let tmp = tempfile::tempdir().unwrap();
        let db_path = tmp.path().join("test.db");
        // Run migrations up front so every request sees a ready schema
        crate::db::sqlite::open_database(&db_path).unwrap();
        (ApiContext::new(db_path), tmp)
    }

    fn request(method: &str, uri: &str, token: Option<&str>, body: Option<Value>) -> Request<Body> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(t) = token {
            builder = builder.header("Authorization", format!("Bearer {t}"));
        }
        match body {
            Some(json) => builder
                .header("Content-Type", "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        }
    }

    async fn response_json(response: axum::http::Response<Body>) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    async fn send(ctx: &ApiContext, req: Request<Body>) -> axum::http::Response<Body> {
        api_router_with_ctx(ctx.clone()).oneshot(req).await.unwrap()
    }

    fn patient_body(email: &str) -> Value {
        json!({
            "full_name": "Maya Lindqvist",
            "email": email,
            "password": "hunter2hunter2",
            "phone": "555-0101",
            "date_of_birth": "1995-05-15",
            "blood_group": "O+"
        })
    }

    fn doctor_body(email: &str, license: &str) -> Value {
        json!({
            "full_name": "Dr. Chen",
            "email": email,
            "password": "hunter2hunter2",
            "phone": "555-0202",
            "license_number": license,
            "specializations": ["Cardiology"],
            "hospital": "City Hospital",
            "license_document_path": "/docs/license.pdf",
            "degree_document_path": "/docs/degree.pdf",
            "id_document_path": "/docs/id.pdf",
            "photo_path": "/docs/photo.jpg"
        })
    }

    /// Register a patient, returning (token, patient json).
    async fn register_patient(ctx: &ApiContext, email: &str) -> (String, Value) {
        let resp = send(
            ctx,
            request("POST", "/api/patients/register", None, Some(patient_body(email))),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::OK);
        let json = response_json(resp).await;
        (json["token"].as_str().unwrap().to_string(), json)
    }

    async fn register_doctor(ctx: &ApiContext, email: &str, license: &str) -> (String, Value) {
        let resp = send(
            ctx,
            request(
                "POST",
                "/api/doctors/register",
                None,
                Some(doctor_body(email, license)),
            ),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::OK);
        let json = response_json(resp).await;
        (json["token"].as_str().unwrap().to_string(), json)
    }

    async fn book_appointment(ctx: &ApiContext, patient_token: &str, doctor_id: &str) -> Value {
        let resp = send(
            ctx,
            request(
                "POST",
                "/api/appointments/patient/create",
                Some(patient_token),
                Some(json!({
                    "doctor_id": doctor_id,
                    "appointment_type": "checkup",
                    "date": "2024-06-01",
                    "time": "10:30",
                    "reason": "Annual checkup"
                })),
            ),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::OK);
        response_json(resp).await
    }

    #[tokio::test]
    async fn register_returns_token_and_display_id() {
        let (ctx, _tmp) = test_ctx();
        let (token, json) = register_patient(&ctx, "maya@example.com").await;

        assert!(!token.is_empty());
        assert_eq!(json["success"], true);
        // First registration, DOB 1995-05-15
        assert_eq!(json["display_id"], "MP-0119950515");
        assert_eq!(json["patient"]["patient_number"], 1);
        // The password hash never leaves the server
        assert!(json["patient"].get("password_hash").is_none());
    }

    #[tokio::test]
    async fn register_missing_field_is_bad_request() {
        let (ctx, _tmp) = test_ctx();
        let mut body = patient_body("maya@example.com");
        body.as_object_mut().unwrap().remove("phone");

        let resp = send(&ctx, request("POST", "/api/patients/register", None, Some(body))).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let json = response_json(resp).await;
        assert_eq!(json["success"], false);
        assert!(json["message"].as_str().unwrap().contains("phone"));
    }

    #[tokio::test]
    async fn duplicate_email_is_conflict() {
        let (ctx, _tmp) = test_ctx();
        register_patient(&ctx, "maya@example.com").await;

        let resp = send(
            &ctx,
            request(
                "POST",
                "/api/patients/register",
                None,
                Some(patient_body("maya@example.com")),
            ),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn login_round_trip() {
        let (ctx, _tmp) = test_ctx();
        register_patient(&ctx, "maya@example.com").await;

        let resp = send(
            &ctx,
            request(
                "POST",
                "/api/patients/login",
                None,
                Some(json!({"email": "maya@example.com", "password": "hunter2hunter2"})),
            ),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::OK);
        let json = response_json(resp).await;
        assert!(!json["token"].as_str().unwrap().is_empty());

        // Wrong password
        let resp = send(
            &ctx,
            request(
                "POST",
                "/api/patients/login",
                None,
                Some(json!({"email": "maya@example.com", "password": "wrong"})),
            ),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn profile_requires_auth() {
        let (ctx, _tmp) = test_ctx();

        let resp = send(&ctx, request("GET", "/api/patients/profile", None, None)).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

        let resp = send(
            &ctx,
            request("GET", "/api/patients/profile", Some("bogus-token"), None),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn profile_get_and_whitelisted_update() {
        let (ctx, _tmp) = test_ctx();
        let (token, _) = register_patient(&ctx, "maya@example.com").await;

        let resp = send(&ctx, request("GET", "/api/patients/profile", Some(&token), None)).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let json = response_json(resp).await;
        assert_eq!(json["patient"]["full_name"], "Maya Lindqvist");

        let resp = send(
            &ctx,
            request(
                "PUT",
                "/api/patients/profile",
                Some(&token),
                Some(json!({"city": "Uppsala", "allergies": ["penicillin"]})),
            ),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::OK);
        let json = response_json(resp).await;
        assert_eq!(json["patient"]["city"], "Uppsala");
        assert_eq!(json["patient"]["allergies"][0], "penicillin");
        // Untouched fields survive
        assert_eq!(json["patient"]["full_name"], "Maya Lindqvist");
    }

    #[tokio::test]
    async fn doctor_profile_forbidden_for_patient() {
        let (ctx, _tmp) = test_ctx();
        let (token, _) = register_patient(&ctx, "maya@example.com").await;

        let resp = send(&ctx, request("GET", "/api/doctors/profile", Some(&token), None)).await;
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn doctor_register_requires_all_documents() {
        let (ctx, _tmp) = test_ctx();

        for missing in [
            "license_document_path",
            "degree_document_path",
            "id_document_path",
            "photo_path",
        ] {
            let mut body = doctor_body("chen@example.com", "LIC-1");
            body.as_object_mut().unwrap().remove(missing);

            let resp =
                send(&ctx, request("POST", "/api/doctors/register", None, Some(body))).await;
            assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

            let json = response_json(resp).await;
            assert!(json["message"].as_str().unwrap().contains(missing));
        }

        // With all four present the same payload goes through
        register_doctor(&ctx, "chen@example.com", "LIC-1").await;
    }

    #[tokio::test]
    async fn duplicate_license_is_conflict() {
        let (ctx, _tmp) = test_ctx();
        register_doctor(&ctx, "chen@example.com", "LIC-1").await;

        let resp = send(
            &ctx,
            request(
                "POST",
                "/api/doctors/register",
                None,
                Some(doctor_body("other@example.com", "LIC-1")),
            ),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn appointment_booking_and_party_reads() {
        let (ctx, _tmp) = test_ctx();
        let (patient_token, _) = register_patient(&ctx, "maya@example.com").await;
        let (doctor_token, doctor) = register_doctor(&ctx, "chen@example.com", "LIC-1").await;

        let booked = book_appointment(
            &ctx,
            &patient_token,
            doctor["doctor"]["id"].as_str().unwrap(),
        )
        .await;
        assert_eq!(booked["appointment"]["status"], "pending");
        assert_eq!(booked["appointment"]["doctor_name"], "Dr. Chen");
        assert_eq!(booked["appointment"]["doctor_specialization"], "Cardiology");
        let appt_id = booked["appointment"]["id"].as_str().unwrap().to_string();

        // Both parties can read it
        for token in [&patient_token, &doctor_token] {
            let resp = send(
                &ctx,
                request("GET", &format!("/api/appointments/{appt_id}"), Some(token), None),
            )
            .await;
            assert_eq!(resp.status(), StatusCode::OK);
        }

        // A third party cannot
        let (other_token, _) = register_patient(&ctx, "other@example.com").await;
        let resp = send(
            &ctx,
            request(
                "GET",
                &format!("/api/appointments/{appt_id}"),
                Some(&other_token),
                None,
            ),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn appointment_status_transitions_enforced() {
        let (ctx, _tmp) = test_ctx();
        let (patient_token, _) = register_patient(&ctx, "maya@example.com").await;
        let (doctor_token, doctor) = register_doctor(&ctx, "chen@example.com", "LIC-1").await;
        let booked = book_appointment(
            &ctx,
            &patient_token,
            doctor["doctor"]["id"].as_str().unwrap(),
        )
        .await;
        let appt_id = booked["appointment"]["id"].as_str().unwrap().to_string();

        // pending → completed skips approval
        let resp = send(
            &ctx,
            request(
                "PUT",
                &format!("/api/appointments/{appt_id}/status"),
                Some(&doctor_token),
                Some(json!({"status": "completed"})),
            ),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        // pending → approved is legal
        let resp = send(
            &ctx,
            request(
                "PUT",
                &format!("/api/appointments/{appt_id}/status"),
                Some(&doctor_token),
                Some(json!({"status": "approved", "notes": "Confirmed"})),
            ),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::OK);
        let json = response_json(resp).await;
        assert_eq!(json["appointment"]["status"], "approved");
        assert_eq!(json["appointment"]["notes"], "Confirmed");

        // Unknown status string
        let resp = send(
            &ctx,
            request(
                "PUT",
                &format!("/api/appointments/{appt_id}/status"),
                Some(&doctor_token),
                Some(json!({"status": "rescheduled"})),
            ),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn delete_cancels_instead_of_removing() {
        let (ctx, _tmp) = test_ctx();
        let (patient_token, _) = register_patient(&ctx, "maya@example.com").await;
        let (_, doctor) = register_doctor(&ctx, "chen@example.com", "LIC-1").await;
        let booked = book_appointment(
            &ctx,
            &patient_token,
            doctor["doctor"]["id"].as_str().unwrap(),
        )
        .await;
        let appt_id = booked["appointment"]["id"].as_str().unwrap().to_string();

        let resp = send(
            &ctx,
            request(
                "DELETE",
                &format!("/api/appointments/{appt_id}"),
                Some(&patient_token),
                None,
            ),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::OK);
        let json = response_json(resp).await;
        assert_eq!(json["appointment"]["status"], "cancelled");

        // The row is still readable afterwards
        let resp = send(
            &ctx,
            request(
                "GET",
                &format!("/api/appointments/{appt_id}"),
                Some(&patient_token),
                None,
            ),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn appointment_listings_are_per_principal() {
        let (ctx, _tmp) = test_ctx();
        let (patient_token, _) = register_patient(&ctx, "maya@example.com").await;
        let (doctor_token, doctor) = register_doctor(&ctx, "chen@example.com", "LIC-1").await;
        book_appointment(&ctx, &patient_token, doctor["doctor"]["id"].as_str().unwrap()).await;

        let resp = send(
            &ctx,
            request("GET", "/api/appointments/patient/list", Some(&patient_token), None),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::OK);
        let json = response_json(resp).await;
        assert_eq!(json["appointments"].as_array().unwrap().len(), 1);

        let resp = send(
            &ctx,
            request("GET", "/api/appointments/doctor/list", Some(&doctor_token), None),
        )
        .await;
        let json = response_json(resp).await;
        assert_eq!(json["appointments"].as_array().unwrap().len(), 1);

        // An uninvolved patient sees nothing
        let (other_token, _) = register_patient(&ctx, "other@example.com").await;
        let resp = send(
            &ctx,
            request("GET", "/api/appointments/patient/list", Some(&other_token), None),
        )
        .await;
        let json = response_json(resp).await;
        assert!(json["appointments"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn consultation_flow_with_display_id() {
        let (ctx, _tmp) = test_ctx();
        let (patient_token, patient) = register_patient(&ctx, "maya@example.com").await;
        let (doctor_token, _) = register_doctor(&ctx, "chen@example.com", "LIC-1").await;

        let display_id = patient["display_id"].as_str().unwrap();
        let resp = send(
            &ctx,
            request(
                "POST",
                "/api/doctors/consultations",
                Some(&doctor_token),
                Some(json!({
                    "patient_id": display_id,
                    "date": "2024-01-10",
                    "diagnosis": "Flu"
                })),
            ),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::OK);
        let json = response_json(resp).await;
        assert_eq!(json["patient_name"], "Maya Lindqvist");
        assert_eq!(
            json["consultation"]["patient_id"],
            patient["patient"]["id"]
        );

        // Doctor listing includes it, with read-time names
        let resp = send(
            &ctx,
            request("GET", "/api/doctors/consultations", Some(&doctor_token), None),
        )
        .await;
        let json = response_json(resp).await;
        assert_eq!(json["consultations"][0]["doctor_name"], "Dr. Chen");

        // Patient sees it on their own history
        let resp = send(
            &ctx,
            request("GET", "/api/patients/consultations", Some(&patient_token), None),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::OK);
        let json = response_json(resp).await;
        assert_eq!(json["consultations"][0]["diagnosis"], "Flu");
    }

    #[tokio::test]
    async fn consultation_create_requires_doctor_role() {
        let (ctx, _tmp) = test_ctx();
        let (patient_token, patient) = register_patient(&ctx, "maya@example.com").await;

        let resp = send(
            &ctx,
            request(
                "POST",
                "/api/doctors/consultations",
                Some(&patient_token),
                Some(json!({
                    "patient_id": patient["display_id"],
                    "date": "2024-01-10"
                })),
            ),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn consultation_create_missing_date_is_bad_request() {
        let (ctx, _tmp) = test_ctx();
        let (doctor_token, _) = register_doctor(&ctx, "chen@example.com", "LIC-1").await;

        let resp = send(
            &ctx,
            request(
                "POST",
                "/api/doctors/consultations",
                Some(&doctor_token),
                Some(json!({"patient_id": "MP-0119950515"})),
            ),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn search_patient_resolves_codec_forms() {
        let (ctx, _tmp) = test_ctx();
        let (_, patient) = register_patient(&ctx, "maya@example.com").await;
        let (doctor_token, _) = register_doctor(&ctx, "chen@example.com", "LIC-1").await;

        let display_id = patient["display_id"].as_str().unwrap();
        let resp = send(
            &ctx,
            request(
                "GET",
                &format!("/api/doctors/search-patient/{display_id}"),
                Some(&doctor_token),
                None,
            ),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::OK);
        let json = response_json(resp).await;
        assert_eq!(json["patient"]["id"], patient["patient"]["id"]);

        // Raw key form works too
        let raw = patient["patient"]["id"].as_str().unwrap();
        let resp = send(
            &ctx,
            request(
                "GET",
                &format!("/api/doctors/search-patient/{raw}"),
                Some(&doctor_token),
                None,
            ),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::OK);

        // Unresolvable input is a 404
        let resp = send(
            &ctx,
            request(
                "GET",
                "/api/doctors/search-patient/MP-9919000101",
                Some(&doctor_token),
                None,
            ),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn search_patient_requires_doctor_role() {
        let (ctx, _tmp) = test_ctx();
        let (patient_token, patient) = register_patient(&ctx, "maya@example.com").await;

        let display_id = patient["display_id"].as_str().unwrap();
        let resp = send(
            &ctx,
            request(
                "GET",
                &format!("/api/doctors/search-patient/{display_id}"),
                Some(&patient_token),
                None,
            ),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn unknown_route_is_404() {
        let (ctx, _tmp) = test_ctx();
        let resp = send(&ctx, request("GET", "/api/nonexistent", None, None)).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }
}
