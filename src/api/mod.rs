use rocket::Route;

mod admin;
mod auth;
mod common;
mod voting;

pub fn routes() -> Vec<Route> {
    let mut routes = Vec::new();
    routes.extend(auth::routes());
    routes.extend(admin::routes());
    routes.extend(voting::routes());
    routes
}

#[cfg(test)]
mod tests {
    use mongodb::Client as MongoClient;
    use rocket::{
        figment::Figment,
        http::{ContentType, Cookie, Status},
        local::asynchronous::Client,
        serde::json::serde_json::{self, json},
    };

    use crate::{
        model::{api::auth::AdminToken, mongodb::Id},
        Config,
    };

    fn test_figment() -> Figment {
        rocket::Config::figment()
            .merge(("hostname", "example.com"))
            .merge(("auth_ttl", 3600))
            .merge(("jwt_secret", "notasecret"))
            .merge(("default_admin_password", "hunter2"))
    }

    /// A client with the full route table and config wired up, backed by a
    /// lazy database handle. The MongoDB driver only connects on first use,
    /// so any request that is rejected before a database operation can be
    /// dispatched against this client.
    async fn guard_test_client() -> Client {
        let figment = test_figment();
        let config: Config = figment.extract().unwrap();
        let db = MongoClient::with_uri_str("mongodb://localhost:27017")
            .await
            .unwrap() // Only parses the URI; no connection is made.
            .database("guard_test");
        let rocket = rocket::custom(figment)
            .manage(config)
            .manage(db)
            .mount("/", super::routes());
        Client::tracked(rocket).await.unwrap()
    }

    fn admin_cookie(config: &Config) -> Cookie<'static> {
        let token: AdminToken = serde_json::from_value(json!({ "sub": Id::new() })).unwrap();
        token.into_cookie(config)
    }

    #[rocket::async_test]
    async fn admin_routes_require_login() {
        let client = guard_test_client().await;
        for uri in ["/elections", "/officials"] {
            let response = client.get(uri).dispatch().await;
            assert_eq!(response.status(), Status::Unauthorized);
        }
        let response = client.post("/tasks/purge-voters").dispatch().await;
        assert_eq!(response.status(), Status::Unauthorized);
    }

    #[rocket::async_test]
    async fn tampered_tokens_are_rejected() {
        let client = guard_test_client().await;
        // A cookie signed under a different secret must not authenticate.
        let other_config: Config = test_figment()
            .merge(("jwt_secret", "adifferentsecret"))
            .extract()
            .unwrap();
        let response = client
            .get("/elections")
            .cookie(admin_cookie(&other_config))
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::Unauthorized);
    }

    #[rocket::async_test]
    async fn unknown_state_names_are_rejected_before_lookup() {
        let client = guard_test_client().await;
        let config: Config = test_figment().extract().unwrap();
        let uri = format!("/elections/{}/state", Id::new());
        for bad in ["FINISHED", "open", ""] {
            let response = client
                .post(uri.as_str())
                .cookie(admin_cookie(&config))
                .header(ContentType::JSON)
                .body(json!({ "state": bad }).to_string())
                .dispatch()
                .await;
            assert_eq!(response.status(), Status::BadRequest);
        }
    }

    #[rocket::async_test]
    async fn ballot_fetch_requires_a_key() {
        let client = guard_test_client().await;
        let response = client.get("/vote").dispatch().await;
        assert_eq!(response.status(), Status::NotFound);

        // A malformed key is treated the same as no key.
        let response = client.get("/vote?a=notakey").dispatch().await;
        assert_eq!(response.status(), Status::NotFound);
    }

    #[rocket::async_test]
    async fn logout_clears_the_session() {
        let client = guard_test_client().await;
        let response = client.delete("/auth/logout").dispatch().await;
        assert_eq!(response.status(), Status::Ok);
    }
}
