//! User administration: CRUD against `/api/segura/usuarios`.

pub mod pagination;

use tracing::{debug, info};

use crate::api::{ApiClient, ClientError, ValidationErrors};
use crate::models::{Page, User, UserForm};

const BASE: &str = "/api/segura/usuarios";

const LIST_FAILED: &str = "No se pudieron obtener los usuarios";
const NOT_FOUND: &str = "Usuario no encontrado";
const SAVE_FAILED: &str = "No se pudo guardar el usuario";
const DELETE_FAILED: &str = "No se pudo eliminar el usuario";

/// Secured user endpoints. The client must carry the session token.
#[derive(Debug, Clone)]
pub struct UserService {
    client: ApiClient,
}

impl UserService {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    pub async fn list(&self) -> Result<Vec<User>, ClientError> {
        let response =
            ApiClient::execute(self.client.get(&format!("{}/list", BASE)), LIST_FAILED).await?;
        ApiClient::decode(response).await
    }

    /// One zero-indexed page of users
    pub async fn page(&self, page: u32) -> Result<Page<User>, ClientError> {
        let response = ApiClient::execute(
            self.client.get(&format!("{}/page/{}", BASE, page)),
            LIST_FAILED,
        )
        .await?;
        let page: Page<User> = ApiClient::decode(response).await?;
        debug!(
            page = page.number,
            total_pages = page.total_pages,
            "Fetched users page"
        );
        Ok(page)
    }

    pub async fn get(&self, id: i64) -> Result<User, ClientError> {
        let response =
            ApiClient::execute(self.client.get(&format!("{}/list/{}", BASE, id)), LIST_FAILED)
                .await
                .map_err(|err| not_found_message(err, LIST_FAILED))?;
        ApiClient::decode(response).await
    }

    pub async fn create(&self, form: UserForm) -> Result<User, ClientError> {
        let mut payload = form.into_payload()?;
        payload.id = None;

        let response = ApiClient::execute(
            self.client.post(&format!("{}/create", BASE)).json(&payload),
            SAVE_FAILED,
        )
        .await?;
        let user: User = ApiClient::decode(response).await?;
        info!(username = %user.username, "Created user");
        Ok(user)
    }

    /// Update an existing user. The form must carry the user's id.
    pub async fn update(&self, form: UserForm) -> Result<User, ClientError> {
        let Some(id) = form.id else {
            return Err(ValidationErrors::single("id", "Usuario requerido").into());
        };
        let payload = form.into_payload()?;

        let response = ApiClient::execute(
            self.client
                .put(&format!("{}/update/{}", BASE, id))
                .json(&payload),
            SAVE_FAILED,
        )
        .await
        .map_err(|err| not_found_message(err, SAVE_FAILED))?;
        let user: User = ApiClient::decode(response).await?;
        info!(id, username = %user.username, "Updated user");
        Ok(user)
    }

    /// Delete a user; `true` once the backend confirms
    pub async fn delete(&self, id: i64) -> Result<bool, ClientError> {
        ApiClient::execute(
            self.client.delete(&format!("{}/delete/{}", BASE, id)),
            DELETE_FAILED,
        )
        .await?;
        info!(id, "Deleted user");
        Ok(true)
    }
}

/// A 404 without a backend message names the missing user.
fn not_found_message(err: ClientError, fallback: &str) -> ClientError {
    match err {
        ClientError::NotFound(message) if message == fallback => {
            ClientError::NotFound(NOT_FOUND.to_string())
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ApiConfig;
    use crate::models::RoleName;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn service_for(server: &MockServer) -> UserService {
        let client = ApiClient::new(&ApiConfig {
            base_url: server.uri(),
            request_timeout_secs: 5,
        })
        .unwrap()
        .with_token(Some("abc123".to_string()));
        UserService::new(client)
    }

    fn form() -> UserForm {
        UserForm {
            name: "Luis".to_string(),
            lastname: "Gómez".to_string(),
            username: "lgomez".to_string(),
            email: "luis@example.com".to_string(),
            password: "abcdef".to_string(),
            roles: vec!["EMPLEADO".to_string()],
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_list_sends_token() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/segura/usuarios/list"))
            .and(header("Authorization", "Bearer abc123"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"id": 1, "username": "admin", "roles": ["ROLE_ADMIN"]},
                {"id": "2", "username": "clerk", "roles": [{"name": "ROLE_USER"}], "active": null}
            ])))
            .expect(1)
            .mount(&server)
            .await;

        let users = service_for(&server).list().await.unwrap();
        assert_eq!(users.len(), 2);
        assert_eq!(users[1].id, Some(2));
        assert!(users[1].active);
    }

    #[tokio::test]
    async fn test_page() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/segura/usuarios/page/9"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "content": [{"id": 19, "username": "last"}],
                "number": 9,
                "totalPages": 10,
                "size": 2,
                "totalElements": 19
            })))
            .mount(&server)
            .await;

        let page = service_for(&server).page(9).await.unwrap();
        assert_eq!(page.content[0].username, "last");
        assert_eq!(page.window(), vec![5, 6, 7, 8, 9]);
        assert!(page.is_last());
    }

    #[tokio::test]
    async fn test_get_missing_user() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/segura/usuarios/list/42"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let err = service_for(&server).get(42).await.unwrap_err();
        assert!(matches!(err, ClientError::NotFound(_)));
        assert_eq!(err.to_string(), "Usuario no encontrado");
    }

    #[tokio::test]
    async fn test_get_keeps_backend_message() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/segura/usuarios/list/43"))
            .respond_with(
                ResponseTemplate::new(404).set_body_json(json!({"message": "No existe"})),
            )
            .mount(&server)
            .await;

        let err = service_for(&server).get(43).await.unwrap_err();
        assert_eq!(err.to_string(), "No existe");
    }

    #[tokio::test]
    async fn test_server_error_uses_generic_message() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/segura/usuarios/list/42"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;
        Mock::given(method("PUT"))
            .and(path("/api/segura/usuarios/update/42"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let service = service_for(&server);
        match service.get(42).await.unwrap_err() {
            ClientError::Server { status, message } => {
                assert_eq!(status, 500);
                assert_eq!(message, LIST_FAILED);
            }
            other => panic!("unexpected error: {:?}", other),
        }

        let mut edit = form();
        edit.id = Some(42);
        match service.update(edit).await.unwrap_err() {
            ClientError::Server { status, message } => {
                assert_eq!(status, 500);
                assert_eq!(message, SAVE_FAILED);
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_update_missing_user() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/api/segura/usuarios/update/42"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let mut edit = form();
        edit.id = Some(42);
        let err = service_for(&server).update(edit).await.unwrap_err();
        assert!(matches!(err, ClientError::NotFound(_)));
        assert_eq!(err.to_string(), NOT_FOUND);
    }

    #[tokio::test]
    async fn test_create() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/segura/usuarios/create"))
            .and(body_json(json!({
                "name": "Luis",
                "lastname": "Gómez",
                "username": "lgomez",
                "email": "luis@example.com",
                "password": "abcdef",
                "roles": [{"name": "ROLE_EMPLEADO"}],
                "active": true
            })))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "id": 5,
                "username": "lgomez",
                "roles": [{"id": 4, "name": "ROLE_EMPLEADO", "activo": true}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let user = service_for(&server).create(form()).await.unwrap();
        assert_eq!(user.id, Some(5));
        assert!(user.has_role(RoleName::Empleado));
    }

    #[tokio::test]
    async fn test_create_invalid_form_sends_nothing() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(201))
            .expect(0)
            .mount(&server)
            .await;

        let mut invalid = form();
        invalid.roles.clear();
        let err = service_for(&server).create(invalid).await.unwrap_err();
        match err {
            ClientError::Validation(errors) => assert!(!errors.field("roles").is_empty()),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_update_requires_id() {
        let server = MockServer::start().await;
        let err = service_for(&server).update(form()).await.unwrap_err();
        match err {
            ClientError::Validation(errors) => assert!(!errors.field("id").is_empty()),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_update_blanks_password() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/api/segura/usuarios/update/5"))
            .and(body_json(json!({
                "id": 5,
                "name": "Luis",
                "lastname": "Gómez",
                "username": "lgomez",
                "email": "luis@example.com",
                "password": "",
                "roles": [{"name": "ROLE_EMPLEADO"}],
                "active": false
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": 5,
                "username": "lgomez",
                "active": false
            })))
            .expect(1)
            .mount(&server)
            .await;

        let mut edit = form();
        edit.id = Some(5);
        edit.active = false;
        let user = service_for(&server).update(edit).await.unwrap();
        assert!(!user.active);
    }

    #[tokio::test]
    async fn test_delete() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/api/segura/usuarios/delete/5"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .and(path("/api/segura/usuarios/delete/6"))
            .respond_with(ResponseTemplate::new(403))
            .mount(&server)
            .await;

        let service = service_for(&server);
        assert!(service.delete(5).await.unwrap());

        let err = service.delete(6).await.unwrap_err();
        assert!(matches!(err, ClientError::Forbidden(_)));
    }
}
