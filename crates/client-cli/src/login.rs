//! Login / registration form state.

use shared::{RegisterRequest, User};

use crate::api::{ApiClient, ApiError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormMode {
    Login,
    Register,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Username,
    Email,
    FirstName,
    LastName,
    Password,
}

impl Field {
    pub fn label(&self) -> &'static str {
        match self {
            Field::Username => "Username",
            Field::Email => "Email",
            Field::FirstName => "First name",
            Field::LastName => "Last name",
            Field::Password => "Password",
        }
    }
}

#[derive(Debug, Clone)]
pub struct LoginForm {
    pub mode: FormMode,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub password: String,
    focus: usize,
    pub submitting: bool,
    pub error: Option<String>,
}

impl Default for LoginForm {
    fn default() -> Self {
        Self {
            mode: FormMode::Login,
            username: String::new(),
            email: String::new(),
            first_name: String::new(),
            last_name: String::new(),
            password: String::new(),
            focus: 0,
            submitting: false,
            error: None,
        }
    }
}

impl LoginForm {
    /// Fields shown in the current mode, in tab order
    pub fn fields(&self) -> &'static [Field] {
        match self.mode {
            FormMode::Login => &[Field::Username, Field::Password],
            FormMode::Register => &[
                Field::Username,
                Field::Email,
                Field::FirstName,
                Field::LastName,
                Field::Password,
            ],
        }
    }

    pub fn focused(&self) -> Field {
        let fields = self.fields();
        fields[self.focus.min(fields.len() - 1)]
    }

    pub fn value(&self, field: Field) -> &str {
        match field {
            Field::Username => &self.username,
            Field::Email => &self.email,
            Field::FirstName => &self.first_name,
            Field::LastName => &self.last_name,
            Field::Password => &self.password,
        }
    }

    fn value_mut(&mut self, field: Field) -> &mut String {
        match field {
            Field::Username => &mut self.username,
            Field::Email => &mut self.email,
            Field::FirstName => &mut self.first_name,
            Field::LastName => &mut self.last_name,
            Field::Password => &mut self.password,
        }
    }

    pub fn toggle_mode(&mut self) {
        self.mode = match self.mode {
            FormMode::Login => FormMode::Register,
            FormMode::Register => FormMode::Login,
        };
        self.focus = 0;
        self.error = None;
    }

    pub fn next_field(&mut self) {
        self.focus = (self.focus + 1) % self.fields().len();
    }

    pub fn prev_field(&mut self) {
        let len = self.fields().len();
        self.focus = (self.focus + len - 1) % len;
    }

    pub fn input(&mut self, c: char) {
        let field = self.focused();
        self.value_mut(field).push(c);
    }

    pub fn backspace(&mut self) {
        let field = self.focused();
        self.value_mut(field).pop();
    }

    /// Every visible field is required
    pub fn validate(&self) -> Result<(), String> {
        for field in self.fields() {
            if self.value(*field).trim().is_empty() {
                return Err(format!("{} is required", field.label()));
            }
        }
        if self.mode == FormMode::Register && !self.email.contains('@') {
            return Err("Email looks invalid".to_string());
        }
        Ok(())
    }

    pub fn register_request(&self) -> RegisterRequest {
        RegisterRequest {
            username: self.username.trim().to_string(),
            email: self.email.trim().to_string(),
            password: self.password.clone(),
            first_name: self.first_name.trim().to_string(),
            last_name: self.last_name.trim().to_string(),
            phone: None,
        }
    }

    /// Validate locally, then log in or register
    pub async fn submit(&self, api: &ApiClient) -> Result<User, String> {
        self.validate()?;
        let result: Result<User, ApiError> = match self.mode {
            FormMode::Login => api.login(self.username.trim(), &self.password).await,
            FormMode::Register => api.register(&self.register_request()).await,
        };
        result.map_err(|e| e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::tests::{client_for, user_json};
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn type_str(form: &mut LoginForm, s: &str) {
        s.chars().for_each(|c| form.input(c));
    }

    #[test]
    fn test_typing_goes_to_focused_field() {
        let mut form = LoginForm::default();
        type_str(&mut form, "anna");
        form.next_field();
        type_str(&mut form, "pw!");
        form.backspace();
        assert_eq!(form.username, "anna");
        assert_eq!(form.password, "pw");
        form.next_field();
        assert_eq!(form.focused(), Field::Username);
        form.prev_field();
        assert_eq!(form.focused(), Field::Password);
    }

    #[test]
    fn test_required_fields_per_mode() {
        let mut form = LoginForm::default();
        assert_eq!(form.validate().unwrap_err(), "Username is required");
        form.username = "anna".to_string();
        form.password = "secret".to_string();
        assert!(form.validate().is_ok());

        form.toggle_mode();
        assert_eq!(form.mode, FormMode::Register);
        assert_eq!(form.validate().unwrap_err(), "Email is required");
        form.email = "anna-at-example".to_string();
        form.first_name = "Anna".to_string();
        form.last_name = "P".to_string();
        assert_eq!(form.validate().unwrap_err(), "Email looks invalid");
        form.email = "anna@example.com".to_string();
        assert!(form.validate().is_ok());
        assert_eq!(form.register_request().email, "anna@example.com");
    }

    #[tokio::test]
    async fn test_invalid_form_skips_network() {
        let server = MockServer::start().await;
        let dir = tempfile::tempdir().unwrap();
        let api = client_for(&server, &dir);

        let form = LoginForm::default();
        assert!(form.submit(&api).await.is_err());
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_submit_login_stores_user() {
        let server = MockServer::start().await;
        let dir = tempfile::tempdir().unwrap();
        let api = client_for(&server, &dir);

        Mock::given(method("POST"))
            .and(path("/auth/login"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access_token": "jwt"})))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/auth/me"))
            .respond_with(ResponseTemplate::new(200).set_body_json(user_json("customer")))
            .mount(&server)
            .await;

        let mut form = LoginForm::default();
        type_str(&mut form, "anna");
        form.next_field();
        type_str(&mut form, "secret");

        let user = form.submit(&api).await.unwrap();
        assert_eq!(user.username, "anna");
        assert_eq!(api.store().user(), Some(user));
    }
}
