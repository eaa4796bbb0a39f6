use crate::auth::{Credentials, SignupForm};
use crate::error::AcademyError;
use crate::notice::Notice;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsValue;

#[wasm_bindgen(module = "/js/identity.js")]
extern "C" {
    #[wasm_bindgen(catch)]
    async fn identity_sign_in(email: &str, password: &str) -> Result<(), JsValue>;
    #[wasm_bindgen(catch)]
    async fn identity_sign_up(email: &str, password: &str, metadata_json: &str) -> Result<(), JsValue>;
}

fn provider_error(e: JsValue) -> AcademyError {
    let msg = js_sys::Error::from(e)
        .message()
        .as_string()
        .unwrap_or_else(|| "An unexpected error occurred".to_string());
    AcademyError::Identity(msg)
}

/// Validates locally, then forwards to the provider. Returns the toast to
/// show either way.
pub async fn sign_in(creds: &Credentials) -> Notice {
    if let Err(e) = creds.validate() {
        return Notice::error("Login Failed", e.to_string());
    }
    match identity_sign_in(&creds.email, &creds.password).await {
        Ok(()) => Notice::info("Welcome back!", "Successfully logged in to Kali Academy"),
        Err(e) => Notice::error("Login Failed", provider_error(e).to_string()),
    }
}

pub async fn sign_up(form: &SignupForm) -> Notice {
    if let Err(e) = form.validate() {
        return Notice::error("Signup Failed", e.to_string());
    }
    let metadata = serde_json::json!({
        "full_name": form.full_name.trim(),
        "username": form.username.trim(),
    })
    .to_string();
    match identity_sign_up(&form.email, &form.password, &metadata).await {
        Ok(()) => Notice::info(
            "Account Created!",
            "Please check your email to verify your account",
        ),
        Err(e) => Notice::error("Signup Failed", provider_error(e).to_string()),
    }
}

/// Resolves to a JSON toast.
#[wasm_bindgen]
pub async fn login(email: String, password: String) -> String {
    let notice = sign_in(&Credentials { email, password }).await;
    crate::notice::to_json(&[notice])
}

#[wasm_bindgen]
pub async fn signup(
    email: String,
    password: String,
    confirm_password: String,
    full_name: String,
    username: String,
) -> String {
    let form = SignupForm {
        email,
        password,
        confirm_password,
        full_name,
        username,
    };
    crate::notice::to_json(&[sign_up(&form).await])
}
