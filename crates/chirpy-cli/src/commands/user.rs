//! User command handlers

use anyhow::{Context, Result};

use chirpy_core::Chirpy;

use crate::output::Output;

/// Register a new user
pub fn create(chirpy: &Chirpy, email: String, password: String, output: &Output) -> Result<()> {
    let user = chirpy
        .signup(&email, &password)
        .context("Failed to create user")?;

    output.success(&format!("Created user: {}", user.id));
    output.print_user(&user);
    Ok(())
}

/// Show a user by email
pub fn show(chirpy: &Chirpy, email: String, output: &Output) -> Result<()> {
    let user = chirpy.get_user_by_email(&email)?;
    output.print_user(&user);
    Ok(())
}

/// Replace the logged-in user's email and password
pub fn update(
    chirpy: &Chirpy,
    token: String,
    email: String,
    password: String,
    output: &Output,
) -> Result<()> {
    let token = super::access_token(&token)?;
    let user = chirpy
        .update_profile(token, &email, &password)
        .context("Failed to update user")?;

    output.success(&format!("Updated user: {}", user.id));
    output.print_user(&user);
    Ok(())
}

/// Log in and print the issued tokens
pub fn login(
    chirpy: &Chirpy,
    email: String,
    password: String,
    expires_in_seconds: Option<i64>,
    output: &Output,
) -> Result<()> {
    let login = chirpy
        .login(&email, &password, expires_in_seconds)
        .context("Login failed")?;

    output.print_login(&login);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::OutputFormat;
    use chirpy_core::Config;
    use tempfile::TempDir;

    fn chirpy(temp_dir: &TempDir) -> Chirpy {
        Chirpy::open(Config {
            data_dir: temp_dir.path().to_path_buf(),
            jwt_secret: Some("test-secret".to_string()),
            password_cost: 4,
            ..Config::default()
        })
        .unwrap()
    }

    #[test]
    fn test_create_then_login() {
        let temp_dir = TempDir::new().unwrap();
        let chirpy = chirpy(&temp_dir);
        let output = Output::new(OutputFormat::Quiet);

        create(&chirpy, "a@x.com".into(), "pw".into(), &output).unwrap();
        login(&chirpy, "a@x.com".into(), "pw".into(), None, &output).unwrap();
        assert!(login(&chirpy, "a@x.com".into(), "nope".into(), None, &output).is_err());
    }

    #[test]
    fn test_update_accepts_bearer_header() {
        let temp_dir = TempDir::new().unwrap();
        let chirpy = chirpy(&temp_dir);
        let output = Output::new(OutputFormat::Quiet);

        create(&chirpy, "a@x.com".into(), "pw".into(), &output).unwrap();
        let token = chirpy.login("a@x.com", "pw", None).unwrap().token;

        update(
            &chirpy,
            format!("Bearer {}", token),
            "b@x.com".into(),
            "pw2".into(),
            &output,
        )
        .unwrap();
        assert!(chirpy.get_user_by_email("b@x.com").is_ok());
    }
}
