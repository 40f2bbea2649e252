//! Outbound payloads for the admin API.

use crate::constants::SIGNUP_PASSWORD_LENGTH;
use rand::Rng;
use zeroize::Zeroizing;

/// Account signup payload
///
/// The platform username doubles as organization name and email. The password is
/// random per call, never stored, and wiped from memory on drop.
pub struct Signup {
    pub username: String,
    password: Zeroizing<String>,
}

impl std::fmt::Debug for Signup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Signup")
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

impl Signup {
    pub fn for_username(username: &str) -> Self {
        Self {
            username: username.to_string(),
            password: random_numeric_password(SIGNUP_PASSWORD_LENGTH),
        }
    }

    pub fn org_name(&self) -> &str {
        &self.username
    }

    pub fn email(&self) -> &str {
        &self.username
    }

    pub(crate) fn password(&self) -> &str {
        &self.password
    }

    /// Form fields excluding the access token
    pub(crate) fn form_fields(&self) -> [(&'static str, &str); 4] {
        [
            ("org_name", self.org_name()),
            ("username", &self.username),
            ("email", self.email()),
            ("password", self.password()),
        ]
    }
}

fn random_numeric_password(length: usize) -> Zeroizing<String> {
    let mut rng = rand::thread_rng();
    let mut password = Zeroizing::new(String::with_capacity(length));
    for _ in 0..length {
        password.push(char::from(b'0' + rng.gen_range(0..10u8)));
    }
    password
}
