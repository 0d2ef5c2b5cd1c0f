use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // 3-50 characters, alphanumeric plus underscore.
    static ref USERNAME_RE: Regex = Regex::new(r"^[A-Za-z0-9_]{3,50}$").unwrap();
    static ref EMAIL_RE: Regex =
        Regex::new(r"^[A-Za-z0-9._-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}$").unwrap();
    // 10 digits with an optional country code.
    static ref PHONE_RE: Regex = Regex::new(r"^(\+\d{1,3}[- ]?)?\d{10}$").unwrap();
}

pub const MIN_PASSWORD_LEN: usize = 8;

pub fn is_valid_username(username: &str) -> bool {
    USERNAME_RE.is_match(username)
}

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

pub fn is_valid_phone(phone: &str) -> bool {
    PHONE_RE.is_match(phone)
}
